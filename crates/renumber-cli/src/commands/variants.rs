use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use anyhow::Result;
use clap::Args;
use renumber_core::NormalizedNumber;
use serde::Serialize;

#[derive(Debug, Args)]
pub struct VariantsArgs {
    /// Phone number in any format
    pub number: String,
}

#[derive(Debug, Serialize)]
struct VariantsReport {
    input: String,
    normalized: String,
    variants: Vec<String>,
}

pub fn variants(ctx: &Context<'_>, args: VariantsArgs) -> Result<()> {
    let input = args.number.trim();
    if input.is_empty() {
        return Err(invalid_input("number cannot be empty"));
    }
    let normalized = NormalizedNumber::parse(input)?;
    let report = VariantsReport {
        input: input.to_string(),
        normalized: normalized.to_string(),
        variants: normalized.variants(),
    };

    if ctx.json {
        return print_json(&report);
    }
    println!("normalized: {}", report.normalized);
    for variant in &report.variants {
        println!("- {variant}");
    }
    Ok(())
}
