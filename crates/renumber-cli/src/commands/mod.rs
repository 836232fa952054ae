use anyhow::Result;
use renumber_config::AppConfig;
use serde::Serialize;
use std::io::{self, Write};

pub mod auth;
pub mod completions;
pub mod update;
pub mod variants;

pub struct Context<'a> {
    pub json: bool,
    pub config: &'a AppConfig,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
