use crate::commands::auth::credential_manager;
use crate::commands::{print_json, Context};
use anyhow::{Context as _, Result};
use clap::Args;
use renumber_core::read_mappings;
use renumber_sync::{
    PeopleClient, RetryPolicy, ThreadPause, UpdateEvent, UpdateOptions, UpdateReport, Updater,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Mapping file with old and new number columns
    pub csv: Option<PathBuf>,
    /// Search and verify contacts without changing them
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long)]
    pub credentials: Option<PathBuf>,
    #[arg(long)]
    pub token: Option<PathBuf>,
}

pub fn update(ctx: &Context<'_>, args: UpdateArgs) -> Result<()> {
    let csv_path = args.csv.unwrap_or_else(|| ctx.config.csv_path.clone());
    let mappings = read_mappings(&csv_path, &ctx.config.columns)
        .with_context(|| format!("read mapping file {}", csv_path.display()))?;
    debug!(
        rows = mappings.rows.len(),
        skipped = mappings.skipped,
        "mapping file loaded"
    );

    let manager = credential_manager(ctx, args.credentials, args.token)?;
    let token = manager.obtain().with_context(|| "authorize google contacts")?;
    let mut client =
        PeopleClient::new(token.access_token).with_context(|| "build people api client")?;

    let retry = &ctx.config.retry;
    let policy = RetryPolicy::new(
        retry.max_attempts,
        Duration::from_secs(retry.initial_delay_secs),
        Duration::from_secs(retry.max_delay_secs),
    );
    let options = UpdateOptions {
        dry_run: args.dry_run,
        update_pause: Duration::from_secs(ctx.config.update_pause_secs),
    };

    let mut pause = ThreadPause;
    let mut updater = Updater::new(&mut client, &mut pause, policy, options);
    let json = ctx.json;
    let report = updater.run(&mappings, &mut |event| {
        if !json {
            print_event(event);
        }
    });

    if ctx.json {
        return print_json(&report);
    }
    print_summary(&report);
    Ok(())
}

fn print_event(event: &UpdateEvent) {
    match event {
        UpdateEvent::NotFound { old } => println!("not found: {old}"),
        UpdateEvent::Mismatched {
            old,
            resource_name,
            display_name,
        } => println!(
            "mismatch: {} has no phone matching {old}, skipped",
            contact_label(resource_name, display_name.as_deref())
        ),
        UpdateEvent::Updated {
            old,
            new,
            resource_name,
            display_name,
            updated_count,
        } => println!(
            "updated: {old} -> {new} ({}) | updated count: {updated_count}",
            contact_label(resource_name, display_name.as_deref())
        ),
        UpdateEvent::WouldUpdate {
            old,
            new,
            resource_name,
            display_name,
        } => println!(
            "would update: {old} -> {new} ({})",
            contact_label(resource_name, display_name.as_deref())
        ),
        UpdateEvent::RowFailed { old, line, error } => {
            println!("error: {old} (line {line}): {error}")
        }
    }
}

fn contact_label(resource_name: &str, display_name: Option<&str>) -> String {
    match display_name {
        Some(name) => format!("{name}, {resource_name}"),
        None => resource_name.to_string(),
    }
}

fn print_summary(report: &UpdateReport) {
    if report.dry_run {
        println!("Dry run: {} contacts would be updated", report.would_update);
    }
    println!("Total contacts updated: {}", report.updated);
    if report.skipped_rows > 0 || report.failed_rows > 0 {
        println!(
            "Rows: {} read, {} skipped, {} failed",
            report.rows, report.skipped_rows, report.failed_rows
        );
    }
}
