use crate::commands::{print_json, Context};
use anyhow::{Context as _, Result};
use clap::Args;
use renumber_sync::auth::{CredentialManager, InstalledAppFlow, TokenCache, CONTACTS_SCOPE};
use renumber_sync::paths;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// OAuth client secret file downloaded from the Google Cloud console
    #[arg(long)]
    pub credentials: Option<PathBuf>,
    #[arg(long)]
    pub token: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct LogoutArgs {
    #[arg(long)]
    pub token: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct LoginReport {
    token_path: String,
    expires_at: Option<i64>,
    scopes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LogoutReport {
    token_path: String,
    removed: bool,
}

pub fn credential_manager(
    ctx: &Context<'_>,
    credentials: Option<PathBuf>,
    token: Option<PathBuf>,
) -> Result<CredentialManager<InstalledAppFlow>> {
    let credentials = credentials.unwrap_or_else(|| ctx.config.credentials_path.clone());
    let token_path = resolve_token_path(ctx, token)?;
    debug!(
        credentials = %credentials.display(),
        token = %token_path.display(),
        "credential paths resolved"
    );
    let flow = InstalledAppFlow::from_secret_file(
        credentials,
        &[CONTACTS_SCOPE],
        ctx.config.oauth.redirect_port,
    )
    .with_context(|| "build oauth client")?;
    Ok(CredentialManager::new(flow, TokenCache::new(token_path)))
}

fn resolve_token_path(ctx: &Context<'_>, token: Option<PathBuf>) -> Result<PathBuf> {
    let custom = token.or_else(|| ctx.config.token_path.clone());
    paths::resolve_token_path(custom).with_context(|| "resolve token path")
}

pub fn login(ctx: &Context<'_>, args: LoginArgs) -> Result<()> {
    let manager = credential_manager(ctx, args.credentials, args.token)?;
    let token = manager.obtain().with_context(|| "authorize google contacts")?;
    let report = LoginReport {
        token_path: manager.cache().path().display().to_string(),
        expires_at: token.expires_at,
        scopes: token.scopes,
    };

    if ctx.json {
        return print_json(&report);
    }
    println!("Authorized; token stored at {}", report.token_path);
    Ok(())
}

pub fn logout(ctx: &Context<'_>, args: LogoutArgs) -> Result<()> {
    let token_path = resolve_token_path(ctx, args.token)?;
    let cache = TokenCache::new(&token_path);
    let removed = cache
        .delete()
        .with_context(|| format!("delete token cache {}", token_path.display()))?;
    let report = LogoutReport {
        token_path: token_path.display().to_string(),
        removed,
    };

    if ctx.json {
        return print_json(&report);
    }
    if removed {
        println!("Removed cached token {}", report.token_path);
    } else {
        println!("No cached token at {}", report.token_path);
    }
    Ok(())
}
