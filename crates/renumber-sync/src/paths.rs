use crate::error::{Result, SyncError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "renumber";
const TOKEN_FILENAME: &str = "token.json";

pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_DATA_HOME") {
        let path = PathBuf::from(dir);
        if path.as_os_str().is_empty() {
            return Err(SyncError::InvalidDataPath(path));
        }
        return Ok(path.join(APP_DIR));
    }

    let home = dirs::home_dir().ok_or(SyncError::MissingHomeDir)?;
    Ok(home.join(".local").join("share").join(APP_DIR))
}

pub fn token_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(TOKEN_FILENAME))
}

/// Resolves an explicit token path or falls back to the data directory.
pub fn resolve_token_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) if path.as_os_str().is_empty() => Err(SyncError::InvalidDataPath(path)),
        Some(path) => Ok(path),
        None => token_path(),
    }
}

/// Creates the parent directory of `path`, owner-only when newly created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }
    fs::create_dir_all(parent)?;
    restrict_dir_permissions(parent)
}

#[cfg(unix)]
fn restrict_dir_permissions(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = fs::Permissions::from_mode(0o700);
    fs::set_permissions(dir, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_dir_permissions(_dir: &Path) -> Result<()> {
    Ok(())
}
