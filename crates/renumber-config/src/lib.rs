use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use renumber_core::MappingColumns;
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "renumber";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_CSV_PATH: &str = "contacts.csv";
pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
pub const DEFAULT_UPDATE_PAUSE_SECS: u64 = 2;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_INITIAL_DELAY_SECS: u64 = 2;
pub const DEFAULT_MAX_DELAY_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub csv_path: PathBuf,
    pub credentials_path: PathBuf,
    /// `None` means the token cache lives in the data directory.
    pub token_path: Option<PathBuf>,
    pub update_pause_secs: u64,
    pub columns: MappingColumns,
    pub retry: RetryConfig,
    pub oauth: OAuthConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_secs: u64,
    pub max_delay_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OAuthConfig {
    pub redirect_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            token_path: None,
            update_pause_secs: DEFAULT_UPDATE_PAUSE_SECS,
            columns: MappingColumns::default(),
            retry: RetryConfig::default(),
            oauth: OAuthConfig { redirect_port: 0 },
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_secs: DEFAULT_INITIAL_DELAY_SECS,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid retry.max_attempts value: {0}")]
    InvalidMaxAttempts(u32),
    #[error("invalid retry.initial_delay_secs value: {0}")]
    InvalidInitialDelay(u64),
    #[error("invalid retry.max_delay_secs value: {0} (must be at least initial_delay_secs)")]
    InvalidMaxDelay(u64),
    #[error("invalid csv.{field} value: column name cannot be empty")]
    InvalidColumn { field: &'static str },
    #[error("invalid {field} value: path cannot be empty")]
    InvalidPath { field: &'static str },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    csv_path: Option<PathBuf>,
    credentials_path: Option<PathBuf>,
    token_path: Option<PathBuf>,
    update_pause_secs: Option<u64>,
    csv: Option<CsvFile>,
    retry: Option<RetryFile>,
    oauth: Option<OAuthFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CsvFile {
    old_column: Option<String>,
    new_column: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RetryFile {
    max_attempts: Option<u32>,
    initial_delay_secs: Option<u64>,
    max_delay_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OAuthFile {
    redirect_port: Option<u16>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path.clone()) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(path) = parsed.csv_path {
        config.csv_path = non_empty_path(path, "csv_path")?;
    }
    if let Some(path) = parsed.credentials_path {
        config.credentials_path = non_empty_path(path, "credentials_path")?;
    }
    if let Some(path) = parsed.token_path {
        config.token_path = Some(non_empty_path(path, "token_path")?);
    }
    if let Some(pause) = parsed.update_pause_secs {
        config.update_pause_secs = pause;
    }

    if let Some(csv) = parsed.csv {
        if let Some(old) = csv.old_column {
            config.columns.old = non_empty_column(old, "old_column")?;
        }
        if let Some(new) = csv.new_column {
            config.columns.new = non_empty_column(new, "new_column")?;
        }
    }

    if let Some(retry) = parsed.retry {
        if let Some(attempts) = retry.max_attempts {
            if attempts == 0 {
                return Err(ConfigError::InvalidMaxAttempts(attempts));
            }
            config.retry.max_attempts = attempts;
        }
        if let Some(initial) = retry.initial_delay_secs {
            if initial == 0 {
                return Err(ConfigError::InvalidInitialDelay(initial));
            }
            config.retry.initial_delay_secs = initial;
        }
        if let Some(max) = retry.max_delay_secs {
            config.retry.max_delay_secs = max;
        }
        if config.retry.max_delay_secs < config.retry.initial_delay_secs {
            return Err(ConfigError::InvalidMaxDelay(config.retry.max_delay_secs));
        }
    }

    if let Some(oauth) = parsed.oauth {
        if let Some(port) = oauth.redirect_port {
            config.oauth.redirect_port = port;
        }
    }

    Ok(config)
}

fn non_empty_path(path: PathBuf, field: &'static str) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidPath { field });
    }
    Ok(path)
}

fn non_empty_column(name: String, field: &'static str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidColumn { field });
    }
    Ok(trimmed.to_string())
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
