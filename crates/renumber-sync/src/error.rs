use renumber_core::{CoreError, MappingError};
use std::path::PathBuf;
use thiserror::Error;

pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("authorization failed: {0}")]
    Auth(String),
    #[error("failed after {attempts} attempts due to rate limiting")]
    RateLimitExhausted { attempts: u32 },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid data path: {0}")]
    InvalidDataPath(PathBuf),
}

impl SyncError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        SyncError::Http {
            status,
            message: message.into(),
        }
    }

    /// True only for a remote "too many requests" answer.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            SyncError::Http {
                status: STATUS_TOO_MANY_REQUESTS,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
