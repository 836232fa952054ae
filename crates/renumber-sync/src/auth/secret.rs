use crate::error::{Result, SyncError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client registration read from a Google `credentials.json` file.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecret")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SecretFile {
    installed: Option<SecretSection>,
    web: Option<SecretSection>,
}

#[derive(Debug, Deserialize)]
struct SecretSection {
    client_id: String,
    client_secret: Option<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl ClientSecret {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|err| {
            SyncError::Auth(format!(
                "failed to read client secret file {}: {err}",
                path.display()
            ))
        })?;
        Self::parse(&data).map_err(|err| match err {
            SyncError::Auth(message) => {
                SyncError::Auth(format!("{message} ({})", path.display()))
            }
            other => other,
        })
    }

    pub fn parse(data: &str) -> Result<Self> {
        let file: SecretFile = serde_json::from_str(data)
            .map_err(|err| SyncError::Auth(format!("invalid client secret file: {err}")))?;
        let section = file.installed.or(file.web).ok_or_else(|| {
            SyncError::Auth("client secret file has no installed or web section".to_string())
        })?;

        let client_id = section.client_id.trim().to_string();
        if client_id.is_empty() {
            return Err(SyncError::Auth("client secret file has empty client_id".to_string()));
        }

        Ok(Self {
            client_id,
            client_secret: non_empty(section.client_secret),
            auth_uri: non_empty(section.auth_uri).unwrap_or_else(|| DEFAULT_AUTH_URI.to_string()),
            token_uri: non_empty(section.token_uri)
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{ClientSecret, DEFAULT_AUTH_URI};

    #[test]
    fn parses_installed_section() {
        let data = r#"{"installed": {
            "client_id": "123.apps.googleusercontent.com",
            "project_id": "contacts-fix",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_secret": "shh",
            "redirect_uris": ["http://localhost"]
        }}"#;
        let secret = ClientSecret::parse(data).expect("parse");
        assert_eq!(secret.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secret.client_secret.as_deref(), Some("shh"));
        assert_eq!(secret.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn falls_back_to_web_section_and_default_uris() {
        let data = r#"{"web": {"client_id": "abc"}}"#;
        let secret = ClientSecret::parse(data).expect("parse");
        assert_eq!(secret.auth_uri, DEFAULT_AUTH_URI);
        assert!(secret.client_secret.is_none());
    }

    #[test]
    fn rejects_files_without_a_client() {
        assert!(ClientSecret::parse(r#"{"other": {}}"#).is_err());
        assert!(ClientSecret::parse(r#"{"installed": {"client_id": " "}}"#).is_err());
        assert!(ClientSecret::parse("not json").is_err());
    }

    #[test]
    fn debug_output_hides_secret() {
        let secret = ClientSecret::parse(r#"{"installed": {"client_id": "abc", "client_secret": "shh"}}"#)
            .expect("parse");
        let debug = format!("{secret:?}");
        assert!(!debug.contains("shh"));
    }

    #[test]
    fn load_reports_missing_file_as_auth_error() {
        let err = ClientSecret::load(std::path::Path::new("/nonexistent/credentials.json"))
            .unwrap_err();
        assert!(matches!(err, crate::error::SyncError::Auth(_)));
    }
}
