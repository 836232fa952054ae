use crate::auth::callback::CallbackListener;
use crate::auth::pkce::{generate_pkce_pair, random_token};
use crate::auth::secret::ClientSecret;
use crate::auth::token::StoredToken;
use crate::error::{Result, SyncError};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Source of fresh credentials for [`CredentialManager`](super::CredentialManager).
pub trait AuthFlow {
    /// Runs the interactive consent flow.
    fn authorize(&self) -> Result<StoredToken>;
    /// Trades the token's refresh token for a new access token.
    fn refresh(&self, token: &StoredToken) -> Result<StoredToken>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth 2.0 authorization code flow with PKCE and a loopback redirect, as
/// used by desktop ("installed") applications.
pub struct InstalledAppFlow {
    secret: OnceCell<ClientSecret>,
    secret_path: Option<PathBuf>,
    scopes: Vec<String>,
    redirect_port: u16,
    client: Client,
}

impl std::fmt::Debug for InstalledAppFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstalledAppFlow")
            .field("secret", &self.secret.get())
            .field("secret_path", &self.secret_path)
            .field("scopes", &self.scopes)
            .field("redirect_port", &self.redirect_port)
            .finish()
    }
}

impl InstalledAppFlow {
    pub fn new(secret: ClientSecret, scopes: &[&str], redirect_port: u16) -> Result<Self> {
        let flow = Self::build(None, scopes, redirect_port)?;
        let _ = flow.secret.set(secret);
        Ok(flow)
    }

    /// Reads the client secret file only once a refresh or consent is needed,
    /// so a valid cached token works without it.
    pub fn from_secret_file(
        path: impl Into<PathBuf>,
        scopes: &[&str],
        redirect_port: u16,
    ) -> Result<Self> {
        Self::build(Some(path.into()), scopes, redirect_port)
    }

    fn build(secret_path: Option<PathBuf>, scopes: &[&str], redirect_port: u16) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            secret: OnceCell::new(),
            secret_path,
            scopes: scopes.iter().map(|scope| scope.to_string()).collect(),
            redirect_port,
            client,
        })
    }

    fn secret(&self) -> Result<&ClientSecret> {
        if let Some(secret) = self.secret.get() {
            return Ok(secret);
        }
        let path = self
            .secret_path
            .as_deref()
            .ok_or_else(|| SyncError::Auth("no client secret configured".to_string()))?;
        let loaded = ClientSecret::load(path)?;
        Ok(self.secret.get_or_init(|| loaded))
    }

    pub fn consent_url(&self, redirect_uri: &str, state: &str, code_challenge: &str) -> Result<Url> {
        let secret = self.secret()?;
        let mut url = Url::parse(&secret.auth_uri)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &secret.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        Ok(url)
    }

    fn token_request(&self, mut form: HashMap<&str, String>) -> Result<StoredToken> {
        let secret = self.secret()?;
        form.insert("client_id", secret.client_id.clone());
        if let Some(client_secret) = &secret.client_secret {
            form.insert("client_secret", client_secret.clone());
        }

        let response = self
            .client
            .post(secret.token_uri.as_str())
            .form(&form)
            .send()
            .map_err(|err| SyncError::Auth(format!("token request failed: {err}")))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| SyncError::Auth(format!("token response read failed: {err}")))?;

        if !status.is_success() {
            return Err(SyncError::Auth(token_error_message(status.as_u16(), &body)));
        }
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| SyncError::Auth(format!("token response json invalid: {err}")))?;
        Ok(into_stored(parsed, chrono::Utc::now().timestamp()))
    }
}

impl AuthFlow for InstalledAppFlow {
    fn authorize(&self) -> Result<StoredToken> {
        self.secret()?;
        let listener = CallbackListener::bind(self.redirect_port)?;
        let redirect_uri = listener.redirect_uri();
        let pkce = generate_pkce_pair();
        let state = random_token(24);

        let url = self.consent_url(&redirect_uri, &state, &pkce.code_challenge)?;
        eprintln!("Open this URL in your browser to authorize access:\n\n    {url}\n");
        info!(port = listener.port(), "waiting for oauth consent");

        let payload = listener.wait(&state)?;
        if let Some(error) = payload.error {
            let detail = payload
                .error_description
                .map(|description| format!(": {description}"))
                .unwrap_or_default();
            return Err(SyncError::Auth(format!("consent was not granted ({error}){detail}")));
        }
        let code = payload
            .code
            .ok_or_else(|| SyncError::Auth("oauth callback missing code".to_string()))?;

        let mut form = HashMap::new();
        form.insert("grant_type", "authorization_code".to_string());
        form.insert("code", code);
        form.insert("redirect_uri", redirect_uri);
        form.insert("code_verifier", pkce.code_verifier);
        let token = self.token_request(form)?;
        info!("oauth consent completed");
        Ok(token)
    }

    fn refresh(&self, token: &StoredToken) -> Result<StoredToken> {
        let refresh_token = token
            .refresh_token()
            .ok_or_else(|| SyncError::Auth("token has no refresh token".to_string()))?;

        let mut form = HashMap::new();
        form.insert("grant_type", "refresh_token".to_string());
        form.insert("refresh_token", refresh_token.to_string());
        let mut refreshed = self.token_request(form)?;
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token.to_string());
        }
        if refreshed.scopes.is_empty() {
            refreshed.scopes = token.scopes.clone();
        }
        info!("oauth access token refreshed");
        Ok(refreshed)
    }
}

fn into_stored(response: TokenResponse, now_unix: i64) -> StoredToken {
    StoredToken {
        access_token: response.access_token.trim().to_string(),
        refresh_token: response
            .refresh_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty()),
        expires_at: response
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| now_unix.saturating_add(secs)),
        scopes: response
            .scope
            .map(|scope| scope.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
    }
}

fn token_error_message(status: u16, body: &str) -> String {
    let mut message = format!("token endpoint returned status {status}");
    if let Ok(parsed) = serde_json::from_str::<TokenErrorResponse>(body) {
        if let Some(error) = parsed.error {
            message.push_str(": ");
            message.push_str(&error);
        }
        if let Some(description) = parsed.error_description {
            message.push_str(" (");
            message.push_str(&description);
            message.push(')');
        }
    }
    message
}
