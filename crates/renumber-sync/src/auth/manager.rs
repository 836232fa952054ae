use crate::auth::flow::AuthFlow;
use crate::auth::token::{StoredToken, TokenCache};
use crate::error::Result;
use tracing::{debug, info, warn};

/// Hands out a usable access token, reusing the cache where possible.
#[derive(Debug)]
pub struct CredentialManager<F> {
    flow: F,
    cache: TokenCache,
}

impl<F: AuthFlow> CredentialManager<F> {
    pub fn new(flow: F, cache: TokenCache) -> Self {
        Self { flow, cache }
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    pub fn obtain(&self) -> Result<StoredToken> {
        self.obtain_at(chrono::Utc::now().timestamp())
    }

    /// A valid cached token is returned as is. An expired one is refreshed
    /// when it carries a refresh token; otherwise the consent flow runs
    /// again. New tokens are written back to the cache. Flow errors are
    /// returned unchanged.
    pub fn obtain_at(&self, now_unix: i64) -> Result<StoredToken> {
        let cached = match self.cache.load() {
            Ok(cached) => cached,
            Err(err) => {
                warn!(
                    path = %self.cache.path().display(),
                    error = %err,
                    "ignoring unreadable token cache"
                );
                None
            }
        };

        let token = match cached {
            Some(token) if token.is_valid(now_unix) => {
                debug!("using cached access token");
                return Ok(token);
            }
            Some(token) if token.refresh_token().is_some() => {
                info!("cached access token expired, refreshing");
                self.flow.refresh(&token)?
            }
            _ => {
                info!("no usable cached token, starting consent flow");
                self.flow.authorize()?
            }
        };

        self.cache.save(&token)?;
        Ok(token)
    }
}
