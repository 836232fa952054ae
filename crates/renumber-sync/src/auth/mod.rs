//! OAuth credentials for the People API: cached tokens, refresh, and the
//! interactive installed-app consent flow.

pub mod callback;
pub mod flow;
pub mod manager;
pub mod pkce;
pub mod secret;
pub mod token;

pub use flow::{AuthFlow, InstalledAppFlow};
pub use manager::CredentialManager;
pub use secret::ClientSecret;
pub use token::{StoredToken, TokenCache};

pub const CONTACTS_SCOPE: &str = "https://www.googleapis.com/auth/contacts";
