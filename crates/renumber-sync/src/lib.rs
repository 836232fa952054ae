pub mod auth;
pub mod error;
pub mod paths;
pub mod people;
pub mod retry;
pub mod search;
pub mod update;

pub use error::{Result, SyncError};
pub use people::{PeopleApi, PeopleClient, Person, PhoneNumber, PhoneUpdate};
pub use retry::{Pause, RetryPolicy, ThreadPause};
pub use search::search_contacts;
pub use update::{UpdateEvent, UpdateOptions, UpdateReport, Updater};
