//! InvestAfrik Rust Client
//!
//! Client core for the InvestAfrik platform: an API client with bearer/CSRF
//! header injection and automatic refresh on 401, a persistent credential
//! store, a notification presenter and fr-FR display formatting.

pub mod api_client;
pub mod config;
pub mod context;
pub mod csrf;
pub mod error;
pub mod format;
pub mod navigator;
pub mod notifications;
pub mod storage;
pub mod token_store;
pub mod types;

pub use api_client::{ApiClient, RequestOptions};
pub use config::ClientConfig;
pub use context::AppContext;
pub use csrf::{CsrfSource, NoCsrf, PageCsrf};
pub use error::{ClientError, Result};
pub use navigator::{ChannelNavigator, Navigator, NoopNavigator};
pub use notifications::{Notification, NotificationCenter, NotificationEvent, NotificationKind};
pub use storage::{CredentialStorage, FileStorage, MemoryStorage};
pub use token_store::CredentialStore;
pub use types::{AuthMode, Credentials};
