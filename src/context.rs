//! Explicitly constructed application context
//!
//! Bundles the API client, the credential store and the notification
//! presenter that the UI layer needs. Construct one at startup, hand it (or an
//! `Arc` of it) to whatever needs it, and call [`AppContext::shutdown`] on
//! teardown.

use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::csrf::CsrfSource;
use crate::error::Result;
use crate::navigator::Navigator;
use crate::notifications::NotificationCenter;
use crate::storage::CredentialStorage;
use crate::token_store::CredentialStore;
use std::sync::Arc;
use tracing::info;

pub struct AppContext {
    api: Arc<ApiClient>,
    notifications: NotificationCenter,
}

impl AppContext {
    /// # Arguments
    /// * `config` - Client configuration
    /// * `storage` - Persistent storage for the tokens
    /// * `csrf` - CSRF token source of the current page
    /// * `navigator` - Performs login/logout redirects
    pub fn init(
        config: ClientConfig,
        storage: Arc<dyn CredentialStorage>,
        csrf: Arc<dyn CsrfSource>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let notifications =
            NotificationCenter::with_settings(config.default_notification_duration, config.max_notifications);
        let api = ApiClient::new(config, CredentialStore::new(storage), csrf, navigator)?;

        info!(authenticated = api.is_authenticated(), "Application context initialized");

        Ok(Self { api, notifications })
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn credentials(&self) -> &CredentialStore {
        self.api.credentials()
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.is_authenticated()
    }

    /// Cancel pending notification timers
    pub fn shutdown(&self) {
        self.notifications.shutdown();
        info!("Application context shut down");
    }
}
