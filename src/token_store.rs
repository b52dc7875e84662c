//! Credential store holding the access and refresh tokens

use crate::error::Result;
use crate::storage::{CredentialStorage, MemoryStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::types::Credentials;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared credential store
///
/// Cheap to clone; every clone reads and writes the same backing storage.
/// Writes are last-write-wins.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn CredentialStorage>,
}

impl CredentialStore {
    /// Create a credential store over the given persistent storage
    pub fn new(storage: Arc<dyn CredentialStorage>) -> Self {
        Self { storage }
    }

    /// Create a credential store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Read both tokens
    pub fn get(&self) -> Result<Credentials> {
        Ok(Credentials {
            access_token: self.storage.get_item(ACCESS_TOKEN_KEY)?,
            refresh_token: self.storage.get_item(REFRESH_TOKEN_KEY)?,
        })
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get_item(ACCESS_TOKEN_KEY)?
            .filter(|t| !t.is_empty()))
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get_item(REFRESH_TOKEN_KEY)?
            .filter(|t| !t.is_empty()))
    }

    /// Store tokens after a login response
    pub fn set(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        self.storage.set_item(ACCESS_TOKEN_KEY, access_token)?;
        self.storage.set_item(REFRESH_TOKEN_KEY, refresh_token)?;
        debug!("Credentials stored");
        Ok(())
    }

    /// Replace only the access token (refresh flow)
    pub fn set_access(&self, access_token: &str) -> Result<()> {
        self.storage.set_item(ACCESS_TOKEN_KEY, access_token)
    }

    /// Clear both tokens
    pub fn clear(&self) -> Result<()> {
        self.storage.remove_item(ACCESS_TOKEN_KEY)?;
        self.storage.remove_item(REFRESH_TOKEN_KEY)?;
        debug!("Credentials cleared");
        Ok(())
    }

    /// True if an access token is stored. Unreadable storage counts as logged out.
    pub fn is_authenticated(&self) -> bool {
        match self.access_token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "Failed to read credentials");
                false
            }
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_store() {
        let store = CredentialStore::in_memory();
        assert_eq!(store.get().unwrap(), Credentials::default());
        assert!(!store.is_authenticated());

        store.set("access_token_123", "refresh_token_456").unwrap();
        let creds = store.get().unwrap();
        assert_eq!(creds.access_token.as_deref(), Some("access_token_123"));
        assert_eq!(creds.refresh_token.as_deref(), Some("refresh_token_456"));
        assert!(store.is_authenticated());

        store.set_access("access_token_789").unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("access_token_789"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh_token_456"));

        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), Credentials::default());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_clones_share_storage() {
        let store = CredentialStore::in_memory();
        let other = store.clone();

        other.set("a", "r").unwrap();
        assert!(store.is_authenticated());

        store.clear().unwrap();
        assert!(!other.is_authenticated());
    }

    #[test]
    fn test_empty_access_token_is_not_a_session() {
        let store = CredentialStore::in_memory();
        store.set("", "r").unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("r"));
    }
}
