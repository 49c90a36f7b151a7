//! Persisted client-side storage for the auth token and user record.
//!
//! Implementations decide where secrets live (an encrypted file, the OS
//! keyring, memory). Keys are namespaced through [`format_service_id`].

use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::{Error, Result};

const SERVICE_PREFIX: &str = "stockfolio";

/// Key/value store for secrets that must survive restarts.
pub trait SecretStore: Send + Sync {
    fn set_secret(&self, service: &str, secret: &str) -> Result<()>;
    fn get_secret(&self, service: &str) -> Result<Option<String>>;
    /// Deleting a missing secret is not an error.
    fn delete_secret(&self, service: &str) -> Result<()>;
}

/// Namespaced storage key for a service name.
pub fn format_service_id(service: &str) -> String {
    format!("{}_{}", SERVICE_PREFIX, service)
}

/// In-memory secret store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.secrets
            .lock()
            .map_err(|_| Error::Secret("Secret store lock poisoned".into()))
    }
}

impl SecretStore for MemorySecretStore {
    fn set_secret(&self, service: &str, secret: &str) -> Result<()> {
        self.lock()?
            .insert(format_service_id(service), secret.to_string());
        Ok(())
    }

    fn get_secret(&self, service: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(&format_service_id(service)).cloned())
    }

    fn delete_secret(&self, service: &str) -> Result<()> {
        self.lock()?.remove(&format_service_id(service));
        Ok(())
    }
}
