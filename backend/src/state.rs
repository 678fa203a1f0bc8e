//! Shared application state.
//!
//! `AppState` is built once in `main.rs` from the loaded `Config` and shared across
//! workers as `web::Data`. It is cheap to clone: the store and blob store are handles.

use crate::config::{Config, ConfigError};
use crate::object_store::{BlobStore, ObjectStoreError};
use crate::storage::{Store, StoreError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open the key-value store: {0}")]
    Store(#[from] StoreError),
    #[error("failed to set up object storage: {0}")]
    ObjectStore(#[from] ObjectStoreError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Key-value tables named in `config.tables`.
    pub store: Store,
    pub blobs: BlobStore,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let tables = &config.tables;
        let store = Store::open(
            &tables.database_path,
            &[tables.leads.as_str(), tables.documents.as_str(), tables.calls.as_str()],
        )?;
        let blobs = BlobStore::new(&config.object_store)?;
        Ok(Self {
            config: Arc::new(config),
            store,
            blobs,
        })
    }

    pub fn leads_table(&self) -> &str {
        &self.config.tables.leads
    }

    pub fn documents_table(&self) -> &str {
        &self.config.tables.documents
    }

    pub fn calls_table(&self) -> &str {
        &self.config.tables.calls
    }
}
