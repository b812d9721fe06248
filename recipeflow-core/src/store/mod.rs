//! Document store seam
//!
//! The pipeline only ever needs three things from the NoSQL source of truth:
//! list a collection, upsert a document by id, and count a collection.
//! Everything else (seeding, exporting, counting) is written against
//! [`DocumentStore`] so the backing store can be swapped without touching
//! the stages.
//!
//! ## Available stores
//!
//! - [`LocalStore`] - JSON files on disk, `<root>/<collection>/<id>.json`
//! - [`EmulatorStore`] - Firestore emulator over its REST API

pub mod emulator;
pub mod firestore_value;
pub mod local;

pub use emulator::EmulatorStore;
pub use local::LocalStore;

use crate::config::{PipelineConfig, StoreBackend};
use crate::types::{Document, StoredDocument};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("document {collection}/{id} is not a JSON object")]
    NotAnObject { collection: String, id: String },

    #[error("unexpected firestore value: {0}")]
    Value(String),

    #[error("invalid document id {0:?}")]
    InvalidId(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Storage abstraction over the document collections the pipeline reads and seeds
pub trait DocumentStore {
    /// All documents of a collection. Missing collections are empty, not an error.
    fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError>;

    /// Create or replace the document `id` in `collection`.
    fn put(&self, collection: &str, id: &str, document: &Document) -> Result<(), StoreError>;

    fn count(&self, collection: &str) -> Result<usize, StoreError> {
        Ok(self.list(collection)?.len())
    }

    /// Store name for logging
    fn name(&self) -> &str;
}

/// Build the store selected by the config.
pub fn open_store(config: &PipelineConfig) -> Result<Box<dyn DocumentStore>, StoreError> {
    match config.store.backend {
        StoreBackend::Local => Ok(Box::new(LocalStore::new(config.local_store_dir())?)),
        StoreBackend::Emulator => Ok(Box::new(EmulatorStore::new(
            &config.store.emulator_host,
            &config.store.project_id,
        ))),
    }
}

/// Ids end up in file names and URL paths, so path separators are refused.
pub(crate) fn check_document_id(id: &str) -> Result<(), StoreError> {
    let id_trimmed = id.trim();
    if id_trimmed.is_empty() || id_trimmed == "." || id_trimmed == ".." || id.contains(['/', '\\']) {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}
