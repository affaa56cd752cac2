//! Capabilities the workflow is built on.
//!
//! Both traits are implemented for opendal in [`crate::storage`]; any other
//! backend only needs to honour the same contracts.

use crate::error::StoreError;
use crate::note::{ItemError, NewNote, Note};

/// Result of listing every record.
#[derive(Debug, Clone, Default)]
pub struct RecordList {
    pub records: Vec<Note>,
    pub errors: Vec<ItemError>,
}

/// Result of creating one record. `record` may be absent when the store only
/// reports item errors.
#[derive(Debug, Clone, Default)]
pub struct RecordCreated {
    pub record: Option<Note>,
    pub errors: Vec<ItemError>,
}

#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn list(&self) -> Result<RecordList, StoreError>;

    async fn create(&self, fields: NewNote) -> Result<RecordCreated, StoreError>;

    async fn delete(&self, id: &str) -> Result<Vec<ItemError>, StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait BlobStore {
    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<(), StoreError>;

    /// Time-limited URL suitable for display. Fails when `path` is missing or
    /// not readable.
    async fn resolve_url(&self, path: &str) -> Result<String, StoreError>;

    /// Fails when `path` is missing.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;
}
