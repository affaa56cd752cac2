#![warn(warnings)]
#![deny(clippy::all)]

pub mod attachment;
pub mod config;
pub mod draft;
pub mod error;
pub mod note;
pub mod storage;
pub mod store;
pub mod workflow;

pub use config::NoteSyncConfig;
pub use draft::NoteDraft;
pub use error::{StoreError, WorkflowError};
pub use note::{Attachment, ItemError, NewNote, Note};
pub use store::{BlobStore, RecordCreated, RecordList, RecordStore};
pub use workflow::{Created, NoteSyncWorkflow, Refreshed, Warning, WorkflowState};
