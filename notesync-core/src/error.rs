use opendal::ErrorKind;

/// Transport or permission failure reported by a record or blob store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("invalid record {path}: {reason}")]
    InvalidRecord { path: String, reason: String },

    #[error(transparent)]
    Backend(opendal::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<opendal::Error> for StoreError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound => StoreError::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => StoreError::PermissionDenied(err.to_string()),
            ErrorKind::Unsupported => StoreError::Unsupported(err.to_string()),
            _ => StoreError::Backend(err),
        }
    }
}

/// Failure that rejects a workflow operation outright.
#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error("attachment upload to {path} failed: {source}")]
    Upload {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("record store call failed: {0}")]
    Records(#[source] StoreError),
}
