use anyhow::{anyhow, Result};
use opendal::Operator;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use url::Url;

use crate::config::NoteSyncConfig;

mod blobs;
mod records;

pub use blobs::OpendalBlobStore;
pub use records::OpendalRecordStore;

static MEMORY_OPERATORS: OnceLock<Mutex<HashMap<String, Operator>>> = OnceLock::new();

fn memory_cache() -> &'static Mutex<HashMap<String, Operator>> {
    MEMORY_OPERATORS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Creates an OpenDAL Operator from a URI string.
///
/// - `memory://...` -> in-memory, one shared operator per distinct URI
/// - `file:///path/to/dir` -> local filesystem rooted at the path
/// - anything else is handed to opendal as is (`fs://`, `s3://`, ...)
pub fn operator_from_uri(uri: &str) -> Result<Operator> {
    if uri.starts_with("memory://") {
        let mut cache = memory_cache()
            .lock()
            .map_err(|_| anyhow!("memory operator cache lock poisoned"))?;
        if let Some(op) = cache.get(uri) {
            return Ok(op.clone());
        }
        let op = Operator::new(opendal::services::Memory::default())?.finish();
        cache.insert(uri.to_string(), op.clone());
        return Ok(op);
    }

    if uri.starts_with("file://") {
        let url = Url::parse(uri).map_err(|e| anyhow!("Invalid storage URI: {}", e))?;
        let builder = opendal::services::Fs::default().root(url.path());
        return Ok(Operator::new(builder)?.finish());
    }

    Ok(Operator::from_uri(uri)?)
}

/// Build both stores from one config. The caller owns their lifetime.
pub fn connect(config: &NoteSyncConfig) -> Result<(OpendalRecordStore, OpendalBlobStore)> {
    config.validate()?;
    let op = operator_from_uri(&config.storage.uri)?;
    tracing::debug!(uri = %config.storage.uri, "storage operator ready");

    let records = OpendalRecordStore::new(op.clone(), &config.records_root);
    let blobs = OpendalBlobStore::new(op, config.url_ttl(), config.public_base_url()?);
    Ok((records, blobs))
}
