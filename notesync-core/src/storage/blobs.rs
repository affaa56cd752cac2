use anyhow::anyhow;
use opendal::{ErrorKind, Operator};
use std::time::Duration;
use url::Url;

use crate::error::StoreError;
use crate::store::BlobStore;

/// Attachment objects stored directly at their path.
///
/// Display URLs are presigned when the service supports it; otherwise they
/// are joined onto `public_base_url`.
#[derive(Clone, Debug)]
pub struct OpendalBlobStore {
    op: Operator,
    url_ttl: Duration,
    public_base_url: Option<Url>,
}

impl OpendalBlobStore {
    pub fn new(op: Operator, url_ttl: Duration, public_base_url: Option<Url>) -> Self {
        Self {
            op,
            url_ttl,
            public_base_url,
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }

    async fn ensure_exists(&self, path: &str) -> Result<(), StoreError> {
        if !self.op.exists(path).await? {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> Result<String, StoreError> {
        let base = self.public_base_url.as_ref().ok_or_else(|| {
            StoreError::Unsupported(format!(
                "no presigning and no public base url to resolve {}",
                path
            ))
        })?;
        // Segments are percent-encoded, so `#`, `?` and `%` stay part of the path.
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Other(anyhow!("cannot build url for {} from {}", path, base)))?
            .pop_if_empty()
            .extend(path.trim_start_matches('/').split('/'));
        Ok(url.to_string())
    }
}

impl BlobStore for OpendalBlobStore {
    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<(), StoreError> {
        self.op.write(path, data).await?;
        Ok(())
    }

    async fn resolve_url(&self, path: &str) -> Result<String, StoreError> {
        self.ensure_exists(path).await?;
        match self.op.presign_read(path, self.url_ttl).await {
            Ok(presigned) => Ok(presigned.uri().to_string()),
            Err(e) if e.kind() == ErrorKind::Unsupported => self.public_url(path),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.ensure_exists(path).await?;
        self.op.delete(path).await?;
        Ok(())
    }
}
