use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::attachment::ATTACHMENT_PREFIX;

pub const DEFAULT_RECORDS_ROOT: &str = "records";
pub const DEFAULT_URL_TTL_SECS: u64 = 900;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Any URI opendal understands, e.g. `fs:///var/lib/notesync` or `memory://`.
    pub uri: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NoteSyncConfig {
    pub storage: StorageConfig,
    #[serde(default = "default_records_root")]
    pub records_root: String,
    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,
    /// Used to build display URLs when the service cannot presign.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_records_root() -> String {
    DEFAULT_RECORDS_ROOT.to_string()
}

fn default_url_ttl_secs() -> u64 {
    DEFAULT_URL_TTL_SECS
}

impl NoteSyncConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            storage: StorageConfig { uri: uri.into() },
            records_root: default_records_root(),
            url_ttl_secs: default_url_ttl_secs(),
            public_base_url: None,
        }
    }

    pub fn with_public_base_url(mut self, base: impl Into<String>) -> Self {
        self.public_base_url = Some(base.into());
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: NoteSyncConfig =
            serde_yaml::from_str(yaml).context("failed to parse notesync config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.uri.trim().is_empty() {
            return Err(anyhow!("storage.uri must not be empty"));
        }
        if self.records_root.trim_matches('/').is_empty() {
            return Err(anyhow!("records_root must not be empty"));
        }
        let root = self.records_root.trim_matches('/');
        let attachments = ATTACHMENT_PREFIX.trim_end_matches('/');
        if root == attachments
            || root.starts_with(ATTACHMENT_PREFIX)
            || attachments.starts_with(&format!("{}/", root))
        {
            return Err(anyhow!(
                "records_root {} overlaps the attachment prefix {}",
                self.records_root,
                ATTACHMENT_PREFIX
            ));
        }
        if self.url_ttl_secs == 0 {
            return Err(anyhow!("url_ttl_secs must be greater than zero"));
        }
        self.public_base_url()?;
        Ok(())
    }

    pub fn url_ttl(&self) -> Duration {
        Duration::from_secs(self.url_ttl_secs)
    }

    /// Parsed base URL, always ending in `/` so joined paths append to it.
    pub fn public_base_url(&self) -> Result<Option<Url>> {
        let Some(raw) = self.public_base_url.as_deref() else {
            return Ok(None);
        };
        let mut normalized = raw.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let url = Url::parse(&normalized)
            .map_err(|e| anyhow!("Invalid public_base_url {}: {}", raw, e))?;
        if url.cannot_be_a_base() {
            return Err(anyhow!("Invalid public_base_url {}: cannot carry a path", raw));
        }
        Ok(Some(url))
    }
}
