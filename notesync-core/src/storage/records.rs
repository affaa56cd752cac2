use chrono::{SecondsFormat, Utc};
use futures::TryStreamExt;
use opendal::{EntryMode, ErrorKind, Operator};
use uuid::Uuid;

use crate::error::StoreError;
use crate::note::{ItemError, NewNote, Note};
use crate::store::{RecordCreated, RecordList, RecordStore};

/// Note records kept as one JSON document per note under `<root>/<id>.json`.
#[derive(Clone, Debug)]
pub struct OpendalRecordStore {
    op: Operator,
    root: String,
}

/// RFC 3339 in UTC with a fixed fraction width, so text order is time order.
pub fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn record_id_from_path(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.strip_suffix(".json").unwrap_or(name)
}

impl OpendalRecordStore {
    pub fn new(op: Operator, root: &str) -> Self {
        Self {
            op,
            root: root.trim_matches('/').to_string(),
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }

    pub fn record_path(&self, id: &str) -> String {
        format!("{}/{}.json", self.root, id)
    }

    fn records_dir(&self) -> String {
        format!("{}/", self.root)
    }
}

impl RecordStore for OpendalRecordStore {
    async fn list(&self) -> Result<RecordList, StoreError> {
        let mut listed = RecordList::default();
        let mut lister = match self.op.lister(&self.records_dir()).await {
            Ok(lister) => lister,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(listed),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = lister.try_next().await? {
            if entry.metadata().mode() != EntryMode::FILE || !entry.path().ends_with(".json") {
                continue;
            }
            let path = entry.path().to_string();
            let bytes = match self.op.read(&path).await {
                Ok(bytes) => bytes,
                // Removed between listing and reading.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            match serde_json::from_slice::<Note>(&bytes.to_vec()) {
                Ok(note) => listed.records.push(note),
                Err(e) => listed.errors.push(ItemError::for_record(
                    record_id_from_path(&path),
                    format!("unreadable record {}: {}", path, e),
                )),
            }
        }

        Ok(listed)
    }

    async fn create(&self, fields: NewNote) -> Result<RecordCreated, StoreError> {
        if fields.name.trim().is_empty() {
            return Ok(RecordCreated {
                record: None,
                errors: vec![ItemError::new("name is required")],
            });
        }

        let note = Note {
            id: Uuid::new_v4().to_string(),
            name: fields.name,
            description: fields.description,
            image: fields.image,
            created_at: now_ts(),
            image_url: None,
        };
        let json = serde_json::to_vec_pretty(&note).map_err(|e| StoreError::InvalidRecord {
            path: self.record_path(&note.id),
            reason: e.to_string(),
        })?;
        self.op.write(&self.record_path(&note.id), json).await?;

        Ok(RecordCreated {
            record: Some(note),
            errors: vec![],
        })
    }

    async fn delete(&self, id: &str) -> Result<Vec<ItemError>, StoreError> {
        let path = self.record_path(id);
        if !self.op.exists(&path).await? {
            return Ok(vec![ItemError::for_record(id, "record not found")]);
        }
        self.op.delete(&path).await?;
        Ok(vec![])
    }
}
