use anyhow::Result;
use notesync_core::storage::{OpendalBlobStore, OpendalRecordStore};
use notesync_core::{
    BlobStore, ItemError, NewNote, Note, RecordCreated, RecordList, RecordStore, StoreError,
};
use opendal::services::Memory;
use opendal::Operator;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Barrier, Notify};
use url::Url;

#[allow(dead_code)]
pub const RECORDS_ROOT: &str = "records";

#[allow(dead_code)]
pub const CDN_BASE: &str = "https://cdn.example.test/";

#[allow(dead_code)]
pub fn setup_operator() -> Result<Operator> {
    let builder = Memory::default();
    let op = Operator::new(builder)?.finish();
    Ok(op)
}

#[allow(dead_code)]
pub fn setup_stores(op: &Operator) -> Result<(OpendalRecordStore, OpendalBlobStore)> {
    let records = OpendalRecordStore::new(op.clone(), RECORDS_ROOT);
    let blobs = OpendalBlobStore::new(
        op.clone(),
        Duration::from_secs(900),
        Some(Url::parse(CDN_BASE)?),
    );
    Ok((records, blobs))
}

/// Store a record document as-is, bypassing id and timestamp assignment.
#[allow(dead_code)]
pub async fn write_record(op: &Operator, note: &Note) -> Result<()> {
    let path = format!("{}/{}.json", RECORDS_ROOT, note.id);
    op.write(&path, serde_json::to_vec_pretty(note)?).await?;
    Ok(())
}

#[allow(dead_code)]
pub fn note(id: &str, name: &str, created_at: &str, image: Option<&str>) -> Note {
    Note {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        image: image.map(str::to_string),
        created_at: created_at.to_string(),
        image_url: None,
    }
}

/// Ordered record of every store call, shared by both wrappers.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

#[allow(dead_code)]
impl CallLog {
    pub fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

#[allow(dead_code)]
pub struct FlakyRecordStore {
    inner: OpendalRecordStore,
    log: CallLog,
    pub fail_list: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
    pub extra_list_errors: Mutex<Vec<ItemError>>,
}

#[allow(dead_code)]
impl FlakyRecordStore {
    pub fn new(inner: OpendalRecordStore, log: CallLog) -> Self {
        Self {
            inner,
            log,
            fail_list: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            extra_list_errors: Mutex::new(Vec::new()),
        }
    }
}

impl RecordStore for FlakyRecordStore {
    async fn list(&self) -> Result<RecordList, StoreError> {
        self.log.push("records.list".to_string());
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied("list".to_string()));
        }
        let mut listed = self.inner.list().await?;
        listed
            .errors
            .extend(self.extra_list_errors.lock().unwrap().iter().cloned());
        Ok(listed)
    }

    async fn create(&self, fields: NewNote) -> Result<RecordCreated, StoreError> {
        self.log.push(format!("records.create {}", fields.name));
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied("create".to_string()));
        }
        self.inner.create(fields).await
    }

    async fn delete(&self, id: &str) -> Result<Vec<ItemError>, StoreError> {
        self.log.push(format!("records.delete {}", id));
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied("delete".to_string()));
        }
        self.inner.delete(id).await
    }
}

#[allow(dead_code)]
pub struct FlakyBlobStore {
    inner: OpendalBlobStore,
    log: CallLog,
    upload_gate: Option<Arc<Notify>>,
    resolve_barrier: Option<Arc<Barrier>>,
    pub fail_upload: AtomicBool,
    pub fail_remove: AtomicBool,
    pub fail_resolve: Mutex<HashSet<String>>,
}

#[allow(dead_code)]
impl FlakyBlobStore {
    pub fn new(inner: OpendalBlobStore, log: CallLog) -> Self {
        Self {
            inner,
            log,
            upload_gate: None,
            resolve_barrier: None,
            fail_upload: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
            fail_resolve: Mutex::new(HashSet::new()),
        }
    }

    /// Uploads wait for one notification before doing anything.
    pub fn with_upload_gate(mut self, gate: Arc<Notify>) -> Self {
        self.upload_gate = Some(gate);
        self
    }

    /// Every resolve waits until the barrier's full party has arrived.
    pub fn with_resolve_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.resolve_barrier = Some(barrier);
        self
    }

    pub fn fail_resolve_for(&self, path: &str) {
        self.fail_resolve.lock().unwrap().insert(path.to_string());
    }
}

impl BlobStore for FlakyBlobStore {
    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<(), StoreError> {
        if let Some(gate) = &self.upload_gate {
            gate.notified().await;
        }
        self.log.push(format!("blobs.upload {}", path));
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied(path.to_string()));
        }
        self.inner.upload(path, data).await
    }

    async fn resolve_url(&self, path: &str) -> Result<String, StoreError> {
        self.log.push(format!("blobs.resolve {}", path));
        if let Some(barrier) = &self.resolve_barrier {
            barrier.wait().await;
        }
        if self.fail_resolve.lock().unwrap().contains(path) {
            return Err(StoreError::PermissionDenied(path.to_string()));
        }
        self.inner.resolve_url(path).await
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.log.push(format!("blobs.remove {}", path));
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied(path.to_string()));
        }
        self.inner.remove(path).await
    }
}

#[allow(dead_code)]
pub type TestWorkflow = notesync_core::NoteSyncWorkflow<FlakyRecordStore, FlakyBlobStore>;

#[allow(dead_code)]
pub fn setup_workflow(op: &Operator) -> Result<(TestWorkflow, CallLog)> {
    let (records, blobs) = setup_stores(op)?;
    let log = CallLog::default();
    let workflow = notesync_core::NoteSyncWorkflow::new(
        FlakyRecordStore::new(records, log.clone()),
        FlakyBlobStore::new(blobs, log.clone()),
    );
    Ok((workflow, log))
}
