//! Keeps a display-ready list of notes in step with the record and blob
//! stores.
//!
//! Every mutation ends with a refresh, and the cached list is only ever
//! replaced wholesale by that refresh. Overlapping calls are not queued or
//! rejected; callers are expected to check [`NoteSyncWorkflow::state`] and hold
//! off while it reports [`WorkflowState::Busy`].

use futures::future::join_all;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::attachment::new_attachment_path;
use crate::draft::NoteDraft;
use crate::error::WorkflowError;
use crate::note::{sort_newest_first, Attachment, ItemError, NewNote, Note};
use crate::store::{BlobStore, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Busy,
}

/// Something that went wrong without failing the surrounding operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Reported by the record store next to a successful call.
    Item(ItemError),
    /// The note is kept, just without a display url.
    UnresolvedImage {
        note_id: String,
        path: String,
        reason: String,
    },
    /// The record was still deleted; the blob is orphaned.
    AttachmentCleanup {
        note_id: String,
        path: String,
        reason: String,
    },
    /// The refresh that closes a mutation did not go through.
    Refresh(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Item(err) => write!(f, "record store reported: {}", err),
            Warning::UnresolvedImage {
                note_id,
                path,
                reason,
            } => write!(
                f,
                "image {} of note {} could not be resolved: {}",
                path, note_id, reason
            ),
            Warning::AttachmentCleanup {
                note_id,
                path,
                reason,
            } => write!(
                f,
                "attachment {} of note {} was not removed: {}",
                path, note_id, reason
            ),
            Warning::Refresh(reason) => write!(f, "refresh after mutation failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Refreshed {
    pub notes: Vec<Note>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Default)]
pub struct Created {
    /// As returned by the record store.
    pub record: Option<Note>,
    pub warnings: Vec<Warning>,
}

/// Holds the workflow in `Busy` until dropped.
struct BusyGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> BusyGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self { in_flight }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn item_warnings(errors: Vec<ItemError>, during: &str) -> Vec<Warning> {
    errors
        .into_iter()
        .map(|err| {
            tracing::warn!(during, record_id = ?err.record_id, "{}", err.message);
            Warning::Item(err)
        })
        .collect()
}

pub struct NoteSyncWorkflow<R, B> {
    records: R,
    blobs: B,
    notes: RwLock<Vec<Note>>,
    in_flight: AtomicUsize,
}

impl<R, B> NoteSyncWorkflow<R, B>
where
    R: RecordStore,
    B: BlobStore,
{
    pub fn new(records: R, blobs: B) -> Self {
        Self {
            records,
            blobs,
            notes: RwLock::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> WorkflowState {
        if self.in_flight.load(Ordering::SeqCst) == 0 {
            WorkflowState::Idle
        } else {
            WorkflowState::Busy
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state() == WorkflowState::Busy
    }

    /// Snapshot of the view model as of the last successful refresh.
    pub fn notes(&self) -> Vec<Note> {
        self.notes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Hand the stores back to the caller for teardown.
    pub fn into_parts(self) -> (R, B) {
        (self.records, self.blobs)
    }

    /// Re-list every record, resolve image urls and replace the view model.
    ///
    /// Only a failing list call is an error; item errors and unresolvable
    /// images come back as warnings.
    pub async fn refresh(&self) -> Result<Refreshed, WorkflowError> {
        let _busy = BusyGuard::enter(&self.in_flight);
        self.reload().await
    }

    /// Upload the attachment (if any), create the record, then refresh.
    ///
    /// Returns `Ok(None)` without touching either store when `name` is blank.
    /// An upload failure aborts before the record is created.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        attachment: Option<Attachment>,
    ) -> Result<Option<Created>, WorkflowError> {
        let name = name.trim();
        if name.is_empty() {
            tracing::debug!("refusing to create a note with a blank name");
            return Ok(None);
        }
        let description = description.map(str::trim).unwrap_or_default().to_string();
        let _busy = BusyGuard::enter(&self.in_flight);

        // 1. Upload attachment
        let image = match attachment {
            Some(attachment) => {
                let path = new_attachment_path(&attachment.filename);
                if let Err(source) = self.blobs.upload(&path, attachment.data).await {
                    tracing::warn!(path = %path, error = %source, "attachment upload failed, note not created");
                    return Err(WorkflowError::Upload { path, source });
                }
                Some(path)
            }
            None => None,
        };

        // 2. Create record
        let created = self
            .records
            .create(NewNote {
                name: name.to_string(),
                description,
                image,
            })
            .await;

        // 3. Refresh whatever happened above
        let mut warnings = Vec::new();
        let created = match created {
            Ok(created) => created,
            Err(e) => {
                tracing::warn!(error = %e, "record create failed");
                self.refresh_after_mutation(&mut warnings).await;
                return Err(WorkflowError::Records(e));
            }
        };
        warnings.extend(item_warnings(created.errors, "create"));
        self.refresh_after_mutation(&mut warnings).await;

        if let Some(record) = &created.record {
            tracing::info!(note_id = %record.id, has_image = record.has_image(), "note created");
        }
        Ok(Some(Created {
            record: created.record,
            warnings,
        }))
    }

    /// [`Self::create`] from a caller-held draft; the draft is cleared once a
    /// record exists.
    pub async fn create_from_draft(
        &self,
        draft: &mut NoteDraft,
    ) -> Result<Option<Created>, WorkflowError> {
        let created = self
            .create(
                &draft.name,
                Some(draft.description.as_str()),
                draft.attachment.clone(),
            )
            .await?;
        if created.as_ref().is_some_and(|c| c.record.is_some()) {
            draft.clear();
        }
        Ok(created)
    }

    /// Remove the attachment (best effort), delete the record, then refresh.
    ///
    /// A failed attachment removal never stops the record delete.
    pub async fn remove(&self, note: &Note) -> Result<Vec<Warning>, WorkflowError> {
        if note.id.trim().is_empty() {
            tracing::debug!("refusing to remove a note without an id");
            return Ok(vec![]);
        }
        let _busy = BusyGuard::enter(&self.in_flight);
        let mut warnings = Vec::new();

        // 1. Attachment cleanup
        if let Some(path) = note.image.as_deref().filter(|p| !p.is_empty()) {
            if let Err(e) = self.blobs.remove(path).await {
                tracing::warn!(note_id = %note.id, path, error = %e, "attachment cleanup failed, deleting record anyway");
                warnings.push(Warning::AttachmentCleanup {
                    note_id: note.id.clone(),
                    path: path.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        // 2. Delete record
        let deleted = match self.records.delete(&note.id).await {
            Ok(errors) => {
                warnings.extend(item_warnings(errors, "delete"));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(note_id = %note.id, error = %e, "record delete failed");
                Err(WorkflowError::Records(e))
            }
        };

        // 3. Refresh
        self.refresh_after_mutation(&mut warnings).await;

        deleted?;
        tracing::info!(note_id = %note.id, "note removed");
        Ok(warnings)
    }

    async fn reload(&self) -> Result<Refreshed, WorkflowError> {
        let listed = self.records.list().await.map_err(WorkflowError::Records)?;
        let mut warnings = item_warnings(listed.errors, "list");

        let resolved = join_all(
            listed
                .records
                .into_iter()
                .map(|note| self.resolve_image(note)),
        )
        .await;

        let mut notes = Vec::with_capacity(resolved.len());
        for (note, warning) in resolved {
            warnings.extend(warning);
            notes.push(note);
        }
        sort_newest_first(&mut notes);

        *self.notes.write().unwrap_or_else(PoisonError::into_inner) = notes.clone();
        tracing::debug!(count = notes.len(), warnings = warnings.len(), "notes refreshed");
        Ok(Refreshed { notes, warnings })
    }

    async fn resolve_image(&self, mut note: Note) -> (Note, Option<Warning>) {
        note.image_url = None;
        let Some(path) = note.image.clone().filter(|p| !p.is_empty()) else {
            return (note, None);
        };
        match self.blobs.resolve_url(&path).await {
            Ok(url) => {
                note.image_url = Some(url);
                (note, None)
            }
            Err(e) => {
                tracing::warn!(note_id = %note.id, path = %path, error = %e, "image url unavailable");
                let warning = Warning::UnresolvedImage {
                    note_id: note.id.clone(),
                    path,
                    reason: e.to_string(),
                };
                (note, Some(warning))
            }
        }
    }

    async fn refresh_after_mutation(&self, warnings: &mut Vec<Warning>) {
        match self.reload().await {
            Ok(refreshed) => warnings.extend(refreshed.warnings),
            Err(e) => {
                tracing::warn!(error = %e, "refresh after mutation failed");
                warnings.push(Warning::Refresh(e.to_string()));
            }
        }
    }
}
