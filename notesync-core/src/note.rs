use serde::{Deserialize, Serialize};

/// A note as held in the view model.
///
/// `image_url` is derived from `image` on every refresh and never written
/// back to a store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(skip)]
    pub image_url: Option<String>,
}

impl Note {
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Fields sent to the record store when creating a note.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

/// A file staged for upload alongside a new note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Per-record diagnostic returned next to an otherwise successful store call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ItemError {
    pub message: String,
    #[serde(default)]
    pub record_id: Option<String>,
}

impl ItemError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            record_id: None,
        }
    }

    pub fn for_record(record_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            record_id: Some(record_id.into()),
        }
    }
}

impl std::fmt::Display for ItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.record_id {
            Some(id) => write!(f, "{} (record {})", self.message, id),
            None => f.write_str(&self.message),
        }
    }
}

/// Newest first by `created_at`, compared as text. Empty timestamps end up last.
pub fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
