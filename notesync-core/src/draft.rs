use crate::note::Attachment;

/// Pending form state held by the caller until a create goes through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub name: String,
    pub description: String,
    pub attachment: Option<Attachment>,
}

impl NoteDraft {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Whether a create would do anything with this draft.
    pub fn is_submittable(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.description.is_empty() && self.attachment.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
