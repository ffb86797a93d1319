//! Editing session over one open config document.
//!
//! A session holds two copies of the document: the working copy that
//! reflects every accepted change, and the snapshot taken when the document
//! was opened. The snapshot only serves resets and change detection.

use crate::backend::{BackendError, DocumentBackend, OpenedDocument};
use crate::fields::SectionSchema;
use redux_document::{Document, DocumentError, KeyPath, Value};
use redux_ipc::ErrorKind;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("File was patched but the editor copy could not follow: {0}")]
    OutOfSync(String),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Document(DocumentError::Parse { .. }) => ErrorKind::Parse,
            SessionError::Document(DocumentError::InvalidPath { .. })
            | SessionError::InvalidPath(_) => ErrorKind::InvalidPath,
            SessionError::Document(DocumentError::InvalidValue(_)) => ErrorKind::Rejected,
            SessionError::Backend(e) => e.kind,
            SessionError::OutOfSync(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    file_path: String,
    working: Document,
    original: Document,
    dirty: bool,
    last_error: Option<SessionError>,
}

impl Session {
    /// Parse `text` and start a clean session on `file_path`.
    pub fn open(text: &str, file_path: impl Into<String>) -> Result<Self, SessionError> {
        let working = Document::parse(text)?;
        let original = working.clone();
        let file_path = file_path.into();
        info!("Session opened on {}", file_path);
        Ok(Self {
            file_path,
            working,
            original,
            dirty: false,
            last_error: None,
        })
    }

    pub fn from_opened(opened: &OpenedDocument) -> Result<Self, SessionError> {
        Self::open(&opened.text, opened.file_path.clone())
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn working(&self) -> &Document {
        &self.working
    }

    pub fn original(&self) -> &Document {
        &self.original
    }

    pub fn value(&self, path: &KeyPath) -> Option<Value> {
        self.working.get(path)
    }

    pub fn original_value(&self, path: &KeyPath) -> Option<Value> {
        self.original.get(path)
    }

    /// Write `value` at `path` to the file, then mirror it in the working copy.
    ///
    /// On failure nothing in the session changes except `last_error`.
    pub async fn apply_field_patch(
        &mut self,
        backend: &dyn DocumentBackend,
        path: &KeyPath,
        value: Value,
    ) -> Result<(), SessionError> {
        if let Err(e) = backend.patch_value(&self.file_path, path, &value).await {
            warn!(path = %path, "Patch rejected: {}", e);
            return Err(self.fail(e.into()));
        }

        // The file already holds the new value at this point.
        if let Err(e) = self.working.set(path, &value) {
            warn!(path = %path, "Working copy diverged from file: {}", e);
            return Err(self.fail(SessionError::OutOfSync(e.to_string())));
        }

        self.dirty = true;
        self.last_error = None;
        debug!(path = %path, value = %value, "Field patched");
        Ok(())
    }

    /// Overwrite the file with the full working copy.
    pub async fn save_all(&mut self, backend: &dyn DocumentBackend) -> Result<(), SessionError> {
        let text = self.working.to_text();
        match backend.save_document(&self.file_path, &text).await {
            Ok(()) => {
                self.dirty = false;
                self.last_error = None;
                info!("Saved {} ({} bytes)", self.file_path, text.len());
                Ok(())
            }
            Err(e) => {
                warn!("Save of {} failed: {}", self.file_path, e);
                Err(self.fail(e.into()))
            }
        }
    }

    /// Restore the load-time value of one setting.
    pub async fn reset_field(&mut self, backend: &dyn DocumentBackend, path: &KeyPath) -> Result<(), SessionError> {
        let Some(original) = self.original.get(path) else {
            return Err(self.fail(SessionError::InvalidPath(format!(
                "'{}' is not present in the loaded document",
                path
            ))));
        };
        self.apply_field_patch(backend, path, original).await
    }

    /// Restore a whole section with one patch of its load-time subtree.
    pub async fn reset_section(
        &mut self,
        backend: &dyn DocumentBackend,
        section_path: &KeyPath,
    ) -> Result<(), SessionError> {
        info!(section = %section_path, "Resetting section");
        self.reset_field(backend, section_path).await
    }

    /// Whether the working value at `path` differs from the snapshot.
    pub fn is_field_changed(&self, path: &KeyPath) -> bool {
        self.working.get(path) != self.original.get(path)
    }

    pub fn changed_fields(&self, section: &SectionSchema) -> Vec<KeyPath> {
        section
            .fields
            .iter()
            .map(|field| section.field_path(field))
            .filter(|path| self.is_field_changed(path))
            .collect()
    }

    pub fn is_section_changed(&self, section: &SectionSchema) -> bool {
        !self.changed_fields(section).is_empty()
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        self.last_error = Some(err.clone());
        err
    }
}
