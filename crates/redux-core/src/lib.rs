//! Softcore Redux Core
//!
//! The privileged side of the editor: everything that touches the config
//! file on disk. The editor surface never writes files itself; it asks this
//! layer to patch one value, to save a fully serialized document, or to load
//! a document for editing.

mod policy;

pub use policy::PathPolicy;

use redux_document::{Document, DocumentError, KeyPath, Value};
use redux_ipc::ErrorKind;
use redux_settings::Settings;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Core errors
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("IO error: {0}")]
    IoErrorString(String),
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Settings error: {0}")]
    SettingsError(#[from] redux_settings::SettingsError),
}

impl CoreError {
    /// Category reported to clients over IPC.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidPath(_) => ErrorKind::InvalidPath,
            CoreError::Parse(_) => ErrorKind::Parse,
            CoreError::InvalidValue(_) | CoreError::Rejected(_) => ErrorKind::Rejected,
            CoreError::IoError(_) | CoreError::IoErrorString(_) => ErrorKind::Io,
            CoreError::SettingsError(_) => ErrorKind::Internal,
        }
    }

    /// The error text without its category prefix.
    pub fn message(&self) -> String {
        match self {
            CoreError::InvalidPath(m)
            | CoreError::Parse(m)
            | CoreError::InvalidValue(m)
            | CoreError::IoErrorString(m)
            | CoreError::Rejected(m) => m.clone(),
            CoreError::IoError(e) => e.to_string(),
            CoreError::SettingsError(e) => e.to_string(),
        }
    }
}

impl From<DocumentError> for CoreError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Parse {
                line,
                column,
                message,
            } => CoreError::Parse(format!("line {}, column {}: {}", line, column, message)),
            DocumentError::InvalidPath { path, reason } => {
                CoreError::InvalidPath(format!("{}: {}", path, reason))
            }
            DocumentError::InvalidValue(message) => CoreError::InvalidValue(message),
        }
    }
}

/// A document read from disk and checked to parse.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// Canonical location; later patch and save calls should use it.
    pub path: PathBuf,
    pub text: String,
}

/// File operations on config documents.
///
/// Stateless apart from configuration: every call goes back to disk, so an
/// edit made outside the editor between two patches is picked up by the
/// second one.
#[derive(Debug, Clone)]
pub struct DocumentService {
    policy: PathPolicy,
    default_document: PathBuf,
}

impl DocumentService {
    pub fn new(policy: PathPolicy, default_document: PathBuf) -> Self {
        Self {
            policy,
            default_document,
        }
    }

    /// Build from settings, resolving the auto-load path against the
    /// running executable.
    pub fn from_settings(settings: &Settings) -> Result<Self, CoreError> {
        let policy = PathPolicy::new(settings.editor.allowed_extensions.iter().cloned());
        let default_document = settings.editor.resolved_config_path()?;
        Ok(Self::new(policy, default_document))
    }

    pub fn default_document(&self) -> &Path {
        &self.default_document
    }

    /// Read `path` and make sure it parses.
    pub async fn load_document<P: AsRef<Path>>(&self, path: P) -> Result<LoadedDocument, CoreError> {
        let path = self.policy.check(path.as_ref()).await?;
        let text = read_text(&path).await?;
        Document::parse(&text)?;
        tracing::info!("Loaded document {}", path.display());
        Ok(LoadedDocument { path, text })
    }

    /// Load the configured default document.
    pub async fn auto_load(&self) -> Result<LoadedDocument, CoreError> {
        tracing::debug!("Auto-loading {}", self.default_document.display());
        self.load_document(&self.default_document).await
    }

    /// Set `path` to `value` in the file at `file_path`.
    ///
    /// The file is re-read and re-parsed on every call. When the key path
    /// does not resolve nothing is written.
    pub async fn patch_value<P: AsRef<Path>>(
        &self,
        file_path: P,
        path: &KeyPath,
        value: &Value,
    ) -> Result<(), CoreError> {
        let file_path = self.policy.check(file_path.as_ref()).await?;
        let text = read_text(&file_path).await?;
        let mut document = Document::parse(&text)?;
        document.set(path, value)?;
        write_text(&file_path, &document.to_text()).await?;
        tracing::info!(path = %path, "Patched {}", file_path.display());
        Ok(())
    }

    /// Overwrite `file_path` with `text`, which must parse.
    pub async fn save_document<P: AsRef<Path>>(
        &self,
        file_path: P,
        text: &str,
    ) -> Result<(), CoreError> {
        let file_path = self.policy.check(file_path.as_ref()).await?;
        Document::parse(text)?;
        write_text(&file_path, text).await?;
        tracing::info!("Saved {} ({} bytes)", file_path.display(), text.len());
        Ok(())
    }
}

async fn read_text(path: &Path) -> Result<String, CoreError> {
    fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::IoErrorString(format!("Cannot read {}: {}", path.display(), e)))
}

async fn write_text(path: &Path, text: &str) -> Result<(), CoreError> {
    fs::write(path, text)
        .await
        .map_err(|e| CoreError::IoErrorString(format!("Cannot write to {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "{\n  // toggles\n  \"otherTweaks\": {\n    \"enabled\": true\n  }\n}\n";

    fn service() -> DocumentService {
        DocumentService::new(PathPolicy::default(), PathBuf::from("config.json5"))
    }

    #[tokio::test]
    async fn patch_rewrites_only_the_target() {
        let dir = tempfile::tempdir().expect("tmp");
        let file = dir.path().join("config.json5");
        std::fs::write(&file, CONFIG).expect("write");

        service()
            .patch_value(&file, &KeyPath::from("otherTweaks.enabled"), &Value::from(false))
            .await
            .expect("patch");
        let text = std::fs::read_to_string(&file).expect("read");
        assert_eq!(text, CONFIG.replace("true", "false"));
    }

    #[tokio::test]
    async fn invalid_path_leaves_file_untouched() {
        let dir = tempfile::tempdir().expect("tmp");
        let file = dir.path().join("config.json5");
        std::fs::write(&file, CONFIG).expect("write");

        let err = service()
            .patch_value(&file, &KeyPath::from("missing.enabled"), &Value::from(true))
            .await
            .expect_err("invalid path");
        assert!(matches!(err, CoreError::InvalidPath(_)));
        assert_eq!(std::fs::read_to_string(&file).expect("read"), CONFIG);
    }

    #[tokio::test]
    async fn save_refuses_unparseable_text() {
        let dir = tempfile::tempdir().expect("tmp");
        let file = dir.path().join("config.json5");
        std::fs::write(&file, CONFIG).expect("write");

        let err = service()
            .save_document(&file, "{ \"a\": ")
            .await
            .expect_err("parse");
        assert!(matches!(err, CoreError::Parse(_)));
        assert_eq!(std::fs::read_to_string(&file).expect("read"), CONFIG);
    }

    #[test]
    fn document_errors_map_to_core_errors() {
        let err: CoreError = DocumentError::InvalidPath {
            path: "a.b".to_string(),
            reason: "key 'a' not found".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Invalid path: a.b: key 'a' not found");
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
        assert_eq!(err.message(), "a.b: key 'a' not found");
        assert_eq!(CoreError::Rejected("no".into()).kind(), ErrorKind::Rejected);
    }
}
