//! Where the editor's file operations go.
//!
//! The editor never touches the config file itself. It talks to a
//! [`DocumentBackend`]: normally the daemon over IPC, or an in-process
//! [`DocumentService`] when running without one.

use async_trait::async_trait;
use redux_core::{CoreError, DocumentService};
use redux_document::{KeyPath, Value};
use redux_ipc::{ErrorKind, IpcClient, IpcError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: ErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<IpcError> for BackendError {
    fn from(err: IpcError) -> Self {
        match err {
            IpcError::Remote { kind, message } => BackendError { kind, message },
            IpcError::Timeout => BackendError::new(ErrorKind::DeadlineExceeded, "request timed out"),
            IpcError::Backpressure => BackendError::new(ErrorKind::Backpressure, err.to_string()),
            IpcError::ConnectionFailed(_) | IpcError::IoError(_) | IpcError::ChannelClosed => {
                BackendError::new(ErrorKind::Io, err.to_string())
            }
            other => BackendError::new(ErrorKind::Internal, other.to_string()),
        }
    }
}

impl From<CoreError> for BackendError {
    fn from(err: CoreError) -> Self {
        BackendError::new(err.kind(), err.message())
    }
}

/// A document as handed out by the privileged layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenedDocument {
    /// Canonical path to use for later patches and saves
    pub file_path: String,
    pub text: String,
}

#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn open_document(&self, path: &str) -> Result<OpenedDocument, BackendError>;

    async fn auto_load(&self) -> Result<OpenedDocument, BackendError>;

    async fn patch_value(&self, file_path: &str, path: &KeyPath, value: &Value) -> Result<(), BackendError>;

    async fn save_document(&self, file_path: &str, text: &str) -> Result<(), BackendError>;
}

/// Backend that forwards every call to the daemon.
pub struct IpcBackend {
    client: IpcClient,
}

impl IpcBackend {
    pub fn new(client: IpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentBackend for IpcBackend {
    async fn open_document(&self, path: &str) -> Result<OpenedDocument, BackendError> {
        let (file_path, text) = self.client.open_document(path).await?;
        Ok(OpenedDocument { file_path, text })
    }

    async fn auto_load(&self) -> Result<OpenedDocument, BackendError> {
        let (file_path, text) = self.client.auto_load().await?;
        Ok(OpenedDocument { file_path, text })
    }

    async fn patch_value(&self, file_path: &str, path: &KeyPath, value: &Value) -> Result<(), BackendError> {
        Ok(self.client.patch_value(file_path, path, value).await?)
    }

    async fn save_document(&self, file_path: &str, text: &str) -> Result<(), BackendError> {
        Ok(self.client.save_document(file_path, text).await?)
    }
}

/// In-process backend for running without a daemon, and for tests.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    service: DocumentService,
}

impl LocalBackend {
    pub fn new(service: DocumentService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl DocumentBackend for LocalBackend {
    async fn open_document(&self, path: &str) -> Result<OpenedDocument, BackendError> {
        let loaded = self.service.load_document(path).await?;
        Ok(OpenedDocument {
            file_path: loaded.path.to_string_lossy().into_owned(),
            text: loaded.text,
        })
    }

    async fn auto_load(&self) -> Result<OpenedDocument, BackendError> {
        let loaded = self.service.auto_load().await?;
        Ok(OpenedDocument {
            file_path: loaded.path.to_string_lossy().into_owned(),
            text: loaded.text,
        })
    }

    async fn patch_value(&self, file_path: &str, path: &KeyPath, value: &Value) -> Result<(), BackendError> {
        Ok(self.service.patch_value(file_path, path, value).await?)
    }

    async fn save_document(&self, file_path: &str, text: &str) -> Result<(), BackendError> {
        Ok(self.service.save_document(file_path, text).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_map_to_io() {
        let err: BackendError = IpcError::ChannelClosed.into();
        assert_eq!(err.kind, ErrorKind::Io);
        let err: BackendError = IpcError::Timeout.into();
        assert_eq!(err.kind, ErrorKind::DeadlineExceeded);
    }

    #[test]
    fn remote_errors_keep_their_kind() {
        let err: BackendError = IpcError::Remote {
            kind: ErrorKind::InvalidPath,
            message: "key 'x' not found".to_string(),
        }
        .into();
        assert_eq!(err, BackendError::new(ErrorKind::InvalidPath, "key 'x' not found"));
        assert_eq!(err.to_string(), "Invalid path: key 'x' not found");
    }

    #[test]
    fn core_errors_drop_their_prefix() {
        let err: BackendError = CoreError::Rejected("not a regular file".into()).into();
        assert_eq!(err.to_string(), "Rejected: not a regular file");
    }
}
