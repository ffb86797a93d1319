//! Softcore Redux IPC Protocol
//!
//! Framed request/response protocol between the untrusted editor surface and
//! the privileged file-access daemon, with deadlines, cancellation and
//! backpressure.
//!
//! Wire format: a fixed 14-byte header (`magic[4] | version u8 | flags u8 |
//! length u32 | crc32 u32`) followed by a bincode-encoded [`IpcMessage`].

mod client;

pub use client::{IpcClient, IpcConfig};

use redux_document::{KeyPath, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

/// IPC Protocol Errors
#[derive(Error, Debug)]
pub enum IpcError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] bincode::Error),
    #[error("Channel closed")]
    ChannelClosed,
    #[error("Request timeout")]
    Timeout,
    #[error("Request cancelled")]
    Cancelled,
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    #[error("Backpressure: too many pending requests")]
    Backpressure,
    #[error("{kind}: {message}")]
    Remote { kind: ErrorKind, message: String },
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Request ID for tracking RPC calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Base message envelope for all IPC communication
#[derive(Debug, Serialize, Deserialize)]
pub struct IpcMessage {
    pub id: RequestId,
    /// Absolute deadline in milliseconds since the UNIX epoch; 0 means none.
    pub deadline_millis: u64,
    pub payload: IpcPayload,
}

impl IpcMessage {
    /// Message without a deadline.
    pub fn new(id: RequestId, payload: IpcPayload) -> Self {
        Self {
            id,
            deadline_millis: 0,
            payload,
        }
    }

    pub fn response(id: RequestId, response: DaemonResponse) -> Self {
        Self::new(id, IpcPayload::Response(response))
    }

    pub fn is_expired(&self, now_millis: u64) -> bool {
        self.deadline_millis != 0 && now_millis > self.deadline_millis
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub enum IpcPayload {
    /// Request from the editor to the daemon
    Request(DaemonRequest),
    /// Response from the daemon to the editor
    Response(DaemonResponse),
    /// Cancellation of an in-flight request
    Cancel(RequestId),
}

/// Requests from the editor to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DaemonRequest {
    /// Health check
    Ping,
    /// Hold the document lock for the given milliseconds (diagnostics, cancel tests)
    Sleep { millis: u64 },
    /// Read and validate a config document
    OpenDocument { path: String },
    /// Open the configured default document
    AutoLoad,
    /// Set one value (or subtree) in the file on disk
    PatchValue {
        file_path: String,
        path: KeyPath,
        value: Value,
    },
    /// Overwrite the whole file with already-serialized text
    SaveDocument { file_path: String, text: String },
    /// Daemon runtime counters
    GetStats,
}

impl DaemonRequest {
    pub fn name(&self) -> &'static str {
        match self {
            DaemonRequest::Ping => "ping",
            DaemonRequest::Sleep { .. } => "sleep",
            DaemonRequest::OpenDocument { .. } => "open_document",
            DaemonRequest::AutoLoad => "auto_load",
            DaemonRequest::PatchValue { .. } => "patch_value",
            DaemonRequest::SaveDocument { .. } => "save_document",
            DaemonRequest::GetStats => "get_stats",
        }
    }
}

/// Responses from the daemon to the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DaemonResponse {
    Pong,
    /// Canonical path and raw text of an opened document
    DocumentOpened { file_path: String, text: String },
    Patched,
    Saved,
    /// Daemon runtime stats (metrics snapshot)
    Stats {
        cancels: u64,
        deadlines: u64,
        backpressure: u64,
    },
    Success,
    Error { kind: ErrorKind, message: String },
}

impl DaemonResponse {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        DaemonResponse::Error {
            kind,
            message: message.into(),
        }
    }
}

/// Failure categories carried by [`DaemonResponse::Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidPath,
    Parse,
    Io,
    Rejected,
    DeadlineExceeded,
    Backpressure,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::InvalidPath => "Invalid path",
            ErrorKind::Parse => "Parse error",
            ErrorKind::Io => "IO error",
            ErrorKind::Rejected => "Rejected",
            ErrorKind::DeadlineExceeded => "Deadline exceeded",
            ErrorKind::Backpressure => "Backpressure",
            ErrorKind::Internal => "Internal error",
        };
        f.write_str(text)
    }
}

/// Frame header preceding every payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct FrameHeader {
    magic: [u8; 4],
    version: u8,
    flags: u8,
    length: u32,
    checksum: u32,
}

pub const MAGIC_BYTES: [u8; 4] = *b"RDUX";
pub const PROTOCOL_VERSION: u8 = 1;
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;
/// Serialized header size: 4 + 1 + 1 + 4 + 4. Not `size_of::<FrameHeader>()`,
/// which may include padding.
pub const HEADER_SIZE: usize = 14;

/// Read a framed message with the default frame limit.
pub async fn read_ipc_message<R: AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<IpcMessage, IpcError> {
    read_ipc_message_cfg(reader, MAX_MESSAGE_SIZE).await
}

/// Read a framed message, rejecting frames larger than `max_message_size`.
pub async fn read_ipc_message_cfg<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    max_message_size: u32,
) -> Result<IpcMessage, IpcError> {
    let mut header_buf = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header_buf).await?;

    let header: FrameHeader = bincode::deserialize(&header_buf)?;

    if header.magic != MAGIC_BYTES {
        return Err(IpcError::InvalidFrame("Invalid magic bytes".to_string()));
    }

    if header.version != PROTOCOL_VERSION {
        return Err(IpcError::InvalidFrame(format!(
            "Unsupported protocol version: {}",
            header.version
        )));
    }

    if header.length > max_message_size {
        return Err(IpcError::InvalidFrame(format!(
            "Message too large: {} bytes",
            header.length
        )));
    }

    let mut payload_buf = vec![0u8; header.length as usize];
    reader.read_exact(&mut payload_buf).await?;

    if crc32fast::hash(&payload_buf) != header.checksum {
        return Err(IpcError::InvalidFrame("Checksum mismatch".to_string()));
    }

    Ok(bincode::deserialize(&payload_buf)?)
}

/// Write a framed message with the default frame limit.
pub async fn write_ipc_message<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    message: &IpcMessage,
) -> Result<(), IpcError> {
    write_ipc_message_cfg(writer, message, MAX_MESSAGE_SIZE).await
}

/// Write a framed message; nothing is written when the payload exceeds
/// `max_message_size`.
pub async fn write_ipc_message_cfg<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    message: &IpcMessage,
    max_message_size: u32,
) -> Result<(), IpcError> {
    let payload = bincode::serialize(message)?;

    if payload.len() > max_message_size as usize {
        return Err(IpcError::InvalidFrame(format!(
            "Message too large: {} bytes",
            payload.len()
        )));
    }

    let header = FrameHeader {
        magic: MAGIC_BYTES,
        version: PROTOCOL_VERSION,
        flags: 0,
        length: payload.len() as u32,
        checksum: crc32fast::hash(&payload),
    };

    let header_bytes = bincode::serialize(&header)?;
    writer.write_all(&header_bytes).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Milliseconds since the UNIX epoch.
pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
