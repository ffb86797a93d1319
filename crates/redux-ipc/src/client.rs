//! Editor-side IPC client

use crate::{
    now_millis, read_ipc_message_cfg, write_ipc_message_cfg, DaemonRequest, DaemonResponse,
    IpcError, IpcMessage, IpcPayload, RequestId, MAX_MESSAGE_SIZE,
};
use redux_document::{KeyPath, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{BufReader, BufWriter};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_RETRIES: usize = 3;

/// IPC client configuration
#[derive(Debug, Clone)]
pub struct IpcConfig {
    pub request_timeout: Duration,
    pub max_message_size: u32,
    pub max_pending_requests: usize,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_message_size: MAX_MESSAGE_SIZE,
            max_pending_requests: 10_000,
        }
    }
}

type PendingMap = HashMap<RequestId, oneshot::Sender<Result<DaemonResponse, IpcError>>>;

/// Connection to the daemon. Requests are multiplexed over one socket and
/// matched to responses by [`RequestId`].
pub struct IpcClient {
    sender: mpsc::UnboundedSender<IpcMessage>,
    pending_requests: Arc<Mutex<PendingMap>>,
    connected: Arc<AtomicBool>,
    config: IpcConfig,
}

impl IpcClient {
    pub async fn connect<A: ToSocketAddrs + Clone>(socket_addr: A) -> Result<Self, IpcError> {
        Self::connect_with_config(socket_addr, IpcConfig::default()).await
    }

    /// Connect with explicit configuration and verify the link with a ping.
    pub async fn connect_with_config<A: ToSocketAddrs + Clone>(
        socket_addr: A,
        config: IpcConfig,
    ) -> Result<Self, IpcError> {
        let stream = Self::connect_with_retry(socket_addr, CONNECT_RETRIES)
            .await
            .map_err(|e| IpcError::ConnectionFailed(format!("Failed to connect: {}", e)))?;

        let (sender, receiver) = mpsc::unbounded_channel::<IpcMessage>();
        let client = Self {
            sender,
            pending_requests: Arc::new(Mutex::new(HashMap::new())),
            connected: Arc::new(AtomicBool::new(true)),
            config,
        };
        client.start_connection_handler(stream, receiver);

        match timeout(Duration::from_secs(5), client.ping()).await {
            Ok(Ok(())) => Ok(client),
            Ok(Err(e)) => Err(IpcError::ConnectionFailed(format!("Ping failed: {}", e))),
            Err(_) => Err(IpcError::ConnectionFailed("Connection timeout".to_string())),
        }
    }

    /// Attempt connection with exponential backoff
    async fn connect_with_retry<A: ToSocketAddrs + Clone>(
        socket_addr: A,
        max_retries: usize,
    ) -> Result<TcpStream, IpcError> {
        let mut delay = Duration::from_millis(100);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match TcpStream::connect(socket_addr.clone()).await {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) if attempt >= max_retries => return Err(IpcError::IoError(e)),
                Err(e) => {
                    debug!(attempt, error = %e, "connect failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, Duration::from_secs(5));
                }
            }
        }
    }

    fn start_connection_handler(
        &self,
        stream: TcpStream,
        mut receiver: mpsc::UnboundedReceiver<IpcMessage>,
    ) {
        let (read_stream, write_stream) = stream.into_split();
        let mut reader = BufReader::new(read_stream);
        let mut writer = BufWriter::new(write_stream);
        let max_frame = self.config.max_message_size;

        let writer_task = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                if let Err(e) = write_ipc_message_cfg(&mut writer, &message, max_frame).await {
                    warn!("IPC write error: {}", e);
                    break;
                }
            }
        });

        let pending = Arc::clone(&self.pending_requests);
        let reader_task = tokio::spawn(async move {
            loop {
                match read_ipc_message_cfg(&mut reader, max_frame).await {
                    Ok(message) => Self::handle_message(message, &pending).await,
                    Err(e) => {
                        debug!("IPC read loop ended: {}", e);
                        break;
                    }
                }
            }
        });

        // Supervisor: once either half stops, the connection is dead and
        // every waiter is released.
        let pending = Arc::clone(&self.pending_requests);
        let connected = Arc::clone(&self.connected);
        tokio::spawn(async move {
            tokio::select! {
                _ = writer_task => {},
                _ = reader_task => {},
            }
            connected.store(false, Ordering::SeqCst);
            for (_, waiter) in pending.lock().await.drain() {
                let _ = waiter.send(Err(IpcError::ChannelClosed));
            }
        });
    }

    async fn handle_message(message: IpcMessage, pending: &Arc<Mutex<PendingMap>>) {
        match message.payload {
            IpcPayload::Response(response) => {
                if let Some(waiter) = pending.lock().await.remove(&message.id) {
                    let _ = waiter.send(Ok(response));
                }
            }
            other => debug!("ignoring unexpected payload from daemon: {:?}", other),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send a request and wait for its response or the request timeout.
    /// A timed-out request is cancelled on the daemon.
    pub async fn request(&self, request: DaemonRequest) -> Result<DaemonResponse, IpcError> {
        let (id, rx) = self.start_request(request).await?;
        match timeout(self.config.request_timeout, rx).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(_)) => Err(IpcError::ChannelClosed),
            Err(_) => {
                // the daemon may still be queued on this request; stop it
                // from completing after the caller has given up
                if let Err(e) = self.cancel(id).await {
                    debug!(request_id = %id, "cancel after timeout not sent: {}", e);
                }
                Err(IpcError::Timeout)
            }
        }
    }

    /// Send a request and return its id together with the response receiver.
    pub async fn start_request(
        &self,
        request: DaemonRequest,
    ) -> Result<(RequestId, oneshot::Receiver<Result<DaemonResponse, IpcError>>), IpcError> {
        let id = RequestId::new();
        let (response_tx, response_rx) = oneshot::channel();

        {
            let mut pending = self.pending_requests.lock().await;
            if pending.len() >= self.config.max_pending_requests {
                return Err(IpcError::Backpressure);
            }
            pending.insert(id, response_tx);
        }

        let message = IpcMessage {
            id,
            deadline_millis: now_millis() + self.config.request_timeout.as_millis() as u64,
            payload: IpcPayload::Request(request),
        };
        if self.sender.send(message).is_err() {
            self.pending_requests.lock().await.remove(&id);
            return Err(IpcError::ChannelClosed);
        }
        Ok((id, response_rx))
    }

    /// Resolve the local waiter with `Cancelled` and ask the daemon to abort.
    pub async fn cancel(&self, request_id: RequestId) -> Result<(), IpcError> {
        if let Some(waiter) = self.pending_requests.lock().await.remove(&request_id) {
            let _ = waiter.send(Err(IpcError::Cancelled));
        }

        let message = IpcMessage {
            id: RequestId::new(),
            deadline_millis: now_millis() + 5_000,
            payload: IpcPayload::Cancel(request_id),
        };
        self.sender
            .send(message)
            .map_err(|_| IpcError::ChannelClosed)
    }

    pub async fn ping(&self) -> Result<(), IpcError> {
        match self.request(DaemonRequest::Ping).await? {
            DaemonResponse::Pong => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Returns the canonical path and raw text.
    pub async fn open_document(&self, path: &str) -> Result<(String, String), IpcError> {
        let request = DaemonRequest::OpenDocument {
            path: path.to_string(),
        };
        match self.request(request).await? {
            DaemonResponse::DocumentOpened { file_path, text } => Ok((file_path, text)),
            other => Err(unexpected(other)),
        }
    }

    pub async fn auto_load(&self) -> Result<(String, String), IpcError> {
        match self.request(DaemonRequest::AutoLoad).await? {
            DaemonResponse::DocumentOpened { file_path, text } => Ok((file_path, text)),
            other => Err(unexpected(other)),
        }
    }

    pub async fn patch_value(
        &self,
        file_path: &str,
        path: &KeyPath,
        value: &Value,
    ) -> Result<(), IpcError> {
        let request = DaemonRequest::PatchValue {
            file_path: file_path.to_string(),
            path: path.clone(),
            value: value.clone(),
        };
        match self.request(request).await? {
            DaemonResponse::Patched => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn save_document(&self, file_path: &str, text: &str) -> Result<(), IpcError> {
        let request = DaemonRequest::SaveDocument {
            file_path: file_path.to_string(),
            text: text.to_string(),
        };
        match self.request(request).await? {
            DaemonResponse::Saved => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

/// Daemon-reported errors become [`IpcError::Remote`]; anything else is a
/// protocol mismatch.
fn unexpected(response: DaemonResponse) -> IpcError {
    match response {
        DaemonResponse::Error { kind, message } => IpcError::Remote { kind, message },
        other => IpcError::UnexpectedResponse(format!("{:?}", other)),
    }
}
