//! IPC server: one reader per connection, one task per request.

use redux_core::{CoreError, DocumentService};
use redux_ipc::{
    now_millis, read_ipc_message_cfg, write_ipc_message_cfg, DaemonRequest, DaemonResponse,
    ErrorKind, IpcError, IpcMessage, IpcPayload, RequestId,
};
use redux_settings::DaemonSettings;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
pub struct Stats {
    cancels: AtomicU64,
    deadlines: AtomicU64,
    backpressure: AtomicU64,
}

impl Stats {
    fn snapshot(&self) -> DaemonResponse {
        DaemonResponse::Stats {
            cancels: self.cancels.load(Ordering::Relaxed),
            deadlines: self.deadlines.load(Ordering::Relaxed),
            backpressure: self.backpressure.load(Ordering::Relaxed),
        }
    }
}

struct ServerContext {
    /// Serializes every file operation
    service: Mutex<DocumentService>,
    stats: Stats,
    max_frame_bytes: u32,
    max_inflight: usize,
}

type InflightMap = HashMap<RequestId, JoinHandle<()>>;

pub struct DaemonServer {
    listener: TcpListener,
    context: Arc<ServerContext>,
}

impl DaemonServer {
    pub async fn bind(settings: &DaemonSettings, service: DocumentService) -> Result<Self, IpcError> {
        let listener = TcpListener::bind(settings.daemon_socket.as_str())
            .await
            .map_err(|e| {
                IpcError::ConnectionFailed(format!("Cannot bind {}: {}", settings.daemon_socket, e))
            })?;
        let context = Arc::new(ServerContext {
            service: Mutex::new(service),
            stats: Stats::default(),
            max_frame_bytes: settings.ipc_max_frame_bytes,
            max_inflight: settings.ipc_max_inflight_per_conn,
        });
        Ok(Self { listener, context })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, IpcError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the task is dropped.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New client connected: {}", addr);
                    let context = Arc::clone(&self.context);
                    tokio::spawn(async move {
                        handle_connection(stream, context).await;
                        info!("Client {} disconnected", addr);
                    });
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, context: Arc<ServerContext>) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("set_nodelay failed: {}", e);
    }
    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut writer = BufWriter::new(write_half);
    let max_frame = context.max_frame_bytes;

    let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<IpcMessage>();
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outgoing_rx.recv().await {
            if let Err(e) = write_ipc_message_cfg(&mut writer, &message, max_frame).await {
                warn!("IPC write error: {}", e);
                break;
            }
        }
    });

    let inflight: Arc<Mutex<InflightMap>> = Arc::new(Mutex::new(HashMap::new()));

    loop {
        let message = match read_ipc_message_cfg(&mut reader, max_frame).await {
            Ok(message) => message,
            Err(IpcError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => {
                warn!("Dropping connection after bad frame: {}", e);
                break;
            }
        };

        let expired = message.is_expired(now_millis());
        match message.payload {
            IpcPayload::Request(request) => {
                if expired {
                    context.stats.deadlines.fetch_add(1, Ordering::Relaxed);
                    debug!(request = request.name(), "Deadline already passed");
                    reply(
                        &outgoing,
                        message.id,
                        DaemonResponse::error(ErrorKind::DeadlineExceeded, "request arrived after its deadline"),
                    );
                    continue;
                }

                // Hold the map while spawning so the task's own removal
                // cannot run before its insertion.
                let mut tasks = inflight.lock().await;
                if tasks.len() >= context.max_inflight {
                    context.stats.backpressure.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        request = request.name(),
                        inflight = tasks.len(),
                        "Rejecting request: too many in flight"
                    );
                    reply(
                        &outgoing,
                        message.id,
                        DaemonResponse::error(
                            ErrorKind::Backpressure,
                            format!("{} requests already in flight", tasks.len()),
                        ),
                    );
                    continue;
                }

                let id = message.id;
                let deadline_millis = message.deadline_millis;
                let task_context = Arc::clone(&context);
                let task_outgoing = outgoing.clone();
                let task_inflight = Arc::clone(&inflight);
                let handle = tokio::spawn(async move {
                    let response = dispatch(request, deadline_millis, &task_context).await;
                    task_inflight.lock().await.remove(&id);
                    reply(&task_outgoing, id, response);
                });
                tasks.insert(id, handle);
            }
            IpcPayload::Cancel(target) => {
                if let Some(handle) = inflight.lock().await.remove(&target) {
                    handle.abort();
                    context.stats.cancels.fetch_add(1, Ordering::Relaxed);
                    debug!(request_id = %target, "Request cancelled");
                }
            }
            IpcPayload::Response(response) => {
                debug!("Ignoring response sent by client: {:?}", response);
            }
        }
    }

    for (_, handle) in inflight.lock().await.drain() {
        handle.abort();
    }
    drop(outgoing);
    if let Err(e) = writer_task.await {
        error!("Writer task failed: {}", e);
    }
}

fn reply(outgoing: &mpsc::UnboundedSender<IpcMessage>, id: RequestId, response: DaemonResponse) {
    if outgoing.send(IpcMessage::response(id, response)).is_err() {
        debug!(request_id = %id, "Connection closed before reply");
    }
}

fn past_deadline(deadline_millis: u64) -> bool {
    deadline_millis != 0 && now_millis() > deadline_millis
}

/// Writes queued behind a slow operation may outlive their caller's
/// deadline; such a write must not reach the file.
fn deadline_exceeded(context: &ServerContext, name: &str) -> DaemonResponse {
    context.stats.deadlines.fetch_add(1, Ordering::Relaxed);
    warn!(request = name, "Deadline passed while waiting for the document lock");
    DaemonResponse::error(
        ErrorKind::DeadlineExceeded,
        "deadline passed before the file was written",
    )
}

async fn dispatch(
    request: DaemonRequest,
    deadline_millis: u64,
    context: &ServerContext,
) -> DaemonResponse {
    let name = request.name();
    let result = match request {
        DaemonRequest::Ping => Ok(DaemonResponse::Pong),
        DaemonRequest::Sleep { millis } => {
            // holds the document lock like a slow file operation would
            let _service = context.service.lock().await;
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Ok(DaemonResponse::Success)
        }
        DaemonRequest::GetStats => Ok(context.stats.snapshot()),
        DaemonRequest::OpenDocument { path } => {
            let service = context.service.lock().await;
            service.load_document(&path).await.map(|loaded| DaemonResponse::DocumentOpened {
                file_path: loaded.path.to_string_lossy().into_owned(),
                text: loaded.text,
            })
        }
        DaemonRequest::AutoLoad => {
            let service = context.service.lock().await;
            service.auto_load().await.map(|loaded| DaemonResponse::DocumentOpened {
                file_path: loaded.path.to_string_lossy().into_owned(),
                text: loaded.text,
            })
        }
        DaemonRequest::PatchValue {
            file_path,
            path,
            value,
        } => {
            let service = context.service.lock().await;
            if past_deadline(deadline_millis) {
                return deadline_exceeded(context, name);
            }
            service
                .patch_value(&file_path, &path, &value)
                .await
                .map(|()| DaemonResponse::Patched)
        }
        DaemonRequest::SaveDocument { file_path, text } => {
            let service = context.service.lock().await;
            if past_deadline(deadline_millis) {
                return deadline_exceeded(context, name);
            }
            service
                .save_document(&file_path, &text)
                .await
                .map(|()| DaemonResponse::Saved)
        }
    };

    result.unwrap_or_else(|e: CoreError| {
        warn!(request = name, "Request failed: {}", e);
        DaemonResponse::error(e.kind(), e.message())
    })
}
