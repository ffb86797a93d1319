//! Softcore Redux Editor Surface
//!
//! Everything the editor does between the user and the privileged file
//! layer: the form schema, the editing session with its load-time snapshot,
//! and debounced autosave. [`EditorController`] runs these behind a command
//! channel so any front end (the CLI, a GUI) only sends [`UiCommand`]s and
//! listens for [`UiEvent`]s.

pub mod autosave;
pub mod backend;
pub mod fields;
pub mod session;

pub use autosave::{AutosaveScheduler, AutosaveState};
pub use backend::{BackendError, DocumentBackend, IpcBackend, LocalBackend, OpenedDocument};
pub use fields::{FieldDescriptor, FieldError, FieldInput, SectionSchema, WidgetKind};
pub use session::{Session, SessionError};

use redux_document::{KeyPath, Value};
use redux_ipc::{ErrorKind, IpcError};
use redux_settings::EditorSettings;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// UI-related errors
#[derive(Debug, thiserror::Error)]
pub enum UiError {
    #[error("IPC communication error: {0}")]
    IpcError(#[from] IpcError),
    #[error("Settings error: {0}")]
    SettingsError(#[from] redux_settings::SettingsError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("No document is open")]
    NoDocument,
    #[error("Channel communication error")]
    ChannelError,
}

impl UiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UiError::Session(e) => e.kind(),
            UiError::Backend(e) => e.kind,
            UiError::Field(FieldError::UnknownSection(_) | FieldError::UnknownField { .. }) => {
                ErrorKind::InvalidPath
            }
            UiError::Field(_) => ErrorKind::Rejected,
            UiError::IpcError(_) => ErrorKind::Io,
            UiError::NoDocument => ErrorKind::Rejected,
            UiError::SettingsError(_) | UiError::ChannelError => ErrorKind::Internal,
        }
    }
}

/// Command sent to the editor
#[derive(Debug, Clone)]
pub enum UiCommand {
    Open {
        path: String,
    },
    AutoLoad,
    /// Control change on a schema field
    SetField {
        section: String,
        field: String,
        input: FieldInput,
    },
    /// Raw value at an arbitrary path
    SetValue {
        path: KeyPath,
        value: Value,
    },
    /// Field change confirmed with Enter: patch, then save right away
    Commit {
        section: String,
        field: String,
        input: FieldInput,
    },
    ResetField {
        path: KeyPath,
    },
    ResetSection {
        section: String,
    },
    Save,
    Shutdown,
}

/// Event emitted by the editor
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Opened {
        file_path: String,
    },
    Patched {
        path: KeyPath,
    },
    Saved {
        autosave: bool,
    },
    AutosaveFailed {
        message: String,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

struct EditorState {
    backend: Arc<dyn DocumentBackend>,
    session: Arc<Mutex<Option<Session>>>,
    autosave: AutosaveScheduler,
    events: mpsc::UnboundedSender<UiEvent>,
}

/// Editor controller
///
/// Owns the session and the autosave timer on a background task. Commands
/// run strictly in order; the autosave deadline is checked between them.
pub struct EditorController {
    command_tx: mpsc::UnboundedSender<UiCommand>,
    event_rx: mpsc::UnboundedReceiver<UiEvent>,
    session: Arc<Mutex<Option<Session>>>,
    processor: Option<JoinHandle<()>>,
}

impl EditorController {
    /// Start a controller on `backend`.
    ///
    /// # Examples
    /// ```rust,no_run
    /// # use redux_ui::{EditorController, IpcBackend, UiCommand};
    /// # use redux_ipc::IpcClient;
    /// # use redux_settings::Settings;
    /// # use std::sync::Arc;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let settings = Settings::load().await?;
    /// let client = IpcClient::connect(settings.daemon.daemon_socket.as_str()).await?;
    /// let mut editor = EditorController::new(Arc::new(IpcBackend::new(client)), &settings.editor);
    /// editor.send_command(UiCommand::AutoLoad)?;
    /// let opened = editor.next_event().await;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(backend: Arc<dyn DocumentBackend>, settings: &EditorSettings) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let session = Arc::new(Mutex::new(None));

        let state = EditorState {
            backend,
            session: Arc::clone(&session),
            autosave: AutosaveScheduler::from_settings(settings),
            events: event_tx,
        };
        let processor = tokio::spawn(Self::run(state, command_rx));

        info!(
            "EditorController started (autosave after {} ms)",
            settings.autosave_delay_ms
        );
        Self {
            command_tx,
            event_rx,
            session,
            processor: Some(processor),
        }
    }

    pub fn send_command(&self, command: UiCommand) -> Result<(), UiError> {
        self.command_tx.send(command).map_err(|_| UiError::ChannelError)
    }

    /// Next event, or `None` once the controller has stopped.
    pub async fn next_event(&mut self) -> Option<UiEvent> {
        self.event_rx.recv().await
    }

    /// Run `f` against the current session, if a document is open.
    pub async fn with_session<R>(&self, f: impl FnOnce(&Session) -> R) -> Option<R> {
        self.session.lock().await.as_ref().map(f)
    }

    /// Stop the command processor. A pending autosave is dropped; every
    /// accepted patch is already on disk.
    pub async fn shutdown(mut self) -> Result<(), UiError> {
        let _ = self.command_tx.send(UiCommand::Shutdown);
        if let Some(handle) = self.processor.take() {
            if let Err(e) = handle.await {
                error!("Editor processor ended abnormally: {}", e);
                return Err(UiError::ChannelError);
            }
        }
        Ok(())
    }

    async fn run(mut state: EditorState, mut commands: mpsc::UnboundedReceiver<UiCommand>) {
        debug!("Starting editor command processor");
        loop {
            let deadline = state.autosave.deadline();
            tokio::select! {
                command = commands.recv() => {
                    let command = match command {
                        None | Some(UiCommand::Shutdown) => break,
                        Some(command) => command,
                    };
                    if let Err(e) = state.process_command(command).await {
                        error!("Error processing editor command: {}", e);
                        state.emit(UiEvent::Error {
                            kind: e.kind(),
                            message: e.to_string(),
                        });
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if state.autosave.take_due(Instant::now()) {
                        state.autosave_now().await;
                    }
                }
            }
        }
        debug!("Editor command processor terminated");
    }
}

impl EditorState {
    fn emit(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            debug!("Editor event dropped: no listener");
        }
    }

    async fn process_command(&mut self, command: UiCommand) -> Result<(), UiError> {
        match command {
            UiCommand::Open { path } => {
                info!("Processing open command: {}", path);
                let opened = self.backend.open_document(&path).await?;
                self.replace_session(&opened).await?;
            }
            UiCommand::AutoLoad => {
                let opened = self.backend.auto_load().await?;
                self.replace_session(&opened).await?;
            }
            UiCommand::SetField {
                section,
                field,
                input,
            } => {
                let (path, value) = fields::bind(&section, &field, input)?;
                self.patch(path, value).await?;
            }
            UiCommand::SetValue { path, value } => {
                self.patch(path, value).await?;
            }
            UiCommand::Commit {
                section,
                field,
                input,
            } => {
                let (path, value) = fields::bind(&section, &field, input)?;
                self.patch(path, value).await?;
                self.save(false).await?;
            }
            UiCommand::ResetField { path } => {
                let mut guard = self.session.lock().await;
                let session = guard.as_mut().ok_or(UiError::NoDocument)?;
                session.reset_field(self.backend.as_ref(), &path).await?;
                drop(guard);
                self.accepted(path);
            }
            UiCommand::ResetSection { section } => {
                let path = KeyPath::from(section.as_str());
                let mut guard = self.session.lock().await;
                let session = guard.as_mut().ok_or(UiError::NoDocument)?;
                session.reset_section(self.backend.as_ref(), &path).await?;
                drop(guard);
                self.accepted(path);
            }
            UiCommand::Save => {
                self.save(false).await?;
            }
            UiCommand::Shutdown => {}
        }
        Ok(())
    }

    async fn replace_session(&mut self, opened: &OpenedDocument) -> Result<(), UiError> {
        let session = Session::from_opened(opened)?;
        *self.session.lock().await = Some(session);
        self.autosave.disarm();
        self.emit(UiEvent::Opened {
            file_path: opened.file_path.clone(),
        });
        Ok(())
    }

    async fn patch(&mut self, path: KeyPath, value: Value) -> Result<(), UiError> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(UiError::NoDocument)?;
        session
            .apply_field_patch(self.backend.as_ref(), &path, value)
            .await?;
        drop(guard);
        self.accepted(path);
        Ok(())
    }

    fn accepted(&mut self, path: KeyPath) {
        let deadline = self.autosave.arm();
        debug!(path = %path, "Autosave armed for {:?}", deadline);
        self.emit(UiEvent::Patched { path });
    }

    async fn save(&mut self, autosave: bool) -> Result<(), UiError> {
        self.autosave.disarm();
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(UiError::NoDocument)?;
        session.save_all(self.backend.as_ref()).await?;
        drop(guard);
        self.emit(UiEvent::Saved { autosave });
        Ok(())
    }

    async fn autosave_now(&mut self) {
        info!("Autosave deadline reached");
        if let Err(e) = self.save(true).await {
            warn!("Autosave failed: {}", e);
            self.emit(UiEvent::AutosaveFailed {
                message: e.to_string(),
            });
        }
    }
}
