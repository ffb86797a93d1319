//! Softcore Redux Editor
//!
//! Command line front end for the config editor. Opens a document through
//! the daemon (or in-process with `--local`), applies edits in order and
//! reports the result.

mod daemon;

use clap::Parser;
use redux_core::DocumentService;
use redux_document::{KeyPath, Value};
use redux_ipc::{IpcClient, IpcConfig};
use redux_settings::Settings;
use redux_ui::{
    fields, DocumentBackend, EditorController, FieldInput, IpcBackend, LocalBackend, Session,
    UiCommand, UiEvent,
};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "redux-editor", version)]
#[command(about = "Edit the Softcore Redux config without losing its comments")]
struct Args {
    /// Config file to open
    #[arg(long, value_name = "PATH", conflicts_with = "auto_load")]
    open: Option<String>,

    /// Open the configured default document (the default when --open is absent)
    #[arg(long)]
    auto_load: bool,

    /// Set a value, e.g. `otherTweaks.questChanges=false`; the value is JSON
    /// unless the path names a form field
    #[arg(long = "set", value_name = "PATH=VALUE")]
    sets: Vec<String>,

    /// Restore a value to what it was when the document was opened
    #[arg(long = "reset", value_name = "PATH")]
    resets: Vec<String>,

    /// Restore a whole section, e.g. `hideoutOptions`
    #[arg(long = "reset-section", value_name = "SECTION")]
    reset_sections: Vec<String>,

    /// Save the full document after applying edits
    #[arg(long)]
    save: bool,

    /// Print every form field with its current value
    #[arg(long)]
    list: bool,

    /// Work on the file in-process instead of through the daemon
    #[arg(long)]
    local: bool,

    /// Stay until the pending autosave has run
    #[arg(long)]
    wait_autosave: bool,

    /// Write the current settings (defaults plus overrides) and exit
    #[arg(long)]
    init_settings: bool,
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    debug!("Starting redux-editor v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load().await?;

    if args.init_settings {
        let path = Settings::settings_path();
        settings.save_to_path(&path).await?;
        println!("Settings written to {}", path.display());
        return Ok(());
    }

    let backend = connect_backend(&settings, args.local).await?;
    let mut editor = EditorController::new(backend, &settings.editor);
    let outcome = run(&args, &mut editor, settings.editor.autosave_delay_ms).await;
    editor.shutdown().await?;
    outcome
}

async fn connect_backend(settings: &Settings, local: bool) -> CliResult<Arc<dyn DocumentBackend>> {
    if local {
        info!("Working without daemon");
        let service = DocumentService::from_settings(settings)?;
        return Ok(Arc::new(LocalBackend::new(service)));
    }

    daemon::ensure_daemon_running(settings).await?;
    let config = IpcConfig {
        request_timeout: Duration::from_millis(settings.daemon.ipc_request_timeout_ms),
        max_message_size: settings.daemon.ipc_max_frame_bytes,
        ..IpcConfig::default()
    };
    let client = IpcClient::connect_with_config(settings.daemon.daemon_socket.as_str(), config).await?;
    Ok(Arc::new(IpcBackend::new(client)))
}

async fn run(args: &Args, editor: &mut EditorController, autosave_delay_ms: u64) -> CliResult<()> {
    let open = match &args.open {
        Some(path) => UiCommand::Open { path: path.clone() },
        None => UiCommand::AutoLoad,
    };
    if let UiEvent::Opened { file_path } = request(editor, open).await? {
        println!("Opened {}", file_path);
    }

    for assignment in &args.sets {
        let command = set_command(assignment)?;
        request(editor, command).await?;
    }
    for path in &args.resets {
        let path = KeyPath::from(path.as_str());
        request(editor, UiCommand::ResetField { path }).await?;
    }
    for section in &args.reset_sections {
        request(
            editor,
            UiCommand::ResetSection {
                section: section.clone(),
            },
        )
        .await?;
    }

    if args.save {
        request(editor, UiCommand::Save).await?;
        println!("Saved");
    } else if args.wait_autosave && editor.with_session(Session::is_dirty).await == Some(true) {
        wait_for_autosave(editor, autosave_delay_ms).await?;
        println!("Autosaved");
    }

    if args.list {
        if let Some(listing) = editor.with_session(render_listing).await {
            print!("{}", listing);
        }
    }
    Ok(())
}

/// Send `command` and wait for the event that settles it.
async fn request(editor: &mut EditorController, command: UiCommand) -> CliResult<UiEvent> {
    debug!("Sending {:?}", command);
    editor.send_command(command)?;
    match editor.next_event().await {
        Some(UiEvent::Error { message, .. }) => Err(message.into()),
        Some(event) => Ok(event),
        None => Err("editor stopped unexpectedly".into()),
    }
}

/// `path=value`: form fields take control-style input, anything else JSON.
fn set_command(assignment: &str) -> CliResult<UiCommand> {
    let (raw_path, raw_value) = assignment
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=VALUE, got '{}'", assignment))?;
    let path = KeyPath::from(raw_path.trim());

    if let Some((section, field)) = fields::find_by_path(&path) {
        let input = FieldInput::parse(field.widget, raw_value)?;
        return Ok(UiCommand::SetField {
            section: section.key.to_string(),
            field: field.key.to_string(),
            input,
        });
    }
    let value = Value::parse(raw_value)?;
    Ok(UiCommand::SetValue { path, value })
}

async fn wait_for_autosave(editor: &mut EditorController, autosave_delay_ms: u64) -> CliResult<()> {
    let limit = Duration::from_millis(autosave_delay_ms) + Duration::from_secs(30);
    match tokio::time::timeout(limit, editor.next_event()).await {
        Ok(Some(UiEvent::Saved { .. })) => Ok(()),
        Ok(Some(UiEvent::AutosaveFailed { message })) => Err(format!("Autosave failed: {}", message).into()),
        Ok(other) => Err(format!("unexpected editor event: {:?}", other).into()),
        Err(_) => Err("timed out waiting for autosave".into()),
    }
}

fn render_listing(session: &Session) -> String {
    let mut out = String::new();
    for section in fields::sections() {
        out.push_str(&format!("[{}] {}\n", section.key, section.label));
        for field in section.fields {
            let path = section.field_path(field);
            let value = session
                .value(&path)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "<missing>".to_string());
            let marker = if session.is_field_changed(&path) { " *" } else { "" };
            out.push_str(&format!("  {} = {}{}\n", field.key, value, marker));
        }
    }
    out
}
