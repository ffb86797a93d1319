//! Finding or starting the daemon.

use redux_settings::Settings;
use std::error::Error;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::process::Command;
use tracing::info;

const DAEMON_BINARY: &str = "reduxd";

pub async fn ensure_daemon_running(settings: &Settings) -> Result<(), Box<dyn Error + Send + Sync>> {
    let socket = settings.daemon.daemon_socket.as_str();
    if TcpStream::connect(socket).await.is_ok() {
        return Ok(());
    }
    if !settings.daemon.auto_start {
        return Err(format!("Daemon is not reachable at {} and auto_start is off", socket).into());
    }
    info!("Daemon is not running; attempting auto-start...");

    let exe = resolve_daemon_executable(settings);
    info!("Launching daemon: {}", exe);
    let mut child = Command::new(&exe)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| format!("Cannot start {}: {}", exe, e))?;

    let deadline = Instant::now() + Duration::from_secs(settings.daemon.connection_timeout);
    loop {
        if TcpStream::connect(socket).await.is_ok() {
            info!("Daemon is up at {}", socket);
            return Ok(());
        }
        if Instant::now() > deadline {
            let _ = child.start_kill();
            return Err(format!(
                "Daemon did not come up within {}s",
                settings.daemon.connection_timeout
            )
            .into());
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
}

fn resolve_daemon_executable(settings: &Settings) -> String {
    if let Some(path) = &settings.daemon.executable_path {
        return path.to_string_lossy().into_owned();
    }
    if let Ok(me) = std::env::current_exe() {
        if let Some(dir) = me.parent() {
            let candidate = dir.join(if cfg!(windows) { "reduxd.exe" } else { DAEMON_BINARY });
            if candidate.exists() {
                return candidate.to_string_lossy().into_owned();
            }
        }
    }
    match which::which(DAEMON_BINARY) {
        Ok(path) => path.to_string_lossy().into_owned(),
        Err(_) => DAEMON_BINARY.to_string(),
    }
}
