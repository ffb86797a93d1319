use redux_settings::LoggingSettings;
use std::error::Error;
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "reduxd.log";

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. When a log
/// directory is set, output is also written to a daily-rolling file; the
/// returned guard must live until shutdown or buffered lines are lost.
pub fn init(settings: &LoggingSettings) -> Result<Option<WorkerGuard>, Box<dyn Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)?,
    };

    let (console_text, console_json) = if settings.json {
        (None, Some(fmt::layer().with_target(true).with_writer(io::stderr).json()))
    } else {
        (Some(fmt::layer().with_target(true).with_writer(io::stderr)), None)
    };

    let mut guard = None;
    let (file_text, file_json) = match &settings.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let (writer, file_guard) = non_blocking(rolling::daily(directory, LOG_FILE_PREFIX));
            guard = Some(file_guard);
            if settings.json {
                let layer = fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(false)
                    .with_writer(writer);
                (None, Some(layer.json()))
            } else {
                let layer = fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(false)
                    .with_writer(writer);
                (Some(layer), None)
            }
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_text)
        .with(console_json)
        .with(file_text)
        .with(file_json)
        .try_init()?;

    tracing::debug!(
        level = %settings.level,
        json = settings.json,
        directory = ?settings.directory,
        "Logging initialized"
    );
    Ok(guard)
}
