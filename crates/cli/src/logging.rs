//! Process logging setup.
//!
//! Warnings and errors always go to a timestamped file,
//! `warnings_YYYYMMDD_HHMMSS.log`, so they never interleave with the chat on
//! the console. A console layer on stderr is added for verbose runs and for
//! the API server. The returned [`LogGuard`] removes the file on drop if
//! nothing was written to it.

use chrono::{DateTime, Local};
use corretor_config::LoggingConfig;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

pub struct LogGuard {
    path: PathBuf,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        if let Ok(meta) = std::fs::metadata(&self.path) {
            if meta.len() == 0 {
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }
}

pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("warnings_{}.log", now.format("%Y%m%d_%H%M%S"))
}

/// Install the global subscriber.
pub fn init(
    config: &LoggingConfig,
    console: bool,
    verbose: bool,
) -> Result<LogGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.dir)?;
    let path = config.dir.join(log_file_name(Local::now()));
    let file = std::fs::File::create(&path)?;

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_filter(LevelFilter::WARN);

    let console_layer = console.then(|| {
        let default = if verbose { "debug" } else { "info" };
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
            )
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(LogGuard { path })
}
