use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Mutex, Once, OnceLock};

use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Structured backend logging utilities backed by `tracing`.
///
/// Initializes a global subscriber once and exposes helper functions
/// (`backend_info`, etc.) used across all modules. Every helper call also
/// lands in a bounded in-memory buffer so the debug-panel overlay can show
/// recent backend activity without touching the log files.

static INIT_LOGGING: Once = Once::new();
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static RECENT_LOGS: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();

const RECENT_LOG_CAPACITY: usize = 500;

fn resolve_log_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sohbet")
        .join("logs")
}

fn build_file_appender() -> Option<(RollingFileAppender, PathBuf)> {
    let log_dir = resolve_log_dir();
    if let Err(err) = std::fs::create_dir_all(&log_dir) {
        eprintln!(
            "[backend][WARN] Failed to create log directory {}: {}",
            log_dir.display(),
            err
        );
        return None;
    }

    Some((RollingFileAppender::new(Rotation::DAILY, &log_dir, "backend.log"), log_dir))
}

pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let (file_layer, log_dir_description) = if let Some((appender, dir)) = build_file_appender() {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(non_blocking);
            LOG_GUARD.set(guard).ok();
            (Some(layer), Some(dir))
        } else {
            (None, None)
        };

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(std::env::var("SOHBET_LOG_LEVEL").unwrap_or_else(|_| "info".into())))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let stdout_layer = fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .with_timer(UtcTime::rfc_3339());

        let registry = tracing_subscriber::registry().with(filter).with(stdout_layer);
        if let Some(file_layer) = file_layer {
            registry.with(file_layer).init();
        } else {
            registry.init();
        }

        if let Some(dir) = log_dir_description {
            let dir_str = dir.display().to_string();
            backend_info(format!(
                "Structured logging initialized. Backend logs will be rotated daily under {}",
                dir_str
            ));
        } else {
            backend_warn("Structured logging initialized without file sink (using stdout only)");
        }
    });
}

fn recent_logs() -> &'static Mutex<VecDeque<String>> {
    RECENT_LOGS.get_or_init(|| Mutex::new(VecDeque::with_capacity(RECENT_LOG_CAPACITY)))
}

fn remember(level: &str, message: &str) {
    if let Ok(mut buffer) = recent_logs().lock() {
        if buffer.len() == RECENT_LOG_CAPACITY {
            buffer.pop_front();
        }
        buffer.push_back(format!(
            "{} [{}] {}",
            chrono::Utc::now().format("%H:%M:%S%.3f"),
            level,
            message
        ));
    }
}

pub fn backend_info(message: impl AsRef<str>) {
    info!(target: "backend", "{}", message.as_ref());
    remember("INFO", message.as_ref());
}

pub fn backend_warn(message: impl AsRef<str>) {
    warn!(target: "backend", "{}", message.as_ref());
    remember("WARN", message.as_ref());
}

pub fn backend_error(message: impl AsRef<str>) {
    error!(target: "backend", "{}", message.as_ref());
    remember("ERROR", message.as_ref());
}

/// Debug-panel feed: the most recent backend log lines, oldest first.
#[tauri::command]
pub fn get_backend_logs() -> Vec<String> {
    recent_logs()
        .lock()
        .map(|buffer| buffer.iter().cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_buffer_is_bounded() {
        for i in 0..(RECENT_LOG_CAPACITY + 50) {
            remember("INFO", &format!("line {i}"));
        }
        // Other tests share the static buffer, so only the bound is checked.
        let buffer = recent_logs().lock().unwrap();
        assert!(buffer.len() <= RECENT_LOG_CAPACITY);
        assert!(!buffer.is_empty());
    }
}
