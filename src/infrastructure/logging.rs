//! Logging system configuration and initialization
//!
//! - File logging with startup rotation of the previous run's file
//! - Configuration file based log level control
//! - Structured JSON logging (optional)
//! - Console and file output support
//! - Log files stored relative to executable location unless configured

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Library targets that stay quiet unless TRACE is requested
const QUIET_TARGETS: &[(&str, &str)] = &[
    ("sqlx::query", "warn"),
    ("sqlx::sqlite", "warn"),
    ("sqlx::postgres", "warn"),
    ("reqwest", "info"),
    ("hyper", "warn"),
    ("h2", "warn"),
    ("html5ever", "warn"),
    ("selectors", "warn"),
    ("tokio", "info"),
];

/// Local wall-clock timestamps with millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Configured directory, or the default next to the executable
pub fn resolve_log_directory(config: &LoggingConfig) -> PathBuf {
    if config.directory.trim().is_empty() {
        get_log_directory()
    } else {
        PathBuf::from(&config.directory)
    }
}

/// Build the env filter: `RUST_LOG` wins, otherwise config level plus quiet targets
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for (target, level) in QUIET_TARGETS {
            filter = filter.add_directive(format!("{target}={level}").parse()?);
        }
    }

    for (target, level) in &config.module_filters {
        filter = filter.add_directive(
            format!("{target}={level}")
                .parse()
                .map_err(|e| anyhow!("Invalid module filter {}={}: {}", target, level, e))?,
        );
    }

    Ok(filter)
}

/// Rename the previous run's log file with its modification timestamp
fn rotate_existing_log_file(log_dir: &Path, log_file_name: &str) -> Result<()> {
    let log_file_path = log_dir.join(log_file_name);

    if !log_file_path.exists() {
        return Ok(());
    }

    let metadata = std::fs::metadata(&log_file_path)
        .map_err(|e| anyhow!("Failed to get log file metadata: {}", e))?;
    let file_time = metadata
        .modified()
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let stamp: chrono::DateTime<Local> = file_time.into();

    let file_stem = log_file_name.trim_end_matches(".log");
    let stamp = stamp.format("%Y%m%dT%H%M%S%3f").to_string();
    let mut timestamped_path = log_dir.join(format!("{file_stem}.{stamp}.log"));
    // two runs in the same millisecond must not clobber each other
    let mut suffix = 1;
    while timestamped_path.exists() {
        timestamped_path = log_dir.join(format!("{file_stem}.{stamp}-{suffix}.log"));
        suffix += 1;
    }

    std::fs::rename(&log_file_path, &timestamped_path).map_err(|e| {
        anyhow!(
            "Failed to rotate log file {} to {}: {}",
            log_file_path.display(),
            timestamped_path.display(),
            e
        )
    })?;

    Ok(())
}

/// Initialize logging with custom configuration
///
/// SQL statements, HTTP internals and html parser chatter are suppressed
/// unless the level contains `trace`. `RUST_LOG` overrides everything:
/// ```bash
/// RUST_LOG="debug,sqlx::query=debug" assessor-sync
/// ```
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    let log_dir = resolve_log_directory(&config);
    let env_filter = build_env_filter(&config)?;
    let registry = Registry::default().with(env_filter);

    if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        rotate_existing_log_file(&log_dir, &config.file_name)?;

        if config.auto_cleanup_logs {
            cleanup_old_logs(&log_dir, config.max_files)?;
        }
    }

    match (config.file_output, config.console_output) {
        (true, console) => {
            let file_appender = rolling::never(&log_dir, &config.file_name);
            let (file_writer, file_guard) = non_blocking(file_appender);

            LOG_GUARDS
                .lock()
                .map_err(|_| anyhow!("Log guard registry poisoned"))?
                .push(file_guard);

            if config.json_format {
                let file_layer = fmt::Layer::new()
                    .json()
                    .with_writer(file_writer)
                    .with_timer(LocalTimeFormatter)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false);
                let console_layer = console.then(|| {
                    fmt::Layer::new()
                        .with_writer(std::io::stderr)
                        .with_timer(LocalTimeFormatter)
                        .with_target(false)
                });

                registry.with(file_layer).with(console_layer).try_init()?;
            } else {
                // time + level + message only
                let file_layer = fmt::Layer::new()
                    .with_writer(file_writer)
                    .with_timer(LocalTimeFormatter)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(false);
                let console_layer = console.then(|| {
                    fmt::Layer::new()
                        .with_writer(std::io::stderr)
                        .with_timer(LocalTimeFormatter)
                        .with_target(false)
                });

                registry.with(file_layer).with(console_layer).try_init()?;
            }
        }
        (false, true) => {
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_timer(LocalTimeFormatter)
                .with_target(false);

            registry.with(console_layer).try_init()?;
        }
        (false, false) => {
            return Err(anyhow!("No logging output configured"));
        }
    }

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!("Log file: {:?}", log_dir.join(&config.file_name));
    }
    if config.level.to_lowercase().contains("trace") {
        info!("TRACE level active - SQL and HTTP internals will be shown");
    }

    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Assessor Sync System Information ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
    info!("========================================");
}

/// Delete the oldest `.log` files beyond `max_files`
fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        let is_log = path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".log"));
        if !is_log {
            continue;
        }

        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            log_files.push((path, modified));
        }
    }

    // newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let keep = max_files as usize;
    let mut removed = 0;
    for (path, _) in log_files.iter().skip(keep) {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove old log file {:?}: {}", path, e),
        }
    }

    Ok(removed)
}
