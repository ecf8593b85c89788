//! Tracing setup: readable stderr output plus a daily-rolling JSON file.
//!
//! `LOG_FILE_PATH` picks the file, `RUST_LOG` filters stderr and
//! `RUST_LOG_JSON` filters the file.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

pub const DEFAULT_LOG_FILE: &str = "logs/pm25_rater.log";

/// Directory and base name of the rolling log file.
#[derive(Debug, Clone, PartialEq)]
pub struct LogTarget {
    pub dir: PathBuf,
    pub file_name: OsString,
}

impl LogTarget {
    /// A bare file name logs into the working directory.
    pub fn from_path(path: &str) -> Self {
        let path = Path::new(path);
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("pm25_rater.log"));
        Self { dir, file_name }
    }

    pub fn from_env() -> Self {
        let path = std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
        Self::from_path(&path)
    }
}

fn env_filter(var: &str, default: &str) -> Result<EnvFilter> {
    let directive: Directive = default
        .parse()
        .with_context(|| format!("invalid default log directive '{default}'"))?;
    EnvFilter::builder()
        .with_env_var(var)
        .with_default_directive(directive)
        .from_env()
        .with_context(|| format!("invalid filter in {var}"))
}

/// Installs the global subscriber. Keep the guard alive until exit so the
/// file writer flushes.
pub fn init_logging() -> Result<WorkerGuard> {
    let target = LogTarget::from_env();
    fs::create_dir_all(&target.dir)
        .with_context(|| format!("creating log directory {}", target.dir.display()))?;

    let appender = tracing_appender::rolling::daily(&target.dir, &target.file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info")?);

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(file_writer)
        .with_filter(env_filter("RUST_LOG_JSON", "debug")?);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(guard)
}
