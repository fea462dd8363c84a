//! Diagnostics for devai-cli.
//!
//! # Separation of Concerns
//!
//! - **Tracing**: dev diagnostics via `RUST_LOG` (or `--verbose`), output to
//!   stderr. Not persisted.
//! - **Debug log**: unexpected errors appended as JSON lines to
//!   `~/.devai-cli/debug.log` so they can be attached to bug reports.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::DevaiError;

/// Initialize tracing subscriber.
///
/// Reads `RUST_LOG` env var. Defaults to `warn`, or `devai=debug` when
/// `verbose` is set. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=devai=debug devai-cli commit
/// ```
pub fn init(verbose: bool) {
    let fallback = if verbose { "devai=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}

/// `~/.devai-cli/debug.log`, when a home directory is known.
pub fn debug_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".devai-cli").join("debug.log"))
}

#[derive(Serialize)]
struct DebugRecord<'a> {
    timestamp: String,
    pid: u32,
    kind: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
    exit_code: i32,
}

/// Append one JSON line describing `error` to `path`.
pub fn append_debug_log(path: &Path, error: &DevaiError) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let detail = match error {
        DevaiError::Unexpected { detail, .. } => Some(detail.as_str()),
        _ => error.remediation(),
    };
    let record = DebugRecord {
        timestamp: chrono::Utc::now().to_rfc3339(),
        pid: std::process::id(),
        kind: error.kind().as_str(),
        message: error.message(),
        detail,
        exit_code: error.exit_code(),
    };
    let mut line = serde_json::to_string(&record).context("serialize debug record")?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("append {}", path.display()))?;
    Ok(())
}
