//! Shared utilities: logging, file names, bounds.

use std::path::Path;
use tracing::Level;

/// Initialize tracing with env filter. Safe to call once at startup.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// File-name-safe form of a weapon name (lowercase, alphanumerics and `-`).
pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Size of `path` in bytes, or an error when it exceeds `max_bytes`.
pub fn check_file_size(path: &Path, max_bytes: usize) -> Result<u64, String> {
    let meta = std::fs::metadata(path).map_err(|e| e.to_string())?;
    let size = meta.len();
    if size > max_bytes as u64 {
        return Err(format!(
            "{}: file too large: {} bytes (max {})",
            path.display(),
            size,
            max_bytes
        ));
    }
    Ok(size)
}
