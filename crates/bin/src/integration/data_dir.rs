//! Location of the statement and profile files.
//!
//! Uses platform-specific data directories:
//! - Linux: `~/.local/share/intrinsic/`
//! - macOS: `~/Library/Application Support/intrinsic/`
//! - Windows: `%APPDATA%\intrinsic\`

use std::path::{Path, PathBuf};

/// Environment variable overriding the default data directory.
pub(crate) const DATA_DIR_ENV: &str = "INTRINSIC_DATA_DIR";

/// Get the default data directory path.
pub(crate) fn default_data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV).map_or_else(
        || {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("intrinsic")
        },
        PathBuf::from,
    )
}

/// The explicit directory, or the default one.
pub(crate) fn resolve(dir: Option<&Path>) -> PathBuf {
    dir.map_or_else(default_data_dir, Path::to_path_buf)
}

/// Print where data is read from.
pub(crate) fn print_data_info(dir: &Path) {
    println!("Data directory: {}", dir.display());
}
