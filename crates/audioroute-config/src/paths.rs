//! - **Product config**: `<etc_dir>/audio.<product>.xml`
//! - **CLI defaults**: `~/.config/audioroute/cli.toml` (Linux),
//!   `~/Library/Application Support/audioroute/cli.toml` (macOS),
//!   `%APPDATA%\audioroute\cli.toml` (Windows)
//!
//! File names taken from a config file may carry leading whitespace, which is
//! ignored.

use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "audioroute";

/// File name of the CLI defaults.
const CLI_CONFIG_FILE: &str = "cli.toml";

/// Config file for a product: `<etc_dir>/audio.<product>.xml`.
pub fn product_config_path(etc_dir: &Path, product: &str) -> PathBuf {
    etc_dir.join(format!("audio.{product}.xml"))
}

/// Make a config path absolute against the current directory.
///
/// Falls back to the path as given if the current directory is unknown.
pub fn absolutize(path: &Path) -> PathBuf {
    let path = trim_path(path);
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(e) => {
            tracing::warn!(error = %e, "cannot read current directory");
            path
        }
    }
}

/// Resolve a file named inside `current_xml`.
///
/// Absolute names are used as-is; relative names are taken relative to the
/// directory holding `current_xml`.
pub fn resolve_relative(current_xml: &Path, name: &str) -> PathBuf {
    let name = Path::new(name.trim_start());
    if name.is_absolute() {
        return name.to_path_buf();
    }
    current_xml
        .parent()
        .map_or_else(|| name.to_path_buf(), |dir| dir.join(name))
}

fn trim_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(s.trim_start()),
        None => path.to_path_buf(),
    }
}

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the CLI defaults file.
pub fn cli_config_path() -> PathBuf {
    user_config_dir().join(CLI_CONFIG_FILE)
}
