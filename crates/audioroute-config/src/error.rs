//! Errors for loader option files.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur reading [`LoaderOptions`](crate::LoaderOptions).
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type for option files.
pub type Result<T> = std::result::Result<T, OptionsError>;
