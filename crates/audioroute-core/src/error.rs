//! Error types shared by all audioroute crates.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading a configuration or driving the mixer.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration file violates the grammar or references something
    /// that was not declared.
    #[error("config syntax error at line {line}: {message}")]
    ConfigSyntax {
        /// Line of the offending element (0 when not yet known).
        line: u32,
        /// What was wrong.
        message: String,
    },

    /// The XML itself is not well formed.
    #[error("malformed XML in '{path}': {message}")]
    Xml {
        /// File being parsed.
        path: PathBuf,
        /// Reader diagnostic.
        message: String,
    },

    /// A named mixer control does not exist on the card.
    #[error("mixer control '{0}' not found")]
    ControlNotFound(String),

    /// A value does not fit the control or table it is written to.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// An attribute or control value could not be interpreted.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A caller passed an out-of-range argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The stream does not declare the requested feature.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A named item (constant, card) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Growing a model array failed.
    #[error("out of memory")]
    OutOfMemory,

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The mixer for a sound card could not be opened.
    #[error("failed to open mixer card {card}: {reason}")]
    MixerOpen {
        /// Card number.
        card: u32,
        /// Backend diagnostic.
        reason: String,
    },

    /// A mixer read or write failed.
    #[error("mixer I/O error on '{control}': {reason}")]
    MixerIo {
        /// Control name.
        control: String,
        /// Backend diagnostic.
        reason: String,
    },
}

/// Coarse classification of an [`Error`], used by callers that only need to
/// know why a load failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A file or named item was missing.
    NotFound,
    /// The configuration or a value in it was invalid.
    InvalidData,
    /// An allocation or table size limit was hit.
    OutOfMemory,
    /// A runtime argument was out of range.
    InvalidArgument,
    /// The requested feature is not declared.
    NotSupported,
    /// Underlying I/O failed.
    Io,
}

impl Error {
    /// Create a grammar error; the loader fills in the line number.
    pub fn syntax(message: impl Into<String>) -> Self {
        Error::ConfigSyntax {
            line: 0,
            message: message.into(),
        }
    }

    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a mixer I/O error.
    pub fn mixer_io(control: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MixerIo {
            control: control.into(),
            reason: reason.into(),
        }
    }

    /// Attach a line number to a grammar error that does not have one yet.
    pub fn at_line(self, line: u32) -> Self {
        match self {
            Error::ConfigSyntax { line: 0, message } => Error::ConfigSyntax { line, message },
            other => other,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConfigSyntax { .. }
            | Error::Xml { .. }
            | Error::ControlNotFound(_)
            | Error::CapacityExceeded(_)
            | Error::InvalidValue(_)
            | Error::MixerOpen { .. } => ErrorKind::InvalidData,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::NotSupported(_) => ErrorKind::NotSupported,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::OutOfMemory => ErrorKind::OutOfMemory,
            Error::ReadFile { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::NotFound
            }
            Error::ReadFile { .. } | Error::MixerIo { .. } => ErrorKind::Io,
        }
    }
}

/// Convenience result type for audioroute operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn mock_io_err(kind: std::io::ErrorKind) -> std::io::Error {
        std::io::Error::new(kind, "mock")
    }

    #[test]
    fn at_line_fills_missing_line_only() {
        let err = Error::syntax("bad element").at_line(12);
        assert!(matches!(err, Error::ConfigSyntax { line: 12, .. }));

        let err = err.at_line(40);
        assert!(matches!(err, Error::ConfigSyntax { line: 12, .. }));
    }

    #[test]
    fn syntax_display() {
        let err = Error::syntax("Element 'foo' not allowed here").at_line(3);
        assert_eq!(
            err.to_string(),
            "config syntax error at line 3: Element 'foo' not allowed here"
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = Error::read_file("/x.xml", mock_io_err(std::io::ErrorKind::NotFound));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.source().is_some());
    }

    #[test]
    fn unreadable_file_is_io() {
        let err = Error::read_file("/x.xml", mock_io_err(std::io::ErrorKind::PermissionDenied));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn load_errors_classify_as_invalid_data() {
        assert_eq!(Error::syntax("x").kind(), ErrorKind::InvalidData);
        assert_eq!(
            Error::CapacityExceeded("x".into()).kind(),
            ErrorKind::InvalidData
        );
        assert_eq!(Error::OutOfMemory.kind(), ErrorKind::OutOfMemory);
    }
}
