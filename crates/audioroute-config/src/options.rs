//! Loader tuning.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OptionsError, Result};

/// Where product config files live unless told otherwise.
pub const DEFAULT_ETC_DIR: &str = "/system/etc";

/// Settings that are not part of the XML itself.
///
/// Every field has a default, so an empty TOML document is valid.
///
/// ```toml
/// etc_dir = "/vendor/etc"
/// probe_poll_interval_ms = 20
/// probe_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderOptions {
    /// Directory searched for `audio.<product>.xml`.
    pub etc_dir: PathBuf,
    /// Sleep between attempts to open a codec probe file.
    pub probe_poll_interval_ms: u64,
    /// Give up on a codec probe file after this long.
    pub probe_timeout_ms: u64,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            etc_dir: PathBuf::from(DEFAULT_ETC_DIR),
            probe_poll_interval_ms: 50,
            probe_timeout_ms: 10_000,
        }
    }
}

impl LoaderOptions {
    /// Parse options from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| OptionsError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Serialize to TOML text.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Probe poll interval.
    pub fn probe_poll_interval(&self) -> Duration {
        Duration::from_millis(self.probe_poll_interval_ms)
    }

    /// Probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
