//! Shared CLI helpers used across multiple commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Deserialize;

use audioroute_config::{LoaderOptions, cli_config_path};
use audioroute_core::{AudioFormat, DeviceMask, devices, parse_u32};
use audioroute_engine::ConfigManager;
use audioroute_mixer::mock::MockCard;

/// Defaults read from `cli.toml` in the user config directory.
///
/// ```toml
/// controls = "/home/me/boards/tuna-controls.toml"
///
/// [loader]
/// probe_timeout_ms = 500
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliDefaults {
    /// Control table used when `--controls` is not given.
    pub controls: Option<PathBuf>,
    /// Loader options used when `--options` is not given.
    pub loader: LoaderOptions,
}

impl CliDefaults {
    /// Load the user defaults, or built-in defaults if there is no file.
    pub fn load() -> anyhow::Result<Self> {
        let path = cli_config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no CLI defaults file");
            return Ok(Self::default());
        }
        tracing::debug!(path = %path.display(), "loading CLI defaults");
        Self::load_from(&path)
    }

    /// Load defaults from a specific file.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid CLI defaults in {}", path.display()))
    }
}

/// Arguments naming a config and the card it runs against.
#[derive(Args)]
pub struct ConfigArgs {
    /// Path to the audio HAL XML config
    pub config: PathBuf,

    /// Control table (TOML) describing the virtual card
    #[arg(long)]
    pub controls: Option<PathBuf>,

    /// Loader options file (TOML)
    #[arg(long)]
    pub options: Option<PathBuf>,
}

impl ConfigArgs {
    /// Build the virtual card.
    pub fn card(&self, defaults: &CliDefaults) -> anyhow::Result<MockCard> {
        let Some(path) = self.controls.as_ref().or(defaults.controls.as_ref()) else {
            anyhow::bail!(
                "No control table given. Pass --controls or set 'controls' in {}",
                cli_config_path().display()
            );
        };
        MockCard::load(path).with_context(|| format!("Failed to load controls {}", path.display()))
    }

    /// Loader options from `--options`, else the user defaults.
    pub fn loader_options(&self, defaults: &CliDefaults) -> anyhow::Result<LoaderOptions> {
        match &self.options {
            Some(path) => LoaderOptions::load(path)
                .with_context(|| format!("Failed to load options {}", path.display())),
            None => Ok(defaults.loader.clone()),
        }
    }

    /// Load the config into a manager driving a fresh virtual card.
    pub fn open(&self) -> anyhow::Result<(MockCard, ConfigManager)> {
        let defaults = CliDefaults::load()?;
        let card = self.card(&defaults)?;
        let options = self.loader_options(&defaults)?;

        let manager = ConfigManager::init_with_options(&self.config, &card.opener(), &options)
            .with_context(|| format!("Failed to load {}", self.config.display()))?;
        tracing::info!(config = %self.config.display(), card = manager.card(), "config loaded");
        Ok((card, manager))
    }
}

/// Parse a device list such as `speaker|headphone`, `none` or `0x2`.
pub fn parse_devices(s: &str) -> anyhow::Result<DeviceMask> {
    let mut mask = devices::NONE;
    for token in s.split(['|', ',']).map(str::trim) {
        let bits = match token {
            "" => anyhow::bail!("Empty device name in '{}'", s),
            "none" => devices::NONE,
            name => match devices::device_by_name(name) {
                Some(bits) => bits,
                None => parse_u32(name).map_err(|_| {
                    anyhow::anyhow!("Unknown device '{}' (expected a device name or mask)", name)
                })?,
            },
        };
        mask |= bits;
    }
    Ok(mask)
}

/// Parse a stream format: `pcm`, `mp3`, `aac` or a numeric format code.
pub fn parse_format(s: &str) -> anyhow::Result<AudioFormat> {
    match s {
        "pcm" => Ok(AudioFormat::PCM_16_BIT),
        "mp3" => Ok(AudioFormat::MP3),
        "aac" => Ok(AudioFormat::AAC),
        other => parse_u32(other)
            .map(AudioFormat)
            .map_err(|_| anyhow::anyhow!("Unknown format '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_lists() {
        assert_eq!(parse_devices("speaker").unwrap(), devices::OUT_SPEAKER);
        assert_eq!(
            parse_devices("speaker|headphone").unwrap(),
            devices::OUT_SPEAKER | devices::OUT_WIRED_HEADPHONE
        );
        assert_eq!(parse_devices("back mic").unwrap(), devices::IN_BACK_MIC);
        assert_eq!(parse_devices("0x2").unwrap(), devices::OUT_SPEAKER);
        assert_eq!(parse_devices("none").unwrap(), devices::NONE);
        assert!(parse_devices("toaster").is_err());
        assert!(parse_devices("speaker|").is_err());
    }

    #[test]
    fn formats() {
        assert_eq!(parse_format("pcm").unwrap(), AudioFormat::PCM_16_BIT);
        assert_eq!(parse_format("0x1000000").unwrap(), AudioFormat::MP3);
        assert!(parse_format("flac").is_err());
    }

    #[test]
    fn defaults_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cli.toml");
        std::fs::write(&path, "controls = \"board.toml\"\n[loader]\nprobe_timeout_ms = 5\n")
            .unwrap();

        let defaults = CliDefaults::load_from(&path).unwrap();
        assert_eq!(defaults.controls, Some(PathBuf::from("board.toml")));
        assert_eq!(defaults.loader.probe_timeout_ms, 5);
        assert_eq!(defaults.loader.probe_poll_interval_ms, 50);
    }
}
