//! XML configuration loading for the audioroute engine.
//!
//! Reads an audio HAL description (mixer card, devices and their paths,
//! streams with their use-cases, volume controls and constants) and compiles
//! it into an [`audioroute_core::Model`] bound against a live mixer.
//!
//! # Features
//!
//! - **Grammar**: Static element table checked while parsing, errors carry the
//!   offending line
//! - **Codec probing**: `<codec_probe>` switches to a codec-specific file
//! - **Mixer setup**: `<pre_init>` runs before the mixer is reopened,
//!   `<init>` runs once loading finished
//! - **Options**: Loader tuning from TOML
//! - **Paths**: Product config and CLI defaults locations
//!
//! # Example
//!
//! ```rust,no_run
//! use audioroute_config::{LoaderOptions, load};
//! use audioroute_mixer::mock::MockCard;
//!
//! let card = MockCard::load("controls.toml").unwrap();
//! let config = load("audio.xml", &card.opener(), &LoaderOptions::default()).unwrap();
//! println!("{} devices", config.model.devices.len());
//! ```

mod error;
mod loader;
mod options;

/// Element and attribute grammar.
pub mod grammar;

/// Config file locations.
pub mod paths;

/// Codec probe file reading.
pub mod probe;

pub use error::{OptionsError, Result as OptionsResult};
pub use loader::{LoadedConfig, UNLIMITED_INSTANCES, load, load_product};
pub use options::{DEFAULT_ETC_DIR, LoaderOptions};
pub use paths::{cli_config_path, product_config_path, user_config_dir};
