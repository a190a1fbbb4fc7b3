//! Audioroute Engine - runtime routing over a loaded configuration
//!
//! [`ConfigManager`] owns the compiled model and the open mixer and serves
//! the audio HAL at runtime: handing out stream instances, switching device
//! routes, setting hardware volume and applying use-cases.
//!
//! # Routing
//!
//! Devices are reference counted. The first route that includes a device
//! applies its `on` path, the last one to drop it applies `off`. A stream's
//! own enable and disable paths are applied on every change, after `on` and
//! before `off` respectively.
//!
//! # Example
//!
//! ```rust,no_run
//! use audioroute_engine::{AudioFormat, ConfigManager, OutputFlags, devices};
//! use audioroute_mixer::mock::MockCard;
//!
//! let card = MockCard::load("controls.toml").unwrap();
//! let manager = ConfigManager::init("audio.xml", &card.opener()).unwrap();
//!
//! let stream = manager
//!     .get_stream(devices::OUT_SPEAKER, OutputFlags::PRIMARY, AudioFormat::PCM_16_BIT)
//!     .unwrap();
//! manager.apply_route(&stream, devices::OUT_WIRED_HEADPHONE);
//! manager.set_hw_volume(&stream, 80, 80).unwrap();
//! manager.release_stream(&stream);
//! ```

mod constants;
mod lifecycle;
mod manager;
mod routing;
mod usecase;
mod volume;

pub use audioroute_core::{
    AudioFormat, DeviceMask, Error, ErrorKind, HwStream, OutputFlags, Result, StreamType, devices,
};
pub use manager::{ConfigManager, StreamHandle};
pub use volume::scale_volume;
