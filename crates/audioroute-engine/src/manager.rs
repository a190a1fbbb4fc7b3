//! The engine root.

use std::path::Path;

use parking_lot::Mutex;

use audioroute_config::{LoadedConfig, LoaderOptions};
use audioroute_core::{DeviceMask, HwStream, Model, Result, StreamId, StreamType};
use audioroute_mixer::{Mixer, MixerOpener};

/// Mixer and model, always locked together.
pub(crate) struct State {
    pub(crate) mixer: Box<dyn Mixer>,
    pub(crate) model: Model,
}

/// A loaded configuration driving one sound card.
///
/// Every operation takes the internal lock, so a manager can be shared
/// between threads. Dropping it closes the mixer.
pub struct ConfigManager {
    pub(crate) state: Mutex<State>,
    card: u32,
}

/// An acquired stream.
///
/// Handles are plain values; the stream stays acquired until it is passed to
/// [`ConfigManager::release_stream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHandle {
    pub(crate) id: StreamId,
    info: HwStream,
}

impl StreamHandle {
    pub(crate) fn new(id: StreamId, info: HwStream) -> Self {
        Self { id, info }
    }

    /// Static description of the stream.
    pub fn info(&self) -> &HwStream {
        &self.info
    }

    /// Stream type.
    pub fn stream_type(&self) -> StreamType {
        self.info.stream_type
    }

    /// Position of the stream in the model.
    pub fn id(&self) -> StreamId {
        self.id
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("card", &self.card)
            .finish_non_exhaustive()
    }
}

impl ConfigManager {
    /// Load `file` with default loader options.
    pub fn init(file: impl AsRef<Path>, opener: &dyn MixerOpener) -> Result<Self> {
        Self::init_with_options(file, opener, &LoaderOptions::default())
    }

    /// Load `file`.
    pub fn init_with_options(
        file: impl AsRef<Path>,
        opener: &dyn MixerOpener,
        options: &LoaderOptions,
    ) -> Result<Self> {
        audioroute_config::load(file, opener, options).map(Self::from_loaded)
    }

    /// Load `audio.<product>.xml` from the configured etc directory.
    pub fn init_for_product(
        product: &str,
        opener: &dyn MixerOpener,
        options: &LoaderOptions,
    ) -> Result<Self> {
        audioroute_config::load_product(product, opener, options).map(Self::from_loaded)
    }

    /// Wrap an already loaded configuration.
    pub fn from_loaded(loaded: LoadedConfig) -> Self {
        Self {
            state: Mutex::new(State {
                mixer: loaded.mixer,
                model: loaded.model,
            }),
            card: loaded.card,
        }
    }

    /// Card the mixer is open on.
    pub fn card(&self) -> u32 {
        self.card
    }

    /// Run `f` with the mixer, holding the lock.
    pub fn with_mixer<R>(&self, f: impl FnOnce(&mut dyn Mixer) -> R) -> R {
        let mut state = self.state.lock();
        f(state.mixer.as_mut())
    }

    /// Run `f` with the model, holding the lock.
    pub fn with_model<R>(&self, f: impl FnOnce(&Model) -> R) -> R {
        f(&self.state.lock().model)
    }

    /// Whether a named stream is declared.
    pub fn is_named_stream_defined(&self, name: &str) -> bool {
        let defined = self.state.lock().model.find_named_stream(name).is_some();
        tracing::trace!(name, defined, "is_named_stream_defined");
        defined
    }

    /// Output devices declared in the config.
    pub fn get_supported_output_devices(&self) -> DeviceMask {
        self.state.lock().model.supported_output_devices
    }

    /// Input devices declared in the config, with the direction bit.
    pub fn get_supported_input_devices(&self) -> DeviceMask {
        self.state.lock().model.supported_input_devices
    }
}
