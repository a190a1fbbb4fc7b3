//! Audioroute Core - configuration model for the mixer-control engine
//!
//! This crate holds the pieces every other audioroute crate shares: the entity
//! graph compiled from an audio HAL configuration file, the granular growable
//! array it is built from, the Android-compatible device and format
//! definitions, and the common error type.
//!
//! # Core Abstractions
//!
//! ## Storage
//!
//! - [`DynArray`] - Growable typed array with granular growth and a one-time
//!   shrink-to-fit once population is final
//!
//! ## Model
//!
//! - [`Model`] - Devices plus the anonymous and named stream pools
//! - [`Device`] - One routing bitmask with reference-counted on/off [`Path`]s
//! - [`Stream`] - A declared hardware endpoint with an instance cap
//! - [`Ctl`] - One named mixer-control write and its binding cache
//!
//! ## Definitions
//!
//! - [`devices`] - Device bitmasks and the config-file device name table
//! - [`AudioFormat`], [`OutputFlags`] - Request attributes used for stream matching
//! - [`StreamType`], [`HwStream`] - Static stream description handed to callers
//!
//! # Example
//!
//! ```rust
//! use audioroute_core::{DynArray, Device, devices};
//!
//! let mut table: DynArray<Device> = DynArray::new();
//! table.push(Device::new(devices::OUT_SPEAKER)).unwrap();
//! table.compress();
//! assert_eq!(table.len(), table.capacity());
//! ```

pub mod devices;
pub mod dyn_array;
pub mod error;
pub mod format;
pub mod model;
pub mod numeric;
pub mod stream;

pub use devices::DeviceMask;
pub use dyn_array::{DYN_ARRAY_GRANULE, DYN_ARRAY_MAX_CAPACITY, DynArray};
pub use error::{Error, ErrorKind, Result};
pub use format::{AudioFormat, OutputFlags};
pub use model::{
    Binding, ByteBlock, Case, CodecCase, CodecProbe, Constant, Ctl, CtlId, CtlIndex, CtlType,
    CtlValue, Device, Model, PATH_ID_CUSTOM_BASE, PATH_ID_OFF, PATH_ID_ON, Path, PathId, Stream,
    StreamId, StreamPool, UseCase, VolumeControl,
};
pub use numeric::{parse_i32, parse_u32};
pub use stream::{HwStream, StreamType};
