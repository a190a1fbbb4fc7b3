//! Configuration model.
//!
//! The entity graph compiled from a configuration file: devices owning
//! reference-counted paths, streams owning use-cases and constants, and the
//! control writes that every path and case is made of. The loader builds it,
//! the engine mutates the runtime fields (use counts, reference counts,
//! current routes and control bindings) under its lock.

use std::path::PathBuf;

use crate::devices::{self, DeviceMask};
use crate::dyn_array::DynArray;
use crate::stream::{HwStream, StreamType};

/// Stable mixer control identifier. Survives control list rescans.
pub type CtlId = u32;

/// Integer handle of a path name. Names are de-duplicated across the whole
/// config file chain so the same name always maps to the same id.
pub type PathId = u32;

/// Id of the reference-counted "off" path.
pub const PATH_ID_OFF: PathId = 0;
/// Id of the reference-counted "on" path.
pub const PATH_ID_ON: PathId = 1;
/// First id handed out to a custom path name.
pub const PATH_ID_CUSTOM_BASE: PathId = 2;

/// Value type of a live mixer control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtlType {
    /// On/off switch.
    Bool,
    /// Integer with a range.
    Int,
    /// One of a list of strings.
    Enum,
    /// Opaque byte array.
    Byte,
    /// IEC958 status bits.
    Iec958,
    /// 64-bit integer.
    Int64,
    /// Type the driver did not report.
    Unknown,
}

impl CtlType {
    /// Whether values of this type are written as integers.
    pub const fn is_integer(self) -> bool {
        matches!(self, CtlType::Bool | CtlType::Int)
    }
}

/// Which element of a multi-value control a write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CtlIndex {
    /// Every element (scalar controls only).
    #[default]
    All,
    /// One element, or the starting offset of a byte block.
    At(u32),
}

/// Converted byte payload of a byte-array control.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteBlock {
    /// Bytes written starting at the control's index.
    pub data: Vec<u8>,
    /// Scratch buffer the size of the whole control for read-modify-write.
    pub work: Vec<u8>,
    /// File the data was read from, if any.
    pub source: Option<PathBuf>,
}

/// Value carried by a [`Ctl`].
///
/// Starts as one of the pending forms and is converted the first time the
/// control is bound, when its live type is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtlValue {
    /// `val` attribute not yet converted.
    Pending(String),
    /// `file` attribute not yet read.
    PendingFile(PathBuf),
    /// Value for a bool or int control.
    Int(i32),
    /// Enum string, validated by the mixer when written.
    Enum(String),
    /// Byte-array data.
    Bytes(ByteBlock),
}

impl Default for CtlValue {
    fn default() -> Self {
        CtlValue::Pending(String::new())
    }
}

impl CtlValue {
    /// Whether the value still needs converting.
    pub fn is_pending(&self) -> bool {
        matches!(self, CtlValue::Pending(_) | CtlValue::PendingFile(_))
    }
}

/// Cached resolution of a control name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binding {
    /// Not looked up yet, or invalidated by a mixer reopen.
    #[default]
    Unresolved,
    /// Resolved to a live control.
    Bound {
        /// Mixer control id.
        id: CtlId,
        /// Type seen when the binding was made.
        ctl_type: CtlType,
    },
}

impl Binding {
    /// Whether the binding is resolved.
    pub fn is_bound(&self) -> bool {
        matches!(self, Binding::Bound { .. })
    }

    /// Resolved control id.
    pub fn id(&self) -> Option<CtlId> {
        match *self {
            Binding::Bound { id, .. } => Some(id),
            Binding::Unresolved => None,
        }
    }
}

/// One mixer control write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ctl {
    /// Control name as the driver reports it.
    pub name: String,
    /// Element selector.
    pub index: CtlIndex,
    /// Value to write.
    pub value: CtlValue,
    /// Binding cache.
    pub binding: Binding,
}

impl Ctl {
    /// Unbound control write.
    pub fn new(name: impl Into<String>, index: CtlIndex, value: CtlValue) -> Self {
        Self {
            name: name.into(),
            index,
            value,
            binding: Binding::Unresolved,
        }
    }

    /// Drop the binding; the converted value is kept.
    pub fn invalidate(&mut self) {
        self.binding = Binding::Unresolved;
    }
}

/// Ordered control writes under one path id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    /// Path name id.
    pub id: PathId,
    /// Writes in declaration order.
    pub ctls: DynArray<Ctl>,
}

impl Path {
    /// Empty path.
    pub fn new(id: PathId) -> Self {
        Self {
            id,
            ctls: DynArray::new(),
        }
    }
}

/// A routable device or the global pseudo-device.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Device {
    /// Device bits; 0 for the global device.
    pub mask: DeviceMask,
    /// Number of routes currently holding the device on.
    pub use_count: u32,
    /// Paths declared for the device.
    pub paths: DynArray<Path>,
}

impl Device {
    /// Device with no paths.
    pub fn new(mask: DeviceMask) -> Self {
        Self {
            mask,
            use_count: 0,
            paths: DynArray::new(),
        }
    }

    /// Whether this is the global pseudo-device.
    pub fn is_global(&self) -> bool {
        self.mask == devices::NONE
    }

    /// Position of the path with this id.
    pub fn path_position(&self, id: PathId) -> Option<usize> {
        self.paths.iter().position(|p| p.id == id)
    }

    /// Path with this id.
    pub fn path(&self, id: PathId) -> Option<&Path> {
        self.paths.iter().find(|p| p.id == id)
    }
}

/// A stream volume control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeControl {
    /// Control name.
    pub name: String,
    /// Binding cache.
    pub binding: Binding,
    /// Element written.
    pub index: u32,
    /// Value written at 0%.
    pub min: i32,
    /// Value written at 100%.
    pub max: i32,
}

/// Named string on a stream, read back by the HAL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Constant {
    /// Constant name.
    pub name: String,
    /// Raw value text.
    pub value: String,
}

/// One alternative of a use-case.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Case {
    /// Case name.
    pub name: String,
    /// Writes applied when the case is selected.
    pub ctls: DynArray<Ctl>,
}

/// Named group of alternative control sets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UseCase {
    /// Setting name.
    pub name: String,
    /// Alternatives.
    pub cases: DynArray<Case>,
}

impl UseCase {
    /// Case with this exact name.
    pub fn case_mut(&mut self, name: &str) -> Option<&mut Case> {
        self.cases.iter_mut().find(|c| c.name == name)
    }
}

/// Codec name to config file mapping inside a `<codec_probe>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodecCase {
    /// Codec name as read from the probe file.
    pub codec: String,
    /// Config file to continue with.
    pub file: PathBuf,
}

/// A `<codec_probe>` block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodecProbe {
    /// File that names the fitted codec.
    pub file: PathBuf,
    /// Alternatives.
    pub cases: DynArray<CodecCase>,
}

/// A declared stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    /// Name for named streams.
    pub name: Option<String>,
    /// Static description.
    pub info: HwStream,
    /// Open instances.
    pub ref_count: u32,
    /// Instance cap.
    pub max_ref_count: u32,
    /// Path applied after "on" when a device is enabled.
    pub enable_path: Option<PathId>,
    /// Path applied before "off" when a device is disabled.
    pub disable_path: Option<PathId>,
    /// Devices currently routed.
    pub current_devices: DeviceMask,
    /// Left (or mono) volume.
    pub volume_left: Option<VolumeControl>,
    /// Right volume.
    pub volume_right: Option<VolumeControl>,
    /// Use-cases.
    pub usecases: DynArray<UseCase>,
    /// Constants.
    pub constants: DynArray<Constant>,
}

impl Stream {
    /// Stream with no instances open and nothing routed.
    pub fn new(name: Option<String>, info: HwStream, max_ref_count: u32) -> Self {
        Self {
            name,
            info,
            ref_count: 0,
            max_ref_count,
            enable_path: None,
            disable_path: None,
            current_devices: devices::NONE,
            volume_left: None,
            volume_right: None,
            usecases: DynArray::new(),
            constants: DynArray::new(),
        }
    }

    /// Stream type.
    pub fn stream_type(&self) -> StreamType {
        self.info.stream_type
    }

    /// Constant with this exact name.
    pub fn constant(&self, name: &str) -> Option<&str> {
        self.constants
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Release unused capacity of the stream's arrays.
    pub fn compress(&mut self) {
        for uc in &mut self.usecases {
            for case in &mut uc.cases {
                case.ctls.compress();
            }
            uc.cases.compress();
        }
        self.usecases.compress();
        self.constants.compress();
    }
}

/// Which stream array a [`StreamId`] indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamPool {
    /// Streams matched by type.
    Anonymous,
    /// Streams looked up by name.
    Named,
}

/// Stable handle to a stream in a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId {
    /// Array the stream lives in.
    pub pool: StreamPool,
    /// Position within the array.
    pub index: usize,
}

/// The compiled configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    /// Devices in declaration order.
    pub devices: DynArray<Device>,
    /// Streams without a name.
    pub anon_streams: DynArray<Stream>,
    /// Streams with a name.
    pub named_streams: DynArray<Stream>,
    /// Path names indexed by [`PathId`].
    pub path_names: DynArray<String>,
    /// Union of declared output devices.
    pub supported_output_devices: DeviceMask,
    /// Union of declared input devices, with the direction bit.
    pub supported_input_devices: DeviceMask,
}

impl Model {
    /// Empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the named stream, searching the most recent declaration first.
    pub fn find_named_stream(&self, name: &str) -> Option<usize> {
        self.named_streams
            .iter()
            .rposition(|s| s.name.as_deref() == Some(name))
    }

    /// The stream array for a pool.
    pub fn pool(&self, pool: StreamPool) -> &DynArray<Stream> {
        match pool {
            StreamPool::Anonymous => &self.anon_streams,
            StreamPool::Named => &self.named_streams,
        }
    }

    /// Stream behind a handle.
    pub fn stream(&self, id: StreamId) -> Option<&Stream> {
        self.pool(id.pool).get(id.index)
    }

    /// Mutable stream behind a handle.
    pub fn stream_mut(&mut self, id: StreamId) -> Option<&mut Stream> {
        match id.pool {
            StreamPool::Anonymous => self.anon_streams.get_mut(id.index),
            StreamPool::Named => self.named_streams.get_mut(id.index),
        }
    }

    /// Index of the first global device.
    pub fn global_device(&self) -> Option<usize> {
        self.devices.iter().position(Device::is_global)
    }

    /// Name registered for a path id.
    pub fn path_name(&self, id: PathId) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.path_names.get(i))
            .map(String::as_str)
    }

    /// Id registered for a path name.
    pub fn path_id(&self, name: &str) -> Option<PathId> {
        self.path_names
            .iter()
            .rposition(|n| n == name)
            .and_then(|i| PathId::try_from(i).ok())
    }

    /// Release unused capacity everywhere.
    pub fn compress(&mut self) {
        for dev in &mut self.devices {
            for path in &mut dev.paths {
                path.ctls.compress();
            }
            dev.paths.compress();
        }
        for s in &mut self.anon_streams {
            s.compress();
        }
        for s in &mut self.named_streams {
            s.compress();
        }
        self.devices.compress();
        self.anon_streams.compress();
        self.named_streams.compress();
        self.path_names.compress();
    }

    /// Forget every cached control binding, keeping converted values.
    pub fn invalidate_bindings(&mut self) {
        for dev in &mut self.devices {
            for path in &mut dev.paths {
                path.ctls.iter_mut().for_each(Ctl::invalidate);
            }
        }
        for s in self
            .anon_streams
            .iter_mut()
            .chain(self.named_streams.iter_mut())
        {
            for uc in &mut s.usecases {
                for case in &mut uc.cases {
                    case.ctls.iter_mut().for_each(Ctl::invalidate);
                }
            }
            for vol in [&mut s.volume_left, &mut s.volume_right]
                .into_iter()
                .flatten()
            {
                vol.binding = Binding::Unresolved;
            }
        }
    }

    /// Total number of control writes in device paths.
    pub fn path_ctl_count(&self) -> usize {
        self.devices
            .iter()
            .flat_map(|d| d.paths.iter())
            .map(|p| p.ctls.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{IN_BUILTIN_MIC, OUT_SPEAKER};

    fn bound_ctl(name: &str) -> Ctl {
        let mut c = Ctl::new(name, CtlIndex::All, CtlValue::Int(1));
        c.binding = Binding::Bound {
            id: 3,
            ctl_type: CtlType::Int,
        };
        c
    }

    fn sample_model() -> Model {
        let mut m = Model::new();
        let mut speaker = Device::new(OUT_SPEAKER);
        let mut on = Path::new(PATH_ID_ON);
        on.ctls.push(bound_ctl("Speaker Switch")).unwrap();
        speaker.paths.push(on).unwrap();
        m.devices.push(Device::new(devices::NONE)).unwrap();
        m.devices.push(speaker).unwrap();
        m.devices.push(Device::new(IN_BUILTIN_MIC)).unwrap();

        let info = HwStream::new(StreamType::OutPcm, 0);
        m.named_streams
            .push(Stream::new(Some("voice".into()), info, u32::MAX))
            .unwrap();
        m.named_streams
            .push(Stream::new(Some("ring".into()), info, 1))
            .unwrap();
        m
    }

    #[test]
    fn named_lookup() {
        let m = sample_model();
        assert_eq!(m.find_named_stream("ring"), Some(1));
        assert_eq!(m.find_named_stream("voice"), Some(0));
        assert_eq!(m.find_named_stream("music"), None);
    }

    #[test]
    fn global_device_is_mask_zero() {
        let m = sample_model();
        assert_eq!(m.global_device(), Some(0));
        assert!(m.devices[0].is_global());
        assert!(!m.devices[1].is_global());
    }

    #[test]
    fn invalidate_keeps_values() {
        let mut m = sample_model();
        m.invalidate_bindings();
        let ctl = &m.devices[1].paths[0].ctls[0];
        assert_eq!(ctl.binding, Binding::Unresolved);
        assert_eq!(ctl.value, CtlValue::Int(1));
    }

    #[test]
    fn compress_trims_every_array() {
        let mut m = sample_model();
        m.compress();
        assert_eq!(m.devices.capacity(), 3);
        assert_eq!(m.devices[1].paths.capacity(), 1);
        assert_eq!(m.named_streams.capacity(), 2);
        assert_eq!(m.path_ctl_count(), 1);
    }

    #[test]
    fn stream_handles() {
        let mut m = sample_model();
        let id = StreamId {
            pool: StreamPool::Named,
            index: 1,
        };
        m.stream_mut(id).unwrap().ref_count = 1;
        assert_eq!(m.stream(id).unwrap().ref_count, 1);
        let bad = StreamId {
            pool: StreamPool::Anonymous,
            index: 0,
        };
        assert!(m.stream(bad).is_none());
    }
}
