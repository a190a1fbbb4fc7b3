//! In-memory sound card.
//!
//! [`MockCard`] holds a control table and records every successful write, so
//! tests and the CLI can see exactly what a routing operation did to the
//! hardware. It behaves like a driver in the ways the engine depends on:
//!
//! - an open [`MockMixer`] only sees the controls that existed when it was
//!   opened, until [`Mixer::add_new_ctls`] is called
//! - a control may be declared `created_by` another control, in which case it
//!   appears the first time that control is written
//! - writes are range checked
//!
//! A card can be described in TOML:
//!
//! ```toml
//! card = 0
//! id = "wm8994"
//!
//! [[control]]
//! name = "Speaker Volume"
//! type = "int"
//! count = 2
//! min = 0
//! max = 255
//!
//! [[control]]
//! name = "AIF1 Mux"
//! type = "enum"
//! values = ["ADC", "DMIC"]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use thiserror::Error;

use audioroute_core::{CtlId, CtlType, Error, Result};

use crate::backend::{CtlInfo, Mixer, MixerOpener};

/// Errors loading a mock card description.
#[derive(Debug, Error)]
pub enum SpecError {
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

    /// A control entry is inconsistent
    #[error("invalid control '{name}': {reason}")]
    InvalidControl {
        /// Control name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Control type as written in a card description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    /// Switch.
    Bool,
    /// Ranged integer.
    Int,
    /// String list.
    Enum,
    /// Byte array.
    Byte,
    /// IEC958 status.
    Iec958,
    /// 64-bit integer.
    Int64,
}

impl From<ControlKind> for CtlType {
    fn from(kind: ControlKind) -> Self {
        match kind {
            ControlKind::Bool => CtlType::Bool,
            ControlKind::Int => CtlType::Int,
            ControlKind::Enum => CtlType::Enum,
            ControlKind::Byte => CtlType::Byte,
            ControlKind::Iec958 => CtlType::Iec958,
            ControlKind::Int64 => CtlType::Int64,
        }
    }
}

fn default_count() -> u32 {
    1
}

/// One control of a mock card.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockControl {
    /// Control name.
    pub name: String,
    /// Value type.
    #[serde(rename = "type")]
    pub kind: ControlKind,
    /// Number of elements.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Integer minimum.
    #[serde(default)]
    pub min: i32,
    /// Integer maximum.
    #[serde(default)]
    pub max: i32,
    /// Initial value of every element (enum: item index).
    #[serde(default)]
    pub value: i32,
    /// Enum items.
    #[serde(default)]
    pub values: Vec<String>,
    /// Initial bytes of a byte control.
    #[serde(default)]
    pub data: Vec<u8>,
    /// Control whose first write makes this one appear.
    #[serde(default)]
    pub created_by: Option<String>,
}

impl MockControl {
    fn new(name: &str, kind: ControlKind, count: u32) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            count,
            min: 0,
            max: 0,
            value: 0,
            values: Vec::new(),
            data: Vec::new(),
            created_by: None,
        }
    }

    /// Integer control.
    pub fn int(name: &str, count: u32, min: i32, max: i32) -> Self {
        Self {
            min,
            max,
            value: min,
            ..Self::new(name, ControlKind::Int, count)
        }
    }

    /// Switch control.
    pub fn boolean(name: &str, count: u32) -> Self {
        Self {
            max: 1,
            ..Self::new(name, ControlKind::Bool, count)
        }
    }

    /// Single-element enum control.
    pub fn enumerated(name: &str, items: &[&str]) -> Self {
        Self {
            values: items.iter().map(|s| (*s).to_owned()).collect(),
            ..Self::new(name, ControlKind::Enum, 1)
        }
    }

    /// Zero-filled byte control.
    pub fn bytes(name: &str, count: u32) -> Self {
        Self::new(name, ControlKind::Byte, count)
    }

    /// Control of a type the engine does not handle.
    pub fn of_kind(name: &str, kind: ControlKind, count: u32) -> Self {
        Self::new(name, kind, count)
    }

    /// Make the control appear only once `trigger` has been written.
    pub fn created_by(mut self, trigger: &str) -> Self {
        self.created_by = Some(trigger.to_owned());
        self
    }

    fn validate(&self) -> std::result::Result<(), SpecError> {
        let invalid = |reason: &str| SpecError::InvalidControl {
            name: self.name.clone(),
            reason: reason.to_owned(),
        };
        if self.count == 0 {
            return Err(invalid("count must be at least 1"));
        }
        match self.kind {
            ControlKind::Enum if self.values.is_empty() => Err(invalid("enum needs values")),
            ControlKind::Enum if self.value < 0 || self.value as usize >= self.values.len() => {
                Err(invalid("initial enum index out of range"))
            }
            ControlKind::Int if self.min > self.max => Err(invalid("min is above max")),
            ControlKind::Byte if self.data.len() > self.count as usize => {
                Err(invalid("more data than elements"))
            }
            _ => Ok(()),
        }
    }
}

/// What a write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// One scalar element.
    Value {
        /// Element index.
        index: u32,
        /// Value written.
        value: i32,
    },
    /// Enum item by name.
    Enum(String),
    /// Byte array from element 0.
    Array(Vec<u8>),
}

/// A successful write to a mock control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    /// Control written.
    pub control: String,
    /// Operation.
    pub op: WriteOp,
}

impl WriteRecord {
    /// Scalar write.
    pub fn value(control: &str, index: u32, value: i32) -> Self {
        Self {
            control: control.to_owned(),
            op: WriteOp::Value { index, value },
        }
    }

    /// Enum write.
    pub fn enumerated(control: &str, item: &str) -> Self {
        Self {
            control: control.to_owned(),
            op: WriteOp::Enum(item.to_owned()),
        }
    }

    /// Byte array write.
    pub fn array(control: &str, data: &[u8]) -> Self {
        Self {
            control: control.to_owned(),
            op: WriteOp::Array(data.to_vec()),
        }
    }
}

impl fmt::Display for WriteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            WriteOp::Value { index, value } => write!(f, "'{}'[{}] = {}", self.control, index, value),
            WriteOp::Enum(item) => write!(f, "'{}' = '{}'", self.control, item),
            WriteOp::Array(data) => {
                write!(f, "'{}' = [", self.control)?;
                for (i, b) in data.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{b:02x}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug)]
struct ControlState {
    spec: MockControl,
    present: bool,
    ints: Vec<i32>,
    bytes: Vec<u8>,
}

impl ControlState {
    fn new(spec: MockControl) -> Self {
        let count = spec.count as usize;
        let mut bytes = vec![0; if spec.kind == ControlKind::Byte { count } else { 0 }];
        let n = spec.data.len().min(bytes.len());
        bytes[..n].copy_from_slice(&spec.data[..n]);
        Self {
            present: spec.created_by.is_none(),
            ints: vec![spec.value; count],
            bytes,
            spec,
        }
    }

    fn check_index(&self, index: u32) -> Result<usize> {
        if index < self.spec.count {
            Ok(index as usize)
        } else {
            Err(Error::mixer_io(
                &self.spec.name,
                format!("index {index} out of range ({})", self.spec.count),
            ))
        }
    }
}

#[derive(Debug)]
struct CardState {
    number: u32,
    id: Option<String>,
    controls: Vec<ControlState>,
    writes: Vec<WriteRecord>,
    opens: u32,
}

impl CardState {
    fn control(&self, id: CtlId) -> Result<&ControlState> {
        self.controls
            .get(id as usize)
            .filter(|c| c.present)
            .ok_or_else(|| Error::mixer_io(format!("#{id}"), "no such control"))
    }

    fn control_mut(&mut self, id: CtlId) -> Result<&mut ControlState> {
        self.controls
            .get_mut(id as usize)
            .filter(|c| c.present)
            .ok_or_else(|| Error::mixer_io(format!("#{id}"), "no such control"))
    }

    fn by_name(&self, name: &str) -> Option<&ControlState> {
        self.controls.iter().find(|c| c.spec.name == name)
    }

    fn record(&mut self, record: WriteRecord) {
        for c in &mut self.controls {
            if !c.present && c.spec.created_by.as_deref() == Some(record.control.as_str()) {
                tracing::debug!(control = %c.spec.name, trigger = %record.control, "control created");
                c.present = true;
            }
        }
        self.writes.push(record);
    }
}

/// Shared handle to an in-memory sound card.
///
/// Clones refer to the same card.
#[derive(Debug, Clone)]
pub struct MockCard {
    state: Arc<Mutex<CardState>>,
}

/// Top level of a TOML card description.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CardSpec {
    #[serde(default)]
    card: u32,
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "control")]
    controls: Vec<MockControl>,
}

impl MockCard {
    /// Empty card.
    pub fn new(number: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(CardState {
                number,
                id: None,
                controls: Vec::new(),
                writes: Vec::new(),
                opens: 0,
            })),
        }
    }

    /// Empty card with an id string for lookup by name.
    pub fn named(number: u32, id: &str) -> Self {
        let card = Self::new(number);
        card.state.lock().id = Some(id.to_owned());
        card
    }

    /// Parse a TOML card description.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, SpecError> {
        let spec: CardSpec = toml::from_str(text)?;
        let card = Self::new(spec.card);
        card.state.lock().id = spec.id;
        for control in spec.controls {
            control.validate()?;
            card.add_control(control);
        }
        Ok(card)
    }

    /// Load a TOML card description from a file.
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, SpecError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SpecError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Card number.
    pub fn number(&self) -> u32 {
        self.state.lock().number
    }

    /// Append a control. Already open mixers see it after a rescan.
    pub fn add_control(&self, control: MockControl) {
        self.state.lock().controls.push(ControlState::new(control));
    }

    /// Names of the controls that currently exist.
    pub fn control_names(&self) -> Vec<String> {
        self.state
            .lock()
            .controls
            .iter()
            .filter(|c| c.present)
            .map(|c| c.spec.name.clone())
            .collect()
    }

    /// Opener serving only this card.
    pub fn opener(&self) -> MockOpener {
        MockOpener {
            cards: vec![self.clone()],
        }
    }

    /// Number of times a mixer was opened on this card.
    pub fn open_count(&self) -> u32 {
        self.state.lock().opens
    }

    /// Copy of the write log.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().writes.clone()
    }

    /// Drain the write log.
    pub fn take_writes(&self) -> Vec<WriteRecord> {
        std::mem::take(&mut self.state.lock().writes)
    }

    /// Scalar values of a control, empty if it does not exist.
    pub fn values(&self, name: &str) -> Vec<i32> {
        self.state
            .lock()
            .by_name(name)
            .map(|c| c.ints.clone())
            .unwrap_or_default()
    }

    /// Selected item of an enum control.
    pub fn enum_value(&self, name: &str) -> Option<String> {
        let state = self.state.lock();
        let c = state.by_name(name)?;
        let index = usize::try_from(*c.ints.first()?).ok()?;
        c.spec.values.get(index).cloned()
    }

    /// Contents of a byte control.
    pub fn bytes(&self, name: &str) -> Vec<u8> {
        self.state
            .lock()
            .by_name(name)
            .map(|c| c.bytes.clone())
            .unwrap_or_default()
    }

    /// Overwrite the start of a byte control without logging a write.
    pub fn set_bytes(&self, name: &str, data: &[u8]) {
        let mut state = self.state.lock();
        if let Some(c) = state.controls.iter_mut().find(|c| c.spec.name == name) {
            let n = data.len().min(c.bytes.len());
            c.bytes[..n].copy_from_slice(&data[..n]);
        }
    }

    fn open_mixer(&self) -> MockMixer {
        let mut state = self.state.lock();
        state.opens += 1;
        let known = present_ids(&state);
        tracing::debug!(card = state.number, controls = known.len(), "mock mixer opened");
        MockMixer {
            card: self.clone(),
            number: state.number,
            known,
        }
    }
}

fn present_ids(state: &CardState) -> Vec<CtlId> {
    state
        .controls
        .iter()
        .enumerate()
        .filter(|(_, c)| c.present)
        .map(|(i, _)| i as CtlId)
        .collect()
}

/// A mixer opened on a [`MockCard`].
#[derive(Debug)]
pub struct MockMixer {
    card: MockCard,
    number: u32,
    known: Vec<CtlId>,
}

impl MockMixer {
    fn write<F>(&mut self, id: CtlId, f: F) -> Result<()>
    where
        F: FnOnce(&mut ControlState) -> Result<WriteRecord>,
    {
        if !self.known.contains(&id) {
            return Err(Error::mixer_io(format!("#{id}"), "control not known to this mixer"));
        }
        let mut state = self.card.state.lock();
        let record = f(state.control_mut(id)?)?;
        state.record(record);
        Ok(())
    }
}

impl Mixer for MockMixer {
    fn card(&self) -> u32 {
        self.number
    }

    fn ctl_by_name(&self, name: &str) -> Option<CtlId> {
        let state = self.card.state.lock();
        self.known
            .iter()
            .copied()
            .find(|&id| state.controls[id as usize].spec.name == name)
    }

    fn add_new_ctls(&mut self) -> Result<()> {
        self.known = present_ids(&self.card.state.lock());
        Ok(())
    }

    fn ctl_info(&self, id: CtlId) -> Option<CtlInfo> {
        if !self.known.contains(&id) {
            return None;
        }
        let state = self.card.state.lock();
        let c = state.control(id).ok()?;
        Some(CtlInfo {
            id,
            name: c.spec.name.clone(),
            ctl_type: c.spec.kind.into(),
            num_values: c.spec.count,
        })
    }

    fn range(&self, id: CtlId) -> Result<(i32, i32)> {
        let state = self.card.state.lock();
        let c = state.control(id)?;
        match c.spec.kind {
            ControlKind::Int => Ok((c.spec.min, c.spec.max)),
            _ => Err(Error::mixer_io(&c.spec.name, "not an integer control")),
        }
    }

    fn get_value(&self, id: CtlId, index: u32) -> Result<i32> {
        let state = self.card.state.lock();
        let c = state.control(id)?;
        let i = c.check_index(index)?;
        Ok(match c.spec.kind {
            ControlKind::Byte => i32::from(c.bytes[i]),
            _ => c.ints[i],
        })
    }

    fn set_value(&mut self, id: CtlId, index: u32, value: i32) -> Result<()> {
        self.write(id, |c| {
            let i = c.check_index(index)?;
            let (lo, hi) = match c.spec.kind {
                ControlKind::Bool => (0, 1),
                ControlKind::Int => (c.spec.min, c.spec.max),
                ControlKind::Enum => (0, c.spec.values.len() as i32 - 1),
                ControlKind::Byte => (0, 255),
                ControlKind::Iec958 | ControlKind::Int64 => {
                    return Err(Error::mixer_io(&c.spec.name, "unsupported type"));
                }
            };
            if !(lo..=hi).contains(&value) {
                return Err(Error::mixer_io(
                    &c.spec.name,
                    format!("value {value} outside {lo}..={hi}"),
                ));
            }
            if c.spec.kind == ControlKind::Byte {
                c.bytes[i] = value as u8;
            } else {
                c.ints[i] = value;
            }
            Ok(WriteRecord::value(&c.spec.name, index, value))
        })
    }

    fn set_enum_by_string(&mut self, id: CtlId, value: &str) -> Result<()> {
        self.write(id, |c| {
            if c.spec.kind != ControlKind::Enum {
                return Err(Error::mixer_io(&c.spec.name, "not an enum control"));
            }
            let item = c
                .spec
                .values
                .iter()
                .position(|v| v == value)
                .ok_or_else(|| Error::mixer_io(&c.spec.name, format!("no enum item '{value}'")))?;
            c.ints.fill(item as i32);
            Ok(WriteRecord::enumerated(&c.spec.name, value))
        })
    }

    fn get_array(&self, id: CtlId, buf: &mut [u8]) -> Result<()> {
        let state = self.card.state.lock();
        let c = state.control(id)?;
        if c.spec.kind != ControlKind::Byte {
            return Err(Error::mixer_io(&c.spec.name, "not a byte control"));
        }
        let n = buf.len().min(c.bytes.len());
        buf[..n].copy_from_slice(&c.bytes[..n]);
        Ok(())
    }

    fn set_array(&mut self, id: CtlId, data: &[u8]) -> Result<()> {
        self.write(id, |c| {
            if c.spec.kind != ControlKind::Byte {
                return Err(Error::mixer_io(&c.spec.name, "not a byte control"));
            }
            if data.len() > c.bytes.len() {
                return Err(Error::mixer_io(
                    &c.spec.name,
                    format!("{} bytes exceed control size {}", data.len(), c.bytes.len()),
                ));
            }
            c.bytes[..data.len()].copy_from_slice(data);
            Ok(WriteRecord::array(&c.spec.name, data))
        })
    }
}

/// Opens [`MockMixer`]s on a set of [`MockCard`]s.
#[derive(Debug, Clone, Default)]
pub struct MockOpener {
    cards: Vec<MockCard>,
}

impl MockOpener {
    /// Opener serving the given cards.
    pub fn new(cards: Vec<MockCard>) -> Self {
        Self { cards }
    }
}

impl MixerOpener for MockOpener {
    fn open(&self, card: u32) -> Result<Box<dyn Mixer>> {
        self.cards
            .iter()
            .find(|c| c.number() == card)
            .map(|c| Box::new(c.open_mixer()) as Box<dyn Mixer>)
            .ok_or_else(|| Error::MixerOpen {
                card,
                reason: "no such card".into(),
            })
    }

    fn card_by_name(&self, name: &str) -> Option<u32> {
        self.cards.iter().find_map(|c| {
            let state = c.state.lock();
            (state.id.as_deref() == Some(name)).then_some(state.number)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"
card = 1
id = "wm8994"

[[control]]
name = "Speaker Volume"
type = "int"
count = 2
min = 0
max = 63

[[control]]
name = "AIF1 Mux"
type = "enum"
values = ["ADC", "DMIC"]
value = 1

[[control]]
name = "DSP Coeffs"
type = "byte"
count = 4
data = [1, 2]

[[control]]
name = "DSP Ready"
type = "bool"
created_by = "DSP Coeffs"
"#;

    #[test]
    fn loads_toml_description() {
        let card = MockCard::from_toml_str(CARD).unwrap();
        assert_eq!(card.number(), 1);
        assert_eq!(card.enum_value("AIF1 Mux").as_deref(), Some("DMIC"));
        assert_eq!(card.bytes("DSP Coeffs"), vec![1, 2, 0, 0]);
        assert_eq!(
            card.control_names(),
            vec!["Speaker Volume", "AIF1 Mux", "DSP Coeffs"]
        );
    }

    #[test]
    fn rejects_bad_descriptions() {
        let err = MockCard::from_toml_str("[[control]]\nname = \"x\"\ntype = \"enum\"\n");
        assert!(matches!(err, Err(SpecError::InvalidControl { .. })));
        let err = MockCard::from_toml_str("[[control]]\nname = \"x\"\ntype = \"float\"\n");
        assert!(matches!(err, Err(SpecError::TomlParse(_))));
    }

    #[test]
    fn lookup_by_card_name() {
        let card = MockCard::from_toml_str(CARD).unwrap();
        let opener = card.opener();
        assert_eq!(opener.card_by_name("wm8994"), Some(1));
        assert_eq!(opener.card_by_name("HDMI"), None);
        assert!(opener.open(0).is_err());
    }

    #[test]
    fn created_control_needs_rescan() {
        let card = MockCard::from_toml_str(CARD).unwrap();
        let mut mixer = card.opener().open(1).unwrap();
        assert!(mixer.ctl_by_name("DSP Ready").is_none());

        let coeffs = mixer.ctl_by_name("DSP Coeffs").unwrap();
        mixer.set_array(coeffs, &[5, 6, 7, 8]).unwrap();
        assert!(mixer.ctl_by_name("DSP Ready").is_none());

        mixer.add_new_ctls().unwrap();
        assert!(mixer.ctl_by_name("DSP Ready").is_some());
    }

    #[test]
    fn writes_are_range_checked_and_logged() {
        let card = MockCard::from_toml_str(CARD).unwrap();
        let mut mixer = card.opener().open(1).unwrap();
        let vol = mixer.ctl_by_name("Speaker Volume").unwrap();

        assert!(mixer.set_value(vol, 0, 64).is_err());
        assert!(mixer.set_value(vol, 2, 1).is_err());
        mixer.set_value(vol, 1, 63).unwrap();

        assert_eq!(card.values("Speaker Volume"), vec![0, 63]);
        assert_eq!(card.take_writes(), vec![WriteRecord::value("Speaker Volume", 1, 63)]);
        assert!(card.writes().is_empty());
    }

    #[test]
    fn write_record_display() {
        assert_eq!(
            WriteRecord::value("Speaker Volume", 1, 40).to_string(),
            "'Speaker Volume'[1] = 40"
        );
        assert_eq!(WriteRecord::enumerated("Mux", "ADC").to_string(), "'Mux' = 'ADC'");
        assert_eq!(WriteRecord::array("C", &[1, 0xab]).to_string(), "'C' = [01 ab]");
    }
}
