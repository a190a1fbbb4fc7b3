//! Control binding and application.
//!
//! A [`Ctl`] is declared with the text of its value and bound to a live
//! control the first time it is needed. Binding converts the text to the
//! control's type and caches the control id; applying a sequence then only
//! writes. After a mixer reopen the caches are cleared and the next bind
//! checks that the converted value still fits the control.

use std::fs;

use audioroute_core::{
    Binding, ByteBlock, Ctl, CtlId, CtlIndex, CtlType, CtlValue, Error, Result, VolumeControl,
    parse_i32, parse_u32,
};

use crate::backend::{CtlInfo, Mixer};

/// Largest byte control the binder will handle.
pub const BYTE_ARRAY_MAX_LEN: u32 = 512;

/// Find a control by name, rescanning the mixer's list once if it is missing.
pub fn lookup(mixer: &mut dyn Mixer, name: &str) -> Result<CtlId> {
    if let Some(id) = mixer.ctl_by_name(name) {
        return Ok(id);
    }

    mixer.add_new_ctls()?;
    mixer.ctl_by_name(name).ok_or_else(|| {
        tracing::warn!(control = name, "control not found");
        Error::ControlNotFound(name.to_owned())
    })
}

/// Resolve `ctl` to a live control and convert its value.
///
/// A no-op when already bound. Returns [`Error::ControlNotFound`] when the
/// control does not exist even after a rescan.
pub fn bind(mixer: &mut dyn Mixer, ctl: &mut Ctl) -> Result<()> {
    if ctl.binding.is_bound() {
        return Ok(());
    }

    let id = lookup(mixer, &ctl.name)?;
    let info = mixer
        .ctl_info(id)
        .ok_or_else(|| Error::ControlNotFound(ctl.name.clone()))?;

    match info.ctl_type {
        CtlType::Bool | CtlType::Int => convert_integer(ctl, info.ctl_type)?,
        CtlType::Enum => convert_enum(ctl)?,
        CtlType::Byte => convert_bytes(ctl, &info)?,
        CtlType::Iec958 | CtlType::Int64 | CtlType::Unknown => {
            tracing::error!(control = %ctl.name, ctl_type = ?info.ctl_type, "unsupported control type");
            return Err(Error::InvalidValue(format!(
                "mixer control '{}' has unsupported type",
                ctl.name
            )));
        }
    }

    ctl.binding = Binding::Bound {
        id,
        ctl_type: info.ctl_type,
    };
    Ok(())
}

/// Resolve a stream volume control. It must be an integer control.
pub fn bind_volume(mixer: &mut dyn Mixer, vol: &mut VolumeControl) -> Result<CtlId> {
    if let Some(id) = vol.binding.id() {
        return Ok(id);
    }

    let id = lookup(mixer, &vol.name)?;
    match mixer.ctl_info(id) {
        Some(CtlInfo {
            ctl_type: CtlType::Int,
            ..
        }) => {
            vol.binding = Binding::Bound {
                id,
                ctl_type: CtlType::Int,
            };
            Ok(id)
        }
        _ => Err(Error::InvalidValue(format!(
            "control '{}' is not an integer",
            vol.name
        ))),
    }
}

/// Apply a control sequence in order.
///
/// A control that cannot be bound ends the sequence. A failed write is logged
/// and the remaining controls are still applied.
pub fn apply_ctls(mixer: &mut dyn Mixer, ctls: &mut [Ctl]) {
    tracing::trace!(count = ctls.len(), "applying controls");

    for ctl in ctls.iter_mut() {
        if let Err(e) = bind(mixer, ctl) {
            tracing::warn!(control = %ctl.name, error = %e, "skipping rest of sequence");
            break;
        }
        let Some(id) = ctl.binding.id() else {
            break;
        };

        let index = ctl.index;
        let result = match &mut ctl.value {
            CtlValue::Int(value) => write_integer(mixer, id, index, *value),
            CtlValue::Enum(value) => {
                tracing::trace!(control = %ctl.name, value = %value, "set enum");
                mixer.set_enum_by_string(id, value)
            }
            CtlValue::Bytes(block) => write_bytes(mixer, id, index, block),
            CtlValue::Pending(_) | CtlValue::PendingFile(_) => Ok(()),
        };

        if let Err(e) = result {
            tracing::error!(control = %ctl.name, error = %e, "failed to set control");
        }
    }
}

fn write_integer(mixer: &mut dyn Mixer, id: CtlId, index: CtlIndex, value: i32) -> Result<()> {
    match index {
        CtlIndex::All => {
            let count = mixer.ctl_info(id).map_or(0, |i| i.num_values);
            tracing::trace!(id, value, count, "set all values");
            (0..count).try_for_each(|n| mixer.set_value(id, n, value))
        }
        CtlIndex::At(n) => {
            tracing::trace!(id, value, index = n, "set value");
            mixer.set_value(id, n, value)
        }
    }
}

fn write_bytes(
    mixer: &mut dyn Mixer,
    id: CtlId,
    index: CtlIndex,
    block: &mut ByteBlock,
) -> Result<()> {
    let offset = match index {
        CtlIndex::All => 0,
        CtlIndex::At(n) => n as usize,
    };
    let count = block.work.len();
    tracing::trace!(id, offset, len = block.data.len(), count, "set bytes");

    if offset == 0 && block.data.len() == count {
        return mixer.set_array(id, &block.data);
    }

    mixer.get_array(id, &mut block.work)?;
    let end = offset + block.data.len();
    let Some(target) = block.work.get_mut(offset..end) else {
        return Err(Error::CapacityExceeded(format!(
            "byte data {offset}+{} exceeds control size {count}",
            block.data.len()
        )));
    };
    target.copy_from_slice(&block.data);
    mixer.set_array(id, &block.work)
}

fn convert_integer(ctl: &mut Ctl, ctl_type: CtlType) -> Result<()> {
    let value = match &ctl.value {
        CtlValue::Pending(text) => parse_i32(text)
            .or_else(|_| parse_u32(text).map(|v| v as i32))
            .inspect_err(|_| {
                tracing::error!(control = %ctl.name, value = %text, "not a valid integer");
            })?,
        CtlValue::Int(v) => *v,
        other => return Err(incompatible(&ctl.name, other)),
    };

    if ctl_type == CtlType::Bool && !(0..=1).contains(&value) {
        tracing::warn!(control = %ctl.name, value, "illegal value for bool control");
    }
    tracing::debug!(control = %ctl.name, value, "bound integer control");
    ctl.value = CtlValue::Int(value);
    Ok(())
}

fn convert_enum(ctl: &mut Ctl) -> Result<()> {
    match &mut ctl.value {
        CtlValue::Pending(text) => {
            let text = std::mem::take(text);
            tracing::debug!(control = %ctl.name, value = %text, "bound enum control");
            ctl.value = CtlValue::Enum(text);
            Ok(())
        }
        CtlValue::Enum(_) => Ok(()),
        other => Err(incompatible(&ctl.name, other)),
    }
}

fn convert_bytes(ctl: &mut Ctl, info: &CtlInfo) -> Result<()> {
    let count = info.num_values;
    if count > BYTE_ARRAY_MAX_LEN {
        return Err(Error::CapacityExceeded(format!(
            "byte control '{}' has {count} elements, limit is {BYTE_ARRAY_MAX_LEN}",
            ctl.name
        )));
    }

    let offset = match ctl.index {
        CtlIndex::All => 0,
        CtlIndex::At(n) => n,
    };
    ctl.index = CtlIndex::At(offset);
    if offset >= count {
        return Err(Error::InvalidValue(format!(
            "control index out of range ({offset} >= {count})"
        )));
    }
    let room = (count - offset) as usize;

    let block = match &ctl.value {
        CtlValue::Pending(text) => ByteBlock {
            data: parse_byte_list(text, offset, count)?,
            work: Vec::new(),
            source: None,
        },
        CtlValue::PendingFile(path) => {
            let mut data = fs::read(path).map_err(|e| Error::read_file(path, e))?;
            if data.len() > room {
                tracing::error!(
                    control = %ctl.name,
                    file = %path.display(),
                    size = data.len(),
                    kept = room,
                    "data exceeds control size, truncating"
                );
                data.truncate(room);
            }
            ByteBlock {
                data,
                work: Vec::new(),
                source: Some(path.clone()),
            }
        }
        CtlValue::Bytes(block) if block.data.len() <= room => block.clone(),
        CtlValue::Bytes(block) => {
            return Err(Error::CapacityExceeded(format!(
                "byte data {offset}+{} no longer fits control '{}' ({count})",
                block.data.len(),
                ctl.name
            )));
        }
        other => return Err(incompatible(&ctl.name, other)),
    };

    tracing::debug!(control = %ctl.name, len = block.data.len(), "bound byte control");
    ctl.value = CtlValue::Bytes(ByteBlock {
        work: vec![0; count as usize],
        ..block
    });
    Ok(())
}

/// Comma-separated byte literals. Empty fields are skipped.
fn parse_byte_list(text: &str, offset: u32, count: u32) -> Result<Vec<u8>> {
    let fields: Vec<&str> = text.split(',').filter(|f| !f.is_empty()).collect();
    if fields.is_empty() {
        return Err(Error::InvalidValue("no values for byte array".into()));
    }

    let len = u32::try_from(fields.len()).unwrap_or(u32::MAX);
    if offset.saturating_add(len) > count {
        return Err(Error::CapacityExceeded(format!(
            "array overflows control ({offset}+{len} > {count})"
        )));
    }

    fields
        .into_iter()
        .map(|f| {
            let v = parse_u32(f)?;
            if v > 0xFF {
                tracing::error!(value = v, "byte out of range");
            }
            Ok(v as u8)
        })
        .collect()
}

fn incompatible(name: &str, value: &CtlValue) -> Error {
    Error::InvalidValue(format!(
        "value {value:?} does not fit the type of control '{name}'"
    ))
}
