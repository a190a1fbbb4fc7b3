//! Mixer abstraction.
//!
//! The traits here are the seam between the routing engine and a sound card
//! driver. Both are object-safe: the engine holds a `Box<dyn Mixer>` and
//! reopens it through a `&dyn MixerOpener` when `<pre_init>` has changed the
//! card's control set.
//!
//! Control ids are positions in the card's control list. They stay valid
//! across [`Mixer::add_new_ctls`] and across a reopen of the same card, which
//! is what lets bindings be cached by id.

use std::path::Path;

use audioroute_core::{CtlId, CtlType, Result};

use crate::card::{PROC_ASOUND, find_card_by_name};

/// Static description of a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtlInfo {
    /// Stable id.
    pub id: CtlId,
    /// Name as reported by the driver.
    pub name: String,
    /// Value type.
    pub ctl_type: CtlType,
    /// Number of elements.
    pub num_values: u32,
}

/// An open mixer on one sound card.
pub trait Mixer: Send {
    /// Card number this mixer was opened on.
    fn card(&self) -> u32;

    /// Find a control in the currently known control list.
    fn ctl_by_name(&self, name: &str) -> Option<CtlId>;

    /// Pick up controls the driver added since the mixer was opened.
    fn add_new_ctls(&mut self) -> Result<()>;

    /// Describe a control.
    fn ctl_info(&self, id: CtlId) -> Option<CtlInfo>;

    /// Minimum and maximum of an integer control.
    fn range(&self, id: CtlId) -> Result<(i32, i32)>;

    /// Read one element of a scalar control.
    fn get_value(&self, id: CtlId, index: u32) -> Result<i32>;

    /// Write one element of a scalar control.
    fn set_value(&mut self, id: CtlId, index: u32, value: i32) -> Result<()>;

    /// Select an enum item by its string.
    fn set_enum_by_string(&mut self, id: CtlId, value: &str) -> Result<()>;

    /// Read a byte control. `buf` must hold the whole control.
    fn get_array(&self, id: CtlId, buf: &mut [u8]) -> Result<()>;

    /// Write a byte control starting at element 0.
    fn set_array(&mut self, id: CtlId, data: &[u8]) -> Result<()>;
}

/// Opens mixers by card number.
pub trait MixerOpener: Send + Sync {
    /// Open the mixer of `card`.
    fn open(&self, card: u32) -> Result<Box<dyn Mixer>>;

    /// Resolve a card id string (as in `/proc/asound/cardN/id`) to its number.
    fn card_by_name(&self, name: &str) -> Option<u32> {
        find_card_by_name(Path::new(PROC_ASOUND), name)
    }
}
