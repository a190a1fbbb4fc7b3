//! Audioroute Mixer - sound card control access
//!
//! The engine never talks to a driver directly. It goes through the [`Mixer`]
//! trait, which exposes the handful of control operations the routing engine
//! needs: look a control up by name, rescan the control list, read its type
//! and element count, and write integers, enum strings or byte arrays.
//! [`MixerOpener`] opens a mixer for a card number and resolves card names.
//!
//! ## Modules
//!
//! - [`backend`] - the [`Mixer`] and [`MixerOpener`] traits
//! - [`binding`] - resolving [`Ctl`](audioroute_core::Ctl) names to live controls
//!   and applying control sequences
//! - [`card`] - sound card lookup by name through `/proc/asound`
//! - [`mock`] - an in-memory card with a write log, loadable from TOML
//!
//! ## Example
//!
//! ```rust
//! use audioroute_core::{Ctl, CtlIndex, CtlValue};
//! use audioroute_mixer::{MixerOpener, apply_ctls, mock::{MockCard, MockControl}};
//!
//! let card = MockCard::new(0);
//! card.add_control(MockControl::int("Speaker Volume", 2, 0, 255));
//!
//! let mut mixer = card.opener().open(0).unwrap();
//! let mut ctls = vec![Ctl::new("Speaker Volume", CtlIndex::All, CtlValue::Pending("200".into()))];
//! apply_ctls(mixer.as_mut(), &mut ctls);
//!
//! assert_eq!(card.values("Speaker Volume"), vec![200, 200]);
//! ```

pub mod backend;
pub mod binding;
pub mod card;
pub mod mock;

pub use audioroute_core::{Error, Result};
pub use backend::{CtlInfo, Mixer, MixerOpener};
pub use binding::{BYTE_ARRAY_MAX_LEN, apply_ctls, bind, bind_volume, lookup};
pub use card::find_card_by_name;
