//! Each element has a set of valid attributes, a subset of those that are
//! required, and a set of elements allowed as children. Sets are bitmasks so
//! the loader can narrow a parent's child set as parsing progresses (after
//! `</mixer>`, after `<init>`).
//!
//! Two elements share the tag `ctl` and two share `case`; which one a tag
//! means is decided by the parent's child set, first match in table order.

use audioroute_core::{Error, Result};

/// Maximum element nesting.
pub const MAX_PARSE_DEPTH: usize = 6;

/// Grammar elements, most frequent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    /// `<ctl>` inside a path, case, `<init>` or `<pre_init>`.
    Ctl,
    /// `<path>` inside a device.
    Path,
    /// `<device>`.
    Device,
    /// `<stream>`.
    Stream,
    /// `<enable>` inside a stream.
    Enable,
    /// `<disable>` inside a stream.
    Disable,
    /// `<case>` inside a use-case.
    Case,
    /// `<usecase>` inside a stream.
    UseCase,
    /// `<set>` constant inside a stream.
    Set,
    /// `<ctl>` volume control inside a stream.
    StreamCtl,
    /// `<init>` inside the mixer.
    Init,
    /// `<pre_init>` inside the mixer.
    PreInit,
    /// `<mixer>`.
    Mixer,
    /// Root `<audiohal>`.
    AudioHal,
    /// `<codec_probe>`.
    CodecProbe,
    /// `<case>` inside a codec probe.
    CodecCase,
}

impl Element {
    /// Table order.
    pub const ALL: [Element; 16] = [
        Element::Ctl,
        Element::Path,
        Element::Device,
        Element::Stream,
        Element::Enable,
        Element::Disable,
        Element::Case,
        Element::UseCase,
        Element::Set,
        Element::StreamCtl,
        Element::Init,
        Element::PreInit,
        Element::Mixer,
        Element::AudioHal,
        Element::CodecProbe,
        Element::CodecCase,
    ];

    /// Bit of this element in a child set.
    pub const fn bit(self) -> u32 {
        1 << self as u32
    }

    /// Grammar entry.
    pub const fn spec(self) -> &'static ElementSpec {
        &ELEMENT_TABLE[self as usize]
    }

    /// Tag name.
    pub const fn tag(self) -> &'static str {
        self.spec().tag
    }
}

/// Attributes known to the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    /// `name`
    Name,
    /// `val`
    Val,
    /// `path`
    Path,
    /// `function`
    Function,
    /// `type`
    Type,
    /// `index`
    Index,
    /// `dir`
    Dir,
    /// `card`
    Card,
    /// `device`
    Device,
    /// `instances`
    Instances,
    /// `rate`
    Rate,
    /// `period_size`
    PeriodSize,
    /// `period_count`
    PeriodCount,
    /// `min`
    Min,
    /// `max`
    Max,
    /// `file`
    File,
}

const ATTR_COUNT: usize = 16;

const ATTR_NAMES: [&str; ATTR_COUNT] = [
    "name",
    "val",
    "path",
    "function",
    "type",
    "index",
    "dir",
    "card",
    "device",
    "instances",
    "rate",
    "period_size",
    "period_count",
    "min",
    "max",
    "file",
];

impl Attr {
    const fn bit(self) -> u32 {
        1 << self as u32
    }

    /// Attribute name.
    pub const fn name(self) -> &'static str {
        ATTR_NAMES[self as usize]
    }
}

const fn attrs(list: &[Attr]) -> u32 {
    let mut bits = 0;
    let mut i = 0;
    while i < list.len() {
        bits |= list[i].bit();
        i += 1;
    }
    bits
}

const fn elems(list: &[Element]) -> u32 {
    let mut bits = 0;
    let mut i = 0;
    while i < list.len() {
        bits |= list[i].bit();
        i += 1;
    }
    bits
}

/// Grammar entry for one element.
#[derive(Debug)]
pub struct ElementSpec {
    /// Tag name.
    pub tag: &'static str,
    /// Attributes that may appear.
    pub valid_attrs: u32,
    /// Attributes that must appear.
    pub required_attrs: u32,
    /// Elements allowed as children.
    pub children: u32,
}

use Attr as A;
use Element as E;

static ELEMENT_TABLE: [ElementSpec; 16] = [
    ElementSpec {
        tag: "ctl",
        valid_attrs: attrs(&[A::Name, A::Val, A::Index, A::File]),
        required_attrs: attrs(&[A::Name]),
        children: 0,
    },
    ElementSpec {
        tag: "path",
        valid_attrs: attrs(&[A::Name]),
        required_attrs: attrs(&[A::Name]),
        children: elems(&[E::Ctl]),
    },
    ElementSpec {
        tag: "device",
        valid_attrs: attrs(&[A::Name]),
        required_attrs: attrs(&[A::Name]),
        children: elems(&[E::Path]),
    },
    ElementSpec {
        tag: "stream",
        valid_attrs: attrs(&[
            A::Name,
            A::Type,
            A::Dir,
            A::Card,
            A::Device,
            A::Instances,
            A::Rate,
            A::PeriodSize,
            A::PeriodCount,
        ]),
        required_attrs: attrs(&[A::Type]),
        children: elems(&[E::StreamCtl, E::Enable, E::Disable, E::UseCase, E::Set]),
    },
    ElementSpec {
        tag: "enable",
        valid_attrs: attrs(&[A::Path]),
        required_attrs: attrs(&[A::Path]),
        children: 0,
    },
    ElementSpec {
        tag: "disable",
        valid_attrs: attrs(&[A::Path]),
        required_attrs: attrs(&[A::Path]),
        children: 0,
    },
    ElementSpec {
        tag: "case",
        valid_attrs: attrs(&[A::Name]),
        required_attrs: attrs(&[A::Name]),
        children: elems(&[E::Ctl]),
    },
    ElementSpec {
        tag: "usecase",
        valid_attrs: attrs(&[A::Name]),
        required_attrs: attrs(&[A::Name]),
        children: elems(&[E::Case]),
    },
    ElementSpec {
        tag: "set",
        valid_attrs: attrs(&[A::Name, A::Val]),
        required_attrs: attrs(&[A::Name, A::Val]),
        children: 0,
    },
    ElementSpec {
        tag: "ctl",
        valid_attrs: attrs(&[A::Name, A::Function, A::Index, A::Min, A::Max]),
        required_attrs: attrs(&[A::Name, A::Function]),
        children: 0,
    },
    ElementSpec {
        tag: "init",
        valid_attrs: 0,
        required_attrs: 0,
        children: elems(&[E::Ctl]),
    },
    ElementSpec {
        tag: "pre_init",
        valid_attrs: 0,
        required_attrs: 0,
        children: elems(&[E::Ctl]),
    },
    ElementSpec {
        tag: "mixer",
        valid_attrs: attrs(&[A::Name, A::Card]),
        required_attrs: 0,
        children: elems(&[E::PreInit, E::Init]),
    },
    ElementSpec {
        tag: "audiohal",
        valid_attrs: 0,
        required_attrs: 0,
        children: elems(&[E::Mixer, E::CodecProbe]),
    },
    ElementSpec {
        tag: "codec_probe",
        valid_attrs: attrs(&[A::File]),
        required_attrs: attrs(&[A::File]),
        children: elems(&[E::CodecCase]),
    },
    ElementSpec {
        tag: "case",
        valid_attrs: attrs(&[A::Name, A::File]),
        required_attrs: attrs(&[A::Name, A::File]),
        children: 0,
    },
];

/// Child set of the document root: only `<audiohal>`.
pub const ROOT_CHILDREN: u32 = Element::AudioHal.bit();

/// Root child set once `</mixer>` has been seen.
pub const AFTER_MIXER_CHILDREN: u32 = elems(&[E::Device, E::Stream]);

/// Elements `<init>` removes from the mixer's child set.
pub const INIT_EXCLUDES: u32 = elems(&[E::PreInit, E::Init]);

/// Resolve a tag against the child set of its parent.
pub fn match_element(tag: &str, allowed: u32) -> Option<Element> {
    Element::ALL
        .into_iter()
        .find(|e| allowed & e.bit() != 0 && e.tag() == tag)
}

/// Attribute values of one element, indexed by [`Attr`].
#[derive(Debug, Default)]
pub struct Attrs<'a> {
    values: [Option<&'a str>; ATTR_COUNT],
}

impl<'a> Attrs<'a> {
    /// Value of an attribute, if present.
    pub fn get(&self, attr: Attr) -> Option<&'a str> {
        self.values[attr as usize]
    }

    /// Value of an attribute the grammar marks as required.
    pub fn required(&self, attr: Attr) -> Result<&'a str> {
        self.get(attr)
            .ok_or_else(|| Error::syntax(format!("Attribute '{}' required", attr.name())))
    }
}

/// Check an element's attributes against the grammar and collect them.
pub fn extract_attrs<'a, I>(element: Element, attributes: I) -> Result<Attrs<'a>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let spec = element.spec();
    let mut missing = spec.required_attrs;
    let mut out = Attrs::default();

    for (name, value) in attributes {
        let Some(index) = ATTR_NAMES
            .iter()
            .enumerate()
            .position(|(i, n)| spec.valid_attrs & (1 << i) != 0 && *n == name)
        else {
            tracing::error!(attribute = name, element = spec.tag, "attribute not allowed");
            return Err(Error::syntax(format!("Attribute '{name}' not allowed here")));
        };
        out.values[index] = Some(value);
        missing &= !(1 << index);
    }

    if missing != 0 {
        let names: Vec<&str> = ATTR_NAMES
            .iter()
            .enumerate()
            .filter(|(i, _)| missing & (1 << i) != 0)
            .map(|(_, n)| *n)
            .collect();
        return Err(Error::syntax(format!(
            "Attribute '{}' required",
            names.join("', '")
        )));
    }

    Ok(out)
}
