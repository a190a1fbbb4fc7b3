//! Audio device bitmasks.
//!
//! Values match the Android `audio_devices_t` encoding so masks coming from
//! the audio framework can be passed straight through. Output devices are
//! single bits in the low word; input devices carry [`BIT_IN`] in addition to
//! their own bit.

#![allow(missing_docs)]

/// A set of audio devices, one bit per device plus the direction bit.
pub type DeviceMask = u32;

/// Empty device set.
pub const NONE: DeviceMask = 0x0;
/// Direction bit: set on every input device.
pub const BIT_IN: DeviceMask = 0x8000_0000;
/// Framework "default device" marker.
pub const BIT_DEFAULT: DeviceMask = 0x4000_0000;

pub const OUT_EARPIECE: DeviceMask = 0x1;
pub const OUT_SPEAKER: DeviceMask = 0x2;
pub const OUT_WIRED_HEADSET: DeviceMask = 0x4;
pub const OUT_WIRED_HEADPHONE: DeviceMask = 0x8;
pub const OUT_BLUETOOTH_SCO: DeviceMask = 0x10;
pub const OUT_BLUETOOTH_SCO_HEADSET: DeviceMask = 0x20;
pub const OUT_BLUETOOTH_SCO_CARKIT: DeviceMask = 0x40;
pub const OUT_BLUETOOTH_A2DP: DeviceMask = 0x80;
pub const OUT_BLUETOOTH_A2DP_HEADPHONES: DeviceMask = 0x100;
pub const OUT_BLUETOOTH_A2DP_SPEAKER: DeviceMask = 0x200;
pub const OUT_AUX_DIGITAL: DeviceMask = 0x400;
pub const OUT_HDMI: DeviceMask = OUT_AUX_DIGITAL;
pub const OUT_ANLG_DOCK_HEADSET: DeviceMask = 0x800;
pub const OUT_DGTL_DOCK_HEADSET: DeviceMask = 0x1000;
pub const OUT_USB_ACCESSORY: DeviceMask = 0x2000;
pub const OUT_USB_DEVICE: DeviceMask = 0x4000;
pub const OUT_REMOTE_SUBMIX: DeviceMask = 0x8000;
pub const OUT_TELEPHONY_TX: DeviceMask = 0x10000;
pub const OUT_LINE: DeviceMask = 0x20000;
pub const OUT_HDMI_ARC: DeviceMask = 0x40000;
pub const OUT_SPDIF: DeviceMask = 0x80000;
pub const OUT_FM: DeviceMask = 0x100000;
pub const OUT_AUX_LINE: DeviceMask = 0x200000;
pub const OUT_SPEAKER_SAFE: DeviceMask = 0x400000;
pub const OUT_IP: DeviceMask = 0x800000;
pub const OUT_BUS: DeviceMask = 0x1000000;
pub const OUT_DEFAULT: DeviceMask = BIT_DEFAULT;

/// Every output device.
pub const OUT_ALL: DeviceMask = 0x01FF_FFFF | OUT_DEFAULT;
pub const OUT_ALL_A2DP: DeviceMask =
    OUT_BLUETOOTH_A2DP | OUT_BLUETOOTH_A2DP_HEADPHONES | OUT_BLUETOOTH_A2DP_SPEAKER;
pub const OUT_ALL_SCO: DeviceMask =
    OUT_BLUETOOTH_SCO | OUT_BLUETOOTH_SCO_HEADSET | OUT_BLUETOOTH_SCO_CARKIT;
pub const OUT_ALL_USB: DeviceMask = OUT_USB_ACCESSORY | OUT_USB_DEVICE;

pub const IN_COMMUNICATION: DeviceMask = BIT_IN | 0x1;
pub const IN_AMBIENT: DeviceMask = BIT_IN | 0x2;
pub const IN_BUILTIN_MIC: DeviceMask = BIT_IN | 0x4;
pub const IN_BLUETOOTH_SCO_HEADSET: DeviceMask = BIT_IN | 0x8;
pub const IN_WIRED_HEADSET: DeviceMask = BIT_IN | 0x10;
pub const IN_AUX_DIGITAL: DeviceMask = BIT_IN | 0x20;
pub const IN_HDMI: DeviceMask = IN_AUX_DIGITAL;
pub const IN_VOICE_CALL: DeviceMask = BIT_IN | 0x40;
pub const IN_TELEPHONY_RX: DeviceMask = IN_VOICE_CALL;
pub const IN_BACK_MIC: DeviceMask = BIT_IN | 0x80;
pub const IN_REMOTE_SUBMIX: DeviceMask = BIT_IN | 0x100;
pub const IN_ANLG_DOCK_HEADSET: DeviceMask = BIT_IN | 0x200;
pub const IN_DGTL_DOCK_HEADSET: DeviceMask = BIT_IN | 0x400;
pub const IN_USB_ACCESSORY: DeviceMask = BIT_IN | 0x800;
pub const IN_USB_DEVICE: DeviceMask = BIT_IN | 0x1000;
pub const IN_FM_TUNER: DeviceMask = BIT_IN | 0x2000;
pub const IN_TV_TUNER: DeviceMask = BIT_IN | 0x4000;
pub const IN_LINE: DeviceMask = BIT_IN | 0x8000;
pub const IN_SPDIF: DeviceMask = BIT_IN | 0x10000;
pub const IN_BLUETOOTH_A2DP: DeviceMask = BIT_IN | 0x20000;
pub const IN_LOOPBACK: DeviceMask = BIT_IN | 0x40000;
pub const IN_IP: DeviceMask = BIT_IN | 0x80000;
pub const IN_BUS: DeviceMask = BIT_IN | 0x100000;
pub const IN_DEFAULT: DeviceMask = BIT_IN | BIT_DEFAULT;

/// Every input device, including the direction bit.
pub const IN_ALL: DeviceMask = BIT_IN | 0x001F_FFFF | IN_DEFAULT;
pub const IN_ALL_SCO: DeviceMask = IN_BLUETOOTH_SCO_HEADSET;
pub const IN_ALL_USB: DeviceMask = IN_USB_ACCESSORY | IN_USB_DEVICE;

/// Device names accepted by `<device name=...>`, in lookup order.
///
/// `global` is the pseudo-device for routing-independent settings.
pub const DEVICE_TABLE: &[(&str, DeviceMask)] = &[
    ("global", NONE),
    ("speaker", OUT_SPEAKER),
    ("earpiece", OUT_EARPIECE),
    ("headset", OUT_WIRED_HEADSET),
    ("headset_in", IN_WIRED_HEADSET),
    ("headphone", OUT_WIRED_HEADPHONE),
    ("sco", OUT_ALL_SCO),
    ("sco_in", IN_ALL_SCO),
    ("a2dp", OUT_ALL_A2DP),
    ("usb", OUT_ALL_USB),
    ("mic", IN_BUILTIN_MIC),
    ("back mic", IN_BACK_MIC),
    ("voice", IN_VOICE_CALL),
    ("aux", IN_AUX_DIGITAL),
];

/// Look up a config-file device name.
pub fn device_by_name(name: &str) -> Option<DeviceMask> {
    DEVICE_TABLE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, mask)| mask)
}

/// Name of a single device for log output, or `"unknown"`.
pub fn device_name(mask: DeviceMask) -> &'static str {
    DEVICE_TABLE
        .iter()
        .find(|&&(_, m)| m == mask)
        .map_or("unknown", |&(n, _)| n)
}

/// Whether the mask describes input devices.
pub const fn is_input(mask: DeviceMask) -> bool {
    mask & BIT_IN != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_round_trips_names() {
        for &(name, mask) in DEVICE_TABLE {
            assert_eq!(device_by_name(name), Some(mask));
            assert_eq!(device_name(mask), name);
        }
    }

    #[test]
    fn unknown_names() {
        assert_eq!(device_by_name("loudspeaker"), None);
        assert_eq!(device_name(0x1234_0000), "unknown");
    }

    #[test]
    fn all_masks_cover_members() {
        assert_eq!(OUT_ALL & OUT_BUS, OUT_BUS);
        assert_eq!(OUT_ALL & BIT_IN, 0);
        assert_eq!(IN_ALL & IN_BUS, IN_BUS);
        assert_eq!(IN_ALL & IN_BUILTIN_MIC, IN_BUILTIN_MIC);
        assert!(is_input(IN_ALL));
        assert!(!is_input(OUT_ALL));
    }
}
