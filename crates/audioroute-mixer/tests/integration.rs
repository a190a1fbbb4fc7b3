//! Integration tests for audioroute-mixer.
//!
//! These drive a TOML-described mock card through the public binding API.

use audioroute_core::{Ctl, CtlIndex, CtlValue};
use audioroute_mixer::mock::{MockCard, WriteRecord};
use audioroute_mixer::{MixerOpener, apply_ctls, bind};
use tempfile::TempDir;

const CARD: &str = r#"
card = 1
id = "wm8994"

[[control]]
name = "DSP Enable"
type = "bool"

[[control]]
name = "DSP Gain"
type = "int"
count = 2
min = -10
max = 10
created_by = "DSP Enable"

[[control]]
name = "AIF1 Mux"
type = "enum"
values = ["ADC", "DMIC"]

[[control]]
name = "Coeffs"
type = "byte"
count = 4
data = [9, 9, 9, 9]
"#;

fn pending(name: &str, index: CtlIndex, val: &str) -> Ctl {
    Ctl::new(name, index, CtlValue::Pending(val.into()))
}

#[test]
fn test_card_from_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("card.toml");
    std::fs::write(&path, CARD).expect("Failed to write card");

    let card = MockCard::load(&path).expect("Failed to load card");
    assert_eq!(card.number(), 1);
    assert_eq!(card.opener().card_by_name("wm8994"), Some(1));
    assert_eq!(card.control_names(), vec!["DSP Enable", "AIF1 Mux", "Coeffs"]);
    assert_eq!(card.bytes("Coeffs"), vec![9, 9, 9, 9]);
}

#[test]
fn test_sequence_with_created_control() {
    let card = MockCard::from_toml_str(CARD).expect("Failed to parse card");
    let mut mixer = card.opener().open(1).expect("Failed to open mixer");

    let mut ctls = vec![
        pending("DSP Enable", CtlIndex::All, "1"),
        pending("DSP Gain", CtlIndex::At(1), "-4"),
        pending("AIF1 Mux", CtlIndex::All, "DMIC"),
        pending("Coeffs", CtlIndex::At(2), "1,2"),
    ];
    apply_ctls(mixer.as_mut(), &mut ctls);

    assert_eq!(
        card.take_writes(),
        vec![
            WriteRecord::value("DSP Enable", 0, 1),
            WriteRecord::value("DSP Gain", 1, -4),
            WriteRecord::enumerated("AIF1 Mux", "DMIC"),
            WriteRecord::array("Coeffs", &[9, 9, 1, 2]),
        ]
    );
    assert_eq!(card.values("DSP Gain"), vec![0, -4]);
    assert!(ctls.iter().all(|c| c.binding.is_bound()));
}

#[test]
fn test_missing_control_stops_sequence() {
    let card = MockCard::from_toml_str(CARD).expect("Failed to parse card");
    let mut mixer = card.opener().open(1).expect("Failed to open mixer");

    let mut ctls = vec![
        pending("AIF1 Mux", CtlIndex::All, "DMIC"),
        pending("DSP Gain", CtlIndex::All, "3"),
        pending("DSP Enable", CtlIndex::All, "1"),
    ];
    apply_ctls(mixer.as_mut(), &mut ctls);

    assert_eq!(
        card.take_writes(),
        vec![WriteRecord::enumerated("AIF1 Mux", "DMIC")]
    );
    assert!(!ctls[1].binding.is_bound());
    assert!(bind(mixer.as_mut(), &mut ctls[1]).is_err());
}

#[test]
fn test_unknown_card_fails_to_open() {
    let card = MockCard::from_toml_str(CARD).expect("Failed to parse card");
    assert!(card.opener().open(0).is_err());
    assert_eq!(card.opener().card_by_name("hdmi"), None);
}
