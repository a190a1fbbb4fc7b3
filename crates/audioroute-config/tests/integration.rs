//! Integration tests for audioroute-config.
//!
//! These load complete configuration files from a temporary directory
//! against a mock card.

use std::fs;
use std::path::Path;

use audioroute_config::{LoaderOptions, load, load_product};
use audioroute_core::{CtlValue, Error, ErrorKind, StreamType, devices};
use audioroute_mixer::mock::{MockCard, MockControl, WriteRecord};
use tempfile::TempDir;

fn fast_options() -> LoaderOptions {
    LoaderOptions {
        probe_poll_interval_ms: 1,
        probe_timeout_ms: 100,
        ..LoaderOptions::default()
    }
}

fn test_card() -> MockCard {
    let card = MockCard::named(0, "wm8994");
    card.add_control(MockControl::int("Speaker Volume", 2, 0, 63));
    card.add_control(MockControl::boolean("Speaker Switch", 1));
    card.add_control(MockControl::boolean("Headphone Switch", 1));
    card.add_control(MockControl::bytes("DSP Coeffs", 8));
    card
}

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).expect("Failed to write fixture");
}

const CODEC_A: &str = r#"<audiohal>
    <mixer card="0"/>
    <device name="speaker">
        <path name="on"><ctl name="Speaker Switch" val="1"/></path>
    </device>
    <stream type="pcm" dir="out"/>
</audiohal>"#;

fn probing_main(probe_file: &str) -> String {
    format!(
        r#"<audiohal>
    <codec_probe file="{probe_file}">
        <case name="codec-a" file="codec_a.xml"/>
        <case name="codec-self" file="audio.xml"/>
    </codec_probe>
    <mixer card="0"/>
    <device name="headphone">
        <path name="on"><ctl name="Headphone Switch" val="1"/></path>
    </device>
</audiohal>"#
    )
}

#[test]
fn test_codec_probe_redirects() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "codec", "  codec-a\n");
    write(dir.path(), "codec_a.xml", CODEC_A);
    write(dir.path(), "audio.xml", &probing_main("codec"));

    let card = test_card();
    let cfg = load(dir.path().join("audio.xml"), &card.opener(), &fast_options())
        .expect("Failed to load");

    assert_eq!(cfg.model.devices.len(), 1);
    assert_eq!(cfg.model.devices[0].mask, devices::OUT_SPEAKER);
    assert_eq!(cfg.model.supported_output_devices, devices::OUT_SPEAKER);
    assert_eq!(
        cfg.model.anon_streams[0].stream_type(),
        StreamType::OutPcm
    );
}

#[test]
fn test_codec_probe_without_match_continues() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "codec", "unknown-codec\n");
    write(dir.path(), "codec_a.xml", CODEC_A);
    write(dir.path(), "audio.xml", &probing_main("codec"));

    let card = test_card();
    let cfg = load(dir.path().join("audio.xml"), &card.opener(), &fast_options())
        .expect("Failed to load");

    assert_eq!(cfg.model.devices[0].mask, devices::OUT_WIRED_HEADPHONE);
    assert!(cfg.model.anon_streams.is_empty());
}

#[test]
fn test_empty_probe_file_is_ignored() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "codec", "");
    write(dir.path(), "audio.xml", &probing_main("codec"));

    let cfg = load(dir.path().join("audio.xml"), &test_card().opener(), &fast_options())
        .expect("Failed to load");
    assert_eq!(cfg.model.devices.len(), 1);
}

#[test]
fn test_codec_probe_to_same_file_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "codec", "codec-self\n");
    write(dir.path(), "audio.xml", &probing_main("codec"));

    let err = load(dir.path().join("audio.xml"), &test_card().opener(), &fast_options())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(err.to_string().contains("would load it twice"));
}

#[test]
fn test_codec_probe_cycle_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "codec", "codec-a\n");
    write(dir.path(), "board", "back\n");
    write(
        dir.path(),
        "codec_a.xml",
        r#"<audiohal>
            <codec_probe file="board"><case name="back" file="audio.xml"/></codec_probe>
            <mixer card="0"/>
        </audiohal>"#,
    );
    write(dir.path(), "audio.xml", &probing_main("codec"));

    let err = load(dir.path().join("audio.xml"), &test_card().opener(), &fast_options())
        .unwrap_err();
    assert!(matches!(err, Error::ConfigSyntax { line: 2, .. }), "{err}");
    assert!(err.to_string().contains("audio.xml would load it twice"));
}

#[test]
fn test_probe_file_timeout_fails_load() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "audio.xml", &probing_main("never-created"));

    let err = load(dir.path().join("audio.xml"), &test_card().opener(), &fast_options())
        .unwrap_err();
    assert!(matches!(err, Error::ReadFile { .. }));
}

#[test]
fn test_second_codec_probe_in_file_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "codec", "nothing\n");
    write(
        dir.path(),
        "audio.xml",
        r#"<audiohal>
            <codec_probe file="codec"/>
            <codec_probe file="codec"/>
            <mixer card="0"/>
        </audiohal>"#,
    );

    let err = load(dir.path().join("audio.xml"), &test_card().opener(), &fast_options())
        .unwrap_err();
    assert!(matches!(err, Error::ConfigSyntax { line: 3, .. }));
}

#[test]
fn test_redirected_file_may_probe_again() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "codec", "codec-a\n");
    write(dir.path(), "board", "rev2\n");
    write(
        dir.path(),
        "codec_a.xml",
        r#"<audiohal>
            <codec_probe file="board"><case name="rev2" file="rev2/final.xml"/></codec_probe>
            <mixer card="0"/>
        </audiohal>"#,
    );
    fs::create_dir(dir.path().join("rev2")).expect("Failed to create dir");
    write(&dir.path().join("rev2"), "final.xml", CODEC_A);
    write(dir.path(), "audio.xml", &probing_main("codec"));

    let cfg = load(dir.path().join("audio.xml"), &test_card().opener(), &fast_options())
        .expect("Failed to load");
    assert_eq!(cfg.model.devices[0].mask, devices::OUT_SPEAKER);
}

#[test]
fn test_byte_control_from_relative_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("coeffs.bin"), [1u8, 2, 3, 4]).expect("Failed to write");
    write(
        dir.path(),
        "audio.xml",
        r#"<audiohal>
            <mixer card="0">
                <init><ctl name="DSP Coeffs" file="coeffs.bin"/></init>
            </mixer>
        </audiohal>"#,
    );

    let card = test_card();
    load(dir.path().join("audio.xml"), &card.opener(), &fast_options()).expect("Failed to load");
    assert_eq!(card.bytes("DSP Coeffs"), vec![1, 2, 3, 4, 0, 0, 0, 0]);
}

#[test]
fn test_byte_list_overflow_fails_load() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(
        dir.path(),
        "audio.xml",
        r#"<audiohal>
            <mixer card="0"/>
            <device name="speaker">
                <path name="on"><ctl name="DSP Coeffs" index="6" val="1,2,3"/></path>
            </device>
        </audiohal>"#,
    );

    let err = load(dir.path().join("audio.xml"), &test_card().opener(), &fast_options())
        .unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded(_)));
}

#[test]
fn test_unknown_control_binds_lazily() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(
        dir.path(),
        "audio.xml",
        r#"<audiohal>
            <mixer card="0"/>
            <device name="speaker">
                <path name="on"><ctl name="Amp Enable" val="1"/></path>
            </device>
        </audiohal>"#,
    );

    let cfg = load(dir.path().join("audio.xml"), &test_card().opener(), &fast_options())
        .expect("Failed to load");
    let ctl = &cfg.model.devices[0].paths[0].ctls[0];
    assert!(!ctl.binding.is_bound());
    assert_eq!(ctl.value, CtlValue::Pending("1".into()));
}

#[test]
fn test_control_created_by_pre_init() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(
        dir.path(),
        "audio.xml",
        r#"<audiohal>
            <mixer name="wm8994">
                <pre_init><ctl name="Speaker Switch" val="1"/></pre_init>
                <init><ctl name="DSP Gain" val="3"/></init>
            </mixer>
            <device name="speaker">
                <path name="on"><ctl name="DSP Gain" val="5"/></path>
            </device>
        </audiohal>"#,
    );

    let card = test_card();
    card.add_control(MockControl::int("DSP Gain", 1, 0, 7).created_by("Speaker Switch"));

    let cfg = load(dir.path().join("audio.xml"), &card.opener(), &fast_options())
        .expect("Failed to load");

    assert_eq!(card.values("DSP Gain"), vec![3]);
    assert!(cfg.model.devices[0].paths[0].ctls[0].binding.is_bound());
    assert_eq!(
        card.writes(),
        vec![
            WriteRecord::value("Speaker Switch", 0, 1),
            WriteRecord::value("DSP Gain", 0, 3),
        ]
    );
}

#[test]
fn test_unknown_card_name_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "audio.xml", r#"<audiohal><mixer name="hdmi"/></audiohal>"#);

    let err = load(dir.path().join("audio.xml"), &test_card().opener(), &fast_options())
        .unwrap_err();
    assert!(err.to_string().contains("hdmi"));
}

#[test]
fn test_load_product_from_etc_dir() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "audio.tuna.xml", CODEC_A);

    let options = LoaderOptions {
        etc_dir: dir.path().to_path_buf(),
        ..fast_options()
    };
    let cfg = load_product("tuna", &test_card().opener(), &options).expect("Failed to load");
    assert_eq!(cfg.model.devices.len(), 1);

    let err = load_product("maguro", &test_card().opener(), &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_options_file_drives_loader() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("loader.toml");
    fs::write(&path, "probe_poll_interval_ms = 2\nprobe_timeout_ms = 20\n")
        .expect("Failed to write");

    let options = LoaderOptions::load(&path).expect("Failed to load options");
    assert_eq!(options.probe_timeout_ms, 20);
    assert_eq!(options.etc_dir, Path::new("/system/etc"));
}
