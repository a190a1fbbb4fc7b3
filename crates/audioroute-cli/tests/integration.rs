//! Integration tests for audioroute-cli.
//!
//! These run the `audioroute` binary against config and control-table
//! fixtures written to a temporary directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const CONFIG: &str = r#"<audiohal>
    <mixer card="0">
        <init><ctl name="Master Switch" val="1"/></init>
    </mixer>
    <device name="speaker">
        <path name="on"><ctl name="Speaker Switch" val="1"/></path>
        <path name="off"><ctl name="Speaker Switch" val="0"/></path>
    </device>
    <device name="headphone">
        <path name="on"><ctl name="Headphone Switch" val="1"/></path>
        <path name="off"><ctl name="Headphone Switch" val="0"/></path>
    </device>
    <stream type="pcm" dir="out">
        <ctl name="Playback Volume" function="leftvol"/>
    </stream>
    <stream name="voice" type="hw" dir="out">
        <usecase name="mode">
            <case name="call"><ctl name="Voice Mux" val="Call"/></case>
        </usecase>
    </stream>
</audiohal>"#;

const CONTROLS: &str = r#"card = 0
id = "wm8994"

[[control]]
name = "Master Switch"
type = "bool"

[[control]]
name = "Speaker Switch"
type = "bool"

[[control]]
name = "Headphone Switch"
type = "bool"

[[control]]
name = "Playback Volume"
type = "int"
min = 0
max = 200

[[control]]
name = "Voice Mux"
type = "enum"
values = ["Idle", "Call"]
"#;

/// Fixture directory holding `audio.xml` and `controls.toml`, also used as
/// the config home so no real user defaults leak in.
fn fixture() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("audio.xml"), CONFIG).expect("Failed to write config");
    fs::write(dir.path().join("controls.toml"), CONTROLS).expect("Failed to write controls");
    dir
}

fn audioroute(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_audioroute"))
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to run audioroute")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_check_reports_summary() {
    let dir = fixture();
    let output = audioroute(dir.path(), &["check", "audio.xml", "--controls", "controls.toml"]);
    assert!(output.status.success(), "check failed: {output:?}");

    let out = stdout(&output);
    assert!(out.contains("Devices:      2 (4 paths, 4 controls)"));
    assert!(out.contains("Streams:      1 anonymous, 1 named"));
    assert!(out.contains("Setup writes: 1"));
    assert!(out.trim_end().ends_with("OK"));
}

#[test]
fn test_check_without_controls_fails() {
    let dir = fixture();
    let output = audioroute(dir.path(), &["check", "audio.xml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No control table"));
}

#[test]
fn test_check_uses_cli_defaults() {
    let dir = fixture();
    let config_dir = dir.path().join("audioroute");
    fs::create_dir(&config_dir).expect("Failed to create config dir");
    let controls = dir.path().join("controls.toml");
    fs::write(
        config_dir.join("cli.toml"),
        format!("controls = {:?}\n", controls.display().to_string()),
    )
    .expect("Failed to write cli.toml");

    let output = audioroute(dir.path(), &["check", "audio.xml"]);
    assert!(output.status.success(), "check failed: {output:?}");
}

#[test]
fn test_check_reports_syntax_line() {
    let dir = fixture();
    fs::write(
        dir.path().join("bad.xml"),
        "<audiohal>\n<mixer card=\"0\"/>\n<device name=\"toaster\"/>\n</audiohal>\n",
    )
    .expect("Failed to write config");

    let output = audioroute(dir.path(), &["check", "bad.xml", "--controls", "controls.toml"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 3"), "stderr: {stderr}");
}

#[test]
fn test_dump_prints_model() {
    let dir = fixture();
    let output = audioroute(dir.path(), &["dump", "audio.xml", "--controls", "controls.toml"]);
    assert!(output.status.success(), "dump failed: {output:?}");

    let out = stdout(&output);
    assert!(out.contains("Device speaker (0x2)"));
    assert!(out.contains("'Speaker Switch' = 1"));
    assert!(out.contains("Stream #0 pcm out card 0"));
    assert!(out.contains("leftvol 'Playback Volume'[0] 0..200"));
    assert!(out.contains("Stream 'voice' hw out card 0"));
    assert!(out.contains("case call"));
}

#[test]
fn test_simulate_prints_writes() {
    let dir = fixture();
    fs::write(
        dir.path().join("script.txt"),
        "# playback then a call\n\
         open speaker pcm\n\
         route 0 headphone\n\
         volume 0 50 50\n\
         open voice\n\
         usecase 1 mode call\n\
         close 0\n",
    )
    .expect("Failed to write script");

    let output = audioroute(
        dir.path(),
        &[
            "simulate",
            "audio.xml",
            "--controls",
            "controls.toml",
            "--script",
            "script.txt",
        ],
    );
    assert!(output.status.success(), "simulate failed: {output:?}");

    let out = stdout(&output);
    let expected = [
        "setup",
        "    'Master Switch'[0] = 1",
        "open speaker pcm: slot 0 = pcm out card 0",
        "    'Speaker Switch'[0] = 1",
        "route 0 headphone: routes 0x8",
        "    'Speaker Switch'[0] = 0",
        "    'Headphone Switch'[0] = 1",
        "volume 0 50 50: volume 50/50",
        "    'Playback Volume'[0] = 100",
        "open voice: slot 1 = hw out card 0",
        "    (no writes)",
        "usecase 1 mode call: mode = call",
        "    'Voice Mux' = 'Call'",
        "close 0: slot 0 closed",
        "    'Headphone Switch'[0] = 0",
    ];
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines, expected);
}

#[test]
fn test_simulate_bad_slot_fails() {
    let dir = fixture();
    fs::write(dir.path().join("script.txt"), "route 3 speaker\n").expect("Failed to write script");

    let output = audioroute(
        dir.path(),
        &[
            "simulate",
            "audio.xml",
            "--controls",
            "controls.toml",
            "--script",
            "script.txt",
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 1"), "stderr: {stderr}");
}
