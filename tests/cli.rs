use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

#[test]
fn cli_summary_mode_prints_demo_drawables() {
    let mut cmd = Command::cargo_bin("schematic-gl").expect("binary exists");
    cmd.arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Demo scene drawables:"))
        .stdout(contains(" - cube outline 2.0x2.0x2.0: 8 corners, 12 edges"))
        .stdout(contains(" - axis lines: 3 segments"))
        .stdout(contains(" - label \"schematic-gl\": 12 glyphs, 72 vertices"));
}

#[test]
fn cli_falls_back_to_summary_without_a_display() {
    let mut cmd = Command::cargo_bin("schematic-gl").expect("binary exists");
    cmd.env("DISPLAY", "").env("WAYLAND_DISPLAY", "");
    cmd.assert()
        .success()
        .stdout(contains("Demo scene drawables:"))
        .stderr(contains("failed to initialize"));
}

#[test]
fn cli_rejects_unknown_arguments() {
    let mut cmd = Command::cargo_bin("schematic-gl").expect("binary exists");
    cmd.arg("--no-such-flag");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --no-such-flag"));
}
