//! Exit codes of the `fbview` binary.
//!
//! Only paths that never reach real hardware are exercised here.

use std::io::Write;
use std::process::Command;
use test_log::test;

fn fbview() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fbview"))
}

#[test]
fn help_exits_successfully() {
    let output = fbview().arg("--help").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--oneshot"));
    assert!(stdout.contains("--autozoom"));
}

#[test]
fn missing_arguments_are_a_usage_error() {
    let output = fbview().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unknown_option_is_a_usage_error() {
    let output = fbview()
        .args(["--frobnicate", "/dev/fb0", "image.png"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unreadable_config_is_a_usage_error() {
    let output = fbview()
        .args(["-c", "/nonexistent/fbview.json", "/dev/fb0", "image.png"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn malformed_config_is_a_usage_error() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    write!(config, "{{ not json").unwrap();
    let output = fbview()
        .arg("--config")
        .arg(config.path())
        .args(["/dev/fb0", "image.png"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn missing_device_exits_with_device_unavailable() {
    let output = fbview()
        .args(["-1", "/nonexistent/fb-device", "image.png"])
        .env("RUST_LOG", "error")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to initialize framebuffer"));
}

#[test]
fn empty_device_uses_the_configured_one() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    write!(config, r#"{{"device": "/nonexistent/fb-configured"}}"#).unwrap();
    let output = fbview()
        .arg("-c")
        .arg(config.path())
        .args(["", "image.png"])
        .env("RUST_LOG", "error")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("/nonexistent/fb-configured"));
}
