//! The `cmdrun` binary end to end

use super::helpers::*;
use serial_test::serial;
use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn cmdrun(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cmdrun"))
        .args(args)
        .env_remove("CMDRUN_LOG")
        .output()
        .expect("Failed to run cmdrun")
}

#[test]
#[serial]
fn test_prints_captured_output() {
    let output = cmdrun(&["-o", "--", "echo", "hello"]);

    assert!(output.status.success());
    assert_eq!(output.stdout, b"hello\n");
}

#[test]
#[serial]
fn test_uncaptured_output_is_inherited() {
    let output = cmdrun(&["--", "echo", "hi"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(output.stdout, b"hi\n");
}

#[test]
#[serial]
fn test_uncaptured_error_is_inherited() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let command = script(temp_dir.path(), "err.sh", "echo x >&2\n");
    let words: Vec<&str> = command.split(' ').collect();
    let mut args = vec!["--"];
    args.extend(words);

    let output = cmdrun(&args);

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    assert_eq!(output.stderr, b"x\n");
}

#[test]
#[serial]
fn test_unfed_input_is_inherited() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_cmdrun"))
        .args(["--", "cat"])
        .env_remove("CMDRUN_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to run cmdrun");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(b"from the parent")
        .expect("Failed to write stdin");

    let output = child.wait_with_output().expect("Failed to wait for cmdrun");

    assert!(output.status.success());
    assert_eq!(output.stdout, b"from the parent");
}

#[test]
#[serial]
fn test_feeds_input() {
    let output = cmdrun(&["--input", "abc", "-o", "--", "cat"]);

    assert!(output.status.success());
    assert_eq!(output.stdout, b"abc");
}

#[test]
#[serial]
fn test_propagates_exit_code() {
    let output = cmdrun(&["--", "sh", "-c", "exit"]);
    assert_eq!(output.status.code(), Some(0));

    let output = cmdrun(&["--", "false"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
#[serial]
fn test_fallback_with_input_aborts() {
    let output = cmdrun(&["--launcher", "fallback", "--input", "x", "--", "cat"]);

    assert_eq!(output.status.signal(), Some(libc::SIGABRT));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("aborting"), "stderr: {stderr}");
    assert!(stderr.contains("fallback"), "stderr: {stderr}");
}

#[test]
#[serial]
fn test_missing_program_aborts() {
    let output = cmdrun(&["--", "cmdrun-no-such-program-xyz"]);

    assert_eq!(output.status.signal(), Some(libc::SIGABRT));
}

#[test]
#[serial]
fn test_unknown_launcher_rejected() {
    let output = cmdrun(&["--launcher", "bogus", "--", "true"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bogus"));
}
