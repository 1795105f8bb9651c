//! Fallback launcher: shell interpreter with temporary capture files

use super::helpers::*;
use cmdrun::{ExecError, LauncherKind, RunOptions};
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn test_exit_code_passed_through() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let scripts = TempDir::new().expect("Failed to create temp dir");
    let command = script(scripts.path(), "exit7.sh", "exit 7\n");

    let output = fallback_runner(temp_dir.path())
        .run(&RunOptions::new(), &command)
        .unwrap();

    assert_eq!(output.code, 7);
    assert!(output.stdout.is_none());
    assert!(output.stderr.is_none());
}

#[test]
#[serial]
fn test_output_and_error_are_independent() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let scripts = TempDir::new().expect("Failed to create temp dir");
    let command = script(
        scripts.path(),
        "both.sh",
        "printf 'to-out'\nprintf 'to-err' >&2\nexit 3\n",
    );

    let output = fallback_runner(temp_dir.path())
        .run(&RunOptions::new().capture_output().capture_error(), &command)
        .unwrap();

    assert_eq!(output.code, 3);
    assert_eq!(output.stdout.as_deref(), Some(&b"to-out"[..]));
    assert_eq!(output.stderr.as_deref(), Some(&b"to-err"[..]));
}

#[test]
#[serial]
fn test_output_captured_byte_exact() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let data_dir = TempDir::new().expect("Failed to create temp dir");
    let runner = fallback_runner(temp_dir.path());

    for len in [0, 512, 513, 100_000] {
        let (path, data) = data_file(data_dir.path(), &format!("data-{len}"), len);
        let output = runner
            .run(
                &RunOptions::new().capture_output(),
                &format!("cat {}", path.display()),
            )
            .unwrap();

        assert_eq!(output.stdout.as_deref(), Some(&data[..]), "len {len}");
    }
}

#[test]
#[serial]
fn test_input_is_fatal() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let err = fallback_runner(temp_dir.path())
        .run(&RunOptions::new().with_input("x").capture_output(), "cat")
        .unwrap_err();

    assert!(matches!(err, ExecError::InputUnsupported { .. }));
    assert!(err.is_fatal());
    assert_eq!(entry_count(temp_dir.path()), 0);
}

#[test]
#[serial]
fn test_no_temporary_files_left_behind() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let runner = fallback_runner(temp_dir.path());
    let options = RunOptions::new().capture_output().capture_error();

    let first = runner.run(&options, "echo again").unwrap();
    let second = runner.run(&options, "echo again").unwrap();

    assert_eq!(first, second);
    assert_eq!(first.stdout.as_deref(), Some(&b"again\n"[..]));
    assert_eq!(entry_count(temp_dir.path()), 0);
}

#[test]
#[serial]
fn test_shell_interprets_the_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let output = fallback_runner(temp_dir.path())
        .run(&RunOptions::new().capture_output(), "printf [%s] 'a b'")
        .unwrap();

    assert_eq!(output.stdout.as_deref(), Some(&b"[a b]"[..]));
}

#[test]
#[serial]
fn test_auto_never_picks_fallback_here() {
    assert_eq!(
        runner(LauncherKind::Auto).launcher_kind(),
        LauncherKind::Native
    );
}
