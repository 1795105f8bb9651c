//! Shared test helpers for execution integration tests

use cmdrun::{ExecConfig, FatalPolicy, LauncherKind, Runner};
use std::fs;
use std::path::{Path, PathBuf};

/// Runner for `kind` that returns fatal errors instead of aborting.
pub fn runner(kind: LauncherKind) -> Runner {
    let config = ExecConfig {
        launcher: kind,
        on_fatal: FatalPolicy::Return,
        ..ExecConfig::default()
    };
    Runner::new(&config).expect("Failed to build runner")
}

/// Fallback runner keeping its capture files in `temp_dir`.
pub fn fallback_runner(temp_dir: &Path) -> Runner {
    let config = ExecConfig {
        launcher: LauncherKind::Fallback,
        on_fatal: FatalPolicy::Return,
        temp_dir: Some(temp_dir.to_path_buf()),
        ..ExecConfig::default()
    };
    Runner::new(&config).expect("Failed to build fallback runner")
}

/// Write a shell script and return the command that runs it.
///
/// Scripts are run as `sh PATH` rather than executed directly, so a
/// concurrent fork holding the freshly written file open cannot cause
/// `ETXTBSY`.
pub fn script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, body).expect("Failed to write script");
    format!("sh {}", path.display())
}

/// Write `len` bytes of a deterministic non-repeating-per-chunk pattern.
pub fn data_file(dir: &Path, name: &str, len: usize) -> (PathBuf, Vec<u8>) {
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    let path = dir.join(name);
    fs::write(&path, &data).expect("Failed to write data file");
    (path, data)
}

/// Number of file descriptors currently open in this process.
pub fn open_fd_count() -> Option<usize> {
    ["/proc/self/fd", "/dev/fd"]
        .iter()
        .find_map(|dir| fs::read_dir(dir).ok())
        .map(|entries| entries.count())
}

/// Number of entries in a directory.
pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir)
        .expect("Failed to read directory")
        .count()
}
