//! Runner configuration.
//!
//! Loaded from an optional TOML file; every key has a default.
//!
//! ```toml
//! launcher = "auto"      # auto | native | fallback
//! on_fatal = "abort"     # abort | return
//! chunk_size = 512
//! temp_dir = "/var/tmp"
//! shell = "sh -c"
//! ```

use crate::exec::stream::DEFAULT_CHUNK_SIZE;
use crate::exec::LauncherKind;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What to do when the subsystem hits an error it cannot recover from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatalPolicy {
    /// Print a diagnostic and abort the process
    #[default]
    Abort,
    /// Hand the error back to the caller
    Return,
}

impl fmt::Display for FatalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalPolicy::Abort => write!(f, "abort"),
            FatalPolicy::Return => write!(f, "return"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown launcher '{0}'. Expected 'auto', 'native' or 'fallback'")]
    UnknownLauncher(String),

    #[error("native launcher is not available on this platform")]
    NativeUnavailable,

    #[error("invalid shell '{0}': expected a program followed by its arguments")]
    InvalidShell(String),

    #[error("chunk_size must be greater than zero")]
    InvalidChunkSize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecConfig {
    pub launcher: LauncherKind,
    pub on_fatal: FatalPolicy,
    /// Bounded read size when draining captured streams
    pub chunk_size: usize,
    /// Where the fallback launcher puts its capture files
    pub temp_dir: Option<PathBuf>,
    /// Interpreter for the fallback launcher, e.g. `"sh -c"`
    pub shell: Option<String>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            launcher: LauncherKind::Auto,
            on_fatal: FatalPolicy::Abort,
            chunk_size: DEFAULT_CHUNK_SIZE,
            temp_dir: None,
            shell: None,
        }
    }
}

impl ExecConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(())
    }
}
