//! Logging setup.
//!
//! Lines are stamped the way the classic tracer did it: local wall-clock time
//! as `%Y.%m.%d.%H.%M.%S`, then `+` and the whole seconds since startup.

use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::time::Instant;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `cmdrun=debug`.
pub const LOG_ENV: &str = "CMDRUN_LOG";

/// Timestamp layout shared by every log line.
pub const STAMP_FORMAT: &str = "%Y.%m.%d.%H.%M.%S";

#[derive(Debug, Clone, Copy)]
pub struct TraceTime {
    start: Instant,
}

impl TraceTime {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for TraceTime {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatTime for TraceTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let now = Local::now().naive_local();
        write!(w, "{}", stamp(now, self.start.elapsed().as_secs()))
    }
}

pub fn stamp(now: NaiveDateTime, elapsed_secs: u64) -> String {
    format!("{}+{elapsed_secs}", now.format(STAMP_FORMAT))
}

/// Map `-v` occurrences to a default filter level.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber, writing to stderr.
///
/// `CMDRUN_LOG` wins over `verbosity` when set. Calling this twice is harmless.
pub fn init(verbosity: u8) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(TraceTime::new())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
