//! crates/logging/src/config.rs
//! Verbosity configuration derived from repeated `-v` flags.

use tracing::level_filters::LevelFilter;

/// Tracing target prefix shared by every sockacl crate.
pub const TARGET_PREFIX: &str = "sockacl";

/// Verbosity configuration selected on the command line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct VerbosityConfig {
    /// Number of `-v` flags given.
    pub verbose: u8,
}

impl VerbosityConfig {
    /// Create a new configuration from a verbose level.
    ///
    /// Levels above 3 behave like 3.
    #[must_use]
    pub const fn from_verbose_level(level: u8) -> Self {
        Self { verbose: level }
    }

    /// Maximum level recorded for `sockacl::*` targets.
    ///
    /// | level | filter |
    /// |-------|--------|
    /// | 0     | WARN   |
    /// | 1     | INFO   |
    /// | 2     | DEBUG  |
    /// | 3+    | TRACE  |
    #[must_use]
    pub const fn level_filter(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    ///
    /// Other crates stay at `warn` so dependency noise never drowns the
    /// tool's own events.
    #[must_use]
    pub fn default_directive(&self) -> String {
        let level = match self.verbose {
            0 => return "warn".to_owned(),
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        format!("warn,{TARGET_PREFIX}={level}")
    }
}
