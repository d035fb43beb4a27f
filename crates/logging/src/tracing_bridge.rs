//! crates/logging/src/tracing_bridge.rs
//! Installs the global tracing subscriber.
//!
//! Events are written to stderr by a `fmt` layer. The filter comes from
//! `RUST_LOG` when set, otherwise from [`VerbosityConfig::default_directive`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use logging::{VerbosityConfig, init_tracing};
//!
//! init_tracing(VerbosityConfig::from_verbose_level(2));
//! tracing::debug!(target: "sockacl::acl", "granting access");
//! ```

use super::config::VerbosityConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Builds the filter for `config`, preferring `RUST_LOG` when it parses.
pub fn build_filter(config: &VerbosityConfig) -> Result<EnvFilter, ParseError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(config.default_directive()),
    }
}

/// Initialize tracing with the given verbosity configuration.
///
/// Returns `false` when a global subscriber was already installed, which
/// happens when several tests in one process drive the CLI.
pub fn init_tracing(config: VerbosityConfig) -> bool {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = build_filter(&config)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(config.level_filter().into()));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.verbose >= 2);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .is_ok()
}
