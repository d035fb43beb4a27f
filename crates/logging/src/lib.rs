#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` maps the `-v` count given to `sockacl` onto a `tracing` filter
//! and installs the process-wide subscriber.
//!
//! # Design
//!
//! [`VerbosityConfig`] holds the verbose level. [`init_tracing`] combines an
//! [`EnvFilter`](tracing_subscriber::EnvFilter) with a stderr `fmt` layer.
//! Library crates only emit events under `sockacl::*` targets and never
//! install a subscriber themselves.
//!
//! # Examples
//!
//! ```
//! use logging::VerbosityConfig;
//!
//! let config = VerbosityConfig::from_verbose_level(1);
//! assert_eq!(config.default_directive(), "warn,sockacl=info");
//! ```

mod config;
mod tracing_bridge;

pub use config::{TARGET_PREFIX, VerbosityConfig};
pub use tracing_bridge::{build_filter, init_tracing};
