#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Logging setup shared by the Aula binaries.
//!
//! Layout: init.rs (subscriber installation and format selection), error.rs
//! (telemetry error type).

pub mod error;
pub mod init;

pub use error::{Result, TelemetryError};
pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, command_span, init_logging,
};
