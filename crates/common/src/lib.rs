//! Foundation utilities shared across respool crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors, size units, collections, serde helpers
//! - `observability`: tracing subscriber setup (not needed by library users
//!   that install their own subscriber)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod collections;
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod units;
#[cfg(feature = "foundation")]
pub mod utils;

// Observability tier
// -----------------------------------------------------------------
#[cfg(feature = "observability")]
pub mod observability;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use collections::{LinkedSlab, SlotId};
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "observability")]
pub use observability::{
    capture_test_tracing, init_test_tracing, init_tracing, LogConfig, LogFormat, ObservabilityError,
};
#[cfg(feature = "foundation")]
pub use units::{ByteSize, ByteSizeParseError, SizeUnit};
#[cfg(feature = "foundation")]
pub use utils::serde::byte_size_human;
