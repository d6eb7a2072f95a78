//! Observability primitives
//!
//! respool libraries only *emit* `tracing` events; installing a subscriber
//! is the application's call. This module offers the subscriber setup used
//! by respool binaries, benches and tests:
//! - **[`logging`]**: `tracing-subscriber` registry with an `EnvFilter` and a
//!   JSON, pretty or compact fmt layer

pub mod logging;

pub use logging::{
    capture_test_tracing, init_test_tracing, init_tracing, LogConfig, LogFormat, ObservabilityError,
};
