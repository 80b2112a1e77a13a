//! bytemeter core: transport-agnostic accounting records and the shared error type.
//!
//! This crate defines the data that leaves the metering layer (one
//! [`TrafficRecord`] per measured request) and the error surface shared by the
//! gateway and its consumers. It carries no HTTP or runtime dependencies so
//! record consumers (billing, logging, exporters) can depend on it alone.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod record;

/// Shared result type.
pub use error::{BytemeterError, ErrorCode, Result};
pub use record::TrafficRecord;
