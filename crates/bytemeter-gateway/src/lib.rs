//! bytemeter gateway library entry.
//!
//! The [`meter`] module is the reusable part: a tower layer that attributes
//! every response byte to a per-request key and reports one
//! [`TrafficRecord`](bytemeter_core::TrafficRecord) per request. The remaining
//! modules wire it into a small axum service with a record consumer; they are
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod meter;
pub mod obs;
pub mod ops;
pub mod router;
pub mod services;
