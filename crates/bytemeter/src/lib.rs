//! Top-level facade crate for bytemeter.
//!
//! Re-exports the record/error types and the gateway library so users can
//! depend on a single crate. The middleware most users want is
//! [`TrafficLayer`].

pub mod core {
    pub use bytemeter_core::*;
}

pub mod gateway {
    pub use bytemeter_gateway::*;
}

pub use bytemeter_core::TrafficRecord;
pub use bytemeter_gateway::meter::{
    CountingBody, HeaderKey, KeyErrorPolicy, KeyExtractor, PathKey, TrafficLayer, TrafficReceiver,
};
