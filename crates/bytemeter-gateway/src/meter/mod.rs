//! Response byte metering.
//!
//! - [`writer`]: `CountingBody`, the body decorator reporting every write
//! - [`accumulator`]: `Meter`, the per-request accumulation task
//! - [`key`]: pluggable key derivation
//! - [`layer`]: `TrafficLayer` / `TrafficService`, the tower middleware tying them together

pub mod accumulator;
pub mod key;
pub mod layer;
pub mod writer;

pub use accumulator::Meter;
pub use key::{HeaderKey, KeyExtractor, PathKey};
pub use layer::{KeyErrorPolicy, TrafficLayer, TrafficReceiver, TrafficService, DEFAULT_RECORD_BUFFER};
pub use writer::CountingBody;
