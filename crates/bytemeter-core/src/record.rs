//! The unit of output: one measured request.

use serde::Serialize;

/// Total response bytes written for one request, attributed to its key.
///
/// Exactly one record is produced for every request whose key was derived
/// successfully, including requests that wrote nothing (`bytes_written == 0`)
/// and requests whose handling ended abnormally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficRecord<K> {
    pub key: K,
    pub bytes_written: u64,
}

impl<K> TrafficRecord<K> {
    pub fn new(key: K, bytes_written: u64) -> Self {
        Self { key, bytes_written }
    }

    /// Split into `(key, bytes_written)`.
    pub fn into_parts(self) -> (K, u64) {
        (self.key, self.bytes_written)
    }
}
