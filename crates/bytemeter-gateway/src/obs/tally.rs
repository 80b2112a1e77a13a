//! In-process consumer of traffic records: running totals per key.

use std::fmt::Display;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use bytemeter_core::TrafficRecord;

use crate::meter::TrafficReceiver;
use crate::obs::metrics::TrafficMetrics;

/// Totals for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeyTotals {
    pub requests: u64,
    pub bytes: u64,
}

/// One row of [`TrafficTally::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyEntry {
    pub key: String,
    #[serde(flatten)]
    pub totals: KeyTotals,
}

#[derive(Debug, Default)]
pub struct TrafficTally {
    map: DashMap<String, KeyTotals>,
}

impl TrafficTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<K: Display>(&self, rec: &TrafficRecord<K>) {
        self.add(rec.key.to_string(), rec.bytes_written);
    }

    /// Count one request of `bytes` against an already rendered key.
    pub fn add(&self, key: String, bytes: u64) {
        let mut totals = self.map.entry(key).or_default();
        totals.requests += 1;
        totals.bytes = totals.bytes.saturating_add(bytes);
    }

    pub fn get(&self, key: &str) -> Option<KeyTotals> {
        self.map.get(key).map(|t| *t)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// All keys, sorted.
    pub fn snapshot(&self) -> Vec<TallyEntry> {
        let mut rows: Vec<TallyEntry> = self
            .map
            .iter()
            .map(|r| TallyEntry {
                key: r.key().clone(),
                totals: *r.value(),
            })
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }

    /// Drain `records` into the tally and metrics until every sender is gone.
    pub async fn drain<K: Display>(
        self: Arc<Self>,
        mut records: TrafficReceiver<K>,
        metrics: Arc<TrafficMetrics>,
    ) {
        while let Some(rec) = records.recv().await {
            let key = rec.key.to_string();
            tracing::debug!(key = %key, bytes_written = rec.bytes_written, "traffic record consumed");
            metrics.observe(&key, rec.bytes_written);
            self.add(key, rec.bytes_written);
        }
        tracing::info!(keys = self.len(), "traffic record channel closed");
    }
}
