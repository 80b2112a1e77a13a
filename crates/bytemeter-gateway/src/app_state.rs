//! Shared application state for the bytemeter gateway.
//!
//! Holds the validated config and the record consumer's outputs (tally and
//! metrics), which the ops endpoints read.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::obs::{TrafficMetrics, TrafficTally};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    tally: Arc<TrafficTally>,
    metrics: Arc<TrafficMetrics>,
}

struct AppStateInner {
    cfg: GatewayConfig,
}

impl AppState {
    /// Build application state from an already validated config.
    pub fn new(cfg: GatewayConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner { cfg }),
            tally: Arc::new(TrafficTally::new()),
            metrics: Arc::new(TrafficMetrics::default()),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn tally(&self) -> Arc<TrafficTally> {
        Arc::clone(&self.tally)
    }

    pub fn metrics(&self) -> Arc<TrafficMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Gauges computed at scrape time.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![("bytemeter_tracked_keys", self.tally.len() as u64)]
    }
}
