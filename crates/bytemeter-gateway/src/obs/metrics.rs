//! Minimal metrics registry fed by traffic records.
//!
//! Counter and histogram types with dynamic labels backed by `DashMap`.
//! Labels are flattened into sorted key vectors to keep deterministic
//! ordering. Histogram buckets are fixed byte sizes to avoid floating point math.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn render_labels(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        let mut rows: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| (render_labels(r.key()), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (labels, val) in rows {
            if labels.is_empty() {
                let _ = writeln!(out, "{} {}", name, val);
            } else {
                let _ = writeln!(out, "{}{{{}}} {}", name, labels, val);
            }
        }
    }
}

// 64B, 512B, 4KiB, 32KiB, 256KiB, 1MiB, 8MiB, 64MiB
const BUCKETS_BYTES: [u64; 8] = [
    64,
    512,
    4 << 10,
    32 << 10,
    256 << 10,
    1 << 20,
    8 << 20,
    64 << 20,
];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; BUCKETS_BYTES.len()],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<Vec<(String, String)>, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a size and increment cumulative buckets.
    pub fn observe(&self, labels: &[(&str, &str)], bytes: u64) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(bytes, Ordering::Relaxed);

        // Cumulative: every bucket at or above the value
        for (i, &b) in BUCKETS_BYTES.iter().enumerate() {
            if bytes <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Render in Prometheus text exposition format (unit: bytes).
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for r in self.map.iter() {
            let label_str = render_labels(r.key());
            let hist = r.value();
            let prefix = if label_str.is_empty() {
                String::new()
            } else {
                format!("{},", label_str)
            };

            for (i, &le) in BUCKETS_BYTES.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, label_str, sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", name, label_str, count);
        }
    }
}

#[derive(Default)]
pub struct TrafficMetrics {
    pub records: CounterVec,
    pub response_bytes: CounterVec,
    pub response_size: HistogramVec,
}

impl TrafficMetrics {
    /// Account one traffic record.
    pub fn observe(&self, key: &str, bytes_written: u64) {
        let labels = [("key", key)];
        self.records.inc(&labels);
        self.response_bytes.add(&labels, bytes_written);
        // unlabelled: per-key histograms would explode cardinality
        self.response_size.observe(&[], bytes_written);
    }

    /// Render all registered metrics plus any extra lines provided by callers.
    pub fn render(&self, extra: &[(&str, u64)]) -> String {
        let mut out = String::new();
        self.records.render("bytemeter_records_total", &mut out);
        self.response_bytes.render("bytemeter_response_bytes_total", &mut out);
        self.response_size.render("bytemeter_response_size_bytes", &mut out);
        for (k, v) in extra {
            let _ = writeln!(out, "{} {}", k, v);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_render_sorted_and_escaped() {
        let m = TrafficMetrics::default();
        m.observe("bob", 10);
        m.observe("al\"ice", 5);
        m.observe("bob", 2);

        assert_eq!(m.records.get(&[("key", "bob")]), 2);
        assert_eq!(m.response_bytes.get(&[("key", "bob")]), 12);

        let text = m.render(&[("bytemeter_tracked_keys", 2)]);
        let alice = text.find("bytemeter_records_total{key=\"al\\\"ice\"} 1").unwrap_or(usize::MAX);
        let bob = text.find("bytemeter_records_total{key=\"bob\"} 2").unwrap_or(usize::MAX);
        assert!(alice < bob, "{text}");
        assert!(text.contains("bytemeter_response_bytes_total{key=\"bob\"} 12"));
        assert!(text.ends_with("bytemeter_tracked_keys 2\n"));
    }

    #[test]
    fn histogram_is_cumulative() {
        let m = TrafficMetrics::default();
        m.observe("k", 0);
        m.observe("k", 600);
        m.observe("k", 100 << 20);

        let text = m.render(&[]);
        assert!(text.contains("bytemeter_response_size_bytes_bucket{le=\"64\"} 1"));
        assert!(text.contains("bytemeter_response_size_bytes_bucket{le=\"4096\"} 2"));
        assert!(text.contains("bytemeter_response_size_bytes_bucket{le=\"67108864\"} 2"));
        assert!(text.contains("bytemeter_response_size_bytes_bucket{le=\"+Inf\"} 3"));
        assert!(text.contains("bytemeter_response_size_bytes_count{} 3"));
    }
}
