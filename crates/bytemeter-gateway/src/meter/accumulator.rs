//! Per-request accumulation task.
//!
//! A [`Meter`] is created once a request's key is known. It spawns a task that
//! sums the byte counts reported by the request's writes and, on the
//! end-of-writes sentinel, emits a single [`TrafficRecord`].
//!
//! The sentinel is sent from `Drop`, so it fires however the request ends:
//! body completed, body dropped by the transport, inner service error, panic
//! unwind, or the response future being cancelled.

use std::fmt::Debug;

use tokio::sync::mpsc;
use tracing::debug;

use bytemeter_core::TrafficRecord;

/// Messages on the per-request signalling channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Written(u64),
    /// End of writes. Always the last signal of a request.
    Finished,
}

/// Write-side handle of one request's accumulation task.
///
/// The signalling channel is unbounded so reporting a write never blocks
/// the body being polled.
#[derive(Debug)]
pub struct Meter {
    tx: mpsc::UnboundedSender<Signal>,
}

impl Meter {
    /// Spawn the accumulation task for `key`. Must be called within a tokio runtime.
    pub fn start<K>(key: K, records: mpsc::Sender<TrafficRecord<K>>) -> Self
    where
        K: Debug + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(accumulate(key, rx, records));
        Self { tx }
    }

    /// Report one write of `n` bytes.
    pub fn record(&self, n: usize) {
        // The task only exits after `Finished`, which only `Drop` sends.
        let _ = self.tx.send(Signal::Written(n as u64));
    }
}

impl Drop for Meter {
    fn drop(&mut self) {
        let _ = self.tx.send(Signal::Finished);
    }
}

async fn accumulate<K>(
    key: K,
    mut rx: mpsc::UnboundedReceiver<Signal>,
    records: mpsc::Sender<TrafficRecord<K>>,
) where
    K: Debug + Send + 'static,
{
    let mut total: u64 = 0;

    // Accumulating
    while let Some(signal) = rx.recv().await {
        match signal {
            Signal::Written(n) => total = total.saturating_add(n),
            Signal::Finished => break,
        }
    }

    // Finalizing: may wait here when the consumer is slow (backpressure).
    match records.reserve().await {
        Ok(permit) => {
            // Capacity is held, so the send below cannot fail.
            debug!(key = ?key, bytes_written = total, "traffic record emitted");
            permit.send(TrafficRecord::new(key, total));
        }
        Err(_) => {
            debug!(key = ?key, bytes_written = total, "traffic receiver gone; record dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use super::*;

    async fn next<K>(rx: &mut mpsc::Receiver<TrafficRecord<K>>) -> TrafficRecord<K> {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn sums_writes_until_dropped() {
        let (tx, mut rx) = mpsc::channel(4);
        let meter = Meter::start("userA", tx);
        meter.record(5);
        meter.record(1);
        drop(meter);

        assert_eq!(next(&mut rx).await, TrafficRecord::new("userA", 6));
    }

    #[tokio::test]
    async fn zero_writes_still_emit_one_record() {
        let (tx, mut rx) = mpsc::channel(4);
        drop(Meter::start(7u32, tx));

        assert_eq!(next(&mut rx).await, TrafficRecord::new(7, 0));
        // The only sender lived in the finished task.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn unwinding_owner_still_finishes() {
        let (tx, mut rx) = mpsc::channel(4);
        let owner = tokio::spawn(async move {
            let meter = Meter::start("panicky", tx);
            meter.record(3);
            panic!("handler blew up");
        });
        assert!(owner.await.unwrap_err().is_panic());

        assert_eq!(next(&mut rx).await, TrafficRecord::new("panicky", 3));
    }

    #[tokio::test]
    async fn record_waits_for_capacity() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.send(TrafficRecord::new("earlier", 1)).await.unwrap();

        let meter = Meter::start("later", tx);
        meter.record(4);
        let signals = meter.tx.clone();
        drop(meter);

        // The task is parked on the full channel, still holding its receiver.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!signals.is_closed());

        assert_eq!(next(&mut rx).await, TrafficRecord::new("earlier", 1));
        assert_eq!(next(&mut rx).await, TrafficRecord::new("later", 4));
        tokio::time::timeout(Duration::from_secs(1), signals.closed())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn gone_receiver_ends_task_quietly() {
        let (tx, rx) = mpsc::channel::<TrafficRecord<&str>>(1);
        drop(rx);

        let meter = Meter::start("orphan", tx);
        meter.record(9);
        let signals = meter.tx.clone();
        drop(meter);

        tokio::time::timeout(Duration::from_secs(1), signals.closed())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn slow_consumer_does_not_block_writes() {
        let (tx, mut rx) = mpsc::channel(1);
        let first = Meter::start("a", tx.clone());
        let second = Meter::start("b", tx);
        for _ in 0..10_000 {
            second.record(1);
        }
        drop(first);
        drop(second);

        let mut got = vec![next(&mut rx).await, next(&mut rx).await];
        got.sort_by_key(|r| r.key);
        assert_eq!(got, vec![TrafficRecord::new("a", 0), TrafficRecord::new("b", 10_000)]);
    }
}
