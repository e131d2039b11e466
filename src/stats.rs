//! Four monotonic byte counters (tx/rx, raw/compressed), atomic, with a
//! snapshot-and-clear operation.

use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time read of the adapter's byte counters.
///
/// Returned by [`crate::Adapter::statistics`] (non-destructive) and
/// [`crate::Adapter::statistics_and_clear`] (snapshot-and-zero).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    /// Plaintext bytes accepted from callers via `write_some`.
    pub tx_bytes_total: u64,
    /// Compressed bytes handed to the transport by `write_some`.
    pub tx_bytes_compressed: u64,
    /// Plaintext bytes delivered to callers via `read_some`.
    pub rx_bytes_total: u64,
    /// Compressed bytes pulled from the transport by `read_some`.
    pub rx_bytes_compressed: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Statistics {
    tx_bytes_total: AtomicU64,
    tx_bytes_compressed: AtomicU64,
    rx_bytes_total: AtomicU64,
    rx_bytes_compressed: AtomicU64,
}

impl Statistics {
    pub(crate) fn add_tx_total(&self, n: u64) {
        self.tx_bytes_total.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_tx_compressed(&self, n: u64) {
        self.tx_bytes_compressed.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_rx_total(&self, n: u64) {
        self.rx_bytes_total.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_rx_compressed(&self, n: u64) {
        self.rx_bytes_compressed.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            tx_bytes_total: self.tx_bytes_total.load(Ordering::Relaxed),
            tx_bytes_compressed: self.tx_bytes_compressed.load(Ordering::Relaxed),
            rx_bytes_total: self.rx_bytes_total.load(Ordering::Relaxed),
            rx_bytes_compressed: self.rx_bytes_compressed.load(Ordering::Relaxed),
        }
    }

    /// Atomically reads and zeroes every counter, returning the values as
    /// they stood immediately before the reset.
    ///
    /// This is the corrected snapshot-and-zero semantics: each counter is
    /// individually `swap`-ped to zero and the pre-swap value returned. An
    /// earlier, incorrect formulation exchanged a zero-initialized local
    /// *into* the atomics the wrong way round and left the counters
    /// unchanged; see DESIGN.md.
    pub(crate) fn reset(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            tx_bytes_total: self.tx_bytes_total.swap(0, Ordering::Relaxed),
            tx_bytes_compressed: self.tx_bytes_compressed.swap(0, Ordering::Relaxed),
            rx_bytes_total: self.rx_bytes_total.swap(0, Ordering::Relaxed),
            rx_bytes_compressed: self.rx_bytes_compressed.swap(0, Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_statistics_are_zero() {
        let stats = Statistics::default();
        assert_eq!(stats.snapshot(), StatisticsSnapshot::default());
    }

    #[test]
    fn increments_are_independent_per_counter() {
        let stats = Statistics::default();
        stats.add_tx_total(10);
        stats.add_tx_compressed(4);
        stats.add_rx_total(7);
        stats.add_rx_compressed(2);
        let snap = stats.snapshot();
        assert_eq!(snap.tx_bytes_total, 10);
        assert_eq!(snap.tx_bytes_compressed, 4);
        assert_eq!(snap.rx_bytes_total, 7);
        assert_eq!(snap.rx_bytes_compressed, 2);
    }

    #[test]
    fn reset_returns_prior_values_and_zeroes() {
        let stats = Statistics::default();
        stats.add_tx_total(10);
        stats.add_rx_compressed(3);
        let snap = stats.reset();
        assert_eq!(snap.tx_bytes_total, 10);
        assert_eq!(snap.rx_bytes_compressed, 3);
        assert_eq!(stats.snapshot(), StatisticsSnapshot::default());
    }

    #[test]
    fn reset_twice_is_equivalent_to_once() {
        let stats = Statistics::default();
        stats.add_tx_total(5);
        let _ = stats.reset();
        let second = stats.reset();
        assert_eq!(second, StatisticsSnapshot::default());
    }
}
