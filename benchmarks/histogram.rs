use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const THRESHOLDS_US: [u64; 12] = [1, 10, 50, 100, 200, 500, 1_000, 5_000, 10_000, 50_000, 100_000, 500_000];

/// Lock-free latency histogram shared by every client task.
pub struct LiveHistogram {
    buckets: [AtomicU64; 12],
}

impl LiveHistogram {
    pub fn new() -> Self {
        const ZERO: AtomicU64 = AtomicU64::new(0);
        Self { buckets: [ZERO; 12] }
    }

    pub fn record(&self, elapsed: Duration) {
        let us = elapsed.as_micros() as u64;
        let idx = THRESHOLDS_US
            .iter()
            .position(|t| us < *t)
            .unwrap_or(THRESHOLDS_US.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| b.load(Ordering::Relaxed)).sum()
    }

    /// Upper bound (µs) of the bucket holding the `p` quantile.
    pub fn percentile(&self, p: f64) -> u64 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        let target = ((total as f64 * p).ceil() as u64).max(1);
        let mut count = 0;
        for (i, b) in self.buckets.iter().enumerate() {
            count += b.load(Ordering::Relaxed);
            if count >= target {
                return THRESHOLDS_US[i];
            }
        }
        THRESHOLDS_US[THRESHOLDS_US.len() - 1]
    }
}
