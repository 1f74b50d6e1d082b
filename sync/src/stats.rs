//! Sync engine activity counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters describing the engine's activity since start.
#[derive(Debug, Default)]
pub struct SyncStats {
    bootstraps: AtomicU64,
    bootstrap_failures: AtomicU64,
    events_folded: AtomicU64,
    anomalies: AtomicU64,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_bootstrap(&self) {
        self.bootstraps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bootstrap_failure(&self) {
        self.bootstrap_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self) {
        self.events_folded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_anomaly(&self) {
        self.anomalies.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bootstraps: self.bootstraps.load(Ordering::Relaxed),
            bootstrap_failures: self.bootstrap_failures.load(Ordering::Relaxed),
            events_folded: self.events_folded.load(Ordering::Relaxed),
            anomalies: self.anomalies.load(Ordering::Relaxed),
        }
    }
}

/// Copied counter values, safe to hand across the presentation boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub bootstraps: u64,
    pub bootstrap_failures: u64,
    pub events_folded: u64,
    pub anomalies: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let stats = SyncStats::new();
        stats.record_bootstrap();
        stats.record_event();
        stats.record_event();
        stats.record_anomaly();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.bootstraps, 1);
        assert_eq!(snapshot.bootstrap_failures, 0);
        assert_eq!(snapshot.events_folded, 2);
        assert_eq!(snapshot.anomalies, 1);
    }
}
