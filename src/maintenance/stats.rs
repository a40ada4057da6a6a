//! Statistics Aggregator
//!
//! Counts hits, misses and transactions twice: once since the daemon
//! started and once since the previous report. A report folds the recent
//! counters into the totals, runs a cache sweep, and resets the recent
//! counters.

use std::fmt;

use crate::storage::{CacheStore, CleanupReport};

/// One set of request counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// GETs answered with a value
    pub hits: u64,
    /// GETs answered with `ERR`
    pub misses: u64,
    /// Well-formed NEW, GET and REMOVE requests
    pub transactions: u64,
}

impl Counters {
    /// Number of GET requests counted.
    pub fn gets(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit ratio as a percentage, or 0 when there were no GETs.
    pub fn hit_ratio(&self) -> f64 {
        let gets = self.gets();
        if gets == 0 {
            0.0
        } else {
            100.0 * self.hits as f64 / gets as f64
        }
    }

    fn absorb(&mut self, other: &Counters) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.transactions += other.transactions;
    }
}

/// The numbers behind one periodic stats line.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    /// Entries left in the cache after the sweep
    pub entries: usize,
    /// Counters since the daemon started
    pub total: Counters,
    /// Counters since the previous report
    pub recent: Counters,
    /// Transactions per second since start
    pub total_tps: f64,
    /// Transactions per second since the previous report
    pub recent_tps: f64,
    /// What the sweep removed
    pub cleanup: CleanupReport,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cache entries={}, transactions={}/{}, tps={:.2}/{:.2}, hit ratio={:.2}%/{:.2}%",
            self.entries,
            self.total.transactions,
            self.recent.transactions,
            self.total_tps,
            self.recent_tps,
            self.total.hit_ratio(),
            self.recent.hit_ratio(),
        )
    }
}

/// Tracks request counters between maintenance cycles.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    total: Counters,
    recent: Counters,
    start_time: u64,
    last_report: u64,
}

impl StatsAggregator {
    /// Creates an aggregator whose clock starts at `now` (unix seconds).
    pub fn new(now: u64) -> Self {
        Self {
            total: Counters::default(),
            recent: Counters::default(),
            start_time: now,
            last_report: now,
        }
    }

    pub fn record_transaction(&mut self) {
        self.recent.transactions += 1;
    }

    pub fn record_hit(&mut self) {
        self.recent.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.recent.misses += 1;
    }

    /// Counters accumulated since the previous report.
    pub fn recent(&self) -> Counters {
        self.recent
    }

    /// Counters folded in by completed reports.
    ///
    /// Activity since the last report is not included until the next one.
    pub fn total(&self) -> Counters {
        self.total
    }

    /// Returns the unix second of the last report (or of startup).
    pub fn last_report(&self) -> u64 {
        self.last_report
    }

    /// Produces a report and starts a new recent window.
    ///
    /// Elapsed times are clamped to at least one second so the rates are
    /// always defined. The store is swept as part of the report.
    pub fn report(&mut self, store: &mut CacheStore, now: u64) -> StatsReport {
        self.total.absorb(&self.recent);

        let since_start = elapsed(self.start_time, now);
        let since_last = elapsed(self.last_report, now);

        let cleanup = store.cleanup(now);

        let report = StatsReport {
            entries: store.len(),
            total: self.total,
            recent: self.recent,
            total_tps: self.total.transactions as f64 / since_start as f64,
            recent_tps: self.recent.transactions as f64 / since_last as f64,
            cleanup,
        };

        self.recent = Counters::default();
        self.last_report = now;
        report
    }
}

fn elapsed(from: u64, now: u64) -> u64 {
    if now > from {
        now - from
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    const START: u64 = 1_700_000_000;

    #[test]
    fn test_counters_hit_ratio() {
        let none = Counters::default();
        assert_eq!(none.hit_ratio(), 0.0);

        let mixed = Counters { hits: 3, misses: 1, transactions: 4 };
        assert_eq!(mixed.gets(), 4);
        assert_eq!(mixed.hit_ratio(), 75.0);
    }

    #[test]
    fn test_report_resets_recent() {
        let mut stats = StatsAggregator::new(START);
        let mut store = CacheStore::new();

        stats.record_transaction();
        stats.record_transaction();
        stats.record_hit();
        stats.record_miss();

        let report = stats.report(&mut store, START + 10);
        assert_eq!(report.recent, Counters { hits: 1, misses: 1, transactions: 2 });
        assert_eq!(report.total, report.recent);

        assert_eq!(stats.recent(), Counters::default());
        assert_eq!(stats.total().transactions, 2);
        assert_eq!(stats.last_report(), START + 10);
    }

    #[test]
    fn test_totals_never_decrease() {
        let mut stats = StatsAggregator::new(START);
        let mut store = CacheStore::new();
        let mut previous = Counters::default();

        for round in 1..=5u64 {
            for _ in 0..round {
                stats.record_transaction();
                stats.record_hit();
            }
            let report = stats.report(&mut store, START + round * 300);
            assert!(report.total.transactions >= previous.transactions);
            assert!(report.total.hits >= previous.hits);
            assert_eq!(report.recent.transactions, round);
            previous = report.total;
        }
        assert_eq!(previous.transactions, 15);
    }

    #[test]
    fn test_rates() {
        let mut stats = StatsAggregator::new(START);
        let mut store = CacheStore::new();

        for _ in 0..600 {
            stats.record_transaction();
        }
        let first = stats.report(&mut store, START + 300);
        assert_eq!(first.total_tps, 2.0);
        assert_eq!(first.recent_tps, 2.0);

        for _ in 0..300 {
            stats.record_transaction();
        }
        let second = stats.report(&mut store, START + 600);
        assert_eq!(second.total_tps, 1.5);
        assert_eq!(second.recent_tps, 1.0);
    }

    #[test]
    fn test_elapsed_is_clamped() {
        let mut stats = StatsAggregator::new(START);
        let mut store = CacheStore::new();

        stats.record_transaction();
        let report = stats.report(&mut store, START);
        assert_eq!(report.total_tps, 1.0);
        assert_eq!(report.recent_tps, 1.0);

        // A clock that steps backwards is treated the same way
        let report = stats.report(&mut store, START - 5);
        assert_eq!(report.recent_tps, 0.0);
        assert_eq!(report.total_tps, 1.0);
    }

    #[test]
    fn test_report_sweeps_store() {
        let mut stats = StatsAggregator::new(START);
        let mut store = CacheStore::new();
        store.insert_at(Bytes::from("old"), Bytes::from("v"), 10, START);
        store.insert_at(Bytes::from("new"), Bytes::from("v"), 1_000, START);

        let report = stats.report(&mut store, START + 300);
        assert_eq!(report.entries, 1);
        assert_eq!(report.cleanup.expired, 1);
    }

    #[test]
    fn test_report_line() {
        let mut stats = StatsAggregator::new(START);
        let mut store = CacheStore::new();
        store.insert_at(Bytes::from("k"), Bytes::from("v"), 1_000, START);

        for _ in 0..4 {
            stats.record_transaction();
        }
        stats.record_hit();
        stats.record_miss();

        let report = stats.report(&mut store, START + 2);
        assert_eq!(
            report.to_string(),
            "cache entries=1, transactions=4/4, tps=2.00/2.00, hit ratio=50.00%/50.00%"
        );
    }
}
