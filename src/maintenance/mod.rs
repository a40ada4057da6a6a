//! Maintenance Module
//!
//! Periodic housekeeping for sessiond: the trigger that wakes the request
//! loop up, and the statistics it reports when it does.
//!
//! - `trigger`: background task that injects sentinel datagrams
//! - `stats`: hit/miss/transaction counters and the periodic report

pub mod stats;
pub mod trigger;

// Re-export commonly used types
pub use stats::{Counters, StatsAggregator, StatsReport};
pub use trigger::{
    is_sentinel, sentinel_target, MaintenanceTrigger, TriggerConfig, DEFAULT_REPORT_INTERVAL,
};
