//! Path health scoring and selection
//!
//! # Features
//!
//! - Per-path metric records with a deterministic 0-100 health score
//! - Path groups: sets of redundant paths competing for the same traffic
//! - Priority-aware selection (latency-first for high/critical traffic,
//!   score-first for normal traffic) with a stable tie-break
//! - Pluggable metric sources for the periodic refresh

#![warn(missing_docs)]

pub mod health;
pub mod probes;
pub mod scorer;
pub mod selector;
pub mod table;

pub use health::{MetricSample, PathHealth};
pub use probes::{MetricSource, SampleQueue};
pub use scorer::{PathScore, ScoreWeights};
pub use selector::PathSelector;
pub use table::PathTable;

/// Capacity assumed for a path nobody declared (Mbps)
pub const DEFAULT_BANDWIDTH_TOTAL_MBPS: f64 = 100.0;
