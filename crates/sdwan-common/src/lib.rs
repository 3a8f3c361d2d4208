//! SD-WAN Common - Shared types for the overlay control engine
//!
//! This crate provides the primitives every other engine crate speaks:
//! - Path and path-group identifiers
//! - 5-tuple flow keys and priority classes
//! - Wall-clock timestamps and injectable clocks
//! - Lock-free counters
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod flow;
pub mod path;

pub use error::*;
pub use flow::*;
pub use path::*;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Wall-clock timestamp with nanosecond resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Current timestamp (nanoseconds since epoch)
    #[inline(always)]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        Self(nanos)
    }

    /// Build from whole seconds since epoch
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1_000_000_000)
    }

    /// Build from nanoseconds since epoch
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Get nanoseconds value
    #[inline(always)]
    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Time elapsed between `earlier` and `self`, zero if `earlier` is later
    #[inline]
    pub fn saturating_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    /// Shift forward by `d`
    pub fn add(&self, d: Duration) -> Self {
        Self(self.0.saturating_add(d.as_nanos() as u64))
    }

    /// Convert to a UTC date-time
    pub fn to_datetime(&self) -> DateTime<Utc> {
        let secs = (self.0 / 1_000_000_000) as i64;
        let nanos = (self.0 % 1_000_000_000) as u32;
        DateTime::from_timestamp(secs, nanos).unwrap_or_default()
    }

    /// RFC 3339 rendering with microsecond precision
    pub fn to_rfc3339(&self) -> String {
        self.to_datetime().to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

/// Source of "now" for the engine
///
/// Production code uses [`SystemClock`]; tests drive a [`ManualClock`] so
/// idle windows can be crossed without sleeping.
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually advanced clock
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: Timestamp) -> Self {
        Self(AtomicU64::new(start.as_nanos()))
    }

    /// Move the clock forward
    pub fn advance(&self, d: Duration) {
        self.0.fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute time
    pub fn set(&self, t: Timestamp) {
        self.0.store(t.as_nanos(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.0.load(Ordering::SeqCst))
    }
}

/// Lock-free monotonic counter
#[derive(Debug, Default)]
pub struct AtomicCounter(AtomicU64);

impl AtomicCounter {
    /// Create new counter
    pub const fn new(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }

    /// Increment and return previous value
    #[inline(always)]
    pub fn inc(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// Add value and return previous
    #[inline(always)]
    pub fn add(&self, val: u64) -> u64 {
        self.0.fetch_add(val, Ordering::Relaxed)
    }

    /// Get current value
    #[inline(always)]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
