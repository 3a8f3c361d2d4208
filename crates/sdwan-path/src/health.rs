//! Per-path health records

use crate::scorer::PathScore;
use sdwan_common::{PathId, Timestamp};
use serde::{Deserialize, Serialize};

/// A partial metric update
///
/// Omitted fields leave the previous value in place. `available` is the
/// explicit availability signal; metrics alone never flip it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Round-trip latency in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    /// Packet loss percentage (0 - 100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_loss_percent: Option<f64>,
    /// Bandwidth in use in Mbps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth_used_mbps: Option<f64>,
    /// Explicit (re-)enable or disable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl MetricSample {
    /// Empty sample (only refreshes the update time)
    pub const fn new() -> Self {
        Self {
            latency_ms: None,
            packet_loss_percent: None,
            bandwidth_used_mbps: None,
            available: None,
        }
    }

    /// Full latency/loss/usage sample
    pub fn measured(latency_ms: f64, packet_loss_percent: f64, bandwidth_used_mbps: f64) -> Self {
        Self {
            latency_ms: Some(latency_ms),
            packet_loss_percent: Some(packet_loss_percent),
            bandwidth_used_mbps: Some(bandwidth_used_mbps),
            available: None,
        }
    }

    /// Set latency
    pub fn latency(mut self, ms: f64) -> Self {
        self.latency_ms = Some(ms);
        self
    }

    /// Set loss
    pub fn loss(mut self, percent: f64) -> Self {
        self.packet_loss_percent = Some(percent);
        self
    }

    /// Set bandwidth usage
    pub fn bandwidth_used(mut self, mbps: f64) -> Self {
        self.bandwidth_used_mbps = Some(mbps);
        self
    }

    /// Set availability
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = Some(available);
        self
    }
}

/// Health record of one path
///
/// The score is derived state: every mutator recomputes it from the current
/// metrics and availability, nothing assigns it directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathHealth {
    path_id: PathId,
    latency_ms: f64,
    packet_loss_percent: f64,
    bandwidth_used_mbps: f64,
    bandwidth_total_mbps: f64,
    available: bool,
    score: f64,
    last_update: Timestamp,
}

impl PathHealth {
    /// Fresh, available, idle path
    pub fn new(path_id: PathId, bandwidth_total_mbps: f64, now: Timestamp) -> Self {
        let mut health = Self {
            path_id,
            latency_ms: 0.0,
            packet_loss_percent: 0.0,
            bandwidth_used_mbps: 0.0,
            bandwidth_total_mbps,
            available: true,
            score: 0.0,
            last_update: now,
        };
        health.recompute();
        health
    }

    /// Apply a metric sample, stamp the update time and rescore
    ///
    /// Returns the new score.
    pub fn update_metrics(&mut self, sample: &MetricSample, now: Timestamp) -> f64 {
        if let Some(latency) = sample.latency_ms {
            self.latency_ms = latency;
        }
        if let Some(loss) = sample.packet_loss_percent {
            self.packet_loss_percent = loss;
        }
        if let Some(used) = sample.bandwidth_used_mbps {
            self.bandwidth_used_mbps = used;
        }
        if let Some(available) = sample.available {
            self.available = available;
        }
        self.last_update = now;
        self.recompute()
    }

    /// Flip availability without touching metrics or the update time
    pub fn set_available(&mut self, available: bool) -> f64 {
        self.available = available;
        self.recompute()
    }

    /// Score breakdown for the current metrics
    pub fn breakdown(&self) -> PathScore {
        PathScore::compute(
            self.latency_ms,
            self.packet_loss_percent,
            self.bandwidth_used_mbps,
            self.bandwidth_total_mbps,
            self.available,
        )
    }

    fn recompute(&mut self) -> f64 {
        self.score = self.breakdown().score;
        self.score
    }

    /// Path identifier
    #[inline]
    pub fn path_id(&self) -> PathId {
        self.path_id
    }

    /// Latency in milliseconds
    #[inline]
    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    /// Loss percentage
    #[inline]
    pub fn packet_loss_percent(&self) -> f64 {
        self.packet_loss_percent
    }

    /// Bandwidth in use (Mbps)
    #[inline]
    pub fn bandwidth_used_mbps(&self) -> f64 {
        self.bandwidth_used_mbps
    }

    /// Capacity (Mbps)
    #[inline]
    pub fn bandwidth_total_mbps(&self) -> f64 {
        self.bandwidth_total_mbps
    }

    /// Whether the path may carry traffic
    #[inline]
    pub fn available(&self) -> bool {
        self.available
    }

    /// Current score (0 - 100)
    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Time of the last metric update
    #[inline]
    pub fn last_update(&self) -> Timestamp {
        self.last_update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> PathHealth {
        PathHealth::new(PathId(1), 100.0, Timestamp::from_secs(10))
    }

    #[test]
    fn test_fresh_path_is_perfect() {
        let p = path();
        assert!(p.available());
        assert_eq!(p.score(), 100.0);
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut p = path();
        p.update_metrics(&MetricSample::measured(20.0, 1.0, 10.0), Timestamp::from_secs(11));
        assert_eq!(p.score(), 90.0);

        let score = p.update_metrics(&MetricSample::new().latency(40.0), Timestamp::from_secs(12));
        assert_eq!(p.latency_ms(), 40.0);
        assert_eq!(p.packet_loss_percent(), 1.0);
        assert_eq!(p.bandwidth_used_mbps(), 10.0);
        assert_eq!(p.last_update(), Timestamp::from_secs(12));
        assert_eq!(score, p.score());
        assert!(score < 90.0);
    }

    #[test]
    fn test_unavailable_forces_zero() {
        let mut p = path();
        p.update_metrics(&MetricSample::measured(5.0, 0.0, 0.0), Timestamp::from_secs(11));
        assert_eq!(p.set_available(false), 0.0);

        // metrics alone never bring the path back
        p.update_metrics(&MetricSample::measured(1.0, 0.0, 0.0), Timestamp::from_secs(12));
        assert!(!p.available());
        assert_eq!(p.score(), 0.0);

        p.update_metrics(&MetricSample::new().with_available(true), Timestamp::from_secs(13));
        assert!(p.available());
        assert!(p.score() > 0.0);
    }

    #[test]
    fn test_set_available_keeps_update_time() {
        let mut p = path();
        p.set_available(false);
        assert_eq!(p.last_update(), Timestamp::from_secs(10));
    }

    #[test]
    fn test_serialized_shape() {
        let mut p = path();
        p.update_metrics(&MetricSample::measured(20.0, 1.0, 10.0), Timestamp::from_secs(1_700_000_000));
        let v = serde_json::to_value(&p).unwrap();

        assert_eq!(v["path_id"], 1);
        assert_eq!(v["latency_ms"], 20.0);
        assert_eq!(v["packet_loss_percent"], 1.0);
        assert_eq!(v["bandwidth_used_mbps"], 10.0);
        assert_eq!(v["bandwidth_total_mbps"], 100.0);
        assert_eq!(v["available"], true);
        assert_eq!(v["score"], 90.0);
        assert_eq!(v["last_update"], "2023-11-14T22:13:20.000000Z");
    }

    #[test]
    fn test_sample_deserialize_partial() {
        let s: MetricSample = serde_json::from_str(r#"{"latency_ms": 12.5}"#).unwrap();
        assert_eq!(s, MetricSample::new().latency(12.5));
    }
}
