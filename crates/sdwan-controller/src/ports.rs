//! Port throughput derived from consecutive stats replies

use crate::events::PortStat;
use sdwan_common::Timestamp;
use std::collections::HashMap;

/// Per-datapath transmit byte meter
///
/// Keeps the last `(time, tx bytes)` snapshot per datapath; the rate is the
/// byte delta over the elapsed time. The first reply only sets a baseline.
#[derive(Debug, Default)]
pub struct PortMeter {
    last: HashMap<u64, (Timestamp, u64)>,
}

impl PortMeter {
    /// Meter with no baselines
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a port stats reply, returning the datapath's Mbps if known
    pub fn observe(&mut self, dpid: u64, ports: &[PortStat], now: Timestamp) -> Option<f64> {
        // flow-only replies carry no port counters
        if ports.is_empty() {
            return None;
        }

        let tx_bytes = ports.iter().fold(0u64, |acc, p| acc.saturating_add(p.tx_bytes));
        let previous = self.last.insert(dpid, (now, tx_bytes));
        let (last_ts, last_bytes) = previous?;

        // counters were reset (switch restart); the new reply is the baseline
        if tx_bytes < last_bytes {
            return None;
        }

        let elapsed_secs = now.saturating_since(last_ts).as_secs_f64();
        if elapsed_secs < 0.001 {
            return None;
        }

        let bits = (tx_bytes - last_bytes) as f64 * 8.0;
        Some(bits / elapsed_secs / 1_000_000.0)
    }

    /// Drop the baseline of a datapath
    pub fn forget(&mut self, dpid: u64) {
        self.last.remove(&dpid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(port_no: u32, tx_bytes: u64) -> PortStat {
        PortStat {
            port_no,
            tx_bytes,
            ..Default::default()
        }
    }

    #[test]
    fn test_rate_from_two_replies() {
        let mut meter = PortMeter::new();
        let t0 = Timestamp::from_secs(100);

        assert_eq!(meter.observe(1, &[port(1, 0), port(2, 1_000)], t0), None);

        // 12.5 MB more over 10s = 10 Mbps
        let rate = meter
            .observe(1, &[port(1, 6_250_000), port(2, 6_251_000)], Timestamp::from_secs(110))
            .unwrap();
        assert!((rate - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_counter_reset_rebaselines() {
        let mut meter = PortMeter::new();
        meter.observe(1, &[port(1, 5_000_000)], Timestamp::from_secs(0));
        assert_eq!(meter.observe(1, &[port(1, 100)], Timestamp::from_secs(10)), None);

        let rate = meter.observe(1, &[port(1, 1_250_100)], Timestamp::from_secs(20)).unwrap();
        assert!((rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_reply_keeps_baseline() {
        let mut meter = PortMeter::new();
        meter.observe(2, &[port(1, 10_000_000_000)], Timestamp::from_secs(0));
        assert_eq!(meter.observe(2, &[], Timestamp::from_secs(5)), None);

        // 1.25 MB over 10s since the last port reply = 1 Mbps
        let rate = meter.observe(2, &[port(1, 10_001_250_000)], Timestamp::from_secs(10)).unwrap();
        assert!((rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_huge_counters_saturate() {
        let mut meter = PortMeter::new();
        let ports = [port(1, u64::MAX), port(2, u64::MAX)];
        assert_eq!(meter.observe(1, &ports, Timestamp::from_secs(0)), None);
        assert_eq!(meter.observe(1, &ports, Timestamp::from_secs(10)), Some(0.0));
    }

    #[test]
    fn test_datapaths_tracked_separately() {
        let mut meter = PortMeter::new();
        meter.observe(1, &[port(1, 0)], Timestamp::from_secs(0));
        assert_eq!(meter.observe(2, &[port(1, 1_000)], Timestamp::from_secs(10)), None);

        meter.forget(1);
        assert_eq!(meter.observe(1, &[port(1, 1_000)], Timestamp::from_secs(10)), None);
    }
}
