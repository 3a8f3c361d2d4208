//! Path scoring with weighted health metrics

/// Component weights of the health score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Latency weight
    pub latency: f64,
    /// Loss weight
    pub loss: f64,
    /// Bandwidth-utilisation weight
    pub bandwidth: f64,
}

impl ScoreWeights {
    /// Latency and loss dominate, utilisation is a softer congestion signal
    pub const DEFAULT: Self = Self {
        latency: 0.4,
        loss: 0.4,
        bandwidth: 0.2,
    };
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Score for a single path, with its components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathScore {
    /// Overall score (0 - 100)
    pub score: f64,
    /// Latency component (0 at 200ms)
    pub latency_score: f64,
    /// Loss component (0 at 10% loss)
    pub loss_score: f64,
    /// Bandwidth component (0 at full utilisation)
    pub bandwidth_score: f64,
}

impl PathScore {
    /// Score a path
    ///
    /// Components are clamped to [0, 100]; an unavailable path always scores 0.
    #[inline]
    pub fn compute(
        latency_ms: f64,
        packet_loss_percent: f64,
        bandwidth_used_mbps: f64,
        bandwidth_total_mbps: f64,
        available: bool,
    ) -> Self {
        let w = ScoreWeights::DEFAULT;

        let latency_score = clamp_pct(100.0 - latency_ms / 2.0);
        let loss_score = clamp_pct(100.0 - packet_loss_percent * 10.0);
        let utilization = if bandwidth_total_mbps > 0.0 {
            (bandwidth_used_mbps / bandwidth_total_mbps) * 100.0
        } else {
            100.0
        };
        let bandwidth_score = clamp_pct(100.0 - utilization);

        let score = if available {
            w.latency * latency_score + w.loss * loss_score + w.bandwidth * bandwidth_score
        } else {
            0.0
        };

        Self {
            score,
            latency_score,
            loss_score,
            bandwidth_score,
        }
    }
}

/// `max(0, min(100, v))`, mapping NaN to 0
#[inline(always)]
fn clamp_pct(v: f64) -> f64 {
    v.max(0.0).min(100.0)
}
