//! Periodic maintenance: metric refresh and flow optimization

use crate::state::{EngineState, Migration};
use sdwan_common::{FlowId, PathGroup, PathId};
use sdwan_path::{MetricSample, MetricSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Result of one metric refresh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    /// Samples applied
    pub sampled: usize,
    /// Records switched off for silence
    pub stale: Vec<(PathGroup, PathId)>,
}

/// Result of one optimization pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeReport {
    /// Flows removed for inactivity
    pub evicted: Vec<FlowId>,
    /// Flows moved to a better path
    pub migrated: Vec<Migration>,
    /// Flows left without a path
    pub unrouted: Vec<FlowId>,
}

/// Scheduler timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Metric refresh period
    pub refresh_interval: Duration,
    /// Optimization pass period
    pub optimize_interval: Duration,
    /// Inactivity window before eviction
    pub flow_idle_timeout: Duration,
    /// Staleness threshold, if enabled
    pub path_stale_after: Option<Duration>,
}

/// Maintenance scheduler
///
/// Runs the refresh and optimization loops as two independent tasks. No lock
/// is held across an await or between cycles.
pub struct MaintenanceScheduler {
    state: Arc<EngineState>,
    source: Arc<dyn MetricSource>,
    config: ScheduleConfig,
}

impl MaintenanceScheduler {
    /// Scheduler pulling samples from `source`
    pub fn new(state: Arc<EngineState>, source: Arc<dyn MetricSource>, config: ScheduleConfig) -> Self {
        Self { state, source, config }
    }

    /// Pull one sample per known path and apply it
    pub async fn refresh_metrics(&self) -> RefreshReport {
        let keys = self.state.paths.read().keys();

        let mut samples: Vec<(PathGroup, PathId, MetricSample)> = Vec::with_capacity(keys.len());
        for (group, path) in keys {
            match self.source.sample(&group, path).await {
                Ok(Some(sample)) => samples.push((group, path, sample)),
                Ok(None) => {}
                Err(e) => warn!("Metric source failed for path {} in group {}: {}", path, group, e),
            }
        }

        let now = self.state.now();
        let mut paths = self.state.paths.write();
        for (group, path, sample) in &samples {
            let score = paths.update(group, *path, sample, now);
            debug!("Path {} in group {} scored {:.1}", path, group, score);
        }

        let mut stale = Vec::new();
        if let Some(max_age) = self.config.path_stale_after {
            stale = paths.mark_stale(now, max_age);
            for (group, path) in &stale {
                warn!("Path {} in group {} silent for over {:?}, marking unavailable", path, group, max_age);
            }
        }

        RefreshReport {
            sampled: samples.len(),
            stale,
        }
    }

    /// Evict idle flows, then migrate routed flows to their current best path
    pub fn optimize(&self) -> OptimizeReport {
        let now = self.state.now();
        let paths = self.state.paths.read();
        let mut flows = self.state.flows.write();

        let evicted: Vec<FlowId> = flows.evict_stale(now, self.config.flow_idle_timeout).collect();
        if !evicted.is_empty() {
            info!("Evicted {} idle flows", evicted.len());
        }

        let outcome = self.state.reselect(&paths, &mut flows);
        OptimizeReport {
            evicted,
            migrated: outcome.migrated,
            unrouted: outcome.unrouted,
        }
    }

    /// Start both loops; they exit once `shutdown` turns true
    ///
    /// A pass already running when the signal arrives is finished first.
    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> (JoinHandle<()>, JoinHandle<()>) {
        let refresh = {
            let scheduler = self.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { scheduler.refresh_loop(shutdown).await })
        };
        let optimize = tokio::spawn(async move { self.optimize_loop(shutdown).await });
        (refresh, optimize)
    }

    async fn refresh_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.refresh_metrics().await;
                    debug!("Refreshed {} paths", report.sampled);
                }
                _ = shutdown.changed() => break,
            }
            let stop = *shutdown.borrow();
            if stop {
                break;
            }
        }
        info!("Metric refresh stopped");
    }

    async fn optimize_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.optimize_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.optimize();
                    debug!(
                        "Optimization pass: {} evicted, {} migrated, {} unrouted",
                        report.evicted.len(),
                        report.migrated.len(),
                        report.unrouted.len()
                    );
                }
                _ = shutdown.changed() => break,
            }
            let stop = *shutdown.borrow();
            if stop {
                break;
            }
        }
        info!("Path optimization stopped");
    }
}
