//! SD-WAN control engine

use crate::config::ControllerConfig;
use crate::events::{ControllerEvents, FlowRule, FlowStat, ForwardingDecision, PortStat};
use crate::failover::{FailoverCoordinator, FailoverEvent, FailoverTrigger};
use crate::ports::PortMeter;
use crate::scheduler::{MaintenanceScheduler, ScheduleConfig};
use crate::state::EngineState;
use crate::stats::{Snapshot, StatsAggregator};
use parking_lot::Mutex;
use sdwan_common::{Clock, FlowKey, PathGroup, PathId, PriorityClass};
use sdwan_flow::PriorityClassifier;
use sdwan_path::{MetricSample, MetricSource, PathTable};
use std::sync::Arc;
use tracing::{debug, info};

/// SD-WAN controller
///
/// Owns the path table, the flow registry and the counters; every inbound
/// event goes through [`ControllerEvents`].
pub struct Controller {
    config: ControllerConfig,
    state: Arc<EngineState>,
    classifier: PriorityClassifier,
    coordinator: FailoverCoordinator,
    stats: StatsAggregator,
    ports: Mutex<PortMeter>,
}

impl Controller {
    /// Create a controller with the configured paths declared
    pub fn new(config: ControllerConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let mut table = PathTable::new(config.default_bandwidth_total_mbps);
        for (group, path, total) in config.declared_paths() {
            table.declare(group, path, total, now);
        }

        let state = Arc::new(EngineState::new(table, clock));
        info!(
            "Controller ready: {} groups, {} declared paths",
            config.groups.len(),
            state.paths.read().len()
        );

        Self {
            classifier: PriorityClassifier::new(config.priority_ports.clone()),
            coordinator: FailoverCoordinator::new(state.clone()),
            stats: StatsAggregator::new(state.clone()),
            ports: Mutex::new(PortMeter::new()),
            state,
            config,
        }
    }

    /// Maintenance scheduler bound to this controller's state
    pub fn scheduler(&self, source: Arc<dyn MetricSource>) -> MaintenanceScheduler {
        let schedule = ScheduleConfig {
            refresh_interval: self.config.refresh_interval(),
            optimize_interval: self.config.optimize_interval(),
            flow_idle_timeout: self.config.flow_idle_timeout(),
            path_stale_after: self.config.path_stale_after(),
        };
        MaintenanceScheduler::new(self.state.clone(), source, schedule)
    }

    /// Report a path failure from outside the switch layer
    pub fn report_path_failure(&self, path: PathId) -> FailoverEvent {
        self.coordinator.handle_failure(path, FailoverTrigger::Manual)
    }

    /// Current statistics
    pub fn snapshot(&self) -> Snapshot {
        self.stats.snapshot()
    }

    /// Statistics as Prometheus text
    pub fn prometheus(&self) -> String {
        self.stats.prometheus()
    }

    /// Recent failovers, oldest first
    pub fn failover_history(&self) -> Vec<FailoverEvent> {
        self.coordinator.history()
    }

    /// Active configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Shared engine state
    pub fn state(&self) -> &Arc<EngineState> {
        &self.state
    }
}

impl ControllerEvents for Controller {
    fn on_switch_connected(&self, dpid: u64) {
        if self.state.switches.write().insert(dpid) {
            info!("Switch {:016x} connected", dpid);
        }
    }

    fn on_switch_disconnected(&self, dpid: u64) -> FailoverEvent {
        if self.state.switches.write().remove(&dpid) {
            info!("Switch {:016x} disconnected", dpid);
        }
        self.ports.lock().forget(dpid);
        self.coordinator.handle_failure(PathId(dpid), FailoverTrigger::SwitchDown)
    }

    fn on_packet_observed(
        &self,
        dpid: u64,
        key: FlowKey,
        priority_hint: Option<PriorityClass>,
        in_port: u32,
    ) -> ForwardingDecision {
        let group = self.config.group_for_ingress(dpid);
        let class = priority_hint.unwrap_or_else(|| self.classifier.classify(&key));
        let now = self.state.now();

        let paths = self.state.paths.read();
        let ranked = self.state.selector.rank(paths.candidates(&group), class);
        let mut flows = self.state.flows.write();

        let (flow, created) = flows.record_flow(key, group.clone(), class, now);
        self.state.counters.packets_forwarded.inc();

        let Some(&best) = ranked.first() else {
            flows.assign(&flow, None);
            debug!("No available path in group {} for flow {}, flooding", group, flow);
            return ForwardingDecision::Flood { flow, in_port };
        };

        let previous = flows.assign(&flow, Some(best)).flatten();
        if matches!(previous, Some(p) if p != best) {
            self.state.counters.path_switches.inc();
            info!("Flow {} moved from path {:?} to {}", flow, previous, best);
        }
        self.state.counters.total_flows_installed.inc();

        if created {
            debug!("Flow {} ({}) steered via path {}", flow, class, best);
        }

        ForwardingDecision::Steer {
            flow,
            path: best,
            backup: ranked.get(1).copied(),
            rule: FlowRule::for_class(class, self.config.rule_idle_timeout()),
        }
    }

    fn on_stats_reply(&self, dpid: u64, flow_stats: &[FlowStat], port_stats: &[PortStat]) {
        let now = self.state.now();

        let rate = self.ports.lock().observe(dpid, port_stats, now);
        if let Some(mbps) = rate {
            let sample = MetricSample::new().bandwidth_used(mbps);
            let updated = self.state.paths.write().update_everywhere(PathId(dpid), &sample, now);
            debug!("Switch {:016x} sending {:.2} Mbps ({} path records)", dpid, mbps, updated);
        }

        if !flow_stats.is_empty() {
            let mut flows = self.state.flows.write();
            for stat in flow_stats {
                flows.update_stats(&stat.key.flow_id(), stat.packet_count, stat.byte_count, now);
            }
        }
    }

    fn on_probe_result(&self, group: &PathGroup, path: PathId, sample: &MetricSample) {
        let now = self.state.now();
        let score = self.state.paths.write().update(group, path, sample, now);
        debug!("Probe for path {} in group {}: score {:.1}", path, group, score);
    }
}
