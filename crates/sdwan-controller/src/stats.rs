//! Statistics snapshots and Prometheus export

use crate::state::EngineState;
use sdwan_common::{PathGroup, Timestamp};
use sdwan_path::PathHealth;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

/// Controller-level figures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControllerSummary {
    /// Connected datapaths
    pub connected_switches: usize,
    /// Flows in the registry
    pub active_flows: usize,
    /// Forwarding rules installed
    pub total_flows_installed: u64,
    /// Flows moved between paths
    pub path_switches: u64,
    /// Path failures handled
    pub failovers: u64,
    /// Packets decided by the controller
    pub packets_forwarded: u64,
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Controller-level figures
    pub controller: ControllerSummary,
    /// Path records per group
    pub paths: BTreeMap<PathGroup, Vec<PathHealth>>,
    /// When the snapshot was taken
    pub timestamp: Timestamp,
}

/// Read-only statistics view
///
/// Each snapshot copies the path table and the registry size under their
/// read locks (path table first), so a snapshot never mixes two states of the
/// same map.
pub struct StatsAggregator {
    state: Arc<EngineState>,
}

impl StatsAggregator {
    /// Aggregator over the shared state
    pub fn new(state: Arc<EngineState>) -> Self {
        Self { state }
    }

    /// Collect a snapshot
    pub fn snapshot(&self) -> Snapshot {
        let paths: BTreeMap<PathGroup, Vec<PathHealth>> = {
            let table = self.state.paths.read();
            table
                .groups()
                .map(|(group, records)| (group.clone(), records.cloned().collect()))
                .collect()
        };
        let active_flows = self.state.flows.read().len();
        let connected_switches = self.state.switches.read().len();

        let counters = &self.state.counters;
        Snapshot {
            controller: ControllerSummary {
                connected_switches,
                active_flows,
                total_flows_installed: counters.total_flows_installed.get(),
                path_switches: counters.path_switches.get(),
                failovers: counters.failovers.get(),
                packets_forwarded: counters.packets_forwarded.get(),
            },
            paths,
            timestamp: self.state.now(),
        }
    }

    /// Export as Prometheus format
    pub fn prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let c = &snapshot.controller;
        let mut output = String::new();

        gauge(&mut output, "sdwan_connected_switches", "Connected datapaths", c.connected_switches as u64);
        gauge(&mut output, "sdwan_active_flows", "Flows in the registry", c.active_flows as u64);
        counter(&mut output, "sdwan_flows_installed_total", "Flow rules installed", c.total_flows_installed);
        counter(&mut output, "sdwan_path_switches_total", "Flows moved between paths", c.path_switches);
        counter(&mut output, "sdwan_failovers_total", "Path failures handled", c.failovers);
        counter(&mut output, "sdwan_packets_forwarded_total", "Packets decided by the controller", c.packets_forwarded);

        let series: [(&str, &str, fn(&PathHealth) -> f64); 5] = [
            ("sdwan_path_score", "Path score (0-100)", PathHealth::score),
            ("sdwan_path_latency_ms", "Path latency", PathHealth::latency_ms),
            ("sdwan_path_loss_percent", "Path packet loss", PathHealth::packet_loss_percent),
            ("sdwan_path_bandwidth_used_mbps", "Path bandwidth in use", PathHealth::bandwidth_used_mbps),
            ("sdwan_path_available", "Path availability", |p| if p.available() { 1.0 } else { 0.0 }),
        ];
        for (name, help, value) in series {
            let _ = writeln!(output, "# HELP {} {}", name, help);
            let _ = writeln!(output, "# TYPE {} gauge", name);
            for (group, records) in &snapshot.paths {
                for path in records {
                    let _ = writeln!(
                        output,
                        "{}{{group=\"{}\",path=\"{}\"}} {}",
                        name,
                        group,
                        path.path_id(),
                        value(path)
                    );
                }
            }
        }

        output
    }
}

fn gauge(output: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(output, "# HELP {} {}", name, help);
    let _ = writeln!(output, "# TYPE {} gauge", name);
    let _ = writeln!(output, "{} {}", name, value);
}

fn counter(output: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(output, "# HELP {} {}", name, help);
    let _ = writeln!(output, "# TYPE {} counter", name);
    let _ = writeln!(output, "{} {}", name, value);
}
