//! Switch-facing event interface
//!
//! The southbound adapter (OpenFlow or otherwise) translates wire messages
//! into calls on [`ControllerEvents`] and turns the returned
//! [`ForwardingDecision`]s back into rule installs and packet-outs.

use crate::failover::FailoverEvent;
use sdwan_common::{FlowId, FlowKey, PathGroup, PathId, PriorityClass};
use sdwan_path::MetricSample;
use serde::Serialize;
use std::time::Duration;

/// Per-flow counters from a stats reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStat {
    /// 5-tuple the switch matched
    pub key: FlowKey,
    /// Packets matched by the rule
    pub packet_count: u64,
    /// Bytes matched by the rule
    pub byte_count: u64,
}

/// Per-port counters from a stats reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortStat {
    /// Port number
    pub port_no: u32,
    /// Packets received
    pub rx_packets: u64,
    /// Packets sent
    pub tx_packets: u64,
    /// Bytes received
    pub rx_bytes: u64,
    /// Bytes sent
    pub tx_bytes: u64,
    /// Receive errors
    pub rx_errors: u64,
    /// Transmit errors
    pub tx_errors: u64,
}

/// Rule parameters for a steered flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowRule {
    /// Rule priority (class rank + 1)
    pub priority: u16,
    /// Idle timeout for the installed rule
    pub idle_timeout: Duration,
}

impl FlowRule {
    /// Rule for a flow of `class`
    pub fn for_class(class: PriorityClass, idle_timeout: Duration) -> Self {
        Self {
            priority: u16::from(class.rank()) + 1,
            idle_timeout,
        }
    }
}

/// What the switch should do with an observed packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ForwardingDecision {
    /// Install a rule and forward via `path`
    Steer {
        /// Flow the decision applies to
        flow: FlowId,
        /// Chosen path
        path: PathId,
        /// Runner-up path, if the group has one
        backup: Option<PathId>,
        /// Rule to install
        rule: FlowRule,
    },
    /// No usable path; flood out of every port but `in_port`
    Flood {
        /// Flow the decision applies to
        flow: FlowId,
        /// Port the packet arrived on
        in_port: u32,
    },
}

impl ForwardingDecision {
    /// Flow the decision applies to
    pub fn flow(&self) -> &FlowId {
        match self {
            Self::Steer { flow, .. } | Self::Flood { flow, .. } => flow,
        }
    }

    /// Chosen path, if any
    pub fn path(&self) -> Option<PathId> {
        match self {
            Self::Steer { path, .. } => Some(*path),
            Self::Flood { .. } => None,
        }
    }
}

/// Inbound events from the switch layer and the probing agent
pub trait ControllerEvents: Send + Sync {
    /// A datapath completed its handshake
    fn on_switch_connected(&self, dpid: u64);

    /// A datapath went away; treated as a failure of the path with its id
    fn on_switch_disconnected(&self, dpid: u64) -> FailoverEvent;

    /// First packet of a flow reached the controller
    fn on_packet_observed(
        &self,
        dpid: u64,
        key: FlowKey,
        priority_hint: Option<PriorityClass>,
        in_port: u32,
    ) -> ForwardingDecision;

    /// Flow and port counters arrived from a datapath
    fn on_stats_reply(&self, dpid: u64, flows: &[FlowStat], ports: &[PortStat]);

    /// A probe measured a path
    fn on_probe_result(&self, group: &PathGroup, path: PathId, sample: &MetricSample);
}
