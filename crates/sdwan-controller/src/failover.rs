//! Failover Coordination

use crate::state::{EngineState, Migration, Reselection};
use parking_lot::RwLock;
use sdwan_common::{FlowId, PathGroup, PathId, Timestamp};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

/// Failover events kept for inspection
pub const FAILOVER_HISTORY_LEN: usize = 64;

/// What reported the failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailoverTrigger {
    /// The datapath disconnected
    SwitchDown,
    /// Reported through the API or a collaborator
    Manual,
}

/// Failover event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailoverEvent {
    /// Failed path
    pub path: PathId,
    /// What reported the failure
    pub trigger: FailoverTrigger,
    /// Groups holding the failed path
    pub affected_groups: Vec<PathGroup>,
    /// Flows moved to another path
    pub rerouted_flows: Vec<Migration>,
    /// Flows left without a path
    pub unrouted_flows: Vec<FlowId>,
    /// When the failure was handled
    pub at: Timestamp,
}

/// Failover coordinator
///
/// A failure is fully applied (records marked, flows re-selected) before
/// [`handle_failure`](Self::handle_failure) returns. Recovery is never
/// automatic; a path comes back only through a metric update that carries
/// `available = true`.
pub struct FailoverCoordinator {
    state: Arc<EngineState>,
    history: RwLock<VecDeque<FailoverEvent>>,
}

impl FailoverCoordinator {
    /// Coordinator over the shared state
    pub fn new(state: Arc<EngineState>) -> Self {
        Self {
            state,
            history: RwLock::new(VecDeque::with_capacity(FAILOVER_HISTORY_LEN)),
        }
    }

    /// Take `path` out of service in every group and re-route its flows
    pub fn handle_failure(&self, path: PathId, trigger: FailoverTrigger) -> FailoverEvent {
        let now = self.state.now();

        let (affected_groups, outcome) = {
            let mut paths = self.state.paths.write();
            let affected = paths.mark_unavailable(path, now);
            let mut flows = self.state.flows.write();
            (affected, self.state.reselect(&paths, &mut flows))
        };
        self.state.counters.failovers.inc();

        let Reselection { migrated, unrouted } = outcome;
        tracing::warn!(
            "Path {} failed ({:?}): {} flows rerouted, {} unrouted",
            path,
            trigger,
            migrated.len(),
            unrouted.len()
        );

        let event = FailoverEvent {
            path,
            trigger,
            affected_groups,
            rerouted_flows: migrated,
            unrouted_flows: unrouted,
            at: now,
        };
        self.record(event.clone());
        event
    }

    /// Re-select every routed flow without marking anything
    pub fn trigger_reselection(&self) -> Reselection {
        let paths = self.state.paths.read();
        let mut flows = self.state.flows.write();
        self.state.reselect(&paths, &mut flows)
    }

    fn record(&self, event: FailoverEvent) {
        let mut history = self.history.write();
        if history.len() == FAILOVER_HISTORY_LEN {
            history.pop_front();
        }
        history.push_back(event);
    }

    /// Get last failover event
    pub fn last_event(&self) -> Option<FailoverEvent> {
        self.history.read().back().cloned()
    }

    /// Get failover history, oldest first
    pub fn history(&self) -> Vec<FailoverEvent> {
        self.history.read().iter().cloned().collect()
    }
}
