//! Shared engine state
//!
//! The path table and the flow registry sit behind their own
//! `parking_lot::RwLock`. Whenever both are needed, the path table is locked
//! first.

use parking_lot::RwLock;
use sdwan_common::{AtomicCounter, Clock, FlowId, PathId, Timestamp};
use sdwan_flow::FlowRegistry;
use sdwan_path::{PathSelector, PathTable};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Controller-wide counters
///
/// Monotonic for the life of the process.
#[derive(Debug, Default)]
pub struct ControllerCounters {
    /// Forwarding rules installed
    pub total_flows_installed: AtomicCounter,
    /// Flows moved between paths
    pub path_switches: AtomicCounter,
    /// Path failures handled
    pub failovers: AtomicCounter,
    /// Packets decided by the controller
    pub packets_forwarded: AtomicCounter,
}

/// One migrated flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Migration {
    /// Migrated flow
    pub flow: FlowId,
    /// Previous path
    pub from: PathId,
    /// New path
    pub to: PathId,
}

/// Outcome of re-running selection over every routed flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reselection {
    /// Flows moved to a different path
    pub migrated: Vec<Migration>,
    /// Flows left without any available path
    pub unrouted: Vec<FlowId>,
}

/// State shared by the event handlers and the periodic tasks
pub struct EngineState {
    /// Path health, by group
    pub paths: RwLock<PathTable>,
    /// Active flows
    pub flows: RwLock<FlowRegistry>,
    /// Connected datapath ids
    pub switches: RwLock<BTreeSet<u64>>,
    /// Controller counters
    pub counters: ControllerCounters,
    /// Path selection policy
    pub selector: PathSelector,
    clock: Arc<dyn Clock>,
}

impl EngineState {
    /// State over a prepared path table
    pub fn new(paths: PathTable, clock: Arc<dyn Clock>) -> Self {
        Self {
            paths: RwLock::new(paths),
            flows: RwLock::new(FlowRegistry::new()),
            switches: RwLock::new(BTreeSet::new()),
            counters: ControllerCounters::default(),
            selector: PathSelector::new(),
            clock,
        }
    }

    /// Current time from the engine clock
    #[inline]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Re-select every routed flow against its group
    ///
    /// Callers pass both guards, taken in path table → flow registry order.
    /// A changed selection moves the flow and counts one path switch; a flow
    /// with nothing left to run on is unrouted without counting a switch.
    pub fn reselect(&self, paths: &PathTable, flows: &mut FlowRegistry) -> Reselection {
        let mut outcome = Reselection::default();

        for routed in flows.routed() {
            let best = self
                .selector
                .select_best_path(paths.candidates(&routed.group), routed.priority);

            match best {
                Some(best) if best != routed.path => {
                    flows.assign(&routed.id, Some(best));
                    self.counters.path_switches.inc();
                    info!("Migrated flow {} from path {} to {}", routed.id, routed.path, best);
                    outcome.migrated.push(Migration {
                        flow: routed.id,
                        from: routed.path,
                        to: best,
                    });
                }
                Some(_) => {}
                None => {
                    flows.assign(&routed.id, None);
                    warn!("No available path for flow {} in group {}", routed.id, routed.group);
                    outcome.unrouted.push(routed.id);
                }
            }
        }

        outcome
    }
}
