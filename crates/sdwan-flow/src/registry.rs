//! Active flow registry

use sdwan_common::{FlowId, FlowKey, PathGroup, PathId, PriorityClass, Timestamp};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// One observed flow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEntry {
    /// 5-tuple
    pub key: FlowKey,
    /// Group whose paths may carry the flow
    pub group: PathGroup,
    /// Priority class
    pub priority: PriorityClass,
    /// Path the flow is steered on, if any
    pub current_path: Option<PathId>,
    /// First observation
    pub creation_time: Timestamp,
    /// Last observation or stats refresh
    pub last_seen: Timestamp,
    /// Packets reported by the switch
    pub packet_count: u64,
    /// Bytes reported by the switch
    pub byte_count: u64,
}

impl FlowEntry {
    fn new(key: FlowKey, group: PathGroup, priority: PriorityClass, now: Timestamp) -> Self {
        Self {
            key,
            group,
            priority,
            current_path: None,
            creation_time: now,
            last_seen: now,
            packet_count: 0,
            byte_count: 0,
        }
    }

    /// Idle for longer than `max_idle` at `now`
    #[inline]
    pub fn is_idle(&self, now: Timestamp, max_idle: Duration) -> bool {
        now.saturating_since(self.last_seen) > max_idle
    }
}

/// Routing view of a flow, detached from the registry lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedFlow {
    /// Flow identifier
    pub id: FlowId,
    /// Path group
    pub group: PathGroup,
    /// Priority class
    pub priority: PriorityClass,
    /// Current path
    pub path: PathId,
}

/// Ids removed by [`FlowRegistry::evict_stale`]
pub type Evicted = std::vec::IntoIter<FlowId>;

/// Registry of active flows keyed by flow id
#[derive(Debug, Default)]
pub struct FlowRegistry {
    flows: HashMap<FlowId, FlowEntry>,
}

impl FlowRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation of `key`
    ///
    /// Creates the entry on first sight; a repeat observation refreshes
    /// `last_seen` and takes the latest priority. Returns the flow id and
    /// whether the flow is new.
    pub fn record_flow(
        &mut self,
        key: FlowKey,
        group: PathGroup,
        priority: PriorityClass,
        now: Timestamp,
    ) -> (FlowId, bool) {
        let id = key.flow_id();
        let mut created = false;
        let entry = self.flows.entry(id.clone()).or_insert_with(|| {
            created = true;
            FlowEntry::new(key, group, priority, now)
        });
        entry.priority = priority;
        entry.last_seen = now;

        if created {
            debug!("New flow {} ({})", id, priority);
        }
        (id, created)
    }

    /// Overwrite the switch counters of a flow
    ///
    /// Unknown ids are ignored; returns whether the flow existed.
    pub fn update_stats(&mut self, id: &FlowId, packet_count: u64, byte_count: u64, now: Timestamp) -> bool {
        match self.flows.get_mut(id) {
            Some(entry) => {
                entry.packet_count = packet_count;
                entry.byte_count = byte_count;
                entry.last_seen = now;
                true
            }
            None => false,
        }
    }

    /// Steer a flow onto `path` (or unroute it with `None`)
    ///
    /// Returns the previous path, or `None` if the flow is unknown.
    pub fn assign(&mut self, id: &FlowId, path: Option<PathId>) -> Option<Option<PathId>> {
        self.flows
            .get_mut(id)
            .map(|entry| std::mem::replace(&mut entry.current_path, path))
    }

    /// Remove every flow idle for longer than `max_idle`
    ///
    /// Removal happens before this returns; the iterator only hands the
    /// evicted ids to the caller.
    pub fn evict_stale(&mut self, now: Timestamp, max_idle: Duration) -> Evicted {
        let mut evicted = Vec::new();
        self.flows.retain(|id, entry| {
            if entry.is_idle(now, max_idle) {
                evicted.push(id.clone());
                false
            } else {
                true
            }
        });
        evicted.into_iter()
    }

    /// Flows currently steered on a path
    pub fn routed(&self) -> Vec<RoutedFlow> {
        self.flows
            .iter()
            .filter_map(|(id, entry)| {
                entry.current_path.map(|path| RoutedFlow {
                    id: id.clone(),
                    group: entry.group.clone(),
                    priority: entry.priority,
                    path,
                })
            })
            .collect()
    }

    /// Flow lookup
    pub fn get(&self, id: &FlowId) -> Option<&FlowEntry> {
        self.flows.get(id)
    }

    /// Whether `id` is tracked
    pub fn contains(&self, id: &FlowId) -> bool {
        self.flows.contains_key(id)
    }

    /// All flows
    pub fn iter(&self) -> impl Iterator<Item = (&FlowId, &FlowEntry)> {
        self.flows.iter()
    }

    /// Number of active flows
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    /// Whether no flow is tracked
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}
