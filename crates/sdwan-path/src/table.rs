//! Path health map, organised by path group

use crate::health::{MetricSample, PathHealth};
use crate::DEFAULT_BANDWIDTH_TOTAL_MBPS;
use sdwan_common::{PathGroup, PathId, Timestamp};
use std::collections::{btree_map, BTreeMap};
use std::time::Duration;
use tracing::debug;

/// Owner of every [`PathHealth`] record
///
/// Records live under their group; iteration is ordered by group key and
/// then by ascending path id, which is what gives selection and snapshots a
/// stable order.
#[derive(Debug, Clone)]
pub struct PathTable {
    groups: BTreeMap<PathGroup, BTreeMap<PathId, PathHealth>>,
    default_bandwidth_total_mbps: f64,
}

impl PathTable {
    /// Create an empty table
    pub fn new(default_bandwidth_total_mbps: f64) -> Self {
        Self {
            groups: BTreeMap::new(),
            default_bandwidth_total_mbps,
        }
    }

    /// Declare a path with a known capacity
    ///
    /// An existing record is left untouched.
    pub fn declare(&mut self, group: PathGroup, path: PathId, bandwidth_total_mbps: f64, now: Timestamp) {
        self.groups
            .entry(group)
            .or_default()
            .entry(path)
            .or_insert_with(|| PathHealth::new(path, bandwidth_total_mbps, now));
    }

    /// Record for `group`/`path`, created on first reference
    pub fn ensure(&mut self, group: &PathGroup, path: PathId, now: Timestamp) -> &mut PathHealth {
        let total = self.default_bandwidth_total_mbps;
        self.groups
            .entry(group.clone())
            .or_default()
            .entry(path)
            .or_insert_with(|| {
                debug!("New path {} in group {}", path, group);
                PathHealth::new(path, total, now)
            })
    }

    /// Apply a sample to one record, creating it if needed
    ///
    /// Returns the new score.
    pub fn update(&mut self, group: &PathGroup, path: PathId, sample: &MetricSample, now: Timestamp) -> f64 {
        self.ensure(group, path, now).update_metrics(sample, now)
    }

    /// Apply a sample to every existing record of `path`, in all groups
    ///
    /// Returns how many records were updated.
    pub fn update_everywhere(&mut self, path: PathId, sample: &MetricSample, now: Timestamp) -> usize {
        let mut updated = 0;
        for paths in self.groups.values_mut() {
            if let Some(health) = paths.get_mut(&path) {
                health.update_metrics(sample, now);
                updated += 1;
            }
        }
        updated
    }

    /// Mark every record of `path` unavailable
    ///
    /// A path that was never referenced is created in its datapath's default
    /// group first, so it can still be reported dead. Returns the groups that
    /// hold the path.
    pub fn mark_unavailable(&mut self, path: PathId, now: Timestamp) -> Vec<PathGroup> {
        let mut affected = Vec::new();
        for (group, paths) in self.groups.iter_mut() {
            if let Some(health) = paths.get_mut(&path) {
                health.set_available(false);
                affected.push(group.clone());
            }
        }

        if affected.is_empty() {
            let group = PathGroup::for_datapath(path.0);
            self.ensure(&group, path, now).set_available(false);
            affected.push(group);
        }

        affected
    }

    /// Mark available paths whose last update is older than `max_age`
    ///
    /// Returns the records that were switched off.
    pub fn mark_stale(&mut self, now: Timestamp, max_age: Duration) -> Vec<(PathGroup, PathId)> {
        let mut stale = Vec::new();
        for (group, paths) in self.groups.iter_mut() {
            for (id, health) in paths.iter_mut() {
                if health.available() && now.saturating_since(health.last_update()) > max_age {
                    health.set_available(false);
                    stale.push((group.clone(), *id));
                }
            }
        }
        stale
    }

    /// Record lookup
    pub fn get(&self, group: &PathGroup, path: PathId) -> Option<&PathHealth> {
        self.groups.get(group).and_then(|paths| paths.get(&path))
    }

    /// Candidate paths of a group, ascending by path id
    pub fn candidates<'a>(&'a self, group: &PathGroup) -> impl Iterator<Item = &'a PathHealth> + 'a {
        self.groups.get(group).into_iter().flat_map(|paths| paths.values())
    }

    /// Every (group, path) key
    pub fn keys(&self) -> Vec<(PathGroup, PathId)> {
        self.groups
            .iter()
            .flat_map(|(group, paths)| paths.keys().map(move |id| (group.clone(), *id)))
            .collect()
    }

    /// Groups with their records
    pub fn groups(&self) -> impl Iterator<Item = (&PathGroup, btree_map::Values<'_, PathId, PathHealth>)> + '_ {
        self.groups.iter().map(|(group, paths)| (group, paths.values()))
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PathTable {
    fn default() -> Self {
        Self::new(DEFAULT_BANDWIDTH_TOTAL_MBPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: u64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    #[test]
    fn test_lazy_creation_uses_default_capacity() {
        let mut table = PathTable::new(50.0);
        table.update(&"site-a".into(), PathId(1), &MetricSample::new().bandwidth_used(25.0), t(1));

        let health = table.get(&"site-a".into(), PathId(1)).unwrap();
        assert_eq!(health.bandwidth_total_mbps(), 50.0);
        assert_eq!(health.breakdown().bandwidth_score, 50.0);
    }

    #[test]
    fn test_declare_keeps_existing_record() {
        let mut table = PathTable::default();
        table.declare("g".into(), PathId(1), 1000.0, t(1));
        table.update(&"g".into(), PathId(1), &MetricSample::new().latency(50.0), t(2));
        table.declare("g".into(), PathId(1), 10.0, t(3));

        let health = table.get(&"g".into(), PathId(1)).unwrap();
        assert_eq!(health.bandwidth_total_mbps(), 1000.0);
        assert_eq!(health.latency_ms(), 50.0);
    }

    #[test]
    fn test_mark_unavailable_hits_every_group() {
        let mut table = PathTable::default();
        table.declare("a".into(), PathId(1), 100.0, t(1));
        table.declare("a".into(), PathId(2), 100.0, t(1));
        table.declare("b".into(), PathId(1), 100.0, t(1));

        let groups = table.mark_unavailable(PathId(1), t(2));
        assert_eq!(groups, vec![PathGroup::from("a"), PathGroup::from("b")]);

        assert!(!table.get(&"a".into(), PathId(1)).unwrap().available());
        assert!(!table.get(&"b".into(), PathId(1)).unwrap().available());
        assert_eq!(table.get(&"b".into(), PathId(1)).unwrap().score(), 0.0);
        assert!(table.get(&"a".into(), PathId(2)).unwrap().available());
    }

    #[test]
    fn test_mark_unavailable_unknown_path() {
        let mut table = PathTable::default();
        let groups = table.mark_unavailable(PathId(7), t(1));

        assert_eq!(groups, vec![PathGroup::for_datapath(7)]);
        let health = table.get(&PathGroup::for_datapath(7), PathId(7)).unwrap();
        assert!(!health.available());
        assert_eq!(health.score(), 0.0);
    }

    #[test]
    fn test_update_everywhere_skips_unknown() {
        let mut table = PathTable::default();
        table.declare("a".into(), PathId(1), 100.0, t(1));
        table.declare("b".into(), PathId(1), 100.0, t(1));

        let sample = MetricSample::new().bandwidth_used(40.0);
        assert_eq!(table.update_everywhere(PathId(1), &sample, t(2)), 2);
        assert_eq!(table.update_everywhere(PathId(9), &sample, t(2)), 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_mark_stale() {
        let mut table = PathTable::default();
        table.declare("a".into(), PathId(1), 100.0, t(0));
        table.declare("a".into(), PathId(2), 100.0, t(0));
        table.update(&"a".into(), PathId(2), &MetricSample::new(), t(50));

        let stale = table.mark_stale(t(70), Duration::from_secs(30));
        assert_eq!(stale, vec![(PathGroup::from("a"), PathId(1))]);
        assert!(table.get(&"a".into(), PathId(2)).unwrap().available());

        // already unavailable paths are not reported twice
        assert!(table.mark_stale(t(200), Duration::from_secs(30)).len() == 1);
    }

    #[test]
    fn test_candidates_ordered() {
        let mut table = PathTable::default();
        for id in [3, 1, 2] {
            table.declare("g".into(), PathId(id), 100.0, t(0));
        }
        let ids: Vec<_> = table.candidates(&"g".into()).map(|h| h.path_id()).collect();
        assert_eq!(ids, vec![PathId(1), PathId(2), PathId(3)]);
        assert_eq!(table.candidates(&"missing".into()).count(), 0);
    }
}
