//! Priority-aware path selection

use crate::health::PathHealth;
use sdwan_common::{PathId, PriorityClass};
use std::cmp::Ordering;

/// Path selector
///
/// Latency-sensitive traffic (high, critical) takes the lowest
/// `(latency, loss)` path; normal traffic takes the highest score. Equal
/// candidates are broken by ascending path id so repeated calls on the same
/// input always agree.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathSelector;

impl PathSelector {
    /// Create new path selector
    pub const fn new() -> Self {
        Self
    }

    /// Best available candidate, or `None` when nothing is available
    pub fn select_best_path<'a, I>(&self, candidates: I, class: PriorityClass) -> Option<PathId>
    where
        I: IntoIterator<Item = &'a PathHealth>,
    {
        candidates
            .into_iter()
            .filter(|p| p.available())
            .min_by(|a, b| Self::preference(a, b, class))
            .map(PathHealth::path_id)
    }

    /// Available candidates, best first
    pub fn rank<'a, I>(&self, candidates: I, class: PriorityClass) -> Vec<PathId>
    where
        I: IntoIterator<Item = &'a PathHealth>,
    {
        let mut available: Vec<&PathHealth> = candidates.into_iter().filter(|p| p.available()).collect();
        available.sort_by(|a, b| Self::preference(a, b, class));
        available.into_iter().map(PathHealth::path_id).collect()
    }

    /// `Less` when `a` is preferred over `b`
    fn preference(a: &PathHealth, b: &PathHealth, class: PriorityClass) -> Ordering {
        let primary = if class.is_latency_sensitive() {
            a.latency_ms()
                .total_cmp(&b.latency_ms())
                .then_with(|| a.packet_loss_percent().total_cmp(&b.packet_loss_percent()))
        } else {
            b.score().total_cmp(&a.score())
        };
        primary.then_with(|| a.path_id().cmp(&b.path_id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::MetricSample;
    use sdwan_common::Timestamp;

    fn path(id: u64, latency: f64, loss: f64, used: f64) -> PathHealth {
        let mut p = PathHealth::new(PathId(id), 100.0, Timestamp::from_secs(0));
        p.update_metrics(&MetricSample::measured(latency, loss, used), Timestamp::from_secs(1));
        p
    }

    #[test]
    fn test_empty_and_all_down() {
        let selector = PathSelector::new();
        assert_eq!(selector.select_best_path(&[], PriorityClass::Normal), None);

        let mut down = path(1, 10.0, 0.0, 0.0);
        down.set_available(false);
        assert_eq!(selector.select_best_path([&down], PriorityClass::Critical), None);
    }

    #[test]
    fn test_high_priority_prefers_latency_over_score() {
        // path 1: low latency, heavily loaded -> lower score
        // path 2: higher latency, idle -> higher score
        let paths = vec![path(1, 10.0, 0.0, 95.0), path(2, 30.0, 0.0, 0.0)];
        assert!(paths[1].score() > paths[0].score());

        let selector = PathSelector::new();
        assert_eq!(selector.select_best_path(&paths, PriorityClass::High), Some(PathId(1)));
        assert_eq!(selector.select_best_path(&paths, PriorityClass::Critical), Some(PathId(1)));
        assert_eq!(selector.select_best_path(&paths, PriorityClass::Normal), Some(PathId(2)));
    }

    #[test]
    fn test_latency_tie_broken_by_loss_then_id() {
        let selector = PathSelector::new();
        let paths = vec![path(1, 20.0, 2.0, 0.0), path(2, 20.0, 1.0, 0.0), path(3, 20.0, 1.0, 0.0)];
        assert_eq!(selector.select_best_path(&paths, PriorityClass::High), Some(PathId(2)));
        assert_eq!(
            selector.rank(&paths, PriorityClass::High),
            vec![PathId(2), PathId(3), PathId(1)]
        );
    }

    #[test]
    fn test_score_tie_broken_by_id() {
        let selector = PathSelector::new();
        let paths = vec![path(9, 20.0, 1.0, 10.0), path(4, 20.0, 1.0, 10.0), path(6, 20.0, 1.0, 10.0)];
        for _ in 0..10 {
            assert_eq!(selector.select_best_path(&paths, PriorityClass::Normal), Some(PathId(4)));
        }
    }

    #[test]
    fn test_unavailable_never_selected() {
        let selector = PathSelector::new();
        let mut best = path(1, 1.0, 0.0, 0.0);
        best.set_available(false);
        let paths = vec![best, path(2, 150.0, 5.0, 50.0)];
        assert_eq!(selector.select_best_path(&paths, PriorityClass::Critical), Some(PathId(2)));
        assert_eq!(selector.rank(&paths, PriorityClass::Normal), vec![PathId(2)]);
    }
}
