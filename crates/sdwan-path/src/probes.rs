//! Metric sources for the periodic refresh

use crate::health::MetricSample;
use async_trait::async_trait;
use dashmap::DashMap;
use sdwan_common::{PathGroup, PathId, SdwanResult};
use std::collections::VecDeque;

/// Producer of path measurements
///
/// The refresh task asks the source once per known path and cycle. The
/// production implementation wraps the probing agent; `Ok(None)` means "no
/// new measurement this cycle".
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Next sample for `path` in `group`
    async fn sample(&self, group: &PathGroup, path: PathId) -> SdwanResult<Option<MetricSample>>;
}

/// Key for queued samples
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleKey {
    /// Path group
    pub group: PathGroup,
    /// Path
    pub path: PathId,
}

/// FIFO of injected samples per path
///
/// Each refresh cycle pops at most one sample per path, so a test can script
/// exactly what the engine sees cycle by cycle.
#[derive(Debug, Default)]
pub struct SampleQueue {
    queues: DashMap<SampleKey, VecDeque<MetricSample>>,
}

impl SampleQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sample for `path` in `group`
    pub fn push(&self, group: &PathGroup, path: PathId, sample: MetricSample) {
        let key = SampleKey {
            group: group.clone(),
            path,
        };
        self.queues.entry(key).or_default().push_back(sample);
    }

    /// Number of samples waiting for `path` in `group`
    pub fn pending(&self, group: &PathGroup, path: PathId) -> usize {
        let key = SampleKey {
            group: group.clone(),
            path,
        };
        self.queues.get(&key).map(|q| q.len()).unwrap_or(0)
    }

    fn pop(&self, group: &PathGroup, path: PathId) -> Option<MetricSample> {
        let key = SampleKey {
            group: group.clone(),
            path,
        };
        self.queues.get_mut(&key).and_then(|mut q| q.pop_front())
    }
}

#[async_trait]
impl MetricSource for SampleQueue {
    async fn sample(&self, group: &PathGroup, path: PathId) -> SdwanResult<Option<MetricSample>> {
        Ok(self.pop(group, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_is_fifo_per_path() {
        let queue = SampleQueue::new();
        let g = PathGroup::from("site-a");

        queue.push(&g, PathId(1), MetricSample::new().latency(10.0));
        queue.push(&g, PathId(1), MetricSample::new().latency(20.0));
        queue.push(&g, PathId(2), MetricSample::new().latency(99.0));
        assert_eq!(queue.pending(&g, PathId(1)), 2);

        let first = queue.sample(&g, PathId(1)).await.unwrap();
        assert_eq!(first.and_then(|s| s.latency_ms), Some(10.0));
        let second = queue.sample(&g, PathId(1)).await.unwrap();
        assert_eq!(second.and_then(|s| s.latency_ms), Some(20.0));
        assert!(queue.sample(&g, PathId(1)).await.unwrap().is_none());

        assert_eq!(queue.pending(&g, PathId(2)), 1);
        assert!(queue.sample(&"other".into(), PathId(2)).await.unwrap().is_none());
    }
}
