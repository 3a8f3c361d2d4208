//! Controller Configuration

use sdwan_common::{PathGroup, PathId, PriorityClass, SdwanError, SdwanResult};
use sdwan_flow::PriorityClassifier;
use sdwan_path::DEFAULT_BANDWIDTH_TOTAL_MBPS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Metric refresh period (seconds)
    pub refresh_interval_secs: u64,
    /// Optimization pass period (seconds)
    pub optimize_interval_secs: u64,
    /// Flow inactivity window before eviction (seconds)
    pub flow_idle_timeout_secs: u64,
    /// Idle timeout put on installed forwarding rules (seconds)
    pub rule_idle_timeout_secs: u64,
    /// Age after which a silent path is taken out of service (seconds)
    pub path_stale_after_secs: Option<u64>,
    /// Capacity assumed for undeclared paths (Mbps)
    pub default_bandwidth_total_mbps: f64,
    /// Local API listen address
    pub api_listen: String,
    /// Port → priority class table
    pub priority_ports: BTreeMap<u16, PriorityClass>,
    /// Declared path groups
    pub groups: Vec<PathGroupConfig>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 10,
            optimize_interval_secs: 30,
            flow_idle_timeout_secs: 120,
            rule_idle_timeout_secs: 60,
            path_stale_after_secs: None,
            default_bandwidth_total_mbps: DEFAULT_BANDWIDTH_TOTAL_MBPS,
            api_listen: "0.0.0.0:8080".into(),
            priority_ports: PriorityClassifier::default_ports(),
            groups: Vec::new(),
        }
    }
}

impl ControllerConfig {
    /// Load from file
    pub fn load(path: &str) -> SdwanResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| SdwanError::Config(format!("{}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to file
    pub fn save(&self, path: &str) -> SdwanResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SdwanError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the scheduler cannot run with
    pub fn validate(&self) -> SdwanResult<()> {
        if self.refresh_interval_secs == 0 || self.optimize_interval_secs == 0 {
            return Err(SdwanError::Config("intervals must be at least 1s".into()));
        }
        if self.default_bandwidth_total_mbps <= 0.0 {
            return Err(SdwanError::Config("default bandwidth must be positive".into()));
        }
        for group in &self.groups {
            if let Some(path) = group.paths.iter().find(|p| p.bandwidth_total_mbps <= 0.0) {
                return Err(SdwanError::Config(format!(
                    "path {} in group {} has non-positive capacity",
                    path.id, group.key
                )));
            }
        }
        Ok(())
    }

    /// Group serving traffic that enters at `dpid`
    ///
    /// Falls back to the datapath's own group when no declared group lists it
    /// as ingress.
    pub fn group_for_ingress(&self, dpid: u64) -> PathGroup {
        self.groups
            .iter()
            .find(|g| g.ingress.contains(&dpid))
            .map(|g| PathGroup::new(g.key.clone()))
            .unwrap_or_else(|| PathGroup::for_datapath(dpid))
    }

    /// Declared (group, path, capacity) triples
    pub fn declared_paths(&self) -> impl Iterator<Item = (PathGroup, PathId, f64)> + '_ {
        self.groups.iter().flat_map(|g| {
            g.paths
                .iter()
                .map(move |p| (PathGroup::new(g.key.clone()), PathId(p.id), p.bandwidth_total_mbps))
        })
    }

    /// Metric refresh period
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Optimization pass period
    pub fn optimize_interval(&self) -> Duration {
        Duration::from_secs(self.optimize_interval_secs)
    }

    /// Flow inactivity window
    pub fn flow_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.flow_idle_timeout_secs)
    }

    /// Forwarding-rule idle timeout
    pub fn rule_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.rule_idle_timeout_secs)
    }

    /// Path staleness threshold, if enabled
    pub fn path_stale_after(&self) -> Option<Duration> {
        self.path_stale_after_secs.map(Duration::from_secs)
    }
}

/// A set of redundant paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGroupConfig {
    /// Group key, as reported in snapshots
    pub key: String,
    /// Datapaths whose traffic this group carries
    #[serde(default)]
    pub ingress: Vec<u64>,
    /// Member paths
    #[serde(default)]
    pub paths: Vec<PathConfig>,
}

/// One member path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Path id (datapath or link id)
    pub id: u64,
    /// Capacity (Mbps)
    #[serde(default = "default_capacity")]
    pub bandwidth_total_mbps: f64,
}

fn default_capacity() -> f64 {
    DEFAULT_BANDWIDTH_TOTAL_MBPS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_site_config() -> ControllerConfig {
        serde_json::from_str(
            r#"{
                "refresh_interval_secs": 5,
                "path_stale_after_secs": 60,
                "groups": [
                    {
                        "key": "site1->site2",
                        "ingress": [1],
                        "paths": [
                            { "id": 3, "bandwidth_total_mbps": 1000 },
                            { "id": 4 }
                        ]
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = two_site_config();
        assert_eq!(config.refresh_interval(), Duration::from_secs(5));
        assert_eq!(config.optimize_interval(), Duration::from_secs(30));
        assert_eq!(config.flow_idle_timeout(), Duration::from_secs(120));
        assert_eq!(config.path_stale_after(), Some(Duration::from_secs(60)));
        assert_eq!(config.priority_ports.get(&22), Some(&PriorityClass::Critical));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_group_for_ingress() {
        let config = two_site_config();
        assert_eq!(config.group_for_ingress(1), PathGroup::from("site1->site2"));
        assert_eq!(config.group_for_ingress(9), PathGroup::for_datapath(9));
    }

    #[test]
    fn test_declared_paths() {
        let declared: Vec<_> = two_site_config().declared_paths().collect();
        assert_eq!(
            declared,
            vec![
                (PathGroup::from("site1->site2"), PathId(3), 1000.0),
                (PathGroup::from("site1->site2"), PathId(4), 100.0),
            ]
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ControllerConfig {
            optimize_interval_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SdwanError::Config(_))));

        let mut config = two_site_config();
        config.groups[0].paths[1].bandwidth_total_mbps = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ControllerConfig::load("/nonexistent/sdwan/controller.json").unwrap_err();
        assert!(matches!(err, SdwanError::Io(_)));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("sdwan-config-{}.json", std::process::id()));
        let path = path.to_string_lossy().to_string();

        let config = two_site_config();
        tokio_test::assert_ok!(config.save(&path));
        let loaded = tokio_test::assert_ok!(ControllerConfig::load(&path));
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }
}
