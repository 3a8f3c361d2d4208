//! Port-based priority classification

use sdwan_common::{proto, FlowKey, PriorityClass};
use std::collections::BTreeMap;

/// Maps well-known ports to priority classes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityClassifier {
    ports: BTreeMap<u16, PriorityClass>,
}

impl PriorityClassifier {
    /// Classifier over an explicit port table
    pub fn new(ports: BTreeMap<u16, PriorityClass>) -> Self {
        Self { ports }
    }

    /// SSH and SIP critical, HTTPS and DNS high, HTTP normal
    pub fn default_ports() -> BTreeMap<u16, PriorityClass> {
        BTreeMap::from([
            (22, PriorityClass::Critical),
            (443, PriorityClass::High),
            (53, PriorityClass::High),
            (5060, PriorityClass::Critical),
            (80, PriorityClass::Normal),
        ])
    }

    /// Class of a flow: destination port first, then source port
    ///
    /// Only TCP and UDP carry ports; everything else is normal.
    pub fn classify(&self, key: &FlowKey) -> PriorityClass {
        if key.protocol != proto::TCP && key.protocol != proto::UDP {
            return PriorityClass::Normal;
        }
        self.ports
            .get(&key.dst_port)
            .or_else(|| self.ports.get(&key.src_port))
            .copied()
            .unwrap_or_default()
    }
}

impl Default for PriorityClassifier {
    fn default() -> Self {
        Self::new(Self::default_ports())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn key(protocol: u8, src_port: u16, dst_port: u16) -> FlowKey {
        FlowKey::new(Ipv4Addr::new(10, 1, 0, 1), Ipv4Addr::new(10, 2, 0, 1), protocol, src_port, dst_port)
    }

    #[test]
    fn test_well_known_ports() {
        let c = PriorityClassifier::default();
        assert_eq!(c.classify(&key(proto::TCP, 50000, 22)), PriorityClass::Critical);
        assert_eq!(c.classify(&key(proto::UDP, 50000, 5060)), PriorityClass::Critical);
        assert_eq!(c.classify(&key(proto::TCP, 50000, 443)), PriorityClass::High);
        assert_eq!(c.classify(&key(proto::UDP, 50000, 53)), PriorityClass::High);
        assert_eq!(c.classify(&key(proto::TCP, 50000, 80)), PriorityClass::Normal);
        assert_eq!(c.classify(&key(proto::TCP, 50000, 8080)), PriorityClass::Normal);
    }

    #[test]
    fn test_reply_direction_uses_source_port() {
        let c = PriorityClassifier::default();
        assert_eq!(c.classify(&key(proto::TCP, 22, 50000)), PriorityClass::Critical);
    }

    #[test]
    fn test_destination_port_wins() {
        let c = PriorityClassifier::default();
        // 443 -> 22: destination decides
        assert_eq!(c.classify(&key(proto::TCP, 443, 22)), PriorityClass::Critical);
        assert_eq!(c.classify(&key(proto::TCP, 22, 80)), PriorityClass::Normal);
    }

    #[test]
    fn test_portless_protocols_are_normal() {
        let c = PriorityClassifier::default();
        assert_eq!(c.classify(&key(proto::ICMP, 0, 22)), PriorityClass::Normal);
    }
}
