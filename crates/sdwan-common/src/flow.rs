//! Network flow identity and priority classes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// IP protocol numbers the classifier knows about
pub mod proto {
    /// ICMP
    pub const ICMP: u8 = 1;
    /// TCP
    pub const TCP: u8 = 6;
    /// UDP
    pub const UDP: u8 = 17;
}

/// 5-tuple flow key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowKey {
    /// Source IP
    pub src_ip: IpAddr,
    /// Destination IP
    pub dst_ip: IpAddr,
    /// IP protocol
    pub protocol: u8,
    /// Source port (0 for port-less protocols)
    pub src_port: u16,
    /// Destination port (0 for port-less protocols)
    pub dst_port: u16,
}

impl FlowKey {
    /// Create new flow key
    pub fn new(
        src_ip: impl Into<IpAddr>,
        dst_ip: impl Into<IpAddr>,
        protocol: u8,
        src_port: u16,
        dst_port: u16,
    ) -> Self {
        Self {
            src_ip: src_ip.into(),
            dst_ip: dst_ip.into(),
            protocol,
            src_port,
            dst_port,
        }
    }

    /// Key for the reply direction
    pub fn reverse(&self) -> Self {
        Self {
            src_ip: self.dst_ip,
            dst_ip: self.src_ip,
            protocol: self.protocol,
            src_port: self.dst_port,
            dst_port: self.src_port,
        }
    }

    /// Deterministic flow identifier
    pub fn flow_id(&self) -> FlowId {
        FlowId(format!(
            "{}:{}->{}:{}:{}",
            self.src_ip, self.src_port, self.dst_ip, self.dst_port, self.protocol
        ))
    }
}

/// Flow identifier derived from the 5-tuple
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(String);

impl FlowId {
    /// String form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&FlowKey> for FlowId {
    fn from(key: &FlowKey) -> Self {
        key.flow_id()
    }
}

impl From<&str> for FlowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Traffic priority tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PriorityClass {
    /// Bulk / best-effort traffic, routed by overall score
    Normal = 0,
    /// Interactive traffic (HTTPS, DNS)
    High = 1,
    /// Control and voice traffic (SSH, SIP)
    Critical = 2,
}

impl PriorityClass {
    /// Numeric rank (0 = normal)
    #[inline(always)]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// High and critical traffic is routed on latency first
    #[inline(always)]
    pub const fn is_latency_sensitive(self) -> bool {
        !matches!(self, Self::Normal)
    }

    /// Map a numeric rank back to a class, saturating at critical
    pub const fn from_rank(rank: u8) -> Self {
        match rank {
            0 => Self::Normal,
            1 => Self::High,
            _ => Self::Critical,
        }
    }
}

impl Default for PriorityClass {
    fn default() -> Self {
        Self::Normal
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::High => f.write_str("high"),
            Self::Critical => f.write_str("critical"),
        }
    }
}
