//! Flow tracking for the SD-WAN engine
//!
//! - [`FlowRegistry`]: every active 5-tuple flow, its priority class and the
//!   path it is currently steered on; idle flows are aged out in batches
//! - [`PriorityClassifier`]: well-known-port mapping used when the packet
//!   source gives no priority hint

#![warn(missing_docs)]

pub mod classify;
pub mod registry;

pub use classify::PriorityClassifier;
pub use registry::{Evicted, FlowEntry, FlowRegistry, RoutedFlow};

use std::time::Duration;

/// Idle window after which a flow is evicted
pub const DEFAULT_FLOW_IDLE_TIMEOUT: Duration = Duration::from_secs(120);
