//! SD-WAN Controller - Overlay Control Engine
//!
//! Steers flows over redundant WAN paths using live path health.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      SD-WAN CONTROLLER                           │
//! │                                                                  │
//! │   switch events ──▶ ControllerEvents ──▶ ForwardingDecision      │
//! │                           │                                      │
//! │          ┌────────────────┼─────────────────┐                    │
//! │          ▼                ▼                 ▼                    │
//! │     PathTable  ──▶  FlowRegistry     FailoverCoordinator         │
//! │   (health/score)   (active flows)    (mark + reselect)           │
//! │          ▲                ▲                                      │
//! │          └──── MaintenanceScheduler ────┘                        │
//! │             refresh 10s | optimize 30s                           │
//! │                                                                  │
//! │   StatsAggregator ──▶ /stats /metrics /failovers                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod engine;
pub mod events;
pub mod failover;
pub mod ports;
pub mod scheduler;
pub mod state;
pub mod stats;

pub use config::ControllerConfig;
pub use engine::Controller;
pub use events::{ControllerEvents, FlowRule, FlowStat, ForwardingDecision, PortStat};
pub use failover::{FailoverCoordinator, FailoverEvent, FailoverTrigger};
pub use scheduler::{MaintenanceScheduler, OptimizeReport, RefreshReport};
pub use stats::{ControllerSummary, Snapshot, StatsAggregator};
