//! Broadcast core of the live monitor.
//!
//! This crate holds everything the HTTP and `WebSocket` layers share:
//!
//! - [`event_log`] -- fixed-capacity log buffer with newest-first paging
//! - [`snapshot`] -- bounded random-walk generators for the monitored domains
//! - [`registry`] -- set of open connections and fan-out
//! - [`hub`] -- [`BroadcastHub`], the single owner of the above
//! - [`protocol`] -- inbound `WebSocket` frame handling
//! - [`scheduler`] -- per-channel interval timers driving [`BroadcastHub::tick`]
//! - [`clock`] -- injectable time source
//! - [`config`] -- YAML configuration with environment overrides
//!
//! [`BroadcastHub`]: hub::BroadcastHub
//! [`BroadcastHub::tick`]: hub::BroadcastHub::tick

pub mod clock;
pub mod config;
pub mod event_log;
pub mod hub;
pub mod protocol;
pub mod registry;
pub mod scheduler;
pub mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, MonitorConfig};
pub use event_log::{EventLog, LogPage};
pub use hub::{BroadcastHub, HubStats, TickOutcome};
pub use scheduler::{BroadcastIntervals, SchedulerHandle, spawn_scheduler};
pub use snapshot::SnapshotGenerator;
