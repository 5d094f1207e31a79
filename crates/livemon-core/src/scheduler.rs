//! Periodic broadcast timers.
//!
//! [`spawn_scheduler`] starts one Tokio task per [`Channel`]. Each task
//! waits on its own [`tokio::time::interval`] and calls
//! [`BroadcastHub::tick`]; channels never wait on each other, so their
//! broadcasts interleave freely. The first tick fires one full interval
//! after startup, not immediately.

use std::sync::Arc;
use std::time::Duration;

use livemon_types::Channel;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::config::BroadcastConfig;
use crate::hub::BroadcastHub;

/// Interval per broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastIntervals {
    /// Sovereignty channel.
    pub sovereignty: Duration,
    /// Wallet channel.
    pub wallet: Duration,
    /// Nodes channel.
    pub nodes: Duration,
    /// Logs channel.
    pub logs: Duration,
}

impl BroadcastIntervals {
    /// Interval configured for `channel`.
    pub const fn for_channel(&self, channel: Channel) -> Duration {
        match channel {
            Channel::Sovereignty => self.sovereignty,
            Channel::Wallet => self.wallet,
            Channel::Nodes => self.nodes,
            Channel::Logs => self.logs,
        }
    }
}

impl From<&BroadcastConfig> for BroadcastIntervals {
    fn from(config: &BroadcastConfig) -> Self {
        Self {
            sovereignty: config.sovereignty(),
            wallet: config.wallet(),
            nodes: config.nodes(),
            logs: config.logs(),
        }
    }
}

impl Default for BroadcastIntervals {
    fn default() -> Self {
        Self::from(&BroadcastConfig::default())
    }
}

/// Handles to the running timer tasks.
#[derive(Debug)]
pub struct SchedulerHandle {
    tasks: Vec<(Channel, JoinHandle<()>)>,
}

impl SchedulerHandle {
    /// Stop every timer.
    pub fn shutdown(self) {
        for (channel, task) in self.tasks {
            task.abort();
            info!(%channel, "Broadcast timer stopped");
        }
    }
}

/// Start one timer task per channel.
pub fn spawn_scheduler(hub: &Arc<BroadcastHub>, intervals: BroadcastIntervals) -> SchedulerHandle {
    let tasks = Channel::ALL
        .iter()
        .map(|channel| {
            let channel = *channel;
            let period = intervals.for_channel(channel);
            let task = tokio::spawn(run_channel(Arc::clone(&hub), channel, period));
            let interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
            info!(%channel, interval_ms, "Broadcast timer started");
            (channel, task)
        })
        .collect();

    SchedulerHandle { tasks }
}

async fn run_channel(hub: Arc<BroadcastHub>, channel: Channel, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        hub.tick(channel).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn intervals_follow_config() {
        let config = BroadcastConfig {
            sovereignty_ms: 10,
            wallet_ms: 20,
            nodes_ms: 30,
            logs_ms: 40,
        };
        let intervals = BroadcastIntervals::from(&config);
        assert_eq!(intervals.for_channel(Channel::Sovereignty), Duration::from_millis(10));
        assert_eq!(intervals.for_channel(Channel::Logs), Duration::from_millis(40));
    }

    #[tokio::test]
    async fn timers_deliver_to_connected_clients() {
        let hub = Arc::new(BroadcastHub::new(100));
        let (_, mut rx) = hub.connect().await;
        let greeting = rx.recv().await;
        assert!(greeting.is_some());

        let fast = Duration::from_millis(10);
        let handle = spawn_scheduler(
            &hub,
            BroadcastIntervals {
                sovereignty: fast,
                wallet: fast,
                nodes: fast,
                logs: fast,
            },
        );
        let channels: Vec<Channel> = handle.tasks.iter().map(|(channel, _)| *channel).collect();
        assert_eq!(channels, Channel::ALL);

        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(matches!(frame, Ok(Some(_))));

        handle.shutdown();
    }
}
