//! Periodic fetch timers for the two game sources.
//!
//! Each source gets its own timer task. Every tick spawns a fetch and moves
//! on without waiting for it, so fetches may overlap and complete out of
//! order. Results go to the view's inbox tagged with the activation
//! generation; the view applies them in arrival order.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::bridge::{Bridge, BridgeError};

/// Default delay between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Which game list a fetch targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchSource {
    Managed,
    Custom,
}

impl FetchSource {
    pub const ALL: [FetchSource; 2] = [FetchSource::Managed, FetchSource::Custom];
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FetchSource::Managed => "managed games",
            FetchSource::Custom => "custom games",
        })
    }
}

/// A completed fetch on its way to the view
#[derive(Debug)]
pub struct FetchOutcome {
    /// Activation the fetch was issued under
    pub generation: u64,
    pub source: FetchSource,
    /// Tick number within the activation, starting at 1
    pub tick: u64,
    pub result: Result<Value, BridgeError>,
}

/// Running timer tasks. Cancelled on [`PollTimers::cancel`] or drop.
#[derive(Debug)]
pub struct PollTimers {
    handles: Vec<JoinHandle<()>>,
}

impl PollTimers {
    /// Start one timer per source. The first tick fires immediately.
    pub fn start<B: Bridge>(
        bridge: Arc<B>,
        period: Duration,
        generation: u64,
        inbox: UnboundedSender<FetchOutcome>,
    ) -> Self {
        let period = period.max(Duration::from_millis(1));
        let handles = FetchSource::ALL
            .into_iter()
            .map(|source| {
                tokio::spawn(run_timer(
                    Arc::clone(&bridge),
                    source,
                    period,
                    generation,
                    inbox.clone(),
                ))
            })
            .collect();

        tracing::debug!("Started poll timers (generation {}, every {:?})", generation, period);
        Self { handles }
    }

    pub fn is_running(&self) -> bool {
        self.handles.iter().any(|handle| !handle.is_finished())
    }

    pub fn cancel(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        tracing::debug!("Cancelled poll timers");
    }
}

impl Drop for PollTimers {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_timer<B: Bridge>(
    bridge: Arc<B>,
    source: FetchSource,
    period: Duration,
    generation: u64,
    inbox: UnboundedSender<FetchOutcome>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick = 0u64;

    loop {
        ticker.tick().await;
        if inbox.is_closed() {
            tracing::debug!("Inbox closed, stopping {} timer", source);
            break;
        }

        tick += 1;
        let bridge = Arc::clone(&bridge);
        let inbox = inbox.clone();
        tokio::spawn(async move {
            let result = fetch(bridge.as_ref(), source).await;
            let outcome = FetchOutcome {
                generation,
                source,
                tick,
                result,
            };
            if inbox.send(outcome).is_err() {
                tracing::debug!("Discarding late {} response for inactive view", source);
            }
        });
    }
}

async fn fetch<B: Bridge>(bridge: &B, source: FetchSource) -> Result<Value, BridgeError> {
    match source {
        FetchSource::Managed => bridge.fetch_managed_games().await,
        FetchSource::Custom => bridge.fetch_custom_games().await,
    }
}
