use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::debug;

/// A repeating task with replace-not-stack restart semantics.
///
/// At most one schedule is live per `PeriodicTask`. The first tick fires one
/// full period after (re)start. Ticks of one schedule never overlap since
/// each tick is awaited before the next is taken.
pub struct PeriodicTask {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Create a stopped task. `name` only labels log lines.
    pub fn new(name: &'static str) -> Self {
        Self { name, handle: None }
    }

    /// Cancel any running schedule and start a new one calling `tick` every
    /// `period`. Must be called within a tokio runtime.
    pub fn restart<F, Fut>(&mut self, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick().await;
            }
        });

        self.handle = Some(handle);
        debug!(task = self.name, period_ms = period.as_millis(), "Periodic task started");
    }

    /// Cancel the running schedule, if any. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!(task = self.name, "Periodic task cancelled");
        }
    }

    /// Whether a schedule is live.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
