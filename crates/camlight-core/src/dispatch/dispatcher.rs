//! Single-shot and repeating color delivery.
//!
//! Every send resolves into exactly one notification, whatever happens.

use crate::{
    Color, CoreResult, NotificationKind, Notifier, PeriodicTask,
    dispatch::{ColorSink, SinkResponse},
};

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, instrument};

/// Time between two sends in auto mode.
pub const AUTO_SEND_PERIOD: Duration = Duration::from_millis(3000);

const NOT_CONFIGURED_MESSAGE: &str = "Bulb IP not configured. Set shelly.ip or SHELLY_IP.";
const INVALID_PAYLOAD_MESSAGE: &str = "Invalid color payload";

/// Sends the current color to a [`ColorSink`].
pub struct Dispatcher<S: ColorSink> {
    sink: Arc<S>,
    color_rx: watch::Receiver<Color>,
    notifier: Notifier,
    auto: PeriodicTask,
}

impl<S: ColorSink> Dispatcher<S> {
    /// Create a dispatcher reading the current color from `color_rx`.
    pub fn new(sink: Arc<S>, color_rx: watch::Receiver<Color>, notifier: Notifier) -> Self {
        Self {
            sink,
            color_rx,
            notifier,
            auto: PeriodicTask::new("auto-send"),
        }
    }

    /// Color that would be sent right now.
    pub fn current_color(&self) -> Color {
        *self.color_rx.borrow()
    }

    /// Send the current color once and report the outcome.
    pub async fn send_color(&self) -> NotificationKind {
        deliver(Arc::clone(&self.sink), self.current_color(), self.notifier.clone()).await
    }

    /// Send the current color once without waiting for the response.
    ///
    /// The outcome still lands in the notifier; the handle resolves to its kind.
    pub fn spawn_send(&self) -> JoinHandle<NotificationKind> {
        tokio::spawn(deliver(
            Arc::clone(&self.sink),
            self.current_color(),
            self.notifier.clone(),
        ))
    }

    /// Start repeating sends, replacing any running repetition.
    ///
    /// Each tick sends whatever the current color is at that moment. Sends
    /// run detached so a slow response never delays later ticks.
    #[instrument(skip(self))]
    pub fn start_auto(&mut self) {
        let sink = Arc::clone(&self.sink);
        let color_rx = self.color_rx.clone();
        let notifier = self.notifier.clone();

        self.auto.restart(AUTO_SEND_PERIOD, move || {
            let color = *color_rx.borrow();
            tokio::spawn(deliver(Arc::clone(&sink), color, notifier.clone()));
            std::future::ready(())
        });
    }

    /// Stop repeating sends. Idempotent.
    pub fn stop_auto(&mut self) {
        self.auto.cancel();
    }

    /// Whether auto mode is running.
    pub fn is_auto_running(&self) -> bool {
        self.auto.is_running()
    }
}

async fn deliver<S: ColorSink>(sink: Arc<S>, color: Color, notifier: Notifier) -> NotificationKind {
    let outcome: CoreResult<SinkResponse> = sink.post_color(color).await;

    let (text, kind) = match outcome {
        Ok(response) => describe_response(color, &response),
        Err(e) => {
            error!(error = ?e, "Color request failed");
            (
                format!("Request failed: {}", e.user_message()),
                NotificationKind::Error,
            )
        }
    };

    notifier.notify(text, kind);
    kind
}

/// Map a service response to the notification it produces.
pub fn describe_response(color: Color, response: &SinkResponse) -> (String, NotificationKind) {
    let message = response.message.clone();

    match response.status {
        200..=299 => (format!("Sent color {}", color), NotificationKind::Ok),
        503 => (
            message.unwrap_or_else(|| NOT_CONFIGURED_MESSAGE.to_string()),
            NotificationKind::Error,
        ),
        400 => (
            message.unwrap_or_else(|| INVALID_PAYLOAD_MESSAGE.to_string()),
            NotificationKind::Error,
        ),
        status => (
            message.unwrap_or_else(|| format!("Network error ({})", status)),
            NotificationKind::Error,
        ),
    }
}
