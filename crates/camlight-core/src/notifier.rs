//! Transient user-facing status messages.

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

/// How long a notification stays displayed.
pub const NOTIFICATION_LIFETIME: Duration = Duration::from_millis(5000);

/// Capacity of the live notification feed. Slow subscribers miss messages.
const FEED_CAPACITY: usize = 64;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Neutral status.
    Info,
    /// An operation succeeded.
    Ok,
    /// An operation failed.
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationKind::Info => "info",
            NotificationKind::Ok => "ok",
            NotificationKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// A transient message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Identity used to expire this exact message.
    pub id: Uuid,
    /// Message text.
    pub text: String,
    /// Severity.
    pub kind: NotificationKind,
}

/// Display list of transient messages, newest first.
///
/// Cheap to clone; every clone shares the same list. Each message is
/// removed [`NOTIFICATION_LIFETIME`] after it was added, independently of
/// the others. Expiry timers need a running tokio runtime; without one
/// messages stay until [`Notifier::clear`].
#[derive(Clone)]
pub struct Notifier {
    entries: Arc<Mutex<VecDeque<Notification>>>,
    feed: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            feed,
        }
    }

    /// Show `text` and schedule its removal.
    pub fn notify(&self, text: impl Into<String>, kind: NotificationKind) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            text: text.into(),
            kind,
        };
        let id = notification.id;

        match kind {
            NotificationKind::Info | NotificationKind::Ok => {
                info!(kind = %kind, text = %notification.text, "Notification")
            }
            NotificationKind::Error => {
                warn!(kind = %kind, text = %notification.text, "Notification")
            }
        }

        self.lock().push_front(notification.clone());
        // No subscribers is not an error.
        let _ = self.feed.send(notification);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let entries = Arc::clone(&self.entries);
                handle.spawn(async move {
                    tokio::time::sleep(NOTIFICATION_LIFETIME).await;
                    let mut guard = entries.lock().unwrap_or_else(|e| e.into_inner());
                    guard.retain(|n| n.id != id);
                });
            }
            Err(_) => warn!(id = %id, "No runtime available, notification will not expire"),
        }

        id
    }

    /// Messages currently displayed, newest first.
    pub fn active(&self) -> Vec<Notification> {
        self.lock().iter().cloned().collect()
    }

    /// Receive every notification emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.feed.subscribe()
    }

    /// Drop every displayed message.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.entries.lock().unwrap_or_else(|e| {
            error!("Notification list lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}
