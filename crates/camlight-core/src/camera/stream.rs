//! Capture session lifecycle.
//!
//! [`StreamManager`] is the only component allowed to install or remove the
//! active session. Everything else reads through a cloned [`SessionSlot`].

use crate::{
    CoreError, NotificationKind, Notifier,
    camera::{CameraBackend, CameraDevice, CaptureSession, DeviceConstraint, list_cameras},
};

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{error, info, instrument};
use uuid::Uuid;

/// The active capture session plus its log correlation id.
pub(crate) struct StreamHandle {
    session_id: Uuid,
    session: Box<dyn CaptureSession>,
}

impl StreamHandle {
    fn stop(&mut self) {
        self.session.stop_tracks();
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if self.session.live_tracks() > 0 {
            self.session.stop_tracks();
        }
    }
}

/// Shared reference to whichever capture session is currently active.
#[derive(Clone, Default)]
pub struct SessionSlot {
    inner: Arc<Mutex<Option<StreamHandle>>>,
}

impl SessionSlot {
    /// Whether a session is currently installed.
    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// Run `f` against the active session, if any.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut dyn CaptureSession) -> R) -> Option<R> {
        let mut guard = self.lock();
        guard.as_mut().map(|handle| f(handle.session.as_mut()))
    }

    fn install(&self, handle: StreamHandle) {
        *self.lock() = Some(handle);
    }

    fn take(&self) -> Option<StreamHandle> {
        self.lock().take()
    }

    fn lock(&self) -> MutexGuard<'_, Option<StreamHandle>> {
        // The slot only holds an Option so a poisoned guard is still consistent.
        self.inner.lock().unwrap_or_else(|e| {
            error!("Session slot lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}

/// Observable state of the stream manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamState {
    /// No session is held.
    Idle,
    /// A session is bound to a device.
    Active {
        /// Log correlation id of the session.
        session_id: Uuid,
        /// Device the session is bound to.
        device_id: String,
    },
}

/// Owns the capture session lifecycle and the last known device list.
pub struct StreamManager<B: CameraBackend> {
    backend: B,
    slot: SessionSlot,
    devices: Vec<CameraDevice>,
    selected: Option<String>,
    notifier: Notifier,
}

impl<B: CameraBackend> StreamManager<B> {
    /// Create an idle manager over `backend`.
    pub fn new(backend: B, notifier: Notifier) -> Self {
        Self {
            backend,
            slot: SessionSlot::default(),
            devices: Vec::new(),
            selected: None,
            notifier,
        }
    }

    /// Handle for readers of the active session.
    pub fn slot(&self) -> SessionSlot {
        self.slot.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.slot
            .lock()
            .as_ref()
            .map_or(StreamState::Idle, |handle| StreamState::Active {
                session_id: handle.session_id,
                device_id: handle.session.device_id().to_string(),
            })
    }

    /// Devices seen by the most recent enumeration.
    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    /// Device marked selected in the device list.
    pub fn selected_device_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Access the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Re-run enumeration and replace the cached device list.
    pub fn refresh_devices(&mut self) -> &[CameraDevice] {
        self.devices = list_cameras(&mut self.backend, &self.notifier);
        &self.devices
    }

    /// Replace any active session with a new one bound to `device_id`.
    ///
    /// The previous session's tracks are always stopped before the new one
    /// is requested. On failure the manager is left idle and an error
    /// notification is emitted. Returns whether a session is now active.
    #[instrument(skip(self))]
    pub fn start(&mut self, device_id: Option<&str>) -> bool {
        self.stop();

        let constraint = DeviceConstraint::from_device_id(device_id);

        match self.backend.open(&constraint) {
            Ok(session) => {
                let session_id = Uuid::new_v4();
                let bound_id = session.device_id().to_string();
                self.slot.install(StreamHandle {
                    session_id,
                    session,
                });

                info!(session_id = %session_id, device_id = %bound_id, "Capture session started");

                // Permission may have unlocked real labels.
                self.refresh_devices();
                self.selected = match constraint {
                    DeviceConstraint::Exact(id) => Some(id),
                    DeviceConstraint::Default => Some(bound_id),
                };

                true
            }
            Err(e) => {
                let text = match &e {
                    CoreError::Camera { kind, reason, .. } => {
                        format!("Camera error: {} {}", kind, reason)
                    }
                    other => format!("Camera error: {}", other.user_message()),
                };
                error!(error = ?e, "Failed to start capture session");
                self.notifier.notify(text, NotificationKind::Error);
                false
            }
        }
    }

    /// Stop and release the active session, if any. Idempotent.
    #[instrument(skip(self))]
    pub fn stop(&mut self) {
        if let Some(mut handle) = self.slot.take() {
            handle.stop();
            info!(session_id = %handle.session_id, "Capture session stopped");
        }
    }
}
