use crate::{Notifier, NotificationKind};

use tracing::{debug, instrument};

/// A camera input device as reported by the platform.
///
/// The label may be empty until capture permission has been granted, so
/// renderers should go through [`CameraDevice::display_label`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Opaque platform identifier.
    pub id: String,
    /// Human readable name, possibly empty.
    pub label: String,
}

impl CameraDevice {
    /// Label to render for the device at zero-based `position` in a listing.
    pub fn display_label(&self, position: usize) -> String {
        if self.label.is_empty() {
            format!("Camera {}", position + 1)
        } else {
            self.label.clone()
        }
    }
}

/// Kind of media device reported by enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Camera or other video capture source.
    VideoInput,
    /// Microphone.
    AudioInput,
    /// Speaker or other audio sink.
    AudioOutput,
}

/// One entry of a platform device enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDevice {
    /// What the device does.
    pub kind: DeviceKind,
    /// Identity and label.
    pub device: CameraDevice,
}

/// List video capture devices in platform order.
///
/// Never fails: an unsupported or failing enumeration is reported through
/// the notifier and yields an empty list.
#[instrument(skip(backend, notifier))]
pub fn list_cameras<B: crate::CameraBackend + ?Sized>(
    backend: &mut B,
    notifier: &Notifier,
) -> Vec<CameraDevice> {
    match backend.enumerate() {
        Ok(devices) => {
            let cameras: Vec<CameraDevice> = devices
                .into_iter()
                .filter(|d| d.kind == DeviceKind::VideoInput)
                .map(|d| d.device)
                .collect();
            debug!(camera_count = cameras.len(), "Cameras enumerated");
            cameras
        }
        Err(e) => {
            notifier.notify(e.user_message(), NotificationKind::Error);
            Vec::new()
        }
    }
}
