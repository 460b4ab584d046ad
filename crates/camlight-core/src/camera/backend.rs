use crate::{CoreError, CoreResult, camera::MediaDevice};

use std::panic::Location;

use error_location::ErrorLocation;
use image::RgbaImage;

/// Which device a capture session should bind to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceConstraint {
    /// Whatever video source the platform picks.
    Default,
    /// Exactly this device id, or fail.
    Exact(String),
}

impl DeviceConstraint {
    /// Build a constraint from an optional saved id. Empty ids mean default.
    pub fn from_device_id(device_id: Option<&str>) -> Self {
        match device_id {
            Some(id) if !id.is_empty() => DeviceConstraint::Exact(id.to_string()),
            _ => DeviceConstraint::Default,
        }
    }
}

/// A live binding to a camera device.
///
/// Sessions own one or more tracks. Dropping a session without calling
/// [`CaptureSession::stop_tracks`] is allowed but the owner is expected to
/// stop tracks explicitly to release the device promptly.
pub trait CaptureSession: Send {
    /// Identifier of the device this session is bound to.
    fn device_id(&self) -> &str;

    /// Frame dimensions once the stream has negotiated them.
    fn frame_size(&self) -> Option<(u32, u32)>;

    /// Most recent full-resolution frame.
    fn latest_frame(&mut self) -> CoreResult<RgbaImage>;

    /// Number of tracks still producing data.
    fn live_tracks(&self) -> usize;

    /// Halt every track. Idempotent.
    fn stop_tracks(&mut self);
}

/// Platform camera capability.
pub trait CameraBackend: Send {
    /// Enumerate media devices in platform order.
    fn enumerate(&mut self) -> CoreResult<Vec<MediaDevice>>;

    /// Acquire a capture session honoring `constraint`.
    fn open(&mut self, constraint: &DeviceConstraint) -> CoreResult<Box<dyn CaptureSession>>;
}

/// Backend for builds without camera support.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedBackend;

impl CameraBackend for UnsupportedBackend {
    #[track_caller]
    fn enumerate(&mut self) -> CoreResult<Vec<MediaDevice>> {
        Err(CoreError::CapabilityUnsupported {
            capability: "Camera enumeration".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    fn open(&mut self, _constraint: &DeviceConstraint) -> CoreResult<Box<dyn CaptureSession>> {
        Err(CoreError::CapabilityUnsupported {
            capability: "Camera capture".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
