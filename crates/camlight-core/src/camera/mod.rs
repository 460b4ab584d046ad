mod backend;
mod device;
mod stream;
#[cfg(feature = "webcam")]
mod webcam;

pub use {
    backend::{CameraBackend, CaptureSession, DeviceConstraint, UnsupportedBackend},
    device::{CameraDevice, DeviceKind, MediaDevice, list_cameras},
    stream::{SessionSlot, StreamManager, StreamState},
};

#[cfg(feature = "webcam")]
pub use webcam::WebcamBackend;
