//! CamLight Core Library
//!
//! Samples a live camera feed, averages each frame into a single color and
//! relays that color to a remote lighting service.
//!
//! # Example
//!
//! ```no_run
//! use camlight_core::{
//!     Color, Dispatcher, HttpColorSink, Notifier, Sampler, StreamManager, UnsupportedBackend,
//! };
//!
//! use std::sync::Arc;
//!
//! use tokio::sync::watch;
//!
//! # async fn run() -> camlight_core::CoreResult<()> {
//! let notifier = Notifier::new();
//! let (color_tx, color_rx) = watch::channel(Color::default());
//!
//! let mut streams = StreamManager::new(UnsupportedBackend, notifier.clone());
//! streams.start(None);
//!
//! let mut sampler = Sampler::new(streams.slot(), Arc::new(color_tx));
//! sampler.start();
//!
//! let sink = Arc::new(HttpColorSink::new("http://localhost:8080")?);
//! let dispatcher = Dispatcher::new(sink, color_rx, notifier);
//! dispatcher.send_color().await;
//! # Ok(())
//! # }
//! ```

mod camera;
mod color;
mod dispatch;
mod error;
mod notifier;
mod prefs;
mod sampler;
mod schedule;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use {
    camera::{
        CameraBackend, CameraDevice, CaptureSession, DeviceConstraint, DeviceKind, MediaDevice,
        SessionSlot, StreamManager, StreamState, UnsupportedBackend, list_cameras,
    },
    color::{Color, average_rgb},
    dispatch::{
        AUTO_SEND_PERIOD, COLOR_PATH, ColorSink, Dispatcher, HttpColorSink, SinkResponse,
        describe_response,
    },
    error::{CameraErrorKind, CoreError, Result as CoreResult},
    notifier::{NOTIFICATION_LIFETIME, Notification, NotificationKind, Notifier},
    prefs::{AUTO_MODE_KEY, CAMERA_DEVICE_KEY, KeyValueStore, MemoryStore, Preferences},
    sampler::{SAMPLE_PERIOD, SAMPLE_WIDTH, Sampler, sample_once},
    schedule::PeriodicTask,
};

#[cfg(feature = "webcam")]
pub use camera::WebcamBackend;

#[cfg(test)]
mod tests;
