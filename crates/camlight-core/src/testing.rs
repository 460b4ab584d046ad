//! In-process fakes for the camera and color service seams.

use crate::{
    CameraBackend, CameraDevice, CaptureSession, Color, ColorSink, CoreError, CoreResult,
    DeviceConstraint, DeviceKind, MediaDevice, SinkResponse, error::CameraErrorKind,
};

use std::{
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use error_location::ErrorLocation;
use image::{Rgba, RgbaImage};

/// Tracks each fake session owns.
pub const FAKE_TRACKS_PER_SESSION: usize = 2;

#[derive(Default)]
struct FakeCameraState {
    devices: Vec<MediaDevice>,
    opened: Vec<DeviceConstraint>,
    sessions: Vec<Arc<AtomicUsize>>,
    frame: Option<RgbaImage>,
    frame_error: bool,
    fail_open: Option<CameraErrorKind>,
}

/// Scriptable camera backend. Clones share state.
#[derive(Clone, Default)]
pub struct FakeCameraBackend {
    state: Arc<Mutex<FakeCameraState>>,
}

impl FakeCameraBackend {
    /// Backend reporting these `(id, label)` cameras.
    pub fn with_cameras(cameras: &[(&str, &str)]) -> Self {
        let backend = Self::default();
        backend.lock().devices = cameras
            .iter()
            .map(|(id, label)| MediaDevice {
                kind: DeviceKind::VideoInput,
                device: CameraDevice {
                    id: id.to_string(),
                    label: label.to_string(),
                },
            })
            .collect();
        backend
    }

    /// Also report a non-video device.
    pub fn add_device(&self, kind: DeviceKind, id: &str, label: &str) {
        self.lock().devices.push(MediaDevice {
            kind,
            device: CameraDevice {
                id: id.to_string(),
                label: label.to_string(),
            },
        });
    }

    /// Serve a solid frame of `size` filled with `(r, g, b)`.
    pub fn set_solid_frame(&self, size: (u32, u32), rgb: (u8, u8, u8)) {
        let frame = RgbaImage::from_pixel(size.0, size.1, Rgba([rgb.0, rgb.1, rgb.2, 255]));
        self.set_frame(frame);
    }

    /// Serve `frame` as the latest captured image.
    pub fn set_frame(&self, frame: RgbaImage) {
        self.lock().frame = Some(frame);
    }

    /// Stop serving frames, as if dimensions were not negotiated yet.
    pub fn clear_frame(&self) {
        self.lock().frame = None;
    }

    /// Make frame reads fail while dimensions are still reported.
    pub fn set_frame_error(&self, failing: bool) {
        self.lock().frame_error = failing;
    }

    /// Make every following open fail with `kind`.
    pub fn fail_opens(&self, kind: Option<CameraErrorKind>) {
        self.lock().fail_open = kind;
    }

    /// Constraints passed to `open`, in call order.
    pub fn opened(&self) -> Vec<DeviceConstraint> {
        self.lock().opened.clone()
    }

    /// Live track count of every session ever opened, in open order.
    pub fn session_live_tracks(&self) -> Vec<usize> {
        self.lock()
            .sessions
            .iter()
            .map(|live| live.load(Ordering::SeqCst))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeCameraState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CameraBackend for FakeCameraBackend {
    fn enumerate(&mut self) -> CoreResult<Vec<MediaDevice>> {
        Ok(self.lock().devices.clone())
    }

    #[track_caller]
    fn open(&mut self, constraint: &DeviceConstraint) -> CoreResult<Box<dyn CaptureSession>> {
        let mut state = self.lock();
        state.opened.push(constraint.clone());

        if let Some(kind) = state.fail_open {
            return Err(CoreError::Camera {
                kind,
                reason: "Fake camera refused".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let device_id = match constraint {
            DeviceConstraint::Exact(id) => {
                if !state.devices.iter().any(|d| d.device.id == *id) {
                    return Err(CoreError::Camera {
                        kind: CameraErrorKind::Overconstrained,
                        reason: format!("No camera matches device id {}", id),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                id.clone()
            }
            DeviceConstraint::Default => state
                .devices
                .iter()
                .find(|d| d.kind == DeviceKind::VideoInput)
                .map(|d| d.device.id.clone())
                .unwrap_or_else(|| "default".to_string()),
        };

        let live = Arc::new(AtomicUsize::new(FAKE_TRACKS_PER_SESSION));
        state.sessions.push(Arc::clone(&live));

        Ok(Box::new(FakeSession {
            device_id,
            live,
            backend: self.clone(),
        }))
    }
}

struct FakeSession {
    device_id: String,
    live: Arc<AtomicUsize>,
    backend: FakeCameraBackend,
}

impl CaptureSession for FakeSession {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        self.backend.lock().frame.as_ref().map(|f| f.dimensions())
    }

    #[track_caller]
    fn latest_frame(&mut self) -> CoreResult<RgbaImage> {
        let state = self.backend.lock();
        match (&state.frame, state.frame_error) {
            (Some(frame), false) => Ok(frame.clone()),
            _ => Err(CoreError::FrameUnavailable {
                reason: "Fake frame unavailable".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    fn live_tracks(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn stop_tracks(&mut self) {
        self.live.store(0, Ordering::SeqCst);
    }
}

enum SinkBehaviour {
    Respond(SinkResponse),
    Fail(String),
    Hang,
}

/// Color sink that records every delivery.
pub struct CountingSink {
    behaviour: SinkBehaviour,
    calls: AtomicUsize,
    colors: Mutex<Vec<Color>>,
}

impl CountingSink {
    /// Sink answering every request with `status` and optional `message`.
    pub fn responding(status: u16, message: Option<&str>) -> Self {
        Self::with(SinkBehaviour::Respond(SinkResponse {
            status,
            message: message.map(str::to_string),
        }))
    }

    /// Sink whose requests fail in transport with `reason`.
    pub fn failing(reason: &str) -> Self {
        Self::with(SinkBehaviour::Fail(reason.to_string()))
    }

    /// Sink whose requests never get a response.
    pub fn hanging() -> Self {
        Self::with(SinkBehaviour::Hang)
    }

    fn with(behaviour: SinkBehaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
            colors: Mutex::new(Vec::new()),
        }
    }

    /// Number of deliveries attempted.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Colors delivered, in order.
    pub fn colors(&self) -> Vec<Color> {
        self.colors.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ColorSink for CountingSink {
    async fn post_color(&self, color: Color) -> CoreResult<SinkResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.colors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(color);

        match &self.behaviour {
            SinkBehaviour::Respond(response) => Ok(response.clone()),
            SinkBehaviour::Fail(reason) => Err(CoreError::Transport {
                reason: reason.clone(),
                location: ErrorLocation::from(Location::caller()),
            }),
            SinkBehaviour::Hang => std::future::pending().await,
        }
    }
}
