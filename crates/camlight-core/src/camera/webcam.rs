//! Webcam backend built on nokhwa.
//!
//! nokhwa's `Camera` is not `Send`, so every session owns a capture thread
//! that opens the device, decodes frames to RGBA and publishes the latest
//! one. The session handle only carries the shared frame and a shutdown flag.

use crate::{
    CoreError, CoreResult,
    camera::{
        CameraBackend, CameraDevice, CaptureSession, DeviceConstraint, DeviceKind, MediaDevice,
    },
    error::CameraErrorKind,
};

use std::{
    collections::HashMap,
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc::{SyncSender, sync_channel},
    },
    thread::JoinHandle,
    time::Duration,
};

use error_location::ErrorLocation;
use image::RgbaImage;
use nokhwa::{
    Camera,
    pixel_format::RgbAFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
};
use tracing::{debug, error, info, instrument, warn};

/// Back-off after a failed frame read before trying again.
const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Cameras reachable through the platform's native capture API.
#[derive(Debug, Default)]
pub struct WebcamBackend {
    indices: HashMap<String, CameraIndex>,
}

impl WebcamBackend {
    /// Create a backend. No device is touched until enumeration or open.
    pub fn new() -> Self {
        Self::default()
    }

    #[track_caller]
    fn resolve(&self, device_id: &str) -> CoreResult<CameraIndex> {
        if let Some(index) = self.indices.get(device_id) {
            return Ok(index.clone());
        }
        device_id
            .parse::<u32>()
            .map(CameraIndex::Index)
            .map_err(|_| CoreError::Camera {
                kind: CameraErrorKind::Overconstrained,
                reason: format!("No camera matches device id {}", device_id),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl CameraBackend for WebcamBackend {
    #[track_caller]
    #[instrument(skip(self))]
    fn enumerate(&mut self) -> CoreResult<Vec<MediaDevice>> {
        let cameras = query(ApiBackend::Auto).map_err(|e| CoreError::Camera {
            kind: CameraErrorKind::NotReadable,
            reason: format!("Failed to query cameras: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        self.indices.clear();

        let devices = cameras
            .iter()
            .map(|info| {
                let id = info.index().to_string();
                self.indices.insert(id.clone(), info.index().clone());
                MediaDevice {
                    kind: DeviceKind::VideoInput,
                    device: CameraDevice {
                        id,
                        label: info.human_name(),
                    },
                }
            })
            .collect();

        Ok(devices)
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn open(&mut self, constraint: &DeviceConstraint) -> CoreResult<Box<dyn CaptureSession>> {
        let index = match constraint {
            DeviceConstraint::Exact(id) => self.resolve(id)?,
            DeviceConstraint::Default => CameraIndex::Index(0),
        };

        let session = WebcamSession::spawn(index)?;
        Ok(Box::new(session))
    }
}

struct WebcamSession {
    device_id: String,
    latest: Arc<Mutex<Option<RgbaImage>>>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl WebcamSession {
    #[track_caller]
    fn spawn(index: CameraIndex) -> CoreResult<Self> {
        let device_id = index.to_string();
        let latest = Arc::new(Mutex::new(None));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = sync_channel(1);

        let worker = {
            let latest = Arc::clone(&latest);
            let shutdown = Arc::clone(&shutdown);
            std::thread::Builder::new()
                .name("camlight-capture".to_string())
                .spawn(move || capture_loop(index, latest, shutdown, ready_tx))
                .map_err(|e| CoreError::Camera {
                    kind: CameraErrorKind::Aborted,
                    reason: format!("Failed to spawn capture thread: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?
        };

        let ready = ready_rx.recv().map_err(|_| CoreError::Camera {
            kind: CameraErrorKind::Aborted,
            reason: "Capture thread exited before the stream opened".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });

        match ready {
            Ok(Ok(())) => {
                info!(device_id = %device_id, "Webcam stream opened");
                Ok(Self {
                    device_id,
                    latest,
                    shutdown,
                    worker: Some(worker),
                })
            }
            Ok(Err(e)) | Err(e) => {
                if worker.join().is_err() {
                    warn!("Capture thread panicked during open");
                }
                Err(e)
            }
        }
    }

    fn frame_guard(&self) -> std::sync::MutexGuard<'_, Option<RgbaImage>> {
        self.latest.lock().unwrap_or_else(|e| {
            error!("Frame lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}

impl CaptureSession for WebcamSession {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame_guard().as_ref().map(|f| f.dimensions())
    }

    #[track_caller]
    fn latest_frame(&mut self) -> CoreResult<RgbaImage> {
        self.frame_guard()
            .clone()
            .ok_or_else(|| CoreError::FrameUnavailable {
                reason: "No frame decoded yet".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.worker.is_some())
    }

    fn stop_tracks(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(device_id = %self.device_id, "Capture thread panicked");
            }
            debug!(device_id = %self.device_id, "Webcam track stopped");
        }
    }
}

impl Drop for WebcamSession {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

fn capture_loop(
    index: CameraIndex,
    latest: Arc<Mutex<Option<RgbaImage>>>,
    shutdown: Arc<AtomicBool>,
    ready_tx: SyncSender<CoreResult<()>>,
) {
    let format = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

    let mut camera = match Camera::new(index, format) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready_tx.send(Err(open_error(CameraErrorKind::NotFound, e)));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = ready_tx.send(Err(open_error(CameraErrorKind::NotReadable, e)));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    while !shutdown.load(Ordering::Acquire) {
        let decoded = camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbAFormat>());

        match decoded {
            Ok(img) => {
                let (width, height) = (img.width(), img.height());
                if let Some(frame) = RgbaImage::from_raw(width, height, img.into_raw()) {
                    let mut guard = latest.lock().unwrap_or_else(|e| e.into_inner());
                    *guard = Some(frame);
                }
            }
            Err(e) => {
                debug!(error = %e, "Frame read failed");
                std::thread::sleep(READ_RETRY_DELAY);
            }
        }
    }

    if let Err(e) = camera.stop_stream() {
        warn!(error = %e, "Failed to stop webcam stream");
    }
}

#[track_caller]
fn open_error(kind: CameraErrorKind, e: nokhwa::NokhwaError) -> CoreError {
    CoreError::Camera {
        kind,
        reason: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
