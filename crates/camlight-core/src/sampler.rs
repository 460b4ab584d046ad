//! Periodic frame sampling into the current color.

use crate::{Color, PeriodicTask, SessionSlot, average_rgb};

use std::{sync::Arc, time::Duration};

use image::{RgbaImage, imageops::FilterType};
use tokio::sync::watch;
use tracing::{instrument, trace};

/// Time between two frame samples.
pub const SAMPLE_PERIOD: Duration = Duration::from_millis(100);

/// Width frames are downscaled to before averaging.
pub const SAMPLE_WIDTH: u32 = 64;

/// Pulls frames from the active session and publishes their average color.
pub struct Sampler {
    slot: SessionSlot,
    color_tx: Arc<watch::Sender<Color>>,
    task: PeriodicTask,
}

impl Sampler {
    /// Create a stopped sampler publishing into `color_tx`.
    pub fn new(slot: SessionSlot, color_tx: Arc<watch::Sender<Color>>) -> Self {
        Self {
            slot,
            color_tx,
            task: PeriodicTask::new("sampler"),
        }
    }

    /// Start sampling, replacing any running schedule.
    #[instrument(skip(self))]
    pub fn start(&mut self) {
        let slot = self.slot.clone();
        let color_tx = Arc::clone(&self.color_tx);
        self.task.restart(SAMPLE_PERIOD, move || {
            if let Some(color) = sample_once(&slot) {
                color_tx.send_replace(color);
            }
            std::future::ready(())
        });
    }

    /// Stop sampling. Idempotent.
    pub fn stop(&mut self) {
        self.task.cancel();
    }

    /// Whether the sampling schedule is live.
    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }
}

/// Take one sample from the active session.
///
/// Returns `None` when there is no session, the stream has not reported
/// frame dimensions yet, or the frame could not be read this time.
pub fn sample_once(slot: &SessionSlot) -> Option<Color> {
    let frame = slot.with_session(|session| {
        session.frame_size()?;
        match session.latest_frame() {
            Ok(frame) => Some(frame),
            Err(e) => {
                trace!(error = ?e, "Skipping sample");
                None
            }
        }
    })??;

    let small = downscale(&frame)?;
    let (r, g, b) = average_rgb(small.as_raw());
    Some(Color::from_rgb(r, g, b))
}

/// Resize to [`SAMPLE_WIDTH`] keeping the aspect ratio.
pub(crate) fn downscale(frame: &RgbaImage) -> Option<RgbaImage> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let scaled_height = ((f64::from(height) / f64::from(width)) * f64::from(SAMPLE_WIDTH)).round();
    let scaled_height = (scaled_height as u32).max(1);

    Some(image::imageops::resize(
        frame,
        SAMPLE_WIDTH,
        scaled_height,
        FilterType::Triangle,
    ))
}
