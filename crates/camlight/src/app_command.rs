use crate::SurfaceState;

/// Commands sent from the console to the main application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Re-enumerate and show cameras.
    ListDevices,
    /// Switch to a camera by id or 1-based list position, and remember it.
    SelectDevice {
        /// Device id or list position as typed.
        device: String,
    },
    /// Send the current color once.
    SendNow,
    /// Turn auto-send on or off, and remember it.
    SetAuto {
        /// Desired auto-send state.
        enabled: bool,
    },
    /// Release the camera and stop sampling.
    StopCamera,
    /// The hosting surface became visible or hidden.
    VisibilityChanged(SurfaceState),
    /// Show color, camera, auto and notification state.
    Status,
    /// Request application shutdown.
    Shutdown,
}
