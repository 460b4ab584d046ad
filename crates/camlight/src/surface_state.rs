/// Visibility of the surface hosting the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    /// On screen.
    Visible,
    /// Minimized or otherwise off screen.
    Hidden,
}
