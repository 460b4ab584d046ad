use std::fmt;

use serde::{Deserialize, Serialize};

/// Color sent to the lighting device.
///
/// The white channel is part of the wire contract but the sampler never
/// drives it, so every sampled color carries `w = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// White channel.
    pub w: u8,
}

impl Color {
    /// White channel value for every sampled color.
    pub const SAMPLED_WHITE: u8 = 0;

    /// Build a sampled color from an RGB triple.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            w: Self::SAMPLED_WHITE,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgbw({},{},{},{})", self.r, self.g, self.b, self.w)
    }
}
