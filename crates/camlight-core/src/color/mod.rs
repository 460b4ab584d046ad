mod averager;
mod rgbw;

pub use {averager::average_rgb, rgbw::Color};
