//! Small parameter types passed to codecs and image operations.
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`FlipMode`]: axis selection for [`Image::flipped`](crate::raster::Image::flipped).
//! - [`PixelateMode`]: how a block's color is chosen when pixelating.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Which axis (or both) to mirror across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FlipMode {
    /// Mirror left-to-right.
    Horizontal,
    /// Mirror top-to-bottom.
    Vertical,
    /// Both axes; equivalent to a 180° rotation.
    Both,
}

/// Block color selection for pixelation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum PixelateMode {
    /// Every pixel in the block takes the block's top-left pixel.
    #[default]
    UpperLeft,
    /// Every pixel in the block takes the block's mean color (alpha included).
    Average,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(75).value(), 75);
        assert_eq!(Quality::new(1000).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn flip_mode_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: FlipMode,
        }
        let w: Wrapper = toml::from_str(r#"mode = "both""#).unwrap();
        assert_eq!(w.mode, FlipMode::Both);
    }

    #[test]
    fn pixelate_mode_default_is_upper_left() {
        assert_eq!(PixelateMode::default(), PixelateMode::UpperLeft);
    }
}
