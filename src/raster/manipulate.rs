//! In-place pixel manipulations.

use super::{Image, RasterError, Result};
use crate::color::Color;
use crate::params::PixelateMode;
use color_quant::NeuQuant;
use image::{DynamicImage, Rgba, imageops};

/// NeuQuant sampling factor: 1 is slowest and best, 30 fastest. 10 is the
/// value the algorithm's authors recommend.
const QUANT_SAMPLE_FACTOR: i32 = 10;

impl Image {
    /// Replace each `block_size` square with a single color.
    pub fn pixelate(&mut self, block_size: u32, mode: PixelateMode) -> Result<()> {
        if block_size == 0 {
            return Err(RasterError::InvalidArgument(
                "pixelate block size must be at least 1".into(),
            ));
        }
        if block_size == 1 {
            return Ok(());
        }

        let (width, height) = self.raster.dimensions();
        for by in (0..height).step_by(block_size as usize) {
            for bx in (0..width).step_by(block_size as usize) {
                let bw = block_size.min(width - bx);
                let bh = block_size.min(height - by);
                let color = match mode {
                    PixelateMode::UpperLeft => *self.raster.get_pixel(bx, by),
                    PixelateMode::Average => self.block_mean(bx, by, bw, bh),
                };
                for y in by..by + bh {
                    for x in bx..bx + bw {
                        self.raster.put_pixel(x, y, color);
                    }
                }
            }
        }
        Ok(())
    }

    /// Gaussian blur. The sigma is derived from `radius` as `radius * 2/3 + 1`.
    pub fn blur(&mut self, radius: u32) {
        if radius == 0 {
            return;
        }
        let sigma = radius as f32 * 2.0 / 3.0 + 1.0;
        self.raster = imageops::blur(&self.raster, sigma);
    }

    /// Shift every pixel's channels by the color's components (scaled to
    /// 0–255). Alpha shifts by `alpha - 1`, so an opaque color leaves
    /// transparency alone.
    pub fn colorize(&mut self, color: Color) {
        let offsets = [
            offset(color.red),
            offset(color.green),
            offset(color.blue),
            offset(color.alpha - 1.0),
        ];
        for pixel in self.raster.pixels_mut() {
            for (channel, delta) in pixel.0.iter_mut().zip(offsets) {
                *channel = (i32::from(*channel) + delta).clamp(0, 255) as u8;
            }
        }
    }

    /// Convert to grayscale, keeping alpha.
    pub fn desaturate(&mut self) {
        let gray = imageops::grayscale_alpha(&self.raster);
        self.raster = DynamicImage::ImageLumaA8(gray).into_rgba8();
    }

    /// Quantize to at most `max_colors` colors (clamped to 2–256).
    pub fn reduce_colors(&mut self, max_colors: u32) -> Result<()> {
        if max_colors == 0 {
            return Err(RasterError::InvalidArgument(
                "color count must be at least 1".into(),
            ));
        }
        let colors = max_colors.clamp(2, 256) as usize;
        let quantizer = NeuQuant::new(QUANT_SAMPLE_FACTOR, colors, self.raster.as_raw());
        let palette = quantizer.color_map_rgba();

        for pixel in self.raster.pixels_mut() {
            let i = quantizer.index_of(&pixel.0) * 4;
            pixel.0.copy_from_slice(&palette[i..i + 4]);
        }
        Ok(())
    }

    fn block_mean(&self, x0: u32, y0: u32, width: u32, height: u32) -> Rgba<u8> {
        let mut sums = [0u64; 4];
        for y in y0..y0 + height {
            for x in x0..x0 + width {
                for (sum, channel) in sums.iter_mut().zip(self.raster.get_pixel(x, y).0) {
                    *sum += u64::from(channel);
                }
            }
        }
        let n = u64::from(width) * u64::from(height);
        Rgba(sums.map(|s| ((s + n / 2) / n) as u8))
    }
}

fn offset(component: f64) -> i32 {
    (component * 255.0).round() as i32
}
