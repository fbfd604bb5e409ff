//! Geometric transforms. Each returns a new [`Image`]; the receiver is left as is.

use super::calculations::{
    quarter_turns, rotated_extent, select_interpolation, size_for_height, size_for_width,
};
use super::{Image, RasterError, Result};
use crate::geometry::{Angle, Rectangle, Size};
use crate::params::FlipMode;
use image::{Rgba, RgbaImage, imageops};
use imageproc::geometric_transformations::{Interpolation as Sampling, Projection, warp_into};

impl Image {
    /// Scale to exactly `size`. See
    /// [`select_interpolation`](super::calculations::select_interpolation)
    /// for how the filter is chosen.
    pub fn resized_to(&self, size: Size, smoothing: bool) -> Result<Image> {
        if size.is_empty() {
            return Err(RasterError::InvalidDimensions(size.width, size.height));
        }
        let filter = select_interpolation(smoothing, self.size(), size).filter();
        let raster = imageops::resize(&self.raster, size.width, size.height, filter);
        Ok(self.derive(raster))
    }

    /// Scale to `width`, keeping the aspect ratio.
    pub fn resized_to_width(&self, width: u32, smoothing: bool) -> Result<Image> {
        if width == 0 {
            return Err(RasterError::InvalidDimensions(0, self.raster.height()));
        }
        self.resized_to(size_for_width(self.size(), width), smoothing)
    }

    /// Scale to `height`, keeping the aspect ratio.
    pub fn resized_to_height(&self, height: u32, smoothing: bool) -> Result<Image> {
        if height == 0 {
            return Err(RasterError::InvalidDimensions(self.raster.width(), 0));
        }
        self.resized_to(size_for_height(self.size(), height), smoothing)
    }

    /// Copy out the part of the image covered by `rect`, clipped to the canvas.
    pub fn cropped(&self, rect: Rectangle) -> Result<Image> {
        let canvas = Rectangle::new(0, 0, self.raster.width(), self.raster.height());
        let region = rect
            .intersection(&canvas)
            .ok_or(RasterError::EmptyRegion)?;
        let raster = imageops::crop_imm(
            &self.raster,
            region.point.x as u32,
            region.point.y as u32,
            region.size.width,
            region.size.height,
        )
        .to_image();
        Ok(self.derive(raster))
    }

    /// Rotate counter-clockwise. The canvas grows to fit the rotated image and
    /// uncovered areas are transparent. Quarter turns are exact.
    pub fn rotated(&self, angle: Angle) -> Image {
        if let Some(turns) = quarter_turns(angle) {
            let raster = match turns {
                0 => self.raster.clone(),
                1 => imageops::rotate270(&self.raster),
                2 => imageops::rotate180(&self.raster),
                _ => imageops::rotate90(&self.raster),
            };
            return self.derive(raster);
        }

        let extent = rotated_extent(self.size(), angle);
        let background = Rgba([0, 0, 0, 0]);
        let mut out = RgbaImage::from_pixel(extent.width, extent.height, background);

        let (in_cx, in_cy) = (
            self.raster.width() as f32 / 2.0,
            self.raster.height() as f32 / 2.0,
        );
        let (out_cx, out_cy) = (extent.width as f32 / 2.0, extent.height as f32 / 2.0);
        // imageproc rotates clockwise on a y-down canvas, hence the negation
        let projection = Projection::translate(out_cx, out_cy)
            * Projection::rotate(-angle.radians() as f32)
            * Projection::translate(-in_cx, -in_cy);

        warp_into(
            &self.raster,
            &projection,
            Sampling::Bilinear,
            background,
            &mut out,
        );
        self.derive(out)
    }

    pub fn flipped(&self, mode: FlipMode) -> Image {
        let raster = match mode {
            FlipMode::Horizontal => imageops::flip_horizontal(&self.raster),
            FlipMode::Vertical => imageops::flip_vertical(&self.raster),
            FlipMode::Both => imageops::rotate180(&self.raster),
        };
        self.derive(raster)
    }
}
