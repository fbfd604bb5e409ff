//! TrueType/OpenType text rendering.
//!
//! Glyph outlines are rasterized by `ab_glyph` into a horizontal coverage
//! mask, which is then stamped onto the canvas through the inverse rotation
//! with bilinear sampling. The returned [`TextBounds`] describe the rotated
//! ink rectangle.

use super::calculations::{TextBounds, rotated_bounds, unrotate_offset};
use super::{Image, RasterError, Result};
use crate::color::Color;
use crate::geometry::{Angle, Point};
use ab_glyph::{Font, FontVec, GlyphId, OutlinedGlyph, PxScale, ScaleFont, point};
use std::fs;
use std::path::Path;

/// Font sizes are given in points; the canvas is treated as 96 dpi.
const PIXELS_PER_POINT: f64 = 96.0 / 72.0;

impl Image {
    /// Draw `text` with its baseline starting at `from`, rotated
    /// counter-clockwise by `angle`.
    ///
    /// `font_list` is tried in order and the first font file that loads is
    /// used. `size` is in points. Lines are separated by `'\n'`.
    pub fn render_text<P: AsRef<Path>>(
        &mut self,
        text: &str,
        from: Point,
        font_list: &[P],
        color: Color,
        size: f64,
        angle: Angle,
    ) -> Result<TextBounds> {
        if !(size.is_finite() && size > 0.0) {
            return Err(RasterError::InvalidArgument(format!(
                "font size must be positive, got {size}"
            )));
        }
        if text.is_empty() {
            return Ok(TextBounds::at(from));
        }

        let font = load_first_font(font_list)?;
        let Some(mask) = Mask::rasterize(&font, text, (size * PIXELS_PER_POINT) as f32) else {
            // only whitespace: nothing inked
            return Ok(TextBounds::at(from));
        };

        self.stamp(&mask, from, angle, color);
        Ok(rotated_bounds(from, mask.extents(), angle))
    }

    fn stamp(&mut self, mask: &Mask, origin: Point, angle: Angle, color: Color) {
        let bounds = rotated_bounds(origin, mask.extents(), angle);
        let corners = bounds.corners();
        let (width, height) = (self.raster.width() as i64, self.raster.height() as i64);

        let min_x = corners.iter().map(|p| p.x).min().unwrap_or(0) as i64 - 1;
        let max_x = corners.iter().map(|p| p.x).max().unwrap_or(0) as i64 + 1;
        let min_y = corners.iter().map(|p| p.y).min().unwrap_or(0) as i64 - 1;
        let max_y = corners.iter().map(|p| p.y).max().unwrap_or(0) as i64 + 1;

        let base = color.to_rgba8();
        for y in min_y.max(0)..=max_y.min(height - 1) {
            for x in min_x.max(0)..=max_x.min(width - 1) {
                let dx = x as f64 + 0.5 - f64::from(origin.x);
                let dy = y as f64 + 0.5 - f64::from(origin.y);
                let (u, v) = unrotate_offset(dx, dy, angle);
                let coverage = mask.sample(u, v);
                if coverage <= 0.0 {
                    continue;
                }

                let mut source = base;
                source.0[3] = (f32::from(base.0[3]) * coverage).round() as u8;
                let (x, y) = (x as u32, y as u32);
                let painted = self.composite(*self.raster.get_pixel(x, y), source);
                self.raster.put_pixel(x, y, painted);
            }
        }
    }
}

/// Load the first font in `font_list` that reads and parses.
fn load_first_font<P: AsRef<Path>>(font_list: &[P]) -> Result<FontVec> {
    if font_list.is_empty() {
        return Err(RasterError::Font("no fonts given".into()));
    }
    let mut failures = Vec::new();
    for path in font_list {
        let path = path.as_ref();
        let loaded = fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| FontVec::try_from_vec(bytes).map_err(|e| e.to_string()));
        match loaded {
            Ok(font) => return Ok(font),
            Err(e) => failures.push(format!("{}: {e}", path.display())),
        }
    }
    Err(RasterError::Font(failures.join("; ")))
}

/// Unrotated glyph coverage. `(left, top)` is the offset of the mask's
/// top-left pixel from the first baseline origin.
struct Mask {
    left: f64,
    top: f64,
    width: usize,
    height: usize,
    alpha: Vec<f32>,
}

impl Mask {
    /// Lay out and rasterize `text` at `px` pixels per em. `None` when no
    /// glyph has an outline.
    fn rasterize(font: &FontVec, text: &str, px: f32) -> Option<Mask> {
        let scale = PxScale::from(px);
        let scaled = font.as_scaled(scale);
        let line_advance = scaled.height() + scaled.line_gap();

        let mut outlines: Vec<OutlinedGlyph> = Vec::new();
        let mut baseline = 0.0f32;
        for line in text.split('\n') {
            let mut caret = 0.0f32;
            let mut previous: Option<GlyphId> = None;
            for ch in line.chars() {
                let id = scaled.glyph_id(ch);
                if let Some(prev) = previous {
                    caret += scaled.kern(prev, id);
                }
                let glyph = id.with_scale_and_position(scale, point(caret, baseline));
                caret += scaled.h_advance(id);
                previous = Some(id);
                if let Some(outlined) = font.outline_glyph(glyph) {
                    outlines.push(outlined);
                }
            }
            baseline += line_advance;
        }

        let first = outlines.first()?.px_bounds();
        let (mut left, mut top, mut right, mut bottom) =
            (first.min.x, first.min.y, first.max.x, first.max.y);
        for bounds in outlines.iter().map(OutlinedGlyph::px_bounds) {
            left = left.min(bounds.min.x);
            top = top.min(bounds.min.y);
            right = right.max(bounds.max.x);
            bottom = bottom.max(bounds.max.y);
        }
        let (left, top) = (left.floor(), top.floor());
        let width = (right.ceil() - left) as usize;
        let height = (bottom.ceil() - top) as usize;
        if width == 0 || height == 0 {
            return None;
        }

        let mut alpha = vec![0.0f32; width * height];
        for glyph in &outlines {
            let bounds = glyph.px_bounds();
            let ox = (bounds.min.x - left) as usize;
            let oy = (bounds.min.y - top) as usize;
            glyph.draw(|x, y, c| {
                let (x, y) = (ox + x as usize, oy + y as usize);
                if x < width && y < height {
                    let cell = &mut alpha[y * width + x];
                    *cell = (*cell + c).min(1.0);
                }
            });
        }

        Some(Mask {
            left: f64::from(left),
            top: f64::from(top),
            width,
            height,
            alpha,
        })
    }

    /// Ink box as `(min_x, min_y, max_x, max_y)` offsets from the baseline origin.
    fn extents(&self) -> (f64, f64, f64, f64) {
        (
            self.left,
            self.top,
            self.left + self.width as f64,
            self.top + self.height as f64,
        )
    }

    /// Bilinear coverage at baseline-relative position `(u, v)`.
    fn sample(&self, u: f64, v: f64) -> f32 {
        let x = u - self.left - 0.5;
        let y = v - self.top - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = ((x - x0) as f32, (y - y0) as f32);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = lerp(self.at(x0, y0), self.at(x0 + 1, y0), fx);
        let bottom = lerp(self.at(x0, y0 + 1), self.at(x0 + 1, y0 + 1), fx);
        lerp(top, bottom, fy)
    }

    fn at(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.alpha[y as usize * self.width + x as usize]
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
