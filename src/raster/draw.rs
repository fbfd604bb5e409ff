//! Drawing primitives. Shapes are clipped to the canvas; nothing here fails.

use super::Image;
use crate::color::Color;
use crate::geometry::{Point, Size};
use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{
    Blend, draw_filled_ellipse_mut, draw_filled_rect_mut, draw_hollow_ellipse_mut,
    draw_line_segment_mut,
};
use imageproc::rect::Rect;

/// Run an `imageproc` drawing call against the raster, through a blending
/// canvas when alpha blending is on.
macro_rules! paint {
    ($image:expr, $canvas:ident => $body:expr) => {{
        if $image.alpha_blending {
            let mut blended = Blend(std::mem::replace(
                &mut $image.raster,
                RgbaImage::new(0, 0),
            ));
            {
                let $canvas = &mut blended;
                $body;
            }
            $image.raster = blended.0;
        } else {
            let $canvas = &mut $image.raster;
            $body;
        }
    }};
}

impl Image {
    /// Color at `point`, or `None` outside the canvas.
    pub fn pixel(&self, point: Point) -> Option<Color> {
        let (x, y) = self.coords(point)?;
        Some(Color::from_rgba8(*self.raster.get_pixel(x, y)))
    }

    pub fn set_pixel(&mut self, point: Point, color: Color) {
        if let Some((x, y)) = self.coords(point) {
            let painted = self.composite(*self.raster.get_pixel(x, y), color.to_rgba8());
            self.raster.put_pixel(x, y, painted);
        }
    }

    pub fn draw_line(&mut self, from: Point, to: Point, color: Color) {
        let Some((start, end)) =
            clip_segment(from, to, self.raster.width(), self.raster.height())
        else {
            return;
        };
        let rgba = color.to_rgba8();
        paint!(self, canvas => draw_line_segment_mut(canvas, start, end, rgba));
    }

    /// Flood-fill the 4-connected region around `from` that shares its color.
    pub fn fill(&mut self, from: Point, color: Color) {
        let Some((x, y)) = self.coords(from) else {
            return;
        };
        let target = *self.raster.get_pixel(x, y);
        let replacement = self.composite(target, color.to_rgba8());
        if replacement == target {
            return;
        }

        let (width, height) = self.raster.dimensions();
        let mut stack = vec![(x, y)];
        while let Some((x, y)) = stack.pop() {
            if *self.raster.get_pixel(x, y) != target {
                continue;
            }
            self.raster.put_pixel(x, y, replacement);
            if x > 0 {
                stack.push((x - 1, y));
            }
            if x + 1 < width {
                stack.push((x + 1, y));
            }
            if y > 0 {
                stack.push((x, y - 1));
            }
            if y + 1 < height {
                stack.push((x, y + 1));
            }
        }
    }

    /// Outline an ellipse. `size` is the full width and height.
    pub fn stroke_ellipse(&mut self, center: Point, size: Size, color: Color) {
        let rgba = color.to_rgba8();
        let (rx, ry) = radii(size);
        paint!(self, canvas => draw_hollow_ellipse_mut(canvas, (center.x, center.y), rx, ry, rgba));
    }

    pub fn fill_ellipse(&mut self, center: Point, size: Size, color: Color) {
        let rgba = color.to_rgba8();
        let (rx, ry) = radii(size);
        paint!(self, canvas => draw_filled_ellipse_mut(canvas, (center.x, center.y), rx, ry, rgba));
    }

    /// Outline a rectangle. Both corners are inclusive and may be given in
    /// any order.
    pub fn stroke_rectangle(&mut self, top_left: Point, bottom_right: Point, color: Color) {
        let (left, top, right, bottom) = span(top_left, bottom_right);
        // edges don't overlap, so translucent corners are painted once
        let mut edges = vec![(left, top, right, top)];
        if bottom > top {
            edges.push((left, bottom, right, bottom));
        }
        if bottom - top > 1 {
            edges.push((left, top + 1, left, bottom - 1));
            if right > left {
                edges.push((right, top + 1, right, bottom - 1));
            }
        }

        let rgba = color.to_rgba8();
        for (l, t, r, b) in edges {
            if let Some(rect) = self.clip_rect(l, t, r, b) {
                paint!(self, canvas => draw_filled_rect_mut(canvas, rect, rgba));
            }
        }
    }

    pub fn fill_rectangle(&mut self, top_left: Point, bottom_right: Point, color: Color) {
        let (left, top, right, bottom) = span(top_left, bottom_right);
        let Some(rect) = self.clip_rect(left, top, right, bottom) else {
            return;
        };
        let rgba = color.to_rgba8();
        paint!(self, canvas => draw_filled_rect_mut(canvas, rect, rgba));
    }

    /// The part of the inclusive span `left..=right`, `top..=bottom` that lies
    /// on the canvas.
    fn clip_rect(&self, left: i64, top: i64, right: i64, bottom: i64) -> Option<Rect> {
        let max_x = i64::from(self.raster.width()) - 1;
        let max_y = i64::from(self.raster.height()) - 1;
        let (left, top) = (left.max(0), top.max(0));
        let (right, bottom) = (right.min(max_x), bottom.min(max_y));
        if left > right || top > bottom {
            return None;
        }
        Some(Rect::at(left as i32, top as i32).of_size(
            (right - left + 1) as u32,
            (bottom - top + 1) as u32,
        ))
    }

    /// Canvas coordinates for `point`, if it lies on the canvas.
    pub(super) fn coords(&self, point: Point) -> Option<(u32, u32)> {
        let x = u32::try_from(point.x).ok()?;
        let y = u32::try_from(point.y).ok()?;
        (x < self.raster.width() && y < self.raster.height()).then_some((x, y))
    }

    /// The pixel that results from painting `source` over `existing`.
    pub(super) fn composite(&self, existing: Rgba<u8>, source: Rgba<u8>) -> Rgba<u8> {
        if self.alpha_blending {
            let mut out = existing;
            out.blend(&source);
            out
        } else {
            source
        }
    }
}

fn radii(size: Size) -> (i32, i32) {
    ((size.width / 2) as i32, (size.height / 2) as i32)
}

/// Normalized `(left, top, right, bottom)` of two corners, widened so no
/// corner pair can overflow.
fn span(a: Point, b: Point) -> (i64, i64, i64, i64) {
    let (ax, ay, bx, by) = (
        i64::from(a.x),
        i64::from(a.y),
        i64::from(b.x),
        i64::from(b.y),
    );
    (ax.min(bx), ay.min(by), ax.max(bx), ay.max(by))
}

/// Clip a segment to the canvas plus a one pixel margin (Liang-Barsky).
/// Segments already on the canvas come back unchanged.
fn clip_segment(from: Point, to: Point, width: u32, height: u32) -> Option<((f32, f32), (f32, f32))> {
    let (x0, y0) = (f64::from(from.x), f64::from(from.y));
    let (dx, dy) = (f64::from(to.x) - x0, f64::from(to.y) - y0);
    let (min_x, min_y) = (-1.0, -1.0);
    let (max_x, max_y) = (f64::from(width), f64::from(height));

    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-dx, x0 - min_x),
        (dx, max_x - x0),
        (-dy, y0 - min_y),
        (dy, max_y - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| ((x0 + t * dx).round() as f32, (y0 + t * dy).round() as f32);
    Some((at(t0), at(t1)))
}
