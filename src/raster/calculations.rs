//! Pure calculation functions for resizing, rotation and text bounds.
//!
//! All functions here are pure and testable without any rasters.

use crate::geometry::{Angle, Point, Size};
use image::imageops::FilterType;

/// Resampling kernel used by a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// No smoothing; also used when the resize is neither a clean shrink
    /// nor a clean enlargement.
    Nearest,
    /// Windowed sinc, for shrinking.
    Sinc,
    /// Mitchell-class cubic, for enlarging.
    Mitchell,
}

impl Interpolation {
    /// The `image` filter implementing this kernel. The crate has no
    /// Mitchell-Netravali filter; Catmull-Rom is the cubic it does ship.
    pub fn filter(self) -> FilterType {
        match self {
            Interpolation::Nearest => FilterType::Nearest,
            Interpolation::Sinc => FilterType::Lanczos3,
            Interpolation::Mitchell => FilterType::CatmullRom,
        }
    }
}

/// Pick the interpolation for resizing `current` to `target`.
///
/// Uses the partial order on [`Size`]: a shrink on both edges gets sinc, an
/// enlargement on both edges gets Mitchell, and equal or mixed changes fall
/// back to nearest-neighbour.
pub fn select_interpolation(smoothing: bool, current: Size, target: Size) -> Interpolation {
    if !smoothing {
        return Interpolation::Nearest;
    }
    if current > target {
        Interpolation::Sinc
    } else if current < target {
        Interpolation::Mitchell
    } else {
        Interpolation::Nearest
    }
}

/// Size with the given width and the height that keeps `current`'s aspect ratio.
pub fn size_for_width(current: Size, width: u32) -> Size {
    let height = (f64::from(width) * f64::from(current.height) / f64::from(current.width)).round();
    Size::new(width, (height as u32).max(1))
}

/// Size with the given height and the width that keeps `current`'s aspect ratio.
pub fn size_for_height(current: Size, height: u32) -> Size {
    let width = (f64::from(height) * f64::from(current.width) / f64::from(current.height)).round();
    Size::new((width as u32).max(1), height)
}

/// Rotate `(x, y)` counter-clockwise (on screen, with y pointing down) by `angle`
/// around the origin.
pub fn rotate_offset(x: f64, y: f64, angle: Angle) -> (f64, f64) {
    let (sin, cos) = angle.radians().sin_cos();
    (x * cos + y * sin, -x * sin + y * cos)
}

/// Inverse of [`rotate_offset`].
pub fn unrotate_offset(x: f64, y: f64, angle: Angle) -> (f64, f64) {
    let (sin, cos) = angle.radians().sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Canvas size needed to hold a `size` raster after rotating it by `angle`.
pub fn rotated_extent(size: Size, angle: Angle) -> Size {
    let (sin, cos) = angle.radians().sin_cos();
    let (w, h) = (f64::from(size.width), f64::from(size.height));
    let width = (w * cos.abs() + h * sin.abs()).round();
    let height = (w * sin.abs() + h * cos.abs()).round();
    Size::new((width as u32).max(1), (height as u32).max(1))
}

/// If `angle` is a whole number of quarter turns, how many (0–3).
pub fn quarter_turns(angle: Angle) -> Option<u8> {
    let turns = angle.degrees() / 90.0;
    let rounded = turns.round();
    if (turns - rounded).abs() > 1e-9 {
        return None;
    }
    Some((rounded as i64).rem_euclid(4) as u8)
}

/// The four corners of a rotated rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBounds {
    pub upper_left: Point,
    pub upper_right: Point,
    pub lower_right: Point,
    pub lower_left: Point,
}

impl TextBounds {
    /// Degenerate bounds with every corner at `origin`.
    pub fn at(origin: Point) -> Self {
        Self {
            upper_left: origin,
            upper_right: origin,
            lower_right: origin,
            lower_left: origin,
        }
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            self.upper_left,
            self.upper_right,
            self.lower_right,
            self.lower_left,
        ]
    }
}

/// Place an unrotated box, given as offsets `(min_x, min_y, max_x, max_y)` from
/// the baseline origin, onto the canvas at `origin`, rotated by `angle`.
pub fn rotated_bounds(origin: Point, extents: (f64, f64, f64, f64), angle: Angle) -> TextBounds {
    let (min_x, min_y, max_x, max_y) = extents;
    let place = |x: f64, y: f64| {
        let (rx, ry) = rotate_offset(x, y, angle);
        Point::new(
            origin.x + rx.round() as i32,
            origin.y + ry.round() as i32,
        )
    };
    TextBounds {
        upper_left: place(min_x, min_y),
        upper_right: place(max_x, min_y),
        lower_right: place(max_x, max_y),
        lower_left: place(min_x, max_y),
    }
}
