//! Geometry value types shared by drawing, transforms and text layout.
//!
//! All four types are plain `Copy` values with a `ZERO` constant. Pixel
//! coordinates are signed so that shapes may start off-canvas and be clipped;
//! sizes are unsigned.

use std::cmp::Ordering;

/// A pixel position. `x` grows to the right, `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width and height in pixels.
///
/// Ordering is the product order: one size is smaller than another only when
/// *both* edges are strictly smaller. `100x50` and `50x100` are unordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0,
        height: 0,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either edge is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl PartialOrd for Size {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if self.width < other.width && self.height < other.height {
            Some(Ordering::Less)
        } else if self.width > other.width && self.height > other.height {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

/// An axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rectangle {
    pub point: Point,
    pub size: Size,
}

impl Rectangle {
    pub const ZERO: Rectangle = Rectangle {
        point: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            point: Point { x, y },
            size: Size { width, height },
        }
    }

    /// Overlapping area of two rectangles, or `None` if they do not overlap.
    pub fn intersection(&self, other: &Rectangle) -> Option<Rectangle> {
        let left = i64::from(self.point.x).max(i64::from(other.point.x));
        let top = i64::from(self.point.y).max(i64::from(other.point.y));
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return None;
        }
        Some(Rectangle::new(
            left as i32,
            top as i32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }

    // Exclusive edges, widened so that `x + width` cannot overflow.
    fn right(&self) -> i64 {
        i64::from(self.point.x) + i64::from(self.size.width)
    }

    fn bottom(&self) -> i64 {
        i64::from(self.point.y) + i64::from(self.size.height)
    }
}

/// A rotation. Stored in radians; positive values turn counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Angle {
    radians: f64,
}

impl Angle {
    pub const ZERO: Angle = Angle { radians: 0.0 };

    pub const fn from_radians(radians: f64) -> Self {
        Self { radians }
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self {
            radians: degrees.to_radians(),
        }
    }

    pub fn radians(self) -> f64 {
        self.radians
    }

    pub fn degrees(self) -> f64 {
        self.radians.to_degrees()
    }
}
