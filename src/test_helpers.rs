//! Shared test utilities: synthetic rasters and on-disk fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let path = write_fixture(tmp.path(), "source.png", &gradient(64, 48));
//! let image = Image::open(&path).unwrap();
//! ```

use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

use crate::format::{Exportable, ExportableFormat};
use crate::params::Quality;

// =========================================================================
// Synthetic rasters
// =========================================================================

/// Opaque gradient: red ramps along x, green along y, blue fixed. Every pixel
/// is distinct for images up to 256x256.
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([ramp(x, width), ramp(y, height), 128, 255])
    })
}

/// Single-color raster.
pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

fn ramp(pos: u32, len: u32) -> u8 {
    if len <= 1 {
        0
    } else {
        (pos * 255 / (len - 1)) as u8
    }
}

// =========================================================================
// Fixtures on disk
// =========================================================================

/// Encode `raster` in the format implied by `name`'s extension and write it
/// into `dir`. Panics on unknown extensions.
pub fn write_fixture(dir: &Path, name: &str, raster: &RgbaImage) -> PathBuf {
    let path = dir.join(name);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_else(|| panic!("fixture '{name}' has no extension"));
    let format = ExportableFormat::from_extension(ext, Quality::default())
        .unwrap_or_else(|| panic!("fixture '{name}' has an unsupported extension"));
    let bytes = format.export(raster).unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn gradient_pixels_are_distinct() {
    let g = gradient(16, 16);
    let distinct: std::collections::HashSet<_> = g.pixels().map(|p| p.0).collect();
    assert_eq!(distinct.len(), 256);
}
