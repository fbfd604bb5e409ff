//! # rasterkit
//!
//! A small raster image toolkit: decode a file, draw on it, transform it,
//! and encode it again in another format. Everything is pure Rust. The
//! codecs come from the `image` crate, except WBMP, which is implemented
//! here.
//!
//! ```no_run
//! use rasterkit::{Angle, Color, Image, Point, Quality};
//! use std::path::Path;
//!
//! let mut image = Image::open(Path::new("photo.jpg"))?;
//! image.fill_rectangle(Point::new(0, 0), Point::new(31, 31), Color::RED);
//! let rotated = image.rotated(Angle::from_degrees(30.0));
//! rotated.write(Path::new("photo.png"), Quality::default(), false)?;
//! # Ok::<(), rasterkit::RasterError>(())
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | `Point`, `Size`, `Rectangle`, `Angle` value types |
//! | [`color`] | Floating-point RGBA color and hex parsing |
//! | [`params`] | Small parameter types: JPEG `Quality`, `FlipMode`, `PixelateMode` |
//! | [`format`] | Import/export capability traits and one adapter per file format |
//! | [`raster`] | The `Image` type: drawing, text, transforms, manipulations |
//! | [`config`] | `rasterkit.toml` loading, validation, and merging |
//! | [`batch`] | Parallel conversion of a whole directory tree |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Owned Buffer Per Image
//!
//! An [`Image`] owns exactly one RGBA8 buffer. Transforms (resize, crop,
//! rotate, flip) return a new `Image` and leave the receiver untouched; drawing
//! and manipulations mutate in place. There is no shared or reference-counted
//! pixel storage, so dropping an `Image` frees its pixels.
//!
//! ## Formats Are Values
//!
//! Readable and writable formats are closed enums ([`ImportableFormat`],
//! [`ExportableFormat`]) that implement the [`Importable`] and [`Exportable`]
//! traits. Encoder parameters such as JPEG quality travel inside the variant,
//! so a format value alone fully describes how to encode.
//!
//! ## Content Over Extension
//!
//! `ImportableFormat::Any` tries each concrete decoder in a fixed priority
//! order. Formats with strong magic numbers come first; TGA and WBMP, which
//! have almost no signature, come last.

pub mod batch;
pub mod color;
pub mod config;
pub mod format;
pub mod geometry;
pub mod output;
pub mod params;
pub mod raster;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use color::Color;
pub use format::{Exportable, ExportableFormat, FormatError, Importable, ImportableFormat};
pub use geometry::{Angle, Point, Rectangle, Size};
pub use params::{FlipMode, PixelateMode, Quality};
pub use raster::{Image, RasterError, TextBounds};
