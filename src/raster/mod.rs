//! The [`Image`] type: one owned raster plus the operations on it.
//!
//! An `Image` exclusively owns its pixel buffer. Transforms never alias the
//! receiver's buffer: they return a fresh `Image`, and the buffer is released
//! when its owner drops. Everything else lives in submodules:
//!
//! | Submodule | Operations |
//! |---|---|
//! | `draw` | pixels, lines, flood fill, ellipses, rectangles |
//! | `text` | `render_text` and its [`TextBounds`] |
//! | `transform` | resize, crop, rotate, flip |
//! | `manipulate` | pixelate, blur, colorize, desaturate, reduce colors |
//! | [`calculations`] | pure math behind the above |

pub mod calculations;
mod draw;
mod manipulate;
mod text;
mod transform;

pub use calculations::{Interpolation, TextBounds};

use crate::format::{
    Exportable, ExportableFormat, FormatError, Importable, ImportableFormat,
};
use crate::geometry::Size;
use crate::params::Quality;
use image::RgbaImage;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("Invalid dimensions {0}x{1}")]
    InvalidDimensions(u32, u32),
    #[error("Region does not overlap the image")]
    EmptyRegion,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unsupported file extension: {0:?}")]
    UnsupportedExtension(String),
    #[error("Refusing to overwrite existing file {}", .0.display())]
    FileExists(PathBuf),
    #[error("Font error: {0}")]
    Font(String),
}

pub type Result<T> = std::result::Result<T, RasterError>;

/// A truecolor RGBA image.
///
/// Two flags shape how pixels are written and exported:
///
/// - **alpha blending** (on by default): drawing composites source-over onto
///   the existing pixel. When off, drawing replaces the pixel outright.
/// - **save alpha** (off by default): exports keep the alpha channel. When off,
///   every exported pixel is opaque.
///
/// [`Image::set_transparent`] flips both at once, which is what you want when
/// building an image with transparent regions.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    raster: RgbaImage,
    alpha_blending: bool,
    save_alpha: bool,
}

impl Image {
    /// A new opaque black image.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions(width, height));
        }
        Self::from_raster(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([0, 0, 0, 255]),
        ))
    }

    /// Take ownership of an existing raster. Empty rasters are rejected like
    /// in [`Image::new`].
    pub fn from_raster(raster: RgbaImage) -> Result<Self> {
        let (width, height) = raster.dimensions();
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions(width, height));
        }
        Ok(Self {
            raster,
            alpha_blending: true,
            save_alpha: false,
        })
    }

    /// Decode from memory.
    pub fn from_bytes(bytes: &[u8], format: ImportableFormat) -> Result<Self> {
        Self::from_raster(format.import(bytes)?)
    }

    /// Read and decode a file. The format comes from the extension; files with
    /// unknown or missing extensions are sniffed.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes, import_format_for(path))
    }

    pub fn size(&self) -> Size {
        Size::new(self.raster.width(), self.raster.height())
    }

    /// Borrow the underlying pixels.
    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    /// Give up the image and keep its pixels.
    pub fn into_raster(self) -> RgbaImage {
        self.raster
    }

    pub fn is_transparent(&self) -> bool {
        self.save_alpha && !self.alpha_blending
    }

    /// `true` keeps alpha on export and stops drawing from blending.
    /// `false` restores the defaults.
    pub fn set_transparent(&mut self, transparent: bool) {
        self.save_alpha = transparent;
        self.alpha_blending = !transparent;
    }

    pub fn alpha_blending(&self) -> bool {
        self.alpha_blending
    }

    pub fn set_alpha_blending(&mut self, enabled: bool) {
        self.alpha_blending = enabled;
    }

    pub fn save_alpha(&self) -> bool {
        self.save_alpha
    }

    pub fn set_save_alpha(&mut self, enabled: bool) {
        self.save_alpha = enabled;
    }

    /// Encode into memory.
    pub fn export(&self, format: ExportableFormat) -> Result<Vec<u8>> {
        Ok(format.export(&self.export_raster())?)
    }

    /// Encode to a file, choosing the format from the extension. `quality`
    /// applies to JPEG only.
    pub fn write(&self, path: &Path, quality: Quality, allow_overwrite: bool) -> Result<()> {
        let ext = extension_of(path);
        let format = ExportableFormat::from_extension(&ext, quality)
            .ok_or(RasterError::UnsupportedExtension(ext))?;
        self.write_as(path, format, allow_overwrite)
    }

    /// Encode to a file with an explicit format.
    pub fn write_as(
        &self,
        path: &Path,
        format: ExportableFormat,
        allow_overwrite: bool,
    ) -> Result<()> {
        if !allow_overwrite && path.exists() {
            return Err(RasterError::FileExists(path.to_path_buf()));
        }
        let bytes = self.export(format)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// The raster as it should be handed to an encoder.
    fn export_raster(&self) -> Cow<'_, RgbaImage> {
        if self.save_alpha || self.raster.pixels().all(|p| p.0[3] == u8::MAX) {
            return Cow::Borrowed(&self.raster);
        }
        let mut opaque = self.raster.clone();
        for pixel in opaque.pixels_mut() {
            pixel.0[3] = u8::MAX;
        }
        Cow::Owned(opaque)
    }

    /// A new image sharing this one's flags but holding `raster`.
    fn derive(&self, raster: RgbaImage) -> Self {
        Self {
            raster,
            alpha_blending: self.alpha_blending,
            save_alpha: self.save_alpha,
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Import format implied by a path's extension, or `Any` when unknown.
pub fn import_format_for(path: &Path) -> ImportableFormat {
    ImportableFormat::from_extension(&extension_of(path)).unwrap_or(ImportableFormat::Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geometry::Point;
    use crate::test_helpers::gradient;
    use tempfile::TempDir;

    #[test]
    fn new_image_is_opaque_black() {
        let image = Image::new(3, 2).unwrap();
        assert_eq!(image.size(), Size::new(3, 2));
        assert!(image.raster().pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn new_rejects_zero_dimensions() {
        assert!(matches!(
            Image::new(0, 10),
            Err(RasterError::InvalidDimensions(0, 10))
        ));
    }

    #[test]
    fn from_raster_rejects_empty_raster() {
        assert!(matches!(
            Image::from_raster(RgbaImage::new(0, 0)),
            Err(RasterError::InvalidDimensions(0, 0))
        ));
        assert!(matches!(
            Image::from_raster(RgbaImage::new(3, 0)),
            Err(RasterError::InvalidDimensions(3, 0))
        ));
        assert_eq!(
            Image::from_raster(gradient(3, 2)).unwrap().size(),
            Size::new(3, 2)
        );
    }

    #[test]
    fn defaults_blend_and_drop_alpha() {
        let image = Image::new(1, 1).unwrap();
        assert!(image.alpha_blending());
        assert!(!image.save_alpha());
        assert!(!image.is_transparent());
    }

    #[test]
    fn set_transparent_toggles_both_flags() {
        let mut image = Image::new(1, 1).unwrap();
        image.set_transparent(true);
        assert!(image.is_transparent());
        assert!(!image.alpha_blending());
        assert!(image.save_alpha());

        image.set_transparent(false);
        assert!(!image.is_transparent());
        assert!(image.alpha_blending());
    }

    #[test]
    fn export_without_save_alpha_is_opaque() {
        let mut image = Image::new(2, 2).unwrap();
        image.set_alpha_blending(false);
        image.set_pixel(Point::new(0, 0), Color::TRANSPARENT);

        let bytes = image.export(ExportableFormat::Png).unwrap();
        let decoded = Image::from_bytes(&bytes, ImportableFormat::Png).unwrap();
        assert_eq!(decoded.pixel(Point::new(0, 0)).unwrap().alpha, 1.0);
    }

    #[test]
    fn export_with_save_alpha_keeps_transparency() {
        let mut image = Image::new(2, 2).unwrap();
        image.set_transparent(true);
        image.set_pixel(Point::new(0, 0), Color::TRANSPARENT);

        let bytes = image.export(ExportableFormat::Png).unwrap();
        let decoded = Image::from_bytes(&bytes, ImportableFormat::Any).unwrap();
        assert_eq!(decoded.pixel(Point::new(0, 0)).unwrap().alpha, 0.0);
    }

    #[test]
    fn write_and_open_by_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        let image = Image::from_raster(gradient(10, 6)).unwrap();

        image.write(&path, Quality::default(), false).unwrap();
        let reopened = Image::open(&path).unwrap();
        assert_eq!(reopened.raster(), image.raster());
    }

    #[test]
    fn write_refuses_overwrite_unless_allowed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.bmp");
        let image = Image::new(4, 4).unwrap();

        image.write(&path, Quality::default(), false).unwrap();
        let second = image.write(&path, Quality::default(), false);
        assert!(matches!(second, Err(RasterError::FileExists(_))));

        image.write(&path, Quality::default(), true).unwrap();
    }

    #[test]
    fn write_unknown_extension_errors() {
        let tmp = TempDir::new().unwrap();
        let result = Image::new(1, 1)
            .unwrap()
            .write(&tmp.path().join("out.xyz"), Quality::default(), false);
        assert!(matches!(result, Err(RasterError::UnsupportedExtension(e)) if e == "xyz"));
    }

    #[test]
    fn open_sniffs_unknown_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mystery.dat");
        let image = Image::from_raster(gradient(5, 5)).unwrap();
        image
            .write_as(&path, ExportableFormat::Gif, false)
            .unwrap();

        let reopened = Image::open(&path).unwrap();
        assert_eq!(reopened.size(), Size::new(5, 5));
    }

    #[test]
    fn open_missing_file_is_io_error() {
        assert!(matches!(
            Image::open(Path::new("/nonexistent/image.png")),
            Err(RasterError::Io(_))
        ));
    }

    #[test]
    fn import_format_for_paths() {
        assert_eq!(import_format_for(Path::new("a.JPEG")), ImportableFormat::Jpeg);
        assert_eq!(import_format_for(Path::new("a.wbmp")), ImportableFormat::Wbmp);
        assert_eq!(import_format_for(Path::new("noext")), ImportableFormat::Any);
    }

    #[test]
    fn clone_is_independent() {
        let original = Image::new(2, 2).unwrap();
        let mut copy = original.clone();
        copy.set_pixel(Point::new(0, 0), Color::WHITE);
        assert_eq!(original.pixel(Point::new(0, 0)), Some(Color::BLACK));
        assert_eq!(copy.pixel(Point::new(0, 0)), Some(Color::WHITE));
    }
}
