//! Format adapters: the bridge between an [`RgbaImage`] and encoded bytes.
//!
//! Every on-disk encoding gets one adapter struct that implements both
//! capability traits:
//!
//! - [`Importable`]: bytes → raster
//! - [`Exportable`]: raster → bytes
//!
//! | Adapter | Parameters | Codec |
//! |---|---|---|
//! | [`PngFormat`] | | `image::codecs::png` |
//! | [`JpegFormat`] | quality | `image::codecs::jpeg` (alpha dropped) |
//! | [`GifFormat`] | | `image::codecs::gif` |
//! | [`BmpFormat`] | compression | `image::codecs::bmp` |
//! | [`TiffFormat`] | | `image::codecs::tiff` |
//! | [`TgaFormat`] | | `image::codecs::tga` |
//! | [`WbmpFormat`] | foreground index | [`wbmp`] (in-crate) |
//! | [`WebpFormat`] | | `image::codecs::webp` (lossless) |
//!
//! Callers normally go through the two dispatch enums instead of naming an
//! adapter: [`ImportableFormat`] (which adds the `Any` wildcard) and
//! [`ExportableFormat`].

mod codecs;
pub mod wbmp;

pub use codecs::{
    BmpFormat, GifFormat, JpegFormat, PngFormat, TgaFormat, TiffFormat, WbmpFormat, WebpFormat,
};

use crate::params::Quality;
use image::RgbaImage;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(#[source] image::ImageError),
    #[error("Encode failed: {0}")]
    Encode(#[source] image::ImageError),
    #[error("WBMP error: {0}")]
    Wbmp(String),
    #[error("Data is not in any supported image format")]
    Unrecognized,
}

/// Something that can decode bytes into a raster.
pub trait Importable {
    fn import(&self, bytes: &[u8]) -> Result<RgbaImage, FormatError>;
}

/// Something that can encode a raster into bytes.
pub trait Exportable {
    fn export(&self, raster: &RgbaImage) -> Result<Vec<u8>, FormatError>;
}

/// Formats an image can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportableFormat {
    Bmp,
    Gif,
    Jpeg,
    Png,
    Tiff,
    Tga,
    Wbmp,
    Webp,
    /// Try every concrete format in [`ImportableFormat::ANY_PRIORITY`] order.
    Any,
}

impl ImportableFormat {
    /// Order in which `Any` tries the concrete formats. Formats with strong
    /// magic numbers go first; TGA and WBMP have almost no signature and would
    /// accept garbage, so they go last.
    pub const ANY_PRIORITY: [ImportableFormat; 8] = [
        ImportableFormat::Png,
        ImportableFormat::Jpeg,
        ImportableFormat::Gif,
        ImportableFormat::Webp,
        ImportableFormat::Tiff,
        ImportableFormat::Bmp,
        ImportableFormat::Tga,
        ImportableFormat::Wbmp,
    ];

    /// Map a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let format = match ext.to_ascii_lowercase().as_str() {
            "bmp" => Self::Bmp,
            "gif" => Self::Gif,
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "tif" | "tiff" => Self::Tiff,
            "tga" => Self::Tga,
            "wbmp" => Self::Wbmp,
            "webp" => Self::Webp,
            _ => return None,
        };
        Some(format)
    }

    /// Decode with the first concrete format that accepts the bytes, and report
    /// which one it was.
    pub fn import_detected(&self, bytes: &[u8]) -> Result<(ImportableFormat, RgbaImage), FormatError> {
        if *self != Self::Any {
            return self.import(bytes).map(|raster| (*self, raster));
        }
        Self::ANY_PRIORITY
            .iter()
            .find_map(|format| format.import(bytes).ok().map(|raster| (*format, raster)))
            .ok_or(FormatError::Unrecognized)
    }

    /// Which concrete format `Any` would decode these bytes as.
    pub fn detect(bytes: &[u8]) -> Option<ImportableFormat> {
        Self::Any.import_detected(bytes).ok().map(|(format, _)| format)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bmp => "bmp",
            Self::Gif => "gif",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Tiff => "tiff",
            Self::Tga => "tga",
            Self::Wbmp => "wbmp",
            Self::Webp => "webp",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for ImportableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Importable for ImportableFormat {
    fn import(&self, bytes: &[u8]) -> Result<RgbaImage, FormatError> {
        match self {
            Self::Bmp => BmpFormat::default().import(bytes),
            Self::Gif => GifFormat.import(bytes),
            Self::Jpeg => JpegFormat::default().import(bytes),
            Self::Png => PngFormat.import(bytes),
            Self::Tiff => TiffFormat.import(bytes),
            Self::Tga => TgaFormat.import(bytes),
            Self::Wbmp => WbmpFormat::default().import(bytes),
            Self::Webp => WebpFormat.import(bytes),
            Self::Any => self.import_detected(bytes).map(|(_, raster)| raster),
        }
    }
}

/// Formats an image can be written to, with their encoder parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportableFormat {
    Bmp { compression: bool },
    Gif,
    Jpeg { quality: Quality },
    Png,
    Tiff,
    Tga,
    /// Pixels whose RGB equals `index` (`0xRRGGBB`) become black; all others white.
    Wbmp { index: u32 },
    Webp,
}

impl ExportableFormat {
    /// Map a file extension (case-insensitive, without the dot). `quality`
    /// only affects JPEG; other parameters take their defaults.
    pub fn from_extension(ext: &str, quality: Quality) -> Option<Self> {
        let format = match ImportableFormat::from_extension(ext)? {
            ImportableFormat::Bmp => Self::Bmp { compression: false },
            ImportableFormat::Gif => Self::Gif,
            ImportableFormat::Jpeg => Self::Jpeg { quality },
            ImportableFormat::Png => Self::Png,
            ImportableFormat::Tiff => Self::Tiff,
            ImportableFormat::Tga => Self::Tga,
            ImportableFormat::Wbmp => Self::Wbmp { index: 0 },
            ImportableFormat::Webp => Self::Webp,
            ImportableFormat::Any => return None,
        };
        Some(format)
    }

    /// Conventional file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Bmp { .. } => "bmp",
            Self::Gif => "gif",
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
            Self::Tiff => "tiff",
            Self::Tga => "tga",
            Self::Wbmp { .. } => "wbmp",
            Self::Webp => "webp",
        }
    }
}

impl fmt::Display for ExportableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl Exportable for ExportableFormat {
    fn export(&self, raster: &RgbaImage) -> Result<Vec<u8>, FormatError> {
        match *self {
            Self::Bmp { compression } => BmpFormat { compression }.export(raster),
            Self::Gif => GifFormat.export(raster),
            Self::Jpeg { quality } => JpegFormat { quality }.export(raster),
            Self::Png => PngFormat.export(raster),
            Self::Tiff => TiffFormat.export(raster),
            Self::Tga => TgaFormat.export(raster),
            Self::Wbmp { index } => WbmpFormat { index }.export(raster),
            Self::Webp => WebpFormat.export(raster),
        }
    }
}
