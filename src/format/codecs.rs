//! Concrete format adapters.
//!
//! All adapters except WBMP forward to the `image` crate. Each one decodes to
//! RGBA8 regardless of the stored color type, so the rest of the crate only
//! ever deals with one pixel layout.

use super::{Exportable, FormatError, Importable, wbmp};
use crate::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use std::io::Cursor;

/// Decode `bytes` as exactly `format`, without guessing.
fn decode_as(bytes: &[u8], format: ImageFormat) -> Result<RgbaImage, FormatError> {
    image::load_from_memory_with_format(bytes, format)
        .map(DynamicImage::into_rgba8)
        .map_err(FormatError::Decode)
}

/// Encode an RGBA raster with the encoder registered for `format`.
fn encode_as(raster: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>, FormatError> {
    let mut cursor = Cursor::new(Vec::new());
    image::write_buffer_with_format(
        &mut cursor,
        raster.as_raw(),
        raster.width(),
        raster.height(),
        ExtendedColorType::Rgba8,
        format,
    )
    .map_err(FormatError::Encode)?;
    Ok(cursor.into_inner())
}

/// Generates a parameterless adapter backed by a single `image` format.
macro_rules! image_crate_format {
    ($(#[$meta:meta])* $name:ident => $format:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl Importable for $name {
            fn import(&self, bytes: &[u8]) -> Result<RgbaImage, FormatError> {
                decode_as(bytes, $format)
            }
        }

        impl Exportable for $name {
            fn export(&self, raster: &RgbaImage) -> Result<Vec<u8>, FormatError> {
                encode_as(raster, $format)
            }
        }
    };
}

image_crate_format!(
    /// PNG, lossless with alpha.
    PngFormat => ImageFormat::Png
);
image_crate_format!(
    /// GIF. The encoder quantizes to a 256-color palette.
    GifFormat => ImageFormat::Gif
);
image_crate_format!(
    /// Baseline TIFF.
    TiffFormat => ImageFormat::Tiff
);
image_crate_format!(
    /// Truevision TGA.
    TgaFormat => ImageFormat::Tga
);
image_crate_format!(
    /// WebP. Export is lossless; import accepts lossy and lossless files.
    WebpFormat => ImageFormat::WebP
);

/// JPEG with a configurable quality. JPEG has no alpha channel, so export
/// discards it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JpegFormat {
    pub quality: Quality,
}

impl Importable for JpegFormat {
    fn import(&self, bytes: &[u8]) -> Result<RgbaImage, FormatError> {
        decode_as(bytes, ImageFormat::Jpeg)
    }
}

impl Exportable for JpegFormat {
    fn export(&self, raster: &RgbaImage) -> Result<Vec<u8>, FormatError> {
        let rgb = DynamicImage::ImageRgba8(raster.clone()).into_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.quality.value())
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(FormatError::Encode)?;
        Ok(out)
    }
}

/// Windows bitmap.
///
/// `compression` requests RLE, which BMP only defines for palette images.
/// Rasters here are always truecolor, so output is uncompressed either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BmpFormat {
    pub compression: bool,
}

impl Importable for BmpFormat {
    fn import(&self, bytes: &[u8]) -> Result<RgbaImage, FormatError> {
        decode_as(bytes, ImageFormat::Bmp)
    }
}

impl Exportable for BmpFormat {
    fn export(&self, raster: &RgbaImage) -> Result<Vec<u8>, FormatError> {
        encode_as(raster, ImageFormat::Bmp)
    }
}

/// Wireless bitmap (1 bit per pixel). See [`wbmp`] for the codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WbmpFormat {
    /// Foreground color as `0xRRGGBB`; matching pixels are written black.
    pub index: u32,
}

impl Importable for WbmpFormat {
    fn import(&self, bytes: &[u8]) -> Result<RgbaImage, FormatError> {
        wbmp::decode(bytes)
    }
}

impl Exportable for WbmpFormat {
    fn export(&self, raster: &RgbaImage) -> Result<Vec<u8>, FormatError> {
        Ok(wbmp::encode(raster, self.index))
    }
}
