//! Wireless bitmap (WBMP, type 0) codec.
//!
//! The `image` crate has no WBMP support, and the format is small enough to
//! carry here. Layout:
//!
//! ```text
//! type        multi-byte int   must be 0
//! fix header  u8               bit 7 set = extension headers follow
//! [ext ...]   u8*              skipped while bit 7 is set
//! width       multi-byte int
//! height      multi-byte int
//! rows        height * ceil(width / 8) bytes, MSB first, 1 = white, 0 = black
//! ```
//!
//! Multi-byte ints are big-endian groups of 7 bits; bit 7 marks continuation.

use super::FormatError;
use image::{Rgba, RgbaImage};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Upper bound on either edge; keeps a hostile header from requesting an
/// absurd allocation before the row data is checked.
const MAX_EDGE: u32 = 1 << 16;

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8, FormatError> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| FormatError::Wbmp("unexpected end of header".into()))?;
        self.pos += 1;
        Ok(b)
    }

    fn multibyte(&mut self) -> Result<u32, FormatError> {
        let mut value: u32 = 0;
        loop {
            let b = self.byte()?;
            value = value
                .checked_mul(128)
                .map(|v| v | u32::from(b & 0x7f))
                .ok_or_else(|| FormatError::Wbmp("multi-byte integer overflow".into()))?;
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

/// Decode a type-0 WBMP into an opaque black-and-white raster.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, FormatError> {
    let mut reader = Reader::new(bytes);

    let kind = reader.multibyte()?;
    if kind != 0 {
        return Err(FormatError::Wbmp(format!("unsupported WBMP type {kind}")));
    }

    let mut fix_header = reader.byte()?;
    while fix_header & 0x80 != 0 {
        fix_header = reader.byte()?;
    }

    let width = reader.multibyte()?;
    let height = reader.multibyte()?;
    if width == 0 || height == 0 {
        return Err(FormatError::Wbmp(format!(
            "invalid dimensions {width}x{height}"
        )));
    }
    if width > MAX_EDGE || height > MAX_EDGE {
        return Err(FormatError::Wbmp(format!(
            "dimensions {width}x{height} exceed {MAX_EDGE}"
        )));
    }

    let stride = width.div_ceil(8) as usize;
    let rows = reader.rest();
    let needed = stride * height as usize;
    if rows.len() < needed {
        return Err(FormatError::Wbmp(format!(
            "truncated bitmap: need {needed} bytes, found {}",
            rows.len()
        )));
    }

    Ok(RgbaImage::from_fn(width, height, |x, y| {
        let byte = rows[y as usize * stride + (x / 8) as usize];
        if byte & (0x80 >> (x % 8)) != 0 {
            WHITE
        } else {
            BLACK
        }
    }))
}

/// Encode a raster as type-0 WBMP. Pixels whose RGB equals `index`
/// (`0xRRGGBB`) are black; everything else is white.
pub fn encode(raster: &RgbaImage, index: u32) -> Vec<u8> {
    let [_, fr, fg, fb] = index.to_be_bytes();
    let (width, height) = raster.dimensions();
    let stride = width.div_ceil(8) as usize;

    let mut out = vec![0u8, 0u8];
    write_multibyte(&mut out, width);
    write_multibyte(&mut out, height);

    let header_len = out.len();
    out.resize(header_len + stride * height as usize, 0);
    let rows = &mut out[header_len..];

    for (x, y, pixel) in raster.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        if (r, g, b) != (fr, fg, fb) {
            rows[y as usize * stride + (x / 8) as usize] |= 0x80 >> (x % 8);
        }
    }
    out
}

fn write_multibyte(out: &mut Vec<u8>, value: u32) {
    let mut groups = vec![(value & 0x7f) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        groups.push((rest & 0x7f) as u8 | 0x80);
        rest >>= 7;
    }
    out.extend(groups.iter().rev());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multibyte_encodes_large_values() {
        let mut out = Vec::new();
        write_multibyte(&mut out, 200);
        assert_eq!(out, vec![0x81, 0x48]);

        let mut reader = Reader::new(&out);
        assert_eq!(reader.multibyte().unwrap(), 200);
    }

    #[test]
    fn decode_known_bitmap() {
        // 3x2: row 0 = white, black, white; row 1 = black, black, white
        let bytes = [0x00, 0x00, 0x03, 0x02, 0b1010_0000, 0b0010_0000];
        let raster = decode(&bytes).unwrap();
        assert_eq!(raster.dimensions(), (3, 2));
        assert_eq!(*raster.get_pixel(0, 0), WHITE);
        assert_eq!(*raster.get_pixel(1, 0), BLACK);
        assert_eq!(*raster.get_pixel(2, 0), WHITE);
        assert_eq!(*raster.get_pixel(0, 1), BLACK);
        assert_eq!(*raster.get_pixel(2, 1), WHITE);
    }

    #[test]
    fn decode_skips_extension_headers() {
        let bytes = [0x00, 0x80, 0x81, 0x00, 0x01, 0x01, 0x80];
        let raster = decode(&bytes).unwrap();
        assert_eq!(*raster.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn encode_marks_foreground_black() {
        let mut raster = RgbaImage::from_pixel(10, 1, Rgba([255, 255, 255, 255]));
        raster.put_pixel(0, 0, Rgba([0x12, 0x34, 0x56, 255]));
        raster.put_pixel(9, 0, Rgba([0x12, 0x34, 0x56, 0]));

        let bytes = encode(&raster, 0x123456);
        // header: type, fix header, width 10, height 1
        assert_eq!(&bytes[..4], &[0x00, 0x00, 0x0a, 0x01]);
        // 10 pixels → 2 bytes per row; first and last pixel cleared
        assert_eq!(&bytes[4..], &[0b0111_1111, 0b1000_0000]);
    }

    #[test]
    fn encode_then_decode_keeps_pattern() {
        let raster = RgbaImage::from_fn(9, 4, |x, y| if (x + y) % 2 == 0 { BLACK } else { WHITE });
        let decoded = decode(&encode(&raster, 0x000000)).unwrap();
        assert_eq!(decoded, raster);
    }

    #[test]
    fn decode_rejects_nonzero_type() {
        assert!(matches!(
            decode(&[0x01, 0x00, 0x01, 0x01, 0x00]),
            Err(FormatError::Wbmp(_))
        ));
    }

    #[test]
    fn decode_rejects_zero_dimensions() {
        assert!(decode(&[0x00, 0x00, 0x00, 0x01]).is_err());
    }

    #[test]
    fn decode_rejects_truncated_rows() {
        assert!(decode(&[0x00, 0x00, 0x10, 0x02, 0xff]).is_err());
    }

    #[test]
    fn decode_rejects_empty_input() {
        assert!(decode(&[]).is_err());
    }
}
