//! RGBA colors with components in the `0.0..=1.0` range.
//!
//! Colors can be built from components, from 8-bit channels, or parsed from
//! hex strings. Hex input is sanitized before parsing: surrounding whitespace
//! and a leading `#` are stripped and case is ignored. Accepted lengths:
//!
//! | Digits | Layout |
//! |---|---|
//! | 3 | `rgb` (each digit doubled) |
//! | 4 | `rgba` (each digit doubled) |
//! | 6 | `rrggbb` (opaque) |
//! | 8 | `rrggbbaa` |

use image::Rgba;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid hex color {input:?}: {reason}")]
    InvalidHex { input: String, reason: String },
}

/// A four-component color. Components outside `0.0..=1.0` are clamped when
/// the color is converted to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Opaque color.
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::new(red, green, blue, 1.0)
    }

    /// Build from a packed `0xRRGGBB` value with the given alpha.
    pub fn from_rgb_hex(value: u32, alpha: f64) -> Self {
        let [_, r, g, b] = value.to_be_bytes();
        Self::new(channel(r), channel(g), channel(b), alpha)
    }

    /// Parse a hex string such as `"#ff8800"`, `"F80"` or `"ff880080"`.
    pub fn from_hex(input: &str) -> Result<Self, ColorError> {
        let digits = sanitize_hex(input);
        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(invalid(input, format!("unexpected character {bad:?}")));
        }

        let expanded: String = match digits.len() {
            3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => digits,
            n => {
                return Err(invalid(
                    input,
                    format!("expected 3, 4, 6 or 8 hex digits, found {n}"),
                ));
            }
        };

        let bytes: Vec<u8> = (0..expanded.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&expanded[i..i + 2], 16))
            .collect::<Result<_, _>>()
            .map_err(|e| invalid(input, e.to_string()))?;

        let alpha = bytes.get(3).copied().unwrap_or(u8::MAX);
        Ok(Self::from_rgba8(Rgba([bytes[0], bytes[1], bytes[2], alpha])))
    }

    pub fn from_rgba8(pixel: Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        Self::new(channel(r), channel(g), channel(b), channel(a))
    }

    pub fn to_rgba8(self) -> Rgba<u8> {
        Rgba([
            quantize(self.red),
            quantize(self.green),
            quantize(self.blue),
            quantize(self.alpha),
        ])
    }

    /// Lowercase `rrggbbaa` form, without the `#`.
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.to_rgba8().0;
        format!("{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        color.to_rgba8()
    }
}

fn sanitize_hex(input: &str) -> String {
    let trimmed = input.trim();
    trimmed
        .strip_prefix('#')
        .unwrap_or(trimmed)
        .to_ascii_lowercase()
}

fn invalid(input: &str, reason: String) -> ColorError {
    ColorError::InvalidHex {
        input: input.to_string(),
        reason,
    }
}

fn channel(value: u8) -> f64 {
    f64::from(value) / 255.0
}

fn quantize(component: f64) -> u8 {
    (component.clamp(0.0, 1.0) * 255.0).round() as u8
}
