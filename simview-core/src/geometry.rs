//! Geometry primitives shared across the workspace.
//!
//! All coordinates are `f64`: SVG space and pixel space are both floating
//! point, and hit-test containment is boundary inclusive.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 2-D point (or displacement) in either SVG or pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid color literal `{0}`, expected `#rrggbb`")]
pub struct ColorParseError(pub String);

/// An opaque RGB color, parsed from `#rrggbb` literals.
///
/// Backgrounds are opaque by construction — the raster buffer is fully
/// overwritten every frame, so there is no alpha channel to carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Default render background, matching the documented host contract.
pub const WHITE: Color = Color {
    r: 0xff,
    g: 0xff,
    b: 0xff,
};

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` hex literal.
    pub fn from_hex(text: &str) -> Result<Self, ColorParseError> {
        let hex = text
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError(text.to_string()))?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ColorParseError(text.to_string()));
        }
        let parse = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ColorParseError(text.to_string()))
        };
        Ok(Self {
            r: parse(0..2)?,
            g: parse(2..4)?,
            b: parse(4..6)?,
        })
    }

    /// Channels as normalized floats, for GPU clear colors.
    pub fn to_f64_rgb(self) -> [f64; 3] {
        [
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        WHITE
    }
}

// ===================================================================
// Tests
// ===================================================================
