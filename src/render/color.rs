//! RGBA colour used by drawing commands.
//!
//! Channels are straight (non-premultiplied) `u8` values, which is what the
//! backends consume directly.
//!
//! ```rust
//! use gosub_render2d::render::Color;
//!
//! let tint = Color::rgb(255, 128, 0);
//! assert_eq!(Color::WHITE.modulate(tint), tint);
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel (opacity)
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0, 255);
    pub const GREEN: Color = Color::new(0, 255, 0, 255);
    pub const BLUE: Color = Color::new(0, 0, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    /// Opaque colour.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 255 }
    }

    /// Creates a colour from `f32` channel values in the range `0.0 ..= 1.0`.
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Color {
        Color {
            r: unit_to_u8(r),
            g: unit_to_u8(g),
            b: unit_to_u8(b),
            a: unit_to_u8(a),
        }
    }

    /// Component-wise multiply, as used for tinting.
    pub fn modulate(self, other: Color) -> Color {
        Color {
            r: mul_u8(self.r, other.r),
            g: mul_u8(self.g, other.g),
            b: mul_u8(self.b, other.b),
            a: mul_u8(self.a, other.a),
        }
    }

    /// Scales the RGB channels by `factor`, leaving alpha untouched.
    pub fn scale_rgb(self, factor: f64) -> Color {
        let scale = |c: u8| (c as f64 * factor).round().clamp(0.0, 255.0) as u8;
        Color {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
            a: self.a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Color {
    fn from(c: [u8; 4]) -> Self {
        Color::new(c[0], c[1], c[2], c[3])
    }
}

fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

// (a * b) / 255 with rounding
pub(crate) fn mul_u8(a: u8, b: u8) -> u8 {
    let t = a as u32 * b as u32 + 128;
    (((t >> 8) + t) >> 8) as u8
}
