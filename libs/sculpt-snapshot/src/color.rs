//! # Color
//!
//! RGBA color with hex-string parsing for the snapshot boundary.

use serde::{Deserialize, Serialize};

/// An RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
    /// Alpha component.
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    /// Creates a color from an RGBA array.
    pub fn from_array(rgba: [f32; 4]) -> Self {
        Self {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        }
    }

    /// Returns the color as an RGBA array.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parses a hex color string.
    ///
    /// Accepts `#RRGGBB` and `#AARRGGBB` (alpha-first, matching the document
    /// layer's serialization). Returns `None` for anything else.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sculpt_snapshot::Color;
    ///
    /// let red = Color::parse("#ff0000").unwrap();
    /// assert_eq!(red.r, 1.0);
    /// assert_eq!(red.a, 1.0);
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#')?;
        let byte = |offset: usize| -> Option<f32> {
            u8::from_str_radix(hex.get(offset..offset + 2)?, 16)
                .ok()
                .map(|v| f32::from(v) / 255.0)
        };
        match hex.len() {
            6 => Some(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: 1.0,
            }),
            8 => Some(Self {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            _ => None,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
