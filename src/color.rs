//! Colors.

use serde::{Deserialize, Serialize};

/// An RGB color with an alpha channel.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::black()
    }
}

impl Rgba {
    /// Create a new color.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a new opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Create an opaque black color.
    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    /// Create an opaque white color.
    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Whether the color counts as invisible when painting patterns.
    pub fn is_transparent(&self) -> bool {
        self.a < 128
    }

    pub(crate) fn to_pdf_color(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_color() {
        assert_eq!(Rgba::rgb(255, 0, 51).to_pdf_color(), [1.0, 0.0, 0.2]);
    }

    #[test]
    fn alpha_defaults_to_opaque() {
        let color: Rgba = serde_json::from_str(r#"{"r": 1, "g": 2, "b": 3}"#).unwrap();
        assert_eq!(color, Rgba::rgb(1, 2, 3));
        assert!(!color.is_transparent());
    }
}
