//! Tiling patterns for stipple patterns.

use std::ops::DerefMut;

use pdf_writer::types::{PaintType, TilingType};
use pdf_writer::{Chunk, Content, Finish, Ref};

use crate::color::Rgba;
use crate::picture::Pattern;
use crate::stream::FilterStreamBuilder;

/// The side length of a pattern cell.
const CELL_SIZE: u8 = 8;

/// An 8x8 colored tiling pattern painting a stipple pattern with two colors.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub(crate) struct TilingPattern {
    pattern: Pattern,
    high: Rgba,
    low: Rgba,
}

impl TilingPattern {
    pub(crate) fn new(pattern: Pattern, high: Rgba, low: Rgba) -> Self {
        Self { pattern, high, low }
    }

    /// The content stream of a single cell.
    ///
    /// Each set bit paints a unit square in the high color, then each cleared bit
    /// one in the low color. Colors that count as transparent leave their squares
    /// unpainted.
    fn cell(&self) -> Vec<u8> {
        let mut content = Content::new();

        for (color, high) in [(self.high, true), (self.low, false)] {
            if color.is_transparent() {
                continue;
            }

            let [r, g, b] = color.to_pdf_color();
            content.set_fill_rgb(r, g, b);

            for y in 0..CELL_SIZE {
                for x in 0..CELL_SIZE {
                    if self.pattern.is_high(x, y) != high {
                        continue;
                    }

                    // Rows run top-down.
                    let x = x as f32;
                    let y = (CELL_SIZE - 1 - y) as f32;
                    content.move_to(x, y);
                    content.line_to(x + 1.0, y);
                    content.line_to(x + 1.0, y + 1.0);
                    content.line_to(x, y + 1.0);
                    content.close_path();
                    content.fill_nonzero();
                }
            }
        }

        content.finish()
    }

    pub(crate) fn serialize(self, root_ref: Ref, compression_level: Option<u8>) -> Chunk {
        let mut chunk = Chunk::new();

        let cell = self.cell();
        let pattern_stream = FilterStreamBuilder::new(&cell, compression_level).finish();
        let mut tiling_pattern = chunk.tiling_pattern(root_ref, pattern_stream.encoded_data());
        pattern_stream.write_filters(tiling_pattern.deref_mut().deref_mut());

        let size = CELL_SIZE as f32;

        tiling_pattern
            .tiling_type(TilingType::ConstantSpacing)
            .paint_type(PaintType::Colored)
            .bbox(pdf_writer::Rect::new(0.0, 0.0, size, size))
            .x_step(size)
            .y_step(size);
        tiling_pattern.resources().finish();
        tiling_pattern.finish();

        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_fills(content: &[u8]) -> usize {
        String::from_utf8_lossy(content)
            .lines()
            .filter(|l| *l == "f")
            .count()
    }

    #[test]
    fn paints_both_colors() {
        let pattern = TilingPattern::new(Pattern::MIXED_COLORS, Rgba::black(), Rgba::white());
        assert_eq!(count_fills(&pattern.cell()), 64);
    }

    #[test]
    fn transparent_colors_are_skipped() {
        let low = Rgba::new(255, 255, 255, 100);
        let pattern = TilingPattern::new(Pattern::MIXED_COLORS, Rgba::black(), low);
        assert_eq!(count_fills(&pattern.cell()), 32);
    }

    #[test]
    fn pattern_dictionary() {
        let pattern = TilingPattern::new(Pattern::MIXED_COLORS, Rgba::black(), Rgba::white());
        let chunk = pattern.serialize(Ref::new(3), None);
        let text = String::from_utf8_lossy(chunk.as_bytes()).into_owned();

        assert!(text.contains("/PatternType 1"));
        assert!(text.contains("/PaintType 1"));
        assert!(text.contains("/TilingType 1"));
        assert!(text.contains("/BBox [0 0 8 8]"));
        assert!(text.contains("/XStep 8"));
    }
}
