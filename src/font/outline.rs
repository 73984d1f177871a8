//! Glyph outlines, used when text becomes part of a clip path.

use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::MetadataProvider;
use tiny_skia_path::{Path, PathBuilder, Rect};

use crate::font::LoadedFont;

/// The outline of the glyph of a character at a font size, with the baseline origin
/// at `(0, 0)` and the y axis pointing up.
pub(crate) fn glyph_path(font: &LoadedFont, c: char, size: f32) -> Option<Path> {
    let font_ref = font.font_ref()?;
    let glyph = font_ref.charmap().map(c)?;
    let outline_glyph = font_ref.outline_glyphs().get(glyph)?;
    let mut outline_builder = OutlineBuilder::new();

    outline_glyph
        .draw(
            DrawSettings::unhinted(Size::new(size), LocationRef::default()),
            &mut outline_builder,
        )
        .ok()?;

    outline_builder.finish()
}

/// A hollow box standing in for a glyph that doesn't exist.
///
/// The frame is a tenth of the smaller side thick, inset by the same amount.
pub(crate) fn box_path(width: f32, ascent: f32) -> Option<Path> {
    if width <= 0.0 || ascent <= 0.0 {
        return None;
    }

    let inset = width.min(ascent) * 0.1;
    let outer = Rect::from_ltrb(inset, inset, width - inset, ascent - inset)?;
    let inner = Rect::from_ltrb(
        3.0 * inset,
        3.0 * inset,
        width - 3.0 * inset,
        ascent - 3.0 * inset,
    );

    let mut builder = PathBuilder::new();
    builder.move_to(outer.left(), outer.top());
    builder.line_to(outer.right(), outer.top());
    builder.line_to(outer.right(), outer.bottom());
    builder.line_to(outer.left(), outer.bottom());
    builder.close();

    // The hole winds the other way, so it stays open with the nonzero rule.
    if let Some(inner) = inner {
        builder.move_to(inner.left(), inner.top());
        builder.line_to(inner.left(), inner.bottom());
        builder.line_to(inner.right(), inner.bottom());
        builder.line_to(inner.right(), inner.top());
        builder.close();
    }

    builder.finish()
}

/// A wrapper struct for implementing the `OutlinePen` trait.
pub(crate) struct OutlineBuilder(PathBuilder);

impl OutlineBuilder {
    pub(crate) fn new() -> Self {
        Self(PathBuilder::new())
    }

    pub(crate) fn finish(self) -> Option<Path> {
        self.0.finish()
    }
}

impl OutlinePen for OutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to(x, y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.0.quad_to(cx0, cy0, x, y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.0.cubic_to(cx0, cy0, cx1, cy1, x, y);
    }

    fn close(&mut self) {
        self.0.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_has_frame_and_hole() {
        let path = box_path(10.0, 20.0).unwrap();
        let bounds = path.bounds();
        assert_eq!(bounds.left(), 1.0);
        assert_eq!(bounds.right(), 9.0);
        assert_eq!(bounds.bottom(), 19.0);
        // Two closed subpaths of four lines each.
        assert_eq!(path.points().len(), 8);
    }

    #[test]
    fn degenerate_box() {
        assert!(box_path(0.0, 10.0).is_none());
    }
}
