//! A low-level abstraction over a single content stream.
//!
//! All geometry handed to the [`ContentBuilder`] is already in PDF space. The
//! builder registers every object it uses in the page's resource dictionary.

use pdf_writer::types::{ColorSpaceOperand, TextRenderingMode};
use pdf_writer::{Content, Ref, Str};
use tiny_skia_path::{Path, PathSegment, Rect, Transform};

use crate::color::Rgba;
use crate::picture::{LineCap, LineJoin};
use crate::resource;
use crate::resource::{ResourceDictionary, ResourceDictionaryBuilder};
use crate::util::{LineCapExt, LineJoinExt, NameExt};

/// What fills or strokes a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Paint {
    Color(Rgba),
    /// A tiling pattern.
    Pattern(Ref),
}

/// What to do with a path once it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PathMode {
    Fill,
    Stroke,
    /// Only emit the geometry, the path becomes part of a clip path.
    Clip,
}

/// The line attributes of strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LineStyle {
    pub(crate) width: f32,
    pub(crate) cap: LineCap,
    pub(crate) join: LineJoin,
    pub(crate) miter_limit: f32,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
        }
    }
}

pub(crate) struct ContentBuilder {
    rd_builder: ResourceDictionaryBuilder,
    content: Content,
    depth: usize,
    /// Paths were emitted in [`PathMode::Clip`] and not yet clipped to.
    pending_clip: bool,
}

impl ContentBuilder {
    pub(crate) fn new() -> Self {
        Self {
            rd_builder: ResourceDictionaryBuilder::new(),
            content: Content::new(),
            depth: 0,
            pending_clip: false,
        }
    }

    pub(crate) fn finish(self) -> (Vec<u8>, ResourceDictionary) {
        debug_assert_eq!(self.depth, 0);
        (self.content.finish(), self.rd_builder.finish())
    }

    pub(crate) fn save_state(&mut self) {
        self.depth += 1;
        self.content.save_state();
    }

    pub(crate) fn restore_state(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.content.restore_state();
    }

    /// The number of unbalanced `q` operators.
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Run `op` between `q` and `Q`, so that nothing it sets leaks into the
    /// surrounding state.
    pub(crate) fn apply_isolated_op(&mut self, op: impl FnOnce(&mut Self)) {
        self.save_state();
        op(self);
        self.restore_state();
    }

    pub(crate) fn concat_transform(&mut self, transform: &Transform) {
        let Transform {
            sx,
            ky,
            kx,
            sy,
            tx,
            ty,
        } = *transform;
        self.content.transform([sx, ky, kx, sy, tx, ty]);
    }

    /// Apply a graphics state, used for constant opacity.
    pub(crate) fn set_ext_g_state(&mut self, ext_g_state: Ref) {
        let name = self
            .rd_builder
            .register_resource::<resource::ExtGState>(ext_g_state);
        self.content.set_parameters(name.to_pdf_name());
    }

    pub(crate) fn set_fill_paint(&mut self, paint: Paint) {
        match paint {
            Paint::Color(color) => {
                let [r, g, b] = color.to_pdf_color();
                self.content.set_fill_rgb(r, g, b);
            }
            Paint::Pattern(pattern) => {
                let name = self.rd_builder.register_resource::<resource::Pattern>(pattern);
                self.content.set_fill_color_space(ColorSpaceOperand::Pattern);
                self.content.set_fill_pattern(None, name.to_pdf_name());
            }
        }
    }

    pub(crate) fn set_stroke_paint(&mut self, paint: Paint) {
        match paint {
            Paint::Color(color) => {
                let [r, g, b] = color.to_pdf_color();
                self.content.set_stroke_rgb(r, g, b);
            }
            Paint::Pattern(pattern) => {
                let name = self.rd_builder.register_resource::<resource::Pattern>(pattern);
                self.content
                    .set_stroke_color_space(ColorSpaceOperand::Pattern);
                self.content.set_stroke_pattern(None, name.to_pdf_name());
            }
        }
    }

    pub(crate) fn set_line_style(&mut self, style: &LineStyle) {
        // Only write if they don't correspond to the default values as defined in the
        // PDF specification.
        if style.width != 1.0 {
            self.content.set_line_width(style.width);
        }

        if style.miter_limit != 10.0 {
            self.content.set_miter_limit(style.miter_limit);
        }

        if style.cap != LineCap::Butt {
            self.content.set_line_cap(style.cap.to_pdf_line_cap());
        }

        if style.join != LineJoin::Miter {
            self.content.set_line_join(style.join.to_pdf_line_join());
        }
    }

    /// Emit a path and paint it.
    pub(crate) fn draw_path(&mut self, path: &Path, mode: PathMode) {
        let bounds = path.bounds();

        // Zero-size geometry, don't draw.
        if mode != PathMode::Clip && bounds.width() == 0.0 && bounds.height() == 0.0 {
            return;
        }

        // Some viewers slightly fill zero-area paths.
        if mode == PathMode::Fill && (bounds.width() == 0.0 || bounds.height() == 0.0) {
            return;
        }

        self.content_draw_path(path.segments());

        match mode {
            PathMode::Fill => {
                self.content.fill_nonzero();
            }
            PathMode::Stroke => {
                self.content.stroke();
            }
            PathMode::Clip => self.pending_clip = true,
        }
    }

    /// Intersect the clip path with all paths emitted in [`PathMode::Clip`] since the
    /// last painting operator. Without any such path, everything is clipped away.
    pub(crate) fn apply_clip(&mut self) {
        if !self.pending_clip {
            self.content.rect(0.0, 0.0, 0.0, 0.0);
        }

        self.content.clip_nonzero();
        self.content.end_path();
        self.pending_clip = false;
    }

    /// Intersect the clip path with the union of rectangles.
    pub(crate) fn clip_rects(&mut self, rects: &[Rect]) {
        if rects.is_empty() {
            return;
        }

        for rect in rects {
            self.content
                .rect(rect.left(), rect.top(), rect.width(), rect.height());
        }

        self.pending_clip = true;
        self.apply_clip();
    }

    /// Paint an image XObject into the unit square transformed by `transform`.
    ///
    /// The transform stays in effect, so callers isolate the operation.
    pub(crate) fn draw_image(&mut self, image: Ref, transform: &Transform) {
        let name = self.rd_builder.register_resource::<resource::XObject>(image);

        self.concat_transform(transform);
        self.content.x_object(name.to_pdf_name());
    }

    pub(crate) fn begin_text(&mut self, outlined: bool) {
        self.content.begin_text();

        if outlined {
            self.content
                .set_text_rendering_mode(TextRenderingMode::Stroke);
        }
    }

    pub(crate) fn set_font(&mut self, font: Ref, size: f32) {
        let name = self.rd_builder.register_resource::<resource::Font>(font);
        self.content.set_font(name.to_pdf_name(), size);
    }

    /// Show the codes of a glyph with the text matrix `[a b c d e f]`.
    pub(crate) fn show_glyph(&mut self, matrix: [f32; 6], code: &[u8]) {
        self.content.set_text_matrix(matrix);
        self.content.show(Str(code));
    }

    pub(crate) fn end_text(&mut self) {
        self.content.end_text();
    }

    fn content_draw_path(&mut self, path_data: impl Iterator<Item = PathSegment>) {
        fn calc(n1: f32, n2: f32) -> f32 {
            (n1 + n2 * 2.0) / 3.0
        }

        let mut p_prev = None;

        for operation in path_data {
            match operation {
                PathSegment::MoveTo(p) => {
                    self.content.move_to(p.x, p.y);
                    p_prev = Some(p);
                }
                PathSegment::LineTo(p) => {
                    self.content.line_to(p.x, p.y);
                    p_prev = Some(p);
                }
                PathSegment::QuadTo(p1, p2) => {
                    // Since PDF doesn't support quad curves, we need to convert them into
                    // cubic.
                    let prev = p_prev.unwrap_or(p1);
                    self.content.cubic_to(
                        calc(prev.x, p1.x),
                        calc(prev.y, p1.y),
                        calc(p2.x, p1.x),
                        calc(p2.y, p1.y),
                        p2.x,
                        p2.y,
                    );
                    p_prev = Some(p2);
                }
                PathSegment::CubicTo(p1, p2, p3) => {
                    self.content.cubic_to(p1.x, p1.y, p2.x, p2.y, p3.x, p3.y);
                    p_prev = Some(p3);
                }
                PathSegment::Close => {
                    self.content.close_path();
                }
            };
        }
    }
}
