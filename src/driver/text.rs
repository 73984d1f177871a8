//! Drawing strings.
//!
//! Every character is mapped to an encoding on its own, so a single string may use
//! several PDF fonts. The string is drawn as one text object, switching fonts where
//! the encoding changes.

use std::io::Write;

use pdf_writer::Ref;
use tiny_skia_path::{Path, PathBuilder, Point, Rect, Transform};

use super::{Failure, PageContext};
use crate::content::{Paint, PathMode};
use crate::font::outline::{box_path, glyph_path};
use crate::font::{char_width, resolve_glyph, vertical_metrics, FontEncoding, FontFormat};
use crate::picture::{decode_text, FontSpec};
use crate::report::ReportKind;
use crate::text::TextSegment;

/// The font used when the requested one can't be created.
const FALLBACK_FONT: &str = "Helvetica";

/// Offset and thickness of an underline, in em.
const UNDERLINE_OFFSET: f32 = -0.12;
const STRIKEOUT_OFFSET: f32 = 0.3;
const DECORATION_THICKNESS: f32 = 0.05;

/// A character placed in a text object.
struct PlacedGlyph {
    font: Ref,
    code: Vec<u8>,
    matrix: [f32; 6],
}

impl<W: Write> PageContext<'_, W> {
    pub(super) fn draw_string(
        &mut self,
        bytes: &[u8],
        escapement_no_space: f32,
        escapement_space: f32,
    ) -> Result<(), Failure> {
        let state = self.states.cur();
        let font = state.font.clone();
        let system = state.system;
        let clipping = state.clipping;
        let fore = state.fore_color;
        let start = state.pen_location;

        let text = decode_text(bytes, font.encoding);

        if text.is_empty() {
            return Ok(());
        }

        let name = font.name();
        let job = &mut *self.job;
        let metrics = job.font_cache.metrics(&job.fonts, &name);
        let metrics = metrics.as_deref();
        let format = job.fonts.table_format(&name);
        let embeddable = job.fonts.embeddable(&name, job.settings.max_embed_font_size);

        if self.is_rendering() {
            self.job.used_fonts.insert(name.clone());
        }

        let (sin, cos) = font.rotation.to_radians().sin_cos();
        let shear = (90.0 - font.shear).to_radians().tan();
        let size = system.scaled(font.size);
        let (ascent, descent) = vertical_metrics(metrics, size);

        let mut pen = start;
        let mut advance = 0.0;
        let mut edges = vec![system.tx(pen.x)];
        let mut glyphs = vec![];
        let mut clip_paths = vec![];

        for c in text.chars() {
            let matrix = [
                cos,
                sin,
                shear * cos - sin,
                shear * sin + cos,
                system.tx(pen.x),
                system.ty(pen.y),
            ];
            let width = char_width(metrics, c, font.size);

            if clipping {
                let path = metrics
                    .and_then(|m| glyph_path(m, c, size))
                    .or_else(|| box_path(system.scaled(width), ascent))
                    .and_then(|path| path.transform(to_transform(matrix)));

                clip_paths.extend(path);
            } else if let Some((font_ref, code)) = self.place_glyph(c, &name, format, embeddable)? {
                glyphs.push(PlacedGlyph {
                    font: font_ref,
                    code,
                    matrix,
                });
            }

            let width = width
                + if c <= ' ' {
                    escapement_space
                } else {
                    escapement_no_space
                };

            pen.x += width * cos;
            pen.y -= width * sin;
            advance += width;
            edges.push(system.tx(pen.x));
        }

        self.states.cur_mut().pen_location = pen;

        if clipping {
            for path in &clip_paths {
                self.content.draw_path(path, PathMode::Clip);
            }
        } else {
            let origin = Point::from_xy(system.tx(start.x), system.ty(start.y));
            let decorations = decorations(&font, origin, system.scaled(advance), size, sin, cos);
            let outlined = font.face.outlined;

            self.paint(fore.a, |content| {
                content.set_fill_paint(Paint::Color(fore));

                if outlined {
                    content.set_stroke_paint(Paint::Color(fore));
                }

                if !glyphs.is_empty() {
                    content.begin_text(outlined);
                    let mut current = None;

                    for glyph in &glyphs {
                        if current != Some(glyph.font) {
                            content.set_font(glyph.font, size);
                            current = Some(glyph.font);
                        }

                        content.show_glyph(glyph.matrix, &glyph.code);
                    }

                    content.end_text();
                }

                for path in &decorations {
                    content.draw_path(path, PathMode::Fill);
                }
            })?;
        }

        // Rotated text can't be searched for links or headings.
        if font.rotation == 0.0 {
            let start = Point::from_xy(system.tx(start.x), system.ty(start.y));

            if let Some(segment) = TextSegment::new(
                text,
                start,
                escapement_space,
                escapement_no_space,
                edges,
                ascent,
                descent,
                font,
            ) {
                if let Some(line) = self.line.add(segment) {
                    self.process_line(line)?;
                }
            }
        }

        Ok(())
    }

    /// Find the PDF font and the code of a character.
    ///
    /// Characters are mapped in both passes so that user encodings are declared in
    /// the same order, but fonts are only created when rendering.
    fn place_glyph(
        &mut self,
        c: char,
        name: &str,
        format: FontFormat,
        embeddable: bool,
    ) -> Result<Option<(Ref, Vec<u8>)>, Failure> {
        let job = &mut *self.job;
        let resolved = resolve_glyph(
            c,
            format,
            embeddable,
            &mut job.user_encodings,
            &job.settings.cjk_order,
        );

        let Some(resolved) = resolved else {
            if self.is_rendering() && !self.job.reported_unmappable {
                self.job.reported_unmappable = true;
                self.report(
                    ReportKind::Warning,
                    format!(
                        "no encoding for U+{:04X}, characters without an encoding are skipped",
                        c as u32
                    ),
                );
            }

            return Ok(None);
        };

        if !self.is_rendering() {
            return Ok(None);
        }

        let job = &mut *self.job;
        let max_embed_size = job.settings.max_embed_font_size;
        let found = job.font_cache.find_font(
            name,
            resolved.embed,
            resolved.encoding,
            &job.fonts,
            max_embed_size,
            || job.sc.new_ref(),
        );

        let index = match found {
            Ok(index) => index,
            Err(err) => {
                self.record(err);
                let job = &mut *self.job;
                job.font_cache.find_font(
                    FALLBACK_FONT,
                    false,
                    FontEncoding::MacRoman,
                    &job.fonts,
                    max_embed_size,
                    || job.sc.new_ref(),
                )?
            }
        };

        let font_ref = self.job.font_cache.get(index).font_ref;

        Ok(Some((font_ref, resolved.code.to_bytes())))
    }
}

fn to_transform(matrix: [f32; 6]) -> Transform {
    let [sx, ky, kx, sy, tx, ty] = matrix;
    Transform::from_row(sx, ky, kx, sy, tx, ty)
}

/// The underline and strikeout of a run of text of `length` starting at `origin`
/// on the baseline, in PDF space.
fn decorations(
    font: &FontSpec,
    origin: Point,
    length: f32,
    size: f32,
    sin: f32,
    cos: f32,
) -> Vec<Path> {
    let mut offsets = vec![];

    if font.face.underscore {
        offsets.push(UNDERLINE_OFFSET);
    }

    if font.face.strikeout {
        offsets.push(STRIKEOUT_OFFSET);
    }

    let thickness = DECORATION_THICKNESS * size;
    let transform = Transform::from_row(cos, sin, -sin, cos, origin.x, origin.y);

    offsets
        .into_iter()
        .filter_map(|offset| {
            let rect = Rect::from_xywh(0.0, offset * size - thickness / 2.0, length, thickness)?;
            PathBuilder::from_rect(rect).transform(transform)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picture::FontFace;

    #[test]
    fn decorations_follow_the_baseline() {
        let font = FontSpec {
            face: FontFace {
                underscore: true,
                strikeout: true,
                outlined: false,
            },
            ..FontSpec::default()
        };

        let paths = decorations(&font, Point::from_xy(10.0, 100.0), 50.0, 20.0, 0.0, 1.0);
        assert_eq!(paths.len(), 2);

        let underline = paths[0].bounds();
        assert_eq!(underline.left(), 10.0);
        assert_eq!(underline.right(), 60.0);
        assert!(underline.bottom() < 100.0);

        assert!(paths[1].bounds().top() > 100.0);
    }

    #[test]
    fn no_decorations_for_plain_text() {
        let paths = decorations(&FontSpec::default(), Point::zero(), 50.0, 12.0, 0.0, 1.0);
        assert!(paths.is_empty());
    }
}
