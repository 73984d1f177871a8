//! Replaying drawing operations.

use std::io::{self, Write};

use pdf_writer::Ref;
use tiny_skia_path::{Path, PathBuilder};

use super::{Failure, PageContext, Pass};
use crate::content::{ContentBuilder, Paint, PathMode};
use crate::error::{DriverResult, OpError};
use crate::geom::{Point, Rect};
use crate::object::tiling_pattern::TilingPattern;
use crate::picture::{DrawOp, DrawingMode, Pattern, Picture};
use crate::report::ReportKind;
use crate::shape;

/// Pen sizes up to this are replaced by a pen size of `1`.
const MIN_PEN_SIZE: f32 = 0.00001;

impl<W: Write> PageContext<'_, W> {
    /// Replay a list of operations. Failing operations are recorded, only fatal
    /// errors are returned.
    pub(super) fn replay(&mut self, ops: &[DrawOp]) -> DriverResult<()> {
        for op in ops {
            self.report(ReportKind::Debug, op.name());

            match self.draw_op(op) {
                Ok(()) => {}
                Err(Failure::Op(err)) => self.record(err),
                Err(Failure::Fatal(err)) => return Err(err),
            }
        }

        Ok(())
    }

    fn draw_op(&mut self, op: &DrawOp) -> Result<(), Failure> {
        let system = self.states.cur().system;

        match op {
            DrawOp::MovePenBy { delta } => {
                let pen = &mut self.states.cur_mut().pen_location;
                pen.x += delta.x;
                pen.y += delta.y;
            }
            DrawOp::StrokeLine { start, end } => {
                self.draw_path(shape::line(&system, *start, *end), PathMode::Stroke)?
            }
            DrawOp::StrokeRect { rect } => {
                self.draw_path(shape::rect(&system, rect), PathMode::Stroke)?
            }
            DrawOp::FillRect { rect } => self.draw_path(shape::rect(&system, rect), PathMode::Fill)?,
            DrawOp::StrokeRoundRect { rect, radii } => self.draw_path(
                shape::round_rect(&system, rect, *radii),
                PathMode::Stroke,
            )?,
            DrawOp::FillRoundRect { rect, radii } => {
                self.draw_path(shape::round_rect(&system, rect, *radii), PathMode::Fill)?
            }
            DrawOp::StrokeBezier { control } => {
                self.draw_path(shape::bezier(&system, control, false), PathMode::Stroke)?
            }
            DrawOp::FillBezier { control } => {
                self.draw_path(shape::bezier(&system, control, true), PathMode::Fill)?
            }
            DrawOp::StrokeArc {
                center,
                radii,
                start_theta,
                arc_theta,
            } => self.stroke_arc(*center, *radii, *start_theta, *arc_theta)?,
            DrawOp::FillArc {
                center,
                radii,
                start_theta,
                arc_theta,
            } => {
                let transform = shape::arc_transform(&system, *center, *radii);
                let path = shape::unit_arc(*start_theta, *arc_theta, true)
                    .and_then(|path| path.transform(transform));
                self.draw_path(path, PathMode::Fill)?
            }
            DrawOp::StrokeEllipse { center, radii } => {
                self.draw_path(shape::ellipse(&system, *center, *radii), PathMode::Stroke)?
            }
            DrawOp::FillEllipse { center, radii } => {
                self.draw_path(shape::ellipse(&system, *center, *radii), PathMode::Fill)?
            }
            DrawOp::StrokePolygon { points, closed } => {
                self.draw_path(shape::polygon(&system, points, *closed), PathMode::Stroke)?
            }
            DrawOp::FillPolygon { points, closed } => {
                self.draw_path(shape::polygon(&system, points, *closed), PathMode::Fill)?
            }
            DrawOp::StrokeShape { shape: ops } => {
                self.draw_path(shape::shape(&system, ops, false), PathMode::Stroke)?
            }
            DrawOp::FillShape { shape: ops } => {
                self.draw_path(shape::shape(&system, ops, true), PathMode::Fill)?
            }
            DrawOp::DrawString {
                text,
                escapement_no_space,
                escapement_space,
            } => self.draw_string(text, *escapement_no_space, *escapement_space)?,
            DrawOp::DrawPixels {
                src,
                dest,
                bytes_per_row,
                format,
                data,
            } => self.draw_pixels(src, dest, *bytes_per_row, *format, data)?,
            DrawOp::ClipToPicture {
                picture,
                origin,
                inverse,
            } => self.clip_to_picture(picture, *origin, *inverse)?,
            DrawOp::SetClippingRects { rects } => self.set_clipping_rects(rects),
            DrawOp::PushState => self.push_state(),
            DrawOp::PopState => self.pop_state()?,
            DrawOp::EnterStateChange
            | DrawOp::ExitStateChange
            | DrawOp::EnterFontState
            | DrawOp::ExitFontState => {}
            DrawOp::SetOrigin { origin } => self.states.set_origin(*origin),
            DrawOp::SetPenLocation { location } => self.states.cur_mut().pen_location = *location,
            DrawOp::SetDrawingMode { mode } => self.states.cur_mut().drawing_mode = *mode,
            DrawOp::SetLineMode {
                cap,
                join,
                miter_limit,
            } => {
                let line_style = &mut self.states.cur_mut().line_style;
                line_style.cap = *cap;
                line_style.join = *join;
                line_style.miter_limit = *miter_limit;
            }
            DrawOp::SetPenSize { size } => {
                let size = if *size <= MIN_PEN_SIZE { 1.0 } else { *size };
                self.states.cur_mut().line_style.width = system.scaled(size);
            }
            DrawOp::SetForeColor { color } => self.states.cur_mut().fore_color = *color,
            DrawOp::SetBackColor { color } => self.states.cur_mut().back_color = *color,
            DrawOp::SetStipplePattern { pattern } => self.states.cur_mut().pattern = *pattern,
            DrawOp::SetScale { scale } => self.states.set_scale(*scale),
            DrawOp::SetFontFamily { family } => self.states.cur_mut().font.family = family.clone(),
            DrawOp::SetFontStyle { style } => self.states.cur_mut().font.style = style.clone(),
            DrawOp::SetFontSpacing { spacing } => self.states.cur_mut().font.spacing = *spacing,
            DrawOp::SetFontSize { size } => self.states.cur_mut().font.size = *size,
            DrawOp::SetFontRotation { rotation } => {
                self.states.cur_mut().font.rotation = *rotation
            }
            DrawOp::SetFontEncoding { encoding } => {
                self.states.cur_mut().font.encoding = *encoding
            }
            DrawOp::SetFontFlags { flags } => self.states.cur_mut().font.flags = *flags,
            DrawOp::SetFontShear { shear } => self.states.cur_mut().font.shear = *shear,
            DrawOp::SetFontFace { face } => self.states.cur_mut().font.face = *face,
        }

        Ok(())
    }

    /// The paint of the current state and the alpha it is painted with.
    ///
    /// Solid patterns use one of the colors directly, all others a tiling pattern.
    /// Tiling patterns are created while collecting, a pattern that is missing when
    /// rendering falls back to the high color.
    pub(super) fn resolve_paint(&mut self) -> Result<(Paint, u8), Failure> {
        let state = self.states.cur();
        let (pattern, fore, back) = (state.pattern, state.fore_color, state.back_color);

        if pattern == Pattern::SOLID_HIGH {
            return Ok((Paint::Color(fore), fore.a));
        }

        if pattern == Pattern::SOLID_LOW {
            return Ok((Paint::Color(back), back.a));
        }

        let tiling_pattern = TilingPattern::new(pattern, fore, back);

        let paint = match self.pass {
            Pass::CollectPatterns => Paint::Pattern(self.job.tiling_pattern(tiling_pattern)?),
            Pass::Render => match self.job.patterns.get(&tiling_pattern).copied() {
                Some(pattern_ref) => Paint::Pattern(pattern_ref),
                None => {
                    self.record(OpError::MissingPattern);
                    Paint::Color(fore)
                }
            },
        };

        Ok((paint, fore.a))
    }

    /// The graphics state making drawing with `alpha` transparent, if transparency
    /// applies. While collecting, the graphics state is only created.
    fn transparency(&mut self, alpha: u8) -> io::Result<Option<Ref>> {
        let state = self.states.cur();

        if alpha == u8::MAX
            || state.clipping
            || state.drawing_mode != DrawingMode::Alpha
            || !self.job.settings.pdf_compatibility.supports_opacity()
        {
            return Ok(None);
        }

        let ext_g_state = self.job.ext_g_state(alpha)?;

        Ok(match self.pass {
            Pass::CollectPatterns => None,
            Pass::Render => Some(ext_g_state),
        })
    }

    /// Paint with the transparency of `alpha`, isolated from the surrounding state.
    /// Nothing is painted while collecting.
    pub(super) fn paint(
        &mut self,
        alpha: u8,
        op: impl FnOnce(&mut ContentBuilder),
    ) -> io::Result<()> {
        let ext_g_state = self.transparency(alpha)?;

        if !self.is_rendering() {
            return Ok(());
        }

        self.content.apply_isolated_op(|content| {
            if let Some(ext_g_state) = ext_g_state {
                content.set_ext_g_state(ext_g_state);
            }

            op(content);
        });

        Ok(())
    }

    /// Stroke or fill a path, or add it to the clip path while clipping.
    fn draw_path(&mut self, path: Option<Path>, mode: PathMode) -> Result<(), Failure> {
        let (paint, alpha) = self.resolve_paint()?;

        let Some(path) = path else {
            return Ok(());
        };

        let state = self.states.cur();

        if state.clipping {
            self.content.draw_path(&path, PathMode::Clip);
            return Ok(());
        }

        let line_style = state.line_style;

        self.paint(alpha, |content| match mode {
            PathMode::Stroke => {
                content.set_stroke_paint(paint);
                content.set_line_style(&line_style);
                content.draw_path(&path, PathMode::Stroke);
            }
            PathMode::Fill | PathMode::Clip => {
                content.set_fill_paint(paint);
                content.draw_path(&path, PathMode::Fill);
            }
        })?;

        Ok(())
    }

    /// Stroke an arc. The unit arc is stroked in a coordinate system scaled to the
    /// radii, so the line width is divided by the larger scale.
    fn stroke_arc(
        &mut self,
        center: Point,
        radii: Point,
        start_theta: f32,
        arc_theta: f32,
    ) -> Result<(), Failure> {
        let (paint, alpha) = self.resolve_paint()?;
        let state = self.states.cur();
        let transform = shape::arc_transform(&state.system, center, radii);

        let Some(arc) = shape::unit_arc(start_theta, arc_theta, false) else {
            return Ok(());
        };

        if state.clipping {
            if let Some(path) = arc.transform(transform) {
                self.content.draw_path(&path, PathMode::Clip);
            }

            return Ok(());
        }

        let scale = transform.sx.abs().max(transform.sy.abs());

        if scale == 0.0 {
            return Ok(());
        }

        let mut line_style = state.line_style;
        line_style.width /= scale;

        self.paint(alpha, |content| {
            content.concat_transform(&transform);
            content.set_stroke_paint(paint);
            content.set_line_style(&line_style);
            content.draw_path(&arc, PathMode::Stroke);
        })?;

        Ok(())
    }

    /// Intersect the clip path with the paths drawn by a picture.
    fn clip_to_picture(
        &mut self,
        picture: &Picture,
        origin: Point,
        inverse: bool,
    ) -> Result<(), Failure> {
        if inverse {
            return Err(OpError::InverseClip.into());
        }

        if self.states.cur().clipping {
            return Err(OpError::NestedClip.into());
        }

        let depth = self.states.depth();
        self.states.push_internal();

        if origin != Point::default() {
            self.states.set_origin(origin);
            self.states.push_internal();
        }

        self.states.cur_mut().clipping = true;
        let result = self.replay_nested(&picture.ops);

        if result.is_ok() {
            self.content.apply_clip();
        }

        self.pop_to(depth);

        Ok(result?)
    }

    /// Intersect the clip path with the union of rectangles. While clipping, the
    /// rectangles become part of the clip path being collected.
    fn set_clipping_rects(&mut self, rects: &[Rect]) {
        let state = self.states.cur();
        let mapped: Vec<_> = rects
            .iter()
            .filter_map(|rect| state.system.map_rect(rect))
            .collect();

        if state.clipping {
            for rect in mapped {
                self.content
                    .draw_path(&PathBuilder::from_rect(rect), PathMode::Clip);
            }
        } else {
            self.content.clip_rects(&mapped);
        }
    }
}
