//! Building the paths of drawing primitives.
//!
//! Every primitive is mapped from source space into PDF space through the
//! [`PdfSystem`] of the current state, so the resulting paths can be handed to the
//! content stream as they are. Arcs are the exception: they are built on the unit
//! circle and placed with [`arc_transform`].

use tiny_skia_path::{Path, PathBuilder, Transform};

use crate::geom::{PdfSystem, Point, Rect};
use crate::picture::ShapeOp;

/// The distance of the control points of a quarter ellipse, relative to its radius.
pub(crate) const KAPPA: f32 = 0.5523;

pub(crate) fn line(system: &PdfSystem, start: Point, end: Point) -> Option<Path> {
    let (start, end) = (system.map_point(start), system.map_point(end));

    let mut builder = PathBuilder::new();
    builder.move_to(start.x, start.y);
    builder.line_to(end.x, end.y);
    builder.finish()
}

pub(crate) fn rect(system: &PdfSystem, rect: &Rect) -> Option<Path> {
    let rect = system.map_rect(rect)?;
    Some(PathBuilder::from_rect(rect))
}

/// Append a quarter-ellipse-based outline of the box `(l, b, r, t)` with the corner
/// radii `(rx, ry)`. Radii of zero produce a plain rectangle.
fn rounded_box(builder: &mut PathBuilder, l: f32, b: f32, r: f32, t: f32, rx: f32, ry: f32) {
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);

    builder.move_to(l + rx, b);
    builder.line_to(r - rx, b);
    builder.cubic_to(r - rx + kx, b, r, b + ry - ky, r, b + ry);
    builder.line_to(r, t - ry);
    builder.cubic_to(r, t - ry + ky, r - rx + kx, t, r - rx, t);
    builder.line_to(l + rx, t);
    builder.cubic_to(l + rx - kx, t, l, t - ry + ky, l, t - ry);
    builder.line_to(l, b + ry);
    builder.cubic_to(l, b + ry - ky, l + rx - kx, b, l + rx, b);
    builder.close();
}

pub(crate) fn round_rect(system: &PdfSystem, rect: &Rect, radii: Point) -> Option<Path> {
    let mapped = system.map_rect(rect)?;
    let rx = system.scaled(radii.x).abs().min(mapped.width() / 2.0);
    let ry = system.scaled(radii.y).abs().min(mapped.height() / 2.0);

    let mut builder = PathBuilder::new();
    rounded_box(
        &mut builder,
        mapped.left(),
        mapped.top(),
        mapped.right(),
        mapped.bottom(),
        rx,
        ry,
    );
    builder.finish()
}

pub(crate) fn ellipse(system: &PdfSystem, center: Point, radii: Point) -> Option<Path> {
    let c = system.map_point(center);
    let rx = system.scaled(radii.x).abs();
    let ry = system.scaled(radii.y).abs();

    let mut builder = PathBuilder::new();
    rounded_box(&mut builder, c.x - rx, c.y - ry, c.x + rx, c.y + ry, rx, ry);
    builder.finish()
}

/// The transform placing the unit circle onto an ellipse.
pub(crate) fn arc_transform(system: &PdfSystem, center: Point, radii: Point) -> Transform {
    let c = system.map_point(center);
    Transform::from_row(
        system.scaled(radii.x),
        0.0,
        0.0,
        system.scaled(radii.y),
        c.x,
        c.y,
    )
}

/// An arc on the unit circle, starting at `start` and spanning `span` degrees
/// counter-clockwise. Filled arcs are closed through the center.
pub(crate) fn unit_arc(start: f32, span: f32, pie: bool) -> Option<Path> {
    let span = span.clamp(-360.0, 360.0);
    let segments = (span.abs() / 90.0).ceil().max(1.0) as usize;
    let step = span.to_radians() / segments as f32;
    let start = start.to_radians();

    let mut builder = PathBuilder::new();

    if pie {
        builder.move_to(0.0, 0.0);
        builder.line_to(start.cos(), start.sin());
    } else {
        builder.move_to(start.cos(), start.sin());
    }

    // Each segment spans at most 90 degrees.
    let k = 4.0 / 3.0 * (step / 4.0).tan();
    let mut a0 = start;

    for _ in 0..segments {
        let a1 = a0 + step;
        let (s0, c0) = a0.sin_cos();
        let (s1, c1) = a1.sin_cos();
        builder.cubic_to(c0 - k * s0, s0 + k * c0, c1 + k * s1, s1 - k * c1, c1, s1);
        a0 = a1;
    }

    if pie {
        builder.close();
    }

    builder.finish()
}

pub(crate) fn bezier(system: &PdfSystem, control: &[Point; 4], close: bool) -> Option<Path> {
    let [p0, p1, p2, p3] = control.map(|p| system.map_point(p));

    let mut builder = PathBuilder::new();
    builder.move_to(p0.x, p0.y);
    builder.cubic_to(p1.x, p1.y, p2.x, p2.y, p3.x, p3.y);

    if close {
        builder.close();
    }

    builder.finish()
}

pub(crate) fn polygon(system: &PdfSystem, points: &[Point], close: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let first = system.map_point(*first);

    let mut builder = PathBuilder::new();
    builder.move_to(first.x, first.y);

    for p in rest {
        let p = system.map_point(*p);
        builder.line_to(p.x, p.y);
    }

    if close {
        builder.close();
    }

    builder.finish()
}

pub(crate) fn shape(system: &PdfSystem, ops: &[ShapeOp], close: bool) -> Option<Path> {
    let mut builder = PathBuilder::new();

    for op in ops {
        match op {
            ShapeOp::MoveTo(p) => {
                let p = system.map_point(*p);
                builder.move_to(p.x, p.y);
            }
            ShapeOp::LineTo(p) => {
                let p = system.map_point(*p);
                builder.line_to(p.x, p.y);
            }
            ShapeOp::BezierTo(control) => {
                let [p1, p2, p3] = control.map(|p| system.map_point(p));
                builder.cubic_to(p1.x, p1.y, p2.x, p2.y, p3.x, p3.y);
            }
            ShapeOp::Close => builder.close(),
        }
    }

    if close {
        builder.close();
    }

    builder.finish()
}
