//! Geometrical helper structs.
//!
//! Drawing operations use a source coordinate system with the origin at the top-left
//! and the y axis pointing down. [`PdfSystem`] maps it into PDF user space, where the
//! origin is at the bottom-left of the page.

use serde::{Deserialize, Serialize};
use tiny_skia_path::Transform;

/// A point in source space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Point> for tiny_skia_path::Point {
    fn from(p: Point) -> Self {
        tiny_skia_path::Point::from_xy(p.x, p.y)
    }
}

/// A rectangle in source space.
///
/// Like the drawing system it comes from, `right` and `bottom` are inclusive, so a
/// rectangle covering a single pixel has a width of `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Create a new rectangle from its edges.
    pub const fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The distance between the left and the right edge.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// The distance between the top and the bottom edge.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// The number of whole pixels covered horizontally.
    pub fn pixel_width(&self) -> u32 {
        (self.width().floor() as i64 + 1).max(0) as u32
    }

    /// The number of whole pixels covered vertically.
    pub fn pixel_height(&self) -> u32 {
        (self.height().floor() as i64 + 1).max(0) as u32
    }

    /// Swap the axes, used for landscape pages.
    pub fn transposed(&self) -> Self {
        Self::from_ltrb(self.top, self.left, self.bottom, self.right)
    }
}

/// The mapping from source space into PDF space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfSystem {
    height: f32,
    origin: Point,
    scale: f32,
}

impl PdfSystem {
    /// Create a new system for a page of the given height, with the source
    /// origin at `(x0, y0)`.
    pub fn new(height: f32, x0: f32, y0: f32) -> Self {
        Self {
            height,
            origin: Point::new(x0, y0),
            scale: 1.0,
        }
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    /// Map an x coordinate.
    pub fn tx(&self, x: f32) -> f32 {
        self.origin.x + self.scaled(x)
    }

    /// Map a y coordinate.
    pub fn ty(&self, y: f32) -> f32 {
        self.height - (self.origin.y + self.scaled(y))
    }

    /// Scale a length.
    pub fn scaled(&self, v: f32) -> f32 {
        v * self.scale
    }

    /// Map a point.
    pub fn map_point(&self, p: Point) -> tiny_skia_path::Point {
        tiny_skia_path::Point::from_xy(self.tx(p.x), self.ty(p.y))
    }

    /// Map a rectangle, returning `None` for degenerate input.
    pub fn map_rect(&self, r: &Rect) -> Option<tiny_skia_path::Rect> {
        let (x0, x1) = (self.tx(r.left), self.tx(r.right));
        let (y0, y1) = (self.ty(r.top), self.ty(r.bottom));

        tiny_skia_path::Rect::from_ltrb(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// The full mapping as a transform.
    pub fn to_transform(&self) -> Transform {
        Transform::from_row(
            self.scale,
            0.0,
            0.0,
            -self.scale,
            self.origin.x,
            self.height - self.origin.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_with_y_flip() {
        let mut system = PdfSystem::new(842.0, 10.0, 20.0);
        assert_eq!(system.tx(5.0), 15.0);
        assert_eq!(system.ty(5.0), 842.0 - 25.0);

        system.set_scale(2.0);
        assert_eq!(system.tx(5.0), 20.0);
        assert_eq!(system.ty(5.0), 842.0 - 30.0);
        assert_eq!(system.scaled(3.0), 6.0);
    }

    #[test]
    fn transform_matches_point_mapping() {
        let mut system = PdfSystem::new(100.0, 3.0, 4.0);
        system.set_scale(1.5);

        let mut p = tiny_skia_path::Point::from_xy(10.0, 20.0);
        system.to_transform().map_point(&mut p);
        assert_eq!(p, system.map_point(Point::new(10.0, 20.0)));
    }

    #[test]
    fn inclusive_pixel_size() {
        let rect = Rect::from_ltrb(0.0, 0.0, 9.0, 4.0);
        assert_eq!(rect.pixel_width(), 10);
        assert_eq!(rect.pixel_height(), 5);
    }
}
