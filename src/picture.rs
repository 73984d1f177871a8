//! The recorded drawing operations of a page.
//!
//! A page is a list of [`Picture`]s, each of which is a list of [`DrawOp`]s recorded
//! by the application that printed. All types can be (de)serialized, so spooled
//! jobs can be stored as JSON.

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::geom::{Point, Rect};
use crate::image::PixelFormat;

/// An 8x8 stipple pattern, one byte per row, least significant bit leftmost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern(pub [u8; 8]);

impl Pattern {
    /// Paint with the high (foreground) color only.
    pub const SOLID_HIGH: Pattern = Pattern([0xFF; 8]);
    /// Paint with the low (background) color only.
    pub const SOLID_LOW: Pattern = Pattern([0x00; 8]);
    /// A checkerboard of both colors.
    pub const MIXED_COLORS: Pattern = Pattern([0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55]);

    /// Whether the pixel at `(x, y)` uses the high color.
    pub fn is_high(&self, x: u8, y: u8) -> bool {
        (self.0[y as usize] >> x) & 1 == 1
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Pattern::SOLID_HIGH
    }
}

/// How source and destination pixels are combined.
///
/// Only [`DrawingMode::Alpha`] has an effect on the output, all other modes
/// paint opaquely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawingMode {
    #[default]
    Copy,
    Over,
    Erase,
    Invert,
    Add,
    Subtract,
    Blend,
    Min,
    Max,
    Select,
    Alpha,
}

/// The cap style of stroked lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// The join style of stroked lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
    Butt,
    Square,
}

/// The character encoding of the bytes of a [`DrawOp::DrawString`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
    MacRoman,
}

/// Decorations of a font.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FontFace {
    pub underscore: bool,
    pub strikeout: bool,
    pub outlined: bool,
}

/// The font attributes of a graphics state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSpec {
    pub family: String,
    pub style: String,
    pub size: f32,
    pub spacing: u8,
    /// Rotation in degrees, counter-clockwise.
    pub rotation: f32,
    /// Shear in degrees, `90` means upright.
    pub shear: f32,
    pub encoding: TextEncoding,
    pub flags: u32,
    pub face: FontFace,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Helvetica".to_string(),
            style: "Regular".to_string(),
            size: 12.0,
            spacing: 0,
            rotation: 0.0,
            shear: 90.0,
            encoding: TextEncoding::Utf8,
            flags: 0,
            face: FontFace::default(),
        }
    }
}

impl FontSpec {
    /// The name used to look up the font, `family-style`.
    pub fn name(&self) -> String {
        format!("{}-{}", self.family, self.style)
    }
}

/// A segment of a free-form shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeOp {
    MoveTo(Point),
    LineTo(Point),
    BezierTo([Point; 3]),
    Close,
}

/// A single recorded drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawOp {
    MovePenBy {
        delta: Point,
    },
    StrokeLine {
        start: Point,
        end: Point,
    },
    StrokeRect {
        rect: Rect,
    },
    FillRect {
        rect: Rect,
    },
    StrokeRoundRect {
        rect: Rect,
        radii: Point,
    },
    FillRoundRect {
        rect: Rect,
        radii: Point,
    },
    StrokeBezier {
        control: [Point; 4],
    },
    FillBezier {
        control: [Point; 4],
    },
    /// Angles in degrees.
    StrokeArc {
        center: Point,
        radii: Point,
        start_theta: f32,
        arc_theta: f32,
    },
    FillArc {
        center: Point,
        radii: Point,
        start_theta: f32,
        arc_theta: f32,
    },
    StrokeEllipse {
        center: Point,
        radii: Point,
    },
    FillEllipse {
        center: Point,
        radii: Point,
    },
    StrokePolygon {
        points: Vec<Point>,
        closed: bool,
    },
    FillPolygon {
        points: Vec<Point>,
        closed: bool,
    },
    StrokeShape {
        shape: Vec<ShapeOp>,
    },
    FillShape {
        shape: Vec<ShapeOp>,
    },
    /// Draw text at the pen location. `text` is encoded as given by the font's
    /// [`TextEncoding`].
    DrawString {
        text: Vec<u8>,
        escapement_no_space: f32,
        escapement_space: f32,
    },
    DrawPixels {
        src: Rect,
        dest: Rect,
        bytes_per_row: u32,
        format: PixelFormat,
        data: Vec<u8>,
    },
    ClipToPicture {
        picture: Picture,
        origin: Point,
        inverse: bool,
    },
    SetClippingRects {
        rects: Vec<Rect>,
    },
    PushState,
    PopState,
    EnterStateChange,
    ExitStateChange,
    EnterFontState,
    ExitFontState,
    SetOrigin {
        origin: Point,
    },
    SetPenLocation {
        location: Point,
    },
    SetDrawingMode {
        mode: DrawingMode,
    },
    SetLineMode {
        cap: LineCap,
        join: LineJoin,
        miter_limit: f32,
    },
    SetPenSize {
        size: f32,
    },
    SetForeColor {
        color: Rgba,
    },
    SetBackColor {
        color: Rgba,
    },
    SetStipplePattern {
        pattern: Pattern,
    },
    SetScale {
        scale: f32,
    },
    SetFontFamily {
        family: String,
    },
    SetFontStyle {
        style: String,
    },
    SetFontSpacing {
        spacing: u8,
    },
    SetFontSize {
        size: f32,
    },
    /// Rotation in degrees.
    SetFontRotation {
        rotation: f32,
    },
    SetFontEncoding {
        encoding: TextEncoding,
    },
    SetFontFlags {
        flags: u32,
    },
    SetFontShear {
        shear: f32,
    },
    SetFontFace {
        face: FontFace,
    },
}

impl DrawOp {
    /// A convenience constructor for UTF-8 text.
    pub fn draw_string(text: &str, escapement_no_space: f32, escapement_space: f32) -> Self {
        DrawOp::DrawString {
            text: text.as_bytes().to_vec(),
            escapement_no_space,
            escapement_space,
        }
    }

    /// The name used in debug reports.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            DrawOp::MovePenBy { .. } => "MovePenBy",
            DrawOp::StrokeLine { .. } => "StrokeLine",
            DrawOp::StrokeRect { .. } => "StrokeRect",
            DrawOp::FillRect { .. } => "FillRect",
            DrawOp::StrokeRoundRect { .. } => "StrokeRoundRect",
            DrawOp::FillRoundRect { .. } => "FillRoundRect",
            DrawOp::StrokeBezier { .. } => "StrokeBezier",
            DrawOp::FillBezier { .. } => "FillBezier",
            DrawOp::StrokeArc { .. } => "StrokeArc",
            DrawOp::FillArc { .. } => "FillArc",
            DrawOp::StrokeEllipse { .. } => "StrokeEllipse",
            DrawOp::FillEllipse { .. } => "FillEllipse",
            DrawOp::StrokePolygon { .. } => "StrokePolygon",
            DrawOp::FillPolygon { .. } => "FillPolygon",
            DrawOp::StrokeShape { .. } => "StrokeShape",
            DrawOp::FillShape { .. } => "FillShape",
            DrawOp::DrawString { .. } => "DrawString",
            DrawOp::DrawPixels { .. } => "DrawPixels",
            DrawOp::ClipToPicture { .. } => "ClipToPicture",
            DrawOp::SetClippingRects { .. } => "SetClippingRects",
            DrawOp::PushState => "PushState",
            DrawOp::PopState => "PopState",
            DrawOp::EnterStateChange => "EnterStateChange",
            DrawOp::ExitStateChange => "ExitStateChange",
            DrawOp::EnterFontState => "EnterFontState",
            DrawOp::ExitFontState => "ExitFontState",
            DrawOp::SetOrigin { .. } => "SetOrigin",
            DrawOp::SetPenLocation { .. } => "SetPenLocation",
            DrawOp::SetDrawingMode { .. } => "SetDrawingMode",
            DrawOp::SetLineMode { .. } => "SetLineMode",
            DrawOp::SetPenSize { .. } => "SetPenSize",
            DrawOp::SetForeColor { .. } => "SetForeColor",
            DrawOp::SetBackColor { .. } => "SetBackColor",
            DrawOp::SetStipplePattern { .. } => "SetStipplePattern",
            DrawOp::SetScale { .. } => "SetScale",
            DrawOp::SetFontFamily { .. } => "SetFontFamily",
            DrawOp::SetFontStyle { .. } => "SetFontStyle",
            DrawOp::SetFontSpacing { .. } => "SetFontSpacing",
            DrawOp::SetFontSize { .. } => "SetFontSize",
            DrawOp::SetFontRotation { .. } => "SetFontRotation",
            DrawOp::SetFontEncoding { .. } => "SetFontEncoding",
            DrawOp::SetFontFlags { .. } => "SetFontFlags",
            DrawOp::SetFontShear { .. } => "SetFontShear",
            DrawOp::SetFontFace { .. } => "SetFontFace",
        }
    }
}

/// A recorded picture, drawn with its origin at `origin`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    #[serde(default)]
    pub origin: Point,
    pub ops: Vec<DrawOp>,
}

impl Picture {
    /// Create a new picture at the origin.
    pub fn new(ops: Vec<DrawOp>) -> Self {
        Self {
            origin: Point::default(),
            ops,
        }
    }
}

/// The orientation of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// A page to print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDescription {
    pub paper_rect: Rect,
    pub printable_rect: Rect,
    #[serde(default)]
    pub orientation: Orientation,
    pub pictures: Vec<Picture>,
}

impl PageDescription {
    /// An A4 page without margins.
    pub fn a4(pictures: Vec<Picture>) -> Self {
        let rect = Rect::from_ltrb(0.0, 0.0, 595.0, 842.0);

        Self {
            paper_rect: rect,
            printable_rect: rect,
            orientation: Orientation::Portrait,
            pictures,
        }
    }
}

/// Decode the bytes of a string into text.
pub(crate) fn decode_text(bytes: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        TextEncoding::MacRoman => bytes
            .iter()
            .map(|&b| crate::font::encoding::mac_roman_to_char(b))
            .collect(),
    }
}
