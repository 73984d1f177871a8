/*!
A printer driver backend that turns recorded drawing operations into PDF documents.

Applications print by recording [`Picture`]s, lists of [`DrawOp`]s in the coordinate
system of the page. A [`Driver`] takes the pictures of each page of a print job and
writes them to a PDF document, including the fonts, images and patterns they need.

Optionally, the drawn text is searched for URLs, headings and recurring phrases,
which become web links, an outline and cross references. See [`JobSettings`] for
everything that can be configured per job.

# Example

```
use pdf_print_driver::geom::{Point, Rect};
use pdf_print_driver::{DrawOp, Driver, FontList, JobSettings, PageDescription, Picture, Rgba};

let picture = Picture::new(vec![
    DrawOp::SetForeColor { color: Rgba::rgb(200, 0, 0) },
    DrawOp::FillRect { rect: Rect::from_ltrb(10.0, 10.0, 100.0, 50.0) },
    DrawOp::SetPenLocation { location: Point::new(10.0, 80.0) },
    DrawOp::draw_string("Hello world", 0.0, 0.0),
]);

let mut driver = Driver::new(Vec::new());
driver.begin_job(JobSettings::default(), FontList::default()).unwrap();
driver.render_page(&PageDescription::a4(vec![picture])).unwrap();
let (pdf, report) = driver.finish().unwrap();

assert!(pdf.starts_with(b"%PDF-1.3"));
assert!(!report.has_errors());
```
*/

#![forbid(unsafe_code)]

mod color;
mod content;
mod driver;
mod graphics_state;
mod object;
mod page;
mod resource;
mod serialize;
mod shape;
mod stream;
mod text;
mod util;

pub mod configure;
pub mod error;
pub mod font;
pub mod geom;
pub mod image;
pub mod interactive;
pub mod picture;
pub mod report;

pub use color::Rgba;
pub use configure::{JobSettings, PdfVersion};
pub use driver::{Driver, JobStage};
pub use error::{DefinitionError, DriverError, DriverResult, OpError, OpResult};
pub use font::{CjkEncoding, FontFile, FontFormat, FontList};
pub use image::{ColorMap, PixelFormat};
pub use interactive::bookmark::BookmarkDefinition;
pub use picture::{
    DrawOp, DrawingMode, FontFace, FontSpec, LineCap, LineJoin, Orientation, PageDescription,
    Pattern, Picture, ShapeOp, TextEncoding,
};
pub use report::{Report, ReportEntry, ReportKind};
