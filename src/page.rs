//! Working with pages of a PDF document.

use std::io::{self, Write};
use std::ops::DerefMut;

use pdf_writer::{Finish, Ref};

use crate::geom::{PdfSystem, Rect};
use crate::interactive::annotation::LinkAnnotation;
use crate::picture::{Orientation, PageDescription};
use crate::resource::ResourceDictionary;
use crate::serialize::PdfSerializer;
use crate::stream::FilterStreamBuilder;

/// The size of an A4 page, used when no sensible paper size is given.
const A4_WIDTH: f32 = 595.0;
const A4_HEIGHT: f32 = 842.0;

/// Paper sizes below this are considered bogus.
const MIN_PAPER_SIZE: f32 = 10.0;

/// The geometry of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageSetup {
    pub(crate) width: f32,
    pub(crate) height: f32,
    /// The area that can be printed on, in source space.
    pub(crate) printable: Rect,
}

impl PageSetup {
    pub(crate) fn new(page: &PageDescription) -> Self {
        let paper = page.paper_rect;
        let width = if paper.width() < MIN_PAPER_SIZE {
            A4_WIDTH
        } else {
            paper.width()
        };
        let height = if paper.height() < MIN_PAPER_SIZE {
            A4_HEIGHT
        } else {
            paper.height()
        };

        let printable = match page.orientation {
            Orientation::Portrait => page.printable_rect,
            Orientation::Landscape => page.printable_rect.transposed(),
        };

        Self {
            width,
            height,
            printable,
        }
    }

    /// The coordinate system of the root state.
    pub(crate) fn system(&self) -> PdfSystem {
        PdfSystem::new(self.height, self.printable.left, self.printable.top)
    }
}

/// A completely rendered page, ready to be written.
pub(crate) struct InternalPage {
    pub(crate) setup: PageSetup,
    pub(crate) content: Vec<u8>,
    pub(crate) resources: ResourceDictionary,
    pub(crate) annotations: Vec<LinkAnnotation>,
}

impl InternalPage {
    /// Write the content stream, the annotations and the page object.
    pub(crate) fn serialize<W: Write>(
        self,
        sc: &mut PdfSerializer<W>,
        root_ref: Ref,
        parent: Ref,
        compression_level: Option<u8>,
    ) -> io::Result<()> {
        let stream_ref = sc.new_ref();

        sc.emit(stream_ref, |chunk| {
            let page_stream = FilterStreamBuilder::new(&self.content, compression_level).finish();
            let mut stream = chunk.stream(stream_ref, page_stream.encoded_data());
            page_stream.write_filters(stream.deref_mut());
            stream.finish();
        })?;

        let mut annotation_refs = vec![];

        for annotation in &self.annotations {
            let annot_ref = sc.new_ref();
            sc.write_chunk(annot_ref, &annotation.serialize(annot_ref))?;
            annotation_refs.push(annot_ref);
        }

        sc.emit(root_ref, |chunk| {
            let mut page = chunk.page(root_ref);
            page.parent(parent);
            page.media_box(pdf_writer::Rect::new(
                0.0,
                0.0,
                self.setup.width,
                self.setup.height,
            ));
            self.resources.to_pdf_resources(&mut page);
            page.contents(stream_ref);

            if !annotation_refs.is_empty() {
                page.annotations(annotation_refs.iter().copied());
            }

            page.finish();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configure::PdfVersion;

    #[test]
    fn bogus_paper_falls_back_to_a4() {
        let mut page = PageDescription::a4(vec![]);
        page.paper_rect = Rect::from_ltrb(0.0, 0.0, 5.0, 900.0);
        page.printable_rect = Rect::from_ltrb(10.0, 20.0, 500.0, 700.0);

        let setup = PageSetup::new(&page);
        assert_eq!(setup.width, 595.0);
        assert_eq!(setup.height, 900.0);
        assert_eq!(setup.system().origin(), crate::geom::Point::new(10.0, 20.0));
    }

    #[test]
    fn landscape_transposes_the_printable_area() {
        let mut page = PageDescription::a4(vec![]);
        page.orientation = Orientation::Landscape;
        page.printable_rect = Rect::from_ltrb(10.0, 20.0, 500.0, 700.0);

        assert_eq!(
            PageSetup::new(&page).printable,
            Rect::from_ltrb(20.0, 10.0, 700.0, 500.0)
        );
    }

    #[test]
    fn page_object() {
        let mut sc = PdfSerializer::new(Vec::new(), PdfVersion::Pdf14).unwrap();
        let pages = sc.new_ref();
        let page_ref = sc.new_ref();

        let page = InternalPage {
            setup: PageSetup::new(&PageDescription::a4(vec![])),
            content: b"0 0 m 10 10 l S".to_vec(),
            resources: ResourceDictionary::default(),
            annotations: vec![],
        };
        page.serialize(&mut sc, page_ref, pages, None).unwrap();

        let bytes = sc.finish(pages, None).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/MediaBox [0 0 595 842]"));
        assert!(text.contains("/Parent 1 0 R"));
        assert!(text.contains("/Contents 3 0 R"));
        assert!(text.contains("0 0 m 10 10 l S"));
    }
}
