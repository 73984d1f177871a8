//! Link annotations.
//!
//! Links are the only annotations produced. They either open a URI or jump to a
//! destination within the document.

use pdf_writer::types::{ActionType, AnnotationFlags, AnnotationType};
use pdf_writer::{Chunk, Finish, Name, Ref, Str};
use tiny_skia_path::Rect;

use crate::util::RectExt;

/// What a link points to.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Target {
    /// A URI action.
    Uri(String),
    /// A go-to action to a destination object.
    Destination(Ref),
}

/// A link annotation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LinkAnnotation {
    /// The area covered by the link, in PDF space.
    pub(crate) rect: Rect,
    pub(crate) target: Target,
    pub(crate) border_width: f32,
}

impl LinkAnnotation {
    /// Create a new link annotation without a border.
    pub(crate) fn new(rect: Rect, target: Target) -> Self {
        Self {
            rect,
            target,
            border_width: 0.0,
        }
    }

    pub(crate) fn with_border(self, border_width: f32) -> Self {
        Self {
            border_width: border_width.max(0.0),
            ..self
        }
    }

    pub(crate) fn serialize(&self, root_ref: Ref) -> Chunk {
        let mut chunk = Chunk::new();
        let mut annotation = chunk
            .indirect(root_ref)
            .start::<pdf_writer::writers::Annotation>();

        annotation.subtype(AnnotationType::Link);
        annotation.rect(self.rect.to_pdf_rect());
        annotation.border(0.0, 0.0, self.border_width, None);
        annotation.flags(AnnotationFlags::PRINT);

        match &self.target {
            Target::Uri(uri) => {
                annotation
                    .action()
                    .action_type(ActionType::Uri)
                    .uri(Str(uri.as_bytes()));
            }
            Target::Destination(dest) => {
                annotation
                    .action()
                    .action_type(ActionType::GoTo)
                    .insert(Name(b"D"))
                    .primitive(*dest);
            }
        }

        annotation.finish();

        chunk
    }
}
