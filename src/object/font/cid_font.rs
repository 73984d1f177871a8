//! Composite fonts for CJK substitution.
//!
//! The substitute fonts are predefined by the PDF standard together with their
//! UCS-2 CMaps, so nothing but the font dictionaries is written.

use std::io::{self, Write};

use pdf_writer::types::{CidFontType, FontFlags};
use pdf_writer::{Finish, Name, Ref};

use crate::font::CjkEncoding;
use crate::serialize::PdfSerializer;

/// The advance of every glyph, all of them are full width.
const DEFAULT_WIDTH: f32 = 1000.0;

/// Write the `Type0` font of a CJK collection and its descendant font.
pub(crate) fn serialize_cjk_font<W: Write>(
    cjk: CjkEncoding,
    root_ref: Ref,
    sc: &mut PdfSerializer<W>,
) -> io::Result<()> {
    let cid_ref = sc.new_ref();
    let descriptor_ref = sc.new_ref();
    let base_font = Name(cjk.font_name().as_bytes());

    sc.emit(root_ref, |chunk| {
        chunk
            .type0_font(root_ref)
            .base_font(base_font)
            .encoding_predefined(Name(cjk.cmap_name().as_bytes()))
            .descendant_font(cid_ref);
    })?;

    sc.emit(cid_ref, |chunk| {
        let mut cid = chunk.cid_font(cid_ref);
        cid.subtype(CidFontType::Type0);
        cid.base_font(base_font);
        cid.system_info(cjk.system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(DEFAULT_WIDTH);
        cid.finish();
    })?;

    sc.emit(descriptor_ref, |chunk| {
        chunk
            .font_descriptor(descriptor_ref)
            .name(base_font)
            .flags(FontFlags::SYMBOLIC)
            .bbox(pdf_writer::Rect::new(0.0, -120.0, 1000.0, 880.0))
            .italic_angle(0.0)
            .ascent(880.0)
            .descent(-120.0)
            .cap_height(880.0)
            .stem_v(80.0);
    })
}
