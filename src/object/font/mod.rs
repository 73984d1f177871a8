//! Font objects.
//!
//! Every font of the [`FontCache`] becomes one PDF font. Fonts with a single-byte
//! encoding are written as simple fonts, `TrueType` if a font file backs them and
//! `Type1` otherwise; CJK substitutes are written as composite fonts, see
//! [`cid_font`].
//!
//! Fonts are written at the end of the job, once every user encoding is complete.

use std::collections::HashMap;
use std::io::{self, Write};
use std::ops::DerefMut;
use std::path::PathBuf;

use pdf_writer::types::FontFlags;
use pdf_writer::{Finish, Name, Ref};

use crate::font::cache::{FontCache, FontSource, PdfFont};
use crate::font::encoding::{self, glyph_name, mac_roman_to_char, MAC_ROMAN_DIFFERENCES};
use crate::font::user::UserEncodings;
use crate::font::{fallback_advance, standard_font, FontEncoding, LoadedFont};
use crate::serialize::PdfSerializer;
use crate::stream::FilterStreamBuilder;
use crate::util::{NameExt, RectExt};

pub(crate) mod cid_font;

/// The first code with a width in MacRoman fonts. Lower codes are control
/// characters.
const MAC_ROMAN_FIRST_CHAR: u8 = 32;

/// Writes the fonts of a job. Font files are embedded only once, even if several
/// PDF fonts (one per encoding) use them.
pub(crate) struct FontWriter<'a> {
    user: &'a UserEncodings,
    compression_level: Option<u8>,
    font_files: HashMap<PathBuf, Ref>,
}

impl<'a> FontWriter<'a> {
    pub(crate) fn new(user: &'a UserEncodings, compression_level: Option<u8>) -> Self {
        Self {
            user,
            compression_level,
            font_files: HashMap::new(),
        }
    }

    /// Write all fonts of the cache.
    pub(crate) fn write_all<W: Write>(
        &mut self,
        fonts: &FontCache,
        sc: &mut PdfSerializer<W>,
    ) -> io::Result<()> {
        for font in fonts.fonts() {
            match &font.source {
                FontSource::Cjk(cjk) => cid_font::serialize_cjk_font(*cjk, font.font_ref, sc)?,
                _ => self.serialize_simple_font(font, sc)?,
            }
        }

        log::debug!(
            "wrote {} fonts, {} embedded font files",
            fonts.len(),
            self.font_files.len()
        );

        Ok(())
    }

    /// The character a code of an encoding stands for.
    fn char_at(&self, encoding: FontEncoding, code: u8) -> Option<char> {
        match encoding {
            FontEncoding::MacRoman => (code != 0).then(|| mac_roman_to_char(code)),
            FontEncoding::TrueType(n) | FontEncoding::Type1(n) => encoding::table(n)?.char_at(code),
            FontEncoding::User(n) => self.user.table(n).get(code as usize).copied(),
            FontEncoding::Cjk(_) => None,
        }
    }

    /// The range of codes an encoding uses.
    fn code_range(&self, encoding: FontEncoding) -> (u8, u8) {
        let len = match encoding {
            FontEncoding::MacRoman => return (MAC_ROMAN_FIRST_CHAR, u8::MAX),
            FontEncoding::TrueType(n) | FontEncoding::Type1(n) => {
                encoding::table(n).map(|t| t.len()).unwrap_or(0)
            }
            FontEncoding::User(n) => self.user.table(n).len(),
            FontEncoding::Cjk(_) => 0,
        };

        (0, len.clamp(1, 256) as u8 - 1)
    }

    fn font_file<W: Write>(
        &mut self,
        font: &LoadedFont,
        sc: &mut PdfSerializer<W>,
    ) -> io::Result<Ref> {
        if let Some(file_ref) = self.font_files.get(font.path()) {
            return Ok(*file_ref);
        }

        let file_ref = sc.new_ref();
        let compression_level = self.compression_level;

        sc.emit(file_ref, |chunk| {
            let font_stream = FilterStreamBuilder::new(font.data(), compression_level).finish();
            let mut stream = chunk.stream(file_ref, font_stream.encoded_data());
            font_stream.write_filters(stream.deref_mut());
            stream.pair(Name(b"Length1"), font.data().len() as i32);
            stream.finish();
        })?;

        self.font_files.insert(font.path().to_path_buf(), file_ref);

        Ok(file_ref)
    }

    fn serialize_simple_font<W: Write>(
        &mut self,
        font: &PdfFont,
        sc: &mut PdfSerializer<W>,
    ) -> io::Result<()> {
        let base_font = font.base_font();
        let metrics = font.metrics();
        // Viewers know the metrics of the standard fonts.
        let is_standard = matches!(font.source, FontSource::Named(None))
            && standard_font(&font.name).is_some();

        let font_file = match &font.source {
            FontSource::Embedded(loaded) => Some(self.font_file(loaded, sc)?),
            _ => None,
        };

        let descriptor_ref = if is_standard {
            None
        } else {
            let descriptor_ref = sc.new_ref();
            sc.emit(descriptor_ref, |chunk| {
                let mut descriptor = chunk.font_descriptor(descriptor_ref);
                descriptor.name(base_font.to_pdf_name());

                match metrics {
                    Some(loaded) => {
                        let info = loaded.info();
                        let to_pdf_units = |v: f32| loaded.to_pdf_font_units(v);

                        let mut flags = FontFlags::empty();
                        flags.set(
                            FontFlags::SERIF,
                            base_font.contains("Serif") && !base_font.contains("Sans"),
                        );
                        flags.set(FontFlags::FIXED_PITCH, info.is_monospaced);
                        flags.set(FontFlags::ITALIC, info.italic_angle != 0.0);
                        flags.insert(FontFlags::NON_SYMBOLIC);

                        let bbox = tiny_skia_path::Rect::from_ltrb(
                            to_pdf_units(info.bbox.left()),
                            to_pdf_units(info.bbox.top()),
                            to_pdf_units(info.bbox.right()),
                            to_pdf_units(info.bbox.bottom()),
                        )
                        .unwrap_or(info.bbox);
                        let ascent = to_pdf_units(info.ascent);

                        descriptor
                            .flags(flags)
                            .bbox(bbox.to_pdf_rect())
                            .italic_angle(info.italic_angle)
                            .ascent(ascent)
                            .descent(to_pdf_units(info.descent))
                            .cap_height(info.cap_height.map(to_pdf_units).unwrap_or(ascent))
                            .stem_v(10.0 + 0.244 * (info.weight - 50.0));
                    }
                    None => {
                        descriptor
                            .flags(FontFlags::NON_SYMBOLIC)
                            .bbox(pdf_writer::Rect::new(0.0, -200.0, 1000.0, 800.0))
                            .italic_angle(0.0)
                            .ascent(800.0)
                            .descent(-200.0)
                            .cap_height(700.0)
                            .stem_v(80.0);
                    }
                }

                if let Some(file_ref) = font_file {
                    descriptor.font_file2(file_ref);
                }

                descriptor.finish();
            })?;

            Some(descriptor_ref)
        };

        let (first_char, last_char) = self.code_range(font.encoding);
        let widths: Vec<f32> = (first_char..=last_char)
            .map(|code| match self.char_at(font.encoding, code) {
                Some(c) => {
                    metrics
                        .and_then(|m| m.advance(c))
                        .unwrap_or_else(|| fallback_advance(c))
                        * 1000.0
                }
                None => 0.0,
            })
            .collect();

        let differences: Vec<(u8, String)> = match font.encoding {
            FontEncoding::MacRoman => MAC_ROMAN_DIFFERENCES
                .iter()
                .map(|(code, name)| (*code, name.to_string()))
                .collect(),
            encoding => (first_char..=last_char)
                .filter_map(|code| self.char_at(encoding, code).map(|c| (code, glyph_name(c))))
                .collect(),
        };

        let subtype = if metrics.is_some() {
            Name(b"TrueType")
        } else {
            Name(b"Type1")
        };

        sc.emit(font.font_ref, |chunk| {
            let mut dict = chunk.indirect(font.font_ref).dict();
            dict.pair(Name(b"Type"), Name(b"Font"));
            dict.pair(Name(b"Subtype"), subtype);
            dict.pair(Name(b"BaseFont"), base_font.to_pdf_name());

            if let Some(descriptor_ref) = descriptor_ref {
                dict.pair(Name(b"FirstChar"), first_char as i32);
                dict.pair(Name(b"LastChar"), last_char as i32);
                dict.insert(Name(b"Widths")).array().items(widths);
                dict.pair(Name(b"FontDescriptor"), descriptor_ref);
            }

            let mut encoding = dict.insert(Name(b"Encoding")).dict();
            encoding.pair(Name(b"Type"), Name(b"Encoding"));

            if font.encoding == FontEncoding::MacRoman {
                encoding.pair(Name(b"BaseEncoding"), Name(b"MacRomanEncoding"));
            }

            let mut array = encoding.insert(Name(b"Differences")).array();
            let mut next = None;

            for (code, name) in &differences {
                // Consecutive codes share a single leading number.
                if next != Some(*code) {
                    array.item(*code as i32);
                }

                array.item(name.to_pdf_name());
                next = code.checked_add(1);
            }

            array.finish();
            encoding.finish();
            dict.finish();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configure::PdfVersion;
    use crate::font::{CjkEncoding, FontList};

    fn write_fonts(
        requests: &[(&str, FontEncoding)],
        user: &UserEncodings,
    ) -> String {
        let list = FontList::default();
        let mut cache = FontCache::new();
        let mut sc = PdfSerializer::new(Vec::new(), PdfVersion::Pdf14).unwrap();

        for (name, encoding) in requests {
            cache
                .find_font(name, false, *encoding, &list, 0, || sc.new_ref())
                .unwrap();
        }

        FontWriter::new(user, None).write_all(&cache, &mut sc).unwrap();
        let catalog = sc.new_ref();
        let bytes = sc.finish(catalog, None).unwrap();

        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn standard_font_with_mac_roman() {
        let text = write_fonts(&[("Helvetica-Regular", FontEncoding::MacRoman)], &UserEncodings::new());

        assert!(text.contains("/Subtype /Type1"));
        assert!(text.contains("/BaseFont /Helvetica"));
        assert!(text.contains("/BaseEncoding /MacRomanEncoding"));
        assert!(text.contains("/Differences [173 /notequal 176 /infinity"));
        assert!(!text.contains("/FontDescriptor"));
    }

    #[test]
    fn static_table_differences() {
        let text = write_fonts(&[("Helvetica-Regular", FontEncoding::Type1(2))], &UserEncodings::new());

        assert!(text.contains("/Differences [0 /uni0370 /uni0371"));
        assert!(!text.contains("/BaseEncoding"));
    }

    #[test]
    fn unknown_fonts_get_a_descriptor_and_fallback_widths() {
        let text = write_fonts(&[("Frutiger-Light", FontEncoding::MacRoman)], &UserEncodings::new());

        assert!(text.contains("/BaseFont /Frutiger-Light"));
        assert!(text.contains("/FirstChar 32"));
        assert!(text.contains("/Widths [250 550"));
        assert!(text.contains("/Type /FontDescriptor"));
    }

    #[test]
    fn cjk_fonts_are_composite() {
        let text = write_fonts(
            &[("Mincho-Regular", FontEncoding::Cjk(CjkEncoding::Japanese))],
            &UserEncodings::new(),
        );

        assert!(text.contains("/Subtype /Type0"));
        assert!(text.contains("/Encoding /UniJIS-UCS2-H"));
        assert!(text.contains("/BaseFont /HeiseiMin-W3"));
        assert!(text.contains("/Ordering (Japan1)"));
        assert!(text.contains("/DW 1000"));
    }
}
