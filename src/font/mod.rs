//! Fonts and their encodings.
//!
//! The driver doesn't enumerate fonts itself, it is handed a [`FontList`] describing
//! the font files installed on the system. A font is referred to by its name,
//! `family-style`.
//!
//! Since PDF text is shown with single-byte codes, each character has to be mapped to
//! a font *and* an encoding. [`resolve_glyph`] tries, in this order:
//!
//! - MacRoman, the default encoding of every font.
//! - One of the static [`encoding`] tables, which cover most of the European scripts.
//! - A user encoding built at runtime. This only works for embedded fonts, since a
//!   viewer can't know about the glyph otherwise.
//! - A CJK substitution font, see [`cjk`].
//!
//! A character that fails all of them is skipped.

pub(crate) mod cache;
pub mod cjk;
pub mod encoding;
pub(crate) mod outline;
pub(crate) mod user;

use std::cell::Cell;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use skrifa::prelude::{LocationRef, Size};
use skrifa::raw::types::NameId;
use skrifa::raw::TableProvider;
use skrifa::{FontRef, GlyphId, MetadataProvider};
use tiny_skia_path::Rect;

pub use cjk::CjkEncoding;

use crate::error::{OpError, OpResult};
use crate::font::user::UserEncodings;

/// The format of a font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFormat {
    TrueType,
    Type1,
}

/// A font installed on the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontFile {
    /// The name of the font, `family-style`.
    pub name: String,
    /// The font file, if the font has one.
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub format: FontFormat,
    /// Whether the font may be embedded.
    #[serde(default)]
    pub embed: bool,
    /// The size of the font file, read on first use.
    #[serde(skip)]
    file_size: OnceCell<Option<u64>>,
}

impl FontFile {
    /// Create a new entry.
    pub fn new(name: impl Into<String>, path: Option<PathBuf>, format: FontFormat, embed: bool) -> Self {
        Self {
            name: name.into(),
            path,
            format,
            embed,
            file_size: OnceCell::new(),
        }
    }

    fn file_size(&self) -> Option<u64> {
        *self.file_size.get_or_init(|| {
            let path = self.path.as_ref()?;
            std::fs::metadata(path).ok().map(|m| m.len())
        })
    }
}

/// The fonts available to a job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontList {
    fonts: Vec<FontFile>,
    #[serde(skip)]
    last: Cell<Option<usize>>,
}

impl FontList {
    /// Create a new font list.
    pub fn new(fonts: Vec<FontFile>) -> Self {
        Self {
            fonts,
            last: Cell::new(None),
        }
    }

    /// Add a font to the list.
    pub fn push(&mut self, font: FontFile) {
        self.fonts.push(font);
    }

    /// All fonts in the list.
    pub fn fonts(&self) -> &[FontFile] {
        &self.fonts
    }

    /// Find a font by its name.
    pub fn find(&self, name: &str) -> Option<&FontFile> {
        if let Some(font) = self.last.get().and_then(|i| self.fonts.get(i)) {
            if font.name == name {
                return Some(font);
            }
        }

        let index = self.fonts.iter().position(|f| f.name == name)?;
        self.last.set(Some(index));

        self.fonts.get(index)
    }

    /// Whether the font with the name can be embedded: it has to be a TrueType font
    /// marked for embedding whose file is no larger than `max_size` bytes.
    pub fn embeddable(&self, name: &str, max_size: u64) -> bool {
        self.find(name).is_some_and(|f| {
            f.embed
                && f.format == FontFormat::TrueType
                && f.file_size().is_some_and(|size| size <= max_size)
        })
    }

    /// The format used to select the static encoding tables. Fonts without a
    /// TrueType file use the Type 1 tables.
    pub(crate) fn table_format(&self, name: &str) -> FontFormat {
        self.find(name)
            .filter(|f| f.path.is_some())
            .map(|f| f.format)
            .unwrap_or(FontFormat::Type1)
    }
}

/// The encoding of a PDF font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontEncoding {
    MacRoman,
    /// One of the static tables, for TrueType fonts.
    TrueType(u8),
    /// One of the static tables, for Type 1 fonts.
    Type1(u8),
    Cjk(CjkEncoding),
    /// A table built at runtime.
    User(u16),
}

impl FontEncoding {
    /// The name of the encoding.
    pub fn name(&self) -> String {
        match self {
            FontEncoding::MacRoman => "macroman".to_string(),
            FontEncoding::TrueType(n) => format!("ttenc{n}"),
            FontEncoding::Type1(n) => format!("t1enc{n}"),
            FontEncoding::Cjk(e) => e.cmap_name().to_string(),
            FontEncoding::User(n) => format!("user{n}"),
        }
    }
}

/// The code of a character in its encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphCode {
    Single(u8),
    /// A big-endian two byte code, used by the CJK encodings.
    Double(u16),
}

impl GlyphCode {
    pub(crate) fn to_bytes(self) -> Vec<u8> {
        match self {
            GlyphCode::Single(b) => vec![b],
            GlyphCode::Double(d) => d.to_be_bytes().to_vec(),
        }
    }
}

/// The result of mapping a character to a font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedGlyph {
    pub encoding: FontEncoding,
    pub code: GlyphCode,
    /// Whether the font should be embedded.
    pub embed: bool,
}

/// Find the encoding and code of a character.
///
/// `format` selects between the TrueType and the Type 1 tables and `embeddable`
/// tells whether the requested font can be embedded. Slots in user encodings are
/// declared here, before any font using them is looked up.
pub(crate) fn resolve_glyph(
    c: char,
    format: FontFormat,
    embeddable: bool,
    user: &mut UserEncodings,
    cjk_order: &[CjkEncoding],
) -> Option<ResolvedGlyph> {
    if let Some(b) = encoding::char_to_mac_roman(c) {
        return Some(ResolvedGlyph {
            encoding: FontEncoding::MacRoman,
            code: GlyphCode::Single(b),
            embed: embeddable,
        });
    }

    let code_point = c as u32;

    if let Some((table, code)) = encoding::find_encoding(code_point) {
        let encoding = match format {
            FontFormat::TrueType => FontEncoding::TrueType(table),
            FontFormat::Type1 => FontEncoding::Type1(table),
        };

        return Some(ResolvedGlyph {
            encoding,
            code: GlyphCode::Single(code),
            embed: embeddable,
        });
    }

    if embeddable {
        let (table, code) = user.declare(c);

        return Some(ResolvedGlyph {
            encoding: FontEncoding::User(table),
            code: GlyphCode::Single(code),
            embed: true,
        });
    }

    let cjk = cjk::find_in_cjk_tables(code_point, cjk_order)?;

    Some(ResolvedGlyph {
        encoding: FontEncoding::Cjk(cjk),
        code: GlyphCode::Double(code_point as u16),
        embed: false,
    })
}

/// The advance of a character in fonts without metrics, in em.
pub(crate) fn fallback_advance(c: char) -> f32 {
    if c == ' ' {
        0.25
    } else if cjk::CjkEncoding::Japanese.covers(c as u32) && c as u32 >= 0x2E80 {
        1.0
    } else {
        0.55
    }
}

/// The ascent and descent used for fonts without metrics, in em.
pub(crate) const FALLBACK_ASCENT: f32 = 0.8;
pub(crate) const FALLBACK_DESCENT: f32 = 0.2;

/// Basic information about a font file, read once when the font is loaded.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FontInfo {
    pub(crate) units_per_em: u16,
    pub(crate) ascent: f32,
    pub(crate) descent: f32,
    pub(crate) cap_height: Option<f32>,
    pub(crate) italic_angle: f32,
    pub(crate) is_monospaced: bool,
    pub(crate) weight: f32,
    pub(crate) bbox: Rect,
    pub(crate) postscript_name: Option<String>,
}

impl FontInfo {
    fn new(font_ref: &FontRef) -> Option<Self> {
        let metrics = font_ref.metrics(Size::unscaled(), LocationRef::default());
        let units_per_em = metrics.units_per_em;
        let bbox = metrics
            .bounds
            .and_then(|b| Rect::from_ltrb(b.x_min, b.y_min, b.x_max, b.y_max))
            .or_else(|| Rect::from_xywh(0.0, 0.0, units_per_em as f32, units_per_em as f32))?;

        let postscript_name = font_ref.name().ok().and_then(|name| {
            name.name_record().iter().find_map(|n| {
                if n.name_id.get() == NameId::POSTSCRIPT_NAME {
                    n.string(name.string_data()).ok().map(|s| s.to_string())
                } else {
                    None
                }
            })
        });

        Some(FontInfo {
            units_per_em,
            ascent: metrics.ascent,
            descent: metrics.descent,
            cap_height: metrics.cap_height,
            italic_angle: metrics.italic_angle,
            is_monospaced: metrics.is_monospace,
            weight: font_ref.attributes().weight.value(),
            bbox,
            postscript_name,
        })
    }
}

/// A TrueType font file loaded into memory.
pub(crate) struct LoadedFont {
    path: PathBuf,
    data: Arc<Vec<u8>>,
    info: FontInfo,
}

impl LoadedFont {
    /// Read and parse a font file.
    pub(crate) fn load(path: &Path) -> OpResult<Self> {
        let data = std::fs::read(path)
            .map_err(|e| OpError::Font(format!("could not read {}: {e}", path.display())))?;
        Self::from_data(path.to_path_buf(), data)
    }

    pub(crate) fn from_data(path: PathBuf, data: Vec<u8>) -> OpResult<Self> {
        let info = FontRef::from_index(&data, 0)
            .ok()
            .and_then(|f| FontInfo::new(&f))
            .ok_or_else(|| OpError::Font(format!("could not parse {}", path.display())))?;

        Ok(Self {
            path,
            data: Arc::new(data),
            info,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn info(&self) -> &FontInfo {
        &self.info
    }

    pub(crate) fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, 0).ok()
    }

    fn units_per_em(&self) -> f32 {
        self.info.units_per_em.max(1) as f32
    }

    /// The glyph of a character.
    pub(crate) fn glyph(&self, c: char) -> Option<GlyphId> {
        self.font_ref()?.charmap().map(c)
    }

    /// The advance of a character, in em.
    pub(crate) fn advance(&self, c: char) -> Option<f32> {
        let font_ref = self.font_ref()?;
        let glyph = font_ref.charmap().map(c)?;

        font_ref
            .glyph_metrics(Size::unscaled(), LocationRef::default())
            .advance_width(glyph)
            .map(|w| w / self.units_per_em())
    }

    /// The ascent, in em.
    pub(crate) fn ascent(&self) -> f32 {
        self.info.ascent / self.units_per_em()
    }

    /// The descent as a positive distance below the baseline, in em.
    pub(crate) fn descent(&self) -> f32 {
        self.info.descent.abs() / self.units_per_em()
    }

    /// Convert a length in font units to thousandths of an em.
    pub(crate) fn to_pdf_font_units(&self, v: f32) -> f32 {
        v / self.units_per_em() * 1000.0
    }
}

impl Debug for LoadedFont {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoadedFont {{ {} }}", self.path.display())
    }
}

/// The advance of a character in a font at a size, falling back to estimates
/// for fonts without metrics or characters without glyphs.
pub(crate) fn char_width(font: Option<&LoadedFont>, c: char, size: f32) -> f32 {
    font.and_then(|f| f.advance(c)).unwrap_or_else(|| fallback_advance(c)) * size
}

/// The ascent and descent of a font at a size.
pub(crate) fn vertical_metrics(font: Option<&LoadedFont>, size: f32) -> (f32, f32) {
    match font {
        Some(f) => (f.ascent() * size, f.descent() * size),
        None => (FALLBACK_ASCENT * size, FALLBACK_DESCENT * size),
    }
}

/// The name of a standard font matching a font name, if there is one.
///
/// Viewers ship these fonts, so they never need metrics or a font file.
pub(crate) fn standard_font(name: &str) -> Option<&'static str> {
    let (family, style) = name.split_once('-').unwrap_or((name, ""));
    let style = style.to_ascii_lowercase();
    let bold = style.contains("bold");
    let italic = style.contains("italic") || style.contains("oblique");

    let names: [&'static str; 4] = match family {
        "Helvetica" | "Arial" => [
            "Helvetica",
            "Helvetica-Bold",
            "Helvetica-Oblique",
            "Helvetica-BoldOblique",
        ],
        "Courier" => [
            "Courier",
            "Courier-Bold",
            "Courier-Oblique",
            "Courier-BoldOblique",
        ],
        "Times" | "Times New Roman" => [
            "Times-Roman",
            "Times-Bold",
            "Times-Italic",
            "Times-BoldItalic",
        ],
        "Symbol" => return Some("Symbol"),
        "ZapfDingbats" => return Some("ZapfDingbats"),
        _ => return None,
    };

    Some(match (bold, italic) {
        (false, false) => names[0],
        (true, false) => names[1],
        (false, true) => names[2],
        (true, true) => names[3],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(c: char, embeddable: bool, user: &mut UserEncodings) -> Option<ResolvedGlyph> {
        resolve_glyph(c, FontFormat::TrueType, embeddable, user, &CjkEncoding::ALL)
    }

    #[test]
    fn mac_roman_first() {
        let mut user = UserEncodings::new();
        let glyph = resolve('é', false, &mut user).unwrap();
        assert_eq!(glyph.encoding, FontEncoding::MacRoman);
        assert_eq!(glyph.code, GlyphCode::Single(0x8E));
    }

    #[test]
    fn static_table_by_format() {
        let mut user = UserEncodings::new();
        let glyph = resolve('Ā', true, &mut user).unwrap();
        assert_eq!(glyph.encoding, FontEncoding::TrueType(0));
        assert!(glyph.embed);

        let glyph =
            resolve_glyph('Ā', FontFormat::Type1, false, &mut user, &CjkEncoding::ALL).unwrap();
        assert_eq!(glyph.encoding, FontEncoding::Type1(0));
        assert_eq!(user.len(), 0);
    }

    #[test]
    fn user_encoding_for_embedded_fonts() {
        let mut user = UserEncodings::new();
        let glyph = resolve('漢', true, &mut user).unwrap();
        assert_eq!(glyph.encoding, FontEncoding::User(0));
        assert_eq!(glyph.code, GlyphCode::Single(0));
        assert_eq!(user.table(0), &['漢']);
    }

    #[test]
    fn cjk_substitution_otherwise() {
        let mut user = UserEncodings::new();
        let glyph = resolve('漢', false, &mut user).unwrap();
        assert_eq!(glyph.encoding, FontEncoding::Cjk(CjkEncoding::Japanese));
        assert_eq!(glyph.code.to_bytes(), vec![0x6F, 0x22]);
        assert!(!glyph.embed);
        assert_eq!(user.len(), 0);
    }

    #[test]
    fn unmappable() {
        let mut user = UserEncodings::new();
        assert_eq!(resolve('\u{0E01}', false, &mut user), None);
        assert_eq!(resolve('\0', false, &mut user), None);
    }

    #[test]
    fn encoding_names() {
        assert_eq!(FontEncoding::MacRoman.name(), "macroman");
        assert_eq!(FontEncoding::TrueType(3).name(), "ttenc3");
        assert_eq!(FontEncoding::Type1(0).name(), "t1enc0");
        assert_eq!(FontEncoding::User(2).name(), "user2");
        assert_eq!(
            FontEncoding::Cjk(CjkEncoding::Korean).name(),
            "UniKS-UCS2-H"
        );
    }

    #[test]
    fn font_file_size_is_read_once() {
        let path = std::env::temp_dir().join(format!("embed-size-{}.ttf", std::process::id()));
        std::fs::write(&path, [0; 64]).unwrap();

        let list = FontList::new(vec![FontFile::new(
            "Sans-Regular",
            Some(path.clone()),
            FontFormat::TrueType,
            true,
        )]);
        assert!(list.embeddable("Sans-Regular", 64));
        assert!(!list.embeddable("Sans-Regular", 63));

        // The size is remembered, the file isn't looked at again.
        std::fs::remove_file(&path).unwrap();
        assert!(list.embeddable("Sans-Regular", 64));
    }

    #[test]
    fn font_list_lookup() {
        let list = FontList::new(vec![
            FontFile::new("Sans-Bold", None, FontFormat::TrueType, true),
            FontFile::new("Serif-Regular", Some("serif.pfb".into()), FontFormat::Type1, false),
        ]);

        assert!(list.find("Serif-Regular").is_some());
        assert!(list.find("Serif-Regular").is_some());
        assert!(list.find("Mono-Regular").is_none());
        // No file, so nothing to embed.
        assert!(!list.embeddable("Sans-Bold", u64::MAX));
        assert_eq!(list.table_format("Sans-Bold"), FontFormat::Type1);
        assert_eq!(list.table_format("Serif-Regular"), FontFormat::Type1);
    }

    #[test]
    fn standard_fonts() {
        assert_eq!(standard_font("Helvetica"), Some("Helvetica"));
        assert_eq!(standard_font("Helvetica-Regular"), Some("Helvetica"));
        assert_eq!(standard_font("Times-Bold Italic"), Some("Times-BoldItalic"));
        assert_eq!(standard_font("Courier-Oblique"), Some("Courier-Oblique"));
        assert_eq!(standard_font("DejaVu Sans-Book"), None);
    }

    #[test]
    fn fallback_widths() {
        assert_eq!(char_width(None, ' ', 10.0), 2.5);
        assert_eq!(char_width(None, 'a', 10.0), 5.5);
        assert_eq!(char_width(None, '漢', 10.0), 10.0);
    }
}
