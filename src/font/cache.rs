//! The fonts used by a job.
//!
//! Each (font name, encoding) pair becomes a separate PDF font. Fonts are created on
//! first use and written at the end of the job, once all user encodings are
//! complete.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use pdf_writer::Ref;

use crate::error::{OpError, OpResult};
use crate::font::{standard_font, CjkEncoding, FontEncoding, FontFormat, FontList, LoadedFont};

/// Where the glyphs of a PDF font come from.
#[derive(Debug, Clone)]
pub(crate) enum FontSource {
    /// The font file is embedded.
    Embedded(Arc<LoadedFont>),
    /// The viewer has to provide the font. Metrics are taken from the font file if
    /// one could be read.
    Named(Option<Arc<LoadedFont>>),
    /// A CJK substitution font.
    Cjk(CjkEncoding),
}

/// A font object of the output document.
#[derive(Debug, Clone)]
pub(crate) struct PdfFont {
    /// The name the font was requested with.
    pub(crate) name: String,
    pub(crate) encoding: FontEncoding,
    pub(crate) font_ref: Ref,
    pub(crate) source: FontSource,
}

impl PdfFont {
    /// The `BaseFont` name of the font.
    pub(crate) fn base_font(&self) -> String {
        match &self.source {
            FontSource::Cjk(e) => e.font_name().to_string(),
            FontSource::Embedded(f) | FontSource::Named(Some(f)) => f
                .info()
                .postscript_name
                .clone()
                .unwrap_or_else(|| sanitize(&self.name)),
            FontSource::Named(None) => standard_font(&self.name)
                .map(|s| s.to_string())
                .unwrap_or_else(|| sanitize(&self.name)),
        }
    }

    /// The font file metrics are read from, if any.
    pub(crate) fn metrics(&self) -> Option<&LoadedFont> {
        match &self.source {
            FontSource::Embedded(f) | FontSource::Named(Some(f)) => Some(f),
            _ => None,
        }
    }
}

fn sanitize(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c)).collect()
}

/// All PDF fonts of a job.
#[derive(Debug, Default)]
pub(crate) struct FontCache {
    fonts: Vec<PdfFont>,
    last: Option<usize>,
    loaded: HashMap<PathBuf, Option<Arc<LoadedFont>>>,
}

impl FontCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Find the font for a name and an encoding, creating it if necessary.
    ///
    /// Creation only fails for fonts that should be embedded but whose file can't
    /// be read.
    pub(crate) fn find_font(
        &mut self,
        name: &str,
        embed: bool,
        encoding: FontEncoding,
        list: &FontList,
        max_embed_size: u64,
        new_ref: impl FnOnce() -> Ref,
    ) -> OpResult<usize> {
        if let Some(index) = self.last {
            let font = &self.fonts[index];
            if font.encoding == encoding && font.name == name {
                return Ok(index);
            }
        }

        if let Some(index) = self
            .fonts
            .iter()
            .position(|f| f.encoding == encoding && f.name == name)
        {
            self.last = Some(index);
            return Ok(index);
        }

        let source = match encoding {
            FontEncoding::Cjk(cjk) => FontSource::Cjk(cjk),
            _ if embed && list.embeddable(name, max_embed_size) => {
                let loaded = self.load(list, name);
                FontSource::Embedded(loaded.ok_or_else(|| {
                    OpError::Font(format!("could not load font file of '{name}'"))
                })?)
            }
            FontEncoding::User(_) => {
                return Err(OpError::Font(format!(
                    "user encodings require '{name}' to be embedded"
                )))
            }
            _ => FontSource::Named(self.load(list, name)),
        };

        let index = self.fonts.len();
        self.fonts.push(PdfFont {
            name: name.to_string(),
            encoding,
            font_ref: new_ref(),
            source,
        });
        self.last = Some(index);

        Ok(index)
    }

    /// Load the TrueType file of a font, once per job.
    fn load(&mut self, list: &FontList, name: &str) -> Option<Arc<LoadedFont>> {
        let file = list.find(name)?;

        if file.format != FontFormat::TrueType {
            return None;
        }

        let path = file.path.clone()?;

        self.loaded
            .entry(path)
            .or_insert_with_key(|path| match LoadedFont::load(path) {
                Ok(font) => Some(Arc::new(font)),
                Err(e) => {
                    log::warn!("{e}");
                    None
                }
            })
            .clone()
    }

    /// The metrics of a font, without creating a PDF font.
    pub(crate) fn metrics(&mut self, list: &FontList, name: &str) -> Option<Arc<LoadedFont>> {
        self.load(list, name)
    }

    pub(crate) fn get(&self, index: usize) -> &PdfFont {
        &self.fonts[index]
    }

    pub(crate) fn fonts(&self) -> &[PdfFont] {
        &self.fonts
    }

    pub(crate) fn len(&self) -> usize {
        self.fonts.len()
    }
}
