//! Configuring a print job.
//!
//! A job is configured through [`JobSettings`], which mirrors the options a print
//! dialog hands to the driver. Settings can be built in code or loaded from JSON,
//! unknown keys are ignored and missing keys take their default value.

pub mod version;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use version::PdfVersion;

use crate::font::CjkEncoding;

/// The default upper bound for embedded font files, in bytes.
pub const DEFAULT_MAX_EMBED_FONT_SIZE: u64 = 250 * 1024;

/// The settings of a print job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    /// The PDF version to produce.
    pub pdf_compatibility: PdfVersion,
    /// The deflate level of content streams and images, `0` disables compression.
    pub pdf_compression: u8,
    /// Turn URLs in the text into link annotations.
    pub create_web_links: bool,
    /// The border width of link annotations.
    pub link_border_width: f32,
    /// Turn text set in specific fonts into outline entries.
    pub create_bookmarks: bool,
    /// A JSON file with bookmark definitions.
    pub bookmark_definition_file: Option<PathBuf>,
    /// Link repeated occurrences of specific strings to their first occurrence.
    pub create_xrefs: bool,
    /// A JSON file with cross-reference definitions.
    pub xrefs_file: Option<PathBuf>,
    /// Entries of the document information dictionary.
    pub doc_info: BTreeMap<String, String>,
    /// The CJK tables to search when substituting fonts, in priority order.
    pub cjk_order: Vec<CjkEncoding>,
    /// Fonts with larger files are not embedded.
    pub max_embed_font_size: u64,
    /// Also keep debug entries in the job report.
    pub record_debug: bool,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            pdf_compatibility: PdfVersion::default(),
            pdf_compression: 6,
            create_web_links: false,
            link_border_width: 1.0,
            create_bookmarks: false,
            bookmark_definition_file: None,
            create_xrefs: false,
            xrefs_file: None,
            doc_info: BTreeMap::new(),
            cjk_order: CjkEncoding::ALL.to_vec(),
            max_embed_font_size: DEFAULT_MAX_EMBED_FONT_SIZE,
            record_debug: false,
        }
    }
}

impl JobSettings {
    /// Load settings from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The deflate level to use, if compression is enabled.
    pub(crate) fn compression_level(&self) -> Option<u8> {
        match self.pdf_compression {
            0 => None,
            n => Some(n.min(9)),
        }
    }

    /// The document information entries, with a title and a creator filled in
    /// if none were given.
    pub(crate) fn document_info(&self) -> BTreeMap<String, String> {
        let mut info: BTreeMap<String, String> = self
            .doc_info
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        info.entry("Title".to_string())
            .or_insert_with(|| "Untitled".to_string());
        info.entry("Creator".to_string())
            .or_insert_with(|| env!("CARGO_PKG_NAME").to_string());
        info.insert(
            "Producer".to_string(),
            format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        );

        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let settings = JobSettings::from_json(
            r#"{ "pdf_compatibility": "1.5", "create_bookmarks": true }"#,
        )
        .unwrap();

        assert_eq!(settings.pdf_compatibility, PdfVersion::Pdf15);
        assert!(settings.create_bookmarks);
        assert_eq!(settings.link_border_width, 1.0);
        assert_eq!(settings.cjk_order, CjkEncoding::ALL.to_vec());
        assert_eq!(settings.max_embed_font_size, 250 * 1024);
    }

    #[test]
    fn compression_level() {
        let mut settings = JobSettings::default();
        settings.pdf_compression = 0;
        assert_eq!(settings.compression_level(), None);
        settings.pdf_compression = 12;
        assert_eq!(settings.compression_level(), Some(9));
    }

    #[test]
    fn document_info_defaults() {
        let mut settings = JobSettings::default();
        settings
            .doc_info
            .insert("Title".to_string(), "Report".to_string());
        settings.doc_info.insert("Subject".to_string(), String::new());

        let info = settings.document_info();
        assert_eq!(info["Title"], "Report");
        assert_eq!(info["Creator"], "pdf-print-driver");
        assert!(!info.contains_key("Subject"));
    }
}
