//! The PDF version of the produced document.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The version of a PDF document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PdfVersion {
    /// PDF 1.3.
    #[default]
    #[serde(rename = "1.3")]
    Pdf13,
    /// PDF 1.4.
    #[serde(rename = "1.4")]
    Pdf14,
    /// PDF 1.5.
    #[serde(rename = "1.5")]
    Pdf15,
}

impl PdfVersion {
    /// Get a string representation of the PDF version.
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfVersion::Pdf13 => "PDF 1.3",
            PdfVersion::Pdf14 => "PDF 1.4",
            PdfVersion::Pdf15 => "PDF 1.5",
        }
    }

    /// The version as written in the file header.
    pub(crate) fn header(&self) -> &'static [u8] {
        match self {
            PdfVersion::Pdf13 => b"%PDF-1.3\n%\x80\x80\x80\x80\n\n",
            PdfVersion::Pdf14 => b"%PDF-1.4\n%\x80\x80\x80\x80\n\n",
            PdfVersion::Pdf15 => b"%PDF-1.5\n%\x80\x80\x80\x80\n\n",
        }
    }

    /// Whether constant opacity (the `CA`/`ca` graphics state keys) is available.
    pub(crate) fn supports_opacity(&self) -> bool {
        *self >= PdfVersion::Pdf14
    }

    /// Whether images can carry an 8-bit `SMask`.
    pub(crate) fn supports_soft_mask(&self) -> bool {
        *self >= PdfVersion::Pdf14
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
