//! Cross references between occurrences of the same text.
//!
//! Each definition is a piece of text. Its first occurrence in the document is the
//! destination, and every later occurrence becomes a link to it. Destinations are
//! recorded while patterns are collected, so links on a page can point to text
//! further down the same page.

use std::io::{self, Write};
use std::path::Path;

use float_cmp::approx_eq;
use pdf_writer::Ref;
use tiny_skia_path::Rect;

use crate::error::DefinitionError;
use crate::interactive::annotation::{LinkAnnotation, Target};
use crate::interactive::read_definitions;
use crate::serialize::PdfSerializer;
use crate::text::Line;

/// The first occurrence of a pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
struct XRefDest {
    page_index: usize,
    rect: Rect,
    dest_ref: Ref,
}

impl XRefDest {
    fn is_at(&self, page_index: usize, rect: &Rect) -> bool {
        self.page_index == page_index
            && approx_eq!(f32, self.rect.left(), rect.left(), epsilon = 0.01)
            && approx_eq!(f32, self.rect.bottom(), rect.bottom(), epsilon = 0.01)
    }
}

/// All occurrences of `pattern` in `chars`, as character ranges.
fn find_all(chars: &[char], pattern: &[char]) -> Vec<std::ops::Range<usize>> {
    if pattern.is_empty() || pattern.len() > chars.len() {
        return vec![];
    }

    chars
        .windows(pattern.len())
        .enumerate()
        .filter(|(_, w)| *w == pattern)
        .map(|(i, _)| i..i + pattern.len())
        .collect()
}

#[derive(Debug, Default)]
pub(crate) struct XRefs {
    patterns: Vec<Vec<char>>,
    dests: Vec<Option<XRefDest>>,
}

impl XRefs {
    pub(crate) fn new(patterns: Vec<String>) -> Self {
        let patterns: Vec<Vec<char>> = patterns
            .into_iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.chars().collect())
            .collect();
        let dests = vec![None; patterns.len()];

        Self { patterns, dests }
    }

    /// Read the patterns from a JSON file.
    pub(crate) fn load(path: &Path) -> Result<Self, DefinitionError> {
        read_definitions(path).map(Self::new)
    }

    /// The number of patterns that have a destination.
    pub(crate) fn resolved(&self) -> usize {
        self.dests.iter().flatten().count()
    }

    /// Record the first occurrences of patterns in a line and write their
    /// destinations.
    pub(crate) fn record<W: Write>(
        &mut self,
        line: &Line,
        page_index: usize,
        page_ref: Ref,
        sc: &mut PdfSerializer<W>,
    ) -> io::Result<()> {
        let chars = line.chars();

        for (pattern, dest) in self.patterns.iter().zip(self.dests.iter_mut()) {
            if dest.is_some() {
                continue;
            }

            let Some(rect) = find_all(&chars, pattern)
                .into_iter()
                .find_map(|range| line.bounds(range))
            else {
                continue;
            };

            let dest_ref = sc.new_ref();
            sc.emit(dest_ref, |chunk| {
                chunk
                    .destination(dest_ref)
                    .page(page_ref)
                    .xyz(rect.left(), rect.bottom(), None);
            })?;

            *dest = Some(XRefDest {
                page_index,
                rect,
                dest_ref,
            });
        }

        Ok(())
    }

    /// Create links for all occurrences of patterns in a line, except for the
    /// destinations themselves.
    pub(crate) fn links(
        &self,
        line: &Line,
        page_index: usize,
        border_width: f32,
    ) -> Vec<LinkAnnotation> {
        let chars = line.chars();
        let mut links = vec![];

        for (pattern, dest) in self.patterns.iter().zip(&self.dests) {
            let Some(dest) = dest else {
                continue;
            };

            for range in find_all(&chars, pattern) {
                let Some(rect) = line.bounds(range) else {
                    continue;
                };

                if dest.is_at(page_index, &rect) {
                    continue;
                }

                links.push(
                    LinkAnnotation::new(rect, Target::Destination(dest.dest_ref))
                        .with_border(border_width),
                );
            }
        }

        links
    }
}
