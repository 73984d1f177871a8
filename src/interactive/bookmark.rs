//! The document outline, generated from headings.
//!
//! A bookmark definition names a font. Text drawn in that font is taken as a heading
//! and becomes an item of the outline, nested according to the level of the
//! definition.

use std::io::{self, Write};
use std::ops::Range;
use std::path::Path;

use float_cmp::approx_eq;
use pdf_writer::{Finish, Name, Ref, TextStr};
use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;
use crate::interactive::read_definitions;
use crate::picture::FontSpec;
use crate::serialize::PdfSerializer;
use crate::text::Line;

/// Text drawn in the described font becomes an outline item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkDefinition {
    /// The nesting level, `1` being the top level.
    pub level: u32,
    pub family: String,
    pub style: String,
    pub size: f32,
}

impl BookmarkDefinition {
    fn matches(&self, font: &FontSpec) -> bool {
        font.family == self.family
            && font.style == self.style
            && approx_eq!(f32, font.size, self.size, epsilon = 0.01)
    }
}

/// A recorded heading.
#[derive(Debug, Clone, PartialEq)]
struct Bookmark {
    level: u32,
    title: String,
    page: Ref,
    /// The top-left corner of the heading, in PDF space.
    x: f32,
    y: f32,
}

/// An item of the outline tree, referring to a recorded heading.
struct OutlineNode {
    bookmark: usize,
    children: Vec<OutlineNode>,
}

/// Build the tree of all bookmarks starting at `pos` that are nested deeper than
/// `parent_level`.
fn build_tree(bookmarks: &[Bookmark], pos: &mut usize, parent_level: Option<u32>) -> Vec<OutlineNode> {
    let mut nodes = vec![];

    while let Some(bookmark) = bookmarks.get(*pos) {
        if parent_level.is_some_and(|level| bookmark.level <= level) {
            break;
        }

        let index = *pos;
        *pos += 1;
        let children = build_tree(bookmarks, pos, Some(bookmark.level));

        nodes.push(OutlineNode {
            bookmark: index,
            children,
        });
    }

    nodes
}

/// The headings of a job.
#[derive(Debug, Default)]
pub(crate) struct Bookmarks {
    definitions: Vec<BookmarkDefinition>,
    bookmarks: Vec<Bookmark>,
}

impl Bookmarks {
    pub(crate) fn new(definitions: Vec<BookmarkDefinition>) -> Self {
        Self {
            definitions,
            bookmarks: vec![],
        }
    }

    /// Read the definitions from a JSON file.
    pub(crate) fn load(path: &Path) -> Result<Self, DefinitionError> {
        read_definitions(path).map(Self::new)
    }

    pub(crate) fn len(&self) -> usize {
        self.bookmarks.len()
    }

    /// Record the headings in a line of the page `page`.
    pub(crate) fn collect(&mut self, line: &Line, page: Ref) {
        // Consecutive segments in the same heading font form a single title.
        let mut headings: Vec<(usize, usize, Range<usize>)> = vec![];

        for (index, segment) in line.segments().iter().enumerate() {
            let Some(definition) = self.definitions.iter().position(|d| d.matches(&segment.font))
            else {
                continue;
            };

            let range = line.segment_chars(index);

            match headings.last_mut() {
                Some((prev, last, r)) if *prev == definition && *last + 1 == index => {
                    *last = index;
                    r.end = range.end;
                }
                _ => headings.push((definition, index, range)),
            }
        }

        let chars = line.chars();

        for (definition, _, range) in headings {
            let title: String = chars[range.clone()].iter().collect();
            let title = title.trim();

            if title.is_empty() {
                continue;
            }

            if let Some(bounds) = line.bounds(range) {
                self.bookmarks.push(Bookmark {
                    level: self.definitions[definition].level,
                    title: title.to_string(),
                    page,
                    x: bounds.left(),
                    y: bounds.bottom(),
                });
            }
        }
    }

    /// Write the outline and return the reference of its root, if there are any
    /// bookmarks.
    pub(crate) fn serialize<W: Write>(
        &self,
        sc: &mut PdfSerializer<W>,
    ) -> io::Result<Option<Ref>> {
        let tree = build_tree(&self.bookmarks, &mut 0, None);

        if tree.is_empty() {
            return Ok(None);
        }

        let root_ref = sc.new_ref();
        let (first, last, count) = self.serialize_nodes(&tree, root_ref, sc)?;

        sc.emit(root_ref, |chunk| {
            chunk
                .outline(root_ref)
                .first(first)
                .last(last)
                .count(count);
        })?;

        Ok(Some(root_ref))
    }

    /// Write a list of siblings and their descendants. Returns the first and the last
    /// sibling and the number of items in total.
    fn serialize_nodes<W: Write>(
        &self,
        nodes: &[OutlineNode],
        parent: Ref,
        sc: &mut PdfSerializer<W>,
    ) -> io::Result<(Ref, Ref, i32)> {
        let refs: Vec<Ref> = nodes.iter().map(|_| sc.new_ref()).collect();
        let mut count = 0;

        for (i, node) in nodes.iter().enumerate() {
            let item_ref = refs[i];
            let children = if node.children.is_empty() {
                None
            } else {
                Some(self.serialize_nodes(&node.children, item_ref, sc)?)
            };

            let bookmark = &self.bookmarks[node.bookmark];
            let dest_ref = sc.new_ref();

            sc.emit(dest_ref, |chunk| {
                chunk
                    .destination(dest_ref)
                    .page(bookmark.page)
                    .xyz(bookmark.x, bookmark.y, None);
            })?;

            sc.emit(item_ref, |chunk| {
                let mut item = chunk.outline_item(item_ref);
                item.title(TextStr(&bookmark.title));
                item.parent(parent);

                if i > 0 {
                    item.prev(refs[i - 1]);
                }

                if let Some(next) = refs.get(i + 1) {
                    item.next(*next);
                }

                if let Some((first, last, count)) = children {
                    item.first(first);
                    item.last(last);
                    item.count(count);
                }

                item.insert(Name(b"Dest")).primitive(dest_ref);
                item.finish();
            })?;

            count += 1 + children.map_or(0, |(_, _, c)| c);
        }

        // `nodes` is never empty.
        let (first, last) = (refs[0], refs[refs.len() - 1]);

        Ok((first, last, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configure::PdfVersion;
    use crate::text::tests::segment;
    use crate::text::TextLine;

    fn definition(level: u32, size: f32) -> BookmarkDefinition {
        BookmarkDefinition {
            level,
            family: "Helvetica".to_string(),
            style: "Regular".to_string(),
            size,
        }
    }

    fn heading(text: &str, y: f32, size: f32) -> Line {
        let mut segment = segment(text, 10.0, y);
        segment.font.size = size;

        let mut line = TextLine::new();
        line.add(segment);
        line.flush().unwrap()
    }

    #[test]
    fn only_matching_fonts_become_bookmarks() {
        let mut bookmarks = Bookmarks::new(vec![definition(1, 18.0)]);
        bookmarks.collect(&heading("Chapter", 800.0, 18.0), Ref::new(5));
        bookmarks.collect(&heading("body text", 780.0, 12.0), Ref::new(5));

        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks.bookmarks[0].title, "Chapter");
        assert_eq!(bookmarks.bookmarks[0].y, 808.0);
    }

    #[test]
    fn levels_nest() {
        let mut bookmarks = Bookmarks::new(vec![definition(1, 18.0), definition(2, 14.0)]);
        let headings = [
            ("A", 500.0, 18.0),
            ("A.1", 480.0, 14.0),
            ("A.2", 460.0, 14.0),
            ("B", 440.0, 18.0),
        ];
        for (text, y, size) in headings {
            bookmarks.collect(&heading(text, y, size), Ref::new(5));
        }

        let tree = build_tree(&bookmarks.bookmarks, &mut 0, None);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].children.len(), 2);
        assert!(tree[1].children.is_empty());

        let mut sc = PdfSerializer::new(Vec::new(), PdfVersion::Pdf14).unwrap();
        let root = bookmarks.serialize(&mut sc).unwrap().unwrap();
        let catalog = sc.new_ref();
        let bytes = sc.finish(catalog, None).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains(&format!("{} 0 obj", root.get())));
        assert!(text.contains("/Type /Outlines"));
        assert!(text.contains("/Count 4"));
        assert!(text.contains("/Title (A.2)"));
        for top in [508, 488, 468, 448] {
            assert!(text.contains(&format!("/XYZ 10 {top} 0]")));
        }
    }

    #[test]
    fn heading_after_body_text_starts_at_its_own_left_edge() {
        let mut bookmarks = Bookmarks::new(vec![definition(1, 18.0)]);
        let mut body = segment("see", 0.0, 100.0);
        body.font.size = 12.0;
        let mut title = segment("Intro", 30.0, 100.0);
        title.font.size = 18.0;

        let mut line = TextLine::new();
        line.add(body);
        line.add(title);
        bookmarks.collect(&line.flush().unwrap(), Ref::new(5));

        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks.bookmarks[0].title, "Intro");
        assert_eq!(bookmarks.bookmarks[0].x, 30.0);
    }

    #[test]
    fn heading_drawn_word_by_word_is_one_title() {
        let mut bookmarks = Bookmarks::new(vec![definition(1, 18.0)]);
        let mut line = TextLine::new();
        for (word, x) in [("Getting", 0.0), ("started", 50.0)] {
            let mut word = segment(word, x, 100.0);
            word.font.size = 18.0;
            line.add(word);
        }
        bookmarks.collect(&line.flush().unwrap(), Ref::new(5));

        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks.bookmarks[0].title, "Getting started");
    }

    #[test]
    fn empty_outline_is_not_written() {
        let bookmarks = Bookmarks::new(vec![definition(1, 18.0)]);
        let mut sc = PdfSerializer::new(Vec::new(), PdfVersion::Pdf14).unwrap();
        assert_eq!(bookmarks.serialize(&mut sc).unwrap(), None);
    }
}
