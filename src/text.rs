//! Collecting drawn text into lines.
//!
//! Strings are drawn one run at a time and carry no notion of the line they belong
//! to. Every run is recorded as a [`TextSegment`], and consecutive segments sharing a
//! baseline are grouped into a [`Line`] that web links, bookmarks and cross references
//! are searched in. Only unrotated text is recorded.

use std::ops::Range;

use float_cmp::approx_eq;
use tiny_skia_path::{Point, Rect};

use crate::picture::FontSpec;

/// A run of text drawn by a single operation, in PDF space.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextSegment {
    pub(crate) text: String,
    /// The pen position at the start of the run, on the baseline.
    pub(crate) start: Point,
    pub(crate) escapement_space: f32,
    pub(crate) escapement_no_space: f32,
    pub(crate) bounds: Rect,
    /// The x coordinates of the character boundaries, one more than there are
    /// characters.
    edges: Vec<f32>,
    pub(crate) font: FontSpec,
}

impl TextSegment {
    /// Create a segment. Returns `None` for empty runs and for inconsistent edges.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        text: String,
        start: Point,
        escapement_space: f32,
        escapement_no_space: f32,
        edges: Vec<f32>,
        ascent: f32,
        descent: f32,
        font: FontSpec,
    ) -> Option<Self> {
        if text.is_empty() || edges.len() != text.chars().count() + 1 {
            return None;
        }

        let (first, last) = (*edges.first()?, *edges.last()?);
        let bounds = Rect::from_ltrb(
            first.min(last),
            start.y - descent,
            first.max(last),
            start.y + ascent,
        )?;

        Some(Self {
            text,
            start,
            escapement_space,
            escapement_no_space,
            bounds,
            edges,
            font,
        })
    }

    /// Whether the segment continues the line ending with `prev`.
    fn continues(&self, prev: &TextSegment) -> bool {
        approx_eq!(f32, self.start.y, prev.start.y, epsilon = 0.01)
            && self.start.x >= prev.bounds.left()
    }
}

/// A character of a line, with its horizontal extent.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LineChar {
    c: char,
    left: f32,
    right: f32,
    /// The segment that drew the character, `None` for inserted spaces.
    segment: Option<usize>,
}

/// A complete line of text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Line {
    segments: Vec<TextSegment>,
    chars: Vec<LineChar>,
    text: String,
}

impl Line {
    fn new(segments: Vec<TextSegment>) -> Self {
        let mut chars: Vec<LineChar> = vec![];

        for (index, segment) in segments.iter().enumerate() {
            // Separate segments with a gap between them by a space, so that words
            // drawn one by one can still be told apart.
            if let Some(prev) = chars.last().copied() {
                let gap = segment.bounds.left() - prev.right;

                if gap > segment.font.size * 0.2 && prev.c != ' ' {
                    chars.push(LineChar {
                        c: ' ',
                        left: prev.right,
                        right: segment.bounds.left(),
                        segment: None,
                    });
                }
            }

            for (i, c) in segment.text.chars().enumerate() {
                let (a, b) = (segment.edges[i], segment.edges[i + 1]);
                chars.push(LineChar {
                    c,
                    left: a.min(b),
                    right: a.max(b),
                    segment: Some(index),
                });
            }
        }

        let text = chars.iter().map(|c| c.c).collect();

        Self {
            segments,
            chars,
            text,
        }
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn segments(&self) -> &[TextSegment] {
        &self.segments
    }

    /// The characters of the line as a vector, for index based matching.
    pub(crate) fn chars(&self) -> Vec<char> {
        self.chars.iter().map(|c| c.c).collect()
    }

    /// The range of characters drawn by a segment.
    pub(crate) fn segment_chars(&self, segment: usize) -> Range<usize> {
        let start = self.chars.iter().position(|c| c.segment == Some(segment));
        let end = self.chars.iter().rposition(|c| c.segment == Some(segment));

        match (start, end) {
            (Some(start), Some(end)) => start..end + 1,
            _ => 0..0,
        }
    }

    /// The bounds of a range of characters, `None` for an empty range.
    pub(crate) fn bounds(&self, range: Range<usize>) -> Option<Rect> {
        let chars = self.chars.get(range)?;
        let (first, last) = (chars.first()?, chars.last()?);
        let mut drawn = chars.iter().filter_map(|c| c.segment);
        let low = drawn.next()?;
        let high = drawn.last().unwrap_or(low);

        // PDF space, so the y range grows upwards.
        let (mut y0, mut y1) = (f32::INFINITY, f32::NEG_INFINITY);
        for segment in &self.segments[low..=high] {
            y0 = y0.min(segment.bounds.top());
            y1 = y1.max(segment.bounds.bottom());
        }

        Rect::from_ltrb(first.left, y0, last.right, y1)
    }
}

/// The line currently being collected.
#[derive(Debug, Default)]
pub(crate) struct TextLine {
    segments: Vec<TextSegment>,
}

impl TextLine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a segment. If it starts a new line, the completed line is returned.
    pub(crate) fn add(&mut self, segment: TextSegment) -> Option<Line> {
        let completed = match self.segments.last() {
            Some(prev) if !segment.continues(prev) => self.flush(),
            _ => None,
        };

        self.segments.push(segment);
        completed
    }

    /// Complete the current line.
    pub(crate) fn flush(&mut self) -> Option<Line> {
        if self.segments.is_empty() {
            return None;
        }

        Some(Line::new(std::mem::take(&mut self.segments)))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A segment with characters 5 units wide.
    pub(crate) fn segment(text: &str, x: f32, y: f32) -> TextSegment {
        let edges = (0..=text.chars().count())
            .map(|i| x + i as f32 * 5.0)
            .collect();

        TextSegment::new(
            text.to_string(),
            Point::from_xy(x, y),
            0.0,
            0.0,
            edges,
            8.0,
            2.0,
            FontSpec::default(),
        )
        .unwrap()
    }

    #[test]
    fn segments_on_one_baseline_form_a_line() {
        let mut line = TextLine::new();
        assert!(line.add(segment("Hello", 0.0, 100.0)).is_none());
        assert!(line.add(segment("world", 25.0, 100.0)).is_none());

        let completed = line.add(segment("Next", 0.0, 80.0)).unwrap();
        assert_eq!(completed.text(), "Helloworld");
        assert_eq!(completed.segments().len(), 2);

        let last = line.flush().unwrap();
        assert_eq!(last.text(), "Next");
        assert!(line.is_empty());
        assert!(line.flush().is_none());
    }

    #[test]
    fn gaps_become_spaces() {
        let mut line = TextLine::new();
        line.add(segment("see", 0.0, 100.0));
        line.add(segment("www.example.com", 30.0, 100.0));
        let line = line.flush().unwrap();

        assert_eq!(line.text(), "see www.example.com");
        assert_eq!(line.segment_chars(0), 0..3);
        assert_eq!(line.segment_chars(1), 4..19);
        assert_eq!(line.bounds(line.segment_chars(1)).unwrap().left(), 30.0);
        // The inserted space alone was drawn by no segment.
        assert!(line.bounds(3..4).is_none());
    }

    #[test]
    fn bounds_of_a_range() {
        let mut line = TextLine::new();
        line.add(segment("abcdef", 10.0, 100.0));
        let line = line.flush().unwrap();

        let bounds = line.bounds(2..4).unwrap();
        assert_eq!(bounds.left(), 20.0);
        assert_eq!(bounds.right(), 30.0);
        assert_eq!(bounds.top(), 98.0);
        assert_eq!(bounds.bottom(), 108.0);
        assert!(line.bounds(3..3).is_none());
    }

    #[test]
    fn empty_runs_are_not_recorded() {
        assert!(TextSegment::new(
            String::new(),
            Point::from_xy(0.0, 0.0),
            0.0,
            0.0,
            vec![0.0],
            1.0,
            1.0,
            FontSpec::default()
        )
        .is_none());
    }
}
