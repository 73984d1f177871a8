//! CJK substitution fonts.
//!
//! Fonts that can't be embedded are substituted by one of the predefined CJK fonts
//! every conforming viewer provides. Text is then shown with a UCS-2 CMap, so the
//! code of a character is its code point as two big-endian bytes.

use std::cmp::Ordering;

use pdf_writer::types::SystemInfo;
use pdf_writer::Str;
use serde::{Deserialize, Serialize};

/// One of the four CJK character collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CjkEncoding {
    Japanese,
    Cns1,
    Gb1,
    Korean,
}

impl CjkEncoding {
    /// All collections in their default search order.
    pub const ALL: [CjkEncoding; 4] = [
        CjkEncoding::Japanese,
        CjkEncoding::Cns1,
        CjkEncoding::Gb1,
        CjkEncoding::Korean,
    ];

    /// The name of the substitute font.
    pub fn font_name(&self) -> &'static str {
        match self {
            CjkEncoding::Japanese => "HeiseiMin-W3",
            CjkEncoding::Cns1 => "MHei-Medium",
            CjkEncoding::Gb1 => "STSong-Light",
            CjkEncoding::Korean => "HYGoThic-Medium",
        }
    }

    /// The name of the predefined CMap.
    pub fn cmap_name(&self) -> &'static str {
        match self {
            CjkEncoding::Japanese => "UniJIS-UCS2-H",
            CjkEncoding::Cns1 => "UniCNS-UCS2-H",
            CjkEncoding::Gb1 => "UniGB-UCS2-H",
            CjkEncoding::Korean => "UniKS-UCS2-H",
        }
    }

    pub(crate) fn system_info(&self) -> SystemInfo<'static> {
        let (ordering, supplement): (&'static [u8], i32) = match self {
            CjkEncoding::Japanese => (b"Japan1", 2),
            CjkEncoding::Cns1 => (b"CNS1", 0),
            CjkEncoding::Gb1 => (b"GB1", 2),
            CjkEncoding::Korean => (b"Korea1", 1),
        };

        SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(ordering),
            supplement,
        }
    }

    fn ranges(&self) -> &'static [(u16, u16)] {
        match self {
            CjkEncoding::Japanese => JAPANESE,
            CjkEncoding::Cns1 => CNS1,
            CjkEncoding::Gb1 => GB1,
            CjkEncoding::Korean => KOREAN,
        }
    }

    /// Whether the collection has a glyph for a code point.
    pub fn covers(&self, code_point: u32) -> bool {
        self.ranges()
            .binary_search_by(|&(from, to)| {
                if (to as u32) < code_point {
                    Ordering::Less
                } else if (from as u32) > code_point {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }
}

/// Find the first collection in `order` that covers the code point.
pub fn find_in_cjk_tables(code_point: u32, order: &[CjkEncoding]) -> Option<CjkEncoding> {
    order.iter().copied().find(|e| e.covers(code_point))
}

// Sorted, non-overlapping code point ranges each collection covers.

const JAPANESE: &[(u16, u16)] = &[
    (0x0020, 0x007E),
    (0x00A0, 0x00FF),
    (0x0391, 0x03C9),
    (0x0401, 0x0451),
    (0x2010, 0x2312),
    (0x2460, 0x254B),
    (0x25A0, 0x266F),
    (0x3000, 0x30FF),
    (0x3220, 0x33FF),
    (0x4E00, 0x9FA5),
    (0xF929, 0xFA2D),
    (0xFF01, 0xFFEF),
];

const CNS1: &[(u16, u16)] = &[
    (0x0020, 0x007E),
    (0x00A7, 0x00F7),
    (0x02C7, 0x02D9),
    (0x0391, 0x03C9),
    (0x2013, 0x2312),
    (0x2460, 0x247D),
    (0x2500, 0x2642),
    (0x3000, 0x3129),
    (0x32A3, 0x32A3),
    (0x338E, 0x33D5),
    (0x4E00, 0x9FA4),
    (0xFA0C, 0xFA0D),
    (0xFE30, 0xFE6B),
    (0xFF01, 0xFFE5),
];

const GB1: &[(u16, u16)] = &[
    (0x0020, 0x007E),
    (0x00A4, 0x00FC),
    (0x0101, 0x01DC),
    (0x02C7, 0x02D9),
    (0x0391, 0x03C9),
    (0x0401, 0x0451),
    (0x2015, 0x203B),
    (0x2103, 0x2312),
    (0x2460, 0x249B),
    (0x2500, 0x2642),
    (0x3000, 0x3129),
    (0x3220, 0x3229),
    (0x4E00, 0x9FA5),
    (0xFF01, 0xFFE5),
];

const KOREAN: &[(u16, u16)] = &[
    (0x0020, 0x007E),
    (0x00A1, 0x00FE),
    (0x0111, 0x0167),
    (0x02C7, 0x02DD),
    (0x0391, 0x03C9),
    (0x0401, 0x0451),
    (0x2015, 0x2312),
    (0x2460, 0x24FF),
    (0x2500, 0x266D),
    (0x3000, 0x33DD),
    (0x4E00, 0x9F9C),
    (0xAC00, 0xD7A3),
    (0xF900, 0xFA0B),
    (0xFF01, 0xFFE6),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_sorted() {
        for encoding in CjkEncoding::ALL {
            let ranges = encoding.ranges();
            assert!(ranges.iter().all(|(from, to)| from <= to));
            assert!(ranges.windows(2).all(|w| w[0].1 < w[1].0));
        }
    }

    #[test]
    fn search_order_decides() {
        // Hangul is only part of the Korean collection.
        assert_eq!(
            find_in_cjk_tables(0xAC00, &CjkEncoding::ALL),
            Some(CjkEncoding::Korean)
        );
        // Unified ideographs are found in the first table of the order.
        assert_eq!(
            find_in_cjk_tables(0x6F22, &CjkEncoding::ALL),
            Some(CjkEncoding::Japanese)
        );
        assert_eq!(
            find_in_cjk_tables(0x6F22, &[CjkEncoding::Gb1, CjkEncoding::Japanese]),
            Some(CjkEncoding::Gb1)
        );
        assert_eq!(find_in_cjk_tables(0xAC00, &[CjkEncoding::Japanese]), None);
    }

    #[test]
    fn boundaries() {
        assert!(CjkEncoding::Japanese.covers(0x4E00));
        assert!(CjkEncoding::Japanese.covers(0x9FA5));
        assert!(!CjkEncoding::Japanese.covers(0x9FA6));
        assert!(!CjkEncoding::Korean.covers(0x10000));
    }
}
