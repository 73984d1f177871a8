//! Single-byte encodings.
//!
//! Text is preferably shown with the MacRoman encoding, which every viewer knows and
//! which keeps the text extractable. Characters outside of MacRoman are looked up
//! in five static tables, each covering a handful of Unicode blocks. A code's byte
//! value is its index in the table, the glyph is named `uniXXXX` in the font's
//! `Differences` array.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// The high half of the MacRoman encoding, `0x80..=0xFF`.
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è', // 0x80
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü', // 0x90
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø', // 0xA0
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø', // 0xB0
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{A0}', 'À', 'Ã', 'Õ', 'Œ', 'œ', // 0xC0
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹', '›', 'ﬁ', 'ﬂ', // 0xD0
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô', // 0xE0
    '\u{F8FF}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ', // 0xF0
];

static MAC_ROMAN_REVERSE: Lazy<HashMap<char, u8>> = Lazy::new(|| {
    MAC_ROMAN_HIGH
        .iter()
        .enumerate()
        .map(|(i, c)| (*c, 0x80 + i as u8))
        .collect()
});

/// Glyphs of the Mac character set that the standard `MacRomanEncoding` of PDF
/// leaves out, as `(code, glyph name)`.
pub(crate) const MAC_ROMAN_DIFFERENCES: &[(u8, &str)] = &[
    (173, "notequal"),
    (176, "infinity"),
    (178, "lessequal"),
    (179, "greaterequal"),
    (182, "partialdiff"),
    (183, "summation"),
    (184, "product"),
    (185, "pi"),
    (186, "integral"),
    (189, "Omega"),
    (195, "radical"),
    (197, "approxequal"),
    (198, "Delta"),
    (215, "lozenge"),
    (219, "Euro"),
    (240, "apple"),
];

/// Convert a character to MacRoman. Returns `None` for characters outside of the
/// encoding and for NUL.
pub fn char_to_mac_roman(c: char) -> Option<u8> {
    match c as u32 {
        0 => None,
        1..=0x7F => Some(c as u8),
        _ => MAC_ROMAN_REVERSE.get(&c).copied(),
    }
}

/// Convert a MacRoman byte to a character.
pub fn mac_roman_to_char(b: u8) -> char {
    if b < 0x80 {
        b as char
    } else {
        MAC_ROMAN_HIGH[(b - 0x80) as usize]
    }
}

/// A static single-byte encoding table.
#[derive(Debug)]
pub struct EncodingTable {
    ranges: &'static [(u16, u16)],
    unicodes: Vec<u16>,
}

impl EncodingTable {
    fn new(ranges: &'static [(u16, u16)], unassigned: &[u16]) -> Self {
        let unicodes: Vec<u16> = ranges
            .iter()
            .flat_map(|&(from, to)| from..=to)
            .filter(|u| !unassigned.contains(u))
            .collect();
        debug_assert!(unicodes.len() <= 256);
        debug_assert!(unicodes.windows(2).all(|w| w[0] < w[1]));

        Self { ranges, unicodes }
    }

    /// The code point ranges the table is responsible for.
    pub fn ranges(&self) -> &'static [(u16, u16)] {
        self.ranges
    }

    /// Whether a code point falls into one of the table's ranges.
    pub fn covers(&self, code_point: u32) -> bool {
        self.ranges
            .iter()
            .any(|&(from, to)| from as u32 <= code_point && code_point <= to as u32)
    }

    /// Find the code of a code point. Code points outside the table's ranges and
    /// unassigned code points inside them yield `None`.
    pub fn lookup(&self, code_point: u32) -> Option<u8> {
        if !self.covers(code_point) {
            return None;
        }

        let mut bottom = 0i32;
        let mut top = self.unicodes.len() as i32 - 1;

        while top >= bottom {
            let m = (top + bottom) / 2;
            let u = self.unicodes[m as usize] as u32;

            if code_point < u {
                top = m - 1;
            } else if code_point > u {
                bottom = m + 1;
            } else {
                return Some(m as u8);
            }
        }

        None
    }

    /// The character of a code.
    pub fn char_at(&self, code: u8) -> Option<char> {
        self.unicodes
            .get(code as usize)
            .and_then(|&u| char::from_u32(u as u32))
    }

    /// The number of codes in the table.
    pub fn len(&self) -> usize {
        self.unicodes.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.unicodes.is_empty()
    }
}

/// The number of static tables.
pub const STATIC_TABLES: u8 = 5;

static TABLES: Lazy<[EncodingTable; STATIC_TABLES as usize]> = Lazy::new(|| {
    [
        // Latin-1 supplement, Latin extended A and the start of extended B.
        EncodingTable::new(&[(0x00A0, 0x00FF), (0x0100, 0x017F), (0x0180, 0x019F)], &[]),
        // Rest of Latin extended B and spacing modifiers.
        EncodingTable::new(&[(0x01A0, 0x024F), (0x02B0, 0x02FF)], &[]),
        // Greek and the basic Cyrillic block.
        EncodingTable::new(
            &[(0x0370, 0x03FF), (0x0400, 0x046F)],
            &[0x0378, 0x0379, 0x0380, 0x0381, 0x0382, 0x0383, 0x038B, 0x038D, 0x03A2],
        ),
        // Historic Cyrillic and Latin extended additional.
        EncodingTable::new(&[(0x0470, 0x04FF), (0x1E00, 0x1E6F)], &[]),
        // Punctuation, currency, letterlike symbols and arrows.
        EncodingTable::new(
            &[(0x2000, 0x206F), (0x20A0, 0x20BF), (0x2100, 0x214F), (0x2190, 0x21AF)],
            &[0x2065],
        ),
    ]
});

/// Get one of the static tables.
pub fn table(index: u8) -> Option<&'static EncodingTable> {
    TABLES.get(index as usize)
}

/// Find the static table and code of a code point.
///
/// The first table whose ranges cover the code point decides; a code point it
/// doesn't contain is not looked up in any other table.
pub fn find_encoding(code_point: u32) -> Option<(u8, u8)> {
    TABLES
        .iter()
        .enumerate()
        .find(|(_, t)| t.covers(code_point))
        .and_then(|(i, t)| t.lookup(code_point).map(|code| (i as u8, code)))
}

/// The glyph name used for a character in `Differences` arrays.
pub(crate) fn glyph_name(c: char) -> String {
    let u = c as u32;

    if u <= 0xFFFF {
        format!("uni{u:04X}")
    } else {
        format!("u{u:05X}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_roman_round_trip_of_high_half() {
        for b in 0x80..=0xFF {
            assert_eq!(char_to_mac_roman(mac_roman_to_char(b)), Some(b));
        }
    }

    #[test]
    fn mac_roman_conversion() {
        assert_eq!(char_to_mac_roman('A'), Some(b'A'));
        assert_eq!(char_to_mac_roman('é'), Some(0x8E));
        assert_eq!(char_to_mac_roman('€'), Some(0xDB));
        assert_eq!(char_to_mac_roman('\0'), None);
        assert_eq!(char_to_mac_roman('Ā'), None);
    }

    #[test]
    fn control_characters_map_to_themselves() {
        assert_eq!(char_to_mac_roman('\u{0}'), None);
        assert_eq!(char_to_mac_roman('\u{1}'), Some(0x01));
        assert_eq!(char_to_mac_roman('\u{1F}'), Some(0x1F));
        assert_eq!(char_to_mac_roman('\u{7F}'), Some(0x7F));
        assert_eq!(mac_roman_to_char(0x1F), '\u{1F}');
    }

    #[test]
    fn table_boundaries() {
        for i in 0..STATIC_TABLES {
            let table = table(i).unwrap();
            assert!(table.len() <= 256);

            for &(from, to) in table.ranges() {
                let from = from as u32;
                let to = to as u32;
                assert!(table.lookup(from).is_some(), "{from:#x}");
                assert!(table.lookup(to).is_some(), "{to:#x}");

                if !table.covers(from - 1) {
                    assert_eq!(table.lookup(from - 1), None);
                }
                if !table.covers(to + 1) {
                    assert_eq!(table.lookup(to + 1), None);
                }
            }
        }
    }

    #[test]
    fn outside_of_ranges() {
        let greek = table(2).unwrap();
        assert_eq!(greek.lookup(0x036F), None);
        assert_eq!(greek.lookup(0x0470), None);
        assert_eq!(find_encoding(0x0300), None);
        assert_eq!(find_encoding(0x21B0), None);
    }

    #[test]
    fn unassigned_code_point_is_a_clean_miss() {
        assert_eq!(find_encoding(0x0378), None);
        assert_eq!(find_encoding(0x0377), Some((2, 7)));
    }

    #[test]
    fn codes_are_indices() {
        assert_eq!(find_encoding(0x00A0), Some((0, 0)));
        assert_eq!(find_encoding(0x0100), Some((0, 96)));
        assert_eq!(find_encoding(0x2190), Some((4, 223)));
        assert_eq!(table(0).unwrap().char_at(96), Some('Ā'));
    }

    #[test]
    fn glyph_names() {
        assert_eq!(glyph_name('Ā'), "uni0100");
        assert_eq!(glyph_name('\u{1F600}'), "u1F600");
    }
}
