//! Encodings built at runtime.
//!
//! When a character of an embedded font is neither part of MacRoman nor of a static
//! table, it gets a slot in a user encoding. Slots are handed out in order, 256 per
//! table, and a character keeps its slot for the rest of the job, so every font
//! using the same user table agrees on the codes.

use std::collections::HashMap;

/// The number of codes in a single user table.
const TABLE_SIZE: usize = 256;

/// All user encodings of a job.
#[derive(Debug, Default)]
pub(crate) struct UserEncodings {
    slots: HashMap<char, (u16, u8)>,
    tables: Vec<Vec<char>>,
}

impl UserEncodings {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Get the slot of a character, declaring a new one if necessary.
    pub(crate) fn declare(&mut self, c: char) -> (u16, u8) {
        if let Some(slot) = self.slots.get(&c) {
            return *slot;
        }

        if self.tables.last().map_or(true, |t| t.len() == TABLE_SIZE) {
            self.tables.push(Vec::with_capacity(TABLE_SIZE));
        }

        let table = self.tables.len() - 1;
        let codes = &mut self.tables[table];
        let slot = (table as u16, codes.len() as u8);
        codes.push(c);
        self.slots.insert(c, slot);

        slot
    }

    /// The characters of a table, indexed by code.
    pub(crate) fn table(&self, index: u16) -> &[char] {
        self.tables
            .get(index as usize)
            .map(|t| t.as_slice())
            .unwrap_or_default()
    }

    /// The number of tables.
    pub(crate) fn len(&self) -> usize {
        self.tables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_stable() {
        let mut user = UserEncodings::new();
        assert_eq!(user.declare('ऄ'), (0, 0));
        assert_eq!(user.declare('अ'), (0, 1));
        assert_eq!(user.declare('ऄ'), (0, 0));
        assert_eq!(user.table(0), &['ऄ', 'अ']);
    }

    #[test]
    fn new_table_after_256_slots() {
        let mut user = UserEncodings::new();

        for (i, c) in ('\u{0900}'..='\u{09FF}').enumerate() {
            assert_eq!(user.declare(c), (0, i as u8));
        }

        assert_eq!(user.declare('\u{0A00}'), (1, 0));
        assert_eq!(user.len(), 2);
        assert!(user.table(5).is_empty());
    }
}
