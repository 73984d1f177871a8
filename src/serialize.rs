//! Streaming PDF serialization.
//!
//! Objects are written to the sink as soon as they are complete, each one in its own
//! [`Chunk`], so that the byte offset of every object is known when the cross-reference
//! table is written at the very end. Nothing that has been written is ever touched
//! again.

use std::collections::BTreeMap;
use std::hash::Hasher;
use std::io::{self, Write};

use base64::Engine;
use pdf_writer::{Chunk, Ref};
use siphasher::sip128::{Hasher128, SipHasher13};

use crate::configure::PdfVersion;

/// Writes PDF objects to a sink in a single forward pass.
pub(crate) struct PdfSerializer<W: Write> {
    sink: W,
    position: usize,
    offsets: BTreeMap<i32, usize>,
    cur_ref: Ref,
    hasher: SipHasher13,
}

impl<W: Write> PdfSerializer<W> {
    /// Create a new serializer and write the file header.
    pub(crate) fn new(sink: W, version: PdfVersion) -> io::Result<Self> {
        let mut serializer = Self {
            sink,
            position: 0,
            offsets: BTreeMap::new(),
            cur_ref: Ref::new(1),
            hasher: SipHasher13::new(),
        };

        serializer.write_raw(version.header())?;

        Ok(serializer)
    }

    /// Allocate a new object reference.
    pub(crate) fn new_ref(&mut self) -> Ref {
        self.cur_ref.bump()
    }

    /// The number of bytes written so far.
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    /// Write a chunk holding exactly the object `id`.
    pub(crate) fn write_chunk(&mut self, id: Ref, chunk: &Chunk) -> io::Result<()> {
        debug_assert!(!self.offsets.contains_key(&id.get()));

        self.offsets.insert(id.get(), self.position);
        self.write_raw(chunk.as_bytes())
    }

    /// Build the object `id` in a fresh chunk and write it.
    pub(crate) fn emit(&mut self, id: Ref, f: impl FnOnce(&mut Chunk)) -> io::Result<()> {
        let mut chunk = Chunk::new();
        f(&mut chunk);
        self.write_chunk(id, &chunk)
    }

    fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sink.write_all(bytes)?;
        self.hasher.write(bytes);
        self.position += bytes.len();

        Ok(())
    }

    /// Write the cross-reference table and the trailer, and return the sink.
    ///
    /// References that were allocated but never written are listed as free.
    pub(crate) fn finish(mut self, catalog: Ref, info: Option<Ref>) -> io::Result<W> {
        let id = base64::engine::general_purpose::STANDARD
            .encode(self.hasher.finish128().as_u128().to_be_bytes());

        let size = self.cur_ref.get();
        let xref_offset = self.position;

        let mut table = format!("xref\n0 {size}\n0000000000 65535 f\r\n");

        for i in 1..size {
            match self.offsets.get(&i) {
                Some(offset) => table.push_str(&format!("{offset:010} 00000 n\r\n")),
                None => table.push_str("0000000000 65535 f\r\n"),
            }
        }

        table.push_str(&format!("trailer\n<< /Size {size} /Root {} 0 R", catalog.get()));

        if let Some(info) = info {
            table.push_str(&format!(" /Info {} 0 R", info.get()));
        }

        table.push_str(&format!(" /ID [({id}) ({id})] >>\n"));
        table.push_str(&format!("startxref\n{xref_offset}\n%%EOF\n"));

        self.write_raw(table.as_bytes())?;
        self.sink.flush()?;

        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use pdf_writer::writers::Catalog;

    use super::*;

    #[test]
    fn offsets_point_to_objects() {
        let mut serializer = PdfSerializer::new(Vec::new(), PdfVersion::Pdf14).unwrap();
        let catalog_ref = serializer.new_ref();
        let pages_ref = serializer.new_ref();
        let unused = serializer.new_ref();
        assert_eq!(unused, Ref::new(3));

        serializer
            .emit(pages_ref, |chunk| {
                chunk.pages(pages_ref).count(0);
            })
            .unwrap();
        let catalog_offset = serializer.position();
        serializer
            .emit(catalog_ref, |chunk| {
                chunk
                    .indirect(catalog_ref)
                    .start::<Catalog>()
                    .pages(pages_ref);
            })
            .unwrap();

        let bytes = serializer.finish(catalog_ref, None).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.starts_with("%PDF-1.4"));
        assert!(bytes[catalog_offset..].starts_with(b"1 0 obj"));
        assert!(text.contains(&format!("{catalog_offset:010} 00000 n\r\n")));
        assert!(text.contains("xref\n0 4\n"));
        assert!(text.contains("/Size 4 /Root 1 0 R"));
        assert!(text.ends_with("%%EOF\n"));
    }
}
