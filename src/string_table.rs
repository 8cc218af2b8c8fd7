//! The per-document string table: one blob of terminated strings, referenced by byte offset.
//!
//! Decoding and encoding use separate types. [`StringTable`] only resolves offsets into a borrowed
//! blob, [`StringTableBuilder`] only interns. Both live for a single call.

use std::collections::HashMap;

use crate::{buffer::ByteBuffer, charset::Charset, error::DecodeErrorKind};

/// Read-only view of a decoded document's string table.
#[derive(Clone, Copy, Debug)]
pub struct StringTable<'a> {
    data: &'a [u8],
    charset: Charset,
}

impl<'a> StringTable<'a> {
    pub fn new(data: &'a [u8], charset: Charset) -> Self {
        Self { data, charset }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Resolve the string starting at `offset`. Offsets may point into the middle of a string;
    /// the result then runs from there to the next terminator.
    pub fn get(&self, offset: u32) -> Result<String, DecodeErrorKind> {
        let start = offset as usize;
        if start >= self.data.len() {
            return Err(DecodeErrorKind::InvalidStringReference(offset));
        }
        let (bytes, _) = self
            .charset
            .split_terminated(&self.data[start..])
            .ok_or(DecodeErrorKind::InvalidStringReference(offset))?;
        self.charset
            .decode(bytes)
            .ok_or(DecodeErrorKind::InvalidText)
    }
}

/// Interns strings for an encode call, handing out the offset each one is written at.
#[derive(Clone, Debug)]
pub struct StringTableBuilder {
    buf: ByteBuffer,
    offsets: HashMap<String, u32>,
    charset: Charset,
}

impl StringTableBuilder {
    pub fn new(charset: Charset) -> Self {
        Self {
            buf: ByteBuffer::new(),
            offsets: HashMap::new(),
            charset,
        }
    }

    /// Add `s` if it isn't present yet, returning its offset.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&offset) = self.offsets.get(s) {
            return offset;
        }
        let offset = self.buf.len() as u32;
        self.charset.write_terminated(&mut self.buf, s);
        self.offsets.insert(s.to_owned(), offset);
        offset
    }

    pub fn offset(&self, s: &str) -> Option<u32> {
        self.offsets.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        self.buf.data()
    }
}
