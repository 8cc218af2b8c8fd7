use std::io;

use crate::varint::VarInt;

/// Append-only byte accumulator used to build encoded output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    buf: Vec<u8>,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn append_u8(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Append an `mb_u_int32`.
    pub fn append_mb_u_int32(&mut self, n: u32) {
        self.append(VarInt::from_u32(n).as_bytes());
    }

    /// Everything appended so far.
    pub fn data(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

impl io::Write for ByteBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl From<ByteBuffer> for Vec<u8> {
    fn from(b: ByteBuffer) -> Vec<u8> {
        b.buf
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}
