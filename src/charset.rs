//! Text encodings a document can declare. Every string on the wire is terminated by a NUL in the
//! document's charset: one zero byte for UTF-8, one zero code unit for UTF-16.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::{
    buffer::ByteBuffer,
    token::{CHARSET_UTF16, CHARSET_UTF8},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Charset {
    #[default]
    Utf8,
    /// Big-endian unless the string starts with a byte-order mark.
    Utf16,
}

const BYTE_ORDER_MARK: u16 = 0xFEFF;

fn needs_byte_order_mark(s: &str) -> bool {
    s.starts_with(['\u{FEFF}', '\u{FFFE}'])
}

impl Charset {
    /// Look up a charset by its IANA MIB number.
    pub fn from_mib(mib: u32) -> Option<Charset> {
        match mib {
            CHARSET_UTF8 => Some(Charset::Utf8),
            CHARSET_UTF16 => Some(Charset::Utf16),
            _ => None,
        }
    }

    pub fn mib(self) -> u32 {
        match self {
            Charset::Utf8 => CHARSET_UTF8,
            Charset::Utf16 => CHARSET_UTF16,
        }
    }

    pub fn terminator_len(self) -> usize {
        match self {
            Charset::Utf8 => 1,
            Charset::Utf16 => 2,
        }
    }

    /// Bytes `s` occupies on the wire, terminator included.
    pub fn encoded_len(self, s: &str) -> usize {
        match self {
            Charset::Utf8 => s.len() + 1,
            Charset::Utf16 => {
                let mark = if needs_byte_order_mark(s) { 1 } else { 0 };
                2 * (mark + s.encode_utf16().count() + 1)
            }
        }
    }

    /// Write `s` followed by the terminator. The caller is responsible for rejecting embedded NULs.
    pub fn write_terminated(self, buf: &mut ByteBuffer, s: &str) {
        debug_assert!(!s.contains('\0'));
        match self {
            Charset::Utf8 => {
                buf.append(s.as_bytes());
                buf.append_u8(0);
            }
            Charset::Utf16 => {
                // Text opening with a mark-like character gets a real mark ahead of it, or the
                // decoder would take the character itself as the mark
                let mark = needs_byte_order_mark(s).then_some(BYTE_ORDER_MARK);
                let units = mark.into_iter().chain(s.encode_utf16());
                for unit in units.chain(std::iter::once(0)) {
                    // Writing into a Vec can't fail
                    let _ = buf.write_u16::<BigEndian>(unit);
                }
            }
        }
    }

    /// Find the terminator in `data`, returning the string bytes before it and the number of bytes
    /// consumed including the terminator. `None` if no terminator is present.
    pub fn split_terminated(self, data: &[u8]) -> Option<(&[u8], usize)> {
        match self {
            Charset::Utf8 => {
                let end = memchr::memchr(0, data)?;
                Some((&data[..end], end + 1))
            }
            Charset::Utf16 => {
                let units = data.chunks_exact(2).position(|unit| unit == [0, 0])?;
                let end = 2 * units;
                Some((&data[..end], end + 2))
            }
        }
    }

    /// Decode string bytes (no terminator). `None` if the bytes aren't valid in this charset.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Charset::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            Charset::Utf16 => {
                if bytes.len() % 2 != 0 {
                    return None;
                }
                let little = bytes.starts_with(&[0xFF, 0xFE]);
                let mut rdr = if little || bytes.starts_with(&[0xFE, 0xFF]) {
                    &bytes[2..]
                } else {
                    bytes
                };
                let mut units = Vec::with_capacity(rdr.len() / 2);
                while !rdr.is_empty() {
                    let unit = if little {
                        rdr.read_u16::<LittleEndian>()
                    } else {
                        rdr.read_u16::<BigEndian>()
                    };
                    units.push(unit.ok()?);
                }
                String::from_utf16(&units).ok()
            }
        }
    }
}
