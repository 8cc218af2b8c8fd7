//! `mb_u_int32`: 7 payload bits per byte, most significant group first, high bit set on every
//! byte except the last.

use byteorder::ReadBytesExt;

/// Longest valid encoding of a u32.
pub const MAX_LEN: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarIntError {
    /// Ran out of bytes before the final group.
    Truncated,
    /// Value doesn't fit in a u32, or the encoding is longer than 5 bytes.
    Overflow,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VarInt {
    n: [u8; MAX_LEN],
    len: u8,
}

impl VarInt {
    pub fn from_u32(i: u32) -> VarInt {
        let mut groups = [0u8; MAX_LEN];
        let mut len = 0;
        let mut rest = i;
        loop {
            groups[len] = (rest & 0x7F) as u8;
            len += 1;
            rest >>= 7;
            if rest == 0 {
                break;
            }
        }
        // Groups were collected least significant first
        let mut n = [0u8; MAX_LEN];
        for (dst, src) in n.iter_mut().zip(groups[..len].iter().rev()) {
            *dst = *src | 0x80;
        }
        n[len - 1] &= 0x7F;
        VarInt { n, len: len as u8 }
    }

    pub fn to_u32(self) -> u32 {
        self.as_bytes()
            .iter()
            .fold(0u32, |acc, b| (acc << 7) | (b & 0x7F) as u32)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.n[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.as_bytes());
    }

    /// Read one integer, advancing the slice past it.
    pub fn read(buf: &mut &[u8]) -> Result<VarInt, VarIntError> {
        let mut n = [0u8; MAX_LEN];
        let mut len = 0;
        let mut value = 0u32;
        loop {
            let b = buf.read_u8().map_err(|_| VarIntError::Truncated)?;
            if len == MAX_LEN || value > (u32::MAX >> 7) {
                return Err(VarIntError::Overflow);
            }
            value = (value << 7) | (b & 0x7F) as u32;
            n[len] = b;
            len += 1;
            if b & 0x80 == 0 {
                break;
            }
        }
        Ok(VarInt { n, len: len as u8 })
    }
}

impl From<u32> for VarInt {
    fn from(n: u32) -> Self {
        VarInt::from_u32(n)
    }
}

impl From<u8> for VarInt {
    fn from(n: u8) -> Self {
        VarInt::from_u32(n as u32)
    }
}

impl From<VarInt> for u32 {
    fn from(v: VarInt) -> u32 {
        v.to_u32()
    }
}
