use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The reason a decode call failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The version byte in the header isn't [`WBXML_VERSION`][crate::token::WBXML_VERSION].
    UnsupportedVersion(u8),
    /// The charset MIB number isn't UTF-8 or UTF-16.
    UnsupportedCharset(u32),
    /// The input ended in the middle of a structure, or before the root element was closed.
    UnexpectedEndOfInput,
    /// A tag or attribute token has no entry in the active code page.
    UnknownTag { page: u8, token: u8 },
    /// An `END` token, content, or an attribute value appeared with nothing open to apply it to.
    UnbalancedStructure,
    /// A string table offset pointed outside the table, or at an unterminated string.
    InvalidStringReference(u32),
    /// A multi-byte integer didn't fit in 32 bits.
    IntegerOverflow,
    /// String bytes weren't valid in the document's charset.
    InvalidText,
    /// An `ENTITY` token carried a value that isn't a Unicode scalar value.
    InvalidEntity(u32),
    /// Elements were nested deeper than the decoder allows.
    DepthLimitExceeded(usize),
    /// A literal element name resolved to an empty string.
    EmptyName,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodeErrorKind::UnsupportedVersion(v) => {
                write!(f, "Unsupported format version 0x{:02x}", v)
            }
            DecodeErrorKind::UnsupportedCharset(mib) => {
                write!(f, "Unsupported charset MIB number {}", mib)
            }
            DecodeErrorKind::UnexpectedEndOfInput => f.write_str("Unexpected end of input"),
            DecodeErrorKind::UnknownTag { page, token } => write!(
                f,
                "Token 0x{:02x} isn't defined on code page {}",
                token, page
            ),
            DecodeErrorKind::UnbalancedStructure => {
                f.write_str("Token found with nothing open to apply it to")
            }
            DecodeErrorKind::InvalidStringReference(offset) => {
                write!(f, "String table reference {} is invalid", offset)
            }
            DecodeErrorKind::IntegerOverflow => f.write_str("mb_u_int32 larger than a u32"),
            DecodeErrorKind::InvalidText => f.write_str("String isn't valid in the document charset"),
            DecodeErrorKind::InvalidEntity(code) => {
                write!(f, "Entity 0x{:x} isn't a valid character", code)
            }
            DecodeErrorKind::DepthLimitExceeded(max) => {
                write!(f, "Element nesting exceeded the limit of {}", max)
            }
            DecodeErrorKind::EmptyName => f.write_str("Element name is empty"),
        }
    }
}

/// A decode failure, with the byte offset into the input where it was detected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub offset: usize,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (at byte {})", self.kind, self.offset)
    }
}

impl std::error::Error for DecodeError {}

/// An encode failure. These come from trees the wire format can't carry, not from I/O.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// A text item or attribute value contains U+0000, which every string encoding uses as its
    /// terminator.
    NulInText { context: String },
    /// An element has an empty name.
    EmptyName,
    /// Elements were nested deeper than [`MAX_DEPTH`][crate::MAX_DEPTH].
    DepthLimitExceeded(usize),
    /// The document carries a version this encoder doesn't write.
    UnsupportedVersion(u8),
    /// A well-known public identifier used one of the reserved values 0 or 1.
    ReservedPublicId(u32),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EncodeError::NulInText { ref context } => write!(
                f,
                "Text in {} contains a NUL character, which can't be encoded",
                context
            ),
            EncodeError::EmptyName => f.write_str("Element name is empty"),
            EncodeError::DepthLimitExceeded(max) => {
                write!(f, "Element nesting exceeded the limit of {}", max)
            }
            EncodeError::UnsupportedVersion(v) => {
                write!(f, "Can't encode format version 0x{:02x}", v)
            }
            EncodeError::ReservedPublicId(id) => {
                write!(f, "Public identifier {} is reserved by the header format", id)
            }
        }
    }
}

impl std::error::Error for EncodeError {}

/// Any failure from this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Decode(DecodeError),
    Encode(EncodeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Decode(ref err) => write!(f, "Decode failed: {}", err),
            Error::Encode(ref err) => write!(f, "Encode failed: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Decode(ref err) => Some(err),
            Error::Encode(ref err) => Some(err),
        }
    }
}

impl std::convert::From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl std::convert::From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_carries_offset() {
        let err = DecodeError::new(DecodeErrorKind::UnsupportedCharset(4), 2);
        assert_eq!(err.to_string(), "Unsupported charset MIB number 4 (at byte 2)");
    }

    #[test]
    fn umbrella_source() {
        use std::error::Error as _;
        let err: Error = EncodeError::EmptyName.into();
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Encode failed: Element name is empty");
    }
}
