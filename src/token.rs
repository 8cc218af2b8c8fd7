//! Format constants and the classification of body token bytes.

/// The only format version this crate reads and writes.
pub const WBXML_VERSION: u8 = 0x01;

/// IANA MIB number for UTF-8.
pub const CHARSET_UTF8: u32 = 106;
/// IANA MIB number for UTF-16.
pub const CHARSET_UTF16: u32 = 0x03F7;

/// Public identifier value meaning "the identifier is a string table reference".
pub const PUBLIC_ID_STRING_TABLE: u32 = 0;
/// Public identifier value meaning "unknown or missing".
pub const PUBLIC_ID_UNKNOWN: u32 = 1;

pub const SWITCH_PAGE: u8 = 0x00;
pub const END: u8 = 0x01;
pub const ENTITY: u8 = 0x02;
pub const STR_I: u8 = 0x03;
pub const LITERAL: u8 = 0x04;
pub const EXT_I_0: u8 = 0x40;
pub const EXT_I_1: u8 = 0x41;
pub const EXT_I_2: u8 = 0x42;
pub const PI: u8 = 0x43;
pub const LITERAL_C: u8 = 0x44;
pub const EXT_T_0: u8 = 0x80;
pub const EXT_T_1: u8 = 0x81;
pub const EXT_T_2: u8 = 0x82;
pub const STR_T: u8 = 0x83;
pub const LITERAL_A: u8 = 0x84;
pub const EXT_0: u8 = 0xC0;
pub const EXT_1: u8 = 0xC1;
pub const EXT_2: u8 = 0xC2;
pub const OPAQUE: u8 = 0xC3;
pub const LITERAL_AC: u8 = 0xC4;

/// Tag token bit: the element has an attribute list.
pub const TAG_HAS_ATTRIBUTES: u8 = 0x80;
/// Tag token bit: the element has content, closed by `END`.
pub const TAG_HAS_CONTENT: u8 = 0x40;
/// Mask for the tag identity within a tag token.
pub const TAG_ID_MASK: u8 = 0x3F;

/// Lowest token value a code page can assign to a tag or attribute start.
pub const FIRST_PAGE_TOKEN: u8 = 0x05;
/// Highest tag identity a code page can assign.
pub const LAST_TAG_TOKEN: u8 = TAG_ID_MASK;
/// Highest attribute-start token a code page can assign.
pub const LAST_ATTR_START_TOKEN: u8 = 0x7F;

/// A single body token byte, classified. Global tokens have the same meaning on every code page,
/// everything else is interpreted against the active page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    SwitchPage,
    End,
    Entity,
    StrI,
    StrT,
    Opaque,
    Pi,
    /// `EXT_I_n`: extension with an inline string argument.
    ExtI(u8),
    /// `EXT_T_n`: extension with a string table argument.
    ExtT(u8),
    /// `EXT_n`: extension with no argument.
    Ext(u8),
    /// One of the `LITERAL*` tokens, naming an element through the string table.
    Literal { attributes: bool, content: bool },
    /// A code-page token. Inside content this is a tag; inside an attribute list, values below
    /// 0x80 are attribute starts and the rest are attribute values.
    Page(u8),
}

impl Token {
    pub fn from_u8(n: u8) -> Token {
        match n {
            SWITCH_PAGE => Token::SwitchPage,
            END => Token::End,
            ENTITY => Token::Entity,
            STR_I => Token::StrI,
            LITERAL => Token::Literal {
                attributes: false,
                content: false,
            },
            EXT_I_0..=EXT_I_2 => Token::ExtI(n - EXT_I_0),
            PI => Token::Pi,
            LITERAL_C => Token::Literal {
                attributes: false,
                content: true,
            },
            EXT_T_0..=EXT_T_2 => Token::ExtT(n - EXT_T_0),
            STR_T => Token::StrT,
            LITERAL_A => Token::Literal {
                attributes: true,
                content: false,
            },
            EXT_0..=EXT_2 => Token::Ext(n - EXT_0),
            OPAQUE => Token::Opaque,
            LITERAL_AC => Token::Literal {
                attributes: true,
                content: true,
            },
            _ => Token::Page(n),
        }
    }

    pub fn into_u8(self) -> u8 {
        match self {
            Token::SwitchPage => SWITCH_PAGE,
            Token::End => END,
            Token::Entity => ENTITY,
            Token::StrI => STR_I,
            Token::StrT => STR_T,
            Token::Opaque => OPAQUE,
            Token::Pi => PI,
            Token::ExtI(i) => EXT_I_0 + i,
            Token::ExtT(i) => EXT_T_0 + i,
            Token::Ext(i) => EXT_0 + i,
            Token::Literal {
                attributes,
                content,
            } => LITERAL | tag_flags(attributes, content),
            Token::Page(n) => n,
        }
    }
}

impl From<u8> for Token {
    fn from(val: u8) -> Token {
        Token::from_u8(val)
    }
}

impl From<Token> for u8 {
    fn from(val: Token) -> u8 {
        val.into_u8()
    }
}

/// The attribute/content bits of a tag token.
pub fn tag_flags(attributes: bool, content: bool) -> u8 {
    let mut flags = 0;
    if attributes {
        flags |= TAG_HAS_ATTRIBUTES;
    }
    if content {
        flags |= TAG_HAS_CONTENT;
    }
    flags
}

/// Split a code-page tag token into its identity and flags.
pub fn split_tag(n: u8) -> (u8, bool, bool) {
    (
        n & TAG_ID_MASK,
        n & TAG_HAS_ATTRIBUTES != 0,
        n & TAG_HAS_CONTENT != 0,
    )
}
