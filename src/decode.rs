//! Decoding of a complete byte buffer into a [`Document`].
//!
//! The body is read token by token against a stack of open elements. Nothing is handed back until
//! the root element has closed, so a failure never leaves a partial tree visible to the caller.

use byteorder::ReadBytesExt;
use educe::Educe;
use log::{debug, trace, warn};

use crate::{
    charset::Charset,
    code_page::CodePages,
    document::{Document, PublicId},
    element::{Attribute, Element},
    error::{DecodeError, DecodeErrorKind},
    string_table::StringTable,
    token::*,
    varint::{VarInt, VarIntError},
    MAX_DEPTH,
};

/// Decoder settings. The defaults decode any document that names its tags through the string table.
#[derive(Clone, Debug, Educe)]
#[educe(Default)]
pub struct Decoder<'p> {
    code_pages: Option<&'p CodePages>,
    #[educe(Default(expression = MAX_DEPTH))]
    max_depth: usize,
}

impl<'p> Decoder<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve code-page tokens against `pages`.
    pub fn code_pages(mut self, pages: &'p CodePages) -> Self {
        self.code_pages = Some(pages);
        self
    }

    /// Fail on documents nesting elements deeper than `depth`.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn decode(&self, data: &[u8]) -> Result<Document, DecodeError> {
        trace!("Decoding {} byte document", data.len());
        let mut parser = Parser {
            data,
            total: data.len(),
            charset: Charset::Utf8,
            strings: StringTable::new(&[], Charset::Utf8),
            pages: self.code_pages,
            max_depth: self.max_depth,
            tag_page: 0,
            attr_page: 0,
        };
        let (version, public_id) = parser.parse_header()?;
        let root = parser.parse_body()?;
        if !parser.data.is_empty() {
            warn!(
                "Ignoring {} trailing bytes after the root element",
                parser.data.len()
            );
        }
        Ok(Document::from_parts(version, public_id, parser.charset, root))
    }
}

/// An attribute being assembled from its start token and value pieces.
struct PendingAttribute {
    name: String,
    value: String,
}

struct Parser<'a, 'p> {
    data: &'a [u8],
    total: usize,
    charset: Charset,
    strings: StringTable<'a>,
    pages: Option<&'p CodePages>,
    max_depth: usize,
    tag_page: u8,
    attr_page: u8,
}

impl<'a, 'p> Parser<'a, 'p> {
    fn offset(&self) -> usize {
        self.total - self.data.len()
    }

    fn fail<T>(&self, kind: DecodeErrorKind, offset: usize) -> Result<T, DecodeError> {
        Err(DecodeError::new(kind, offset))
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let offset = self.offset();
        self.data
            .read_u8()
            .map_err(|_| DecodeError::new(DecodeErrorKind::UnexpectedEndOfInput, offset))
    }

    fn read_mb_u_int32(&mut self) -> Result<u32, DecodeError> {
        let offset = self.offset();
        match VarInt::read(&mut self.data) {
            Ok(v) => Ok(v.to_u32()),
            Err(VarIntError::Truncated) => {
                self.fail(DecodeErrorKind::UnexpectedEndOfInput, offset)
            }
            Err(VarIntError::Overflow) => self.fail(DecodeErrorKind::IntegerOverflow, offset),
        }
    }

    fn read_raw_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.data.len() {
            return self.fail(DecodeErrorKind::UnexpectedEndOfInput, self.total);
        }
        let (bytes, data) = self.data.split_at(len);
        self.data = data;
        Ok(bytes)
    }

    /// Raw bytes of an inline string, terminator consumed but not returned.
    fn read_raw_str(&mut self) -> Result<&'a [u8], DecodeError> {
        let (bytes, used) = match self.charset.split_terminated(self.data) {
            Some(split) => split,
            None => return self.fail(DecodeErrorKind::UnexpectedEndOfInput, self.total),
        };
        self.data = &self.data[used..];
        Ok(bytes)
    }

    fn read_inline_str(&mut self) -> Result<String, DecodeError> {
        let offset = self.offset();
        let bytes = self.read_raw_str()?;
        self.decode_text(bytes, offset)
    }

    fn read_table_str(&mut self) -> Result<String, DecodeError> {
        let offset = self.offset();
        let index = self.read_mb_u_int32()?;
        self.strings
            .get(index)
            .map_err(|kind| DecodeError::new(kind, offset))
    }

    fn read_opaque(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_mb_u_int32()? as usize;
        self.read_raw_bytes(len)
    }

    fn read_entity(&mut self) -> Result<char, DecodeError> {
        let offset = self.offset();
        let code = self.read_mb_u_int32()?;
        // NUL is the string terminator and can't be carried as text
        match char::from_u32(code) {
            Some(c) if c != '\0' => Ok(c),
            _ => self.fail(DecodeErrorKind::InvalidEntity(code), offset),
        }
    }

    fn decode_text(&self, bytes: &[u8], offset: usize) -> Result<String, DecodeError> {
        match self.charset.decode(bytes) {
            Some(s) if !s.contains('\0') => Ok(s),
            _ => self.fail(DecodeErrorKind::InvalidText, offset),
        }
    }

    /// Version, public identifier, charset, string table. Returns the version and the resolved
    /// public identifier; the charset and string table are kept on the parser.
    fn parse_header(&mut self) -> Result<(u8, PublicId), DecodeError> {
        let version = self.read_u8()?;
        if version != WBXML_VERSION {
            return self.fail(DecodeErrorKind::UnsupportedVersion(version), 0);
        }

        // A string table reference can only be resolved once the table itself has been read
        let public_id_offset = self.offset();
        let public_id_raw = self.read_mb_u_int32()?;
        let public_id_index = if public_id_raw == PUBLIC_ID_STRING_TABLE {
            Some(self.read_mb_u_int32()?)
        } else {
            None
        };

        let charset_offset = self.offset();
        let mib = self.read_mb_u_int32()?;
        self.charset = match Charset::from_mib(mib) {
            Some(charset) => charset,
            None => return self.fail(DecodeErrorKind::UnsupportedCharset(mib), charset_offset),
        };

        let table_len = self.read_mb_u_int32()? as usize;
        let table = self.read_raw_bytes(table_len)?;
        self.strings = StringTable::new(table, self.charset);

        let public_id = match (public_id_raw, public_id_index) {
            (_, Some(index)) => PublicId::Named(
                self.strings
                    .get(index)
                    .map_err(|kind| DecodeError::new(kind, public_id_offset))?,
            ),
            (PUBLIC_ID_UNKNOWN, None) => PublicId::Unknown,
            (id, None) => PublicId::WellKnown(id),
        };
        debug!(
            "Header: version 0x{:02x}, charset {:?}, {} byte string table, public id {:?}",
            version, self.charset, table_len, public_id
        );
        Ok((version, public_id))
    }

    /// Read tokens until the root element closes.
    fn parse_body(&mut self) -> Result<Element, DecodeError> {
        let mut stack: Vec<Element> = Vec::new();
        loop {
            let offset = self.offset();
            let token = self.read_u8()?;
            match Token::from_u8(token) {
                Token::SwitchPage => {
                    self.tag_page = self.read_u8()?;
                }
                Token::End => {
                    let element = match stack.pop() {
                        Some(e) => e,
                        None => return self.fail(DecodeErrorKind::UnbalancedStructure, offset),
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.add_child(element),
                        None => return Ok(element),
                    }
                }
                Token::Entity => {
                    let c = self.read_entity()?;
                    current(&mut stack, offset)?.add_text(c.to_string());
                }
                Token::StrI => {
                    let text = self.read_inline_str()?;
                    current(&mut stack, offset)?.add_text(text);
                }
                Token::StrT => {
                    let text = self.read_table_str()?;
                    current(&mut stack, offset)?.add_text(text);
                }
                Token::Opaque => {
                    let data = self.read_opaque()?;
                    current(&mut stack, offset)?.add_opaque(data);
                }
                Token::Pi => self.skip_pi()?,
                Token::ExtI(_) | Token::ExtT(_) | Token::Ext(_) => self.skip_extension(token)?,
                Token::Literal {
                    attributes,
                    content,
                } => {
                    let name = self.read_table_str()?;
                    if let Some(root) =
                        self.open_element(&mut stack, name, attributes, content, offset)?
                    {
                        return Ok(root);
                    }
                }
                Token::Page(n) => {
                    let (id, attributes, content) = split_tag(n);
                    let name = match self.pages.and_then(|p| p.tag_name(self.tag_page, id)) {
                        Some(name) => name.to_owned(),
                        None => {
                            return self.fail(
                                DecodeErrorKind::UnknownTag {
                                    page: self.tag_page,
                                    token: n,
                                },
                                offset,
                            )
                        }
                    };
                    if let Some(root) =
                        self.open_element(&mut stack, name, attributes, content, offset)?
                    {
                        return Ok(root);
                    }
                }
            }
        }
    }

    /// Start a new element. Elements without content are complete immediately; if such an element
    /// has no parent it's the root, and is returned.
    fn open_element(
        &mut self,
        stack: &mut Vec<Element>,
        name: String,
        attributes: bool,
        content: bool,
        offset: usize,
    ) -> Result<Option<Element>, DecodeError> {
        if stack.len() >= self.max_depth {
            return self.fail(DecodeErrorKind::DepthLimitExceeded(self.max_depth), offset);
        }
        if name.is_empty() {
            return self.fail(DecodeErrorKind::EmptyName, offset);
        }
        let mut element = Element::new(name);
        if attributes {
            let list = self.parse_attributes()?;
            *element.attributes_mut() = list;
        }
        if content {
            stack.push(element);
            return Ok(None);
        }
        match stack.last_mut() {
            Some(parent) => {
                parent.add_child(element);
                Ok(None)
            }
            None => Ok(Some(element)),
        }
    }

    /// An attribute list, up to and including its `END`. Each attribute starts with a literal or a
    /// code-page token, and its value is every value token up to the next start.
    fn parse_attributes(&mut self) -> Result<Vec<Attribute>, DecodeError> {
        let mut list = Vec::new();
        let mut pending: Option<PendingAttribute> = None;
        loop {
            let offset = self.offset();
            let token = self.read_u8()?;
            match Token::from_u8(token) {
                Token::End => break,
                Token::SwitchPage => {
                    self.attr_page = self.read_u8()?;
                }
                Token::Literal {
                    attributes: false,
                    content: false,
                } => {
                    let name = self.read_table_str()?;
                    finish(&mut list, pending.replace(PendingAttribute::new(name)));
                }
                Token::Page(n) if n <= LAST_ATTR_START_TOKEN => {
                    let name = match self.pages.and_then(|p| p.attribute_name(self.attr_page, n)) {
                        Some(name) => name.to_owned(),
                        None => {
                            return self.fail(
                                DecodeErrorKind::UnknownTag {
                                    page: self.attr_page,
                                    token: n,
                                },
                                offset,
                            )
                        }
                    };
                    finish(&mut list, pending.replace(PendingAttribute::new(name)));
                }
                Token::StrI => {
                    let text = self.read_inline_str()?;
                    value_of(&mut pending, offset)?.push_str(&text);
                }
                Token::StrT => {
                    let text = self.read_table_str()?;
                    value_of(&mut pending, offset)?.push_str(&text);
                }
                Token::Entity => {
                    let c = self.read_entity()?;
                    value_of(&mut pending, offset)?.push(c);
                }
                Token::Opaque => {
                    let data = self.read_opaque()?;
                    let text = self.decode_text(data, offset)?;
                    value_of(&mut pending, offset)?.push_str(&text);
                }
                Token::ExtI(_) | Token::ExtT(_) | Token::Ext(_) => self.skip_extension(token)?,
                Token::Page(_) | Token::Literal { .. } | Token::Pi => {
                    return self.fail(
                        DecodeErrorKind::UnknownTag {
                            page: self.attr_page,
                            token,
                        },
                        offset,
                    )
                }
            }
        }
        finish(&mut list, pending);
        Ok(list)
    }

    /// Processing instructions have the shape of a one-entry attribute list and carry nothing the
    /// tree can hold.
    fn skip_pi(&mut self) -> Result<(), DecodeError> {
        let pi = self.parse_attributes()?;
        debug!("Skipping processing instruction {:?}", pi);
        Ok(())
    }

    fn skip_extension(&mut self, token: u8) -> Result<(), DecodeError> {
        match Token::from_u8(token) {
            Token::ExtI(_) => {
                self.read_raw_str()?;
            }
            Token::ExtT(_) => {
                self.read_mb_u_int32()?;
            }
            _ => (),
        }
        debug!("Skipping extension token 0x{:02x}", token);
        Ok(())
    }
}

impl PendingAttribute {
    fn new(name: String) -> Self {
        Self {
            name,
            value: String::new(),
        }
    }
}

fn current(stack: &mut [Element], offset: usize) -> Result<&mut Element, DecodeError> {
    stack
        .last_mut()
        .ok_or(DecodeError::new(DecodeErrorKind::UnbalancedStructure, offset))
}

fn value_of(
    pending: &mut Option<PendingAttribute>,
    offset: usize,
) -> Result<&mut String, DecodeError> {
    pending
        .as_mut()
        .map(|p| &mut p.value)
        .ok_or(DecodeError::new(DecodeErrorKind::UnbalancedStructure, offset))
}

fn finish(list: &mut Vec<Attribute>, pending: Option<PendingAttribute>) {
    if let Some(p) = pending {
        list.push(Attribute::new(p.name, p.value));
    }
}
