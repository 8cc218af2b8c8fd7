//! Encoding of a [`Document`] into bytes.
//!
//! The body is written depth first into a scratch buffer while names and long text values are
//! interned into the string table. The header and finished table are then written ahead of it, so
//! every string table offset is known by the time it's referenced.

use educe::Educe;
use log::trace;

use crate::{
    buffer::ByteBuffer,
    charset::Charset,
    code_page::CodePages,
    document::{Document, PublicId},
    element::{Content, Element},
    error::EncodeError,
    string_table::StringTableBuilder,
    token::*,
    MAX_DEPTH,
};

/// Text values at least this many bytes long (terminator included) go in the string table.
pub const DEFAULT_STRING_TABLE_THRESHOLD: usize = 16;

/// Encoder settings.
#[derive(Clone, Debug, Educe)]
#[educe(Default)]
pub struct Encoder<'p> {
    code_pages: Option<&'p CodePages>,
    #[educe(Default(expression = DEFAULT_STRING_TABLE_THRESHOLD))]
    string_table_threshold: usize,
}

impl<'p> Encoder<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write names that have a token in `pages` as that token.
    pub fn code_pages(mut self, pages: &'p CodePages) -> Self {
        self.code_pages = Some(pages);
        self
    }

    /// Text values whose encoded length reaches `len` bytes are written once to the string table
    /// and referenced from there. Shorter values are written inline. `usize::MAX` inlines
    /// everything.
    pub fn string_table_threshold(mut self, len: usize) -> Self {
        self.string_table_threshold = len;
        self
    }

    pub fn encode(&self, doc: &Document) -> Result<Vec<u8>, EncodeError> {
        if doc.version() != WBXML_VERSION {
            return Err(EncodeError::UnsupportedVersion(doc.version()));
        }
        let charset = doc.charset();
        let mut writer = Writer {
            pages: self.code_pages,
            threshold: self.string_table_threshold,
            charset,
            strings: StringTableBuilder::new(charset),
            body: ByteBuffer::new(),
            tag_page: 0,
            attr_page: 0,
        };

        // Named identifiers are always string table references
        let public_id = match doc.public_id() {
            PublicId::WellKnown(id @ (PUBLIC_ID_STRING_TABLE | PUBLIC_ID_UNKNOWN)) => {
                return Err(EncodeError::ReservedPublicId(*id));
            }
            PublicId::Named(name) => {
                check_nul(name, || "the public identifier".to_string())?;
                Some(writer.strings.intern(name))
            }
            _ => None,
        };

        writer.write_element(doc.root(), 1)?;

        let strings = writer.strings.data();
        let mut out = ByteBuffer::with_capacity(strings.len() + writer.body.len() + 16);
        out.append_u8(WBXML_VERSION);
        match (doc.public_id(), public_id) {
            (_, Some(offset)) => {
                out.append_mb_u_int32(PUBLIC_ID_STRING_TABLE);
                out.append_mb_u_int32(offset);
            }
            (PublicId::WellKnown(id), None) => out.append_mb_u_int32(*id),
            _ => out.append_mb_u_int32(PUBLIC_ID_UNKNOWN),
        }
        out.append_mb_u_int32(charset.mib());
        out.append_mb_u_int32(strings.len() as u32);
        out.append(strings);
        out.append(writer.body.data());
        trace!(
            "Encoded {} bytes, {} byte string table",
            out.len(),
            strings.len()
        );
        Ok(out.into_vec())
    }
}

/// Per-call encoding state. Page tracking mirrors the decoder: one active page for tags, one for
/// attributes, both starting at 0.
struct Writer<'p> {
    pages: Option<&'p CodePages>,
    threshold: usize,
    charset: Charset,
    strings: StringTableBuilder,
    body: ByteBuffer,
    tag_page: u8,
    attr_page: u8,
}

impl<'p> Writer<'p> {
    fn switch_tag_page(&mut self, page: u8) {
        if page != self.tag_page {
            self.body.append(&[SWITCH_PAGE, page]);
            self.tag_page = page;
        }
    }

    fn switch_attr_page(&mut self, page: u8) {
        if page != self.attr_page {
            self.body.append(&[SWITCH_PAGE, page]);
            self.attr_page = page;
        }
    }

    fn write_element(&mut self, elem: &Element, depth: usize) -> Result<(), EncodeError> {
        if depth > MAX_DEPTH {
            return Err(EncodeError::DepthLimitExceeded(MAX_DEPTH));
        }
        if elem.name().is_empty() {
            return Err(EncodeError::EmptyName);
        }
        let attributes = elem.has_attributes();
        let content = elem.has_content();

        check_nul(elem.name(), || "an element name".to_string())?;
        match self.pages.and_then(|p| p.tag_token(elem.name())) {
            Some((page, token)) => {
                self.switch_tag_page(page);
                let tag = token | tag_flags(attributes, content);
                debug_assert_eq!(split_tag(tag), (token, attributes, content));
                self.body.append_u8(tag);
            }
            None => {
                let offset = self.strings.intern(elem.name());
                self.body.append_u8(
                    Token::Literal {
                        attributes,
                        content,
                    }
                    .into(),
                );
                self.body.append_mb_u_int32(offset);
            }
        }

        if attributes {
            for attr in elem.attributes() {
                match self.pages.and_then(|p| p.attribute_token(attr.name())) {
                    Some((page, token)) => {
                        self.switch_attr_page(page);
                        self.body.append_u8(token);
                    }
                    None => {
                        check_nul(attr.name(), || format!("an attribute name of <{}>", elem.name()))?;
                        let offset = self.strings.intern(attr.name());
                        self.body.append_u8(LITERAL);
                        self.body.append_mb_u_int32(offset);
                    }
                }
                if !attr.value().is_empty() {
                    self.write_text(attr.value(), elem)?;
                }
            }
            self.body.append_u8(END);
        }

        if content {
            for item in elem.content() {
                match item {
                    Content::Element(child) => self.write_element(child, depth + 1)?,
                    Content::Text(text) => self.write_text(text, elem)?,
                    Content::Opaque(data) => {
                        assert!(data.len() <= u32::MAX as usize);
                        self.body.append_u8(OPAQUE);
                        self.body.append_mb_u_int32(data.len() as u32);
                        self.body.append(data);
                    }
                }
            }
            self.body.append_u8(END);
        }
        Ok(())
    }

    fn write_text(&mut self, text: &str, elem: &Element) -> Result<(), EncodeError> {
        check_nul(text, || format!("element <{}>", elem.name()))?;
        if self.charset.encoded_len(text) >= self.threshold {
            let offset = self.strings.intern(text);
            self.body.append_u8(STR_T);
            self.body.append_mb_u_int32(offset);
        } else {
            self.body.append_u8(STR_I);
            self.charset.write_terminated(&mut self.body, text);
        }
        Ok(())
    }
}

fn check_nul(text: &str, context: impl FnOnce() -> String) -> Result<(), EncodeError> {
    if text.contains('\0') {
        return Err(EncodeError::NulInText { context: context() });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::Decoder;

    #[test]
    fn single_literal_element() {
        let doc = Document::new(Element::new("ping"));
        let enc = Encoder::new().encode(&doc).unwrap();
        assert_eq!(
            enc,
            vec![WBXML_VERSION, 0x01, 0x6A, 0x05, b'p', b'i', b'n', b'g', 0x00, LITERAL, 0x00]
        );
    }

    #[test]
    fn flags_and_inline_text() {
        let mut root = Element::new("a");
        root.set_attribute("b", "c");
        root.add_text("d");
        let enc = Encoder::new().encode(&Document::new(root)).unwrap();
        assert_eq!(
            enc,
            vec![
                WBXML_VERSION, 0x01, 0x6A, 0x04, b'a', 0x00, b'b', 0x00,
                LITERAL_AC, 0x00,
                LITERAL, 0x02, STR_I, b'c', 0x00, END,
                STR_I, b'd', 0x00, END,
            ]
        );
    }

    #[test]
    fn long_text_shared_through_table() {
        let long = "a value long enough for the table";
        let mut root = Element::new("r");
        root.add_child(Element::with_text("x", long));
        root.add_child(Element::with_text("x", long));
        let enc = Encoder::new().encode(&Document::new(root.clone())).unwrap();
        let inline = Encoder::new()
            .string_table_threshold(usize::MAX)
            .encode(&Document::new(root.clone()))
            .unwrap();
        assert!(enc.len() + long.len() - 4 < inline.len());
        // The long value is in the table only once
        let count = enc
            .windows(long.len())
            .filter(|w| *w == long.as_bytes())
            .count();
        assert_eq!(count, 1);
        for bytes in [enc, inline] {
            assert_eq!(Decoder::new().decode(&bytes).unwrap().root(), &root);
        }
    }

    #[test]
    fn code_page_switches() {
        let pages = CodePages::new()
            .tag(0, 0x05, "Sync")
            .tag(1, 0x06, "Folder")
            .attribute(2, 0x07, "kind");
        let mut folder = Element::new("Folder");
        folder.set_attribute("kind", "x");
        let mut root = Element::new("Sync");
        root.add_child(folder.clone());
        root.add_child(folder);
        let enc = Encoder::new()
            .code_pages(&pages)
            .encode(&Document::new(root.clone()))
            .unwrap();
        assert_eq!(
            enc,
            vec![
                WBXML_VERSION, 0x01, 0x6A, 0x00,
                0x45,
                SWITCH_PAGE, 0x01, 0x86, SWITCH_PAGE, 0x02, 0x07, STR_I, b'x', 0x00, END,
                0x86, 0x07, STR_I, b'x', 0x00, END,
                END,
            ]
        );
        let doc = Decoder::new().code_pages(&pages).decode(&enc).unwrap();
        assert_eq!(doc.root(), &root);
    }

    #[test]
    fn public_ids() {
        let named = Document::new(Element::new("a"))
            .with_public_id(PublicId::Named("-//A//".into()));
        let enc = Encoder::new().encode(&named).unwrap();
        assert_eq!(&enc[..4], &[WBXML_VERSION, 0x00, 0x00, 0x6A]);
        assert_eq!(Decoder::new().decode(&enc).unwrap(), named);

        let known = Document::new(Element::new("a")).with_public_id(PublicId::WellKnown(0x0B));
        let enc = Encoder::new().encode(&known).unwrap();
        assert_eq!(&enc[..3], &[WBXML_VERSION, 0x0B, 0x6A]);
        assert_eq!(Decoder::new().decode(&enc).unwrap(), known);
    }

    #[test]
    fn reserved_public_ids_rejected() {
        for id in [PUBLIC_ID_STRING_TABLE, PUBLIC_ID_UNKNOWN] {
            let doc = Document::new(Element::new("ping")).with_public_id(PublicId::WellKnown(id));
            assert_eq!(
                Encoder::new().encode(&doc),
                Err(EncodeError::ReservedPublicId(id))
            );
        }
    }

    #[test]
    fn upper_attribute_tokens() {
        let pages = CodePages::new()
            .tag(0, 0x05, "Item")
            .attribute(0, 0x45, "id")
            .attribute(0, 0x7E, "kind")
            .attribute(1, 0x60, "ref");
        let mut root = Element::new("Item");
        root.set_attribute("id", "7");
        root.set_attribute("ref", "");
        root.set_attribute("kind", "note");
        let enc = Encoder::new()
            .code_pages(&pages)
            .encode(&Document::new(root.clone()))
            .unwrap();
        assert_eq!(
            &enc[4..],
            &[
                0x85,
                0x45, STR_I, b'7', 0x00,
                SWITCH_PAGE, 0x01, 0x60,
                SWITCH_PAGE, 0x00, 0x7E, STR_I, b'n', b'o', b't', b'e', 0x00,
                END,
            ]
        );
        let doc = Decoder::new().code_pages(&pages).decode(&enc).unwrap();
        assert_eq!(doc.root(), &root);
    }

    #[test]
    fn decoded_entities_reencode() {
        for charset in [Charset::Utf8, Charset::Utf16] {
            let mut table = ByteBuffer::new();
            charset.write_terminated(&mut table, "a");
            let mut data = ByteBuffer::new();
            data.append(&[WBXML_VERSION, 0x01]);
            data.append_mb_u_int32(charset.mib());
            data.append_mb_u_int32(table.len() as u32);
            data.append(table.data());
            // <a a="&#xFEFF;">&#xFEFF;&#xFFFE;&#xE9;</a>
            data.append(&[LITERAL_AC, 0x00, LITERAL, 0x00, ENTITY, 0x83, 0xFD, 0x7F, END]);
            data.append(&[ENTITY, 0x83, 0xFD, 0x7F, ENTITY, 0x83, 0xFF, 0x7E]);
            data.append(&[ENTITY, 0x81, 0x69, END]);

            let doc = Decoder::new().decode(data.data()).unwrap();
            assert_eq!(doc.root().attribute_value("a"), Some("\u{FEFF}"));
            assert_eq!(doc.root().text(), "\u{FEFF}\u{FFFE}\u{E9}");
            let enc = Encoder::new().encode(&doc).unwrap();
            assert_eq!(Decoder::new().decode(&enc).unwrap(), doc);
        }
    }

    #[test]
    fn nul_rejected() {
        let doc = Document::new(Element::with_text("a", "x\0y"));
        assert_eq!(
            Encoder::new().encode(&doc),
            Err(EncodeError::NulInText {
                context: "element <a>".into()
            })
        );

        let mut root = Element::new("a");
        root.set_attribute("k", "\0");
        assert!(matches!(
            Encoder::new().encode(&Document::new(root)),
            Err(EncodeError::NulInText { .. })
        ));

        let doc = Document::new(Element::new("a")).with_public_id(PublicId::Named("\0".into()));
        assert!(Encoder::new().encode(&doc).is_err());
    }

    #[test]
    fn empty_name_rejected() {
        let mut root = Element::new("a");
        root.add_child(Element::new(""));
        assert_eq!(
            Encoder::new().encode(&Document::new(root)),
            Err(EncodeError::EmptyName)
        );
    }

    #[test]
    fn depth_limit() {
        let mut elem = Element::new("leaf");
        for _ in 1..MAX_DEPTH {
            let mut parent = Element::new("n");
            parent.add_child(elem);
            elem = parent;
        }
        let enc = Encoder::new().encode(&Document::new(elem.clone())).unwrap();
        assert!(Decoder::new().decode(&enc).is_ok());

        let mut parent = Element::new("n");
        parent.add_child(elem);
        assert_eq!(
            Encoder::new().encode(&Document::new(parent)),
            Err(EncodeError::DepthLimitExceeded(MAX_DEPTH))
        );
    }

    #[test]
    fn utf16_roundtrip() {
        let mut root = Element::new("Nachricht");
        root.set_attribute("grüße", "ünïcödé");
        root.add_text("\u{1F600} emoji text that is long enough for the table");
        let doc = Document::new(root).with_charset(Charset::Utf16);
        let enc = Encoder::new().encode(&doc).unwrap();
        assert_eq!(&enc[..4], &[WBXML_VERSION, 0x01, 0x87, 0x77]);
        assert_eq!(Decoder::new().decode(&enc).unwrap(), doc);
    }

    #[test]
    fn utf16_mark_like_text() {
        let mut root = Element::new("a");
        root.set_attribute("k", "\u{FFFE}");
        root.add_text("\u{FEFF}x");
        root.add_text("\u{FFFE}y");
        root.add_text("\u{FEFF} long enough to land in the string table");
        for charset in [Charset::Utf16, Charset::Utf8] {
            let doc = Document::new(root.clone()).with_charset(charset);
            let enc = Encoder::new().encode(&doc).unwrap();
            assert_eq!(Decoder::new().decode(&enc).unwrap(), doc);
        }
    }
}
