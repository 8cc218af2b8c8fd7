//! wbxml-pack is a codec for a compact, tokenized binary encoding of hierarchical documents.
//!
//! A document is a tree of named elements, each carrying an ordered list of attributes and an
//! ordered sequence of content: text, opaque binary segments, and child elements. On the wire,
//! element and attribute names are either single-byte tokens from a set of [`CodePages`] agreed on
//! by both ends, or references into a per-document string table.
//!
//! The codec is two pure functions:
//!
//! - [`decode`] turns a complete byte buffer into a [`Document`], or fails with a [`DecodeError`]
//!   carrying the byte offset where the problem was found.
//! - [`encode`] turns a [`Document`] back into bytes. Any document produced by `decode` encodes
//!   back into an equivalent tree.
//!
//! Use [`Decoder`] and [`Encoder`] directly to supply code pages or change limits.
//!
//! ```
//! use wbxml_pack::{decode, encode, Document, Element};
//!
//! let mut root = Element::new("Message");
//! root.set_attribute("id", "42");
//! root.add_child(Element::with_text("Body", "hello"));
//! root.add_opaque(vec![0xde, 0xad, 0xbe, 0xef]);
//!
//! let doc = Document::new(root);
//! let bytes = encode(&doc).unwrap();
//! let back = decode(&bytes).unwrap();
//! assert_eq!(back, doc);
//! assert_eq!(back.root().child_text("Body").as_deref(), Some("hello"));
//! ```

mod buffer;
mod charset;
mod code_page;
mod decode;
mod document;
mod element;
mod encode;
mod error;
mod string_table;
pub mod token;
mod varint;

pub use buffer::ByteBuffer;
pub use charset::Charset;
pub use code_page::CodePages;
pub use decode::Decoder;
pub use document::{Document, PublicId};
pub use element::{Attribute, Content, Element};
pub use encode::{Encoder, DEFAULT_STRING_TABLE_THRESHOLD};
pub use error::{DecodeError, DecodeErrorKind, EncodeError, Error, Result};

/// Maximum element nesting depth, counting the root as 1. Both the decoder's default limit and
/// the encoder's fixed limit.
pub const MAX_DEPTH: usize = 256;

/// Decode a complete document with no code pages.
pub fn decode(data: &[u8]) -> Result<Document, DecodeError> {
    Decoder::new().decode(data)
}

/// Encode a document with no code pages and the default string table threshold.
pub fn encode(doc: &Document) -> Result<Vec<u8>, EncodeError> {
    Encoder::new().encode(doc)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::*;
    use rand::prelude::*;

    const NAMES: &[&str] = &["Sync", "Folder", "ServerId", "Data", "Class", "x"];

    fn rand_text<R: Rng>(rng: &mut R) -> String {
        let len = rng.gen_range(0..40);
        (0..len)
            .map(|_| match rng.gen_range(0..12) {
                0 => 'ß',
                1 => '\u{1F600}',
                // Both read as a byte-order mark when they lead a UTF-16 string
                2 => '\u{FEFF}',
                3 => '\u{FFFE}',
                _ => rng.gen_range('a'..='z'),
            })
            .collect()
    }

    fn rand_element<R: Rng>(rng: &mut R, depth: usize) -> Element {
        let mut elem = Element::new(*NAMES.choose(rng).unwrap());
        for _ in 0..rng.gen_range(0..3) {
            elem.add_attribute(*NAMES.choose(rng).unwrap(), rand_text(rng));
        }
        if depth < 5 {
            for _ in 0..rng.gen_range(0..5) {
                match rng.gen_range(0..4) {
                    0 => elem.add_child(rand_element(rng, depth + 1)),
                    1 => {
                        let mut data = vec![0u8; rng.gen_range(0..300)];
                        rng.fill_bytes(&mut data);
                        elem.add_opaque(data);
                    }
                    _ => elem.add_text(rand_text(rng)),
                }
            }
        }
        elem
    }

    fn rand_document<R: Rng>(rng: &mut R) -> Document {
        let charset = if rng.gen() {
            Charset::Utf8
        } else {
            Charset::Utf16
        };
        let public_id = match rng.gen_range(0..3) {
            0 => PublicId::Unknown,
            1 => PublicId::WellKnown(rng.gen_range(2..=u32::MAX)),
            _ => PublicId::Named("-//TEST//DTD Random 1.0//EN".into()),
        };
        Document::new(rand_element(rng, 1))
            .with_charset(charset)
            .with_public_id(public_id)
    }

    #[test]
    fn random_roundtrip() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let pages = CodePages::new()
            .tag(0, 0x05, "Sync")
            .tag(1, 0x05, "Folder")
            .attribute(3, 0x7F, "Class");
        for _ in 0..200 {
            let doc = rand_document(&mut rng);
            let enc = encode(&doc).unwrap();
            let dec = decode(&enc).unwrap();
            assert_eq!(dec, doc);
            // Second pass is stable in tree shape
            assert_eq!(decode(&encode(&dec).unwrap()).unwrap(), dec);

            let enc = Encoder::new().code_pages(&pages).encode(&doc).unwrap();
            assert_eq!(Decoder::new().code_pages(&pages).decode(&enc).unwrap(), doc);
        }
    }

    #[test]
    fn truncation_sweep() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let enc = encode(&rand_document(&mut rng)).unwrap();
            for len in 0..enc.len() {
                match decode(&enc[..len]) {
                    Ok(_) => (),
                    Err(e) => assert!(
                        matches!(
                            e.kind(),
                            DecodeErrorKind::UnexpectedEndOfInput
                                | DecodeErrorKind::UnbalancedStructure
                        ),
                        "prefix of {} bytes failed with {}",
                        len,
                        e
                    ),
                }
            }
        }
    }

    #[test]
    fn random_bytes_never_panic() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut data = vec![0u8; 64];
        for _ in 0..2000 {
            rng.fill_bytes(&mut data);
            data[0] = WBXML_VERSION;
            data[1] = PUBLIC_ID_UNKNOWN as u8;
            data[2] = 0x6A;
            let _ = decode(&data);
        }
    }

    #[test]
    fn ping_scenario() {
        let data = [
            WBXML_VERSION, PUBLIC_ID_UNKNOWN as u8, 0x6A, 0x05, b'p', b'i', b'n', b'g', 0x00, LITERAL, 0x00,
        ];
        let doc = decode(&data).unwrap();
        assert_eq!(doc.root().name(), "ping");
        assert!(!doc.root().has_attributes());
        assert!(!doc.root().has_content());
        let again = decode(&encode(&doc).unwrap()).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn mixed_content_order() {
        let mut root = Element::new("a");
        root.add_text("a");
        root.add_child(Element::new("child"));
        root.add_text("b");
        root.add_opaque(vec![0x01, 0x02]);
        let doc = decode(&encode(&Document::new(root)).unwrap()).unwrap();
        let content = doc.root().content();
        assert_eq!(content.len(), 4);
        assert_eq!(content[0], Content::from("a"));
        assert_eq!(content[1].as_element().map(|e| e.name()), Some("child"));
        assert_eq!(content[2], Content::from("b"));
        assert_eq!(content[3], Content::from(vec![0x01u8, 0x02]));
        assert_eq!(doc.root().text(), "ab");
    }

    #[test]
    fn large_opaque() {
        let payload: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let doc = Document::new(Element::with_opaque("blob", payload.clone()));
        let enc = encode(&doc).unwrap();
        // 1000 = 0x87 0x68 as an mb_u_int32
        let at = enc.iter().position(|&b| b == OPAQUE).unwrap();
        assert_eq!(&enc[at + 1..at + 3], &[0x87, 0x68]);
        let dec = decode(&enc).unwrap();
        assert_eq!(dec.root().opaque(), payload);
    }

    #[test]
    fn mb_u_int32_values() {
        for n in [0u32, 127, 128, 16384, (1 << 31) - 1] {
            let mut buf = ByteBuffer::new();
            buf.append_mb_u_int32(n);
            let mut data = buf.data();
            assert_eq!(crate::varint::VarInt::read(&mut data).unwrap().to_u32(), n);
            assert!(data.is_empty());
        }
    }

    #[test]
    fn header_rejection() {
        let err = decode(&[0x03, 0x01, 0x6A, 0x00]).unwrap_err();
        assert_eq!(err.kind(), &DecodeErrorKind::UnsupportedVersion(0x03));
        let err = decode(&[WBXML_VERSION, 0x01, 0x04, 0x00]).unwrap_err();
        assert_eq!(err.kind(), &DecodeErrorKind::UnsupportedCharset(4));
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn decoded_tree_is_mutable() {
        let mut root = Element::new("Message");
        root.set_attribute("id", "1");
        let mut doc = decode(&encode(&Document::new(root)).unwrap()).unwrap();
        doc.root_mut().set_attribute("id", "2");
        doc.root_mut().add_child(Element::with_text("Body", "new"));
        let dec = decode(&encode(&doc).unwrap()).unwrap();
        assert_eq!(dec.root().attribute_value("id"), Some("2"));
        assert_eq!(dec.root().child_text("Body").as_deref(), Some("new"));
    }
}
