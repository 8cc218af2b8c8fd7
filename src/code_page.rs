//! Code pages map well-known tag and attribute names to single-byte tokens.
//!
//! A [`CodePages`] table is fixed by whatever document type the caller exchanges, built once and
//! then only read. Decoding and encoding against the same table is symmetric: any name with a
//! token is written as that token, and everything else falls back to a string table literal.
//!
//! ```
//! # use wbxml_pack::CodePages;
//! let pages = CodePages::new()
//!     .tag(0, 0x05, "Sync")
//!     .tag(1, 0x05, "Folder")
//!     .attribute(0, 0x05, "id");
//! assert_eq!(pages.tag_name(1, 0x05), Some("Folder"));
//! assert_eq!(pages.tag_token("Sync"), Some((0, 0x05)));
//! ```

use std::collections::HashMap;

use crate::token::{Token, FIRST_PAGE_TOKEN, LAST_ATTR_START_TOKEN, LAST_TAG_TOKEN};

#[derive(Clone, Debug, Default)]
struct Table {
    names: HashMap<(u8, u8), String>,
    tokens: HashMap<String, (u8, u8)>,
}

impl Table {
    fn insert(&mut self, page: u8, token: u8, name: &str) {
        if let Some(old) = self.names.insert((page, token), name.to_owned()) {
            if self.tokens.get(&old) == Some(&(page, token)) {
                self.tokens.remove(&old);
                // Fall back to the lowest position still naming the old entry
                let other = self
                    .names
                    .iter()
                    .filter(|(_, n)| **n == old)
                    .map(|(&pos, _)| pos)
                    .min();
                if let Some(pos) = other {
                    self.tokens.insert(old, pos);
                }
            }
        }
        // First assignment of a name wins, so the encoder's choice is stable
        self.tokens.entry(name.to_owned()).or_insert((page, token));
    }
}

/// Tag and attribute-start tokens, per code page.
#[derive(Clone, Debug, Default)]
pub struct CodePages {
    tags: Table,
    attributes: Table,
}

impl CodePages {
    /// An empty table: every name goes through the string table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a tag token. Panics if `token` isn't in 0x05..=0x3F or `name` is empty.
    pub fn tag(mut self, page: u8, token: u8, name: &str) -> Self {
        assert!(
            (FIRST_PAGE_TOKEN..=LAST_TAG_TOKEN).contains(&token),
            "tag token 0x{:02x} is outside 0x05..=0x3F",
            token
        );
        assert!(!name.is_empty(), "tag name can't be empty");
        self.tags.insert(page, token, name);
        self
    }

    /// Assign an attribute-start token. Panics if `token` isn't in 0x05..=0x7F, is one of the
    /// global tokens 0x40..=0x44, or `name` is empty.
    pub fn attribute(mut self, page: u8, token: u8, name: &str) -> Self {
        assert!(
            (FIRST_PAGE_TOKEN..=LAST_ATTR_START_TOKEN).contains(&token),
            "attribute token 0x{:02x} is outside 0x05..=0x7F",
            token
        );
        assert!(
            matches!(Token::from_u8(token), Token::Page(_)),
            "attribute token 0x{:02x} is a global token",
            token
        );
        assert!(!name.is_empty(), "attribute name can't be empty");
        self.attributes.insert(page, token, name);
        self
    }

    pub fn tag_name(&self, page: u8, token: u8) -> Option<&str> {
        self.tags.names.get(&(page, token)).map(String::as_str)
    }

    pub fn tag_token(&self, name: &str) -> Option<(u8, u8)> {
        self.tags.tokens.get(name).copied()
    }

    pub fn attribute_name(&self, page: u8, token: u8) -> Option<&str> {
        self.attributes.names.get(&(page, token)).map(String::as_str)
    }

    pub fn attribute_token(&self, name: &str) -> Option<(u8, u8)> {
        self.attributes.tokens.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.names.is_empty() && self.attributes.names.is_empty()
    }
}
