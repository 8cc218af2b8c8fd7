//! A complete document: header fields plus a single root element.
//!
//! Documents come from [`decode`][crate::decode] or are built around a root with
//! [`Document::new`], then turned back into bytes with [`encode`][crate::encode]. The header
//! fields only affect the wire form: the charset picks how strings are written, and the public
//! identifier names the document type for the receiver.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{charset::Charset, element::Element, token::WBXML_VERSION};

/// The document type identifier carried in the header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicId {
    /// No identifier, or one the producer didn't know.
    #[default]
    Unknown,
    /// A numeric identifier from the registry of well-known document types.
    WellKnown(u32),
    /// A formal public identifier string, stored in the string table.
    Named(String),
}

impl PublicId {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PublicId::Named(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    version: u8,
    public_id: PublicId,
    charset: Charset,
    root: Element,
}

impl Document {
    /// A UTF-8 document with an unknown public identifier.
    pub fn new(root: Element) -> Self {
        Self {
            version: WBXML_VERSION,
            public_id: PublicId::Unknown,
            charset: Charset::Utf8,
            root,
        }
    }

    pub(crate) fn from_parts(
        version: u8,
        public_id: PublicId,
        charset: Charset,
        root: Element,
    ) -> Self {
        Self {
            version,
            public_id,
            charset,
            root,
        }
    }

    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn with_public_id(mut self, public_id: PublicId) -> Self {
        self.public_id = public_id;
        self
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn set_charset(&mut self, charset: Charset) {
        self.charset = charset;
    }

    pub fn public_id(&self) -> &PublicId {
        &self.public_id
    }

    pub fn set_public_id(&mut self, public_id: PublicId) {
        self.public_id = public_id;
    }

    /// The public identifier, if it's a named one.
    pub fn public_identifier(&self) -> Option<&str> {
        self.public_id.as_str()
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Replace the root element, returning the old one.
    pub fn set_root(&mut self, root: Element) -> Element {
        std::mem::replace(&mut self.root, root)
    }

    pub fn into_root(self) -> Element {
        self.root
    }
}

impl From<Element> for Document {
    fn from(root: Element) -> Self {
        Document::new(root)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}
