//! The element tree: [`Element`]s holding [`Attribute`]s and an ordered list of [`Content`].
//!
//! Every node is owned by exactly one parent, so the tree is plain nested data. Text and opaque
//! payloads may be split across several content items; [`Element::text`] and [`Element::opaque`]
//! concatenate them in order, without looking into child elements.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// A name/value pair on an element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}=\"{}\"", self.name, self.value)
    }
}

/// One item of an element's content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Content {
    Element(Element),
    Text(String),
    Opaque(#[serde(with = "serde_bytes")] Vec<u8>),
}

impl Content {
    /// Append this item to the end of `parent`'s content.
    pub fn append_to(self, parent: &mut Element) {
        parent.content.push(self);
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Content::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Content::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&[u8]> {
        match self {
            Content::Opaque(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Content::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Content::Text(_))
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Content::Opaque(_))
    }

    fn print(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        match self {
            Content::Element(e) => e.print(f, depth),
            Content::Text(t) => {
                write_indent(f, depth)?;
                f.write_str(t)
            }
            Content::Opaque(o) => {
                write_indent(f, depth)?;
                write!(f, "<![OPAQUE[{}]]>", STANDARD.encode(o))
            }
        }
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.print(f, 0)
    }
}

impl From<Element> for Content {
    fn from(e: Element) -> Self {
        Content::Element(e)
    }
}

impl From<String> for Content {
    fn from(t: String) -> Self {
        Content::Text(t)
    }
}

impl From<&str> for Content {
    fn from(t: &str) -> Self {
        Content::Text(t.to_owned())
    }
}

impl From<Vec<u8>> for Content {
    fn from(o: Vec<u8>) -> Self {
        Content::Opaque(o)
    }
}

impl From<&[u8]> for Content {
    fn from(o: &[u8]) -> Self {
        Content::Opaque(o.to_vec())
    }
}

/// A named node with attributes and ordered content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    content: Vec<Content>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            content: Vec::new(),
        }
    }

    /// An element holding a single text item.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut e = Self::new(name);
        e.add_text(text);
        e
    }

    /// An element holding a single opaque item.
    pub fn with_opaque(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let mut e = Self::new(name);
        e.add_opaque(data);
        e
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // Attributes

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Vec<Attribute> {
        &mut self.attributes
    }

    /// The first attribute with this name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(Attribute::value)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Replace the value of the first attribute with this name, or append a new one.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.set_value(value),
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Append an attribute even if one with the same name exists.
    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push(Attribute::new(name, value));
    }

    /// Remove the first attribute with this name.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let pos = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(pos))
    }

    // Content

    pub fn content(&self) -> &[Content] {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut Vec<Content> {
        &mut self.content
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn add_content(&mut self, item: impl Into<Content>) {
        item.into().append_to(self);
    }

    pub fn add_child(&mut self, child: Element) {
        self.content.push(Content::Element(child));
    }

    pub fn add_text(&mut self, text: impl Into<String>) {
        self.content.push(Content::Text(text.into()));
    }

    pub fn add_opaque(&mut self, data: impl Into<Vec<u8>>) {
        self.content.push(Content::Opaque(data.into()));
    }

    /// All text items, concatenated in order.
    pub fn text(&self) -> String {
        self.content.iter().filter_map(Content::as_text).collect()
    }

    /// All opaque items, concatenated in order.
    pub fn opaque(&self) -> Vec<u8> {
        self.content
            .iter()
            .filter_map(Content::as_opaque)
            .flatten()
            .copied()
            .collect()
    }

    /// Remove every text item, then append `text` as the only one.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content.retain(|c| !c.is_text());
        self.add_text(text);
    }

    /// Remove every opaque item, then append `data` as the only one.
    pub fn set_opaque(&mut self, data: impl Into<Vec<u8>>) {
        self.content.retain(|c| !c.is_opaque());
        self.add_opaque(data);
    }

    // Children

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.content.iter().filter_map(Content::as_element)
    }

    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.content.iter_mut().filter_map(Content::as_element_mut)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children().filter(move |e| e.name == name)
    }

    /// The first child element with this name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children_mut().find(|e| e.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(Element::text)
    }

    pub fn child_opaque(&self, name: &str) -> Option<Vec<u8>> {
        self.child(name).map(Element::opaque)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    pub fn has_children(&self) -> bool {
        self.content.iter().any(Content::is_element)
    }

    /// Remove the first child element with this name.
    pub fn remove_child(&mut self, name: &str) -> Option<Element> {
        let pos = self
            .content
            .iter()
            .position(|c| c.as_element().map_or(false, |e| e.name == name))?;
        match self.content.remove(pos) {
            Content::Element(e) => Some(e),
            _ => None,
        }
    }

    fn print(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        write_indent(f, depth)?;
        write!(f, "<{}", self.name)?;
        for attr in self.attributes.iter() {
            write!(f, " {}", attr)?;
        }
        if self.content.is_empty() {
            return f.write_str("/>");
        }
        f.write_str(">")?;
        for item in self.content.iter() {
            if f.alternate() {
                f.write_str("\n")?;
            }
            item.print(f, depth + 1)?;
        }
        if f.alternate() {
            f.write_str("\n")?;
            write_indent(f, depth)?;
        }
        write!(f, "</{}>", self.name)
    }
}

impl fmt::Display for Element {
    /// Markup-like dump. `{:#}` puts every content item on its own indented line.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.print(f, 0)
    }
}

fn write_indent(f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
    if f.alternate() {
        for _ in 0..depth {
            f.write_str("  ")?;
        }
    }
    Ok(())
}
