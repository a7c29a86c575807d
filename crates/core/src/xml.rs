//! Minimal mutable XML tree over `quick-xml` events.
//!
//! DrawingML parts are parsed into owned elements so that text frames can be
//! read and rewritten in place. Element names keep their namespace prefix
//! (`a:p`); lookups go through the local name.

use crate::{Error, Result};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A parsed XML document: optional declaration plus a single root element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XmlDocument {
    pub declaration: Option<XmlDeclaration>,
    pub root: XmlElement,
}

/// The `<?xml ...?>` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data.
    Text(String),
    CData(String),
    /// Raw comment content.
    Comment(String),
    /// Raw processing instruction content.
    ProcessingInstruction(String),
}

/// An element with its qualified name, ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct XmlElement {
    pub name: String,
    /// Attribute keys as written (`r:id`), values unescaped.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlDocument {
    /// Parse a document from a string.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut declaration = None;
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Decl(ref e)) => {
                    declaration = Some(XmlDeclaration::from_event(e)?);
                }
                Ok(Event::Start(ref e)) => {
                    stack.push(XmlElement::from_start(e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = XmlElement::from_start(e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("Unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(ref e)) => {
                    // Whitespace outside the root element is not kept
                    if let Some(parent) = stack.last_mut() {
                        let text = e.unescape().map_err(xml_error)?;
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(e).into_owned();
                        parent.children.push(XmlNode::CData(text));
                    }
                }
                Ok(Event::Comment(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(e).into_owned();
                        parent.children.push(XmlNode::Comment(text));
                    }
                }
                Ok(Event::PI(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(e).into_owned();
                        parent
                            .children
                            .push(XmlNode::ProcessingInstruction(text));
                    }
                }
                Ok(Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::XmlError(format!("Unclosed element <{}>", open.name)));
        }

        let root = root.ok_or_else(|| Error::XmlError("Document has no root element".to_string()))?;

        Ok(Self { declaration, root })
    }

    /// Serialize the document back to a string.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());

        if let Some(ref decl) = self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.encoding.as_deref(),
                    decl.standalone.as_deref(),
                )))
                .map_err(xml_error)?;
            writer.get_mut().extend_from_slice(b"\r\n");
        }

        write_element(&mut writer, &self.root)?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::XmlError(format!("Serialized XML is not UTF-8: {}", e)))
    }
}

impl XmlDeclaration {
    fn from_event(e: &BytesDecl<'_>) -> Result<Self> {
        let version = e.version().map_err(xml_error)?;
        let encoding = e.encoding().transpose().map_err(xml_error)?;
        let standalone = e.standalone().transpose().map_err(xml_error)?;

        Ok(Self {
            version: lossy(&version),
            encoding: encoding.map(|v| lossy(&v)),
            standalone: standalone.map(|v| lossy(&v)),
        })
    }
}

impl XmlElement {
    /// Create an empty element with the given qualified name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder-style child element append.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder-style text append.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attributes = Vec::new();

        for attr in e.attributes() {
            let attr = attr.map_err(xml_error)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// The element name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// The namespace prefix of the element name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Build a sibling name that shares this element's prefix.
    pub fn qualified(&self, local: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    /// Look up an attribute by its exact key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up an attribute by local name, returning the key as written.
    pub fn attribute_by_local(&self, local: &str) -> Option<(&str, &str)> {
        self.attributes
            .iter()
            .find(|(k, _)| local_name(k) == local)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Iterate over child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.local_name() == local)
    }

    /// All child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.local_name() == local)
    }

    /// Concatenated character data of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![XmlNode::Text(text.into())];
    }

    /// Resolve a path of child-node indices below this element.
    pub fn descendant(&self, path: &[usize]) -> Option<&XmlElement> {
        let mut current = self;
        for &index in path {
            current = match current.children.get(index)? {
                XmlNode::Element(e) => e,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Resolve a path of child-node indices below this element, mutably.
    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut current = self;
        for &index in path {
            current = match current.children.get_mut(index)? {
                XmlNode::Element(e) => e,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Serialize this element (without declaration) to a string.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::XmlError(format!("Serialized XML is not UTF-8: {}", e)))
    }
}

/// Extract the local name from a potentially namespaced XML name.
pub fn local_name(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for node in &element.children {
        match node {
            XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
            XmlNode::Element(e) => collect_text(e, out),
            _ => {}
        }
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(Error::XmlError(format!(
            "Multiple root elements (second: <{}>)",
            element.name
        ))),
    }
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(xml_error);
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;

    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(t) => writer
                .write_event(Event::Text(BytesText::from_escaped(partial_escape(t))))
                .map_err(xml_error)?,
            XmlNode::CData(t) => writer
                .write_event(Event::CData(BytesCData::new(t.as_str())))
                .map_err(xml_error)?,
            XmlNode::Comment(t) => writer
                .write_event(Event::Comment(BytesText::from_escaped(t.as_str())))
                .map_err(xml_error)?,
            XmlNode::ProcessingInstruction(t) => writer
                .write_event(Event::PI(BytesText::from_escaped(t.as_str())))
                .map_err(xml_error)?,
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_error)
}

fn lossy(bytes: &Cow<'_, [u8]>) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn xml_error(e: impl std::fmt::Display) -> Error {
    Error::XmlError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:txBody xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:bodyPr/><a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>Fish &amp; chips</a:t></a:r></a:p></p:txBody>"#;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("p:sp"), "sp");
        assert_eq!(local_name("a:t"), "t");
        assert_eq!(local_name("sp"), "sp");
    }

    #[test]
    fn test_parse_keeps_prefixes_and_attributes() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.root.name, "p:txBody");
        assert_eq!(doc.root.local_name(), "txBody");

        let decl = doc.declaration.as_ref().unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.standalone.as_deref(), Some("yes"));

        let r_pr = doc.root.child("p").unwrap().child("r").unwrap().child("rPr").unwrap();
        assert_eq!(r_pr.attribute("lang"), Some("en-US"));
        assert_eq!(r_pr.attribute("dirty"), Some("0"));
        assert_eq!(doc.root.text(), "Fish & chips");
    }

    #[test]
    fn test_round_trip_is_stable() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let written = doc.to_xml_string().unwrap();
        let reparsed = XmlDocument::parse(&written).unwrap();
        assert_eq!(doc, reparsed);
        assert!(written.contains("Fish &amp; chips"));
    }

    #[test]
    fn test_descendant_paths() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        // children of txBody: [bodyPr, p]
        let run = doc.root.descendant(&[1, 0]).unwrap();
        assert_eq!(run.local_name(), "r");
        assert!(doc.root.descendant(&[7]).is_none());
    }

    #[test]
    fn test_qualified_names_follow_prefix() {
        let el = XmlElement::new("a:pPr");
        assert_eq!(el.qualified("buChar"), "a:buChar");
        assert_eq!(XmlElement::new("pPr").qualified("buChar"), "buChar");
    }

    #[test]
    fn test_attribute_helpers() {
        let mut el = XmlElement::new("a:hlinkClick").with_attribute("r:id", "rId2");
        assert_eq!(el.attribute_by_local("id"), Some(("r:id", "rId2")));
        el.set_attribute("r:id", "rId5");
        assert_eq!(el.attribute("r:id"), Some("rId5"));
        assert_eq!(el.attributes.len(), 1);
        assert_eq!(el.remove_attribute("r:id").as_deref(), Some("rId5"));
        assert!(el.attributes.is_empty());
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert!(XmlDocument::parse("<a:p><a:r></a:p>").is_err());
        assert!(XmlDocument::parse("").is_err());
    }
}
