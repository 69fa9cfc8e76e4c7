//! XML parser
//!
//! Builds a [`Document`] from XML/SVG text with quick-xml's pull reader.
//! Element namespaces are resolved from `xmlns` declarations in scope;
//! processing instructions before the root element are kept so style sheet
//! links (`<?xml-stylesheet ...?>`) can be discovered later.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::{Document, DomError, DomTree, NodeId, XML_NAMESPACE};

type Scope = Vec<(Option<String>, String)>;

/// XML parser
#[derive(Debug, Clone, Default)]
pub struct XmlParser {
    preserve_whitespace: bool,
}

impl XmlParser {
    /// Parser that drops whitespace-only text nodes
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep whitespace-only text nodes
    pub fn preserve_whitespace(mut self, preserve: bool) -> Self {
        self.preserve_whitespace = preserve;
        self
    }

    /// Parse XML string into a Document
    pub fn parse(&self, text: &str) -> Result<Document, DomError> {
        self.parse_with_uri(text, None)
    }

    /// Parse XML with a document URI
    pub fn parse_with_uri(&self, text: &str, uri: Option<&str>) -> Result<Document, DomError> {
        tracing::debug!(uri = uri.unwrap_or(""), "parsing XML document");

        let mut document = Document::new();
        document.set_uri(uri);

        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(false);

        let mut open: Vec<NodeId> = vec![NodeId::ROOT];
        let mut scopes: Vec<Scope> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| DomError::Xml {
                position: reader.buffer_position() as u64,
                message: e.to_string(),
            })?;
            let parent = open.last().copied().unwrap_or(NodeId::ROOT);
            let tree = document.tree_mut();

            match event {
                Event::Start(e) => {
                    let id = open_element(tree, &e, &mut scopes)?;
                    tree.append_child(parent, id);
                    open.push(id);
                }
                Event::Empty(e) => {
                    let id = open_element(tree, &e, &mut scopes)?;
                    tree.append_child(parent, id);
                    scopes.pop();
                }
                Event::End(_) => {
                    if open.len() > 1 {
                        open.pop();
                        scopes.pop();
                    }
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(xml_error)?;
                    if self.preserve_whitespace || !text.trim().is_empty() {
                        let id = tree.create_text(&text);
                        tree.append_child(parent, id);
                    }
                }
                Event::CData(e) => {
                    let id = tree.create_text(&String::from_utf8_lossy(&e));
                    tree.append_child(parent, id);
                }
                Event::Comment(e) => {
                    let id = tree.create_comment(&String::from_utf8_lossy(&e));
                    tree.append_child(parent, id);
                }
                Event::PI(e) => {
                    let raw = String::from_utf8_lossy(&e);
                    let raw = raw.trim();
                    let (target, data) = raw
                        .split_once(|c: char| c.is_ascii_whitespace())
                        .unwrap_or((raw, ""));
                    let id = tree.create_processing_instruction(target, data.trim());
                    tree.append_child(parent, id);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        tracing::debug!(nodes = document.tree().len(), "parsed XML document");
        Ok(document)
    }
}

fn xml_error(e: impl std::fmt::Display) -> DomError {
    DomError::Xml {
        position: 0,
        message: e.to_string(),
    }
}

/// Create an element for a start tag and push its namespace scope
fn open_element(tree: &mut DomTree, start: &BytesStart<'_>, scopes: &mut Vec<Scope>) -> Result<NodeId, DomError> {
    let qualified = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut scope = Scope::new();
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value: Cow<'_, str> = attr.unescape_value().map_err(xml_error)?;
        if key == "xmlns" {
            scope.push((None, value.to_string()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.push((Some(prefix.to_string()), value.to_string()));
        }
        attrs.push((key, value.into_owned()));
    }
    scopes.push(scope);

    let prefix = qualified.split_once(':').map(|(p, _)| p);
    let namespace = resolve_prefix(scopes, prefix);
    let id = tree.create_element_ns(namespace.as_deref(), &qualified);
    for (key, value) in &attrs {
        tree.set_attribute(id, key, value)?;
    }
    Ok(id)
}

fn resolve_prefix(scopes: &[Scope], prefix: Option<&str>) -> Option<String> {
    if prefix == Some("xml") {
        return Some(XML_NAMESPACE.to_string());
    }
    scopes
        .iter()
        .rev()
        .flat_map(|scope| scope.iter())
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.clone())
        .filter(|uri| !uri.is_empty())
}
