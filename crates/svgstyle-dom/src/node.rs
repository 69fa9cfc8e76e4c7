//! DOM Node - arena representation
//!
//! Nodes link to each other through `NodeId` indices rather than pointers:
//! - parent / first child / last child for O(1) append
//! - previous / next sibling for sibling walks
//! - `NodeData` carries the kind-specific payload

use crate::NodeId;
use crate::attributes::AttributeTable;

/// DOM Node - core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if detached or document)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(name: QualName) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(name)))
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self::with_data(NodeData::Text(content))
    }

    /// Create a comment node
    pub fn comment(content: String) -> Self {
        Self::with_data(NodeData::Comment(content))
    }

    /// Create a processing instruction node
    pub fn processing_instruction(target: String, data: String) -> Self {
        Self::with_data(NodeData::ProcessingInstruction { target, data })
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    /// Kind tag of this node
    #[inline]
    pub fn kind(&self) -> NodeKind {
        match &self.data {
            NodeData::Document => NodeKind::Document,
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
        }
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Node kind tag used for capability dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Comment,
    ProcessingInstruction,
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content (CDATA sections are folded into text)
    Text(String),
    /// Comment
    Comment(String),
    /// Processing instruction
    ProcessingInstruction { target: String, data: String },
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    /// Tag name (qualified)
    pub name: QualName,
    /// Attribute table: raw values plus attribute node cache
    pub attrs: AttributeTable,
}

impl ElementData {
    pub fn new(name: QualName) -> Self {
        Self {
            name,
            attrs: AttributeTable::default(),
        }
    }

    /// Get an attribute value by qualified name
    #[inline]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get_raw(name)
    }
}

/// Qualified element name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QualName {
    pub prefix: Option<String>,
    pub namespace: Option<String>,
    pub local: String,
}

impl QualName {
    /// Name without namespace
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            namespace: None,
            local: local.into(),
        }
    }

    /// Name in a namespace; `qualified` may carry a `prefix:` part
    pub fn with_namespace(namespace: Option<&str>, qualified: &str) -> Self {
        let (prefix, local) = split_qualified(qualified);
        Self {
            prefix: prefix.map(str::to_string),
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
        }
    }

    /// `prefix:local` or just `local`
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }
}

/// Split `prefix:local` into its parts
pub(crate) fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => (Some(prefix), local),
        _ => (None, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualname_split() {
        let name = QualName::with_namespace(Some("http://www.w3.org/1999/xlink"), "xlink:href");
        assert_eq!(name.prefix.as_deref(), Some("xlink"));
        assert_eq!(name.local, "href");
        assert_eq!(name.qualified(), "xlink:href");
    }

    #[test]
    fn test_node_kind() {
        assert_eq!(Node::document().kind(), NodeKind::Document);
        assert_eq!(Node::text("x".into()).kind(), NodeKind::Text);
        assert!(Node::element(QualName::local("svg")).is_element());
    }
}
