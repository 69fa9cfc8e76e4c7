//! Document - High-level document API

use crate::element::{DocumentRef, ElementRef, NodeRef};
use crate::{DomError, DomTree, NodeId, XmlParser};

/// XML/SVG document
#[derive(Debug, Default)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URI, the base for relative style sheet references
    uri: Option<String>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document with a URI
    pub fn with_uri(uri: &str) -> Self {
        Self {
            tree: DomTree::new(),
            uri: Some(uri.to_string()),
        }
    }

    /// Parse XML text into a document
    pub fn parse(text: &str) -> Result<Self, DomError> {
        XmlParser::new().parse(text)
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn set_uri(&mut self, uri: Option<&str>) {
        self.uri = uri.map(str::to_string);
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Handle on the document node
    pub fn document_ref(&self) -> Option<DocumentRef<'_>> {
        match self.tree.node_ref(NodeId::ROOT)? {
            NodeRef::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Root element
    pub fn document_element(&self) -> Option<NodeId> {
        self.tree.document_element()
    }

    /// Element handle
    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.tree.element_ref(id)
    }

    /// First element in document order whose `id` attribute matches
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(NodeId::ROOT)
            .find(|&n| self.tree.get_attribute(n, "id") == Some(id))
    }

    /// All elements with a local name, in document order
    pub fn elements_by_local_name(&self, local: &str) -> Vec<NodeId> {
        self.tree
            .descendants(NodeId::ROOT)
            .filter(|&n| self.tree.local_name(n) == Some(local))
            .collect()
    }
}
