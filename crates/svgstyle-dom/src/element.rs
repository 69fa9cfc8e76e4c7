//! Node handles and capability traits
//!
//! Instead of one node type carrying every mixin, handles implement only
//! the capabilities their node kind has: documents and elements are
//! [`ParentNode`]s, elements are also [`ChildNode`]s. [`NodeRef`] is the
//! tagged union used to dispatch on kind.

use crate::node::{NodeData, NodeKind, QualName};
use crate::{DomTree, NodeId};

/// Typed handle for any node
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Document(DocumentRef<'a>),
    Element(ElementRef<'a>),
    Text(&'a str),
    Comment(&'a str),
    ProcessingInstruction { target: &'a str, data: &'a str },
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(tree: &'a DomTree, id: NodeId) -> Option<Self> {
        let node = tree.get(id)?;
        Some(match &node.data {
            NodeData::Document => NodeRef::Document(DocumentRef { tree, id }),
            NodeData::Element(_) => NodeRef::Element(ElementRef { tree, id }),
            NodeData::Text(t) => NodeRef::Text(t),
            NodeData::Comment(c) => NodeRef::Comment(c),
            NodeData::ProcessingInstruction { target, data } => {
                NodeRef::ProcessingInstruction { target, data }
            }
        })
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Document(_) => NodeKind::Document,
            NodeRef::Element(_) => NodeKind::Element,
            NodeRef::Text(_) => NodeKind::Text,
            NodeRef::Comment(_) => NodeKind::Comment,
            NodeRef::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
        }
    }

    pub fn as_element(&self) -> Option<ElementRef<'a>> {
        match self {
            NodeRef::Element(e) => Some(*e),
            _ => None,
        }
    }
}

/// Common accessors shared by all handles
pub trait NodeHandle<'a> {
    fn tree(&self) -> &'a DomTree;
    fn node_id(&self) -> NodeId;
}

/// Nodes that can have children
pub trait ParentNode<'a>: NodeHandle<'a> {
    /// Element children in document order
    fn child_elements(&self) -> Vec<ElementRef<'a>> {
        let tree = self.tree();
        tree.element_children(self.node_id())
            .map(|id| ElementRef::new(tree, id))
            .collect()
    }

    fn first_element_child(&self) -> Option<ElementRef<'a>> {
        let tree = self.tree();
        tree.element_children(self.node_id())
            .next()
            .map(|id| ElementRef::new(tree, id))
    }

    fn child_element_count(&self) -> usize {
        self.tree().element_children(self.node_id()).count()
    }
}

/// Nodes that live inside a parent
pub trait ChildNode<'a>: NodeHandle<'a> {
    fn parent_node(&self) -> Option<NodeId> {
        self.tree().parent(self.node_id())
    }

    fn previous_element_sibling(&self) -> Option<ElementRef<'a>> {
        let tree = self.tree();
        let mut cursor = tree.get(self.node_id())?.prev_sibling;
        while let Some(id) = cursor.to_option() {
            if tree.is_element(id) {
                return Some(ElementRef::new(tree, id));
            }
            cursor = tree.get(id)?.prev_sibling;
        }
        None
    }

    fn next_element_sibling(&self) -> Option<ElementRef<'a>> {
        let tree = self.tree();
        let mut cursor = tree.get(self.node_id())?.next_sibling;
        while let Some(id) = cursor.to_option() {
            if tree.is_element(id) {
                return Some(ElementRef::new(tree, id));
            }
            cursor = tree.get(id)?.next_sibling;
        }
        None
    }
}

/// Handle on the document node
#[derive(Debug, Clone, Copy)]
pub struct DocumentRef<'a> {
    tree: &'a DomTree,
    id: NodeId,
}

impl<'a> NodeHandle<'a> for DocumentRef<'a> {
    fn tree(&self) -> &'a DomTree {
        self.tree
    }

    fn node_id(&self) -> NodeId {
        self.id
    }
}

impl<'a> ParentNode<'a> for DocumentRef<'a> {}

/// Read-only handle on an element
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
    tree: &'a DomTree,
    id: NodeId,
}

impl<'a> ElementRef<'a> {
    /// Caller guarantees `id` is an element
    pub(crate) fn new(tree: &'a DomTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a DomTree {
        self.tree
    }

    /// Qualified tag name
    pub fn name(&self) -> Option<&'a QualName> {
        self.tree.element(self.id).map(|e| &e.name)
    }

    pub fn local_name(&self) -> &'a str {
        self.name().map(|n| n.local.as_str()).unwrap_or("")
    }

    pub fn namespace_uri(&self) -> Option<&'a str> {
        self.name()?.namespace.as_deref()
    }

    /// Raw attribute value
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.tree.get_attribute(self.id, name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// All attributes as (qualified name, value), in insertion order
    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a str)> + use<'a> {
        self.tree
            .element(self.id)
            .into_iter()
            .flat_map(|e| e.attrs.iter())
    }

    /// Whitespace-split tokens of the `class` attribute
    pub fn classes(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.attribute("class")
            .into_iter()
            .flat_map(|c| c.split_ascii_whitespace())
    }

    pub fn parent_element(&self) -> Option<ElementRef<'a>> {
        self.tree
            .parent_element(self.id)
            .map(|id| ElementRef::new(self.tree, id))
    }

    /// Ancestor elements, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = ElementRef<'a>> + use<'a> {
        let tree = self.tree;
        tree.ancestors(self.id)
            .filter(move |&id| tree.is_element(id))
            .map(move |id| ElementRef::new(tree, id))
    }

    /// True for the document element
    pub fn is_root(&self) -> bool {
        self.tree.parent(self.id) == Some(NodeId::ROOT)
    }

    /// No element children and no non-empty text
    pub fn is_empty(&self) -> bool {
        self.tree.children(self.id).all(|(_, node)| match &node.data {
            NodeData::Element(_) => false,
            NodeData::Text(t) => t.is_empty(),
            _ => true,
        })
    }

    pub fn text_content(&self) -> String {
        self.tree.text_content(self.id)
    }
}

impl<'a> NodeHandle<'a> for ElementRef<'a> {
    fn tree(&self) -> &'a DomTree {
        self.tree
    }

    fn node_id(&self) -> NodeId {
        self.id
    }
}

impl<'a> ParentNode<'a> for ElementRef<'a> {}

impl<'a> ChildNode<'a> for ElementRef<'a> {}

impl PartialEq for ElementRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for ElementRef<'_> {}
