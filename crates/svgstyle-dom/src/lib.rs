//! svgstyle DOM - XML/SVG document tree
//!
//! Arena-allocated document tree with live, identity-stable attribute
//! nodes and token-set views over attributes.

mod attributes;
mod document;
mod element;
mod node;
mod parser;
mod token_list;
mod tree;

pub use attributes::{AttrId, AttrNode, AttributeStore, AttributeTable, AttributeValue};
pub use document::Document;
pub use element::{ChildNode, DocumentRef, ElementRef, NodeHandle, NodeRef, ParentNode};
pub use node::{ElementData, Node, NodeData, NodeKind, QualName};
pub use parser::XmlParser;
pub use token_list::TokenList;
pub use tree::DomTree;

/// SVG namespace URI
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
/// XML namespace URI (bound to the `xml` prefix)
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// XLink namespace URI
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this ID refers to a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Convert a sentinel-bearing ID into an option
    #[inline]
    pub fn to_option(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}

/// DOM errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Attribute node is owned by another element
    #[error("attribute is already in use by another element")]
    AlreadyOwned,
    /// Attribute node name does not match the key it is stored under
    #[error("attribute name mismatch: expected '{expected}', found '{found}'")]
    NameMismatch { expected: String, found: String },
    /// Attribute does not exist
    #[error("attribute '{0}' not found")]
    NotFound(String),
    /// Token is empty or contains ASCII whitespace
    #[error("invalid token: '{0}'")]
    InvalidToken(String),
    /// Token index past the end of the set
    #[error("token index {index} out of range for {len} tokens")]
    IndexOutOfRange { index: usize, len: usize },
    /// Node is not an element
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    /// Malformed XML input
    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },
}
