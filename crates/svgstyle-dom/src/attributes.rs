//! Element Attributes
//!
//! Each element owns an [`AttributeTable`]: the raw name→value list in
//! insertion order plus a lazily filled cache of attribute node handles.
//! Attribute nodes live in a tree-level arena and point back at their
//! owner through a plain `NodeId`, so an element never holds a strong edge
//! to itself through its attributes.
//!
//! The raw list is the source of truth. A node reads its value from the
//! owner's raw list on every access; a cache entry whose raw value has
//! disappeared is evicted on the next read.

use std::collections::HashMap;

use crate::node::split_qualified;
use crate::{DomError, DomTree, NodeId};

/// Attribute node identifier (index into the tree's attribute arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrId(u32);

/// Value accepted by [`AttributeStore::set`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Plain string; the empty string deletes the attribute
    Raw(String),
    /// An existing attribute node
    Node(AttrId),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Raw(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Raw(value)
    }
}

impl From<AttrId> for AttributeValue {
    fn from(id: AttrId) -> Self {
        AttributeValue::Node(id)
    }
}

/// One attribute node
#[derive(Debug, Clone)]
pub struct AttrNode {
    name: String,
    namespace: Option<String>,
    prefix: Option<String>,
    local_name: String,
    owner: Option<NodeId>,
    /// Value held while no element owns the node
    detached_value: String,
}

impl AttrNode {
    fn new(name: &str, namespace: Option<String>) -> Self {
        let (prefix, local) = split_qualified(name);
        Self {
            name: name.to_string(),
            namespace,
            prefix: prefix.map(str::to_string),
            local_name: local.to_string(),
            owner: None,
            detached_value: String::new(),
        }
    }

    /// Qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

/// Per-element attribute table
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    raw: Vec<(String, String)>,
    nodes: HashMap<String, AttrId>,
}

impl AttributeTable {
    /// Raw value by qualified name
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.raw
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set a raw value, keeping the original position of an existing name
    pub fn set_raw(&mut self, name: &str, value: &str) {
        match self.raw.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.raw.push((name.to_string(), value.to_string())),
        }
    }

    /// Remove a raw value. Any cached node for the name goes stale.
    pub fn remove_raw(&mut self, name: &str) -> Option<String> {
        let index = self.raw.iter().position(|(n, _)| n == name)?;
        Some(self.raw.remove(index).1)
    }

    pub fn contains_raw(&self, name: &str) -> bool {
        self.raw.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Name at an insertion-order index
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.raw.get(index).map(|(n, _)| n.as_str())
    }

    /// Iterate over (name, value) in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.raw.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    fn cached(&self, name: &str) -> Option<AttrId> {
        self.nodes.get(name).copied()
    }
}

// Attribute node arena
impl DomTree {
    /// Attribute node by ID
    pub fn attr(&self, id: AttrId) -> Option<&AttrNode> {
        self.attr_nodes.get(id.0 as usize)
    }

    fn attr_mut(&mut self, id: AttrId) -> Option<&mut AttrNode> {
        self.attr_nodes.get_mut(id.0 as usize)
    }

    fn push_attr(&mut self, node: AttrNode) -> AttrId {
        let id = AttrId(self.attr_nodes.len() as u32);
        self.attr_nodes.push(node);
        id
    }

    /// Create a detached attribute node with an empty value
    pub fn create_attribute(&mut self, name: &str) -> AttrId {
        self.push_attr(AttrNode::new(name, None))
    }

    /// Create a detached attribute node in a namespace
    pub fn create_attribute_ns(&mut self, namespace: Option<&str>, name: &str) -> AttrId {
        self.push_attr(AttrNode::new(name, namespace.map(str::to_string)))
    }

    /// Whether `id` is the live node for its name on `element`
    fn attr_is_live(&self, id: AttrId, element: NodeId) -> bool {
        let Some(node) = self.attr(id) else {
            return false;
        };
        self.element(element).is_some_and(|e| {
            e.attrs.cached(&node.name) == Some(id) && e.attrs.contains_raw(&node.name)
        })
    }

    /// Owning element, if the node is still attached
    pub fn attr_owner(&self, id: AttrId) -> Option<NodeId> {
        let owner = self.attr(id)?.owner?;
        self.attr_is_live(id, owner).then_some(owner)
    }

    /// Current value of an attribute node.
    ///
    /// Attached nodes read through to the owner's raw table; detached nodes
    /// return the value they held when they were detached.
    pub fn attr_value(&self, id: AttrId) -> Option<&str> {
        let node = self.attr(id)?;
        match node.owner {
            Some(owner) if self.attr_is_live(id, owner) => {
                self.element(owner)?.attrs.get_raw(&node.name)
            }
            Some(_) => None,
            None => Some(&node.detached_value),
        }
    }

    /// Write a value through an attribute node
    pub fn set_attr_value(&mut self, id: AttrId, value: &str) {
        let Some(node) = self.attr(id) else { return };
        let name = node.name.clone();
        match self.attr_owner(id) {
            Some(owner) => {
                if let Some(element) = self.element_mut(owner) {
                    element.attrs.set_raw(&name, value);
                }
            }
            None => {
                if let Some(node) = self.attr_mut(id) {
                    node.owner = None;
                    node.detached_value = value.to_string();
                }
            }
        }
    }

    /// Drop the cached node for `name`, copying the current raw value into it
    pub(crate) fn detach_attr_node(&mut self, element: NodeId, name: &str) {
        let Some(data) = self.element_mut(element) else { return };
        let Some(id) = data.attrs.nodes.remove(name) else { return };
        let last_value = data.attrs.get_raw(name).map(str::to_string);
        if let Some(node) = self.attr_mut(id) {
            if node.owner == Some(element) {
                node.owner = None;
                if let Some(value) = last_value {
                    node.detached_value = value;
                }
            }
        }
    }

    /// Attribute store for an element
    pub fn attributes_mut(&mut self, element: NodeId) -> Result<AttributeStore<'_>, DomError> {
        if !self.is_element(element) {
            return Err(DomError::NotAnElement(element));
        }
        Ok(AttributeStore {
            tree: self,
            element,
        })
    }
}

/// Mutable, identity-stable view over one element's attributes
pub struct AttributeStore<'a> {
    tree: &'a mut DomTree,
    element: NodeId,
}

impl AttributeStore<'_> {
    fn table(&self) -> Result<&AttributeTable, DomError> {
        self.tree
            .element(self.element)
            .map(|e| &e.attrs)
            .ok_or(DomError::NotAnElement(self.element))
    }

    fn table_mut(&mut self) -> Result<&mut AttributeTable, DomError> {
        let element = self.element;
        self.tree
            .element_mut(element)
            .map(|e| &mut e.attrs)
            .ok_or(DomError::NotAnElement(element))
    }

    /// Element this store belongs to
    pub fn element(&self) -> NodeId {
        self.element
    }

    /// Underlying tree
    pub fn tree(&self) -> &DomTree {
        self.tree
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.table().map(AttributeTable::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table().is_ok_and(|t| t.contains_raw(name))
    }

    /// Raw value shortcut
    pub fn value(&self, name: &str) -> Option<&str> {
        self.table().ok()?.get_raw(name)
    }

    /// Attribute names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.table()
            .map(|t| t.iter().map(|(n, _)| n.to_string()).collect())
            .unwrap_or_default()
    }

    /// Attribute node for `name`, materialized on first access
    pub fn get(&mut self, name: &str) -> Result<AttrId, DomError> {
        if !self.table()?.contains_raw(name) {
            if self.table()?.cached(name).is_some() {
                tracing::debug!(attr = name, "evicting stale attribute node");
                self.tree.detach_attr_node(self.element, name);
            }
            return Err(DomError::NotFound(name.to_string()));
        }

        if let Some(id) = self.table()?.cached(name) {
            if self.tree.attr(id).and_then(|n| n.owner) == Some(self.element) {
                return Ok(id);
            }
        }

        let (prefix, _) = split_qualified(name);
        let namespace = match prefix {
            Some(p) => self.tree.lookup_namespace_uri(self.element, Some(p)),
            None => None,
        };
        let mut node = AttrNode::new(name, namespace);
        node.owner = Some(self.element);
        let id = self.tree.push_attr(node);
        self.table_mut()?.nodes.insert(name.to_string(), id);
        Ok(id)
    }

    /// Attribute node at an insertion-order index
    pub fn item_at(&mut self, index: usize) -> Option<AttrId> {
        let name = self.table().ok()?.name_at(index)?.to_string();
        self.get(&name).ok()
    }

    /// Set an attribute from a raw string or an attribute node
    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) -> Result<(), DomError> {
        match value.into() {
            AttributeValue::Raw(raw) => {
                if raw.is_empty() {
                    return self.delete_if_present(name);
                }
                self.table_mut()?.set_raw(name, &raw);
                Ok(())
            }
            AttributeValue::Node(id) => self.set_node(name, id),
        }
    }

    fn set_node(&mut self, name: &str, id: AttrId) -> Result<(), DomError> {
        let node = self
            .tree
            .attr(id)
            .ok_or_else(|| DomError::NotFound(name.to_string()))?;
        if node.name != name {
            return Err(DomError::NameMismatch {
                expected: name.to_string(),
                found: node.name.clone(),
            });
        }

        match self.tree.attr_owner(id) {
            Some(owner) if owner == self.element => return Ok(()),
            Some(_) => return Err(DomError::AlreadyOwned),
            None => {}
        }

        let value = node.detached_value.clone();
        if value.is_empty() {
            return self.delete_if_present(name);
        }

        self.tree.detach_attr_node(self.element, name);
        let table = self.table_mut()?;
        table.set_raw(name, &value);
        table.nodes.insert(name.to_string(), id);
        if let Some(node) = self.tree.attr_mut(id) {
            node.owner = Some(self.element);
            node.detached_value.clear();
        }
        Ok(())
    }

    fn delete_if_present(&mut self, name: &str) -> Result<(), DomError> {
        if self.contains(name) {
            self.delete(name)
        } else {
            Ok(())
        }
    }

    /// Remove an attribute; the detached node keeps its last value
    pub fn delete(&mut self, name: &str) -> Result<(), DomError> {
        if !self.table()?.contains_raw(name) {
            self.tree.detach_attr_node(self.element, name);
            return Err(DomError::NotFound(name.to_string()));
        }
        self.tree.detach_attr_node(self.element, name);
        self.table_mut()?.remove_raw(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element() -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let rect = tree.create_element("rect");
        tree.append_child(tree.root(), rect);
        (tree, rect)
    }

    #[test]
    fn test_set_get_attribute() {
        let (mut tree, rect) = element();
        let mut attrs = tree.attributes_mut(rect).unwrap();
        attrs.set("class", "btn").unwrap();
        attrs.set("id", "submit").unwrap();

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.value("class"), Some("btn"));
        assert_eq!(attrs.names(), vec!["class", "id"]);
    }

    #[test]
    fn test_identity_is_stable() {
        let (mut tree, rect) = element();
        let mut attrs = tree.attributes_mut(rect).unwrap();
        attrs.set("id", "a").unwrap();
        let first = attrs.get("id").unwrap();
        let second = attrs.get("id").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_value_is_live() {
        let (mut tree, rect) = element();
        tree.set_attribute(rect, "fill", "red").unwrap();
        let id = tree.attributes_mut(rect).unwrap().get("fill").unwrap();
        tree.set_attribute(rect, "fill", "blue").unwrap();
        assert_eq!(tree.attr_value(id), Some("blue"));

        tree.set_attr_value(id, "green");
        assert_eq!(tree.get_attribute(rect, "fill"), Some("green"));
    }

    #[test]
    fn test_stale_cache_entry_is_evicted() {
        let (mut tree, rect) = element();
        tree.set_attribute(rect, "fill", "red").unwrap();
        let id = tree.attributes_mut(rect).unwrap().get("fill").unwrap();

        // Bypass the tree so the cache entry is left behind.
        tree.element_mut(rect).unwrap().attrs.remove_raw("fill");
        assert_eq!(tree.attr_value(id), None);

        let err = tree.attributes_mut(rect).unwrap().get("fill").unwrap_err();
        assert_eq!(err, DomError::NotFound("fill".into()));
        assert_eq!(tree.attr_owner(id), None);
    }

    #[test]
    fn test_empty_raw_value_deletes() {
        let (mut tree, rect) = element();
        let mut attrs = tree.attributes_mut(rect).unwrap();
        attrs.set("stroke", "red").unwrap();
        attrs.set("stroke", "").unwrap();
        assert!(!attrs.contains("stroke"));
        // absent + empty is a no-op
        attrs.set("stroke", "").unwrap();
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (mut tree, rect) = element();
        let mut attrs = tree.attributes_mut(rect).unwrap();
        assert_eq!(attrs.delete("nope"), Err(DomError::NotFound("nope".into())));
    }

    #[test]
    fn test_set_node_name_mismatch() {
        let (mut tree, rect) = element();
        let attr = tree.create_attribute("fill");
        tree.set_attr_value(attr, "red");
        let err = tree.attributes_mut(rect).unwrap().set("stroke", attr).unwrap_err();
        assert!(matches!(err, DomError::NameMismatch { .. }));
    }

    #[test]
    fn test_item_at_follows_insertion_order() {
        let (mut tree, rect) = element();
        let mut attrs = tree.attributes_mut(rect).unwrap();
        attrs.set("x", "1").unwrap();
        attrs.set("y", "2").unwrap();
        let second = attrs.item_at(1).unwrap();
        assert!(attrs.item_at(2).is_none());
        assert_eq!(tree.attr(second).unwrap().name(), "y");
    }
}
