//! Comprehensive tests for svgstyle-dom
//!
//! Attribute node identity/ownership and token-set behavior.

use svgstyle_dom::{AttributeValue, Document, DomError, DomTree, NodeId, XmlParser};

fn two_rects() -> (Document, NodeId, NodeId) {
    let doc = XmlParser::new()
        .parse(r#"<svg><rect id="a" fill="red"/><rect id="b"/></svg>"#)
        .unwrap();
    let a = doc.get_element_by_id("a").unwrap();
    let b = doc.get_element_by_id("b").unwrap();
    (doc, a, b)
}

// ============================================================================
// Attribute identity
// ============================================================================

#[test]
fn test_repeated_lookup_same_identity() {
    let (mut doc, a, _) = two_rects();
    let mut attrs = doc.tree_mut().attributes_mut(a).unwrap();
    let first = attrs.get("id").unwrap();
    let second = attrs.get("id").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_readd_creates_new_identity() {
    let (mut doc, a, _) = two_rects();
    let tree = doc.tree_mut();
    let mut attrs = tree.attributes_mut(a).unwrap();
    let before = attrs.get("id").unwrap();
    attrs.delete("id").unwrap();
    attrs.set("id", "x").unwrap();
    let after = attrs.get("id").unwrap();
    assert_ne!(before, after);

    // The detached node keeps its last value and ignores the new one.
    assert_eq!(tree.attr_value(before), Some("a"));
    assert_eq!(tree.attr_value(after), Some("x"));
    assert_eq!(tree.attr_owner(before), None);
    assert_eq!(tree.attr_owner(after), Some(a));
}

#[test]
fn test_detached_node_mutation_is_isolated() {
    let (mut doc, a, _) = two_rects();
    let tree = doc.tree_mut();
    let old = tree.attributes_mut(a).unwrap().get("fill").unwrap();
    tree.attributes_mut(a).unwrap().delete("fill").unwrap();
    tree.set_attribute(a, "fill", "blue").unwrap();

    tree.set_attr_value(old, "green");
    assert_eq!(tree.get_attribute(a, "fill"), Some("blue"));
    assert_eq!(tree.attr_value(old), Some("green"));
}

#[test]
fn test_remove_through_tree_detaches_node() {
    let (mut doc, a, _) = two_rects();
    let tree = doc.tree_mut();
    let node = tree.attributes_mut(a).unwrap().get("fill").unwrap();
    assert!(tree.remove_attribute(a, "fill"));
    assert_eq!(tree.attr_owner(node), None);
    assert_eq!(tree.attr_value(node), Some("red"));
}

// ============================================================================
// Attribute ownership
// ============================================================================

#[test]
fn test_set_node_owned_elsewhere_fails() {
    let (mut doc, a, b) = two_rects();
    let tree = doc.tree_mut();
    let fill = tree.attributes_mut(a).unwrap().get("fill").unwrap();
    let err = tree.attributes_mut(b).unwrap().set("fill", fill).unwrap_err();
    assert_eq!(err, DomError::AlreadyOwned);
    assert_eq!(tree.get_attribute(b, "fill"), None);
}

#[test]
fn test_set_same_node_is_noop() {
    let (mut doc, a, _) = two_rects();
    let tree = doc.tree_mut();
    let mut attrs = tree.attributes_mut(a).unwrap();
    let fill = attrs.get("fill").unwrap();
    attrs.set("fill", AttributeValue::Node(fill)).unwrap();
    assert_eq!(attrs.get("fill").unwrap(), fill);
    assert_eq!(attrs.names(), vec!["id", "fill"]);
}

#[test]
fn test_set_detached_node_attaches() {
    let (mut doc, _, b) = two_rects();
    let tree = doc.tree_mut();
    let stroke = tree.create_attribute("stroke");
    tree.set_attr_value(stroke, "black");
    tree.attributes_mut(b).unwrap().set("stroke", stroke).unwrap();

    assert_eq!(tree.attr_owner(stroke), Some(b));
    assert_eq!(tree.get_attribute(b, "stroke"), Some("black"));
    assert_eq!(tree.attributes_mut(b).unwrap().get("stroke").unwrap(), stroke);
}

#[test]
fn test_set_node_replaces_previous_node() {
    let (mut doc, a, _) = two_rects();
    let tree = doc.tree_mut();
    let old = tree.attributes_mut(a).unwrap().get("fill").unwrap();
    let new = tree.create_attribute("fill");
    tree.set_attr_value(new, "blue");
    tree.attributes_mut(a).unwrap().set("fill", new).unwrap();

    assert_eq!(tree.attr_owner(old), None);
    assert_eq!(tree.attr_value(old), Some("red"));
    assert_eq!(tree.get_attribute(a, "fill"), Some("blue"));
}

#[test]
fn test_set_empty_node_deletes() {
    let (mut doc, a, _) = two_rects();
    let tree = doc.tree_mut();
    let empty = tree.create_attribute("fill");
    tree.attributes_mut(a).unwrap().set("fill", empty).unwrap();
    assert_eq!(tree.get_attribute(a, "fill"), None);
}

#[test]
fn test_namespaced_attribute_node() {
    let mut doc = XmlParser::new()
        .parse(r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#a"/></svg>"##)
        .unwrap();
    let use_el = doc.elements_by_local_name("use")[0];
    let tree = doc.tree_mut();
    let href = tree.attributes_mut(use_el).unwrap().get("xlink:href").unwrap();
    let node = tree.attr(href).unwrap();
    assert_eq!(node.local_name(), "href");
    assert_eq!(node.prefix(), Some("xlink"));
    assert_eq!(node.namespace_uri(), Some("http://www.w3.org/1999/xlink"));
}

#[test]
fn test_attributes_on_text_node_rejected() {
    let mut tree = DomTree::new();
    let text = tree.create_text("x");
    assert!(matches!(tree.attributes_mut(text), Err(DomError::NotAnElement(_))));
    assert!(tree.class_list(text).is_err());
}

// ============================================================================
// Token lists
// ============================================================================

#[test]
fn test_idempotent_add() {
    let (mut doc, a, _) = two_rects();
    let mut list = doc.tree_mut().class_list(a).unwrap();
    list.add(&["x"]).unwrap();
    let once = list.value();
    list.add(&["x"]).unwrap();
    assert_eq!(list.value(), once);
    assert_eq!(list.tokens(), vec!["x"]);
}

#[test]
fn test_toggle_is_symmetric_difference() {
    let (mut doc, a, _) = two_rects();
    let tree = doc.tree_mut();
    tree.set_attribute(a, "class", "p q").unwrap();
    let mut list = tree.class_list(a).unwrap();

    let present = list.toggle("q", None).unwrap();
    assert_eq!(present, list.contains("q"));
    assert_eq!(list.tokens(), vec!["p"]);

    let present = list.toggle("r", None).unwrap();
    assert_eq!(present, list.contains("r"));
    assert_eq!(list.tokens(), vec!["p", "r"]);
}

#[test]
fn test_failed_add_leaves_set_unchanged() {
    let (mut doc, a, _) = two_rects();
    let tree = doc.tree_mut();
    tree.set_attribute(a, "class", "keep").unwrap();
    let mut list = tree.class_list(a).unwrap();
    assert_eq!(list.add(&["a b"]), Err(DomError::InvalidToken("a b".into())));
    assert_eq!(list.tokens(), vec!["keep"]);
    assert!(list.toggle("", None).is_err());
    assert!(list.replace("keep", "x\ty").is_err());
}

#[test]
fn test_token_round_trip_through_attribute() {
    let (mut doc, a, _) = two_rects();
    let tree = doc.tree_mut();
    tree.class_list(a).unwrap().add(&["one", "two", "three"]).unwrap();
    let serialized = tree.get_attribute(a, "class").unwrap().to_string();
    assert_eq!(serialized, "one two three");

    let fresh = tree.class_list(a).unwrap();
    assert_eq!(fresh.tokens(), vec!["one", "two", "three"]);
}

#[test]
fn test_token_list_on_any_attribute() {
    let (mut doc, a, _) = two_rects();
    let tree = doc.tree_mut();
    let mut list = tree.token_list(a, "requiredExtensions").unwrap();
    list.add(&["ext1"]).unwrap();
    assert_eq!(tree.get_attribute(a, "requiredExtensions"), Some("ext1"));
}

#[test]
fn test_token_list_shares_attribute_node() {
    let (mut doc, a, _) = two_rects();
    let tree = doc.tree_mut();
    tree.set_attribute(a, "class", "a").unwrap();
    let node = tree.attributes_mut(a).unwrap().get("class").unwrap();
    tree.class_list(a).unwrap().add(&["b"]).unwrap();
    assert_eq!(tree.attr_value(node), Some("a b"));

    tree.class_list(a).unwrap().remove(&["a", "b"]).unwrap();
    assert_eq!(tree.attr_owner(node), None);
    assert_eq!(tree.attr_value(node), Some("a b"));
}
