//! DOMTokenList
//!
//! Live ordered-set view over a whitespace-separated attribute such as
//! `class`. The attribute is re-read on every call and re-serialized on
//! every mutation; an empty set removes the attribute.

use crate::{DomError, DomTree, NodeId};

/// Token-set view over one attribute of one element
pub struct TokenList<'a> {
    tree: &'a mut DomTree,
    element: NodeId,
    attr: String,
}

fn validate(token: &str) -> Result<(), DomError> {
    if token.is_empty() || token.bytes().any(|b| b.is_ascii_whitespace()) {
        return Err(DomError::InvalidToken(token.to_string()));
    }
    Ok(())
}

fn validate_all(tokens: &[&str]) -> Result<(), DomError> {
    tokens.iter().try_for_each(|t| validate(t))
}

impl<'a> TokenList<'a> {
    pub(crate) fn new(tree: &'a mut DomTree, element: NodeId, attr: &str) -> Result<Self, DomError> {
        if !tree.is_element(element) {
            return Err(DomError::NotAnElement(element));
        }
        Ok(Self {
            tree,
            element,
            attr: attr.to_string(),
        })
    }

    /// Current tokens, duplicates removed, in first-seen order
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        let raw = self.tree.get_attribute(self.element, &self.attr).unwrap_or("");
        for token in raw.split_ascii_whitespace() {
            if !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }
        tokens
    }

    fn write(&mut self, tokens: &[String]) -> Result<(), DomError> {
        if tokens.is_empty() {
            self.tree.remove_attribute(self.element, &self.attr);
            Ok(())
        } else {
            self.tree.set_attribute(self.element, &self.attr, &tokens.join(" "))
        }
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens().is_empty()
    }

    /// Token at index
    pub fn item(&self, index: usize) -> Option<String> {
        self.tokens().into_iter().nth(index)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens().iter().any(|t| t == token)
    }

    /// Serialized attribute value
    pub fn value(&self) -> String {
        self.tree
            .get_attribute(self.element, &self.attr)
            .unwrap_or("")
            .to_string()
    }

    /// Replace the whole value; a blank value removes the attribute
    pub fn set_value(&mut self, value: &str) -> Result<(), DomError> {
        if value.trim_ascii().is_empty() {
            return self.write(&[]);
        }
        self.tree.set_attribute(self.element, &self.attr, value)
    }

    /// Insert `token` before `index`; `index == len()` appends
    ///
    /// A token already in the set is left where it is.
    pub fn insert(&mut self, index: usize, token: &str) -> Result<(), DomError> {
        validate(token)?;
        let mut current = self.tokens();
        if index > current.len() {
            return Err(DomError::IndexOutOfRange {
                index,
                len: current.len(),
            });
        }
        if current.iter().any(|t| t == token) {
            return Ok(());
        }
        current.insert(index, token.to_string());
        self.write(&current)
    }

    /// Overwrite the token at `index`
    ///
    /// Returns false without touching the attribute when `token` is already
    /// in the set.
    pub fn set_item(&mut self, index: usize, token: &str) -> Result<bool, DomError> {
        validate(token)?;
        let mut current = self.tokens();
        let len = current.len();
        let Some(slot) = current.get_mut(index) else {
            return Err(DomError::IndexOutOfRange { index, len });
        };
        if *slot == token {
            return Ok(false);
        }
        *slot = token.to_string();
        if current.iter().filter(|t| *t == token).count() > 1 {
            return Ok(false);
        }
        self.write(&current)?;
        Ok(true)
    }

    /// Remove and return the token at `index`
    pub fn remove_at(&mut self, index: usize) -> Result<String, DomError> {
        let mut current = self.tokens();
        if index >= current.len() {
            return Err(DomError::IndexOutOfRange {
                index,
                len: current.len(),
            });
        }
        let token = current.remove(index);
        self.write(&current)?;
        Ok(token)
    }

    /// Add tokens; present ones keep their position
    pub fn add(&mut self, tokens: &[&str]) -> Result<(), DomError> {
        validate_all(tokens)?;
        let mut current = self.tokens();
        for token in tokens {
            if !current.iter().any(|t| t == token) {
                current.push(token.to_string());
            }
        }
        self.write(&current)
    }

    /// Remove tokens; missing ones are ignored
    pub fn remove(&mut self, tokens: &[&str]) -> Result<(), DomError> {
        validate_all(tokens)?;
        let mut current = self.tokens();
        current.retain(|t| !tokens.contains(&t.as_str()));
        self.write(&current)
    }

    /// Replace `old` with `new` in place
    ///
    /// Returns false without touching the attribute when `old` is absent or
    /// `new` is already present.
    pub fn replace(&mut self, old: &str, new: &str) -> Result<bool, DomError> {
        validate_all(&[old, new])?;
        let mut current = self.tokens();
        if current.iter().any(|t| t == new) {
            return Ok(false);
        }
        let Some(pos) = current.iter().position(|t| t == old) else {
            return Ok(false);
        };
        current[pos] = new.to_string();
        self.write(&current)?;
        Ok(true)
    }

    /// Toggle a token, returns whether it is present afterwards
    pub fn toggle(&mut self, token: &str, force: Option<bool>) -> Result<bool, DomError> {
        validate(token)?;
        let present = self.contains(token);
        match (force, present) {
            (Some(true), _) | (None, false) => {
                if !present {
                    self.add(&[token])?;
                }
                Ok(true)
            }
            (Some(false), _) | (None, true) => {
                if present {
                    self.remove(&[token])?;
                }
                Ok(false)
            }
        }
    }

    /// Iterate over a snapshot of the tokens
    pub fn iter(&self) -> std::vec::IntoIter<String> {
        self.tokens().into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_class(value: Option<&str>) -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let g = tree.create_element("g");
        tree.append_child(tree.root(), g);
        if let Some(v) = value {
            tree.set_attribute(g, "class", v).unwrap();
        }
        (tree, g)
    }

    #[test]
    fn test_from_attribute() {
        let (mut tree, g) = tree_with_class(Some("btn  btn-primary active btn"));
        let list = tree.class_list(g).unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.contains("btn-primary"));
        assert_eq!(list.item(2).as_deref(), Some("active"));
    }

    #[test]
    fn test_add_remove() {
        let (mut tree, g) = tree_with_class(None);
        let mut list = tree.class_list(g).unwrap();
        list.add(&["foo", "bar"]).unwrap();
        assert_eq!(list.value(), "foo bar");

        list.remove(&["foo", "missing"]).unwrap();
        assert_eq!(list.value(), "bar");
    }

    #[test]
    fn test_empty_set_removes_attribute() {
        let (mut tree, g) = tree_with_class(Some("only"));
        tree.class_list(g).unwrap().remove(&["only"]).unwrap();
        assert_eq!(tree.get_attribute(g, "class"), None);
    }

    #[test]
    fn test_invalid_token_is_all_or_nothing() {
        let (mut tree, g) = tree_with_class(Some("a"));
        let mut list = tree.class_list(g).unwrap();
        let err = list.add(&["b", "c d"]).unwrap_err();
        assert_eq!(err, DomError::InvalidToken("c d".into()));
        assert_eq!(list.value(), "a");
        assert!(list.add(&[""]).is_err());
    }

    #[test]
    fn test_toggle() {
        let (mut tree, g) = tree_with_class(None);
        let mut list = tree.class_list(g).unwrap();

        assert!(list.toggle("active", None).unwrap());
        assert!(list.contains("active"));
        assert!(!list.toggle("active", None).unwrap());
        assert!(!list.contains("active"));

        assert!(list.toggle("x", Some(true)).unwrap());
        assert!(list.toggle("x", Some(true)).unwrap());
        assert!(!list.toggle("y", Some(false)).unwrap());
        assert!(!list.contains("y"));
    }

    #[test]
    fn test_blank_value_removes_attribute() {
        let (mut tree, g) = tree_with_class(Some("a b"));
        tree.class_list(g).unwrap().set_value("").unwrap();
        assert_eq!(tree.get_attribute(g, "class"), None);

        tree.class_list(g).unwrap().set_value("x y").unwrap();
        assert_eq!(tree.get_attribute(g, "class"), Some("x y"));
        tree.class_list(g).unwrap().set_value(" \t\n").unwrap();
        assert_eq!(tree.get_attribute(g, "class"), None);
    }

    #[test]
    fn test_insert() {
        let (mut tree, g) = tree_with_class(Some("a c"));
        let mut list = tree.class_list(g).unwrap();
        list.insert(1, "b").unwrap();
        assert_eq!(list.value(), "a b c");
        list.insert(3, "d").unwrap();
        assert_eq!(list.value(), "a b c d");
        list.insert(0, "c").unwrap();
        assert_eq!(list.value(), "a b c d");

        assert_eq!(
            list.insert(9, "z").unwrap_err(),
            DomError::IndexOutOfRange { index: 9, len: 4 }
        );
        assert_eq!(list.insert(0, "x y").unwrap_err(), DomError::InvalidToken("x y".into()));
        assert_eq!(list.value(), "a b c d");
    }

    #[test]
    fn test_set_item() {
        let (mut tree, g) = tree_with_class(Some("a b c"));
        let mut list = tree.class_list(g).unwrap();
        assert!(list.set_item(1, "z").unwrap());
        assert_eq!(list.value(), "a z c");
        assert!(!list.set_item(0, "c").unwrap());
        assert_eq!(list.value(), "a z c");
        assert!(list.set_item(3, "q").is_err());
        assert!(list.set_item(0, "").is_err());
    }

    #[test]
    fn test_remove_at() {
        let (mut tree, g) = tree_with_class(Some("a b"));
        let mut list = tree.class_list(g).unwrap();
        assert_eq!(list.remove_at(0).unwrap(), "a");
        assert_eq!(list.value(), "b");
        assert!(list.remove_at(1).is_err());
        assert_eq!(list.remove_at(0).unwrap(), "b");
        assert_eq!(tree.get_attribute(g, "class"), None);
    }

    #[test]
    fn test_replace() {
        let (mut tree, g) = tree_with_class(Some("a b c"));
        let mut list = tree.class_list(g).unwrap();
        assert!(list.replace("b", "z").unwrap());
        assert_eq!(list.value(), "a z c");
        assert!(!list.replace("missing", "q").unwrap());
        assert!(!list.replace("a", "c").unwrap());
        assert_eq!(list.value(), "a z c");
    }
}
