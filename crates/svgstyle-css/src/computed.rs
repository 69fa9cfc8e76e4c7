//! Computed Style
//!
//! Final property map of one element. Built per resolution and never
//! updated afterwards.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use crate::properties::ComputedValue;

/// Fully resolved property → value map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedStyle {
    values: BTreeMap<String, ComputedValue>,
}

impl ComputedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: &str) -> Option<&ComputedValue> {
        self.values.get(property)
    }

    /// Keyword value of `property`
    pub fn text(&self, property: &str) -> Option<&str> {
        self.get(property).and_then(ComputedValue::as_text)
    }

    /// Numeric value of `property` (px for lengths)
    pub fn number(&self, property: &str) -> Option<f64> {
        self.get(property).and_then(ComputedValue::as_number)
    }

    pub fn list(&self, property: &str) -> Option<&[String]> {
        self.get(property).and_then(ComputedValue::as_list)
    }

    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<ComputedValue>) {
        self.values.insert(property.into(), value.into());
    }

    pub fn contains(&self, property: &str) -> bool {
        self.values.contains_key(property)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Properties in name order
    pub fn iter(&self) -> btree_map::Iter<'_, String, ComputedValue> {
        self.values.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, ComputedValue> {
        self.values
    }
}

impl From<BTreeMap<String, ComputedValue>> for ComputedStyle {
    fn from(values: BTreeMap<String, ComputedValue>) -> Self {
        Self { values }
    }
}

impl<'a> IntoIterator for &'a ComputedStyle {
    type Item = (&'a String, &'a ComputedValue);
    type IntoIter = btree_map::Iter<'a, String, ComputedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for ComputedStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.values {
            writeln!(f, "{name}: {value};")?;
        }
        Ok(())
    }
}
