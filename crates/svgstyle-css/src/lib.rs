//! svgstyle CSS - style resolution for SVG/XML documents
//!
//! Style sheet parsing, rule collection, cascade, inheritance and the final
//! computed-value pass. The entry point is [`StyleResolver`].

mod cascade;
mod collector;
mod computed;
mod config;
mod finalize;
mod inheritance;
mod media;
mod parser;
pub mod properties;
mod resolver;
mod selectors;
pub mod shorthand;
pub mod units;

use std::collections::HashMap;

pub use cascade::{CascadeResolver, CascadedStyle, DeclaredMap};
pub use collector::{RuleCollector, UA_STYLESHEET};
pub use computed::ComputedStyle;
pub use config::StyleConfig;
pub use finalize::{GeometryProvider, NoGeometry, StyleFinalizer};
pub use inheritance::{InheritanceResolver, InheritedStyle};
pub use media::{MediaMatcher, ViewportMedia};
pub use parser::{CssParser, MAX_IMPORT_DEPTH, MemoryLoader, SheetLoader, parse_style_attribute};
pub use properties::ComputedValue;
pub use resolver::StyleResolver;
pub use selectors::{SelectorEngine, SelectorList, SelectorMatcher};

use svgstyle_dom::DomError;

/// Namespace prefix → URI table from `@namespace` rules
pub type NamespaceMap = HashMap<String, String>;

/// Parse a CSS style sheet without an import loader
pub fn parse_stylesheet(css: &str) -> Result<StyleSheet, CssError> {
    CssParser::new().parse(css)
}

/// Parsed style sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    pub rules: Vec<CssRule>,
    /// Where the sheet came from, if external
    pub href: Option<String>,
    /// Media text the sheet was included with
    pub media: String,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of top-level rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CssRule> {
        self.rules.iter()
    }

    /// Prefixed `@namespace` declarations of this sheet
    pub fn namespaces(&self) -> NamespaceMap {
        self.rules
            .iter()
            .filter_map(|rule| match rule {
                CssRule::Namespace(ns) => ns.prefix.clone().map(|p| (p, ns.uri.clone())),
                _ => None,
            })
            .collect()
    }

    /// Unprefixed `@namespace` declaration, if any
    pub fn default_namespace(&self) -> Option<&str> {
        self.rules.iter().rev().find_map(|rule| match rule {
            CssRule::Namespace(ns) if ns.prefix.is_none() => Some(ns.uri.as_str()),
            _ => None,
        })
    }

    /// Parse `text` as a single rule and insert it before `index`
    pub fn insert_rule(&mut self, text: &str, index: usize) -> Result<usize, CssError> {
        if index > self.rules.len() {
            return Err(CssError::RuleNotFound {
                index,
                len: self.rules.len(),
            });
        }
        let rule = CssParser::new().parse_rule(text)?;
        self.rules.insert(index, rule);
        Ok(index)
    }

    /// Remove the rule at `index`
    pub fn delete_rule(&mut self, index: usize) -> Result<CssRule, CssError> {
        if index >= self.rules.len() {
            return Err(CssError::RuleNotFound {
                index,
                len: self.rules.len(),
            });
        }
        Ok(self.rules.remove(index))
    }
}

/// Rule kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Style,
    Import,
    Media,
    FontFace,
    FontFeatureValues,
    Namespace,
}

/// CSS rule
#[derive(Debug, Clone, PartialEq)]
pub enum CssRule {
    Style(StyleRule),
    Import(ImportRule),
    Media(MediaRule),
    FontFace(FontFaceRule),
    FontFeatureValues(FontFeatureValuesRule),
    Namespace(NamespaceRule),
}

impl CssRule {
    pub fn kind(&self) -> RuleKind {
        match self {
            CssRule::Style(_) => RuleKind::Style,
            CssRule::Import(_) => RuleKind::Import,
            CssRule::Media(_) => RuleKind::Media,
            CssRule::FontFace(_) => RuleKind::FontFace,
            CssRule::FontFeatureValues(_) => RuleKind::FontFeatureValues,
            CssRule::Namespace(_) => RuleKind::Namespace,
        }
    }

    pub fn as_style(&self) -> Option<&StyleRule> {
        match self {
            CssRule::Style(rule) => Some(rule),
            _ => None,
        }
    }
}

/// Selector plus declaration block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleRule {
    pub selector_text: String,
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    pub fn new(selector_text: impl Into<String>) -> Self {
        Self {
            selector_text: selector_text.into(),
            declarations: Vec::new(),
        }
    }

    /// Add a declaration; a repeated property replaces the earlier one in place
    pub fn set_declaration(&mut self, declaration: Declaration) {
        merge_declaration(&mut self.declarations, declaration);
    }

    /// Declaration for a property
    pub fn get(&self, property: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.property == property)
    }
}

pub(crate) fn merge_declaration(list: &mut Vec<Declaration>, declaration: Declaration) {
    match list.iter_mut().find(|d| d.property == declaration.property) {
        Some(existing) => *existing = declaration,
        None => list.push(declaration),
    }
}

/// `@import url [media]`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRule {
    pub href: String,
    pub media: String,
    /// Imported sheet; None when it could not be loaded
    pub sheet: Option<Box<StyleSheet>>,
}

/// `@media <query> { rules }`
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRule {
    pub media: String,
    pub rules: Vec<CssRule>,
}

/// `@font-face { declarations }`
#[derive(Debug, Clone, PartialEq)]
pub struct FontFaceRule {
    pub declarations: Vec<Declaration>,
}

/// `@font-feature-values <family> { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct FontFeatureValuesRule {
    pub font_family: String,
    /// Raw block text
    pub body: String,
}

/// `@namespace [prefix] url`
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceRule {
    pub prefix: Option<String>,
    pub uri: String,
}

/// CSS declaration (property: value)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: &str, value: &str, important: bool) -> Self {
        Self {
            property: property.to_string(),
            value: value.to_string(),
            important,
        }
    }
}

/// CSS errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CssError {
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: u32, message: String },
    #[error("unsupported shorthand property '{0}'")]
    UnsupportedShorthand(String),
    #[error("malformed selector '{0}'")]
    MalformedSelector(String),
    #[error("rule index {index} out of range (length {len})")]
    RuleNotFound { index: usize, len: usize },
    #[error(transparent)]
    Dom(#[from] DomError),
}
