//! Style Cascade
//!
//! Merges the declarations that apply to one element:
//! 1. Matching style rules, in source order (later rules win; selector
//!    specificity is not compared)
//! 2. Presentation attributes
//! 3. Inline `style` declarations
//! 4. `!important` declarations from style sheets, then inline ones

use std::collections::BTreeMap;

use svgstyle_dom::ElementRef;

use crate::parser::parse_style_attribute;
use crate::selectors::{SelectorEngine, SelectorMatcher};
use crate::{CssRule, NamespaceMap};

/// Property name → declared value text
pub type DeclaredMap = BTreeMap<String, String>;

/// Declarations applying to one element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadedStyle {
    /// Every declaration of the matching rules, last match wins
    pub normal: DeclaredMap,
    /// `!important` declarations, sheet first then inline
    pub important: DeclaredMap,
    /// Final declared value per property at this element
    pub merged: DeclaredMap,
}

impl CascadedStyle {
    /// Final declared value of `property`
    pub fn get(&self, property: &str) -> Option<&str> {
        self.merged.get(property).map(String::as_str)
    }
}

/// Resolves the declared values of a single element
#[derive(Clone, Copy)]
pub struct CascadeResolver<'a> {
    selector: &'a dyn SelectorMatcher,
}

impl Default for CascadeResolver<'_> {
    fn default() -> Self {
        Self { selector: &SelectorEngine }
    }
}

impl<'a> CascadeResolver<'a> {
    pub fn new(selector: &'a dyn SelectorMatcher) -> Self {
        Self { selector }
    }

    /// Cascade the flattened `rules` for `element`
    pub fn cascade(&self, element: ElementRef<'_>, rules: &[CssRule]) -> CascadedStyle {
        let mut style = CascadedStyle::default();
        let mut namespaces = NamespaceMap::new();

        for rule in rules {
            let rule = match rule {
                CssRule::Style(rule) => rule,
                CssRule::Namespace(ns) => {
                    if let Some(prefix) = ns.prefix.as_deref().filter(|p| !p.is_empty()) {
                        namespaces.insert(prefix.to_string(), ns.uri.clone());
                    }
                    continue;
                }
                // Font rules are recognized but carry no element properties
                CssRule::FontFace(_) | CssRule::FontFeatureValues(_) => continue,
                CssRule::Import(_) | CssRule::Media(_) => continue,
            };

            match self.selector.match_selector(&rule.selector_text, element, &namespaces) {
                Ok(true) => {
                    for declaration in &rule.declarations {
                        style
                            .normal
                            .insert(declaration.property.clone(), declaration.value.clone());
                        if declaration.important {
                            style
                                .important
                                .insert(declaration.property.clone(), declaration.value.clone());
                        }
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::trace!(selector = rule.selector_text.as_str(), %err, "skipping rule");
                }
            }
        }

        let mut merged = style.normal.clone();
        for (name, value) in element.attributes() {
            if name != "style" {
                merged.insert(name.to_string(), value.to_string());
            }
        }
        if let Some(inline) = element.attribute("style") {
            for declaration in parse_style_attribute(inline) {
                if declaration.important {
                    style
                        .important
                        .insert(declaration.property.clone(), declaration.value.clone());
                }
                merged.insert(declaration.property, declaration.value);
            }
        }
        merged.extend(style.important.iter().map(|(k, v)| (k.clone(), v.clone())));
        style.merged = merged;
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_stylesheet;
    use svgstyle_dom::Document;

    fn cascade(svg: &str, css: &str, id: &str) -> CascadedStyle {
        let doc = Document::parse(svg).unwrap();
        let rules = parse_stylesheet(css).unwrap().rules;
        let node = doc.get_element_by_id(id).unwrap();
        CascadeResolver::default().cascade(doc.element(node).unwrap(), &rules)
    }

    #[test]
    fn test_last_matching_rule_wins() {
        let style = cascade(
            r#"<svg><rect id="r" class="a"/></svg>"#,
            "#r { fill: red } rect { fill: blue } .a { stroke: green }",
            "r",
        );
        assert_eq!(style.get("fill"), Some("blue"));
        assert_eq!(style.get("stroke"), Some("green"));
    }

    #[test]
    fn test_attribute_over_sheet_and_inline_over_attribute() {
        let style = cascade(
            r#"<svg><rect id="r" fill="red" stroke="black" style="fill: blue"/></svg>"#,
            "rect { fill: green; stroke: green; opacity: .5 }",
            "r",
        );
        assert_eq!(style.get("fill"), Some("blue"));
        assert_eq!(style.get("stroke"), Some("black"));
        assert_eq!(style.get("opacity"), Some(".5"));
        assert_eq!(style.get("id"), Some("r"));
        assert_eq!(style.get("style"), None);
        assert_eq!(style.normal.get("fill").map(String::as_str), Some("green"));
    }

    #[test]
    fn test_important_wins() {
        let style = cascade(
            r#"<svg><rect id="r" fill="red" style="fill: blue; stroke: red !important"/></svg>"#,
            "rect { fill: green !important; stroke: green !important }",
            "r",
        );
        assert_eq!(style.get("fill"), Some("green"));
        assert_eq!(style.get("stroke"), Some("red"));
        assert_eq!(style.important.len(), 2);
    }

    #[test]
    fn test_malformed_selector_skipped() {
        let style = cascade(
            r#"<svg><rect id="r"/></svg>"#,
            "rect { fill: red } :host(rect) > rect { fill: blue } rect >> x { fill: blue }",
            "r",
        );
        assert_eq!(style.get("fill"), Some("red"));
    }

    #[test]
    fn test_namespace_prefix_applies_to_later_rules() {
        let style = cascade(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect id="r"/></svg>"#,
            "@namespace s url(http://www.w3.org/2000/svg); s|rect { fill: red } x|rect { fill: blue }",
            "r",
        );
        assert_eq!(style.get("fill"), Some("red"));
    }

    #[test]
    fn test_font_rules_contribute_nothing() {
        let style = cascade(
            r#"<svg><text id="t"/></svg>"#,
            "@font-face { font-family: X; src: url(x.woff) } text { font-size: 3px }",
            "t",
        );
        assert_eq!(style.get("font-family"), None);
        assert_eq!(style.get("font-size"), Some("3px"));
    }
}
