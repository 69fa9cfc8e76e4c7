//! Property inheritance
//!
//! Walks from an element up to the document element. Non-inherited
//! properties come from the element alone; inherited ones from the nearest
//! level that declares them, with `font` and `font-variant` expanded into
//! their longhands on the way. A `display: none` anywhere on the path
//! sticks.

use std::collections::BTreeMap;

use svgstyle_dom::ElementRef;

use crate::cascade::{CascadeResolver, CascadedStyle};
use crate::config::StyleConfig;
use crate::properties::{ComputedValue, FONT_LONGHANDS, FONT_VARIANT_LONGHANDS, INHERITED, LIST_VALUED, NON_INHERITED};
use crate::shorthand::{parse_font, parse_font_family, parse_font_variant};
use crate::{CssError, CssRule};

/// Resolved property map plus the cascade of every level walked
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InheritedStyle {
    pub values: BTreeMap<String, ComputedValue>,
    /// Cascaded declarations, element first, document element last
    pub levels: Vec<CascadedStyle>,
}

impl InheritedStyle {
    pub fn get(&self, property: &str) -> Option<&ComputedValue> {
        self.values.get(property)
    }

    /// Value of `property` as keyword text
    pub fn text(&self, property: &str) -> Option<&str> {
        self.get(property).and_then(ComputedValue::as_text)
    }
}

/// Applies the inheritance rules on top of the cascade
#[derive(Clone, Copy)]
pub struct InheritanceResolver<'a> {
    cascade: CascadeResolver<'a>,
    config: &'a StyleConfig,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(cascade: CascadeResolver<'a>, config: &'a StyleConfig) -> Self {
        Self { cascade, config }
    }

    /// Resolve every inherited and non-inherited property of `element`
    ///
    /// Fails with [`CssError::UnsupportedShorthand`] when the `marker`
    /// shorthand is met on the way up.
    pub fn resolve(&self, element: ElementRef<'_>, rules: &[CssRule]) -> Result<InheritedStyle, CssError> {
        let levels: Vec<CascadedStyle> = std::iter::successors(Some(element), |e| e.parent_element())
            .map(|level| self.cascade.cascade(level, rules))
            .collect();

        let mut values = BTreeMap::new();
        let own = levels.first();
        for &(name, initial) in NON_INHERITED {
            let value = own.and_then(|s| s.get(name)).unwrap_or(initial);
            values.insert(name.to_string(), ComputedValue::from(value));
        }

        let mut pending: Vec<&'static str> = INHERITED.iter().map(|(name, _)| *name).collect();
        for level in &levels {
            for key in pending.clone() {
                let Some(value) = level.get(key).filter(|v| *v != "inherit") else {
                    continue;
                };
                match key {
                    "font" => {
                        values.insert(key.to_string(), ComputedValue::from(value));
                        for (longhand, expanded) in parse_font(value) {
                            if values.contains_key(longhand) {
                                continue;
                            }
                            if longhand == "font-variant" {
                                let variant = expanded.to_string();
                                values.insert(longhand.to_string(), expanded);
                                expand_variant(&variant, &mut values, &mut pending);
                            } else {
                                values.insert(longhand.to_string(), expanded);
                            }
                        }
                        pending.retain(|p| *p != "font" && !FONT_LONGHANDS.contains(p));
                    }
                    "font-family" => {
                        values.insert(key.to_string(), ComputedValue::List(parse_font_family(value)));
                        pending.retain(|p| *p != key);
                    }
                    "font-variant" => {
                        values.insert(key.to_string(), ComputedValue::from(value));
                        expand_variant(value, &mut values, &mut pending);
                    }
                    "marker" => return Err(CssError::UnsupportedShorthand(key.to_string())),
                    _ => {
                        let value = if LIST_VALUED.contains(&key) {
                            ComputedValue::List(value.split_whitespace().map(str::to_string).collect())
                        } else {
                            ComputedValue::from(value)
                        };
                        values.insert(key.to_string(), value);
                        pending.retain(|p| *p != key);
                    }
                }
            }

            if level.get("display") == Some("none") {
                values.insert("display".to_string(), ComputedValue::from("none"));
            }
        }

        for key in pending {
            let initial = INHERITED.iter().find(|(name, _)| *name == key).and_then(|(_, i)| i.to_value());
            if let Some(initial) = initial {
                values.insert(key.to_string(), initial);
            }
        }
        if !values.contains_key("font-family") {
            values.insert(
                "font-family".to_string(),
                ComputedValue::List(parse_font_family(&self.config.default_font_family)),
            );
        }

        Ok(InheritedStyle { values, levels })
    }
}

/// Fill the `font-variant-*` longhands closer levels left unset
fn expand_variant(value: &str, values: &mut BTreeMap<String, ComputedValue>, pending: &mut Vec<&'static str>) {
    for (longhand, expanded) in parse_font_variant(value) {
        values.entry(longhand.to_string()).or_insert(expanded);
    }
    pending.retain(|p| *p != "font-variant" && !FONT_VARIANT_LONGHANDS.contains(p));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_stylesheet;
    use svgstyle_dom::Document;

    fn resolve(svg: &str, css: &str, id: &str) -> Result<InheritedStyle, CssError> {
        let doc = Document::parse(svg).unwrap();
        let rules = parse_stylesheet(css).unwrap().rules;
        let node = doc.get_element_by_id(id).unwrap();
        let config = StyleConfig::default();
        InheritanceResolver::new(CascadeResolver::default(), &config).resolve(doc.element(node).unwrap(), &rules)
    }

    fn list(items: &[&str]) -> ComputedValue {
        ComputedValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_defaults() {
        let style = resolve(r#"<svg><rect id="r"/></svg>"#, "", "r").unwrap();
        assert_eq!(style.text("fill"), Some("black"));
        assert_eq!(style.text("display"), Some("inline"));
        assert_eq!(style.text("font-size"), Some("medium"));
        assert_eq!(style.get("font-family"), Some(&list(&["sans-serif"])));
        assert_eq!(style.get("font-variant-ligatures"), Some(&list(&["normal"])));
        assert!(style.get("lang").is_none());
        assert!(style.get("font").is_none());
        assert_eq!(style.levels.len(), 2);
    }

    #[test]
    fn test_inherited_from_nearest_level() {
        let style = resolve(
            r#"<svg fill="red" stroke="blue"><g fill="green"><rect id="r"/></g></svg>"#,
            "",
            "r",
        )
        .unwrap();
        assert_eq!(style.text("fill"), Some("green"));
        assert_eq!(style.text("stroke"), Some("blue"));
    }

    #[test]
    fn test_inherit_keyword_skips_level() {
        let style = resolve(r#"<svg fill="red"><rect id="r" fill="inherit"/></svg>"#, "", "r").unwrap();
        assert_eq!(style.text("fill"), Some("red"));
    }

    #[test]
    fn test_non_inherited_ignore_ancestors() {
        let style = resolve(r#"<svg opacity=".5"><rect id="r"/></svg>"#, "", "r").unwrap();
        assert_eq!(style.text("opacity"), Some("1"));
    }

    #[test]
    fn test_display_none_is_sticky() {
        let style = resolve(
            r#"<svg display="none"><g display="inline"><rect id="r"/></g></svg>"#,
            "",
            "r",
        )
        .unwrap();
        assert_eq!(style.text("display"), Some("none"));
    }

    #[test]
    fn test_font_shorthand_with_closer_longhand() {
        let style = resolve(
            r#"<svg style="font: italic bold 12px/30px Georgia, serif"><text id="t" font-size="20px"/></svg>"#,
            "",
            "t",
        )
        .unwrap();
        assert_eq!(style.text("font-size"), Some("20px"));
        assert_eq!(style.text("font-style"), Some("italic"));
        assert_eq!(style.text("font-weight"), Some("bold"));
        assert_eq!(style.text("line-height"), Some("30px"));
        assert_eq!(style.get("font-family"), Some(&list(&["Georgia", "serif"])));
    }

    #[test]
    fn test_same_level_longhand_overrides_shorthand() {
        let style = resolve(
            r#"<svg><text id="t" style="font: 12px serif; font-size: 30px"/></svg>"#,
            "",
            "t",
        )
        .unwrap();
        assert_eq!(style.text("font-size"), Some("30px"));
        assert_eq!(style.get("font-family"), Some(&list(&["serif"])));
    }

    #[test]
    fn test_font_variant_expansion() {
        let style = resolve(
            r#"<svg font-variant="small-caps oldstyle-nums"><text id="t" font-variant-numeric="lining-nums"/></svg>"#,
            "",
            "t",
        )
        .unwrap();
        assert_eq!(style.text("font-variant-caps"), Some("small-caps"));
        assert_eq!(style.get("font-variant-numeric"), Some(&list(&["lining-nums"])));
        assert_eq!(style.get("font-variant-ligatures"), Some(&list(&["normal"])));
    }

    #[test]
    fn test_marker_shorthand_unsupported() {
        let err = resolve(r#"<svg><path id="p" marker="url(#m)"/></svg>"#, "", "p").unwrap_err();
        assert_eq!(err, CssError::UnsupportedShorthand("marker".into()));
    }
}
