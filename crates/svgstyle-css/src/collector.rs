//! Rule collection
//!
//! Gathers every rule that can apply to a document: the SVG user agent
//! sheet, `xml-stylesheet` processing instructions before the root element,
//! then `<link>` and `<style>` elements in document order. `@import` and
//! `@media` groups are flattened in place once their media condition holds.

use svgstyle_dom::{Document, ElementRef, NodeData, NodeId};

use crate::media::{MediaMatcher, is_unconditional};
use crate::parser::{CssParser, SheetLoader, resolve_href};
use crate::{CssRule, StyleSheet};

/// SVG user agent style sheet
pub const UA_STYLESHEET: &str = r#"
@namespace url(http://www.w3.org/2000/svg);
@namespace xml url(http://www.w3.org/XML/1998/namespace);

svg:not(:root), hatch, image, marker, pattern, symbol { overflow: hidden; }

*:not(svg),
*:not(foreignObject) > svg {
  transform-origin: 0 0;
}

*[xml|space=preserve] {
  text-space-collapse: preserve-spaces;
}

defs,
clipPath, mask, marker,
desc, title, metadata,
pattern, hatch,
linearGradient, radialGradient, meshGradient,
script, style,
symbol {
  display: none !important;
}
:host(use) > symbol {
  display: inline !important;
}
"#;

/// Collects and flattens the rules of a document
#[derive(Clone, Copy, Default)]
pub struct RuleCollector<'a> {
    media: Option<&'a dyn MediaMatcher>,
    loader: Option<&'a dyn SheetLoader>,
}

impl<'a> RuleCollector<'a> {
    /// Collector without media evaluation or external sheets
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate media conditions with `media`
    pub fn with_media(mut self, media: &'a dyn MediaMatcher) -> Self {
        self.media = Some(media);
        self
    }

    /// Load external sheets through `loader`
    pub fn with_loader(mut self, loader: &'a dyn SheetLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// All applicable rules of `document`, flattened, in cascade order
    pub fn collect(&self, document: &Document) -> Vec<CssRule> {
        let mut rules = CssParser::new().parse(UA_STYLESHEET).map(|s| s.rules).unwrap_or_default();

        for sheet in self.processing_instruction_sheets(document) {
            rules.extend(sheet.rules);
        }
        for sheet in self.element_sheets(document) {
            rules.extend(sheet.rules);
        }

        let flattened = self.flatten(&rules);
        tracing::debug!(rules = flattened.len(), "collected style rules");
        flattened
    }

    /// Replace `@import`/`@media` groups by their rules where the media
    /// condition holds, recursively
    pub fn flatten(&self, rules: &[CssRule]) -> Vec<CssRule> {
        let mut flattened = Vec::new();
        self.flatten_into(rules, &mut flattened);
        flattened
    }

    fn flatten_into(&self, rules: &[CssRule], out: &mut Vec<CssRule>) {
        for rule in rules {
            match rule {
                CssRule::Import(import) => {
                    if !self.media_allows(&import.media) {
                        continue;
                    }
                    match &import.sheet {
                        Some(sheet) => self.flatten_into(&sheet.rules, out),
                        None => tracing::debug!(href = import.href.as_str(), "unreachable style sheet"),
                    }
                }
                CssRule::Media(media) => {
                    if self.media_allows(&media.media) {
                        self.flatten_into(&media.rules, out);
                    }
                }
                other => out.push(other.clone()),
            }
        }
    }

    fn media_allows(&self, media: &str) -> bool {
        if is_unconditional(media) {
            return true;
        }
        let Some(matcher) = self.media else {
            tracing::debug!(media, "no active viewport");
            return false;
        };
        let matched = matcher.matches_medium(media.trim());
        if !matched {
            tracing::debug!(media, "media not matched");
        }
        matched
    }

    fn parser<'b>(&self, base: Option<&'b str>) -> CssParser<'b>
    where
        'a: 'b,
    {
        let parser = match self.loader {
            Some(loader) => CssParser::with_loader(loader),
            None => CssParser::new(),
        };
        parser.base_url(base)
    }

    fn load(&self, href: &str, base: Option<&str>, media: &str) -> Option<StyleSheet> {
        let Some(loader) = self.loader else {
            tracing::debug!(href, "no sheet loader");
            return None;
        };
        let url = resolve_href(href, base);
        let Some(text) = loader.load(href, base) else {
            tracing::debug!(url = url.as_str(), "unreachable style sheet");
            return None;
        };
        let mut sheet = self.parser(Some(url.as_str())).parse(&text).ok()?;
        sheet.href = Some(url);
        sheet.media = media.to_string();
        Some(sheet)
    }

    /// Sheets from `<?xml-stylesheet?>` instructions preceding the root
    fn processing_instruction_sheets(&self, document: &Document) -> Vec<StyleSheet> {
        let tree = document.tree();
        let mut sheets = Vec::new();
        for (_, node) in tree.children(NodeId::ROOT) {
            let (target, data) = match &node.data {
                NodeData::Element(_) => break,
                NodeData::ProcessingInstruction { target, data } => (target, data),
                _ => continue,
            };
            if target != "xml-stylesheet" {
                continue;
            }

            let attrs = pseudo_attributes(data);
            let get = |name: &str| attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str());
            let href = match get("href") {
                Some(href) if !href.starts_with('#') && get("alternate") != Some("yes") => href,
                _ => {
                    tracing::debug!(data = data.as_str(), "not a style sheet");
                    continue;
                }
            };
            let media = get("media").unwrap_or("all");
            if !self.media_allows(media) {
                continue;
            }
            sheets.extend(self.load(href, document.uri(), media));
        }
        sheets
    }

    /// Sheets from `<link>` and `<style>` elements in document order
    fn element_sheets(&self, document: &Document) -> Vec<StyleSheet> {
        let tree = document.tree();
        tree.descendants(NodeId::ROOT)
            .filter_map(|id| tree.element_ref(id))
            .filter_map(|element| match element.local_name() {
                "link" => self.link_sheet(element, document.uri()),
                "style" => self.style_sheet(element, document.uri()),
                _ => None,
            })
            .collect()
    }

    fn link_sheet(&self, element: ElementRef<'_>, base: Option<&str>) -> Option<StyleSheet> {
        let rel: Vec<String> = element
            .attribute("rel")
            .unwrap_or("")
            .split_ascii_whitespace()
            .map(str::to_ascii_lowercase)
            .collect();
        if !rel.iter().any(|r| r == "stylesheet") || rel.iter().any(|r| r == "alternate") {
            tracing::debug!(rel = ?rel, "not a style sheet");
            return None;
        }
        let href = element.attribute("href").or_else(|| element.attribute("xlink:href"));
        let href = match href {
            Some(href) if !href.is_empty() && !href.starts_with('#') => href,
            _ => {
                tracing::debug!(href = ?href, "invalid style sheet URL");
                return None;
            }
        };
        let media = element.attribute("media").unwrap_or("all");
        if !self.media_allows(media) {
            return None;
        }
        self.load(href, base, media)
    }

    fn style_sheet(&self, element: ElementRef<'_>, base: Option<&str>) -> Option<StyleSheet> {
        let kind = element.attribute("type").unwrap_or("text/css");
        let text = element.text_content();
        if !kind.trim().eq_ignore_ascii_case("text/css") || text.is_empty() {
            tracing::debug!(kind, size = text.len(), "not a style sheet");
            return None;
        }
        let media = element.attribute("media").unwrap_or("all");
        if !self.media_allows(media) {
            return None;
        }
        let mut sheet = self.parser(base).parse(&text).ok()?;
        sheet.media = media.to_string();
        Some(sheet)
    }
}

/// `name="value"` pairs of a processing instruction
fn pseudo_attributes(data: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut rest = data.trim();
    while let Some((name, after)) = rest.split_once('=') {
        let name = name.trim();
        let after = after.trim_start();
        let Some(quote) = after.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            break;
        };
        let Some((value, tail)) = after[1..].split_once(quote) else {
            break;
        };
        attrs.push((name.to_string(), value.to_string()));
        rest = tail.trim_start();
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryLoader, ViewportMedia};

    fn selectors(rules: &[CssRule]) -> Vec<&str> {
        rules
            .iter()
            .filter_map(|r| r.as_style())
            .map(|r| r.selector_text.as_str())
            .collect()
    }

    fn ua_rule_count() -> usize {
        RuleCollector::new().flatten(&CssParser::new().parse(UA_STYLESHEET).unwrap().rules).len()
    }

    #[test]
    fn test_pseudo_attributes() {
        let attrs = pseudo_attributes(r#"href="a.css" type='text/css'  media="print""#);
        assert_eq!(
            attrs,
            vec![
                ("href".to_string(), "a.css".to_string()),
                ("type".to_string(), "text/css".to_string()),
                ("media".to_string(), "print".to_string()),
            ]
        );
    }

    #[test]
    fn test_ua_sheet_comes_first() {
        let doc = Document::parse("<svg><style>rect { fill: red }</style></svg>").unwrap();
        let rules = RuleCollector::new().collect(&doc);
        assert_eq!(rules.len(), ua_rule_count() + 1);
        assert_eq!(selectors(&rules).last(), Some(&"rect"));
        assert!(matches!(rules[0], CssRule::Namespace(_)));
    }

    #[test]
    fn test_media_groups_without_viewport() {
        let doc = Document::parse(
            "<svg><style>@media all { a { fill: red } } @media screen { b { fill: red } } c { fill: red }</style></svg>",
        )
        .unwrap();
        let rules = RuleCollector::new().collect(&doc);
        let found = selectors(&rules);
        assert!(found.contains(&"a"));
        assert!(!found.contains(&"b"));
        assert!(found.contains(&"c"));
    }

    #[test]
    fn test_media_groups_with_viewport() {
        let doc = Document::parse(
            "<svg><style>@media screen { b { fill: red } @media print { p { fill: red } } }</style>\
             <style media=\"print\">x { fill: red }</style></svg>",
        )
        .unwrap();
        let media = ViewportMedia::screen(640.0, 480.0);
        let rules = RuleCollector::new().with_media(&media).collect(&doc);
        let found = selectors(&rules);
        assert!(found.contains(&"b"));
        assert!(!found.contains(&"p"));
        assert!(!found.contains(&"x"));
    }

    #[test]
    fn test_import_flattened_in_place() {
        let loader = MemoryLoader::new().with("inner.css", "i1 { fill: red } i2 { fill: red }");
        let doc = Document::parse("<svg><style>@import 'inner.css'; after { fill: red }</style></svg>").unwrap();
        let rules = RuleCollector::new().with_loader(&loader).collect(&doc);
        let found = selectors(&rules);
        let tail = &found[found.len() - 3..];
        assert_eq!(tail, &["i1", "i2", "after"]);
    }

    #[test]
    fn test_processing_instructions_in_document_order() {
        let loader = MemoryLoader::new()
            .with("http://example.com/a.css", "pa { fill: red }")
            .with("http://example.com/b.css", "pb { fill: red }")
            .with("http://example.com/c.css", "pc { fill: red }");
        let doc = svgstyle_dom::XmlParser::new()
            .parse_with_uri(
                r##"<?xml-stylesheet href="a.css"?>
                   <?xml-stylesheet href="c.css" alternate="yes"?>
                   <?xml-stylesheet href="#inline"?>
                   <?xml-stylesheet href="b.css" media="all"?>
                   <svg><style>el { fill: red }</style></svg>"##,
                Some("http://example.com/doc.svg"),
            )
            .unwrap();
        let rules = RuleCollector::new().with_loader(&loader).collect(&doc);
        let found = selectors(&rules);
        let tail = &found[found.len() - 3..];
        assert_eq!(tail, &["pa", "pb", "el"]);
    }

    #[test]
    fn test_link_elements() {
        let loader = MemoryLoader::new()
            .with("main.css", "main { fill: red }")
            .with("alt.css", "alt { fill: red }");
        let doc = Document::parse(
            r#"<svg xmlns:h="http://www.w3.org/1999/xhtml">
                <h:link rel="stylesheet" href="main.css"/>
                <h:link rel="alternate stylesheet" href="alt.css"/>
                <h:link rel="stylesheet" href="missing.css"/>
                <h:link rel="icon" href="main.css"/>
            </svg>"#,
        )
        .unwrap();
        let rules = RuleCollector::new().with_loader(&loader).collect(&doc);
        let found = selectors(&rules);
        assert!(found.contains(&"main"));
        assert!(!found.contains(&"alt"));
        assert_eq!(rules.len(), ua_rule_count() + 1);
    }

    #[test]
    fn test_style_type_filter() {
        let doc =
            Document::parse(r#"<svg><style type="text/plain">a { fill: red }</style><style/></svg>"#).unwrap();
        let rules = RuleCollector::new().collect(&doc);
        assert_eq!(rules.len(), ua_rule_count());
    }
}
