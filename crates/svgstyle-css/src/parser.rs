//! CSS Parser
//!
//! Built on the `cssparser` tokenizer. Values are kept as source text (only
//! whitespace and comments are normalized), so later stages see exactly what
//! the author wrote. Invalid rules and declarations are skipped with a debug
//! event, following CSS error recovery.

use std::collections::HashMap;

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, Delimiter, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser, parse_important,
};
use url::Url;

use crate::{
    CssError, CssRule, Declaration, FontFaceRule, FontFeatureValuesRule, ImportRule, MediaRule, NamespaceRule,
    StyleRule, StyleSheet, merge_declaration,
};

/// Nesting limit for `@import` chains
pub const MAX_IMPORT_DEPTH: usize = 16;

/// Source of external style sheet text
pub trait SheetLoader {
    /// Text of the sheet `href` refers to, resolved against `base`, or None
    /// if it cannot be obtained
    fn load(&self, href: &str, base: Option<&str>) -> Option<String>;
}

/// Loader backed by an in-memory table
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    sheets: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: &str, css: &str) {
        self.sheets.insert(url.to_string(), css.to_string());
    }

    pub fn with(mut self, url: &str, css: &str) -> Self {
        self.insert(url, css);
        self
    }
}

impl SheetLoader for MemoryLoader {
    fn load(&self, href: &str, base: Option<&str>) -> Option<String> {
        self.sheets
            .get(&resolve_href(href, base))
            .or_else(|| self.sheets.get(href))
            .cloned()
    }
}

/// Resolve `href` against an optional base URL
pub(crate) fn resolve_href(href: &str, base: Option<&str>) -> String {
    base.and_then(|b| Url::parse(b).ok())
        .and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}

/// CSS Parser
#[derive(Clone, Copy, Default)]
pub struct CssParser<'a> {
    loader: Option<&'a dyn SheetLoader>,
    base: Option<&'a str>,
}

impl CssParser<'static> {
    /// Parser that leaves `@import` sheets unloaded
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'a> CssParser<'a> {
    /// Parser that loads `@import` sheets through `loader`
    pub fn with_loader(loader: &'a dyn SheetLoader) -> Self {
        Self {
            loader: Some(loader),
            base: None,
        }
    }

    /// Base URL for relative `@import` references
    pub fn base_url(mut self, base: Option<&'a str>) -> Self {
        self.base = base;
        self
    }

    /// Parse a style sheet
    pub fn parse(&self, css: &str) -> Result<StyleSheet, CssError> {
        Ok(self.parse_at_depth(css, 0))
    }

    /// Parse exactly one rule
    pub fn parse_rule(&self, css: &str) -> Result<CssRule, CssError> {
        let mut sheet = self.parse_at_depth(css, 0);
        if sheet.rules.len() != 1 {
            return Err(CssError::ParseError {
                line: 1,
                message: format!("expected one rule, found {}", sheet.rules.len()),
            });
        }
        sheet.rules.pop().ok_or_else(|| CssError::ParseError {
            line: 1,
            message: "empty rule".to_string(),
        })
    }

    fn parse_at_depth(&self, css: &str, depth: usize) -> StyleSheet {
        let mut input = ParserInput::new(css);
        let mut input = Parser::new(&mut input);
        let mut rule_parser = RuleParser { parser: *self, depth };
        StyleSheet {
            rules: parse_rule_list(&mut input, &mut rule_parser),
            href: None,
            media: String::new(),
        }
    }

    fn load_import(&self, href: &str, media: &str, depth: usize) -> Option<Box<StyleSheet>> {
        if depth + 1 >= MAX_IMPORT_DEPTH {
            tracing::debug!(href, "import depth limit reached");
            return None;
        }
        let Some(loader) = self.loader else {
            tracing::debug!(href, "no sheet loader, import skipped");
            return None;
        };
        let url = resolve_href(href, self.base);
        let Some(text) = loader.load(href, self.base) else {
            tracing::debug!(url = url.as_str(), "unreachable style sheet");
            return None;
        };
        let nested = CssParser {
            loader: self.loader,
            base: Some(url.as_str()),
        };
        let mut sheet = nested.parse_at_depth(&text, depth + 1);
        sheet.href = Some(url.clone());
        sheet.media = media.to_string();
        Some(Box::new(sheet))
    }
}

/// Parse a `style` attribute into declarations
pub fn parse_style_attribute(text: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(text);
    let mut input = Parser::new(&mut input);
    parse_declaration_block(&mut input)
}

fn parse_rule_list<'i>(input: &mut Parser<'i, '_>, rule_parser: &mut RuleParser<'_>) -> Vec<CssRule> {
    let mut rules = Vec::new();
    for result in StyleSheetParser::new(input, rule_parser) {
        match result {
            Ok(rule) => rules.push(rule),
            Err((err, slice)) => {
                tracing::debug!(line = err.location.line + 1, "skipping invalid rule: {}", slice.trim());
            }
        }
    }
    rules
}

fn parse_declaration_block<'i>(input: &mut Parser<'i, '_>) -> Vec<Declaration> {
    let mut parser = DeclarationListParser;
    let mut declarations = Vec::new();
    for result in RuleBodyParser::new(input, &mut parser) {
        match result {
            Ok(declaration) => merge_declaration(&mut declarations, declaration),
            Err((err, slice)) => {
                tracing::debug!(line = err.location.line + 1, "skipping invalid declaration: {}", slice.trim());
            }
        }
    }
    declarations
}

/// Rest of the current block as normalized text
fn remaining_text<'i>(input: &mut Parser<'i, '_>) -> String {
    let start = input.position();
    while input.next().is_ok() {}
    normalize(input.slice_from(start))
}

/// Drop comments and collapse whitespace outside of quoted strings
pub(crate) fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut prev = '\0';
            for c in chars.by_ref() {
                if prev == '*' && c == '/' {
                    break;
                }
                prev = c;
            }
            pending_space = true;
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        if c == '"' || c == '\'' {
            quote = Some(c);
        }
        out.push(c);
    }
    out
}

enum AtPrelude {
    Import { href: String, media: String },
    Media(String),
    FontFace,
    FontFeatureValues(String),
    Namespace { prefix: Option<String>, uri: String },
}

struct RuleParser<'a> {
    parser: CssParser<'a>,
    depth: usize,
}

impl<'i> QualifiedRuleParser<'i> for RuleParser<'_> {
    type Prelude = String;
    type QualifiedRule = CssRule;
    type Error = ();

    fn parse_prelude<'t>(&mut self, input: &mut Parser<'i, 't>) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let selector = remaining_text(input);
        if selector.is_empty() {
            return Err(input.new_custom_error(()));
        }
        Ok(selector)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Ok(CssRule::Style(StyleRule {
            selector_text: prelude,
            declarations: parse_declaration_block(input),
        }))
    }
}

impl<'i> AtRuleParser<'i> for RuleParser<'_> {
    type Prelude = AtPrelude;
    type AtRule = CssRule;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        match name.to_ascii_lowercase().as_str() {
            "import" => {
                let href = input.expect_url_or_string()?.as_ref().to_string();
                Ok(AtPrelude::Import {
                    href,
                    media: remaining_text(input),
                })
            }
            "media" => Ok(AtPrelude::Media(remaining_text(input))),
            "font-face" => Ok(AtPrelude::FontFace),
            "font-feature-values" => Ok(AtPrelude::FontFeatureValues(remaining_text(input))),
            "namespace" => {
                let prefix = input
                    .try_parse(|i| i.expect_ident_cloned())
                    .ok()
                    .map(|p| p.as_ref().to_string());
                let uri = input.expect_url_or_string()?.as_ref().to_string();
                input.expect_exhausted()?;
                Ok(AtPrelude::Namespace { prefix, uri })
            }
            _ => {
                tracing::debug!(rule = name.as_ref(), "unsupported at-rule");
                Err(input.new_custom_error(()))
            }
        }
    }

    fn rule_without_block(&mut self, prelude: Self::Prelude, _start: &ParserState) -> Result<Self::AtRule, ()> {
        match prelude {
            AtPrelude::Import { href, media } => {
                let sheet = self.parser.load_import(&href, &media, self.depth);
                Ok(CssRule::Import(ImportRule { href, media, sheet }))
            }
            AtPrelude::Namespace { prefix, uri } => Ok(CssRule::Namespace(NamespaceRule { prefix, uri })),
            _ => Err(()),
        }
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        match prelude {
            AtPrelude::Media(media) => {
                let mut nested = RuleParser {
                    parser: self.parser,
                    depth: self.depth,
                };
                let rules = parse_rule_list(input, &mut nested);
                Ok(CssRule::Media(MediaRule { media, rules }))
            }
            AtPrelude::FontFace => Ok(CssRule::FontFace(FontFaceRule {
                declarations: parse_declaration_block(input),
            })),
            AtPrelude::FontFeatureValues(font_family) => Ok(CssRule::FontFeatureValues(FontFeatureValuesRule {
                font_family,
                body: remaining_text(input),
            })),
            AtPrelude::Import { .. } | AtPrelude::Namespace { .. } => Err(input.new_custom_error(())),
        }
    }
}

struct DeclarationListParser;

impl<'i> DeclarationParser<'i> for DeclarationListParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        input.parse_until_before(Delimiter::Bang, |input| {
            while input.next().is_ok() {}
            Ok::<(), ParseError<'i, ()>>(())
        })?;
        let value = normalize(input.slice_from(start));
        let important = input.try_parse(parse_important).is_ok();
        input.expect_exhausted()?;
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }

        let property = if name.starts_with("--") {
            name.as_ref().to_string()
        } else {
            name.to_ascii_lowercase()
        };
        Ok(Declaration {
            property,
            value,
            important,
        })
    }
}

impl<'i> AtRuleParser<'i> for DeclarationListParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();
}

impl<'i> RuleBodyItemParser<'i, Declaration, ()> for DeclarationListParser {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let sheet = CssParser::new().parse("").unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_values_keep_source_text() {
        let sheet = CssParser::new()
            .parse("rect { fill : blue ; stroke-dasharray: 5,  10 /* gap */ 2; font-family: 'Times  New Roman', serif }")
            .unwrap();
        let rule = sheet.rules[0].as_style().unwrap();
        assert_eq!(rule.selector_text, "rect");
        assert_eq!(rule.get("fill").unwrap().value, "blue");
        assert_eq!(rule.get("stroke-dasharray").unwrap().value, "5, 10 2");
        assert_eq!(rule.get("font-family").unwrap().value, "'Times  New Roman', serif");
    }

    #[test]
    fn test_important_flag() {
        let decls = parse_style_attribute("fill: red !important; stroke: blue ! important; opacity: .5");
        assert_eq!(decls.len(), 3);
        assert!(decls[0].important);
        assert!(decls[1].important);
        assert!(!decls[2].important);
        assert_eq!(decls[0].value, "red");
    }

    #[test]
    fn test_invalid_declarations_are_skipped() {
        let decls = parse_style_attribute("fill:; : red; stroke: blue; FILL-OPACITY: 0.5");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "stroke");
        assert_eq!(decls[1].property, "fill-opacity");
    }

    #[test]
    fn test_repeated_property_replaces_in_place() {
        let decls = parse_style_attribute("fill: red; stroke: blue; fill: green");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0], Declaration::new("fill", "green", false));
    }

    #[test]
    fn test_media_and_namespace_rules() {
        let sheet = CssParser::new()
            .parse(
                "@namespace svg url(http://www.w3.org/2000/svg);
                 @media print and (min-width: 100px) { rect { fill: red } g { fill: blue } }
                 @font-face { font-family: Foo; src: url(foo.woff) }
                 @font-feature-values Font One { @styleset { nice-style: 12; } }
                 @keyframes spin { from { opacity: 0 } }",
            )
            .unwrap();
        assert_eq!(sheet.len(), 4);
        assert_eq!(sheet.namespaces().get("svg").map(String::as_str), Some("http://www.w3.org/2000/svg"));
        match &sheet.rules[1] {
            CssRule::Media(media) => {
                assert_eq!(media.media, "print and (min-width: 100px)");
                assert_eq!(media.rules.len(), 2);
            }
            other => panic!("expected media rule, got {:?}", other.kind()),
        }
        match &sheet.rules[3] {
            CssRule::FontFeatureValues(ffv) => assert_eq!(ffv.font_family, "Font One"),
            other => panic!("expected font-feature-values, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_import_through_loader() {
        let loader = MemoryLoader::new()
            .with("http://example.com/css/a.css", "@import 'b.css'; rect { fill: red }")
            .with("http://example.com/css/b.css", "circle { fill: blue }");
        let sheet = CssParser::with_loader(&loader)
            .base_url(Some("http://example.com/doc.svg"))
            .parse("@import url(css/a.css) screen;")
            .unwrap();
        let CssRule::Import(import) = &sheet.rules[0] else {
            panic!("expected import");
        };
        assert_eq!(import.media, "screen");
        let imported = import.sheet.as_ref().unwrap();
        assert_eq!(imported.href.as_deref(), Some("http://example.com/css/a.css"));
        let CssRule::Import(nested) = &imported.rules[0] else {
            panic!("expected nested import");
        };
        assert_eq!(nested.sheet.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_cyclic_import_terminates() {
        let loader = MemoryLoader::new().with("loop.css", "@import 'loop.css'; rect { fill: red }");
        let sheet = CssParser::with_loader(&loader).parse("@import 'loop.css';").unwrap();
        let mut depth = 0;
        let mut current = &sheet;
        while let Some(CssRule::Import(import)) = current.rules.first() {
            match &import.sheet {
                Some(next) => {
                    current = next;
                    depth += 1;
                }
                None => break,
            }
        }
        assert!(depth < MAX_IMPORT_DEPTH);
    }

    #[test]
    fn test_unreachable_import_has_no_sheet() {
        let sheet = CssParser::new().parse("@import 'missing.css';").unwrap();
        let CssRule::Import(import) = &sheet.rules[0] else {
            panic!("expected import");
        };
        assert!(import.sheet.is_none());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  a \n\t b  "), "a b");
        assert_eq!(normalize("'x  y' /*c*/ z"), "'x  y' z");
    }
}
