//! Style resolver
//!
//! Front end wiring the collector, cascade, inheritance and finalizer
//! together. Nothing is cached: every call works from the document as it
//! is now.

use svgstyle_dom::{Document, DomError, ElementRef, NodeId};

use crate::cascade::{CascadeResolver, CascadedStyle};
use crate::collector::RuleCollector;
use crate::computed::ComputedStyle;
use crate::config::StyleConfig;
use crate::finalize::{GeometryProvider, NoGeometry, StyleFinalizer};
use crate::inheritance::{InheritanceResolver, InheritedStyle};
use crate::media::MediaMatcher;
use crate::parser::SheetLoader;
use crate::selectors::{SelectorEngine, SelectorMatcher};
use crate::{CssError, CssRule};

/// Style resolver - computes styles for document elements
pub struct StyleResolver<'a> {
    config: StyleConfig,
    media: Option<&'a dyn MediaMatcher>,
    selector: &'a dyn SelectorMatcher,
    geometry: &'a dyn GeometryProvider,
    loader: Option<&'a dyn SheetLoader>,
}

impl Default for StyleResolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> StyleResolver<'a> {
    pub fn new() -> Self {
        Self {
            config: StyleConfig::default(),
            media: None,
            selector: &SelectorEngine,
            geometry: &NoGeometry,
            loader: None,
        }
    }

    pub fn with_config(mut self, config: StyleConfig) -> Self {
        self.config = config;
        self
    }

    /// Media evaluation; without one only unconditional media apply
    pub fn with_media(mut self, media: &'a dyn MediaMatcher) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_selector_matcher(mut self, selector: &'a dyn SelectorMatcher) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_geometry(mut self, geometry: &'a dyn GeometryProvider) -> Self {
        self.geometry = geometry;
        self
    }

    /// Loader for `@import`, `<link>` and `xml-stylesheet` sheets
    pub fn with_loader(mut self, loader: &'a dyn SheetLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Flattened rules of `document`, user agent sheet first
    pub fn collect_rules(&self, document: &Document) -> Vec<CssRule> {
        let mut collector = RuleCollector::new();
        if let Some(media) = self.media {
            collector = collector.with_media(media);
        }
        if let Some(loader) = self.loader {
            collector = collector.with_loader(loader);
        }
        collector.collect(document)
    }

    /// Declarations applying to `element` itself
    pub fn cascade(&self, document: &Document, element: NodeId) -> Result<CascadedStyle, CssError> {
        let element = element_ref(document, element)?;
        let rules = self.collect_rules(document);
        Ok(CascadeResolver::new(self.selector).cascade(element, &rules))
    }

    /// Inherited and non-inherited properties before value computation
    pub fn inherited_style(&self, document: &Document, element: NodeId) -> Result<InheritedStyle, CssError> {
        let element = element_ref(document, element)?;
        let rules = self.collect_rules(document);
        self.inheritance().resolve(element, &rules)
    }

    /// Computed style of `element`
    pub fn computed_style(&self, document: &Document, element: NodeId) -> Result<ComputedStyle, CssError> {
        let element = element_ref(document, element)?;
        let rules = self.collect_rules(document);
        self.computed_style_with_rules(element, &rules)
    }

    /// Computed style of `element` from already collected `rules`
    pub fn computed_style_with_rules(
        &self,
        element: ElementRef<'_>,
        rules: &[CssRule],
    ) -> Result<ComputedStyle, CssError> {
        tracing::debug!(element = element.local_name(), "resolving style");
        let inherited = self.inheritance().resolve(element, rules)?;
        Ok(StyleFinalizer::new(&self.config, self.geometry).finalize(element, inherited))
    }

    fn inheritance(&self) -> InheritanceResolver<'_> {
        InheritanceResolver::new(CascadeResolver::new(self.selector), &self.config)
    }
}

fn element_ref(document: &Document, id: NodeId) -> Result<ElementRef<'_>, CssError> {
    document.element(id).ok_or(CssError::Dom(DomError::NotAnElement(id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_an_element() {
        let doc = Document::parse("<svg/>").unwrap();
        let err = StyleResolver::new().computed_style(&doc, NodeId::ROOT).unwrap_err();
        assert_eq!(err, CssError::Dom(DomError::NotAnElement(NodeId::ROOT)));
    }

    #[test]
    fn test_ua_sheet_hides_defs() {
        let doc = Document::parse(r#"<svg><defs id="d"><rect id="r"/></defs></svg>"#).unwrap();
        let resolver = StyleResolver::new();
        let rect = doc.get_element_by_id("r").unwrap();
        let style = resolver.computed_style(&doc, rect).unwrap();
        assert_eq!(style.text("display"), Some("none"));
    }

    struct NothingMatches;

    impl SelectorMatcher for NothingMatches {
        fn match_selector(
            &self,
            _selector: &str,
            _element: ElementRef<'_>,
            _namespaces: &crate::NamespaceMap,
        ) -> Result<bool, CssError> {
            Ok(false)
        }
    }

    #[test]
    fn test_custom_selector_matcher() {
        let doc = Document::parse(r#"<svg><style>rect { fill: red }</style><rect id="r"/></svg>"#).unwrap();
        let rect = doc.get_element_by_id("r").unwrap();

        let style = StyleResolver::new().computed_style(&doc, rect).unwrap();
        assert_eq!(style.text("fill"), Some("red"));

        let matcher = NothingMatches;
        let style = StyleResolver::new()
            .with_selector_matcher(&matcher)
            .computed_style(&doc, rect)
            .unwrap();
        assert_eq!(style.text("fill"), Some("black"));
    }
}
