//! Example: computed style of every element in an SVG file
//!
//! Usage: `cargo run --example resolve -- drawing.svg`
//! Set `RUST_LOG=svgstyle_css=debug` to see skipped rules and sheets.

use std::path::Path;

use anyhow::{Context, Result};
use svgstyle_css::{SheetLoader, StyleResolver, ViewportMedia};
use svgstyle_dom::{NodeId, XmlParser};

/// Loads `file:` style sheets relative to the document
struct FileLoader;

impl SheetLoader for FileLoader {
    fn load(&self, href: &str, base: Option<&str>) -> Option<String> {
        let url = match base {
            Some(base) => url::Url::parse(base).ok()?.join(href).ok()?,
            None => url::Url::parse(href).ok()?,
        };
        let path = url.to_file_path().ok()?;
        std::fs::read_to_string(path).ok()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let path = std::env::args().nth(1).context("usage: resolve <file.svg>")?;
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let absolute = Path::new(&path).canonicalize()?;
    let uri = url::Url::from_file_path(&absolute).ok().map(String::from);

    let document = XmlParser::new().parse_with_uri(&text, uri.as_deref())?;
    let media = ViewportMedia::screen(1024.0, 768.0);
    let resolver = StyleResolver::new().with_media(&media).with_loader(&FileLoader);

    let rules = resolver.collect_rules(&document);
    tracing::info!(rules = rules.len(), "collected style rules");

    let tree = document.tree();
    for id in tree.descendants(NodeId::ROOT) {
        let Some(element) = tree.element_ref(id) else {
            continue;
        };
        let label = match element.attribute("id") {
            Some(name) => format!("{}#{name}", element.local_name()),
            None => element.local_name().to_string(),
        };
        match resolver.computed_style_with_rules(element, &rules) {
            Ok(style) => println!("{label} {{\n{style}}}"),
            Err(err) => println!("{label}: {err}"),
        }
    }
    Ok(())
}
