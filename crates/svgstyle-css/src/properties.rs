//! SVG Property Tables
//!
//! Classification of the presentation properties into inherited and
//! non-inherited sets, with their initial values, and the value type the
//! resolver produces.

use std::fmt;

/// Initial value of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initial {
    /// No initial value; the property is only present when declared
    None,
    Text(&'static str),
    List(&'static [&'static str]),
}

const NORMAL_LIST: &[&str] = &["normal"];

/// Non-inherited properties; never looked up on ancestors
pub static NON_INHERITED: &[(&str, &str)] = &[
    ("alignment-baseline", "baseline"),
    ("baseline-shift", "0"),
    ("clip", "auto"),
    ("clip-path", "none"),
    ("display", "inline"),
    ("dominant-baseline", "auto"),
    ("filter", "none"),
    ("flood-color", "black"),
    ("flood-opacity", "1"),
    ("inline-size", "0"),
    ("lighting-color", "white"),
    ("mask", "no"),
    ("opacity", "1"),
    ("overflow", "visible"),
    ("stop-color", "black"),
    ("stop-opacity", "1"),
    ("text-decoration", "none"),
    ("transform", "none"),
    ("unicode-bidi", "normal"),
    ("vector-effect", "none"),
];

/// Inherited properties, in resolution order
pub static INHERITED: &[(&str, Initial)] = &[
    ("clip-rule", Initial::Text("nonzero")),
    ("color", Initial::Text("black")),
    ("color-interpolation", Initial::Text("sRGB")),
    ("color-rendering", Initial::Text("auto")),
    ("cursor", Initial::Text("auto")),
    ("direction", Initial::Text("ltr")),
    ("fill", Initial::Text("black")),
    ("fill-opacity", Initial::Text("1")),
    ("fill-rule", Initial::Text("nonzero")),
    ("font", Initial::None),
    ("font-family", Initial::None),
    ("font-feature-settings", Initial::Text("normal")),
    ("font-kerning", Initial::Text("auto")),
    ("font-language-override", Initial::Text("normal")),
    ("font-size", Initial::Text("medium")),
    ("font-size-adjust", Initial::Text("none")),
    ("font-stretch", Initial::Text("normal")),
    ("font-style", Initial::Text("normal")),
    ("font-synthesis", Initial::Text("weight style")),
    ("font-variant", Initial::Text("normal")),
    ("font-variant-alternates", Initial::List(NORMAL_LIST)),
    ("font-variant-caps", Initial::Text("normal")),
    ("font-variant-east-asian", Initial::List(NORMAL_LIST)),
    ("font-variant-ligatures", Initial::List(NORMAL_LIST)),
    ("font-variant-numeric", Initial::List(NORMAL_LIST)),
    ("font-variant-position", Initial::Text("normal")),
    ("font-weight", Initial::Text("normal")),
    ("image-rendering", Initial::Text("auto")),
    ("lang", Initial::None),
    ("letter-spacing", Initial::Text("normal")),
    ("line-height", Initial::Text("normal")),
    ("marker", Initial::None),
    ("marker-end", Initial::Text("none")),
    ("marker-mid", Initial::Text("none")),
    ("marker-start", Initial::Text("none")),
    ("paint-order", Initial::Text("normal")),
    ("pointer-events", Initial::Text("visiblePainted")),
    ("shape-rendering", Initial::Text("auto")),
    ("stroke", Initial::Text("none")),
    ("stroke-dasharray", Initial::Text("none")),
    ("stroke-dashoffset", Initial::Text("0")),
    ("stroke-linecap", Initial::Text("butt")),
    ("stroke-linejoin", Initial::Text("miter")),
    ("stroke-miterlimit", Initial::Text("4")),
    ("stroke-opacity", Initial::Text("1")),
    ("stroke-width", Initial::Text("1")),
    ("tab-size", Initial::Text("8")),
    ("text-anchor", Initial::Text("start")),
    ("text-orientation", Initial::Text("mixed")),
    ("text-rendering", Initial::Text("auto")),
    ("visibility", Initial::Text("visible")),
    ("white-space", Initial::Text("normal")),
    ("word-spacing", Initial::Text("normal")),
    ("writing-mode", Initial::Text("horizontal-tb")),
    ("xml:lang", Initial::None),
];

/// Longhands reset by the `font` shorthand
pub const FONT_LONGHANDS: &[&str] = &[
    "font-style",
    "font-variant",
    "font-weight",
    "font-stretch",
    "font-size",
    "line-height",
    "font-size-adjust",
    "font-kerning",
    "font-language-override",
    "font-family",
];

/// Longhands of the `font-variant` shorthand
pub const FONT_VARIANT_LONGHANDS: &[&str] = &[
    "font-variant-alternates",
    "font-variant-caps",
    "font-variant-east-asian",
    "font-variant-ligatures",
    "font-variant-numeric",
    "font-variant-position",
];

/// Longhands whose value is a whitespace-separated keyword list
pub const LIST_VALUED: &[&str] = &[
    "font-variant-alternates",
    "font-variant-east-asian",
    "font-variant-ligatures",
    "font-variant-numeric",
];

pub fn is_inherited(name: &str) -> bool {
    INHERITED.iter().any(|(n, _)| *n == name)
}

pub fn is_non_inherited(name: &str) -> bool {
    NON_INHERITED.iter().any(|(n, _)| *n == name)
}

/// Initial value of a known property
pub fn initial_value(name: &str) -> Option<ComputedValue> {
    if let Some((_, v)) = NON_INHERITED.iter().find(|(n, _)| *n == name) {
        return Some(ComputedValue::from(*v));
    }
    INHERITED
        .iter()
        .find(|(n, _)| *n == name)
        .and_then(|(_, initial)| initial.to_value())
}

impl Initial {
    pub fn to_value(&self) -> Option<ComputedValue> {
        match self {
            Initial::None => None,
            Initial::Text(v) => Some(ComputedValue::from(*v)),
            Initial::List(items) => Some(ComputedValue::List(items.iter().map(|s| s.to_string()).collect())),
        }
    }
}

/// Resolved property value
#[derive(Debug, Clone, PartialEq)]
pub enum ComputedValue {
    /// Keyword or unresolved value text
    Text(String),
    /// Keyword list (font families, variant keywords, synthesis)
    List(Vec<String>),
    /// Resolved number (px lengths, weights, ratios)
    Number(f64),
    /// OpenType feature tags with values
    Features(Vec<(String, u32)>),
}

impl ComputedValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ComputedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ComputedValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ComputedValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_features(&self) -> Option<&[(String, u32)]> {
        match self {
            ComputedValue::Features(f) => Some(f),
            _ => None,
        }
    }

    /// True for the keyword `keyword`
    pub fn is(&self, keyword: &str) -> bool {
        self.as_text() == Some(keyword)
    }
}

impl From<&str> for ComputedValue {
    fn from(value: &str) -> Self {
        ComputedValue::Text(value.to_string())
    }
}

impl From<String> for ComputedValue {
    fn from(value: String) -> Self {
        ComputedValue::Text(value)
    }
}

impl From<f64> for ComputedValue {
    fn from(value: f64) -> Self {
        ComputedValue::Number(value)
    }
}

impl From<Vec<String>> for ComputedValue {
    fn from(value: Vec<String>) -> Self {
        ComputedValue::List(value)
    }
}

impl fmt::Display for ComputedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputedValue::Text(s) => f.write_str(s),
            ComputedValue::List(items) => f.write_str(&items.join(" ")),
            ComputedValue::Number(n) => write!(f, "{}", n),
            ComputedValue::Features(features) => {
                if features.is_empty() {
                    return f.write_str("normal");
                }
                let items: Vec<String> = features.iter().map(|(tag, v)| format!("\"{}\" {}", tag, v)).collect();
                f.write_str(&items.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes() {
        assert_eq!(NON_INHERITED.len(), 20);
        assert_eq!(INHERITED.len(), 55);
    }

    #[test]
    fn test_tables_are_disjoint() {
        for (name, _) in NON_INHERITED {
            assert!(!is_inherited(name), "{} in both tables", name);
        }
    }

    #[test]
    fn test_initial_values() {
        assert_eq!(initial_value("display"), Some(ComputedValue::from("inline")));
        assert_eq!(initial_value("fill"), Some(ComputedValue::from("black")));
        assert_eq!(initial_value("font-family"), None);
        assert_eq!(
            initial_value("font-variant-numeric"),
            Some(ComputedValue::List(vec!["normal".to_string()]))
        );
        assert_eq!(initial_value("x"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ComputedValue::List(vec!["a".into(), "b".into()]).to_string(), "a b");
        assert_eq!(ComputedValue::Number(1.5).to_string(), "1.5");
        assert_eq!(ComputedValue::Features(vec![("liga".into(), 0)]).to_string(), "\"liga\" 0");
    }
}
