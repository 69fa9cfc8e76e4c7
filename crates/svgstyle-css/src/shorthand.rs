//! Shorthand and list-valued font properties
//!
//! Expansion of `font` and `font-variant` into longhands, plus the parsers
//! for `font-family` and `font-feature-settings`. Invalid input yields an
//! empty expansion rather than an error.

use crate::properties::ComputedValue;

/// Expanded longhands, in a fixed order
pub type Longhands = Vec<(&'static str, ComputedValue)>;

const SYSTEM_FONTS: &[&str] = &["caption", "icon", "menu", "message-box", "small-caption", "status-bar"];

const FONT_WEIGHTS: &[&str] = &[
    "bold", "bolder", "lighter", "100", "200", "300", "400", "500", "600", "700", "800", "900",
];

const FONT_STRETCHES: &[&str] = &[
    "ultra-condensed",
    "extra-condensed",
    "condensed",
    "semi-condensed",
    "semi-expanded",
    "expanded",
    "extra-expanded",
    "ultra-expanded",
];

const LIGATURE_VALUES: &[&str] = &[
    "common-ligatures",
    "no-common-ligatures",
    "discretionary-ligatures",
    "no-discretionary-ligatures",
    "historical-ligatures",
    "no-historical-ligatures",
    "contextual",
    "no-contextual",
];

const ALTERNATE_FUNCTIONS: &[&str] = &["stylistic(", "styleset(", "character-variant(", "swash(", "ornaments(", "annotation("];

const CAPS_VALUES: &[&str] = &[
    "small-caps",
    "all-small-caps",
    "petite-caps",
    "all-petite-caps",
    "unicase",
    "titling-caps",
];

const EAST_ASIAN_VALUES: &[&str] = &[
    "jis78",
    "jis83",
    "jis90",
    "jis04",
    "simplified",
    "traditional",
    "full-width",
    "proportional-width",
    "ruby",
];

const NUMERIC_VALUES: &[&str] = &[
    "lining-nums",
    "oldstyle-nums",
    "proportional-nums",
    "tabular-nums",
    "diagonal-fractions",
    "stacked-fractions",
    "ordinal",
    "slashed-zero",
];

/// Split shell-style: whitespace separates words, quotes group and are
/// removed, backslash escapes the next character outside single quotes.
pub fn split_quoted(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    in_word = true;
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                c => {
                    current.push(c);
                    in_word = true;
                }
            },
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

/// Parse a `font-family` value into family names
pub fn parse_font_family(value: &str) -> Vec<String> {
    if value.contains('"') || value.contains('\'') {
        split_family_items(&split_quoted(value))
    } else {
        split_family_items(&[value.to_string()])
    }
}

fn split_family_items(items: &[String]) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| item.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand the `font` shorthand
///
/// Returns no longhands for system fonts and for values without a size.
/// Longhands the value omits are reset to their initial values.
pub fn parse_font(value: &str) -> Longhands {
    let mut items = split_quoted(value);
    if items.is_empty() || items.iter().any(|item| SYSTEM_FONTS.contains(&item.as_str())) {
        return Longhands::new();
    }

    let mut family = Vec::new();
    if let Some(last) = items.pop() {
        family.push(last);
    }
    let mut delimiter = false;
    while let Some(item) = items.last() {
        if item == "," {
            delimiter = true;
        } else if delimiter || item.ends_with(',') {
            family.insert(0, item.clone());
            delimiter = false;
        } else {
            break;
        }
        items.pop();
    }

    let Some(size) = items.pop() else {
        return Longhands::new();
    };
    let (font_size, line_height) = match size.split_once('/') {
        Some((size, line_height)) => (size.to_string(), line_height.split('/').next().unwrap_or("").to_string()),
        None => (size, "normal".to_string()),
    };

    let mut style = "normal";
    let mut variant = "normal";
    let mut weight = "normal";
    let mut stretch = "normal";
    for item in &items {
        let item = item.as_str();
        if item == "normal" {
            continue;
        } else if item == "italic" || item == "oblique" {
            style = item;
        } else if item == "small-caps" {
            variant = item;
        } else if FONT_WEIGHTS.contains(&item) {
            weight = item;
        } else if FONT_STRETCHES.contains(&item) {
            stretch = item;
        } else {
            break;
        }
    }

    vec![
        ("font-family", ComputedValue::List(split_family_items(&family))),
        ("font-kerning", "auto".into()),
        ("font-language-override", "normal".into()),
        ("font-size", font_size.into()),
        ("font-size-adjust", "none".into()),
        ("font-stretch", stretch.into()),
        ("font-style", style.into()),
        ("font-variant", variant.into()),
        ("font-weight", weight.into()),
        ("line-height", line_height.into()),
    ]
}

/// Expand the `font-variant` shorthand into its six longhands
pub fn parse_font_variant(value: &str) -> Longhands {
    let mut caps = "normal".to_string();
    let mut position = "normal".to_string();
    let mut alternates = Vec::new();
    let mut east_asian = Vec::new();
    let mut ligatures = Vec::new();
    let mut numeric = Vec::new();

    match value {
        "normal" => {}
        "none" => ligatures.push("none".to_string()),
        _ => {
            for item in value.split_whitespace() {
                if LIGATURE_VALUES.contains(&item) {
                    ligatures.push(item.to_string());
                } else if item == "historical-forms" || ALTERNATE_FUNCTIONS.iter().any(|f| item.starts_with(f)) {
                    alternates.push(item.to_string());
                } else if CAPS_VALUES.contains(&item) {
                    caps = item.to_string();
                } else if EAST_ASIAN_VALUES.contains(&item) {
                    east_asian.push(item.to_string());
                } else if NUMERIC_VALUES.contains(&item) {
                    numeric.push(item.to_string());
                } else if item == "sub" || item == "super" {
                    position = item.to_string();
                }
            }
        }
    }

    vec![
        ("font-variant-alternates", or_normal(alternates)),
        ("font-variant-caps", caps.into()),
        ("font-variant-east-asian", or_normal(east_asian)),
        ("font-variant-ligatures", or_normal(ligatures)),
        ("font-variant-numeric", or_normal(numeric)),
        ("font-variant-position", position.into()),
    ]
}

fn or_normal(mut items: Vec<String>) -> ComputedValue {
    if items.is_empty() {
        items.push("normal".to_string());
    }
    ComputedValue::List(items)
}

/// Parse `font-feature-settings` into (tag, value) pairs
///
/// A repeated tag keeps its first position and takes the later value.
pub fn parse_font_feature_settings(value: &str) -> Vec<(String, u32)> {
    let mut features: Vec<(String, u32)> = Vec::new();
    if value == "normal" {
        return features;
    }
    for setting in value.split(',') {
        let mut items = setting.split_whitespace();
        let Some(tag) = items.next() else {
            continue;
        };
        let tag = strip_quotes(tag);
        if tag.chars().count() != 4 || !tag.chars().all(|c| (' '..='~').contains(&c)) {
            continue;
        }
        let switch = match items.next() {
            None => 1,
            Some("on") => 1,
            Some("off") => 0,
            Some(n) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => match n.parse() {
                Ok(n) => n,
                Err(_) => continue,
            },
            Some(_) => continue,
        };
        match features.iter_mut().find(|(t, _)| t == tag) {
            Some(existing) => existing.1 = switch,
            None => features.push((tag.to_string(), switch)),
        }
    }
    features
}

fn strip_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 && bytes[0] == bytes[bytes.len() - 1] && (bytes[0] == b'"' || bytes[0] == b'\'') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(longhands: &'a Longhands, name: &str) -> Option<&'a ComputedValue> {
        longhands.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    fn list(items: &[&str]) -> ComputedValue {
        ComputedValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_split_quoted() {
        assert_eq!(split_quoted(r#"12px "Times New Roman", serif"#), vec!["12px", "Times New Roman,", "serif"]);
        assert_eq!(split_quoted("  a  'b c'd "), vec!["a", "b cd"]);
        assert!(split_quoted("   ").is_empty());
    }

    #[test]
    fn test_font_family() {
        assert_eq!(parse_font_family("Arial, sans-serif"), vec!["Arial", "sans-serif"]);
        assert_eq!(
            parse_font_family(r#""Noto Sans", 'DejaVu Sans',serif"#),
            vec!["Noto Sans", "DejaVu Sans", "serif"]
        );
        assert!(parse_font_family(" , ").is_empty());
    }

    #[test]
    fn test_font_shorthand_full() {
        let font = parse_font(r#"italic small-caps bold condensed 16px/2 "Helvetica Neue", Arial, sans-serif"#);
        assert_eq!(get(&font, "font-style"), Some(&ComputedValue::from("italic")));
        assert_eq!(get(&font, "font-variant"), Some(&ComputedValue::from("small-caps")));
        assert_eq!(get(&font, "font-weight"), Some(&ComputedValue::from("bold")));
        assert_eq!(get(&font, "font-stretch"), Some(&ComputedValue::from("condensed")));
        assert_eq!(get(&font, "font-size"), Some(&ComputedValue::from("16px")));
        assert_eq!(get(&font, "line-height"), Some(&ComputedValue::from("2")));
        assert_eq!(get(&font, "font-family"), Some(&list(&["Helvetica Neue", "Arial", "sans-serif"])));
    }

    #[test]
    fn test_font_shorthand_defaults() {
        let font = parse_font("12pt serif");
        assert_eq!(font.len(), 10);
        assert_eq!(get(&font, "font-style"), Some(&ComputedValue::from("normal")));
        assert_eq!(get(&font, "line-height"), Some(&ComputedValue::from("normal")));
        assert_eq!(get(&font, "font-kerning"), Some(&ComputedValue::from("auto")));
        assert_eq!(get(&font, "font-family"), Some(&list(&["serif"])));
    }

    #[test]
    fn test_font_shorthand_separate_commas() {
        let font = parse_font("10px a , b");
        assert_eq!(get(&font, "font-family"), Some(&list(&["a", "b"])));
        assert_eq!(get(&font, "font-size"), Some(&ComputedValue::from("10px")));
    }

    #[test]
    fn test_font_shorthand_invalid() {
        assert!(parse_font("").is_empty());
        assert!(parse_font("caption").is_empty());
        assert!(parse_font("bold menu").is_empty());
        assert!(parse_font("serif").is_empty());
    }

    #[test]
    fn test_font_variant_keywords() {
        let variant = parse_font_variant("small-caps slashed-zero common-ligatures jis78 sub styleset(a)");
        assert_eq!(get(&variant, "font-variant-caps"), Some(&ComputedValue::from("small-caps")));
        assert_eq!(get(&variant, "font-variant-numeric"), Some(&list(&["slashed-zero"])));
        assert_eq!(get(&variant, "font-variant-ligatures"), Some(&list(&["common-ligatures"])));
        assert_eq!(get(&variant, "font-variant-east-asian"), Some(&list(&["jis78"])));
        assert_eq!(get(&variant, "font-variant-position"), Some(&ComputedValue::from("sub")));
        assert_eq!(get(&variant, "font-variant-alternates"), Some(&list(&["styleset(a)"])));
    }

    #[test]
    fn test_font_variant_none() {
        let variant = parse_font_variant("none");
        assert_eq!(get(&variant, "font-variant-ligatures"), Some(&list(&["none"])));
        assert_eq!(get(&variant, "font-variant-numeric"), Some(&list(&["normal"])));
        assert_eq!(get(&variant, "font-variant-caps"), Some(&ComputedValue::from("normal")));
    }

    #[test]
    fn test_font_feature_settings() {
        assert!(parse_font_feature_settings("normal").is_empty());
        assert_eq!(
            parse_font_feature_settings(r#""liga" 0, 'dlig', "smcp" on, "swsh" 2, "kern" off"#),
            vec![
                ("liga".to_string(), 0),
                ("dlig".to_string(), 1),
                ("smcp".to_string(), 1),
                ("swsh".to_string(), 2),
                ("kern".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_font_feature_settings_invalid_items() {
        assert_eq!(
            parse_font_feature_settings(r#""toolong" 1, "liga" maybe, , "c2sc" -1, "liga" 3"#),
            vec![("liga".to_string(), 3)]
        );
    }
}
