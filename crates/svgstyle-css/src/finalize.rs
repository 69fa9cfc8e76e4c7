//! Computed value pass
//!
//! Turns the inherited property map into computed values: font sizes and
//! weights become numbers, `line-height` and other lengths are resolved to
//! px, keyword lists are filtered. Element-specific geometry from the
//! [`GeometryProvider`] is laid over the result.

use std::collections::BTreeMap;

use svgstyle_dom::ElementRef;

use crate::cascade::CascadedStyle;
use crate::computed::ComputedStyle;
use crate::config::StyleConfig;
use crate::inheritance::InheritedStyle;
use crate::properties::ComputedValue;
use crate::shorthand::{parse_font, parse_font_feature_settings};
use crate::units::{Direction, Length, LengthContext, LengthUnit, parse_number};

/// Element geometry port
pub trait GeometryProvider {
    /// Computed geometry properties of `element` (e.g. `x`, `width`)
    fn computed_geometry(&self, element: ElementRef<'_>) -> BTreeMap<String, ComputedValue>;
}

/// Provider without any geometry
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeometry;

impl GeometryProvider for NoGeometry {
    fn computed_geometry(&self, _element: ElementRef<'_>) -> BTreeMap<String, ComputedValue> {
        BTreeMap::new()
    }
}

const FONT_SIZE_KEYWORDS: &[&str] = &[
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "xxx-large",
];

const FONT_SIZE_SCALE: [f64; 8] = [3.0 / 5.0, 3.0 / 4.0, 8.0 / 9.0, 1.0, 6.0 / 5.0, 3.0 / 2.0, 2.0, 3.0];

/// Keyword sizes for `medium` between 9 and 16 px
const FONT_SIZE_QUIRKS: [[f64; 8]; 8] = [
    [9.0, 9.0, 9.0, 9.0, 11.0, 14.0, 18.0, 28.0],
    [9.0, 9.0, 9.0, 10.0, 11.0, 14.0, 18.0, 31.0],
    [9.0, 9.0, 9.0, 11.0, 13.0, 17.0, 22.0, 34.0],
    [9.0, 9.0, 10.0, 12.0, 14.0, 18.0, 24.0, 37.0],
    [9.0, 9.0, 10.0, 13.0, 16.0, 20.0, 26.0, 40.0],
    [9.0, 9.0, 11.0, 14.0, 17.0, 21.0, 28.0, 42.0],
    [9.0, 10.0, 12.0, 15.0, 17.0, 23.0, 30.0, 45.0],
    [9.0, 10.0, 13.0, 16.0, 18.0, 24.0, 32.0, 48.0],
];

const FONT_SIZE_STEP: f64 = 1.2;

const WEIGHTS: [f64; 9] = [100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0, 800.0, 900.0];
const BOLDER: [f64; 9] = [400.0, 400.0, 400.0, 700.0, 700.0, 900.0, 900.0, 900.0, 900.0];
const LIGHTER: [f64; 9] = [100.0, 100.0, 100.0, 100.0, 100.0, 400.0, 400.0, 700.0, 700.0];

const HORIZONTAL_WRITING_MODES: &[&str] = &["horizontal-tb", "lr", "lr-tb", "rl", "rl-tb"];

/// Computes final values from an [`InheritedStyle`]
#[derive(Clone, Copy)]
pub struct StyleFinalizer<'a> {
    config: &'a StyleConfig,
    geometry: &'a dyn GeometryProvider,
}

impl<'a> StyleFinalizer<'a> {
    pub fn new(config: &'a StyleConfig, geometry: &'a dyn GeometryProvider) -> Self {
        Self { config, geometry }
    }

    pub fn finalize(&self, element: ElementRef<'_>, inherited: InheritedStyle) -> ComputedStyle {
        let InheritedStyle { mut values, levels } = inherited;

        let features = values
            .get("font-feature-settings")
            .map(|v| parse_font_feature_settings(&v.to_string()))
            .unwrap_or_default();
        values.insert("font-feature-settings".into(), ComputedValue::Features(features));

        let (font_size, root_font_size) = self.font_sizes(&levels);
        values.insert("font-size".into(), ComputedValue::Number(font_size));

        if let Some(adjust) = values.get("font-size-adjust").and_then(ComputedValue::as_text) {
            if let Some(number) = parse_number(adjust) {
                values.insert("font-size-adjust".into(), ComputedValue::Number(number));
            }
        }

        if let Some(synthesis) = values.get("font-synthesis").map(ComputedValue::to_string) {
            values.insert("font-synthesis".into(), ComputedValue::List(font_synthesis(&synthesis)));
        }

        let weight = self.font_weight(&levels);
        values.insert("font-weight".into(), ComputedValue::Number(weight));

        let (viewport_width, viewport_height) = self.viewport(element);
        let context = LengthContext {
            font_size,
            root_font_size,
            viewport_width,
            viewport_height,
            dpi: self.config.dpi,
        };

        if let Some(line_height) = values.get("line-height").and_then(ComputedValue::as_text) {
            if let Some(px) = line_height_px(line_height, &context) {
                values.insert("line-height".into(), ComputedValue::Number(px));
            }
        }

        let writing_mode = values.get("writing-mode").and_then(ComputedValue::as_text).unwrap_or("horizontal-tb");
        let inline_direction = if HORIZONTAL_WRITING_MODES.contains(&writing_mode) {
            Direction::Horizontal
        } else {
            Direction::Vertical
        };
        for (property, direction) in [
            ("inline-size", inline_direction),
            ("stroke-width", Direction::Other),
            ("tab-size", Direction::Other),
        ] {
            let px = values
                .get(property)
                .and_then(ComputedValue::as_text)
                .and_then(Length::parse)
                .map(|length| length.to_px(&context, direction));
            if let Some(px) = px {
                values.insert(property.into(), ComputedValue::Number(px));
            }
        }

        values.extend(self.geometry.computed_geometry(element));
        ComputedStyle::from(values)
    }

    /// Font sizes in px of the element and of the document element
    ///
    /// Resolved from the document element down; `rem` on the document
    /// element itself refers to the configured default size.
    fn font_sizes(&self, levels: &[CascadedStyle]) -> (f64, f64) {
        let mut root = self.config.default_font_size;
        let mut size = root;
        for (depth, level) in levels.iter().rev().enumerate() {
            if let Some(value) = declared_font_property(level, "font-size") {
                size = self.resolve_font_size(&value, size, root);
            }
            if depth == 0 {
                root = size;
            }
        }
        let minimum = self.config.minimum_font_size;
        (size.max(minimum), root.max(minimum))
    }

    fn resolve_font_size(&self, value: &str, parent: f64, root: f64) -> f64 {
        if let Some(index) = FONT_SIZE_KEYWORDS.iter().position(|k| *k == value) {
            let medium = self.config.default_font_size;
            if (9.0..=16.0).contains(&medium) && medium.fract() == 0.0 {
                return FONT_SIZE_QUIRKS[medium as usize - 9][index];
            }
            return medium * FONT_SIZE_SCALE[index];
        }
        match value {
            "larger" => return parent * FONT_SIZE_STEP,
            "smaller" => return parent / FONT_SIZE_STEP,
            _ => {}
        }
        let Some(length) = Length::parse(value) else {
            tracing::debug!(value, "invalid font size");
            return parent;
        };
        match length.unit {
            LengthUnit::Percent => length.value / 100.0 * parent,
            _ => {
                let context = LengthContext {
                    root_font_size: root,
                    ..self.config.length_context().with_font_size(parent)
                };
                length.to_px(&context, Direction::Other)
            }
        }
    }

    /// Font weight, resolved from the document element down
    fn font_weight(&self, levels: &[CascadedStyle]) -> f64 {
        levels.iter().rev().fold(self.config.default_font_weight, |parent, level| {
            match declared_font_property(level, "font-weight").as_deref() {
                Some("normal") => 400.0,
                Some("bold") => 700.0,
                Some("bolder") => interpolate(parent, &WEIGHTS, &BOLDER),
                Some("lighter") => interpolate(parent, &WEIGHTS, &LIGHTER),
                Some(other) => parse_number(other).unwrap_or(parent),
                None => parent,
            }
        })
    }

    /// Size of the nearest `svg` with an absolute width and height
    fn viewport(&self, element: ElementRef<'_>) -> (f64, f64) {
        let context = self.config.length_context();
        let absolute = |value: Option<&str>| {
            value
                .and_then(Length::parse)
                .filter(Length::is_absolute)
                .map(|length| length.to_px(&context, Direction::Other))
        };
        std::iter::successors(Some(element), |e| e.parent_element())
            .filter(|e| e.local_name() == "svg")
            .find_map(|svg| Some((absolute(svg.attribute("width"))?, absolute(svg.attribute("height"))?)))
            .unwrap_or((self.config.viewport_width, self.config.viewport_height))
    }
}

/// Font property declared at one level, directly or through `font`
fn declared_font_property(level: &CascadedStyle, property: &str) -> Option<String> {
    if let Some(value) = level.get(property).filter(|v| *v != "inherit") {
        return Some(value.to_string());
    }
    let font = level.get("font").filter(|v| *v != "inherit")?;
    parse_font(font)
        .into_iter()
        .find(|(name, _)| *name == property)
        .map(|(_, value)| value.to_string())
}

fn line_height_px(value: &str, context: &LengthContext) -> Option<f64> {
    if value == "normal" {
        return Some(FONT_SIZE_STEP * context.font_size);
    }
    let length = Length::parse(value)?;
    Some(match length.unit {
        LengthUnit::Percent => length.value / 100.0 * context.font_size,
        LengthUnit::Number => length.value * context.font_size,
        _ => length.to_px(context, Direction::Vertical),
    })
}

/// Keep `weight`, `style` and `none`; `none` with anything else is `none`
fn font_synthesis(value: &str) -> Vec<String> {
    let tokens: Vec<String> = value
        .split_whitespace()
        .filter(|t| matches!(*t, "weight" | "style" | "none"))
        .map(str::to_string)
        .collect();
    if tokens.len() > 1 && tokens.iter().any(|t| t == "none") {
        return vec!["none".to_string()];
    }
    tokens
}

/// Piecewise linear interpolation, clamped at both ends
fn interpolate(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let (Some(&first), Some(&last)) = (xp.first(), xp.last()) else {
        return x;
    };
    if x <= first {
        return fp[0];
    }
    if x >= last {
        return fp[fp.len() - 1];
    }
    let i = xp.iter().position(|&p| p > x).unwrap_or(xp.len() - 1);
    let (x0, x1) = (xp[i - 1], xp[i]);
    let (y0, y1) = (fp[i - 1], fp[i]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}
