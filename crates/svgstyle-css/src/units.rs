//! Length units
//!
//! Parsing of `<number>`, `<length>` and `<percentage>` values and their
//! conversion to CSS pixels.

use std::fmt;
use std::str::FromStr;

/// Length unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    /// Bare number (user units)
    Number,
    Px,
    Pt,
    Pc,
    Mm,
    Cm,
    In,
    Q,
    Em,
    Ex,
    Rem,
    Percent,
    Vw,
    Vh,
    Vmin,
    Vmax,
}

impl LengthUnit {
    pub(crate) fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix.to_ascii_lowercase().as_str() {
            "" => Self::Number,
            "px" => Self::Px,
            "pt" => Self::Pt,
            "pc" => Self::Pc,
            "mm" => Self::Mm,
            "cm" => Self::Cm,
            "in" => Self::In,
            "q" => Self::Q,
            "em" => Self::Em,
            "ex" => Self::Ex,
            "rem" => Self::Rem,
            "%" => Self::Percent,
            "vw" => Self::Vw,
            "vh" => Self::Vh,
            "vmin" => Self::Vmin,
            "vmax" => Self::Vmax,
            _ => return None,
        })
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Number => "",
            Self::Px => "px",
            Self::Pt => "pt",
            Self::Pc => "pc",
            Self::Mm => "mm",
            Self::Cm => "cm",
            Self::In => "in",
            Self::Q => "Q",
            Self::Em => "em",
            Self::Ex => "ex",
            Self::Rem => "rem",
            Self::Percent => "%",
            Self::Vw => "vw",
            Self::Vh => "vh",
            Self::Vmin => "vmin",
            Self::Vmax => "vmax",
        }
    }
}

/// Axis a percentage refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Horizontal,
    Vertical,
    /// Normalized diagonal, sqrt((w² + h²) / 2)
    #[default]
    Other,
}

/// Values lengths are resolved against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthContext {
    /// Font size of the element, in px
    pub font_size: f64,
    /// Font size of the root element, in px
    pub root_font_size: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpi: f64,
}

impl Default for LengthContext {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            root_font_size: 16.0,
            viewport_width: 300.0,
            viewport_height: 150.0,
            dpi: 96.0,
        }
    }
}

impl LengthContext {
    /// Same context with another font size
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    fn percent_base(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Horizontal => self.viewport_width,
            Direction::Vertical => self.viewport_height,
            Direction::Other => {
                let (w, h) = (self.viewport_width, self.viewport_height);
                ((w * w + h * h) / 2.0).sqrt()
            }
        }
    }
}

/// A number with a unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub fn px(value: f64) -> Self {
        Self::new(value, LengthUnit::Px)
    }

    /// Parse a number followed by an optional unit
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let end = number_prefix_len(text);
        if end == 0 {
            return None;
        }
        let value: f64 = text[..end].parse().ok()?;
        let unit = LengthUnit::from_suffix(&text[end..])?;
        Some(Self { value, unit })
    }

    /// True for units that do not depend on any context
    pub fn is_absolute(&self) -> bool {
        matches!(
            self.unit,
            LengthUnit::Number
                | LengthUnit::Px
                | LengthUnit::Pt
                | LengthUnit::Pc
                | LengthUnit::Mm
                | LengthUnit::Cm
                | LengthUnit::In
                | LengthUnit::Q
        )
    }

    /// Value in CSS pixels
    pub fn to_px(&self, context: &LengthContext, direction: Direction) -> f64 {
        let v = self.value;
        let dpi = context.dpi;
        match self.unit {
            LengthUnit::Number | LengthUnit::Px => v,
            LengthUnit::Pt => v * dpi / 72.0,
            LengthUnit::Pc => v * dpi / 6.0,
            LengthUnit::Mm => v * dpi / 25.4,
            LengthUnit::Cm => v * dpi / 2.54,
            LengthUnit::In => v * dpi,
            LengthUnit::Q => v * dpi / 101.6,
            LengthUnit::Em => v * context.font_size,
            LengthUnit::Ex => v * context.font_size * 0.5,
            LengthUnit::Rem => v * context.root_font_size,
            LengthUnit::Percent => v / 100.0 * context.percent_base(direction),
            LengthUnit::Vw => v / 100.0 * context.viewport_width,
            LengthUnit::Vh => v / 100.0 * context.viewport_height,
            LengthUnit::Vmin => v / 100.0 * context.viewport_width.min(context.viewport_height),
            LengthUnit::Vmax => v / 100.0 * context.viewport_width.max(context.viewport_height),
        }
    }
}

impl FromStr for Length {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(())
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Byte length of the leading CSS number in `text`
fn number_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut has_digits = i > digits_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > frac_start {
            has_digits = true;
            i = j;
        }
    }
    if !has_digits {
        return 0;
    }
    // exponent only when followed by digits, so "1em" keeps its unit
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

/// Parse a bare number
pub fn parse_number(text: &str) -> Option<f64> {
    match Length::parse(text)? {
        Length {
            value,
            unit: LengthUnit::Number,
        } => Some(value),
        _ => None,
    }
}
