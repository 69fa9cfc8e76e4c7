//! Style resolution configuration

use crate::units::LengthContext;

/// Style resolution configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfig {
    /// Family list used when no `font-family` is declared anywhere
    pub default_font_family: String,
    /// Size of the `medium` keyword, in px
    pub default_font_size: f64,
    /// Weight `bolder`/`lighter` start from at the root
    pub default_font_weight: f64,
    /// Lower bound for computed font sizes, in px
    pub minimum_font_size: f64,
    /// Viewport used when no `svg` ancestor has an absolute size
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpi: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            default_font_family: "sans-serif".into(),
            default_font_size: 16.0,
            default_font_weight: 400.0,
            minimum_font_size: 10.0,
            viewport_width: 300.0,
            viewport_height: 150.0,
            dpi: 96.0,
        }
    }
}

impl StyleConfig {
    pub fn default_font_family(mut self, family: &str) -> Self {
        self.default_font_family = family.to_string();
        self
    }

    pub fn default_font_size(mut self, px: f64) -> Self {
        self.default_font_size = px;
        self
    }

    pub fn minimum_font_size(mut self, px: f64) -> Self {
        self.minimum_font_size = px;
        self
    }

    pub fn viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    pub fn dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }

    /// Length context for the configured viewport
    pub fn length_context(&self) -> LengthContext {
        LengthContext {
            font_size: self.default_font_size,
            root_font_size: self.default_font_size,
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            dpi: self.dpi,
        }
    }
}
