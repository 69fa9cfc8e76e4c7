//! Media queries
//!
//! The [`MediaMatcher`] port decides conditional inclusion of style sheets
//! and `@media` groups. [`ViewportMedia`] evaluates media query lists
//! against a fixed viewport.

use cssparser::{ParseError, Parser, ParserInput, Token};

use crate::units::{Length, LengthContext, LengthUnit};

/// Evaluates a media query list
pub trait MediaMatcher {
    fn matches_medium(&self, media: &str) -> bool;
}

/// True for media text that applies everywhere (`""` or `all`)
pub(crate) fn is_unconditional(media: &str) -> bool {
    let media = media.trim();
    media.is_empty() || media.eq_ignore_ascii_case("all")
}

/// Media evaluation against a fixed viewport
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportMedia {
    pub media_type: String,
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportMedia {
    fn default() -> Self {
        Self::screen(300.0, 150.0)
    }
}

impl ViewportMedia {
    pub fn new(media_type: &str, width: f64, height: f64) -> Self {
        Self {
            media_type: media_type.to_ascii_lowercase(),
            width,
            height,
        }
    }

    /// `screen` viewport of the given size
    pub fn screen(width: f64, height: f64) -> Self {
        Self::new("screen", width, height)
    }

    /// One query of a list; a query that fails to parse does not match
    fn query<'i>(&self, input: &mut Parser<'i, '_>) -> Result<bool, ParseError<'i, ()>> {
        Ok(self.query_matches(input).unwrap_or(false))
    }

    fn query_matches<'i>(&self, input: &mut Parser<'i, '_>) -> Result<bool, ParseError<'i, ()>> {
        let negate = input.try_parse(|input| input.expect_ident_matching("not")).is_ok();
        if !negate {
            let _ = input.try_parse(|input| input.expect_ident_matching("only"));
        }

        let mut matched = true;
        let mut first = true;
        loop {
            if !first {
                if input.is_exhausted() {
                    break;
                }
                input.expect_ident_matching("and")?;
            }
            let token = input.next()?.clone();
            let part = match token {
                Token::Ident(ref media_type) if first => {
                    media_type.eq_ignore_ascii_case("all") || media_type.eq_ignore_ascii_case(&self.media_type)
                }
                Token::ParenthesisBlock => input.parse_nested_block(|input| self.feature_matches(input))?,
                token => return Err(input.new_unexpected_token_error(token)),
            };
            matched &= part;
            first = false;
        }
        Ok(matched != negate)
    }

    fn feature_matches<'i>(&self, input: &mut Parser<'i, '_>) -> Result<bool, ParseError<'i, ()>> {
        let name = input.expect_ident()?.to_ascii_lowercase();

        if input.try_parse(|input| input.expect_colon()).is_err() {
            input.expect_exhausted()?;
            return Ok(match name.as_str() {
                "width" => self.width > 0.0,
                "height" => self.height > 0.0,
                "orientation" => true,
                _ => false,
            });
        }

        if name == "orientation" {
            let value = input.expect_ident()?.to_ascii_lowercase();
            input.expect_exhausted()?;
            return Ok(match value.as_str() {
                "portrait" => self.height >= self.width,
                "landscape" => self.width > self.height,
                _ => false,
            });
        }

        let token = input.next()?.clone();
        let length = match token {
            Token::Dimension { value, ref unit, .. } => LengthUnit::from_suffix(unit)
                .filter(|unit| !matches!(unit, LengthUnit::Percent))
                .map(|unit| Length::new(f64::from(value), unit)),
            Token::Number { value, .. } => Some(Length::new(f64::from(value), LengthUnit::Number)),
            token => return Err(input.new_unexpected_token_error(token)),
        };
        input.expect_exhausted()?;
        let Some(length) = length else {
            return Ok(false);
        };

        let px = length.to_px(&LengthContext::default(), Default::default());
        Ok(match name.as_str() {
            "width" => self.width == px,
            "min-width" => self.width >= px,
            "max-width" => self.width <= px,
            "height" => self.height == px,
            "min-height" => self.height >= px,
            "max-height" => self.height <= px,
            _ => false,
        })
    }
}

impl MediaMatcher for ViewportMedia {
    fn matches_medium(&self, media: &str) -> bool {
        if is_unconditional(media) {
            return true;
        }
        let mut input = ParserInput::new(media);
        let mut parser = Parser::new(&mut input);
        parser
            .parse_comma_separated(|input| self.query(input))
            .is_ok_and(|queries| queries.into_iter().any(|matched| matched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconditional() {
        assert!(is_unconditional(""));
        assert!(is_unconditional(" ALL "));
        assert!(!is_unconditional("screen"));
    }

    #[test]
    fn test_media_types() {
        let media = ViewportMedia::screen(800.0, 600.0);
        assert!(media.matches_medium("screen"));
        assert!(!media.matches_medium("print"));
        assert!(media.matches_medium("print, screen"));
        assert!(media.matches_medium("not print"));
        assert!(media.matches_medium("only screen"));
    }

    #[test]
    fn test_media_features() {
        let media = ViewportMedia::screen(800.0, 600.0);
        assert!(media.matches_medium("(min-width: 640px)"));
        assert!(!media.matches_medium("(max-width: 640px)"));
        assert!(media.matches_medium("screen and (min-width: 100px) and (max-height: 600px)"));
        assert!(media.matches_medium("(orientation: landscape)"));
        assert!(!media.matches_medium("(orientation: portrait)"));
        assert!(!media.matches_medium("not screen and (min-width: 100px)"));
        assert!(media.matches_medium("(min-width: 40em)"));
    }

    #[test]
    fn test_unknown_feature_does_not_match() {
        let media = ViewportMedia::screen(800.0, 600.0);
        assert!(!media.matches_medium("(color-gamut: p3)"));
        assert!(!media.matches_medium("screen and (hover)"));
    }

    #[test]
    fn test_malformed_query_only_drops_itself() {
        let media = ViewportMedia::screen(800.0, 600.0);
        assert!(!media.matches_medium("screen and"));
        assert!(!media.matches_medium("(min-width: 10%)"));
        assert!(!media.matches_medium("screen (min-width: 1px)"));
        assert!(media.matches_medium("screen and and, print, SCREEN"));
        assert!(media.matches_medium("(min-width: ) , (max-width: 900px)"));
    }

    #[test]
    fn test_case_insensitive_keywords() {
        let media = ViewportMedia::screen(800.0, 600.0);
        assert!(media.matches_medium("ONLY Screen AND (MIN-WIDTH: 100PX)"));
        assert!(!media.matches_medium("NOT screen"));
        assert!(media.matches_medium("(width)"));
        assert!(media.matches_medium("(min-width: 0)"));
    }
}
