//! CSS Selectors
//!
//! Selector parsing on top of the `cssparser` tokenizer and right-to-left
//! matching against [`ElementRef`]s. Names are matched case-sensitively, as
//! XML requires. Dynamic pseudo-classes and pseudo-elements parse but never
//! match; anything else the engine does not know is a malformed selector.

use cssparser::{ParseError, Parser, ParserInput, Token};
use svgstyle_dom::{ChildNode, ElementRef};

use crate::{CssError, NamespaceMap};

/// Selector matching port
///
/// A malformed selector is reported as [`CssError::MalformedSelector`]; the
/// cascade skips the rule and carries on.
pub trait SelectorMatcher {
    fn match_selector(&self, selector: &str, element: ElementRef<'_>, namespaces: &NamespaceMap)
    -> Result<bool, CssError>;
}

/// Built-in selector engine
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorEngine;

impl SelectorMatcher for SelectorEngine {
    fn match_selector(
        &self,
        selector: &str,
        element: ElementRef<'_>,
        namespaces: &NamespaceMap,
    ) -> Result<bool, CssError> {
        Ok(SelectorList::parse(selector, namespaces)?.matches(element))
    }
}

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

impl SelectorList {
    /// Parse a selector list; `namespaces` resolves `prefix|` parts
    pub fn parse(text: &str, namespaces: &NamespaceMap) -> Result<Self, CssError> {
        let mut input = ParserInput::new(text);
        let mut parser = Parser::new(&mut input);
        parser
            .parse_entirely(|input| parse_selector_list(input, namespaces))
            .map_err(|_| CssError::MalformedSelector(text.trim().to_string()))
    }

    /// True if any selector of the list matches
    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        self.0.iter().any(|selector| selector.matches(element))
    }
}

/// Compound selectors joined by combinators
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    pub compounds: Vec<CompoundSelector>,
    /// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`
    pub combinators: Vec<Combinator>,
}

impl ComplexSelector {
    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.matches_at(n - 1, element),
        }
    }

    fn matches_at(&self, index: usize, element: ElementRef<'_>) -> bool {
        if !self.compounds[index].matches(element) {
            return false;
        }
        if index == 0 {
            return true;
        }
        let previous = index - 1;
        match self.combinators[previous] {
            Combinator::Child => element
                .parent_element()
                .is_some_and(|parent| self.matches_at(previous, parent)),
            Combinator::Descendant => element.ancestors().any(|ancestor| self.matches_at(previous, ancestor)),
            Combinator::NextSibling => element
                .previous_element_sibling()
                .is_some_and(|sibling| self.matches_at(previous, sibling)),
            Combinator::SubsequentSibling => {
                let mut cursor = element.previous_element_sibling();
                while let Some(sibling) = cursor {
                    if self.matches_at(previous, sibling) {
                        return true;
                    }
                    cursor = sibling.previous_element_sibling();
                }
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// whitespace
    Descendant,
    /// `>`
    Child,
    /// `+`
    NextSibling,
    /// `~`
    SubsequentSibling,
}

/// Simple selectors without combinators
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundSelector(pub Vec<SelectorComponent>);

impl CompoundSelector {
    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        self.0.iter().all(|component| component.matches(element))
    }
}

/// Namespace part of a type or attribute selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceConstraint {
    /// `*|` or no prefix on a type selector
    Any,
    /// `|`
    None,
    Uri(String),
}

/// A component of a selector
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Universal selector *
    Universal(NamespaceConstraint),
    /// Type selector (local name)
    Type(NamespaceConstraint, String),
    /// ID selector #id
    Id(String),
    /// Class selector .class
    Class(String),
    /// Attribute selector [attr], [attr=value], etc.
    Attribute(AttributeSelector),
    PseudoClass(PseudoClass),
    /// ::before, ::after, etc.
    PseudoElement(String),
}

impl SelectorComponent {
    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        match self {
            SelectorComponent::Universal(ns) => namespace_matches(ns, element.namespace_uri()),
            SelectorComponent::Type(ns, name) => {
                element.local_name() == name && namespace_matches(ns, element.namespace_uri())
            }
            SelectorComponent::Id(id) => element.attribute("id") == Some(id.as_str()),
            SelectorComponent::Class(class) => element.classes().any(|c| c == class),
            SelectorComponent::Attribute(attr) => attr.matches_element(element),
            SelectorComponent::PseudoClass(pseudo) => pseudo.matches(element),
            SelectorComponent::PseudoElement(_) => false,
        }
    }
}

fn namespace_matches(constraint: &NamespaceConstraint, namespace: Option<&str>) -> bool {
    match constraint {
        NamespaceConstraint::Any => true,
        NamespaceConstraint::None => namespace.is_none(),
        NamespaceConstraint::Uri(uri) => namespace == Some(uri.as_str()),
    }
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub namespace: NamespaceConstraint,
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeMatcher {
    /// [attr=value] - exact match
    Exact(String),
    /// [attr~=value] - whitespace-separated list contains
    Contains(String),
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch(String),
    /// [attr^=value] - starts with
    Prefix(String),
    /// [attr$=value] - ends with
    Suffix(String),
    /// [attr*=value] - contains substring
    Substring(String),
}

impl AttributeSelector {
    /// Check if an attribute value matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        let Some(matcher) = &self.matcher else {
            return true;
        };
        let fold = |s: &str| {
            if self.case_insensitive {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        };
        let val = fold(value);
        match matcher {
            AttributeMatcher::Exact(expected) => val == fold(expected),
            AttributeMatcher::Contains(expected) => {
                let expected = fold(expected);
                !expected.is_empty() && val.split_ascii_whitespace().any(|w| w == expected)
            }
            AttributeMatcher::DashMatch(expected) => {
                let expected = fold(expected);
                val == expected || val.starts_with(&format!("{}-", expected))
            }
            AttributeMatcher::Prefix(expected) => !expected.is_empty() && val.starts_with(&fold(expected)),
            AttributeMatcher::Suffix(expected) => !expected.is_empty() && val.ends_with(&fold(expected)),
            AttributeMatcher::Substring(expected) => !expected.is_empty() && val.contains(&fold(expected)),
        }
    }

    fn matches_element(&self, element: ElementRef<'_>) -> bool {
        element
            .attributes()
            .filter(|(qualified, _)| self.name_matches(element, qualified))
            .any(|(_, value)| self.matches(Some(value)))
    }

    fn name_matches(&self, element: ElementRef<'_>, qualified: &str) -> bool {
        let (prefix, local) = match qualified.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, qualified),
        };
        if local != self.name {
            return false;
        }
        match &self.namespace {
            NamespaceConstraint::Any => true,
            NamespaceConstraint::None => prefix.is_none(),
            NamespaceConstraint::Uri(uri) => {
                prefix.is_some()
                    && element.tree().lookup_namespace_uri(element.id(), prefix).as_deref() == Some(uri.as_str())
            }
        }
    }
}

/// Pseudo-class type
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    // Tree-structural pseudo-classes
    Root,
    Empty,
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    NthChild(NthExpression),
    NthLastChild(NthExpression),
    NthOfType(NthExpression),
    NthLastOfType(NthExpression),

    // Logical pseudo-classes
    Not(SelectorList),
    Is(SelectorList),
    Where(SelectorList),

    Lang(String),
    /// User-action and link states; never set on a static document
    Dynamic(String),
}

const DYNAMIC_PSEUDO_CLASSES: &[&str] = &[
    "link",
    "visited",
    "any-link",
    "hover",
    "active",
    "focus",
    "focus-visible",
    "focus-within",
    "target",
    "enabled",
    "disabled",
    "checked",
];

const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

impl PseudoClass {
    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        match self {
            PseudoClass::Root => element.is_root(),
            PseudoClass::Empty => element.is_empty(),
            PseudoClass::FirstChild => element.previous_element_sibling().is_none(),
            PseudoClass::LastChild => element.next_element_sibling().is_none(),
            PseudoClass::OnlyChild => {
                element.previous_element_sibling().is_none() && element.next_element_sibling().is_none()
            }
            PseudoClass::FirstOfType => position(element, true, Sibling::Before) == 1,
            PseudoClass::LastOfType => position(element, true, Sibling::After) == 1,
            PseudoClass::OnlyOfType => {
                position(element, true, Sibling::Before) == 1 && position(element, true, Sibling::After) == 1
            }
            PseudoClass::NthChild(expr) => expr.matches(position(element, false, Sibling::Before)),
            PseudoClass::NthLastChild(expr) => expr.matches(position(element, false, Sibling::After)),
            PseudoClass::NthOfType(expr) => expr.matches(position(element, true, Sibling::Before)),
            PseudoClass::NthLastOfType(expr) => expr.matches(position(element, true, Sibling::After)),
            PseudoClass::Not(list) => !list.matches(element),
            PseudoClass::Is(list) | PseudoClass::Where(list) => list.matches(element),
            PseudoClass::Lang(lang) => {
                let declared = std::iter::once(element)
                    .chain(element.ancestors())
                    .find_map(|e| e.attribute("xml:lang").or_else(|| e.attribute("lang")));
                declared.is_some_and(|value| {
                    let value = value.to_ascii_lowercase();
                    let lang = lang.to_ascii_lowercase();
                    value == lang || value.starts_with(&format!("{}-", lang))
                })
            }
            PseudoClass::Dynamic(_) => false,
        }
    }
}

#[derive(Clone, Copy)]
enum Sibling {
    Before,
    After,
}

/// 1-based position among element siblings, counted from the start or end
fn position<'a>(element: ElementRef<'a>, same_type: bool, from: Sibling) -> i32 {
    let step = |e: ElementRef<'a>| match from {
        Sibling::Before => e.previous_element_sibling(),
        Sibling::After => e.next_element_sibling(),
    };
    let mut count = 1;
    let mut cursor = step(element);
    while let Some(sibling) = cursor {
        if !same_type || (sibling.local_name() == element.local_name() && sibling.namespace_uri() == element.namespace_uri())
        {
            count += 1;
        }
        cursor = step(sibling);
    }
    count
}

/// An+B expression for :nth-* selectors
#[derive(Debug, Clone, PartialEq)]
pub struct NthExpression {
    /// Coefficient (A in An+B)
    pub a: i32,
    /// Offset (B in An+B)
    pub b: i32,
}

impl NthExpression {
    /// Create "odd" expression (2n+1)
    pub fn odd() -> Self {
        Self { a: 2, b: 1 }
    }

    /// Create "even" expression (2n)
    pub fn even() -> Self {
        Self { a: 2, b: 0 }
    }

    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// Parse from string like "2n+1", "odd", "even", "3"
    pub fn parse(s: &str) -> Option<Self> {
        let s: String = s.trim().to_ascii_lowercase().split_whitespace().collect();
        match s.as_str() {
            "odd" => return Some(Self::odd()),
            "even" => return Some(Self::even()),
            _ => {}
        }
        if let Ok(n) = s.parse::<i32>() {
            return Some(Self::new(0, n));
        }

        let n_pos = s.find('n')?;
        let a = match &s[..n_pos] {
            "" | "+" => 1,
            "-" => -1,
            a => a.parse().ok()?,
        };
        let rest = &s[n_pos + 1..];
        let b = if rest.is_empty() {
            0
        } else if rest.starts_with('+') || rest.starts_with('-') {
            rest.parse().ok()?
        } else {
            return None;
        };
        Some(Self::new(a, b))
    }

    /// Check if index n (1-based) matches this expression
    pub fn matches(&self, n: i32) -> bool {
        if self.a == 0 {
            return n == self.b;
        }
        let a = i64::from(self.a);
        let diff = i64::from(n) - i64::from(self.b);
        if a > 0 {
            diff >= 0 && diff % a == 0
        } else {
            diff <= 0 && diff % a == 0
        }
    }
}

type SelectorResult<'i, T> = Result<T, ParseError<'i, ()>>;

fn parse_selector_list<'i>(input: &mut Parser<'i, '_>, namespaces: &NamespaceMap) -> SelectorResult<'i, SelectorList> {
    input
        .parse_comma_separated(|input| parse_complex(input, namespaces))
        .map(SelectorList)
}

fn parse_complex<'i>(input: &mut Parser<'i, '_>, namespaces: &NamespaceMap) -> SelectorResult<'i, ComplexSelector> {
    input.skip_whitespace();
    let mut compounds = vec![parse_compound(input, namespaces)?];
    let mut combinators = Vec::new();

    loop {
        let mut saw_whitespace = false;
        let combinator = loop {
            let state = input.state();
            match input.next_including_whitespace().cloned() {
                Err(_) => return Ok(ComplexSelector { compounds, combinators }),
                Ok(Token::WhiteSpace(_)) => saw_whitespace = true,
                Ok(Token::Delim('>')) => break Combinator::Child,
                Ok(Token::Delim('+')) => break Combinator::NextSibling,
                Ok(Token::Delim('~')) => break Combinator::SubsequentSibling,
                Ok(_) if saw_whitespace => {
                    input.reset(&state);
                    break Combinator::Descendant;
                }
                Ok(_) => return Err(input.new_custom_error(())),
            }
        };
        input.skip_whitespace();
        compounds.push(parse_compound(input, namespaces)?);
        combinators.push(combinator);
    }
}

fn parse_compound<'i>(input: &mut Parser<'i, '_>, namespaces: &NamespaceMap) -> SelectorResult<'i, CompoundSelector> {
    let mut components = Vec::new();
    if let Some(type_selector) = parse_type_selector(input, namespaces)? {
        components.push(type_selector);
    }

    loop {
        let state = input.state();
        let token = match input.next_including_whitespace().cloned() {
            Ok(token) => token,
            Err(_) => break,
        };
        match token {
            Token::IDHash(id) => components.push(SelectorComponent::Id(id.as_ref().to_string())),
            Token::Delim('.') => match input.next_including_whitespace().cloned()? {
                Token::Ident(class) => components.push(SelectorComponent::Class(class.as_ref().to_string())),
                _ => return Err(input.new_custom_error(())),
            },
            Token::SquareBracketBlock => {
                let attr = input.parse_nested_block(|input| parse_attribute(input, namespaces))?;
                components.push(SelectorComponent::Attribute(attr));
            }
            Token::Colon => components.push(parse_pseudo(input, namespaces)?),
            _ => {
                input.reset(&state);
                break;
            }
        }
    }

    if components.is_empty() {
        return Err(input.new_custom_error(()));
    }
    Ok(CompoundSelector(components))
}

enum NameOrStar {
    Name(String),
    Star,
}

fn parse_name_or_star<'i>(input: &mut Parser<'i, '_>) -> SelectorResult<'i, NameOrStar> {
    match input.next_including_whitespace().cloned()? {
        Token::Ident(name) => Ok(NameOrStar::Name(name.as_ref().to_string())),
        Token::Delim('*') => Ok(NameOrStar::Star),
        _ => Err(input.new_custom_error(())),
    }
}

fn resolve_prefix<'i>(input: &Parser<'i, '_>, namespaces: &NamespaceMap, prefix: &str) -> SelectorResult<'i, String> {
    namespaces
        .get(prefix)
        .cloned()
        .ok_or_else(|| input.new_custom_error(()))
}

fn type_component(namespace: NamespaceConstraint, name: NameOrStar) -> SelectorComponent {
    match name {
        NameOrStar::Name(name) => SelectorComponent::Type(namespace, name),
        NameOrStar::Star => SelectorComponent::Universal(namespace),
    }
}

/// `name`, `*`, `ns|name`, `*|name`, `|name` (and the same with `*`)
fn parse_type_selector<'i>(
    input: &mut Parser<'i, '_>,
    namespaces: &NamespaceMap,
) -> SelectorResult<'i, Option<SelectorComponent>> {
    let start = input.state();
    let first = match input.next_including_whitespace().cloned() {
        Ok(Token::Ident(name)) => NameOrStar::Name(name.as_ref().to_string()),
        Ok(Token::Delim('*')) => NameOrStar::Star,
        Ok(Token::Delim('|')) => {
            let name = parse_name_or_star(input)?;
            return Ok(Some(type_component(NamespaceConstraint::None, name)));
        }
        _ => {
            input.reset(&start);
            return Ok(None);
        }
    };

    let after = input.state();
    if let Ok(Token::Delim('|')) = input.next_including_whitespace().cloned() {
        let namespace = match first {
            NameOrStar::Star => NamespaceConstraint::Any,
            NameOrStar::Name(prefix) => NamespaceConstraint::Uri(resolve_prefix(input, namespaces, &prefix)?),
        };
        let name = parse_name_or_star(input)?;
        return Ok(Some(type_component(namespace, name)));
    }
    input.reset(&after);
    Ok(Some(type_component(NamespaceConstraint::Any, first)))
}

fn parse_attribute<'i>(input: &mut Parser<'i, '_>, namespaces: &NamespaceMap) -> SelectorResult<'i, AttributeSelector> {
    input.skip_whitespace();
    let (namespace, name) = match input.next_including_whitespace().cloned()? {
        Token::Ident(first) => {
            let after = input.state();
            if let Ok(Token::Delim('|')) = input.next_including_whitespace().cloned() {
                let uri = resolve_prefix(input, namespaces, first.as_ref())?;
                (NamespaceConstraint::Uri(uri), expect_ident(input)?)
            } else {
                input.reset(&after);
                (NamespaceConstraint::None, first.as_ref().to_string())
            }
        }
        Token::Delim('*') => {
            if !matches!(input.next_including_whitespace().cloned()?, Token::Delim('|')) {
                return Err(input.new_custom_error(()));
            }
            (NamespaceConstraint::Any, expect_ident(input)?)
        }
        Token::Delim('|') => (NamespaceConstraint::None, expect_ident(input)?),
        _ => return Err(input.new_custom_error(())),
    };

    let operator = match input.next() {
        Err(_) => {
            return Ok(AttributeSelector {
                namespace,
                name,
                matcher: None,
                case_insensitive: false,
            });
        }
        Ok(token) => token.clone(),
    };
    let value = match input.next()?.clone() {
        Token::Ident(v) | Token::QuotedString(v) => v.as_ref().to_string(),
        _ => return Err(input.new_custom_error(())),
    };
    let matcher = match operator {
        Token::Delim('=') => AttributeMatcher::Exact(value),
        Token::IncludeMatch => AttributeMatcher::Contains(value),
        Token::DashMatch => AttributeMatcher::DashMatch(value),
        Token::PrefixMatch => AttributeMatcher::Prefix(value),
        Token::SuffixMatch => AttributeMatcher::Suffix(value),
        Token::SubstringMatch => AttributeMatcher::Substring(value),
        _ => return Err(input.new_custom_error(())),
    };

    let case_insensitive = match input.try_parse(|i| i.expect_ident_cloned()) {
        Ok(flag) if flag.eq_ignore_ascii_case("i") => true,
        Ok(flag) if flag.eq_ignore_ascii_case("s") => false,
        Ok(_) => return Err(input.new_custom_error(())),
        Err(_) => false,
    };
    input.expect_exhausted()?;

    Ok(AttributeSelector {
        namespace,
        name,
        matcher: Some(matcher),
        case_insensitive,
    })
}

fn expect_ident<'i>(input: &mut Parser<'i, '_>) -> SelectorResult<'i, String> {
    match input.next_including_whitespace().cloned()? {
        Token::Ident(name) => Ok(name.as_ref().to_string()),
        _ => Err(input.new_custom_error(())),
    }
}

/// Everything after the first `:`
fn parse_pseudo<'i>(input: &mut Parser<'i, '_>, namespaces: &NamespaceMap) -> SelectorResult<'i, SelectorComponent> {
    match input.next_including_whitespace().cloned()? {
        Token::Colon => match input.next_including_whitespace().cloned()? {
            Token::Ident(name) => Ok(SelectorComponent::PseudoElement(name.to_ascii_lowercase())),
            Token::Function(name) => {
                input.parse_nested_block(|input| {
                    while input.next().is_ok() {}
                    Ok::<(), ParseError<'i, ()>>(())
                })?;
                Ok(SelectorComponent::PseudoElement(name.to_ascii_lowercase()))
            }
            _ => Err(input.new_custom_error(())),
        },
        Token::Ident(name) => {
            let name = name.to_ascii_lowercase();
            let pseudo = match name.as_str() {
                "root" => PseudoClass::Root,
                "empty" => PseudoClass::Empty,
                "first-child" => PseudoClass::FirstChild,
                "last-child" => PseudoClass::LastChild,
                "only-child" => PseudoClass::OnlyChild,
                "first-of-type" => PseudoClass::FirstOfType,
                "last-of-type" => PseudoClass::LastOfType,
                "only-of-type" => PseudoClass::OnlyOfType,
                n if LEGACY_PSEUDO_ELEMENTS.contains(&n) => return Ok(SelectorComponent::PseudoElement(n.to_string())),
                n if DYNAMIC_PSEUDO_CLASSES.contains(&n) => PseudoClass::Dynamic(n.to_string()),
                _ => return Err(input.new_custom_error(())),
            };
            Ok(SelectorComponent::PseudoClass(pseudo))
        }
        Token::Function(name) => {
            let name = name.to_ascii_lowercase();
            let pseudo = input.parse_nested_block(|input| parse_pseudo_function(input, &name, namespaces))?;
            Ok(SelectorComponent::PseudoClass(pseudo))
        }
        _ => Err(input.new_custom_error(())),
    }
}

fn parse_pseudo_function<'i>(
    input: &mut Parser<'i, '_>,
    name: &str,
    namespaces: &NamespaceMap,
) -> SelectorResult<'i, PseudoClass> {
    match name {
        "nth-child" => Ok(PseudoClass::NthChild(parse_nth(input)?)),
        "nth-last-child" => Ok(PseudoClass::NthLastChild(parse_nth(input)?)),
        "nth-of-type" => Ok(PseudoClass::NthOfType(parse_nth(input)?)),
        "nth-last-of-type" => Ok(PseudoClass::NthLastOfType(parse_nth(input)?)),
        "not" => Ok(PseudoClass::Not(parse_selector_list(input, namespaces)?)),
        "is" => Ok(PseudoClass::Is(parse_selector_list(input, namespaces)?)),
        "where" => Ok(PseudoClass::Where(parse_selector_list(input, namespaces)?)),
        "lang" => {
            let lang = match input.next()?.clone() {
                Token::Ident(v) | Token::QuotedString(v) => v.as_ref().to_string(),
                _ => return Err(input.new_custom_error(())),
            };
            input.expect_exhausted()?;
            Ok(PseudoClass::Lang(lang))
        }
        _ => Err(input.new_custom_error(())),
    }
}

fn parse_nth<'i>(input: &mut Parser<'i, '_>) -> SelectorResult<'i, NthExpression> {
    let start = input.position();
    while input.next().is_ok() {}
    NthExpression::parse(input.slice_from(start)).ok_or_else(|| input.new_custom_error(()))
}
