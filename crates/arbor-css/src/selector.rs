//! Selectors
//!
//! A [`Selector`] is a chain of [`SelectorNode`]s joined by combinators;
//! the rightmost node is the subject. Each node holds filters that must
//! all match. Selectors print back to their canonical source form.

use std::fmt;
use std::str::FromStr;

use crate::selector_parser::SelectorParser;

/// Selector specificity (ids, classes/attributes/pseudo-classes, types)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    pub const ZERO: Specificity = Specificity(0, 0, 0);
    /// Specificity carried by inline declarations
    pub const MAX: Specificity = Specificity(u32::MAX, u32::MAX, u32::MAX);
}

impl std::ops::Add for Specificity {
    type Output = Specificity;

    fn add(self, rhs: Specificity) -> Specificity {
        Specificity(
            self.0.saturating_add(rhs.0),
            self.1.saturating_add(rhs.1),
            self.2.saturating_add(rhs.2),
        )
    }
}

/// Relationship between a node and the node to its left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a ~ b`, any preceding sibling
    Sibling,
    /// `a + b`, the immediately preceding sibling
    AdjacentSibling,
}

impl Combinator {
    fn as_str(self) -> &'static str {
        match self {
            Combinator::Descendant => " ",
            Combinator::Child => " > ",
            Combinator::Sibling => " ~ ",
            Combinator::AdjacentSibling => " + ",
        }
    }
}

/// A compound selector plus the combinator linking it to its left neighbour
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorNode {
    /// `None` for the leftmost node
    pub combinator: Option<Combinator>,
    pub filters: Vec<Filter>,
}

impl SelectorNode {
    pub fn specificity(&self) -> Specificity {
        self.filters
            .iter()
            .fold(Specificity::ZERO, |acc, f| acc + f.specificity())
    }
}

/// A single test inside a compound selector
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Universal,
    Tag(String),
    Class(String),
    Id(String),
    Attribute(AttributeSelector),
    PseudoClass(PseudoClass),
    PseudoFunction(PseudoFunction),
}

impl Filter {
    pub fn specificity(&self) -> Specificity {
        match self {
            Filter::Universal => Specificity::ZERO,
            Filter::Tag(_) => Specificity(0, 0, 1),
            Filter::Id(_) => Specificity(1, 0, 0),
            Filter::Class(_) | Filter::Attribute(_) | Filter::PseudoClass(_) => Specificity(0, 1, 0),
            Filter::PseudoFunction(f) => f.specificity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    /// `[a]`
    Has,
    /// `[a="v"]`
    Equals,
    /// `[a~="v"]`
    ContainsWord,
    /// `[a|="v"]`
    DashPrefixed,
    /// `[a^="v"]`
    StartsWith,
    /// `[a$="v"]`
    EndsWith,
    /// `[a*="v"]`
    ContainsSubstring,
}

impl AttributeOp {
    pub(crate) fn from_symbol(symbol: &str) -> Option<AttributeOp> {
        Some(match symbol {
            "=" => AttributeOp::Equals,
            "~=" => AttributeOp::ContainsWord,
            "|=" => AttributeOp::DashPrefixed,
            "^=" => AttributeOp::StartsWith,
            "$=" => AttributeOp::EndsWith,
            "*=" => AttributeOp::ContainsSubstring,
            _ => return None,
        })
    }

    fn symbol(self) -> &'static str {
        match self {
            AttributeOp::Has => "",
            AttributeOp::Equals => "=",
            AttributeOp::ContainsWord => "~=",
            AttributeOp::DashPrefixed => "|=",
            AttributeOp::StartsWith => "^=",
            AttributeOp::EndsWith => "$=",
            AttributeOp::ContainsSubstring => "*=",
        }
    }
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub op: AttributeOp,
    pub value: String,
}

impl AttributeSelector {
    /// Check an attribute value; an absent attribute never matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(actual) = value else {
            return false;
        };
        let expected = self.value.as_str();
        match self.op {
            AttributeOp::Has => true,
            AttributeOp::Equals => actual == expected,
            AttributeOp::ContainsWord => actual.split_whitespace().any(|w| w == expected),
            AttributeOp::DashPrefixed => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttributeOp::StartsWith => !expected.is_empty() && actual.starts_with(expected),
            AttributeOp::EndsWith => !expected.is_empty() && actual.ends_with(expected),
            AttributeOp::ContainsSubstring => !expected.is_empty() && actual.contains(expected),
        }
    }
}

/// Pseudo-class without arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    Root,
    Empty,
    Hover,
    Active,
    Focus,
    Enabled,
    Disabled,
}

impl PseudoClass {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "first-child" => Self::FirstChild,
            "last-child" => Self::LastChild,
            "only-child" => Self::OnlyChild,
            "first-of-type" => Self::FirstOfType,
            "last-of-type" => Self::LastOfType,
            "only-of-type" => Self::OnlyOfType,
            "root" => Self::Root,
            "empty" => Self::Empty,
            "hover" => Self::Hover,
            "active" => Self::Active,
            "focus" => Self::Focus,
            "enabled" => Self::Enabled,
            "disabled" => Self::Disabled,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::FirstChild => "first-child",
            Self::LastChild => "last-child",
            Self::OnlyChild => "only-child",
            Self::FirstOfType => "first-of-type",
            Self::LastOfType => "last-of-type",
            Self::OnlyOfType => "only-of-type",
            Self::Root => "root",
            Self::Empty => "empty",
            Self::Hover => "hover",
            Self::Active => "active",
            Self::Focus => "focus",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

/// Pseudo-class with arguments
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoFunction {
    NthChild { expr: NthExpression, of: Option<SelectorGroup> },
    NthLastChild { expr: NthExpression, of: Option<SelectorGroup> },
    NthOfType(NthExpression),
    NthLastOfType(NthExpression),
    Not(SelectorGroup),
    Is(SelectorGroup),
}

impl PseudoFunction {
    pub fn specificity(&self) -> Specificity {
        match self {
            PseudoFunction::NthChild { of, .. } | PseudoFunction::NthLastChild { of, .. } => {
                Specificity(0, 1, 0) + of.as_ref().map_or(Specificity::ZERO, SelectorGroup::max_specificity)
            }
            PseudoFunction::NthOfType(_) | PseudoFunction::NthLastOfType(_) => Specificity(0, 1, 0),
            PseudoFunction::Not(group) | PseudoFunction::Is(group) => group.max_specificity(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PseudoFunction::NthChild { .. } => "nth-child",
            PseudoFunction::NthLastChild { .. } => "nth-last-child",
            PseudoFunction::NthOfType(_) => "nth-of-type",
            PseudoFunction::NthLastOfType(_) => "nth-last-of-type",
            PseudoFunction::Not(_) => "not",
            PseudoFunction::Is(_) => "is",
        }
    }
}

/// An+B expression for `:nth-*` selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthExpression {
    /// Coefficient (A in An+B)
    pub a: i32,
    /// Offset (B in An+B)
    pub b: i32,
}

impl NthExpression {
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    pub fn odd() -> Self {
        Self::new(2, 1)
    }

    pub fn even() -> Self {
        Self::new(2, 0)
    }

    /// Parse `odd`, `even`, `3`, `2n`, `2n+1`, `-n+3`, `- 2n - 1`
    pub fn parse(s: &str) -> Option<Self> {
        let s: String = s.split_whitespace().collect::<String>().to_ascii_lowercase();
        match s.as_str() {
            "odd" => return Some(Self::odd()),
            "even" => return Some(Self::even()),
            "" => return None,
            _ => {}
        }

        let Some(n_pos) = s.find('n') else {
            return s.parse().ok().map(|b| Self::new(0, b));
        };
        let a = match &s[..n_pos] {
            "" | "+" => 1,
            "-" => -1,
            digits => digits.parse().ok()?,
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

    /// Whether 1-based position `n` equals `a*k + b` for some `k >= 0`
    pub fn matches(&self, n: i32) -> bool {
        // `n - b` can leave the i32 range
        let (a, b, n) = (i64::from(self.a), i64::from(self.b), i64::from(n));
        if a == 0 {
            return n == b;
        }
        let diff = n - b;
        if a > 0 {
            diff >= 0 && diff % a == 0
        } else {
            diff <= 0 && diff % a == 0
        }
    }
}

impl fmt::Display for NthExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.a {
            0 => return write!(f, "{}", self.b),
            1 => f.write_str("n")?,
            -1 => f.write_str("-n")?,
            a => write!(f, "{a}n")?,
        }
        if self.b > 0 {
            write!(f, "+{}", self.b)?;
        } else if self.b < 0 {
            write!(f, "{}", self.b)?;
        }
        Ok(())
    }
}

/// Selector parse failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("unexpected '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("unexpected end of selector")]
    UnexpectedEnd,
    #[error("empty selector")]
    Empty,
    #[error("unknown pseudo-class ':{0}'")]
    UnknownPseudo(String),
    #[error("invalid An+B expression '{0}'")]
    InvalidNth(String),
}

/// Complex selector
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    nodes: Vec<SelectorNode>,
    specificity: Specificity,
}

impl Selector {
    pub(crate) fn from_nodes(nodes: Vec<SelectorNode>) -> Self {
        let specificity = nodes
            .iter()
            .fold(Specificity::ZERO, |acc, n| acc + n.specificity());
        Self { nodes, specificity }
    }

    /// Compile a single selector; comma lists are rejected
    pub fn parse(source: &str) -> Result<Selector, SelectorError> {
        let mut group = SelectorGroup::parse(source)?;
        if group.0.len() != 1 {
            let offset = source.find(',').unwrap_or(0);
            return Err(SelectorError::Unexpected { found: ',', offset });
        }
        group.0.pop().ok_or(SelectorError::Empty)
    }

    pub fn nodes(&self) -> &[SelectorNode] {
        &self.nodes
    }

    /// The rightmost node
    pub fn subject(&self) -> Option<&SelectorNode> {
        self.nodes.last()
    }

    pub fn specificity(&self) -> Specificity {
        self.specificity
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

/// Comma separated selector list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectorGroup(pub Vec<Selector>);

impl SelectorGroup {
    pub fn parse(source: &str) -> Result<SelectorGroup, SelectorError> {
        SelectorParser::new(source).parse_group()
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.0
    }

    /// Specificity of the most specific member
    pub fn max_specificity(&self) -> Specificity {
        self.0
            .iter()
            .map(Selector::specificity)
            .max()
            .unwrap_or(Specificity::ZERO)
    }
}

impl FromStr for SelectorGroup {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SelectorGroup::parse(s)
    }
}

// ---- Canonical printing ----

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Universal => f.write_str("*"),
            Filter::Tag(tag) => f.write_str(tag),
            Filter::Class(class) => write!(f, ".{class}"),
            Filter::Id(id) => write!(f, "#{id}"),
            Filter::Attribute(attr) => match attr.op {
                AttributeOp::Has => write!(f, "[{}]", attr.name),
                op => write!(f, "[{}{}\"{}\"]", attr.name, op.symbol(), attr.value),
            },
            Filter::PseudoClass(pseudo) => write!(f, ":{}", pseudo.name()),
            Filter::PseudoFunction(func) => {
                write!(f, ":{}(", func.name())?;
                match func {
                    PseudoFunction::NthChild { expr, of } | PseudoFunction::NthLastChild { expr, of } => {
                        write!(f, "{expr}")?;
                        if let Some(group) = of {
                            write!(f, " of {group}")?;
                        }
                    }
                    PseudoFunction::NthOfType(expr) | PseudoFunction::NthLastOfType(expr) => {
                        write!(f, "{expr}")?;
                    }
                    PseudoFunction::Not(group) | PseudoFunction::Is(group) => write!(f, "{group}")?,
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for SelectorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for filter in &self.filters {
            write!(f, "{filter}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(node.combinator.unwrap_or(Combinator::Descendant).as_str())?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_expression_odd() {
        let expr = NthExpression::odd();
        assert!(expr.matches(1));
        assert!(!expr.matches(2));
        assert!(expr.matches(3));
        assert!(expr.matches(5));
    }

    #[test]
    fn test_nth_expression_negative_a() {
        let expr = NthExpression::new(-1, 3);
        assert!(expr.matches(1));
        assert!(expr.matches(3));
        assert!(!expr.matches(4));
    }

    #[test]
    fn test_nth_expression_extreme_values() {
        let expr = NthExpression::parse("-n-2147483648").unwrap();
        assert_eq!(expr, NthExpression::new(-1, i32::MIN));
        assert!(!expr.matches(1));
        assert!(!expr.matches(i32::MAX));

        let expr = NthExpression::new(i32::MIN, i32::MAX);
        assert!(!expr.matches(1));
        assert!(expr.matches(i32::MAX));
        assert!(NthExpression::new(-1, i32::MAX).matches(3));
    }

    #[test]
    fn test_nth_expression_parse() {
        assert_eq!(NthExpression::parse("odd"), Some(NthExpression::odd()));
        assert_eq!(NthExpression::parse("even"), Some(NthExpression::even()));
        assert_eq!(NthExpression::parse("3"), Some(NthExpression::new(0, 3)));
        assert_eq!(NthExpression::parse("2n"), Some(NthExpression::new(2, 0)));
        assert_eq!(NthExpression::parse("2n + 3"), Some(NthExpression::new(2, 3)));
        assert_eq!(NthExpression::parse("-n+4"), Some(NthExpression::new(-1, 4)));
        assert_eq!(NthExpression::parse("3n-2"), Some(NthExpression::new(3, -2)));
        assert_eq!(NthExpression::parse("n3"), None);
        assert_eq!(NthExpression::parse("abc"), None);
    }

    #[test]
    fn test_nth_expression_display() {
        assert_eq!(NthExpression::new(3, 4).to_string(), "3n+4");
        assert_eq!(NthExpression::new(-1, 4).to_string(), "-n+4");
        assert_eq!(NthExpression::new(-1, 0).to_string(), "-n");
        assert_eq!(NthExpression::new(1, -2).to_string(), "n-2");
        assert_eq!(NthExpression::new(0, 5).to_string(), "5");
    }

    #[test]
    fn test_attribute_ops() {
        let attr = |op, value: &str| AttributeSelector { name: "a".into(), op, value: value.into() };

        assert!(attr(AttributeOp::Has, "").matches(Some("")));
        assert!(!attr(AttributeOp::Has, "").matches(None));
        assert!(attr(AttributeOp::ContainsWord, "b").matches(Some("a b c")));
        assert!(!attr(AttributeOp::ContainsWord, "b").matches(Some("abc")));
        assert!(attr(AttributeOp::DashPrefixed, "en").matches(Some("en-US")));
        assert!(attr(AttributeOp::DashPrefixed, "en").matches(Some("en")));
        assert!(!attr(AttributeOp::DashPrefixed, "en").matches(Some("english")));
        assert!(attr(AttributeOp::StartsWith, "ab").matches(Some("abc")));
        assert!(attr(AttributeOp::EndsWith, "bc").matches(Some("abc")));
        assert!(attr(AttributeOp::ContainsSubstring, "b").matches(Some("abc")));
        assert!(!attr(AttributeOp::Equals, "x").matches(None));
    }

    #[test]
    fn test_specificity_order() {
        assert!(Specificity(1, 0, 0) > Specificity(0, 10, 0));
        assert!(Specificity(0, 1, 0) > Specificity(0, 0, 10));
        assert!(Specificity::MAX > Specificity(100, 100, 100));
    }
}
