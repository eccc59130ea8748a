//! Selector parser
//!
//! Recursive descent over characters. Arguments of pseudo-functions are
//! cut out by paren matching and parsed by a nested parser.

use crate::selector::{
    AttributeOp, AttributeSelector, Combinator, Filter, NthExpression, PseudoClass,
    PseudoFunction, Selector, SelectorError, SelectorGroup, SelectorNode,
};

pub(crate) struct SelectorParser {
    chars: Vec<char>,
    pos: usize,
}

type ParseResult<T> = Result<T, SelectorError>;

impl SelectorParser {
    pub(crate) fn new(source: &str) -> Self {
        Self { chars: source.chars().collect(), pos: 0 }
    }

    pub(crate) fn parse_group(mut self) -> ParseResult<SelectorGroup> {
        let mut selectors = Vec::new();
        loop {
            selectors.push(self.parse_selector()?);
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some(found) => return Err(self.unexpected(found)),
            }
        }
        Ok(SelectorGroup(selectors))
    }

    fn parse_selector(&mut self) -> ParseResult<Selector> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(SelectorError::Empty);
        }
        let mut nodes = vec![self.parse_compound(None)?];

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::AdjacentSibling,
                Some('~') => Combinator::Sibling,
                Some(_) if had_space => Combinator::Descendant,
                Some(found) => return Err(self.unexpected(found)),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }
            nodes.push(self.parse_compound(Some(combinator))?);
        }

        Ok(Selector::from_nodes(nodes))
    }

    fn parse_compound(&mut self, combinator: Option<Combinator>) -> ParseResult<SelectorNode> {
        let mut filters = Vec::new();
        while let Some(c) = self.peek() {
            let filter = match c {
                '*' => {
                    self.pos += 1;
                    Filter::Universal
                }
                '.' => {
                    self.pos += 1;
                    Filter::Class(self.parse_name()?)
                }
                '#' => {
                    self.pos += 1;
                    Filter::Id(self.parse_name()?)
                }
                '[' => self.parse_attribute()?,
                ':' => self.parse_pseudo()?,
                c if is_name_char(c) && filters.is_empty() => Filter::Tag(self.parse_name()?),
                _ => break,
            };
            filters.push(filter);
        }

        if filters.is_empty() {
            return Err(match self.peek() {
                Some(found) => self.unexpected(found),
                None => SelectorError::UnexpectedEnd,
            });
        }
        Ok(SelectorNode { combinator, filters })
    }

    fn parse_attribute(&mut self) -> ParseResult<Filter> {
        self.expect('[')?;
        self.skip_whitespace();
        let name = self.parse_name()?;
        self.skip_whitespace();

        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(Filter::Attribute(AttributeSelector { name, op: AttributeOp::Has, value: String::new() }));
        }

        let mut symbol = String::new();
        while let Some(c) = self.peek().filter(|c| "~|^$*=".contains(*c)) {
            symbol.push(c);
            self.pos += 1;
            if c == '=' {
                break;
            }
        }
        let op = AttributeOp::from_symbol(&symbol).ok_or_else(|| match self.peek() {
            Some(found) => self.unexpected(found),
            None => SelectorError::UnexpectedEnd,
        })?;

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => self.parse_quoted(quote)?,
            Some(_) => self.parse_name()?,
            None => return Err(SelectorError::UnexpectedEnd),
        };
        self.skip_whitespace();
        self.expect(']')?;

        Ok(Filter::Attribute(AttributeSelector { name, op, value }))
    }

    fn parse_pseudo(&mut self) -> ParseResult<Filter> {
        self.expect(':')?;
        if self.peek() == Some(':') {
            return Err(self.unexpected(':'));
        }
        let name = self.parse_name()?.to_ascii_lowercase();

        if self.peek() != Some('(') {
            return PseudoClass::parse(&name)
                .map(Filter::PseudoClass)
                .ok_or(SelectorError::UnknownPseudo(name));
        }

        let args = self.take_parenthesized()?;
        let function = match name.as_str() {
            "nth-child" | "nth-last-child" => {
                let (expr, of) = split_of(&args);
                let expr = NthExpression::parse(expr).ok_or_else(|| SelectorError::InvalidNth(args.clone()))?;
                let of = of.map(SelectorGroup::parse).transpose()?;
                if name == "nth-child" {
                    PseudoFunction::NthChild { expr, of }
                } else {
                    PseudoFunction::NthLastChild { expr, of }
                }
            }
            "nth-of-type" | "nth-last-of-type" => {
                let expr = NthExpression::parse(&args).ok_or_else(|| SelectorError::InvalidNth(args.clone()))?;
                if name == "nth-of-type" {
                    PseudoFunction::NthOfType(expr)
                } else {
                    PseudoFunction::NthLastOfType(expr)
                }
            }
            "not" => PseudoFunction::Not(SelectorGroup::parse(&args)?),
            "is" => PseudoFunction::Is(SelectorGroup::parse(&args)?),
            _ => return Err(SelectorError::UnknownPseudo(name)),
        };
        Ok(Filter::PseudoFunction(function))
    }

    /// Consume `( ... )` and return the text between the outer parens
    fn take_parenthesized(&mut self) -> ParseResult<String> {
        self.expect('(')?;
        let mut depth = 1;
        let mut quote: Option<char> = None;
        let mut out = String::new();

        while let Some(c) = self.peek() {
            self.pos += 1;
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '(') => depth += 1,
                (None, ')') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                }
                _ => {}
            }
            out.push(c);
        }
        Err(SelectorError::UnexpectedEnd)
    }

    fn parse_name(&mut self) -> ParseResult<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(match self.peek() {
                Some(found) => self.unexpected(found),
                None => SelectorError::UnexpectedEnd,
            });
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_quoted(&mut self, quote: char) -> ParseResult<String> {
        self.expect(quote)?;
        let mut value = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                c if c == quote => return Ok(value),
                '\\' => {
                    if let Some(next) = self.peek() {
                        value.push(next);
                        self.pos += 1;
                    }
                }
                c => value.push(c),
            }
        }
        Err(SelectorError::UnexpectedEnd)
    }

    fn expect(&mut self, expected: char) -> ParseResult<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(self.unexpected(found)),
            None => Err(SelectorError::UnexpectedEnd),
        }
    }

    /// Returns whether anything was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos != start
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::Unexpected { found, offset: self.pos }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Split `2n+1 of .a, .b` at the ` of ` keyword
fn split_of(args: &str) -> (&str, Option<&str>) {
    for (i, c) in args.char_indices() {
        if !c.is_whitespace() {
            continue;
        }
        let rest = args[i..].trim_start();
        if let Some(after) = rest.strip_prefix("of") {
            if after.starts_with(char::is_whitespace) {
                return (&args[..i], Some(after.trim()));
            }
        }
    }
    (args, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Specificity;

    fn round_trip(source: &str) {
        let group = SelectorGroup::parse(source).unwrap();
        assert_eq!(group.to_string(), source);
    }

    #[test]
    fn test_round_trip_canonical() {
        round_trip("tag.className");
        round_trip("tag, #elementId");
        round_trip("div > p + span ~ a b");
        round_trip("[data-x=\"1\"]");
        round_trip("a[href^=\"http\"][target]");
        round_trip(":nth-child(3n+4)");
        round_trip(":nth-child(-n+4)");
        round_trip(":nth-child(-n)");
        round_trip(":nth-child(2n+1 of .item)");
        round_trip("li:not(.a, .b)");
        round_trip(":is(h1, h2) > span:first-child");
        round_trip("*");
    }

    #[test]
    fn test_combinator_whitespace_normalised() {
        let group = SelectorGroup::parse("a>b   +c").unwrap();
        assert_eq!(group.to_string(), "a > b + c");
    }

    #[test]
    fn test_errors() {
        assert_eq!(SelectorGroup::parse(""), Err(SelectorError::Empty));
        assert_eq!(SelectorGroup::parse("a >"), Err(SelectorError::UnexpectedEnd));
        assert!(matches!(SelectorGroup::parse(":bogus"), Err(SelectorError::UnknownPseudo(_))));
        assert!(matches!(SelectorGroup::parse(":nth-child(x)"), Err(SelectorError::InvalidNth(_))));
        assert!(matches!(SelectorGroup::parse("a::before"), Err(SelectorError::Unexpected { .. })));
        assert!(matches!(SelectorGroup::parse("[a=]"), Err(SelectorError::Unexpected { .. })));
        assert!(matches!(SelectorGroup::parse(":not(a"), Err(SelectorError::UnexpectedEnd)));
    }

    #[test]
    fn test_single_selector_rejects_list() {
        assert!(Selector::parse("a, b").is_err());
        assert!(Selector::parse("a b").is_ok());
    }

    #[test]
    fn test_specificity() {
        let specificity_of = |s: &str| Selector::parse(s).unwrap().specificity();
        assert_eq!(specificity_of("*"), Specificity(0, 0, 0));
        assert_eq!(specificity_of("div"), Specificity(0, 0, 1));
        assert_eq!(specificity_of("div.a.b"), Specificity(0, 2, 1));
        assert_eq!(specificity_of("#x [y]:hover"), Specificity(1, 2, 0));
        assert_eq!(specificity_of(":not(#x, .y)"), Specificity(1, 0, 0));
        assert_eq!(specificity_of(":nth-child(2n of .a)"), Specificity(0, 2, 0));
    }

    #[test]
    fn test_split_of() {
        assert_eq!(split_of("2n+1 of .a"), ("2n+1", Some(".a")));
        assert_eq!(split_of("odd"), ("odd", None));
        assert_eq!(split_of("2n of offset"), ("2n", Some("offset")));
    }
}
