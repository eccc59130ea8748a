//! Stylesheet tokenizer
//!
//! Turns source text into [`Token`]s carrying their line, column and
//! character span. Besides CSS tokens it recognises `$variables` and `//`
//! line comments.

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum CssToken {
    Ident(String),
    /// Identifier immediately followed by `(`; the paren is consumed
    Function(String),
    AtKeyword(String),
    Hash(String),
    String(String),
    /// `$name`
    Variable(String),
    Number(f32),
    Percentage(f32),
    Dimension { value: f32, unit: String },
    Whitespace,
    Colon,
    Semicolon,
    Comma,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Delim(char),
    EOF,
}

/// Token plus source position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: CssToken,
    pub line: u32,
    pub column: u32,
    /// Character offsets `[start, end)` into the source
    pub span: (usize, usize),
}

pub struct CssTokenizer {
    input: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl CssTokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input. The last token is always `EOF`.
    pub fn tokenize_all(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == CssToken::EOF;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    /// Source text of a character span
    pub fn slice(source: &str, span: (usize, usize)) -> String {
        source.chars().skip(span.0).take(span.1.saturating_sub(span.0)).collect()
    }

    pub fn next_token(&mut self) -> Token {
        self.consume_comments();
        let (line, column, start) = (self.line, self.column, self.pos);
        let kind = self.consume_token();
        Token { kind, line, column, span: (start, self.pos) }
    }

    fn consume_token(&mut self) -> CssToken {
        let Some(ch) = self.peek() else {
            return CssToken::EOF;
        };

        if ch.is_whitespace() {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }
            return CssToken::Whitespace;
        }

        if ch == '"' || ch == '\'' {
            return self.consume_string(ch);
        }

        if ch.is_ascii_digit() || (ch == '.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())) {
            return self.consume_numeric();
        }

        // Signed number only where a value cannot precede it: `1 -2` is two
        // values, `1-2` and `1 - 2` are subtractions.
        if (ch == '-' || ch == '+') && self.starts_number_at(1) && !self.previous_is_value() {
            return self.consume_numeric();
        }

        if is_name_start(ch) || (ch == '-' && self.peek_at(1).is_some_and(|c| is_name_start(c) || c == '-')) {
            let name = self.consume_name();
            if self.peek() == Some('(') {
                self.advance();
                return CssToken::Function(name);
            }
            return CssToken::Ident(name);
        }

        self.advance();
        match ch {
            '#' if self.peek().is_some_and(is_name_char) => CssToken::Hash(self.consume_name()),
            '$' if self.peek().is_some_and(is_name_start) => CssToken::Variable(self.consume_name()),
            '@' if self.peek().is_some_and(is_name_start) => CssToken::AtKeyword(self.consume_name()),
            ':' => CssToken::Colon,
            ';' => CssToken::Semicolon,
            ',' => CssToken::Comma,
            '[' => CssToken::LBracket,
            ']' => CssToken::RBracket,
            '(' => CssToken::LParen,
            ')' => CssToken::RParen,
            '{' => CssToken::LBrace,
            '}' => CssToken::RBrace,
            other => CssToken::Delim(other),
        }
    }

    fn consume_comments(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some('/'), Some('*')) => {
                    self.advance();
                    self.advance();
                    while self.peek().is_some() && !(self.peek() == Some('*') && self.peek_at(1) == Some('/')) {
                        self.advance();
                    }
                    self.advance();
                    self.advance();
                }
                (Some('/'), Some('/')) => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn consume_string(&mut self, quote: char) -> CssToken {
        self.advance();
        let mut value = String::new();
        while let Some(c) = self.peek() {
            self.advance();
            match c {
                c if c == quote => break,
                '\\' => {
                    if let Some(escaped) = self.peek() {
                        value.push(escaped);
                        self.advance();
                    }
                }
                c => value.push(c),
            }
        }
        CssToken::String(value)
    }

    fn consume_numeric(&mut self) -> CssToken {
        let mut text = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            text.push(sign);
            self.advance();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())) {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let value: f32 = text.parse().unwrap_or(0.0);

        if self.peek() == Some('%') {
            self.advance();
            return CssToken::Percentage(value);
        }
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            let mut unit = String::new();
            while let Some(c) = self.peek().filter(char::is_ascii_alphabetic) {
                unit.push(c);
                self.advance();
            }
            return CssToken::Dimension { value, unit };
        }
        CssToken::Number(value)
    }

    fn consume_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek().filter(|c| is_name_char(*c)) {
            name.push(c);
            self.advance();
        }
        name
    }

    fn starts_number_at(&self, offset: usize) -> bool {
        match self.peek_at(offset) {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.peek_at(offset + 1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn previous_is_value(&self) -> bool {
        self.pos > 0
            && self
                .input
                .get(self.pos - 1)
                .is_some_and(|c| c.is_alphanumeric() || matches!(c, ')' | '%' | '_'))
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<CssToken> {
        CssTokenizer::new(input)
            .tokenize_all()
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| *k != CssToken::Whitespace && *k != CssToken::EOF)
            .collect()
    }

    #[test]
    fn test_declaration_tokens() {
        assert_eq!(
            kinds("width: 10px;"),
            vec![
                CssToken::Ident("width".into()),
                CssToken::Colon,
                CssToken::Dimension { value: 10.0, unit: "px".into() },
                CssToken::Semicolon,
            ]
        );
    }

    #[test]
    fn test_function_and_hash() {
        assert_eq!(
            kinds("rgb(1, 2) #fff"),
            vec![
                CssToken::Function("rgb".into()),
                CssToken::Number(1.0),
                CssToken::Comma,
                CssToken::Number(2.0),
                CssToken::RParen,
                CssToken::Hash("fff".into()),
            ]
        );
    }

    #[test]
    fn test_signed_numbers_vs_subtraction() {
        assert_eq!(
            kinds("1 -2"),
            vec![CssToken::Number(1.0), CssToken::Number(-2.0)]
        );
        assert_eq!(
            kinds("1-2"),
            vec![CssToken::Number(1.0), CssToken::Delim('-'), CssToken::Number(2.0)]
        );
        assert_eq!(
            kinds("10px - 5px"),
            vec![
                CssToken::Dimension { value: 10.0, unit: "px".into() },
                CssToken::Delim('-'),
                CssToken::Dimension { value: 5.0, unit: "px".into() },
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("/* a */ b // c\n d"),
            vec![CssToken::Ident("b".into()), CssToken::Ident("d".into())]
        );
    }

    #[test]
    fn test_variables_and_percent() {
        assert_eq!(
            kinds("$gap: 50%"),
            vec![
                CssToken::Variable("gap".into()),
                CssToken::Colon,
                CssToken::Percentage(50.0),
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = CssTokenizer::new("a\n  b").tokenize_all();
        let b = tokens.iter().find(|t| t.kind == CssToken::Ident("b".into())).unwrap();
        assert_eq!((b.line, b.column), (2, 3));
        assert_eq!(CssTokenizer::slice("a\n  b", b.span), "b");
    }
}
