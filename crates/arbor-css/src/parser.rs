//! Stylesheet compiler
//!
//! Splits the token stream into rules, variable statements and
//! declarations, evaluates every value and records problems as
//! [`Diagnostic`]s. A broken statement is skipped up to the next `;` or
//! the end of its block; the rest of the sheet still compiles.
//!
//! Rules nest, with `&` standing for the parent selector. `@if`/`@else`
//! pick a branch at compile time, `@mixin` bodies are compiled again at
//! each `@include`, and `@warn`/`@error` add their own diagnostics.

use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::expr::{Evaluator, ExprError, ExprParser, Scope, Value};
use crate::functions::FunctionRegistry;
use crate::properties::{PropertyId, Shorthand};
use crate::selector::SelectorGroup;
use crate::tokenizer::{CssToken, CssTokenizer, Token};
use crate::{Declaration, Rule, StyleOrigin, Stylesheet};

/// Stylesheet compiler
pub struct CssParser {
    registry: FunctionRegistry,
}

impl CssParser {
    pub fn new() -> Self {
        Self { registry: FunctionRegistry::with_builtins() }
    }

    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    /// Compile a user stylesheet
    pub fn parse(&self, css: &str) -> Stylesheet {
        self.parse_with_origin(css, StyleOrigin::User)
    }

    pub fn parse_with_origin(&self, css: &str, origin: StyleOrigin) -> Stylesheet {
        let mut compiler = Compiler::new(css, &self.registry);
        let rules = compiler.stylesheet();
        tracing::debug!(
            rules = rules.len(),
            diagnostics = compiler.diagnostics.len(),
            ?origin,
            "compiled stylesheet"
        );
        Stylesheet { rules, origin, diagnostics: compiler.diagnostics.into_entries() }
    }

    /// Compile the contents of a `style` attribute
    pub fn parse_inline(&self, style: &str) -> (Vec<Declaration>, Vec<Diagnostic>) {
        let mut compiler = Compiler::new(style, &self.registry);
        let declarations = compiler.inline_declarations();
        (declarations, compiler.diagnostics.into_entries())
    }
}

impl Default for CssParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a statement appears, which decides what it may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Sheet,
    Rule,
    Inline,
}

struct Compiler<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    registry: &'a FunctionRegistry,
    scope: Scope,
    diagnostics: Diagnostics,
    inline: bool,
    /// Set once an unterminated block has been reported
    truncated: bool,
    /// Compiled rules; a rule precedes the rules nested in it
    rules: Vec<Rule>,
    /// Expanded selectors of the enclosing rules, innermost last
    parents: Vec<Vec<String>>,
    /// Token index of each `@mixin` body's `{`
    mixins: HashMap<String, usize>,
    /// Mixins being expanded
    including: Vec<String>,
}

impl<'a> Compiler<'a> {
    fn new(source: &'a str, registry: &'a FunctionRegistry) -> Self {
        Self {
            source,
            tokens: CssTokenizer::new(source).tokenize_all(),
            pos: 0,
            registry,
            scope: Scope::new(),
            diagnostics: Diagnostics::new(),
            inline: false,
            truncated: false,
            rules: Vec::new(),
            parents: Vec::new(),
            mixins: HashMap::new(),
            including: Vec::new(),
        }
    }

    fn stylesheet(&mut self) -> Vec<Rule> {
        // Sheet-level statements never write declarations
        let mut scratch = Vec::new();
        self.statements(false, &mut scratch);
        std::mem::take(&mut self.rules)
    }

    fn inline_declarations(&mut self) -> Vec<Declaration> {
        self.inline = true;
        let mut declarations = Vec::new();
        self.statements(false, &mut declarations);
        declarations
    }

    fn context(&self) -> Context {
        if self.inline {
            Context::Inline
        } else if self.parents.is_empty() {
            Context::Sheet
        } else {
            Context::Rule
        }
    }

    /// Statements up to the closing `}`, or to the end of input when not
    /// `braced`. Returns `false` for an unterminated block.
    fn statements(&mut self, braced: bool, declarations: &mut Vec<Declaration>) -> bool {
        loop {
            self.skip_whitespace();
            let (line, column) = self.position();
            let context = self.context();
            match self.kind() {
                CssToken::RBrace if braced => {
                    self.pos += 1;
                    return true;
                }
                CssToken::EOF if braced => {
                    if !self.truncated {
                        self.truncated = true;
                        self.diagnostics.fatal(line, column, "Unterminated block");
                    }
                    return false;
                }
                CssToken::EOF => return true,
                CssToken::Semicolon => self.pos += 1,
                CssToken::RBrace => {
                    self.diagnostics.error(line, column, "Unexpected '}'");
                    self.pos += 1;
                }
                CssToken::LBrace => {
                    self.diagnostics.error(line, column, "Expected a selector before '{'");
                    self.skip_block();
                }
                CssToken::AtKeyword(name) => {
                    let name = name.clone();
                    self.at_rule(&name, declarations);
                }
                CssToken::Variable(_) => self.variable_statement(declarations),
                _ if context == Context::Sheet => self.rule(),
                CssToken::Function(_) => self.call_statement(declarations),
                CssToken::Ident(_) if context == Context::Inline || !self.starts_block() => {
                    self.declaration(declarations)
                }
                kind if context == Context::Rule && (matches!(kind, CssToken::Ident(_)) || starts_selector(kind)) => {
                    self.rule()
                }
                other => {
                    let message = format!("Unexpected {}", describe(other));
                    self.diagnostics.error(line, column, message);
                    self.skip_declaration();
                }
            }
        }
    }

    /// `selector-list { ... }`, one rule per selector
    fn rule(&mut self) {
        let (line, column) = self.position();
        let start = self.pos;
        loop {
            match self.kind() {
                CssToken::LBrace => break,
                CssToken::EOF => {
                    self.truncated = true;
                    self.diagnostics.fatal(line, column, "Expected '{' after selector");
                    return;
                }
                CssToken::Semicolon | CssToken::RBrace => {
                    self.diagnostics.error(line, column, "Expected '{' after selector");
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }

        let source = self.source_between(start, self.pos);
        let text = source.trim();
        let expanded = nest_selectors(text, self.parents.last().map(Vec::as_slice));
        let parsed = expanded.and_then(|selectors| {
            if selectors.is_empty() {
                return Ok((selectors, None));
            }
            let group = SelectorGroup::parse(&selectors.join(", ")).map_err(|e| e.to_string())?;
            Ok((selectors, Some(group)))
        });
        let (selectors, group) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                let message = format!("Invalid selector '{text}': {e}");
                self.diagnostics.error(line, column, message);
                (Vec::new(), None)
            }
        };

        let mark = self.rules.len();
        self.parents.push(selectors);
        let declarations = self.block();
        self.parents.pop();

        let (Some(declarations), Some(group)) = (declarations, group) else {
            return;
        };
        let nested = self.rules.split_off(mark);
        self.rules.extend(
            group
                .0
                .into_iter()
                .map(|selector| Rule { selector, declarations: declarations.clone() }),
        );
        self.rules.extend(nested);
    }

    /// `{ ... }` with its own variable scope. `None` when unterminated.
    fn block(&mut self) -> Option<Vec<Declaration>> {
        self.pos += 1;
        self.scope.push();
        let mut declarations = Vec::new();
        let closed = self.statements(true, &mut declarations);
        self.scope.pop();
        closed.then_some(declarations)
    }

    fn at_rule(&mut self, name: &str, declarations: &mut Vec<Declaration>) {
        let (line, column) = self.position();
        match name {
            "if" => self.conditional(declarations),
            "else" => {
                self.diagnostics.error(line, column, "'@else' without '@if'");
                self.skip_statement();
            }
            "mixin" => self.mixin(),
            "include" => self.include(declarations),
            "warn" | "error" | "print" | "debug" => self.log_statement(name, declarations),
            _ => {
                let message = format!("Unsupported at-rule '@{name}'");
                self.diagnostics.warn(line, column, message);
                self.skip_statement();
            }
        }
    }

    /// `@if cond { } [@else if cond { }]* [@else { }]`. Only the first
    /// branch whose condition holds is compiled.
    fn conditional(&mut self, declarations: &mut Vec<Declaration>) {
        self.pos += 1;
        let mut settled = self.if_branch(declarations);
        loop {
            let resume = self.pos;
            self.skip_whitespace();
            if !matches!(self.kind(), CssToken::AtKeyword(k) if k == "else") {
                self.pos = resume;
                return;
            }
            let (line, column) = self.position();
            self.pos += 1;
            self.skip_whitespace();
            let chained = matches!(self.kind(), CssToken::Ident(k) if k == "if");

            if settled {
                self.skip_statement();
            } else if chained {
                self.pos += 1;
                settled = self.if_branch(declarations);
            } else if self.kind() == &CssToken::LBrace {
                self.branch(declarations);
            } else {
                self.diagnostics.error(line, column, "Expected '{' after '@else'");
                self.skip_statement();
            }
            if !chained {
                return;
            }
        }
    }

    /// Condition and block of one `@if` branch. Returns whether the chain
    /// is settled, either by a true condition or by an error.
    fn if_branch(&mut self, declarations: &mut Vec<Declaration>) -> bool {
        match self.condition(declarations) {
            Some(true) => {
                self.branch(declarations);
                true
            }
            Some(false) => {
                self.skip_block();
                false
            }
            None => true,
        }
    }

    /// `None` after reporting a broken condition; its block is skipped
    fn condition(&mut self, declarations: &mut Vec<Declaration>) -> Option<bool> {
        let (line, column) = self.position();
        let values = self.values(declarations)?;
        self.skip_whitespace();
        if self.kind() != &CssToken::LBrace {
            let message = format!("Expected '{{' after condition, found {}", describe(self.kind()));
            self.diagnostics.error(line, column, message);
            self.skip_statement();
            return None;
        }
        match <[Value; 1]>::try_from(values) {
            Ok([value]) => Some(value.is_truthy()),
            Err(values) => {
                let message = format!("'@if' expects a single condition, got {}", values.len());
                self.diagnostics.error(line, column, message);
                self.skip_block();
                None
            }
        }
    }

    /// Branch bodies share the enclosing scope and declarations
    fn branch(&mut self, declarations: &mut Vec<Declaration>) {
        self.pos += 1;
        self.statements(true, declarations);
    }

    /// `@mixin name { ... }`
    fn mixin(&mut self) {
        let (line, column) = self.position();
        self.pos += 1;
        self.skip_whitespace();
        let CssToken::Ident(name) = self.kind().clone() else {
            self.diagnostics.error(line, column, "Expected a name after '@mixin'");
            self.skip_statement();
            return;
        };
        self.pos += 1;
        self.skip_whitespace();
        if self.kind() != &CssToken::LBrace {
            self.diagnostics.error(line, column, format!("Expected '{{' after '@mixin {name}'"));
            self.skip_statement();
            return;
        }

        let body = self.pos;
        if !self.skip_block() {
            if !self.truncated {
                self.truncated = true;
                self.diagnostics.fatal(line, column, "Unterminated block");
            }
            return;
        }
        tracing::trace!(%name, line, "defined mixin");
        self.mixins.insert(name, body);
    }

    /// `@include name;` compiles the mixin body in place
    fn include(&mut self, declarations: &mut Vec<Declaration>) {
        let (line, column) = self.position();
        self.pos += 1;
        self.skip_whitespace();
        let CssToken::Ident(name) = self.kind().clone() else {
            self.diagnostics.error(line, column, "Expected a name after '@include'");
            self.skip_statement();
            return;
        };
        self.pos += 1;
        if !self.end_of_statement() {
            return;
        }

        if self.context() == Context::Sheet {
            self.diagnostics.error(line, column, "'@include' is only allowed inside a rule");
            return;
        }
        let Some(&body) = self.mixins.get(&name) else {
            self.diagnostics.error(line, column, format!("Unknown mixin '{name}'"));
            return;
        };
        if self.including.contains(&name) {
            self.diagnostics.error(line, column, format!("Mixin '{name}' includes itself"));
            return;
        }

        let resume = self.pos;
        self.pos = body + 1;
        self.including.push(name);
        self.scope.push();
        self.statements(true, declarations);
        self.scope.pop();
        self.including.pop();
        self.pos = resume;
    }

    /// `@warn` and `@error` report a diagnostic; `@print` and `@debug` log
    fn log_statement(&mut self, name: &str, declarations: &mut Vec<Declaration>) {
        let (line, column) = self.position();
        self.pos += 1;
        self.skip_whitespace();
        let message = if matches!(self.kind(), CssToken::Semicolon | CssToken::RBrace | CssToken::EOF) {
            format!("@{name}")
        } else {
            let Some(values) = self.values(declarations) else {
                return;
            };
            values
                .iter()
                .map(|value| match value {
                    Value::Str(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        };
        if !self.end_of_statement() {
            return;
        }

        match name {
            "warn" => self.diagnostics.warn(line, column, message),
            "error" => self.diagnostics.error(line, column, message),
            "debug" => tracing::debug!(line, column, "{message}"),
            _ => tracing::info!(line, column, "{message}"),
        }
    }

    /// `property: values [!important];`
    fn declaration(&mut self, declarations: &mut Vec<Declaration>) {
        let (line, column) = self.position();
        let CssToken::Ident(name) = self.kind().clone() else {
            return;
        };
        self.pos += 1;
        if !self.expect_colon(&name) {
            return;
        }

        let Some(values) = self.values(declarations) else {
            return;
        };
        let Some(important) = self.important() else {
            return;
        };
        if !self.end_of_statement() {
            return;
        }
        if let Err(message) = assign(&name, &values, important, declarations) {
            self.diagnostics.error(line, column, message);
        }
    }

    /// `$name: value;`
    fn variable_statement(&mut self, declarations: &mut Vec<Declaration>) {
        let (line, column) = self.position();
        let CssToken::Variable(name) = self.kind().clone() else {
            return;
        };
        self.pos += 1;
        if !self.expect_colon(&format!("${name}")) {
            return;
        }

        let Some(values) = self.values(declarations) else {
            return;
        };
        if !self.end_of_statement() {
            return;
        }
        match <[Value; 1]>::try_from(values) {
            Ok([value]) => self.scope.define(&name, value),
            Err(values) => {
                let message = format!("Variable '${name}' expects a single value, got {}", values.len());
                self.diagnostics.error(line, column, message);
            }
        }
    }

    /// A bare call such as `set-property(width, 10px);`
    fn call_statement(&mut self, declarations: &mut Vec<Declaration>) {
        if self.values(declarations).is_some() {
            self.end_of_statement();
        }
    }

    /// Parse and evaluate a value list. Errors are reported and the rest of
    /// the statement is skipped.
    fn values(&mut self, declarations: &mut Vec<Declaration>) -> Option<Vec<Value>> {
        let mut parser = ExprParser::new(&self.tokens, self.pos);
        let exprs = parser.parse_value_list();
        self.pos = parser.pos;

        let result = exprs.and_then(|exprs| {
            let mut evaluator = Evaluator {
                registry: self.registry,
                scope: &self.scope,
                diagnostics: &mut self.diagnostics,
                declarations,
            };
            exprs.iter().map(|e| evaluator.eval(e)).collect::<Result<Vec<_>, ExprError>>()
        });

        match result {
            Ok(values) if values.is_empty() => {
                let (line, column) = self.position();
                self.diagnostics.error(line, column, "Expected a value");
                self.skip_declaration();
                None
            }
            Ok(values) => Some(values),
            Err(e) => {
                self.diagnostics.error(e.line, e.column, e.message);
                self.skip_declaration();
                None
            }
        }
    }

    fn expect_colon(&mut self, name: &str) -> bool {
        self.skip_whitespace();
        if self.kind() == &CssToken::Colon {
            self.pos += 1;
            return true;
        }
        let (line, column) = self.position();
        self.diagnostics.error(line, column, format!("Expected ':' after '{name}'"));
        self.skip_declaration();
        false
    }

    /// Optional `!important`; `None` after reporting a malformed one
    fn important(&mut self) -> Option<bool> {
        self.skip_whitespace();
        if self.kind() != &CssToken::Delim('!') {
            return Some(false);
        }
        let (line, column) = self.position();
        self.pos += 1;
        self.skip_whitespace();
        match self.kind() {
            CssToken::Ident(word) if word.eq_ignore_ascii_case("important") => {
                self.pos += 1;
                Some(true)
            }
            _ => {
                self.diagnostics.error(line, column, "Expected 'important' after '!'");
                self.skip_declaration();
                None
            }
        }
    }

    /// Consume `;`, or accept a following `}` or end of input
    fn end_of_statement(&mut self) -> bool {
        self.skip_whitespace();
        match self.kind() {
            CssToken::Semicolon => {
                self.pos += 1;
                true
            }
            CssToken::RBrace | CssToken::EOF => true,
            other => {
                let message = format!("Expected ';', found {}", describe(other));
                let (line, column) = self.position();
                self.diagnostics.error(line, column, message);
                self.skip_declaration();
                false
            }
        }
    }

    /// Skip past the next `;`, or stop before the `}` closing this block.
    /// A nested block is skipped whole and ends the statement.
    fn skip_declaration(&mut self) {
        loop {
            match self.kind() {
                CssToken::EOF | CssToken::RBrace => return,
                CssToken::Semicolon => {
                    self.pos += 1;
                    return;
                }
                CssToken::LBrace => {
                    self.skip_block();
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Skip a top-level statement ending in `;` or a block
    fn skip_statement(&mut self) {
        loop {
            match self.kind() {
                CssToken::EOF => return,
                CssToken::Semicolon => {
                    self.pos += 1;
                    return;
                }
                CssToken::LBrace => {
                    self.skip_block();
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Skip from `{` through its matching `}`. `false` at end of input.
    fn skip_block(&mut self) -> bool {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                CssToken::EOF => return false,
                CssToken::LBrace => depth += 1,
                CssToken::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.pos += 1;
                        return true;
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Whether a `{` comes before the current statement ends
    fn starts_block(&self) -> bool {
        let mut depth = 0usize;
        for token in self.tokens.get(self.pos..).unwrap_or_default() {
            match &token.kind {
                CssToken::Function(_) | CssToken::LParen | CssToken::LBracket => depth += 1,
                CssToken::RParen | CssToken::RBracket => depth = depth.saturating_sub(1),
                CssToken::LBrace if depth == 0 => return true,
                CssToken::LBrace | CssToken::Semicolon | CssToken::RBrace | CssToken::EOF => return false,
                _ => {}
            }
        }
        false
    }

    fn skip_whitespace(&mut self) {
        while self.kind() == &CssToken::Whitespace {
            self.pos += 1;
        }
    }

    fn kind(&self) -> &CssToken {
        self.tokens.get(self.pos).map_or(&CssToken::EOF, |t| &t.kind)
    }

    fn position(&self) -> (u32, u32) {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map_or((1, 1), |t| (t.line, t.column))
    }

    /// Source text covered by tokens `start..end`
    fn source_between(&self, start: usize, end: usize) -> String {
        let (Some(first), Some(last)) = (self.tokens.get(start), end.checked_sub(1).and_then(|i| self.tokens.get(i)))
        else {
            return String::new();
        };
        if end <= start {
            return String::new();
        }
        CssTokenizer::slice(self.source, (first.span.0, last.span.1))
    }
}

/// Store a declaration, expanding shorthands. Every longhand must coerce
/// or none is stored.
fn assign(name: &str, values: &[Value], important: bool, declarations: &mut Vec<Declaration>) -> Result<(), String> {
    let assignments = if let Some(shorthand) = Shorthand::from_name(name) {
        shorthand.expand(values).map_err(|e| format!("{name}: {e}"))?
    } else {
        let id = PropertyId::from_name(name).ok_or_else(|| format!("Unknown property '{name}'"))?;
        match values {
            [value] => vec![(id, value.clone())],
            _ => return Err(format!("Property '{name}' expects a single value, got {}", values.len())),
        }
    };

    let coerced = assignments
        .iter()
        .map(|(id, value)| id.coerce(value).map(|value| Declaration { property: *id, value, important }))
        .collect::<Result<Vec<_>, _>>()?;
    for declaration in coerced {
        Declaration::upsert(declarations, declaration);
    }
    Ok(())
}

/// Expand a nested selector list against its parents. `&` stands for the
/// parent selector; without one the parent becomes an ancestor.
fn nest_selectors(text: &str, parents: Option<&[String]>) -> Result<Vec<String>, String> {
    let children = split_selector_list(text);
    if children.iter().any(|c| c.is_empty()) {
        return Err("empty selector in list".into());
    }
    let Some(parents) = parents else {
        if text.contains('&') {
            return Err("'&' outside a nested rule".into());
        }
        return Ok(children.into_iter().map(str::to_string).collect());
    };

    let mut nested = Vec::with_capacity(parents.len() * children.len());
    for parent in parents {
        for child in &children {
            nested.push(if child.contains('&') {
                child.replace('&', parent)
            } else {
                format!("{parent} {child}")
            });
        }
    }
    Ok(nested)
}

/// Split on commas outside parentheses, brackets and quotes
fn split_selector_list(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts
}

fn starts_selector(token: &CssToken) -> bool {
    matches!(
        token,
        CssToken::Hash(_) | CssToken::Colon | CssToken::LBracket | CssToken::Delim('&' | '.' | '*' | '>' | '+' | '~')
    )
}

fn describe(token: &CssToken) -> String {
    match token {
        CssToken::Ident(s) => format!("'{s}'"),
        CssToken::Function(s) => format!("'{s}('"),
        CssToken::AtKeyword(s) => format!("'@{s}'"),
        CssToken::Hash(s) => format!("'#{s}'"),
        CssToken::Variable(s) => format!("'${s}'"),
        CssToken::Delim(c) => format!("'{c}'"),
        CssToken::Colon => "':'".into(),
        CssToken::Comma => "','".into(),
        CssToken::LBracket => "'['".into(),
        CssToken::RBracket => "']'".into(),
        CssToken::LParen => "'('".into(),
        CssToken::RParen => "')'".into(),
        CssToken::LBrace => "'{'".into(),
        CssToken::RBrace => "'}'".into(),
        CssToken::EOF => "end of input".into(),
        other => format!("{other:?}"),
    }
}
