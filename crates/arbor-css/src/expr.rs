//! Value expressions
//!
//! Declaration values are parsed into [`Expr`] trees and evaluated to a
//! concrete [`Value`] at compile time. Evaluation checks units, looks up
//! `$variables` and dispatches calls through the [`FunctionRegistry`].

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::diagnostics::Diagnostics;
use crate::functions::{CallContext, FunctionRegistry};
use crate::properties::PropertyValue;
use crate::tokenizer::{CssToken, Token};
use crate::values::{BinaryOp, Primitive, Unit};
use crate::{Color, Declaration};

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Primitive(Primitive),
    Color(Color),
    Ident(String),
    Str(String),
    Bool(bool),
}

impl Value {
    /// Truthiness used by `if()`
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Primitive(p) => p.value != 0.0,
            Value::Ident(s) => s != "false" && s != "none",
            Value::Str(s) => !s.is_empty(),
            Value::Color(_) => true,
        }
    }
}

impl From<&PropertyValue> for Value {
    fn from(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Keyword(k) => Value::Ident(k.as_str().to_string()),
            PropertyValue::Length(p) => Value::Primitive(*p),
            PropertyValue::Color(c) => Value::Color(*c),
            PropertyValue::Number(n) => Value::Primitive(Primitive::number(*n)),
            PropertyValue::Integer(i) => Value::Primitive(Primitive::number(*i as f32)),
            PropertyValue::Bool(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Primitive(p) => write!(f, "{p}"),
            Value::Color(c) => write!(f, "{c}"),
            Value::Ident(s) => f.write_str(s),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Value),
    Variable(String),
    Call { name: String, args: Vec<Expr> },
    Negate(Box<Expr>),
    Arith { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Compare { op: CompareOp, lhs: Box<Expr>, rhs: Box<Expr> },
}

/// Expression with the position of its first token
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
    pub column: u32,
}

/// Parse or evaluation failure, reported as ERR
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExprError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl ExprError {
    fn at(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self { message: message.into(), line, column }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Expression parser over a token slice. Whitespace separates list items,
/// so it is only skipped where an operator may follow.
pub(crate) struct ExprParser<'t> {
    tokens: &'t [Token],
    pub(crate) pos: usize,
}

type ParseResult<T> = Result<T, ExprError>;

impl<'t> ExprParser<'t> {
    pub(crate) fn new(tokens: &'t [Token], pos: usize) -> Self {
        Self { tokens, pos }
    }

    /// Parse values until `;`, `{`, `}`, `!` or end of input
    pub(crate) fn parse_value_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.kind() {
                CssToken::Semicolon | CssToken::LBrace | CssToken::RBrace | CssToken::EOF => break,
                CssToken::Delim('!') if !self.next_is_equals() => break,
                CssToken::Comma => self.pos += 1,
                _ => items.push(self.parse_expr()?),
            }
        }
        Ok(items)
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        let lhs = self.parse_additive()?;
        let save = self.pos;
        self.skip_whitespace();

        let op = match (self.kind(), self.peek_kind(1)) {
            (CssToken::Delim('='), CssToken::Delim('=')) => Some((CompareOp::Eq, 2)),
            (CssToken::Delim('!'), CssToken::Delim('=')) => Some((CompareOp::Ne, 2)),
            (CssToken::Delim('<'), CssToken::Delim('=')) => Some((CompareOp::Le, 2)),
            (CssToken::Delim('>'), CssToken::Delim('=')) => Some((CompareOp::Ge, 2)),
            (CssToken::Delim('<'), _) => Some((CompareOp::Lt, 1)),
            (CssToken::Delim('>'), _) => Some((CompareOp::Gt, 1)),
            _ => None,
        };
        let Some((op, width)) = op else {
            self.pos = save;
            return Ok(lhs);
        };
        self.pos += width;
        self.skip_whitespace();
        let rhs = self.parse_additive()?;
        Ok(Expr {
            line: lhs.line,
            column: lhs.column,
            kind: ExprKind::Compare { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
        })
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let save = self.pos;
            self.skip_whitespace();
            let op = match self.kind() {
                CssToken::Delim('+') => BinaryOp::Add,
                CssToken::Delim('-') => BinaryOp::Sub,
                _ => {
                    self.pos = save;
                    return Ok(lhs);
                }
            };
            self.pos += 1;
            self.skip_whitespace();
            let rhs = self.parse_term()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let save = self.pos;
            self.skip_whitespace();
            let op = match self.kind() {
                CssToken::Delim('*') => BinaryOp::Mul,
                CssToken::Delim('/') => BinaryOp::Div,
                _ => {
                    self.pos = save;
                    return Ok(lhs);
                }
            };
            self.pos += 1;
            self.skip_whitespace();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.kind() == &CssToken::Delim('-') {
            let (line, column) = self.position();
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(Expr { kind: ExprKind::Negate(Box::new(inner)), line, column });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let (line, column) = self.position();
        let literal = |value| Ok(Expr { kind: ExprKind::Literal(value), line, column });

        let token = self.kind().clone();
        self.pos += 1;
        match token {
            CssToken::Number(n) => literal(Value::Primitive(Primitive::number(n))),
            CssToken::Percentage(n) => literal(Value::Primitive(Primitive::percent(n))),
            CssToken::Dimension { value, unit } => match Unit::from_suffix(&unit) {
                Some(unit) => literal(Value::Primitive(Primitive::new(value, unit))),
                None => Err(ExprError::at(line, column, format!("Unknown unit '{unit}'"))),
            },
            CssToken::Hash(hex) => match Color::parse_literal(&format!("#{hex}")) {
                Some(color) => literal(Value::Color(color)),
                None => Err(ExprError::at(line, column, format!("Invalid color '#{hex}'"))),
            },
            CssToken::Ident(name) => literal(match name.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::Ident(name),
            }),
            CssToken::String(s) => literal(Value::Str(s)),
            CssToken::Variable(name) => Ok(Expr { kind: ExprKind::Variable(name), line, column }),
            CssToken::Function(name) => {
                let args = self.parse_arguments()?;
                Ok(Expr { kind: ExprKind::Call { name, args }, line, column })
            }
            CssToken::LParen => {
                self.skip_whitespace();
                let inner = self.parse_expr()?;
                self.skip_whitespace();
                self.expect_close()?;
                Ok(inner)
            }
            CssToken::EOF => {
                self.pos -= 1;
                Err(ExprError::at(line, column, "Unexpected end of input"))
            }
            other => {
                self.pos -= 1;
                Err(ExprError::at(line, column, format!("Unexpected token {other:?}")))
            }
        }
    }

    /// Arguments after a consumed `name(`; commas or whitespace separate them
    fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        loop {
            self.skip_whitespace();
            match self.kind() {
                CssToken::RParen => {
                    self.pos += 1;
                    return Ok(args);
                }
                CssToken::Comma => self.pos += 1,
                CssToken::EOF | CssToken::Semicolon | CssToken::RBrace => {
                    let (line, column) = self.position();
                    return Err(ExprError::at(line, column, "Expected ')'"));
                }
                _ => args.push(self.parse_expr()?),
            }
        }
    }

    fn expect_close(&mut self) -> ParseResult<()> {
        if self.kind() == &CssToken::RParen {
            self.pos += 1;
            Ok(())
        } else {
            let (line, column) = self.position();
            Err(ExprError::at(line, column, "Expected ')'"))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.kind() == &CssToken::Whitespace {
            self.pos += 1;
        }
    }

    fn next_is_equals(&self) -> bool {
        self.peek_kind(1) == &CssToken::Delim('=')
    }

    fn kind(&self) -> &CssToken {
        self.peek_kind(0)
    }

    fn peek_kind(&self, offset: usize) -> &CssToken {
        self.tokens
            .get(self.pos + offset)
            .map_or(&CssToken::EOF, |t| &t.kind)
    }

    fn position(&self) -> (u32, u32) {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map_or((0, 0), |t| (t.line, t.column))
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr {
        line: lhs.line,
        column: lhs.column,
        kind: ExprKind::Arith { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Variable scopes, innermost last
#[derive(Debug, Default, Clone)]
pub struct Scope {
    frames: Vec<HashMap<String, Value>>,
}

impl Scope {
    pub fn new() -> Self {
        Self { frames: vec![HashMap::new()] }
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), value);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }
}

/// Everything an expression can touch while being evaluated
pub struct Evaluator<'a> {
    pub registry: &'a FunctionRegistry,
    pub scope: &'a Scope,
    pub diagnostics: &'a mut Diagnostics,
    /// Declarations of the enclosing rule so far
    pub declarations: &'a mut Vec<Declaration>,
}

impl Evaluator<'_> {
    pub fn eval(&mut self, expr: &Expr) -> Result<Value, ExprError> {
        let at = |message: String| ExprError::at(expr.line, expr.column, message);
        match &expr.kind {
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::Variable(name) => self
                .scope
                .lookup(name)
                .cloned()
                .ok_or_else(|| at(format!("Undefined variable '${name}'"))),
            ExprKind::Negate(inner) => match self.eval(inner)? {
                Value::Primitive(p) => Ok(Value::Primitive(p.negate())),
                other => Err(at(format!("Cannot negate '{other}'"))),
            },
            ExprKind::Arith { op, lhs, rhs } => {
                let (a, b) = (self.eval(lhs)?, self.eval(rhs)?);
                match (a, b) {
                    (Value::Primitive(a), Value::Primitive(b)) => {
                        a.apply(*op, b).map(Value::Primitive).map_err(|e| at(e.to_string()))
                    }
                    (a, b) => Err(at(format!("Cannot apply {op:?} to '{a}' and '{b}'"))),
                }
            }
            ExprKind::Compare { op, lhs, rhs } => {
                let (a, b) = (self.eval(lhs)?, self.eval(rhs)?);
                compare(*op, &a, &b).map(Value::Bool).map_err(at)
            }
            ExprKind::Call { name, args } => {
                let registry = self.registry;
                let function = registry
                    .get(name)
                    .ok_or_else(|| at(format!("Unknown function '{name}'")))?;
                if !function.arity().contains(&args.len()) {
                    return Err(at(format!(
                        "Function '{name}' expects {} to {} arguments, got {}",
                        function.min_args,
                        function.max_args,
                        args.len()
                    )));
                }
                let values = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut ctx = CallContext {
                    name,
                    args: values,
                    line: expr.line,
                    column: expr.column,
                    diagnostics: self.diagnostics,
                    declarations: self.declarations,
                };
                (function.handler)(&mut ctx).map_err(at)
            }
        }
    }
}

fn compare(op: CompareOp, a: &Value, b: &Value) -> Result<bool, String> {
    let ordering = match (a, b) {
        (Value::Primitive(x), Value::Primitive(y)) => x.compare(*y).map_err(|e| e.to_string())?,
        _ => {
            return match op {
                CompareOp::Eq => Ok(a == b),
                CompareOp::Ne => Ok(a != b),
                _ => Err(format!("Cannot order '{a}' and '{b}'")),
            };
        }
    };
    Ok(match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    })
}
