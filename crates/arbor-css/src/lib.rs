//! Arbor CSS
//!
//! Selector engine, stylesheet compiler and style cascade.

mod cascade;
mod color;
mod computed;
mod diagnostics;
mod expr;
mod functions;
mod matching;
mod parser;
mod properties;
mod selector;
mod selector_parser;
mod tokenizer;
mod values;

pub use cascade::{StyleError, StyleResolver, StylesheetId};
pub use color::Color;
pub use computed::{
    AlignItems, AlignSelf, BoxSizing, ComputedStyle, Dimension, Display, Edges, FlexDirection, FlexWrap,
    JustifyContent, VerticalAlign, Visibility,
};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use expr::{Scope, Value};
pub use functions::{CallContext, FunctionRegistry, StyleFunction};
pub use parser::CssParser;
pub use properties::{Keyword, PropertyId, PropertyValue, Shorthand, ValueKind};
pub use selector::{
    AttributeOp, AttributeSelector, Combinator, Filter, NthExpression, PseudoClass, PseudoFunction, Selector,
    SelectorError, SelectorGroup, SelectorNode, Specificity,
};
pub use tokenizer::{CssToken, CssTokenizer, Token};
pub use values::{BinaryOp, Primitive, Unit, UnitError};

/// Compile a user stylesheet
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    CssParser::new().parse(css)
}

/// Where a stylesheet comes from. Default sheets cascade below user
/// sheets and cannot be detached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleOrigin {
    Default,
    #[default]
    User,
}

/// Compiled stylesheet
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
    pub origin: StyleOrigin,
    pub diagnostics: Vec<Diagnostic>,
}

impl Stylesheet {
    pub fn new(origin: StyleOrigin) -> Self {
        Self { rules: Vec::new(), origin, diagnostics: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Diagnostics at or above `severity`
    pub fn diagnostics_at_least(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity >= severity)
    }
}

/// One selector with its declaration block. A selector list in the source
/// yields one rule per selector.
#[derive(Debug, Clone)]
pub struct Rule {
    pub selector: Selector,
    pub declarations: Vec<Declaration>,
}

impl Rule {
    pub fn specificity(&self) -> Specificity {
        self.selector.specificity()
    }
}

/// Property assignment
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: PropertyId,
    pub value: PropertyValue,
    pub important: bool,
}

impl Declaration {
    /// Replace an earlier declaration of the same property, keeping the
    /// newest one last. An important declaration is not replaced by a
    /// normal one.
    pub(crate) fn upsert(list: &mut Vec<Declaration>, declaration: Declaration) {
        if list
            .iter()
            .any(|d| d.property == declaration.property && d.important && !declaration.important)
        {
            return;
        }
        list.retain(|d| d.property != declaration.property);
        list.push(declaration);
    }
}
