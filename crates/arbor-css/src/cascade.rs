//! Style Cascade & Resolver
//!
//! Computes the final styles for DOM elements by:
//! 1. Matching selectors against elements
//! 2. Sorting by importance, specificity and source order
//! 3. Resolving `inherit`, `initial` and inherited properties
//!
//! Results are memoized per node and dropped when the DOM reports an
//! invalidation through [`StyleResolver::sync`].

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use arbor_dom::{DomTree, NodeId};

use crate::computed::ComputedStyle;
use crate::parser::CssParser;
use crate::properties::{Keyword, PropertyId, PropertyValue};
use crate::selector::Specificity;
use crate::values::{Primitive, Unit};
use crate::{Declaration, StyleOrigin, Stylesheet};

/// Handle of an attached stylesheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StylesheetId(u32);

impl fmt::Display for StylesheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    #[error("Stylesheet {0} belongs to the default origin and cannot be removed")]
    Unmodifiable(StylesheetId),
    #[error("Unknown stylesheet {0}")]
    UnknownStylesheet(StylesheetId),
    #[error("Node {0} is neither an element nor a text node")]
    NotAnElement(NodeId),
}

struct AttachedSheet {
    id: StylesheetId,
    sheet: Stylesheet,
}

struct InlineStyle {
    source: String,
    declarations: Rc<[Declaration]>,
}

/// Cascade ordering; the greatest key wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CascadeKey {
    important: bool,
    specificity: Specificity,
    /// (sheet, rule, declaration); inline declarations sort after every sheet
    order: (usize, usize, usize),
}

/// Style resolver - computes styles for DOM elements
pub struct StyleResolver {
    parser: CssParser,
    /// Default-origin sheets first, then user sheets, each in attach order
    sheets: Vec<AttachedSheet>,
    next_id: u32,
    cache: HashMap<NodeId, Rc<ComputedStyle>>,
    inline: HashMap<NodeId, InlineStyle>,
}

impl StyleResolver {
    pub fn new() -> Self {
        Self::with_parser(CssParser::new())
    }

    /// Resolver whose inline styles compile with `parser`
    pub fn with_parser(parser: CssParser) -> Self {
        Self {
            parser,
            sheets: Vec::new(),
            next_id: 0,
            cache: HashMap::new(),
            inline: HashMap::new(),
        }
    }

    pub fn parser(&self) -> &CssParser {
        &self.parser
    }

    /// Attach a compiled stylesheet
    pub fn add_stylesheet(&mut self, sheet: Stylesheet) -> StylesheetId {
        let id = StylesheetId(self.next_id);
        self.next_id += 1;

        let position = match sheet.origin {
            StyleOrigin::Default => self
                .sheets
                .iter()
                .position(|s| s.sheet.origin == StyleOrigin::User)
                .unwrap_or(self.sheets.len()),
            StyleOrigin::User => self.sheets.len(),
        };
        tracing::debug!(%id, origin = ?sheet.origin, rules = sheet.rules.len(), "attached stylesheet");
        self.sheets.insert(position, AttachedSheet { id, sheet });
        self.invalidate_all();
        id
    }

    /// Detach a user stylesheet
    pub fn remove_stylesheet(&mut self, id: StylesheetId) -> Result<Stylesheet, StyleError> {
        let index = self
            .sheets
            .iter()
            .position(|s| s.id == id)
            .ok_or(StyleError::UnknownStylesheet(id))?;
        if self.sheets[index].sheet.origin == StyleOrigin::Default {
            return Err(StyleError::Unmodifiable(id));
        }
        tracing::debug!(%id, "detached stylesheet");
        let removed = self.sheets.remove(index);
        self.invalidate_all();
        Ok(removed.sheet)
    }

    /// Attached sheets in cascade order
    pub fn stylesheets(&self) -> impl Iterator<Item = (StylesheetId, &Stylesheet)> {
        self.sheets.iter().map(|s| (s.id, &s.sheet))
    }

    pub fn stylesheet(&self, id: StylesheetId) -> Option<&Stylesheet> {
        self.sheets.iter().find(|s| s.id == id).map(|s| &s.sheet)
    }

    /// Drain the DOM's invalidations and drop the affected cached styles.
    /// Inheritance makes every invalidation cover the whole subtree.
    pub fn sync(&mut self, tree: &mut DomTree) {
        let invalidations = tree.take_invalidations();
        if invalidations.is_empty() || self.cache.is_empty() {
            self.inline.retain(|id, _| tree.get(*id).is_some());
            return;
        }

        for invalidation in &invalidations {
            let node = invalidation.node();
            self.cache.remove(&node);
            if tree.get(node).is_some() {
                for descendant in tree.descendants(node) {
                    self.cache.remove(&descendant);
                }
            }
        }
        self.cache.retain(|id, _| tree.get(*id).is_some());
        self.inline.retain(|id, _| tree.get(*id).is_some());
        tracing::trace!(count = invalidations.len(), cached = self.cache.len(), "applied style invalidations");
    }

    /// Forget every cached style
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Whether a style for `node` is memoized
    pub fn is_cached(&self, node: NodeId) -> bool {
        self.cache.contains_key(&node)
    }

    /// Computed style of an element. Text nodes share their parent's style.
    ///
    /// Call [`sync`](Self::sync) after DOM mutations; stale entries are
    /// otherwise served from the cache.
    pub fn computed_style(&mut self, tree: &DomTree, node: NodeId) -> Result<Rc<ComputedStyle>, StyleError> {
        let Some(data) = tree.get(node) else {
            return Err(StyleError::NotAnElement(node));
        };
        if data.is_text() {
            return match tree.parent(node) {
                Some(parent) if tree.is_element(parent) => self.computed_style(tree, parent),
                _ => Ok(Rc::new(ComputedStyle::default())),
            };
        }
        if !data.is_element() {
            return Err(StyleError::NotAnElement(node));
        }
        if let Some(style) = self.cache.get(&node) {
            return Ok(Rc::clone(style));
        }

        let parent = match tree.parent(node) {
            Some(parent) if tree.is_element(parent) => Some(self.computed_style(tree, parent)?),
            _ => None,
        };
        let declared = self.cascade(tree, node);
        let style = Rc::new(resolve(declared, parent.as_deref()));
        tracing::trace!(%node, "computed style");
        self.cache.insert(node, Rc::clone(&style));
        Ok(style)
    }

    /// Winning declared value per property
    fn cascade(&mut self, tree: &DomTree, node: NodeId) -> HashMap<PropertyId, PropertyValue> {
        let inline = self.inline_declarations(tree, node);

        let mut matches: Vec<(CascadeKey, &Declaration)> = Vec::new();
        for (s, attached) in self.sheets.iter().enumerate() {
            for (r, rule) in attached.sheet.rules.iter().enumerate() {
                if !rule.selector.matches(tree, node) {
                    continue;
                }
                let specificity = rule.specificity();
                for (d, declaration) in rule.declarations.iter().enumerate() {
                    let key = CascadeKey { important: declaration.important, specificity, order: (s, r, d) };
                    matches.push((key, declaration));
                }
            }
        }
        for (d, declaration) in inline.iter().enumerate() {
            let key = CascadeKey {
                important: declaration.important,
                specificity: Specificity::MAX,
                order: (usize::MAX, 0, d),
            };
            matches.push((key, declaration));
        }

        matches.sort_by_key(|(key, _)| *key);
        let mut declared = HashMap::new();
        for (_, declaration) in matches {
            declared.insert(declaration.property, declaration.value.clone());
        }
        declared
    }

    /// Compiled `style` attribute, recompiled only when its text changes
    fn inline_declarations(&mut self, tree: &DomTree, node: NodeId) -> Rc<[Declaration]> {
        let Some(source) = tree.get_attribute(node, "style") else {
            self.inline.remove(&node);
            return Rc::from(Vec::new());
        };
        match self.inline.get(&node) {
            Some(cached) if cached.source == source => return Rc::clone(&cached.declarations),
            _ => {}
        }

        let (declarations, diagnostics) = self.parser.parse_inline(source);
        if !diagnostics.is_empty() {
            tracing::debug!(%node, count = diagnostics.len(), "inline style has diagnostics");
        }
        let declarations: Rc<[Declaration]> = Rc::from(declarations);
        self.inline.insert(
            node,
            InlineStyle { source: source.to_string(), declarations: Rc::clone(&declarations) },
        );
        declarations
    }
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `inherit`/`initial` and inheritance to the declared values
fn resolve(mut declared: HashMap<PropertyId, PropertyValue>, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let mut values = HashMap::with_capacity(PropertyId::ALL.len());
    for &id in PropertyId::ALL {
        let inherited = || parent.and_then(|p| p.get(id).cloned()).unwrap_or_else(|| id.initial_value());
        let value = match declared.remove(&id) {
            Some(PropertyValue::Keyword(Keyword::Inherit)) => inherited(),
            Some(PropertyValue::Keyword(Keyword::Initial)) => id.initial_value(),
            Some(value) => value,
            None if id.is_inherited() => inherited(),
            None => id.initial_value(),
        };
        values.insert(id, value);
    }

    // Percentage font sizes are relative to the parent's
    if let (Some(PropertyValue::Length(size)), Some(parent)) = (values.get(&PropertyId::FontSize), parent) {
        if size.unit == Unit::Percent {
            let base = parent.font_size;
            let resolved = Primitive::new(base.value * size.value / 100.0, base.unit);
            values.insert(PropertyId::FontSize, PropertyValue::Length(resolved));
        }
    }
    ComputedStyle::from_values(values)
}
