//! Computed styles
//!
//! The cascade produces one value per property; [`ComputedStyle`] holds
//! them as typed fields for layout and keeps the raw table for generic
//! lookups.

use std::collections::HashMap;

use crate::properties::{Keyword, PropertyId, PropertyValue};
use crate::values::Primitive;
use crate::Color;

/// Length that may be left to layout
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    #[default]
    Auto,
    Length(Primitive),
}

impl Dimension {
    pub fn is_auto(self) -> bool {
        matches!(self, Dimension::Auto)
    }

    pub fn length(self) -> Option<Primitive> {
        match self {
            Dimension::Auto => None,
            Dimension::Length(p) => Some(p),
        }
    }
}

/// Four box edges in CSS order
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edges<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> Edges<T> {
    pub fn new(top: T, right: T, bottom: T, left: T) -> Self {
        Self { top, right, bottom, left }
    }

    pub fn uniform(value: T) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn map<U>(self, f: impl Fn(T) -> U) -> Edges<U> {
        Edges { top: f(self.top), right: f(self.right), bottom: f(self.bottom), left: f(self.left) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    Block,
    #[default]
    Inline,
    InlineBlock,
    Flex,
    None,
}

impl Display {
    /// Block-level boxes break the line before and after themselves
    pub fn is_block_level(self) -> bool {
        matches!(self, Display::Block | Display::Flex)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxSizing {
    #[default]
    ContentBox,
    BorderBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexDirection {
    #[default]
    Row,
    RowReverse,
    Column,
    ColumnReverse,
}

impl FlexDirection {
    pub fn is_row(self) -> bool {
        matches!(self, FlexDirection::Row | FlexDirection::RowReverse)
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, FlexDirection::RowReverse | FlexDirection::ColumnReverse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexWrap {
    #[default]
    NoWrap,
    Wrap,
    WrapReverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JustifyContent {
    #[default]
    FlexStart,
    FlexEnd,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignItems {
    FlexStart,
    FlexEnd,
    Center,
    #[default]
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignSelf {
    #[default]
    Auto,
    FlexStart,
    FlexEnd,
    Center,
    Stretch,
}

impl AlignSelf {
    /// Effective alignment given the container's `align-items`
    pub fn resolve(self, parent: AlignItems) -> AlignItems {
        match self {
            AlignSelf::Auto => parent,
            AlignSelf::FlexStart => AlignItems::FlexStart,
            AlignSelf::FlexEnd => AlignItems::FlexEnd,
            AlignSelf::Center => AlignItems::Center,
            AlignSelf::Stretch => AlignItems::Stretch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Fully resolved style of one element
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    pub visibility: Visibility,
    pub box_sizing: BoxSizing,

    pub color: Color,
    pub background_color: Color,
    pub border_color: Color,
    pub outline_color: Color,

    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub min_height: Dimension,
    pub max_width: Dimension,
    pub max_height: Dimension,

    pub padding: Edges<Primitive>,
    pub border: Edges<Primitive>,
    pub outline: Edges<Primitive>,
    pub margin: Edges<Dimension>,

    pub font_size: Primitive,
    pub bold: bool,
    pub italic: bool,
    pub underlined: bool,
    pub strikethrough: bool,
    pub text_shadow: bool,

    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub align_self: AlignSelf,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Dimension,
    pub order: i32,
    pub row_gap: Primitive,
    pub column_gap: Primitive,

    pub z_index: i32,
    pub vertical_align: VerticalAlign,

    values: HashMap<PropertyId, PropertyValue>,
}

impl ComputedStyle {
    /// Build from cascaded values. Missing entries take their initial value.
    pub fn from_values(mut values: HashMap<PropertyId, PropertyValue>) -> Self {
        for id in PropertyId::ALL {
            values.entry(*id).or_insert_with(|| id.initial_value());
        }
        let v = Table(&values);
        use PropertyId as P;

        Self {
            display: match v.keyword(P::Display) {
                Keyword::Block => Display::Block,
                Keyword::InlineBlock => Display::InlineBlock,
                Keyword::Flex => Display::Flex,
                Keyword::None => Display::None,
                _ => Display::Inline,
            },
            visibility: match v.keyword(P::Visibility) {
                Keyword::Hidden => Visibility::Hidden,
                _ => Visibility::Visible,
            },
            box_sizing: match v.keyword(P::BoxSizing) {
                Keyword::BorderBox => BoxSizing::BorderBox,
                _ => BoxSizing::ContentBox,
            },
            color: v.color(P::Color),
            background_color: v.color(P::BackgroundColor),
            border_color: v.color(P::BorderColor),
            outline_color: v.color(P::OutlineColor),
            width: v.dimension(P::Width),
            height: v.dimension(P::Height),
            min_width: v.dimension(P::MinWidth),
            min_height: v.dimension(P::MinHeight),
            max_width: v.dimension(P::MaxWidth),
            max_height: v.dimension(P::MaxHeight),
            padding: Edges::new(
                v.length(P::PaddingTop),
                v.length(P::PaddingRight),
                v.length(P::PaddingBottom),
                v.length(P::PaddingLeft),
            ),
            border: Edges::new(
                v.length(P::BorderTop),
                v.length(P::BorderRight),
                v.length(P::BorderBottom),
                v.length(P::BorderLeft),
            ),
            outline: Edges::new(
                v.length(P::OutlineTop),
                v.length(P::OutlineRight),
                v.length(P::OutlineBottom),
                v.length(P::OutlineLeft),
            ),
            margin: Edges::new(
                v.dimension(P::MarginTop),
                v.dimension(P::MarginRight),
                v.dimension(P::MarginBottom),
                v.dimension(P::MarginLeft),
            ),
            font_size: v.length(P::FontSize),
            bold: v.flag(P::Bold),
            italic: v.flag(P::Italic),
            underlined: v.flag(P::Underlined),
            strikethrough: v.flag(P::Strikethrough),
            text_shadow: v.flag(P::TextShadow),
            flex_direction: match v.keyword(P::FlexDirection) {
                Keyword::RowReverse => FlexDirection::RowReverse,
                Keyword::Column => FlexDirection::Column,
                Keyword::ColumnReverse => FlexDirection::ColumnReverse,
                _ => FlexDirection::Row,
            },
            flex_wrap: match v.keyword(P::FlexWrap) {
                Keyword::Wrap => FlexWrap::Wrap,
                Keyword::WrapReverse => FlexWrap::WrapReverse,
                _ => FlexWrap::NoWrap,
            },
            justify_content: match v.keyword(P::JustifyContent) {
                Keyword::FlexEnd => JustifyContent::FlexEnd,
                Keyword::Center => JustifyContent::Center,
                Keyword::SpaceBetween => JustifyContent::SpaceBetween,
                Keyword::SpaceAround => JustifyContent::SpaceAround,
                Keyword::SpaceEvenly => JustifyContent::SpaceEvenly,
                _ => JustifyContent::FlexStart,
            },
            align_items: match v.keyword(P::AlignItems) {
                Keyword::FlexStart => AlignItems::FlexStart,
                Keyword::FlexEnd => AlignItems::FlexEnd,
                Keyword::Center => AlignItems::Center,
                _ => AlignItems::Stretch,
            },
            align_self: match v.keyword(P::AlignSelf) {
                Keyword::FlexStart => AlignSelf::FlexStart,
                Keyword::FlexEnd => AlignSelf::FlexEnd,
                Keyword::Center => AlignSelf::Center,
                Keyword::Stretch => AlignSelf::Stretch,
                _ => AlignSelf::Auto,
            },
            flex_grow: v.number(P::FlexGrow).max(0.0),
            flex_shrink: v.number(P::FlexShrink).max(0.0),
            flex_basis: v.dimension(P::FlexBasis),
            order: v.integer(P::Order),
            row_gap: v.length(P::RowGap),
            column_gap: v.length(P::ColumnGap),
            z_index: v.integer(P::ZIndex),
            vertical_align: match v.keyword(P::VerticalAlign) {
                Keyword::Middle => VerticalAlign::Middle,
                Keyword::Bottom => VerticalAlign::Bottom,
                _ => VerticalAlign::Top,
            },
            values,
        }
    }

    /// Raw computed value of any property
    pub fn get(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.values.get(&id)
    }

    pub fn values(&self) -> impl Iterator<Item = (PropertyId, &PropertyValue)> {
        self.values.iter().map(|(id, v)| (*id, v))
    }

    pub fn is_displayed(&self) -> bool {
        self.display != Display::None
    }
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self::from_values(HashMap::new())
    }
}

/// Typed reads with a fallback to the initial value
struct Table<'a>(&'a HashMap<PropertyId, PropertyValue>);

impl Table<'_> {
    fn value(&self, id: PropertyId) -> PropertyValue {
        self.0.get(&id).cloned().unwrap_or_else(|| id.initial_value())
    }

    fn keyword(&self, id: PropertyId) -> Keyword {
        match self.value(id) {
            PropertyValue::Keyword(k) => k,
            _ => id.initial_value().as_keyword().unwrap_or(Keyword::Auto),
        }
    }

    fn color(&self, id: PropertyId) -> Color {
        match self.value(id) {
            PropertyValue::Color(c) => c,
            _ => Color::TRANSPARENT,
        }
    }

    fn length(&self, id: PropertyId) -> Primitive {
        match self.value(id) {
            PropertyValue::Length(p) => p,
            _ => match id.initial_value() {
                PropertyValue::Length(p) => p,
                _ => Primitive::ZERO,
            },
        }
    }

    fn dimension(&self, id: PropertyId) -> Dimension {
        match self.value(id) {
            PropertyValue::Length(p) => Dimension::Length(p),
            _ => Dimension::Auto,
        }
    }

    fn number(&self, id: PropertyId) -> f32 {
        match self.value(id) {
            PropertyValue::Number(n) => n,
            PropertyValue::Integer(i) => i as f32,
            _ => 0.0,
        }
    }

    fn integer(&self, id: PropertyId) -> i32 {
        match self.value(id) {
            PropertyValue::Integer(i) => i,
            PropertyValue::Number(n) => n as i32,
            _ => 0,
        }
    }

    fn flag(&self, id: PropertyId) -> bool {
        matches!(self.value(id), PropertyValue::Bool(true))
    }
}
