//! CSS Properties
//!
//! Property identifiers, their value kinds, inheritance and initial
//! values, plus shorthand expansion.

use std::fmt;

use crate::expr::Value;
use crate::values::{Primitive, Unit};
use crate::Color;

/// Keyword values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Auto,
    Inherit,
    Initial,
    None,
    Block,
    Inline,
    InlineBlock,
    Flex,
    Visible,
    Hidden,
    ContentBox,
    BorderBox,
    Row,
    RowReverse,
    Column,
    ColumnReverse,
    Nowrap,
    Wrap,
    WrapReverse,
    FlexStart,
    FlexEnd,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
    Stretch,
    Top,
    Middle,
    Bottom,
}

impl Keyword {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "auto" => Self::Auto,
            "inherit" => Self::Inherit,
            "initial" => Self::Initial,
            "none" => Self::None,
            "block" => Self::Block,
            "inline" => Self::Inline,
            "inline-block" => Self::InlineBlock,
            "flex" => Self::Flex,
            "visible" => Self::Visible,
            "hidden" => Self::Hidden,
            "content-box" => Self::ContentBox,
            "border-box" => Self::BorderBox,
            "row" => Self::Row,
            "row-reverse" => Self::RowReverse,
            "column" => Self::Column,
            "column-reverse" => Self::ColumnReverse,
            "nowrap" => Self::Nowrap,
            "wrap" => Self::Wrap,
            "wrap-reverse" => Self::WrapReverse,
            "flex-start" | "start" => Self::FlexStart,
            "flex-end" | "end" => Self::FlexEnd,
            "center" => Self::Center,
            "space-between" => Self::SpaceBetween,
            "space-around" => Self::SpaceAround,
            "space-evenly" => Self::SpaceEvenly,
            "stretch" => Self::Stretch,
            "top" => Self::Top,
            "middle" => Self::Middle,
            "bottom" => Self::Bottom,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Inherit => "inherit",
            Self::Initial => "initial",
            Self::None => "none",
            Self::Block => "block",
            Self::Inline => "inline",
            Self::InlineBlock => "inline-block",
            Self::Flex => "flex",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::ContentBox => "content-box",
            Self::BorderBox => "border-box",
            Self::Row => "row",
            Self::RowReverse => "row-reverse",
            Self::Column => "column",
            Self::ColumnReverse => "column-reverse",
            Self::Nowrap => "nowrap",
            Self::Wrap => "wrap",
            Self::WrapReverse => "wrap-reverse",
            Self::FlexStart => "flex-start",
            Self::FlexEnd => "flex-end",
            Self::Center => "center",
            Self::SpaceBetween => "space-between",
            Self::SpaceAround => "space-around",
            Self::SpaceEvenly => "space-evenly",
            Self::Stretch => "stretch",
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
        }
    }
}

/// Declared or computed value of one property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Keyword(Keyword),
    Length(Primitive),
    Color(Color),
    Number(f32),
    Integer(i32),
    Bool(bool),
}

impl PropertyValue {
    pub fn as_keyword(&self) -> Option<Keyword> {
        match self {
            PropertyValue::Keyword(k) => Some(*k),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Keyword(k) => f.write_str(k.as_str()),
            PropertyValue::Length(p) => write!(f, "{p}"),
            PropertyValue::Color(c) => write!(f, "{c}"),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::Integer(i) => write!(f, "{i}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Shape of the values a property accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Color,
    Length,
    LengthOrAuto,
    Number,
    Integer,
    Bool,
    Keywords(&'static [Keyword]),
}

macro_rules! properties {
    ($($variant:ident => $name:literal, $kind:expr, $inherited:literal;)*) => {
        /// Property identifier
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum PropertyId {
            $($variant,)*
        }

        impl PropertyId {
            pub const ALL: &'static [PropertyId] = &[$(PropertyId::$variant,)*];

            pub fn from_name(name: &str) -> Option<Self> {
                match name.to_ascii_lowercase().as_str() {
                    $($name => Some(PropertyId::$variant),)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(PropertyId::$variant => $name,)*
                }
            }

            pub fn kind(self) -> ValueKind {
                match self {
                    $(PropertyId::$variant => $kind,)*
                }
            }

            /// Whether an unset value is taken from the parent
            pub fn is_inherited(self) -> bool {
                match self {
                    $(PropertyId::$variant => $inherited,)*
                }
            }
        }
    };
}

use Keyword as K;

const DISPLAY: &[Keyword] = &[K::Block, K::Inline, K::InlineBlock, K::Flex, K::None];
const VISIBILITY: &[Keyword] = &[K::Visible, K::Hidden];
const BOX_SIZING: &[Keyword] = &[K::ContentBox, K::BorderBox];
const FLEX_DIRECTION: &[Keyword] = &[K::Row, K::RowReverse, K::Column, K::ColumnReverse];
const FLEX_WRAP: &[Keyword] = &[K::Nowrap, K::Wrap, K::WrapReverse];
const JUSTIFY: &[Keyword] = &[
    K::FlexStart, K::FlexEnd, K::Center, K::SpaceBetween, K::SpaceAround, K::SpaceEvenly,
];
const ALIGN_ITEMS: &[Keyword] = &[K::FlexStart, K::FlexEnd, K::Center, K::Stretch];
const ALIGN_SELF: &[Keyword] = &[K::Auto, K::FlexStart, K::FlexEnd, K::Center, K::Stretch];
const VERTICAL_ALIGN: &[Keyword] = &[K::Top, K::Middle, K::Bottom];

properties! {
    Color => "color", ValueKind::Color, true;
    BackgroundColor => "background-color", ValueKind::Color, false;
    BorderColor => "border-color", ValueKind::Color, false;
    OutlineColor => "outline-color", ValueKind::Color, false;
    Display => "display", ValueKind::Keywords(DISPLAY), false;
    Visibility => "visibility", ValueKind::Keywords(VISIBILITY), true;
    BoxSizing => "box-sizing", ValueKind::Keywords(BOX_SIZING), false;
    Width => "width", ValueKind::LengthOrAuto, false;
    Height => "height", ValueKind::LengthOrAuto, false;
    MinWidth => "min-width", ValueKind::LengthOrAuto, false;
    MinHeight => "min-height", ValueKind::LengthOrAuto, false;
    MaxWidth => "max-width", ValueKind::LengthOrAuto, false;
    MaxHeight => "max-height", ValueKind::LengthOrAuto, false;
    PaddingTop => "padding-top", ValueKind::Length, false;
    PaddingRight => "padding-right", ValueKind::Length, false;
    PaddingBottom => "padding-bottom", ValueKind::Length, false;
    PaddingLeft => "padding-left", ValueKind::Length, false;
    BorderTop => "border-top", ValueKind::Length, false;
    BorderRight => "border-right", ValueKind::Length, false;
    BorderBottom => "border-bottom", ValueKind::Length, false;
    BorderLeft => "border-left", ValueKind::Length, false;
    OutlineTop => "outline-top", ValueKind::Length, false;
    OutlineRight => "outline-right", ValueKind::Length, false;
    OutlineBottom => "outline-bottom", ValueKind::Length, false;
    OutlineLeft => "outline-left", ValueKind::Length, false;
    MarginTop => "margin-top", ValueKind::LengthOrAuto, false;
    MarginRight => "margin-right", ValueKind::LengthOrAuto, false;
    MarginBottom => "margin-bottom", ValueKind::LengthOrAuto, false;
    MarginLeft => "margin-left", ValueKind::LengthOrAuto, false;
    FontSize => "font-size", ValueKind::Length, true;
    Bold => "bold", ValueKind::Bool, true;
    Italic => "italic", ValueKind::Bool, true;
    Underlined => "underlined", ValueKind::Bool, true;
    Strikethrough => "strikethrough", ValueKind::Bool, true;
    TextShadow => "text-shadow", ValueKind::Bool, true;
    FlexDirection => "flex-direction", ValueKind::Keywords(FLEX_DIRECTION), false;
    FlexWrap => "flex-wrap", ValueKind::Keywords(FLEX_WRAP), false;
    JustifyContent => "justify-content", ValueKind::Keywords(JUSTIFY), false;
    AlignItems => "align-items", ValueKind::Keywords(ALIGN_ITEMS), false;
    AlignSelf => "align-self", ValueKind::Keywords(ALIGN_SELF), false;
    FlexGrow => "flex-grow", ValueKind::Number, false;
    FlexShrink => "flex-shrink", ValueKind::Number, false;
    FlexBasis => "flex-basis", ValueKind::LengthOrAuto, false;
    Order => "order", ValueKind::Integer, false;
    RowGap => "row-gap", ValueKind::Length, false;
    ColumnGap => "column-gap", ValueKind::Length, false;
    ZIndex => "z-index", ValueKind::Integer, false;
    VerticalAlign => "vertical-align", ValueKind::Keywords(VERTICAL_ALIGN), false;
}

impl PropertyId {
    /// Value used when nothing is declared and nothing is inherited
    pub fn initial_value(self) -> PropertyValue {
        use PropertyId as P;
        match self {
            P::Color | P::BorderColor => PropertyValue::Color(Color::BLACK),
            P::BackgroundColor | P::OutlineColor => PropertyValue::Color(Color::TRANSPARENT),
            P::Display => PropertyValue::Keyword(K::Inline),
            P::Visibility => PropertyValue::Keyword(K::Visible),
            P::BoxSizing => PropertyValue::Keyword(K::ContentBox),
            P::Width | P::Height | P::MinWidth | P::MinHeight | P::MaxWidth | P::MaxHeight | P::FlexBasis => {
                PropertyValue::Keyword(K::Auto)
            }
            P::FontSize => PropertyValue::Length(Primitive::px(10.0)),
            P::Bold | P::Italic | P::Underlined | P::Strikethrough | P::TextShadow => PropertyValue::Bool(false),
            P::FlexDirection => PropertyValue::Keyword(K::Row),
            P::FlexWrap => PropertyValue::Keyword(K::Nowrap),
            P::JustifyContent => PropertyValue::Keyword(K::FlexStart),
            P::AlignItems => PropertyValue::Keyword(K::Stretch),
            P::AlignSelf => PropertyValue::Keyword(K::Auto),
            P::FlexGrow => PropertyValue::Number(0.0),
            P::FlexShrink => PropertyValue::Number(1.0),
            P::Order | P::ZIndex => PropertyValue::Integer(0),
            P::VerticalAlign => PropertyValue::Keyword(K::Top),
            _ => PropertyValue::Length(Primitive::px(0.0)),
        }
    }

    /// Convert an evaluated value into this property's value kind
    pub fn coerce(self, value: &Value) -> Result<PropertyValue, String> {
        if let Value::Ident(ident) = value {
            match Keyword::parse(ident) {
                Some(k @ (K::Inherit | K::Initial)) => return Ok(PropertyValue::Keyword(k)),
                Some(K::Auto) if self.kind() == ValueKind::LengthOrAuto => {
                    return Ok(PropertyValue::Keyword(K::Auto));
                }
                _ => {}
            }
        }

        let mismatch = || format!("Invalid value '{value}' for property '{}'", self.name());
        match (self.kind(), value) {
            (ValueKind::Color, Value::Color(c)) => Ok(PropertyValue::Color(*c)),
            (ValueKind::Color, Value::Ident(name)) => {
                Color::parse_literal(name).map(PropertyValue::Color).ok_or_else(mismatch)
            }
            (ValueKind::Length | ValueKind::LengthOrAuto, Value::Primitive(p)) if !p.unit.is_angle() => {
                Ok(PropertyValue::Length(*p))
            }
            (ValueKind::Number, Value::Primitive(p)) if p.unit == Unit::None => Ok(PropertyValue::Number(p.value)),
            (ValueKind::Integer, Value::Primitive(p)) if p.unit == Unit::None => {
                Ok(PropertyValue::Integer(p.value.round() as i32))
            }
            (ValueKind::Bool, Value::Bool(b)) => Ok(PropertyValue::Bool(*b)),
            (ValueKind::Bool, Value::Ident(s)) if s == "true" || s == "false" => Ok(PropertyValue::Bool(s == "true")),
            (ValueKind::Bool, Value::Primitive(p)) if p.unit == Unit::None => Ok(PropertyValue::Bool(p.value != 0.0)),
            (ValueKind::Keywords(allowed), Value::Ident(s)) => Keyword::parse(s)
                .filter(|k| allowed.contains(k))
                .map(PropertyValue::Keyword)
                .ok_or_else(mismatch),
            _ => Err(mismatch()),
        }
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shorthand properties, expanded to longhands at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shorthand {
    Margin,
    Padding,
    Border,
    Outline,
    Gap,
    Flex,
}

impl Shorthand {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "margin" => Self::Margin,
            "padding" => Self::Padding,
            "border" => Self::Border,
            "outline" => Self::Outline,
            "gap" => Self::Gap,
            "flex" => Self::Flex,
            _ => return None,
        })
    }

    fn sides(self) -> Option<[PropertyId; 4]> {
        use PropertyId as P;
        Some(match self {
            Self::Margin => [P::MarginTop, P::MarginRight, P::MarginBottom, P::MarginLeft],
            Self::Padding => [P::PaddingTop, P::PaddingRight, P::PaddingBottom, P::PaddingLeft],
            Self::Border => [P::BorderTop, P::BorderRight, P::BorderBottom, P::BorderLeft],
            Self::Outline => [P::OutlineTop, P::OutlineRight, P::OutlineBottom, P::OutlineLeft],
            Self::Gap | Self::Flex => return None,
        })
    }

    /// Longhand assignments for the given values
    pub fn expand(self, values: &[Value]) -> Result<Vec<(PropertyId, Value)>, String> {
        if let Some([top, right, bottom, left]) = self.sides() {
            let [t, r, b, l] = match values {
                [all] => [all, all, all, all],
                [v, h] => [v, h, v, h],
                [t, h, b] => [t, h, b, h],
                [t, r, b, l] => [t, r, b, l],
                _ => return Err(format!("Expected 1 to 4 values, got {}", values.len())),
            };
            return Ok(vec![
                (top, t.clone()),
                (right, r.clone()),
                (bottom, b.clone()),
                (left, l.clone()),
            ]);
        }

        match (self, values) {
            (Self::Gap, [both]) => Ok(vec![
                (PropertyId::RowGap, both.clone()),
                (PropertyId::ColumnGap, both.clone()),
            ]),
            (Self::Gap, [row, column]) => Ok(vec![
                (PropertyId::RowGap, row.clone()),
                (PropertyId::ColumnGap, column.clone()),
            ]),
            (Self::Flex, [grow, rest @ ..]) if rest.len() <= 2 => {
                let mut out = vec![(PropertyId::FlexGrow, grow.clone())];
                if let Some(shrink) = rest.first() {
                    out.push((PropertyId::FlexShrink, shrink.clone()));
                }
                if let Some(basis) = rest.get(1) {
                    out.push((PropertyId::FlexBasis, basis.clone()));
                }
                Ok(out)
            }
            _ => Err(format!("Unexpected number of values: {}", values.len())),
        }
    }
}
