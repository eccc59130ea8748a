//! Primitive values and unit arithmetic
//!
//! A [`Primitive`] is a number tagged with a [`Unit`]. Arithmetic between
//! two primitives requires compatible units: equal units, a unitless
//! operand, two metric lengths, or two angles. Angles are converted to
//! degrees and metres to centimetres before the operation runs.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Unit {
    #[default]
    None,
    Px,
    Percent,
    Vw,
    Vh,
    /// Character cells
    Ch,
    Cm,
    M,
    Deg,
    Rad,
    Grad,
    Turn,
}

impl Unit {
    /// Parse a dimension suffix; the empty suffix is [`Unit::None`]
    pub fn from_suffix(suffix: &str) -> Option<Unit> {
        Some(match suffix.to_ascii_lowercase().as_str() {
            "" => Unit::None,
            "px" => Unit::Px,
            "%" => Unit::Percent,
            "vw" => Unit::Vw,
            "vh" => Unit::Vh,
            "ch" => Unit::Ch,
            "cm" => Unit::Cm,
            "m" => Unit::M,
            "deg" => Unit::Deg,
            "rad" => Unit::Rad,
            "grad" => Unit::Grad,
            "turn" => Unit::Turn,
            _ => return None,
        })
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Px => "px",
            Unit::Percent => "%",
            Unit::Vw => "vw",
            Unit::Vh => "vh",
            Unit::Ch => "ch",
            Unit::Cm => "cm",
            Unit::M => "m",
            Unit::Deg => "deg",
            Unit::Rad => "rad",
            Unit::Grad => "grad",
            Unit::Turn => "turn",
        }
    }

    #[inline]
    pub fn is_angle(self) -> bool {
        matches!(self, Unit::Deg | Unit::Rad | Unit::Grad | Unit::Turn)
    }

    #[inline]
    fn is_metric(self) -> bool {
        matches!(self, Unit::Cm | Unit::M)
    }

    /// Whether two units may meet in one arithmetic operation
    pub fn is_compatible(self, other: Unit) -> bool {
        self == other
            || self == Unit::None
            || other == Unit::None
            || (self.is_metric() && other.is_metric())
            || (self.is_angle() && other.is_angle())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::None => f.write_str("number"),
            other => f.write_str(other.suffix()),
        }
    }
}

/// Unit mismatch in an arithmetic operation or function argument
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("Incompatible units {0} and {1}")]
    Incompatible(Unit, Unit),
    #[error("Expected one of [{expected}], got {found}")]
    Unexpected { expected: String, found: Unit },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Number plus unit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Primitive {
    pub value: f32,
    pub unit: Unit,
}

impl Primitive {
    pub const ZERO: Primitive = Primitive { value: 0.0, unit: Unit::None };

    pub const fn new(value: f32, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub const fn number(value: f32) -> Self {
        Self::new(value, Unit::None)
    }

    pub const fn px(value: f32) -> Self {
        Self::new(value, Unit::Px)
    }

    pub const fn percent(value: f32) -> Self {
        Self::new(value, Unit::Percent)
    }

    /// Angle in degrees; other units return the raw value
    pub fn to_degrees(self) -> f32 {
        match self.unit {
            Unit::Rad => self.value.to_degrees(),
            Unit::Grad => self.value * 0.9,
            Unit::Turn => self.value * 360.0,
            _ => self.value,
        }
    }

    /// Angles become degrees, metres become centimetres
    pub fn canonical(self) -> Primitive {
        match self.unit {
            u if u.is_angle() => Primitive::new(self.to_degrees(), Unit::Deg),
            Unit::M => Primitive::new(self.value * 100.0, Unit::Cm),
            _ => self,
        }
    }

    /// Unit carried by the result of combining `a` and `b`
    fn result_unit(a: Unit, b: Unit) -> Unit {
        if a.is_angle() || b.is_angle() {
            Unit::Deg
        } else if a.is_metric() || b.is_metric() {
            Unit::Cm
        } else if a != Unit::None {
            a
        } else {
            b
        }
    }

    fn check(self, rhs: Primitive) -> Result<(Primitive, Primitive, Unit), UnitError> {
        if !self.unit.is_compatible(rhs.unit) {
            return Err(UnitError::Incompatible(self.unit, rhs.unit));
        }
        let unit = Self::result_unit(self.unit, rhs.unit);
        Ok((self.canonical(), rhs.canonical(), unit))
    }

    /// Apply an arithmetic operator with unit checking
    pub fn apply(self, op: BinaryOp, rhs: Primitive) -> Result<Primitive, UnitError> {
        let (a, b, unit) = self.check(rhs)?;
        let value = match op {
            BinaryOp::Add => a.value + b.value,
            BinaryOp::Sub => a.value - b.value,
            BinaryOp::Mul => a.value * b.value,
            BinaryOp::Div => {
                if b.value == 0.0 {
                    0.0
                } else {
                    a.value / b.value
                }
            }
        };
        Ok(Primitive::new(value, unit))
    }

    /// Compare with unit checking
    pub fn compare(self, rhs: Primitive) -> Result<Ordering, UnitError> {
        let (a, b, _) = self.check(rhs)?;
        Ok(a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal))
    }

    pub fn negate(self) -> Primitive {
        Primitive::new(-self.value, self.unit)
    }

    /// Fail unless the unit is one of `allowed`
    pub fn expect_unit(self, allowed: &[Unit]) -> Result<Primitive, UnitError> {
        if allowed.contains(&self.unit) {
            return Ok(self);
        }
        let expected = allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Err(UnitError::Unexpected { expected, found: self.unit })
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}
