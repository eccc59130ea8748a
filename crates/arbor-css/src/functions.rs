//! Style functions
//!
//! Every callable in a value expression is a [`StyleFunction`] looked up by
//! name in a [`FunctionRegistry`]. Arity is checked by the evaluator before
//! the handler runs; handlers validate argument types themselves.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::diagnostics::Diagnostics;
use crate::expr::Value;
use crate::properties::{PropertyId, Shorthand};
use crate::values::{Primitive, Unit};
use crate::{Color, Declaration};

pub type FunctionResult = Result<Value, String>;

/// Arguments and side channels for one call
pub struct CallContext<'a> {
    pub name: &'a str,
    pub args: Vec<Value>,
    pub line: u32,
    pub column: u32,
    pub diagnostics: &'a mut Diagnostics,
    pub declarations: &'a mut Vec<Declaration>,
}

impl CallContext<'_> {
    fn warn(&mut self, message: impl Into<String>) {
        self.diagnostics.warn(self.line, self.column, message);
    }

    fn primitive(&self, index: usize) -> Result<Primitive, String> {
        match self.args.get(index) {
            Some(Value::Primitive(p)) => Ok(*p),
            Some(other) => Err(format!("{}: expected a number, got '{other}'", self.name)),
            None => Err(format!("{}: missing argument {}", self.name, index + 1)),
        }
    }

    fn color(&self, index: usize) -> Result<Color, String> {
        match self.args.get(index) {
            Some(Value::Color(c)) => Ok(*c),
            Some(Value::Ident(name)) => {
                Color::parse_literal(name).ok_or_else(|| format!("{}: '{name}' is not a color", self.name))
            }
            Some(other) => Err(format!("{}: expected a color, got '{other}'", self.name)),
            None => Err(format!("{}: missing argument {}", self.name, index + 1)),
        }
    }

    fn property_name(&self, index: usize) -> Result<String, String> {
        match self.args.get(index) {
            Some(Value::Ident(s) | Value::Str(s)) => Ok(s.clone()),
            Some(other) => Err(format!("{}: expected a property name, got '{other}'", self.name)),
            None => Err(format!("{}: missing argument {}", self.name, index + 1)),
        }
    }

    /// Color channel as `0..=255`, clamping with a warning
    fn channel(&mut self, index: usize) -> Result<f32, String> {
        let p = self.primitive(index)?.expect_unit(&[Unit::None, Unit::Percent]).map_err(|e| e.to_string())?;
        let value = if p.unit == Unit::Percent {
            self.percent_in_range(p.value) * 2.55
        } else {
            p.value
        };
        Ok(self.clamp_warn(value, 255.0, "Color channel"))
    }

    /// Alpha as `0..=1`
    fn alpha(&mut self, index: usize) -> Result<f32, String> {
        let p = self.primitive(index)?.expect_unit(&[Unit::None, Unit::Percent]).map_err(|e| e.to_string())?;
        let value = if p.unit == Unit::Percent {
            self.percent_in_range(p.value) / 100.0
        } else {
            p.value
        };
        Ok(self.clamp_warn(value, 1.0, "Alpha"))
    }

    /// Saturation or lightness as `0..=1`; bare numbers are read as percentages
    fn fraction(&mut self, index: usize) -> Result<f32, String> {
        let p = self.primitive(index)?.expect_unit(&[Unit::None, Unit::Percent]).map_err(|e| e.to_string())?;
        Ok(self.percent_in_range(p.value) / 100.0)
    }

    fn percent_in_range(&mut self, value: f32) -> f32 {
        self.clamp_warn(value, 100.0, "Percentage")
    }

    fn clamp_warn(&mut self, value: f32, max: f32, what: &str) -> f32 {
        if value < 0.0 {
            self.warn(format!("{what} {value} is negative, clamped to 0"));
            0.0
        } else if value > max {
            self.warn(format!("{what} {value} exceeds {max}, clamped"));
            max
        } else {
            value
        }
    }
}

pub type Handler = fn(&mut CallContext<'_>) -> FunctionResult;

/// Named handler with its arity contract
#[derive(Debug, Clone, Copy)]
pub struct StyleFunction {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub handler: Handler,
}

impl StyleFunction {
    pub fn arity(&self) -> RangeInclusive<usize> {
        self.min_args..=self.max_args
    }
}

/// Name to handler map
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<&'static str, StyleFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in function
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(&'static str, usize, usize, Handler); 20] = [
            ("rgb", 3, 4, rgb),
            ("rgba", 3, 4, rgb),
            ("hsl", 3, 4, hsl),
            ("hsla", 3, 4, hsl),
            ("lighten", 1, 2, lighten),
            ("brighten", 1, 2, lighten),
            ("darken", 1, 2, darken),
            ("clamp", 3, 3, clamp),
            ("min", 2, 2, min),
            ("max", 2, 2, max),
            ("abs", 1, 1, abs),
            ("sqrt", 1, 1, sqrt),
            ("sin", 1, 1, |ctx| trig(ctx, f32::sin)),
            ("cos", 1, 1, |ctx| trig(ctx, f32::cos)),
            ("tan", 1, 1, |ctx| trig(ctx, f32::tan)),
            ("if", 3, 3, if_),
            ("get-property", 1, 1, get_property),
            ("set-property", 2, 3, set_property),
            ("percent", 1, 1, percent),
            ("round", 1, 1, round),
        ];
        for (name, min_args, max_args, handler) in builtins {
            registry.register(StyleFunction { name, min_args, max_args, handler });
        }
        registry
    }

    pub fn register(&mut self, function: StyleFunction) {
        self.functions.insert(function.name, function);
    }

    pub fn get(&self, name: &str) -> Option<&StyleFunction> {
        self.functions.get(name.to_ascii_lowercase().as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

fn rgb(ctx: &mut CallContext<'_>) -> FunctionResult {
    let r = ctx.channel(0)?;
    let g = ctx.channel(1)?;
    let b = ctx.channel(2)?;
    let a = if ctx.args.len() > 3 { ctx.alpha(3)? } else { 1.0 };
    Ok(Value::Color(Color::rgba(
        r.round() as u8,
        g.round() as u8,
        b.round() as u8,
        (a * 255.0).round() as u8,
    )))
}

fn hsl(ctx: &mut CallContext<'_>) -> FunctionResult {
    let hue = ctx
        .primitive(0)?
        .expect_unit(&[Unit::None, Unit::Deg, Unit::Rad, Unit::Grad, Unit::Turn])
        .map_err(|e| e.to_string())?
        .to_degrees();
    let s = ctx.fraction(1)?;
    let l = ctx.fraction(2)?;
    let a = if ctx.args.len() > 3 { ctx.alpha(3)? } else { 1.0 };
    Ok(Value::Color(Color::from_hsla(hue, s, l, a)))
}

fn amount(ctx: &mut CallContext<'_>) -> Result<f32, String> {
    if ctx.args.len() < 2 {
        return Ok(0.25);
    }
    let p = ctx.primitive(1)?.expect_unit(&[Unit::None, Unit::Percent]).map_err(|e| e.to_string())?;
    let value = if p.unit == Unit::Percent { p.value / 100.0 } else { p.value };
    Ok(ctx.clamp_warn(value, 1.0, "Amount"))
}

fn lighten(ctx: &mut CallContext<'_>) -> FunctionResult {
    let color = ctx.color(0)?;
    let amount = amount(ctx)?;
    Ok(Value::Color(color.lighten(amount)))
}

fn darken(ctx: &mut CallContext<'_>) -> FunctionResult {
    let color = ctx.color(0)?;
    let amount = amount(ctx)?;
    Ok(Value::Color(color.darken(amount)))
}

fn pick(ctx: &CallContext<'_>, want: std::cmp::Ordering) -> FunctionResult {
    let a = ctx.primitive(0)?;
    let b = ctx.primitive(1)?;
    let ordering = a.compare(b).map_err(|e| e.to_string())?;
    Ok(Value::Primitive(if ordering == want { a } else { b }))
}

fn min(ctx: &mut CallContext<'_>) -> FunctionResult {
    pick(ctx, std::cmp::Ordering::Less)
}

fn max(ctx: &mut CallContext<'_>) -> FunctionResult {
    pick(ctx, std::cmp::Ordering::Greater)
}

fn clamp(ctx: &mut CallContext<'_>) -> FunctionResult {
    let low = ctx.primitive(0)?;
    let value = ctx.primitive(1)?;
    let high = ctx.primitive(2)?;
    let err = |e: crate::values::UnitError| e.to_string();

    if value.compare(low).map_err(err)?.is_lt() {
        return Ok(Value::Primitive(low));
    }
    if value.compare(high).map_err(err)?.is_gt() {
        return Ok(Value::Primitive(high));
    }
    Ok(Value::Primitive(value))
}

fn abs(ctx: &mut CallContext<'_>) -> FunctionResult {
    let p = ctx.primitive(0)?;
    Ok(Value::Primitive(Primitive::new(p.value.abs(), p.unit)))
}

fn sqrt(ctx: &mut CallContext<'_>) -> FunctionResult {
    let p = ctx.primitive(0)?;
    let value = if p.value < 0.0 {
        ctx.warn(format!("sqrt of negative value {}, clamped to 0", p.value));
        0.0
    } else {
        p.value.sqrt()
    };
    Ok(Value::Primitive(Primitive::new(value, p.unit)))
}

/// Trig over angles; a bare number is taken as degrees
fn trig(ctx: &mut CallContext<'_>, f: fn(f32) -> f32) -> FunctionResult {
    let angle = ctx
        .primitive(0)?
        .expect_unit(&[Unit::None, Unit::Deg, Unit::Rad, Unit::Grad, Unit::Turn])
        .map_err(|e| e.to_string())?;
    Ok(Value::Primitive(Primitive::number(f(angle.to_degrees().to_radians()))))
}

fn percent(ctx: &mut CallContext<'_>) -> FunctionResult {
    let p = ctx.primitive(0)?.expect_unit(&[Unit::None]).map_err(|e| e.to_string())?;
    Ok(Value::Primitive(Primitive::percent(p.value * 100.0)))
}

fn round(ctx: &mut CallContext<'_>) -> FunctionResult {
    let p = ctx.primitive(0)?;
    Ok(Value::Primitive(Primitive::new(p.value.round(), p.unit)))
}

fn if_(ctx: &mut CallContext<'_>) -> FunctionResult {
    let mut args = std::mem::take(&mut ctx.args);
    let branch = if args[0].is_truthy() { 1 } else { 2 };
    Ok(args.swap_remove(branch))
}

fn get_property(ctx: &mut CallContext<'_>) -> FunctionResult {
    let name = ctx.property_name(0)?;
    let id = PropertyId::from_name(&name).ok_or_else(|| format!("Unknown property '{name}'"))?;
    ctx.declarations
        .iter()
        .rev()
        .find(|d| d.property == id)
        .map(|d| Value::from(&d.value))
        .ok_or_else(|| format!("Property '{name}' has no value in this rule"))
}

fn set_property(ctx: &mut CallContext<'_>) -> FunctionResult {
    let name = ctx.property_name(0)?;
    let value = ctx.args[1].clone();
    let important = ctx.args.get(2).is_some_and(|v| match v {
        Value::Ident(s) => s == "important" || s == "true",
        other => other.is_truthy(),
    });

    let assignments = match (PropertyId::from_name(&name), Shorthand::from_name(&name)) {
        (Some(id), _) => vec![(id, value.clone())],
        (None, Some(shorthand)) => shorthand.expand(std::slice::from_ref(&value))?,
        (None, None) => return Err(format!("Unknown property '{name}'")),
    };
    for (id, v) in assignments {
        let coerced = id.coerce(&v)?;
        Declaration::upsert(ctx.declarations, Declaration { property: id, value: coerced, important });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::properties::PropertyValue;

    fn call(name: &str, args: Vec<Value>) -> (FunctionResult, Diagnostics, Vec<Declaration>) {
        let registry = FunctionRegistry::with_builtins();
        let function = *registry.get(name).unwrap();
        let mut diagnostics = Diagnostics::new();
        let mut declarations = Vec::new();
        let mut ctx = CallContext {
            name,
            args,
            line: 1,
            column: 1,
            diagnostics: &mut diagnostics,
            declarations: &mut declarations,
        };
        let result = (function.handler)(&mut ctx);
        (result, diagnostics, declarations)
    }

    fn n(v: f32) -> Value {
        Value::Primitive(Primitive::number(v))
    }

    #[test]
    fn test_registry_lookup() {
        let registry = FunctionRegistry::with_builtins();
        assert!(registry.contains("rgb"));
        assert!(registry.contains("RGBA"));
        assert!(!registry.contains("lerp"));
        assert_eq!(registry.get("clamp").unwrap().arity(), 3..=3);
    }

    #[test]
    fn test_rgb_clamps_with_warning() {
        let (result, diagnostics, _) = call("rgb", vec![n(256.0), n(0.0), n(-4.0)]);
        assert_eq!(result.unwrap(), Value::Color(Color::rgb(255, 0, 0)));
        assert_eq!(diagnostics.count_at_least(Severity::Warn), 2);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn test_rgba_alpha() {
        let (result, _, _) = call("rgba", vec![n(0.0), n(0.0), n(0.0), n(0.5)]);
        assert_eq!(result.unwrap(), Value::Color(Color::rgba(0, 0, 0, 128)));
        let pct = Value::Primitive(Primitive::percent(150.0));
        let (result, diagnostics, _) = call("rgb", vec![pct, n(0.0), n(0.0)]);
        assert_eq!(result.unwrap(), Value::Color(Color::rgb(255, 0, 0)));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_hsl() {
        let (result, _, _) = call(
            "hsl",
            vec![
                Value::Primitive(Primitive::new(120.0, Unit::Deg)),
                Value::Primitive(Primitive::percent(100.0)),
                Value::Primitive(Primitive::percent(50.0)),
            ],
        );
        assert_eq!(result.unwrap(), Value::Color(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn test_min_max_clamp() {
        let px = |v| Value::Primitive(Primitive::px(v));
        assert_eq!(call("min", vec![px(3.0), px(5.0)]).0.unwrap(), px(3.0));
        assert_eq!(call("max", vec![px(3.0), px(5.0)]).0.unwrap(), px(5.0));
        assert_eq!(call("clamp", vec![px(1.0), px(9.0), px(4.0)]).0.unwrap(), px(4.0));
        let deg = Value::Primitive(Primitive::new(1.0, Unit::Deg));
        assert!(call("min", vec![px(1.0), deg]).0.is_err());
    }

    #[test]
    fn test_trig_takes_angles() {
        let (result, _, _) = call("sin", vec![Value::Primitive(Primitive::new(0.25, Unit::Turn))]);
        let Value::Primitive(p) = result.unwrap() else { panic!("expected number") };
        assert!((p.value - 1.0).abs() < 1e-5);
        assert!(call("cos", vec![Value::Primitive(Primitive::px(1.0))]).0.is_err());
    }

    #[test]
    fn test_if_picks_branch() {
        let (result, _, _) = call("if", vec![Value::Bool(false), n(1.0), n(2.0)]);
        assert_eq!(result.unwrap(), n(2.0));
    }

    #[test]
    fn test_set_then_get_property() {
        let registry = FunctionRegistry::with_builtins();
        let mut diagnostics = Diagnostics::new();
        let mut declarations = Vec::new();

        let set = registry.get("set-property").unwrap();
        let mut ctx = CallContext {
            name: "set-property",
            args: vec![Value::Ident("width".into()), Value::Primitive(Primitive::px(12.0))],
            line: 1,
            column: 1,
            diagnostics: &mut diagnostics,
            declarations: &mut declarations,
        };
        (set.handler)(&mut ctx).unwrap();

        let get = registry.get("get-property").unwrap();
        ctx.args = vec![Value::Ident("width".into())];
        assert_eq!((get.handler)(&mut ctx).unwrap(), Value::Primitive(Primitive::px(12.0)));

        ctx.args = vec![Value::Ident("height".into())];
        assert!((get.handler)(&mut ctx).is_err());

        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].value, PropertyValue::Length(Primitive::px(12.0)));
    }
}
