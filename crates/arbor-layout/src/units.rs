//! Unit resolution
//!
//! Percentages resolve against the nearest measured ancestor, which the
//! measure pass tracks as a stack of content sizes.

use arbor_css::{Dimension, Primitive, Unit};

use crate::{LayoutConfig, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug)]
pub struct UnitResolver<'c> {
    config: &'c LayoutConfig,
    parents: Vec<Size>,
}

impl<'c> UnitResolver<'c> {
    pub fn new(config: &'c LayoutConfig) -> Self {
        Self { config, parents: Vec::new() }
    }

    pub fn push(&mut self, size: Size) {
        self.parents.push(size);
    }

    pub fn pop(&mut self) {
        self.parents.pop();
    }

    /// Reference size for percentages; the screen when nothing is pushed
    pub fn parent_size(&self) -> Size {
        self.parents.last().copied().unwrap_or(self.config.screen)
    }

    /// Layout units for `value`. Never NaN or infinite.
    pub fn resolve(&self, value: Primitive, axis: Axis) -> f32 {
        let v = value.value;
        let resolved = match value.unit {
            Unit::Px => v * self.config.px_scale,
            Unit::Ch => v * self.config.ch_width,
            Unit::Vw => v / 100.0 * self.config.screen.width,
            Unit::Vh => v / 100.0 * self.config.screen.height,
            Unit::Percent => {
                let parent = self.parent_size();
                let reference = match axis {
                    Axis::Horizontal => parent.width,
                    Axis::Vertical => parent.height,
                };
                v / 100.0 * reference
            }
            _ => v,
        };
        if resolved.is_finite() { resolved } else { 0.0 }
    }

    pub fn resolve_dimension(&self, value: Dimension, axis: Axis) -> Option<f32> {
        value.length().map(|p| self.resolve(p, axis))
    }
}
