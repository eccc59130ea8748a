//! Box model geometry
//!
//! Sizes are stored as outer boxes: content plus padding, border and
//! outline. Margins sit outside and are applied by the parent's
//! algorithm when it places the box.

use std::ops::Add;

use arbor_css::Edges;

/// Collapse NaN, infinities and negatives to zero.
#[inline]
pub fn guard(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn guarded(self) -> Self {
        Self::new(guard(self.x), guard(self.y))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size { width: 0.0, height: 0.0 };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn guarded(self) -> Self {
        Self::new(guard(self.width), guard(self.height))
    }

    /// Extent along the main axis of a row (`true`) or column container
    #[inline]
    pub fn main(self, row: bool) -> f32 {
        if row { self.width } else { self.height }
    }

    #[inline]
    pub fn cross(self, row: bool) -> f32 {
        if row { self.height } else { self.width }
    }

    pub fn from_axes(main: f32, cross: f32, row: bool) -> Self {
        if row {
            Self::new(main, cross)
        } else {
            Self::new(cross, main)
        }
    }

    /// Equal within a hundredth of a unit
    pub fn approx_eq(self, other: Size) -> bool {
        (self.width - other.width).abs() < 0.01 && (self.height - other.height).abs() < 0.01
    }
}

/// Resolved widths of the four edges of a box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeSizes {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl EdgeSizes {
    pub const ZERO: EdgeSizes = EdgeSizes { top: 0.0, right: 0.0, bottom: 0.0, left: 0.0 };

    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self { top, right, bottom, left }
    }

    pub fn all(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn guarded(self) -> Self {
        Self::new(guard(self.top), guard(self.right), guard(self.bottom), guard(self.left))
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }

    /// Sum of both edges on the main axis
    pub fn main(&self, row: bool) -> f32 {
        if row { self.horizontal() } else { self.vertical() }
    }

    pub fn cross(&self, row: bool) -> f32 {
        if row { self.vertical() } else { self.horizontal() }
    }

    /// Leading edge on the main axis
    pub fn main_start(&self, row: bool) -> f32 {
        if row { self.left } else { self.top }
    }

    pub fn main_end(&self, row: bool) -> f32 {
        if row { self.right } else { self.bottom }
    }

    pub fn cross_start(&self, row: bool) -> f32 {
        if row { self.top } else { self.left }
    }
}

impl Add for EdgeSizes {
    type Output = EdgeSizes;

    fn add(self, rhs: EdgeSizes) -> EdgeSizes {
        EdgeSizes::new(
            self.top + rhs.top,
            self.right + rhs.right,
            self.bottom + rhs.bottom,
            self.left + rhs.left,
        )
    }
}

/// Resolved box model of one layout box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxDimensions {
    pub content: Size,
    pub padding: EdgeSizes,
    pub border: EdgeSizes,
    pub outline: EdgeSizes,
    pub margin: EdgeSizes,
    /// Margins that were `auto`; they resolve to zero for sizing
    pub auto_margin: Edges<bool>,
}

impl BoxDimensions {
    /// Padding, border and outline combined
    pub fn frame(&self) -> EdgeSizes {
        self.padding + self.border + self.outline
    }

    pub fn outer_size(&self) -> Size {
        let frame = self.frame();
        Size::new(
            self.content.width + frame.horizontal(),
            self.content.height + frame.vertical(),
        )
    }

    pub fn margin_box_size(&self) -> Size {
        let outer = self.outer_size();
        Size::new(
            outer.width + self.margin.horizontal(),
            outer.height + self.margin.vertical(),
        )
    }

    /// Offset of the content box from the outer box origin
    pub fn content_offset(&self) -> Point {
        let frame = self.frame();
        Point::new(frame.left, frame.top)
    }
}

/// Final placement of a box, relative to its parent's content box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geometry {
    pub position: Point,
    pub size: Size,
}

impl Geometry {
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.position.x
            && point.x < self.position.x + self.size.width
            && point.y >= self.position.y
            && point.y < self.position.y + self.size.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_rejects_degenerate_values() {
        assert_eq!(guard(f32::NAN), 0.0);
        assert_eq!(guard(f32::INFINITY), 0.0);
        assert_eq!(guard(-3.0), 0.0);
        assert_eq!(guard(12.5), 12.5);
    }

    #[test]
    fn test_outer_size_includes_frame() {
        let dims = BoxDimensions {
            content: Size::new(100.0, 50.0),
            padding: EdgeSizes::all(5.0),
            border: EdgeSizes::all(1.0),
            outline: EdgeSizes::new(0.0, 2.0, 0.0, 2.0),
            margin: EdgeSizes::all(10.0),
            ..Default::default()
        };

        assert_eq!(dims.outer_size(), Size::new(116.0, 62.0));
        assert_eq!(dims.margin_box_size(), Size::new(136.0, 82.0));
        assert_eq!(dims.content_offset(), Point::new(8.0, 6.0));
    }

    #[test]
    fn test_axes() {
        let size = Size::new(30.0, 10.0);
        assert_eq!(size.main(true), 30.0);
        assert_eq!(size.main(false), 10.0);
        assert_eq!(Size::from_axes(30.0, 10.0, false), Size::new(10.0, 30.0));

        let edges = EdgeSizes::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(edges.main(true), 6.0);
        assert_eq!(edges.cross(true), 4.0);
        assert_eq!(edges.main_start(false), 1.0);
    }
}
