//! Flexbox Layout
//!
//! Items are taken in `order`, collected into lines, then grown or shrunk
//! to fill each line. Cross sizes follow once the main sizes are final,
//! since a narrower item may wrap its own content and grow taller.

use std::rc::Rc;

use arbor_css::{AlignItems, BoxSizing, Dimension, FlexWrap, JustifyContent};

use crate::box_model::guard;
use crate::layout_tree::Line;
use crate::reflow::{Forced, Reflow};
use crate::units::Axis;
use crate::{LayoutBoxId, Point, Size};

#[derive(Debug, Clone)]
struct FlexItem {
    id: LayoutBoxId,
    basis: f32,
    main: f32,
    grow: f32,
    shrink: f32,
    align: AlignItems,
    /// Cross size is `auto`, so `stretch` may fill the line
    stretchable: bool,
    margin_main: f32,
    margin_cross: f32,
}

/// Grow or shrink the items of one line to fill `container_main`
fn resolve_flexible_lengths(line: &mut [FlexItem], container_main: f32, gap: f32) {
    let total_gap = gap * line.len().saturating_sub(1) as f32;
    let margins: f32 = line.iter().map(|i| i.margin_main).sum();
    let used: f32 = line.iter().map(|i| i.basis).sum();
    let free_space = container_main - total_gap - margins - used;

    if free_space > 0.0 {
        let total_grow: f32 = line.iter().map(|i| i.grow).sum();
        if total_grow > 0.0 {
            for item in line.iter_mut() {
                item.main = item.basis + free_space * item.grow / total_grow;
            }
        }
    } else if free_space < 0.0 {
        // Larger items give up more for the same shrink factor
        let total_shrink: f32 = line.iter().map(|i| i.shrink * i.basis).sum();
        if total_shrink > 0.0 {
            for item in line.iter_mut() {
                let ratio = item.shrink * item.basis / total_shrink;
                item.main = guard(item.basis + free_space * ratio);
            }
        }
    }
}

/// Leading offset and extra spacing between items for `justify-content`
fn distribute(justify: JustifyContent, free: f32, count: usize) -> (f32, f32) {
    let n = count.max(1) as f32;
    let spare = free.max(0.0);
    match justify {
        JustifyContent::FlexStart => (0.0, 0.0),
        JustifyContent::FlexEnd => (free, 0.0),
        JustifyContent::Center => (free / 2.0, 0.0),
        JustifyContent::SpaceBetween if count > 1 => (0.0, spare / (n - 1.0)),
        JustifyContent::SpaceBetween => (0.0, 0.0),
        JustifyContent::SpaceAround => (spare / (2.0 * n), spare / n),
        JustifyContent::SpaceEvenly => (spare / (n + 1.0), spare / (n + 1.0)),
    }
}

fn line_length(line: &[FlexItem], gap: f32) -> f32 {
    let items: f32 = line.iter().map(|i| i.main + i.margin_main).sum();
    items + gap * line.len().saturating_sub(1) as f32
}

impl Reflow<'_> {
    /// Measure the items of a flex container. `definite` says whether the
    /// container's width and height are fixed.
    pub(crate) fn measure_flex(&mut self, id: LayoutBoxId, available: Size, definite: (bool, bool)) -> Size {
        let Some(container) = self.tree.get(id) else {
            return Size::ZERO;
        };
        let style = Rc::clone(&container.style);
        let row = style.flex_direction.is_row();
        let main_axis = if row { Axis::Horizontal } else { Axis::Vertical };

        let gaps = Size::new(
            self.units.resolve(style.column_gap, Axis::Horizontal),
            self.units.resolve(style.row_gap, Axis::Vertical),
        )
        .guarded();
        let (main_gap, cross_gap) = (gaps.main(row), gaps.cross(row));
        let main_available = available.main(row);
        let cross_definite = if row { definite.1 } else { definite.0 };

        // Stable sort keeps DOM order among equal `order` values
        let mut ordered: Vec<(i32, LayoutBoxId)> = container
            .children
            .iter()
            .map(|&c| (self.tree.get(c).map_or(0, |b| b.order()), c))
            .collect();
        ordered.sort_by_key(|(order, _)| *order);

        let mut items = Vec::with_capacity(ordered.len());
        for (_, child) in ordered {
            let outer = self.measure(child, Forced::default());
            let Some(b) = self.tree.get(child) else {
                continue;
            };
            let (grow, shrink) = b.flex_factors();
            let measured = outer.main(row);

            let basis = if b.is_text() {
                measured
            } else {
                let main_size = if row { b.style.width } else { b.style.height };
                match (main_size, b.style.flex_basis) {
                    (Dimension::Auto, Dimension::Length(p)) => {
                        let frame = b.dimensions.frame().main(row);
                        let value = self.units.resolve(p, main_axis);
                        if b.style.box_sizing == BoxSizing::BorderBox {
                            value.max(frame)
                        } else {
                            value + frame
                        }
                    }
                    _ => measured,
                }
            };
            let cross_size = if row { b.style.height } else { b.style.width };

            items.push(FlexItem {
                id: child,
                basis: guard(basis),
                main: guard(basis),
                grow,
                shrink,
                align: b.alignment(style.align_items),
                stretchable: !b.is_text() && cross_size.is_auto(),
                margin_main: b.dimensions.margin.main(row),
                margin_cross: b.dimensions.margin.cross(row),
            });
        }

        let wrap = style.flex_wrap != FlexWrap::NoWrap;
        let mut lines: Vec<Vec<FlexItem>> = Vec::new();
        let mut current: Vec<FlexItem> = Vec::new();
        let mut length = 0.0;
        for item in items {
            let item_length = item.basis + item.margin_main;
            if wrap && !current.is_empty() && length + main_gap + item_length > main_available {
                lines.push(std::mem::take(&mut current));
                length = 0.0;
            }
            if !current.is_empty() {
                length += main_gap;
            }
            length += item_length;
            current.push(item);
        }
        if !current.is_empty() {
            lines.push(current);
        }

        let single_line = lines.len() == 1;
        let mut needed_main: f32 = 0.0;
        let mut needed_cross = 0.0;
        let mut placed = Vec::with_capacity(lines.len());

        for (index, mut line) in lines.into_iter().enumerate() {
            resolve_flexible_lengths(&mut line, main_available, main_gap);

            let mut cross: f32 = if single_line && cross_definite { available.cross(row) } else { 0.0 };
            for item in &line {
                let outer = self.measure(item.id, Forced::axes(Some(item.main), None, row));
                cross = cross.max(outer.cross(row) + item.margin_cross);
            }
            for item in &line {
                if item.stretchable && item.align == AlignItems::Stretch {
                    let stretched = guard(cross - item.margin_cross);
                    self.measure(item.id, Forced::axes(Some(item.main), Some(stretched), row));
                }
            }

            let main = line_length(&line, main_gap);
            needed_main = needed_main.max(main);
            if index > 0 {
                needed_cross += cross_gap;
            }
            needed_cross += cross;
            placed.push(Line { items: line.iter().map(|i| i.id).collect(), main, cross });
        }

        if style.flex_wrap == FlexWrap::WrapReverse {
            placed.reverse();
        }
        if let Some(b) = self.tree.get_mut(id) {
            b.lines = placed;
            b.gaps = gaps;
        }
        Size::from_axes(needed_main, needed_cross, row)
    }

    pub(crate) fn arrange_flex(&mut self, id: LayoutBoxId) {
        let Some(container) = self.tree.get(id) else {
            return;
        };
        let style = Rc::clone(&container.style);
        let row = style.flex_direction.is_row();
        let reversed = style.flex_direction.is_reversed();
        let main_size = container.dimensions.content.main(row);
        let (main_gap, cross_gap) = (container.gaps.main(row), container.gaps.cross(row));
        let lines = container.lines.clone();

        let mut cross_pos = 0.0;
        for line in &lines {
            let (start, spacing) = distribute(style.justify_content, main_size - line.main, line.items.len());
            let mut main_pos = start;

            for item in &line.items {
                let Some(b) = self.tree.get_mut(*item) else {
                    continue;
                };
                let outer = b.dimensions.outer_size();
                let margin = b.dimensions.margin;
                let item_main = outer.main(row);

                // Reversed lines run from the physical end, so the end margin leads
                let (lead, trail) = if reversed {
                    (margin.main_end(row), margin.main_start(row))
                } else {
                    (margin.main_start(row), margin.main_end(row))
                };
                main_pos += lead;
                let main_offset = if reversed { main_size - main_pos - item_main } else { main_pos };

                let free_cross = line.cross - outer.cross(row) - margin.cross(row);
                let cross_offset = margin.cross_start(row)
                    + match b.alignment(style.align_items) {
                        AlignItems::FlexEnd => free_cross,
                        AlignItems::Center => free_cross / 2.0,
                        AlignItems::FlexStart | AlignItems::Stretch => 0.0,
                    };

                let position = if row {
                    Point::new(main_offset, cross_pos + cross_offset)
                } else {
                    Point::new(cross_pos + cross_offset, main_offset)
                };
                b.position = position.guarded();

                main_pos += item_main + trail + main_gap + spacing;
            }
            cross_pos += line.cross + cross_gap;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(basis: f32, grow: f32, shrink: f32) -> FlexItem {
        FlexItem {
            id: LayoutBoxId(0),
            basis,
            main: basis,
            grow,
            shrink,
            align: AlignItems::Stretch,
            stretchable: true,
            margin_main: 0.0,
            margin_cross: 0.0,
        }
    }

    #[test]
    fn test_grow_distributes_by_factor() {
        let mut line = vec![item(0.0, 1.0, 1.0), item(0.0, 2.0, 1.0), item(0.0, 1.0, 1.0)];
        resolve_flexible_lengths(&mut line, 400.0, 0.0);
        let mains: Vec<f32> = line.iter().map(|i| i.main).collect();
        assert_eq!(mains, vec![100.0, 200.0, 100.0]);
    }

    #[test]
    fn test_grow_respects_gap() {
        let mut line = vec![item(0.0, 1.0, 1.0), item(0.0, 1.0, 1.0)];
        resolve_flexible_lengths(&mut line, 210.0, 10.0);
        assert_eq!(line[0].main, 100.0);
        assert_eq!(line_length(&line, 10.0), 210.0);
    }

    #[test]
    fn test_shrink_weighted_by_basis() {
        let mut line = vec![item(100.0, 0.0, 1.0), item(300.0, 0.0, 1.0)];
        resolve_flexible_lengths(&mut line, 200.0, 0.0);
        assert_eq!(line[0].main, 50.0);
        assert_eq!(line[1].main, 150.0);
    }

    #[test]
    fn test_no_shrink_without_factor() {
        let mut line = vec![item(100.0, 0.0, 0.0), item(300.0, 0.0, 1.0)];
        resolve_flexible_lengths(&mut line, 200.0, 0.0);
        assert_eq!(line[0].main, 100.0);
        assert_eq!(line[1].main, 100.0);
    }

    #[test]
    fn test_distribute() {
        assert_eq!(distribute(JustifyContent::FlexStart, 60.0, 3), (0.0, 0.0));
        assert_eq!(distribute(JustifyContent::FlexEnd, 60.0, 3), (60.0, 0.0));
        assert_eq!(distribute(JustifyContent::Center, 60.0, 3), (30.0, 0.0));
        assert_eq!(distribute(JustifyContent::SpaceBetween, 60.0, 3), (0.0, 30.0));
        assert_eq!(distribute(JustifyContent::SpaceBetween, 60.0, 1), (0.0, 0.0));
        assert_eq!(distribute(JustifyContent::SpaceAround, 60.0, 3), (10.0, 20.0));
        assert_eq!(distribute(JustifyContent::SpaceEvenly, 60.0, 3), (15.0, 15.0));
        assert_eq!(distribute(JustifyContent::SpaceEvenly, -10.0, 3), (0.0, 0.0));
    }
}
