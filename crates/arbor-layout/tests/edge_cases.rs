//! Layout tests for arbor-layout
//!
//! Each test styles a small DOM, lays it out from the root element and
//! checks the resulting box geometry.

use arbor_css::{parse_stylesheet, StyleResolver};
use arbor_dom::{DomTree, NodeId};
use arbor_layout::*;

const BASE: &str = "root, div { display: block; }";

struct Fixture {
    dom: DomTree,
    styles: StyleResolver,
}

impl Fixture {
    fn new(css: &str) -> Self {
        let mut styles = StyleResolver::new();
        styles.add_stylesheet(parse_stylesheet(&format!("{BASE}\n{css}")));
        Self { dom: DomTree::new(), styles }
    }

    fn root(&self) -> NodeId {
        self.dom.root()
    }

    fn add(&mut self, parent: NodeId, tag: &str, class: &str) -> NodeId {
        let node = self.dom.create_element(tag);
        if !class.is_empty() {
            self.dom.set_attribute(node, "class", Some(class)).unwrap();
        }
        self.dom.append_child(parent, node).unwrap();
        node
    }

    fn layout_with(&mut self, config: &LayoutConfig) -> LayoutTree {
        let root = self.dom.root();
        layout(&self.dom, root, &mut self.styles, &HeuristicMetrics::new(config), config).unwrap()
    }

    fn layout(&mut self) -> LayoutTree {
        self.layout_with(&LayoutConfig::default())
    }
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

fn size(tree: &LayoutTree, node: NodeId) -> Size {
    tree.geometry(node).unwrap().size
}

fn position(tree: &LayoutTree, node: NodeId) -> Point {
    tree.geometry(node).unwrap().position
}

// ============================================================================
// FLOW LAYOUT
// ============================================================================

#[test]
fn test_blocks_stack_vertically() {
    let mut f = Fixture::new(".a { width: 50px; height: 10px; } .b { height: 20px; margin: 5px; }");
    let root = f.root();
    let a = f.add(root, "div", "a");
    let b = f.add(root, "div", "b");
    let tree = f.layout();

    assert_eq!(position(&tree, a), Point::new(0.0, 0.0));
    assert_eq!(position(&tree, b), Point::new(5.0, 15.0));
    assert_eq!(size(&tree, b), Size::new(0.0, 20.0));
    // Root shrinks to its widest line and sums the line heights
    assert_eq!(size(&tree, root), Size::new(50.0, 40.0));
}

#[test]
fn test_inline_blocks_wrap() {
    let mut f = Fixture::new(
        ".box { width: 100px; } span { display: inline-block; width: 40px; height: 10px; }",
    );
    let root = f.root();
    let container = f.add(root, "div", "box");
    let spans: Vec<NodeId> = (0..3).map(|_| f.add(container, "span", "")).collect();
    let tree = f.layout();

    assert_eq!(position(&tree, spans[0]), Point::new(0.0, 0.0));
    assert_eq!(position(&tree, spans[1]), Point::new(40.0, 0.0));
    assert_eq!(position(&tree, spans[2]), Point::new(0.0, 10.0));
    assert_eq!(size(&tree, container), Size::new(100.0, 20.0));
}

#[test]
fn test_block_breaks_inline_line() {
    let mut f = Fixture::new("span { display: inline-block; width: 10px; height: 10px; } .blk { height: 5px; }");
    let root = f.root();
    let first = f.add(root, "span", "");
    let block = f.add(root, "div", "blk");
    let last = f.add(root, "span", "");
    let tree = f.layout();

    assert_eq!(position(&tree, first), Point::new(0.0, 0.0));
    assert_eq!(position(&tree, block), Point::new(0.0, 10.0));
    assert_eq!(position(&tree, last), Point::new(0.0, 15.0));
}

#[test]
fn test_text_uses_metrics() {
    let mut f = Fixture::new("");
    let root = f.root();
    let text = f.dom.create_text("hello");
    f.dom.append_child(root, text).unwrap();
    let tree = f.layout();

    let text_size = size(&tree, text);
    assert!(close(text_size.width, 25.0));
    assert!(close(text_size.height, 12.0));
}

#[test]
fn test_whitespace_text_is_skipped() {
    let mut f = Fixture::new(".a { width: 10px; height: 10px; }");
    let root = f.root();
    let blank = f.dom.create_text("   \n ");
    f.dom.append_child(root, blank).unwrap();
    let a = f.add(root, "div", "a");
    let tree = f.layout();

    assert!(tree.geometry(blank).is_none());
    assert_eq!(position(&tree, a), Point::ZERO);
}

#[test]
fn test_auto_margins_center_block() {
    let mut f = Fixture::new(
        ".box { width: 100px; }
         .c { width: 40px; height: 10px; margin: 0 auto; }
         .r { width: 40px; height: 10px; margin-left: auto; }",
    );
    let root = f.root();
    let container = f.add(root, "div", "box");
    let centered = f.add(container, "div", "c");
    let right = f.add(container, "div", "r");
    let tree = f.layout();

    assert_eq!(position(&tree, centered), Point::new(30.0, 0.0));
    assert_eq!(position(&tree, right), Point::new(60.0, 10.0));
}

#[test]
fn test_vertical_align_in_line() {
    let mut f = Fixture::new(
        "span { display: inline-block; width: 10px; }
         .tall { height: 30px; }
         .mid { height: 10px; vertical-align: middle; }
         .low { height: 10px; vertical-align: bottom; }",
    );
    let root = f.root();
    f.add(root, "span", "tall");
    let mid = f.add(root, "span", "mid");
    let low = f.add(root, "span", "low");
    let tree = f.layout();

    assert_eq!(position(&tree, mid), Point::new(10.0, 10.0));
    assert_eq!(position(&tree, low), Point::new(20.0, 20.0));
}

#[test]
fn test_display_none_is_skipped() {
    let mut f = Fixture::new(".a, .c { height: 10px; } .b { display: none; height: 50px; }");
    let root = f.root();
    f.add(root, "div", "a");
    let hidden = f.add(root, "div", "b");
    let child_of_hidden = f.add(hidden, "div", "a");
    let c = f.add(root, "div", "c");
    let tree = f.layout();

    assert!(tree.geometry(hidden).is_none());
    assert!(tree.geometry(child_of_hidden).is_none());
    assert_eq!(position(&tree, c), Point::new(0.0, 10.0));
}

// ============================================================================
// BOX MODEL
// ============================================================================

#[test]
fn test_content_box_adds_frame() {
    let mut f = Fixture::new(".a { width: 100px; height: 50px; padding: 10px; border: 2px; outline: 1px; }");
    let root = f.root();
    let a = f.add(root, "div", "a");
    let tree = f.layout();

    assert_eq!(size(&tree, a), Size::new(126.0, 76.0));
}

#[test]
fn test_border_box_includes_frame() {
    let mut f = Fixture::new(
        ".a { box-sizing: border-box; width: 100px; height: 50px; padding: 10px; border: 2px; }",
    );
    let root = f.root();
    let a = f.add(root, "div", "a");
    let tree = f.layout();

    assert_eq!(size(&tree, a), Size::new(100.0, 50.0));
    let dims = tree.get(tree.box_for(a).unwrap()).unwrap().dimensions;
    assert_eq!(dims.content, Size::new(76.0, 26.0));
}

#[test]
fn test_auto_size_adds_frame_to_children() {
    let mut f = Fixture::new(".a { padding: 5px; } .b { width: 20px; height: 10px; }");
    let root = f.root();
    let a = f.add(root, "div", "a");
    let b = f.add(a, "div", "b");
    let tree = f.layout();

    assert_eq!(size(&tree, a), Size::new(30.0, 20.0));
    assert_eq!(position(&tree, b), Point::ZERO);
    assert_eq!(tree.absolute_position(b), Some(Point::new(5.0, 5.0)));
}

#[test]
fn test_min_max_clamp() {
    let mut f = Fixture::new(".m { width: 500px; max-width: 100px; min-height: 30px; }");
    let root = f.root();
    let m = f.add(root, "div", "m");
    let tree = f.layout();

    assert_eq!(size(&tree, m), Size::new(100.0, 30.0));
}

#[test]
fn test_sprite_and_canvas_content() {
    let mut f = Fixture::new("icon, canvas { display: inline-block; }");
    let root = f.root();
    let icon = f.add(root, "icon", "");
    let canvas = f.add(root, "canvas", "");
    f.dom.set_attribute(canvas, "width", Some("30")).unwrap();
    f.dom.set_attribute(canvas, "height", Some("20")).unwrap();
    let tree = f.layout();

    assert_eq!(size(&tree, icon), Size::new(16.0, 16.0));
    assert_eq!(size(&tree, canvas), Size::new(30.0, 20.0));
    assert_eq!(position(&tree, canvas), Point::new(16.0, 0.0));
}

// ============================================================================
// UNITS
// ============================================================================

#[test]
fn test_percent_of_parent_content() {
    let mut f = Fixture::new(".box { width: 200px; height: 100px; } .half { width: 50%; height: 50%; }");
    let root = f.root();
    let container = f.add(root, "div", "box");
    let half = f.add(container, "div", "half");
    let tree = f.layout();

    assert_eq!(size(&tree, half), Size::new(100.0, 50.0));
}

#[test]
fn test_viewport_units() {
    let mut f = Fixture::new(".v { width: 10vw; height: 10vh; }");
    let root = f.root();
    let v = f.add(root, "div", "v");
    let tree = f.layout();

    assert_eq!(size(&tree, v), Size::new(128.0, 72.0));
}

#[test]
fn test_px_scale_and_ch() {
    let mut f = Fixture::new(".a { width: 10px; height: 2ch; }");
    let root = f.root();
    let a = f.add(root, "div", "a");
    let config = LayoutConfig { px_scale: 3.0, ..Default::default() };
    let tree = f.layout_with(&config);

    assert_eq!(size(&tree, a), Size::new(30.0, 10.0));
}

#[test]
fn test_percent_under_zero_parent_is_zero() {
    let mut f = Fixture::new(
        ".zero { width: 0px; height: 0px; } .p { width: 50%; height: 50%; padding: 10%; }",
    );
    let root = f.root();
    let zero = f.add(root, "div", "zero");
    let p = f.add(zero, "div", "p");
    let tree = f.layout();

    let s = size(&tree, p);
    assert_eq!(s, Size::ZERO);
    assert!(s.width.is_finite() && s.height.is_finite());
}

#[test]
fn test_percent_in_auto_parent_terminates() {
    let mut f = Fixture::new(".pct { width: 50%; height: 10px; }");
    let root = f.root();
    let auto = f.add(root, "div", "");
    let pct = f.add(auto, "div", "pct");

    for passes in [2, 32] {
        let config = LayoutConfig { max_passes: passes, ..Default::default() };
        let tree = f.layout_with(&config);
        let s = size(&tree, pct);
        assert!(s.width.is_finite() && s.width >= 0.0);
        assert_eq!(s.height, 10.0);
    }
}

// ============================================================================
// FLEX LAYOUT
// ============================================================================

#[test]
fn test_flex_grow_splits_evenly() {
    let mut f = Fixture::new(".row { display: flex; width: 300px; } .item { flex-grow: 1; height: 20px; }");
    let root = f.root();
    let row = f.add(root, "div", "row");
    let items: Vec<NodeId> = (0..3).map(|_| f.add(row, "div", "item")).collect();
    let tree = f.layout();

    for (i, item) in items.iter().enumerate() {
        assert_eq!(size(&tree, *item), Size::new(100.0, 20.0));
        assert_eq!(position(&tree, *item), Point::new(100.0 * i as f32, 0.0));
    }
    assert_eq!(size(&tree, row), Size::new(300.0, 20.0));
}

#[test]
fn test_flex_justify_and_gap() {
    let mut f = Fixture::new(
        ".row { display: flex; width: 200px; column-gap: 10px; justify-content: center; }
         .item { width: 40px; height: 10px; }",
    );
    let root = f.root();
    let row = f.add(root, "div", "row");
    let a = f.add(row, "div", "item");
    let b = f.add(row, "div", "item");
    let tree = f.layout();

    assert_eq!(position(&tree, a), Point::new(55.0, 0.0));
    assert_eq!(position(&tree, b), Point::new(105.0, 0.0));
}

#[test]
fn test_flex_space_between() {
    let mut f = Fixture::new(
        ".row { display: flex; width: 200px; justify-content: space-between; }
         .item { width: 20px; height: 10px; }",
    );
    let root = f.root();
    let row = f.add(root, "div", "row");
    let items: Vec<NodeId> = (0..3).map(|_| f.add(row, "div", "item")).collect();
    let tree = f.layout();

    let xs: Vec<f32> = items.iter().map(|i| position(&tree, *i).x).collect();
    assert_eq!(xs, vec![0.0, 90.0, 180.0]);
}

#[test]
fn test_flex_wrap_and_reverse() {
    let css = ".row { display: flex; flex-wrap: wrap; width: 100px; } .item { width: 40px; height: 10px; }";
    let mut f = Fixture::new(css);
    let root = f.root();
    let row = f.add(root, "div", "row");
    let items: Vec<NodeId> = (0..3).map(|_| f.add(row, "div", "item")).collect();
    let tree = f.layout();

    assert_eq!(position(&tree, items[0]), Point::new(0.0, 0.0));
    assert_eq!(position(&tree, items[1]), Point::new(40.0, 0.0));
    assert_eq!(position(&tree, items[2]), Point::new(0.0, 10.0));
    assert_eq!(size(&tree, row), Size::new(100.0, 20.0));

    let mut f = Fixture::new(&css.replace("flex-wrap: wrap", "flex-wrap: wrap-reverse"));
    let root = f.root();
    let row = f.add(root, "div", "row");
    let items: Vec<NodeId> = (0..3).map(|_| f.add(row, "div", "item")).collect();
    let tree = f.layout();

    assert_eq!(position(&tree, items[2]), Point::new(0.0, 0.0));
    assert_eq!(position(&tree, items[0]), Point::new(0.0, 10.0));
    assert_eq!(position(&tree, items[1]), Point::new(40.0, 10.0));
}

#[test]
fn test_flex_row_gap_between_lines() {
    let mut f = Fixture::new(
        ".row { display: flex; flex-wrap: wrap; width: 50px; gap: 5px; } .item { width: 40px; height: 10px; }",
    );
    let root = f.root();
    let row = f.add(root, "div", "row");
    let a = f.add(row, "div", "item");
    let b = f.add(row, "div", "item");
    let tree = f.layout();

    assert_eq!(position(&tree, a), Point::new(0.0, 0.0));
    assert_eq!(position(&tree, b), Point::new(0.0, 15.0));
    assert_eq!(size(&tree, row), Size::new(50.0, 25.0));
}

#[test]
fn test_flex_order_keeps_dom_order() {
    let mut f = Fixture::new(
        ".row { display: flex; width: 100px; } .row > div { width: 10px; height: 10px; }
         .a { order: 2; } .b { order: 1; }",
    );
    let root = f.root();
    let row = f.add(root, "div", "row");
    let a = f.add(row, "div", "a");
    let b = f.add(row, "div", "b");
    let c = f.add(row, "div", "c");
    let tree = f.layout();

    assert_eq!(position(&tree, c).x, 0.0);
    assert_eq!(position(&tree, b).x, 10.0);
    assert_eq!(position(&tree, a).x, 20.0);
    // DOM order is untouched
    assert_eq!(f.dom.children(row), &[a, b, c]);
}

#[test]
fn test_flex_shrink_weighted() {
    let mut f = Fixture::new(
        ".row { display: flex; width: 100px; } .a { width: 100px; height: 5px; } .b { width: 300px; height: 5px; }",
    );
    let root = f.root();
    let row = f.add(root, "div", "row");
    let a = f.add(row, "div", "a");
    let b = f.add(row, "div", "b");
    let tree = f.layout();

    assert_eq!(size(&tree, a).width, 25.0);
    assert_eq!(size(&tree, b).width, 75.0);
    assert_eq!(position(&tree, b).x, 25.0);
}

#[test]
fn test_flex_column_stretches_cross() {
    let mut f = Fixture::new(
        ".col { display: flex; flex-direction: column; width: 50px; height: 90px; } .item { flex-grow: 1; }",
    );
    let root = f.root();
    let col = f.add(root, "div", "col");
    let items: Vec<NodeId> = (0..3).map(|_| f.add(col, "div", "item")).collect();
    let tree = f.layout();

    for (i, item) in items.iter().enumerate() {
        assert_eq!(size(&tree, *item), Size::new(50.0, 30.0));
        assert_eq!(position(&tree, *item), Point::new(0.0, 30.0 * i as f32));
    }
}

#[test]
fn test_flex_row_reverse() {
    let mut f = Fixture::new(
        ".row { display: flex; flex-direction: row-reverse; width: 100px; } .item { width: 10px; height: 10px; }",
    );
    let root = f.root();
    let row = f.add(root, "div", "row");
    let a = f.add(row, "div", "item");
    let b = f.add(row, "div", "item");
    let tree = f.layout();

    assert_eq!(position(&tree, a).x, 90.0);
    assert_eq!(position(&tree, b).x, 80.0);
}

#[test]
fn test_flex_row_reverse_leads_with_end_margin() {
    let mut f = Fixture::new(
        ".row { display: flex; flex-direction: row-reverse; width: 100px; }
         .item { width: 10px; height: 10px; }
         .a { margin-right: 5px; margin-left: 2px; }",
    );
    let root = f.root();
    let row = f.add(root, "div", "row");
    let a = f.add(row, "div", "item a");
    let b = f.add(row, "div", "item");
    let tree = f.layout();

    // a's right margin sits against the container's right edge
    assert_eq!(position(&tree, a).x, 85.0);
    assert_eq!(position(&tree, b).x, 73.0);
}

#[test]
fn test_deeply_nested_flex_settles() {
    const DEPTH: usize = 40;
    let mut f = Fixture::new(".f { display: flex; padding: 1px; }");
    let mut parent = f.root();
    let mut levels = Vec::with_capacity(DEPTH);
    for _ in 0..DEPTH {
        parent = f.add(parent, "div", "f");
        levels.push(parent);
    }
    let text = f.dom.create_text("hello");
    f.dom.append_child(parent, text).unwrap();
    let tree = f.layout();

    let text_size = size(&tree, text);
    assert!(close(text_size.width, 25.0));
    assert!(close(text_size.height, 12.0));
    for (depth, level) in levels.iter().enumerate() {
        let frame = 2.0 * (DEPTH - depth) as f32;
        let level_size = size(&tree, *level);
        assert!(close(level_size.width, 25.0 + frame), "level {depth}: {level_size:?}");
        assert!(close(level_size.height, 12.0 + frame), "level {depth}: {level_size:?}");
    }
}

#[test]
fn test_flex_align_items_and_self() {
    let mut f = Fixture::new(
        ".row { display: flex; width: 100px; height: 50px; align-items: center; }
         .item { width: 10px; height: 10px; }
         .end { align-self: flex-end; }",
    );
    let root = f.root();
    let row = f.add(root, "div", "row");
    let centered = f.add(row, "div", "item");
    let end = f.add(row, "div", "item end");
    let tree = f.layout();

    assert_eq!(position(&tree, centered), Point::new(0.0, 20.0));
    assert_eq!(position(&tree, end), Point::new(10.0, 40.0));
}

#[test]
fn test_flex_basis_overrides_measure() {
    let mut f = Fixture::new(
        ".row { display: flex; width: 200px; } .a { flex-basis: 50px; height: 10px; } .b { flex-basis: 30px; flex-grow: 1; height: 10px; }",
    );
    let root = f.root();
    let row = f.add(root, "div", "row");
    let a = f.add(row, "div", "a");
    let b = f.add(row, "div", "b");
    let tree = f.layout();

    assert_eq!(size(&tree, a).width, 50.0);
    assert_eq!(size(&tree, b).width, 150.0);
}

// ============================================================================
// QUERIES
// ============================================================================

#[test]
fn test_hit_test_finds_deepest_box() {
    let mut f = Fixture::new(".a { width: 50px; height: 10px; } .b { width: 50px; height: 20px; }");
    let root = f.root();
    let a = f.add(root, "div", "a");
    let b = f.add(root, "div", "b");
    let tree = f.layout();

    assert_eq!(tree.hit_test(Point::new(10.0, 5.0)), Some(a));
    assert_eq!(tree.hit_test(Point::new(10.0, 15.0)), Some(b));
    assert_eq!(tree.hit_test(Point::new(100.0, 100.0)), None);
}

#[test]
fn test_boxes_are_in_dom_order() {
    let mut f = Fixture::new("");
    let root = f.root();
    let a = f.add(root, "div", "");
    let a1 = f.add(a, "div", "");
    let b = f.add(root, "div", "");
    let tree = f.layout();

    let order: Vec<NodeId> = tree.iter().map(|(_, b)| b.node).collect();
    assert_eq!(order, vec![root, a, a1, b]);
}
