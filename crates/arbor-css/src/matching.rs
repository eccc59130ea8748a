//! Selector matching against the DOM
//!
//! Combinators are evaluated right to left: the subject node must match
//! the candidate, then each combinator searches the ancestors or preceding
//! siblings for an element matching the node to its left.

use arbor_dom::{DomTree, NodeId};

use crate::selector::{
    Combinator, Filter, NthExpression, PseudoClass, PseudoFunction, Selector, SelectorGroup,
    SelectorNode,
};

impl Selector {
    /// Test the selector against `element`
    pub fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        let nodes = self.nodes();
        !nodes.is_empty() && tree.is_element(element) && matches_from(nodes, nodes.len() - 1, tree, element)
    }

    /// Matching descendants of `root` in document order, `root` excluded
    pub fn select_all(&self, tree: &DomTree, root: NodeId) -> Vec<NodeId> {
        tree.descendants(root)
            .into_iter()
            .filter(|id| self.matches(tree, *id))
            .collect()
    }

    pub fn select_first(&self, tree: &DomTree, root: NodeId) -> Option<NodeId> {
        tree.descendants(root)
            .into_iter()
            .find(|id| self.matches(tree, *id))
    }
}

impl SelectorGroup {
    /// Any member matches
    pub fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        self.0.iter().any(|s| s.matches(tree, element))
    }

    pub fn select_all(&self, tree: &DomTree, root: NodeId) -> Vec<NodeId> {
        tree.descendants(root)
            .into_iter()
            .filter(|id| self.matches(tree, *id))
            .collect()
    }
}

fn matches_from(nodes: &[SelectorNode], index: usize, tree: &DomTree, element: NodeId) -> bool {
    let node = &nodes[index];
    if !matches_node(node, tree, element) {
        return false;
    }
    if index == 0 {
        return true;
    }

    let previous = index - 1;
    match node.combinator.unwrap_or(Combinator::Descendant) {
        Combinator::Descendant => tree
            .ancestors(element)
            .filter(|a| tree.is_element(*a))
            .any(|a| matches_from(nodes, previous, tree, a)),
        Combinator::Child => tree
            .parent(element)
            .filter(|p| tree.is_element(*p))
            .is_some_and(|p| matches_from(nodes, previous, tree, p)),
        Combinator::AdjacentSibling => tree
            .previous_element_sibling(element)
            .is_some_and(|s| matches_from(nodes, previous, tree, s)),
        Combinator::Sibling => {
            let mut sibling = tree.previous_element_sibling(element);
            while let Some(s) = sibling {
                if matches_from(nodes, previous, tree, s) {
                    return true;
                }
                sibling = tree.previous_element_sibling(s);
            }
            false
        }
    }
}

fn matches_node(node: &SelectorNode, tree: &DomTree, element: NodeId) -> bool {
    node.filters.iter().all(|f| matches_filter(f, tree, element))
}

fn matches_filter(filter: &Filter, tree: &DomTree, element: NodeId) -> bool {
    let Some(data) = tree.element(element) else {
        return false;
    };
    match filter {
        Filter::Universal => true,
        Filter::Tag(tag) => data.tag().eq_ignore_ascii_case(tag),
        Filter::Class(class) => data.attributes().has_class(class),
        Filter::Id(id) => data.attributes().id() == Some(id.as_str()),
        Filter::Attribute(attr) => attr.matches(data.attributes().get(&attr.name)),
        Filter::PseudoClass(pseudo) => matches_pseudo_class(*pseudo, tree, element),
        Filter::PseudoFunction(func) => matches_pseudo_function(func, tree, element),
    }
}

fn matches_pseudo_class(pseudo: PseudoClass, tree: &DomTree, element: NodeId) -> bool {
    let state = tree.state(element);
    match pseudo {
        PseudoClass::FirstChild => tree.previous_element_sibling(element).is_none(),
        PseudoClass::LastChild => tree.next_element_sibling(element).is_none(),
        PseudoClass::OnlyChild => {
            tree.previous_element_sibling(element).is_none() && tree.next_element_sibling(element).is_none()
        }
        PseudoClass::FirstOfType => type_position(tree, element, false) == 1,
        PseudoClass::LastOfType => type_position(tree, element, true) == 1,
        PseudoClass::OnlyOfType => {
            type_position(tree, element, false) == 1 && type_position(tree, element, true) == 1
        }
        PseudoClass::Root => element == tree.root(),
        PseudoClass::Empty => tree.children(element).iter().all(|c| {
            tree.text(*c).is_some_and(|t| t.content().is_empty())
        }),
        PseudoClass::Hover => state.hovered,
        PseudoClass::Active => state.active,
        PseudoClass::Focus => state.focused,
        PseudoClass::Disabled => tree.has_attribute(element, "disabled"),
        PseudoClass::Enabled => !tree.has_attribute(element, "disabled"),
    }
}

fn matches_pseudo_function(func: &PseudoFunction, tree: &DomTree, element: NodeId) -> bool {
    match func {
        PseudoFunction::NthChild { expr, of } => nth_match(tree, element, expr, of.as_ref(), false),
        PseudoFunction::NthLastChild { expr, of } => nth_match(tree, element, expr, of.as_ref(), true),
        PseudoFunction::NthOfType(expr) => expr.matches(type_position(tree, element, false)),
        PseudoFunction::NthLastOfType(expr) => expr.matches(type_position(tree, element, true)),
        PseudoFunction::Not(group) => !group.matches(tree, element),
        PseudoFunction::Is(group) => group.matches(tree, element),
    }
}

/// Element siblings of `element` (itself included) in document order
fn element_siblings(tree: &DomTree, element: NodeId) -> Vec<NodeId> {
    match tree.parent(element) {
        Some(parent) => tree.element_children(parent).collect(),
        None => vec![element],
    }
}

/// 1-based position among siblings, optionally counting only those in `of`
fn nth_match(
    tree: &DomTree,
    element: NodeId,
    expr: &NthExpression,
    of: Option<&SelectorGroup>,
    from_end: bool,
) -> bool {
    if of.is_some_and(|group| !group.matches(tree, element)) {
        return false;
    }
    let mut siblings = element_siblings(tree, element);
    if from_end {
        siblings.reverse();
    }
    let position = siblings
        .into_iter()
        .filter(|s| of.is_none_or(|group| group.matches(tree, *s)))
        .position(|s| s == element);
    position.is_some_and(|p| expr.matches(p as i32 + 1))
}

fn type_position(tree: &DomTree, element: NodeId, from_end: bool) -> i32 {
    let tag = tree.tag_name(element).unwrap_or_default();
    let mut siblings = element_siblings(tree, element);
    if from_end {
        siblings.reverse();
    }
    siblings
        .into_iter()
        .filter(|s| tree.tag_name(*s).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
        .position(|s| s == element)
        .map_or(0, |p| p as i32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: usize) -> (DomTree, Vec<NodeId>) {
        let mut tree = DomTree::new();
        let root = tree.root();
        let ul = tree.create_element("ul");
        tree.append_child(root, ul).unwrap();
        let items = (0..n)
            .map(|_| {
                let li = tree.create_element("li");
                tree.append_child(ul, li).unwrap();
                li
            })
            .collect();
        (tree, items)
    }

    fn positions(tree: &DomTree, items: &[NodeId], selector: &str) -> Vec<usize> {
        let selector = Selector::parse(selector).unwrap();
        items
            .iter()
            .enumerate()
            .filter(|(_, id)| selector.matches(tree, **id))
            .map(|(i, _)| i + 1)
            .collect()
    }

    #[test]
    fn test_nth_child_odd_even() {
        let (tree, items) = list(7);
        assert_eq!(positions(&tree, &items, "li:nth-child(odd)"), vec![1, 3, 5, 7]);
        assert_eq!(positions(&tree, &items, "li:nth-child(even)"), vec![2, 4, 6]);
        assert_eq!(positions(&tree, &items, "li:nth-child(2n+3)"), vec![3, 5, 7]);
        assert_eq!(positions(&tree, &items, "li:nth-child(-n+2)"), vec![1, 2]);
        assert_eq!(positions(&tree, &items, "li:nth-last-child(1)"), vec![7]);
    }

    #[test]
    fn test_nth_child_of_selector() {
        let (mut tree, items) = list(6);
        for i in [1, 2, 4] {
            tree.add_class(items[i], "x").unwrap();
        }
        // Among the .x items (2, 3, 5) the odd ones are 2 and 5
        assert_eq!(positions(&tree, &items, ":nth-child(odd of .x)"), vec![2, 5]);
    }

    #[test]
    fn test_structural_pseudo_classes() {
        let (tree, items) = list(3);
        assert_eq!(positions(&tree, &items, "li:first-child"), vec![1]);
        assert_eq!(positions(&tree, &items, "li:last-child"), vec![3]);
        assert_eq!(positions(&tree, &items, "li:only-child"), Vec::<usize>::new());
        assert_eq!(positions(&tree, &items, "li:empty"), vec![1, 2, 3]);
        assert_eq!(positions(&tree, &items, "li:not(:first-child)"), vec![2, 3]);
    }

    #[test]
    fn test_combinators() {
        let (mut tree, items) = list(4);
        tree.add_class(items[1], "mark").unwrap();
        assert_eq!(positions(&tree, &items, ".mark + li"), vec![3]);
        assert_eq!(positions(&tree, &items, ".mark ~ li"), vec![3, 4]);
        assert_eq!(positions(&tree, &items, "ul > li.mark"), vec![2]);
        assert_eq!(positions(&tree, &items, "root li"), vec![1, 2, 3, 4]);
        assert_eq!(positions(&tree, &items, "root > li"), Vec::<usize>::new());
    }

    #[test]
    fn test_select_all_document_order() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        let c = tree.create_element("div");
        tree.append_child(root, a).unwrap();
        tree.append_child(a, b).unwrap();
        tree.append_child(root, c).unwrap();

        let selector = Selector::parse("div").unwrap();
        assert_eq!(selector.select_all(&tree, root), vec![a, b, c]);
        assert_eq!(selector.select_first(&tree, root), Some(a));
        assert_eq!(selector.select_all(&tree, a), vec![b]);
    }

    #[test]
    fn test_hover_state() {
        let (mut tree, items) = list(2);
        let state = arbor_dom::NodeState { hovered: true, ..Default::default() };
        tree.set_state(items[0], state).unwrap();
        assert_eq!(positions(&tree, &items, "li:hover"), vec![1]);
    }

    #[test]
    fn test_text_nodes_never_match() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let t = tree.create_text("x");
        tree.append_child(root, t).unwrap();
        assert!(!Selector::parse("*").unwrap().matches(&tree, t));
    }
}
