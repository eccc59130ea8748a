//! Event dispatch and mutation event tests for arbor-dom
//!
//! Covers phase ordering, propagation control, listener failures and the
//! events fired by tree mutations.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use arbor_dom::*;

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn record(tree: &mut DomTree, node: NodeId, event_type: &str, log: &Log, label: &str) -> ListenerId {
    let log = Rc::clone(log);
    let label = label.to_string();
    tree.add_event_listener(node, event_type, move |_, _| {
        log.borrow_mut().push(label.clone());
        Ok(())
    })
    .unwrap()
}

/// root > grandparent > parent > target
fn chain(tree: &mut DomTree) -> (NodeId, NodeId, NodeId) {
    let root = tree.root();
    let grandparent = tree.create_element("section");
    let parent = tree.create_element("div");
    let target = tree.create_element("span");
    tree.append_child(root, grandparent).unwrap();
    tree.append_child(grandparent, parent).unwrap();
    tree.append_child(parent, target).unwrap();
    (grandparent, parent, target)
}

// ============================================================================
// PHASE ORDERING
// ============================================================================

#[test]
fn test_bubbling_order_reaches_global() {
    let mut tree = DomTree::new();
    let (grandparent, parent, target) = chain(&mut tree);
    let log = log();
    let doc = tree.document();

    record(&mut tree, target, "click", &log, "target");
    record(&mut tree, parent, "click", &log, "parent");
    record(&mut tree, grandparent, "click", &log, "grandparent");
    record(&mut tree, doc, "click", &log, "global");

    let event = tree
        .dispatch_event(target, Event::mouse(event_types::CLICK, MouseEvent::default()))
        .unwrap();

    assert_eq!(*log.borrow(), vec!["target", "parent", "grandparent", "global"]);
    assert_eq!(event.phase(), EventPhase::Done);
    assert_eq!(event.target(), Some(target));
}

#[test]
fn test_non_bubbling_skips_ancestors_but_not_global() {
    let mut tree = DomTree::new();
    let (_, parent, target) = chain(&mut tree);
    let log = log();
    let doc = tree.document();

    record(&mut tree, target, "ping", &log, "target");
    record(&mut tree, parent, "ping", &log, "parent");
    record(&mut tree, doc, "ping", &log, "global");

    let mut event = Event::new("ping");
    event.init(false, false);
    tree.dispatch_event(target, event).unwrap();

    assert_eq!(*log.borrow(), vec!["target", "global"]);
}

#[test]
fn test_registration_order_within_node() {
    let mut tree = DomTree::new();
    let (_, _, target) = chain(&mut tree);
    let log = log();
    for label in ["a", "b", "c"] {
        record(&mut tree, target, "click", &log, label);
    }
    tree.dispatch_event(target, Event::mouse("click", MouseEvent::default())).unwrap();
    assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
}

#[test]
fn test_phase_and_current_target_visible_to_listener() {
    let mut tree = DomTree::new();
    let (_, parent, target) = chain(&mut tree);
    let seen: Rc<RefCell<Vec<(EventPhase, Option<NodeId>)>>> = Rc::new(RefCell::new(Vec::new()));

    for node in [target, parent, tree.document()] {
        let seen = Rc::clone(&seen);
        tree.add_event_listener(node, "click", move |e, _| {
            seen.borrow_mut().push((e.phase(), e.current_target()));
            Ok(())
        })
        .unwrap();
    }
    tree.dispatch_event(target, Event::mouse("click", MouseEvent::default())).unwrap();

    let doc = tree.document();
    assert_eq!(
        *seen.borrow(),
        vec![
            (EventPhase::Origin, Some(target)),
            (EventPhase::Bubbling, Some(parent)),
            (EventPhase::Global, Some(doc)),
        ]
    );
}

// ============================================================================
// PROPAGATION CONTROL
// ============================================================================

#[test]
fn test_stop_propagation_halts_everything_after() {
    let mut tree = DomTree::new();
    let (grandparent, parent, target) = chain(&mut tree);
    let log = log();
    let doc = tree.document();

    record(&mut tree, target, "click", &log, "target");
    {
        let log = Rc::clone(&log);
        tree.add_event_listener(parent, "click", move |e, _| {
            log.borrow_mut().push("parent-stop".into());
            e.stop_propagation();
            Ok(())
        })
        .unwrap();
    }
    record(&mut tree, parent, "click", &log, "parent-late");
    record(&mut tree, grandparent, "click", &log, "grandparent");
    record(&mut tree, doc, "click", &log, "global");

    let event = tree.dispatch_event(target, Event::mouse("click", MouseEvent::default())).unwrap();

    assert_eq!(*log.borrow(), vec!["target", "parent-stop"]);
    assert!(event.is_propagation_stopped());
}

#[test]
fn test_cancel_skips_global_only() {
    let mut tree = DomTree::new();
    let (_, parent, target) = chain(&mut tree);
    let log = log();
    let doc = tree.document();

    tree.add_event_listener(target, "click", |e, _| {
        e.cancel();
        Ok(())
    })
    .unwrap();
    record(&mut tree, parent, "click", &log, "parent");
    record(&mut tree, doc, "click", &log, "global");

    let event = tree.dispatch_event(target, Event::mouse("click", MouseEvent::default())).unwrap();
    assert!(event.is_cancelled());
    assert_eq!(*log.borrow(), vec!["parent"]);
}

#[test]
fn test_failing_listener_does_not_abort_dispatch() {
    let mut tree = DomTree::new();
    let (_, parent, target) = chain(&mut tree);
    let log = log();

    tree.add_event_listener(target, "click", |_, _| Err(ListenerError::new("boom")))
        .unwrap();
    record(&mut tree, target, "click", &log, "after-failure");
    record(&mut tree, parent, "click", &log, "parent");

    tree.dispatch_event(target, Event::mouse("click", MouseEvent::default())).unwrap();
    assert_eq!(*log.borrow(), vec!["after-failure", "parent"]);
}

#[test]
fn test_uninitialized_event_rejected() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let result = tree.dispatch_event(root, Event::custom("ping"));
    assert_eq!(result.unwrap_err(), DomError::EventNotInitialized("ping".into()));
}

#[test]
fn test_custom_event_properties() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let seen = Rc::new(RefCell::new(None));
    {
        let seen = Rc::clone(&seen);
        tree.add_event_listener(root, "ping", move |e, _| {
            *seen.borrow_mut() = e.property("answer").map(String::from);
            Ok(())
        })
        .unwrap();
    }

    let mut event = Event::custom("ping");
    event.init_custom(false, false, HashMap::from([("answer".into(), "42".into())]));
    tree.dispatch_event(root, event).unwrap();
    assert_eq!(seen.borrow().as_deref(), Some("42"));
}

#[test]
fn test_remove_listener() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let log = log();
    let id = record(&mut tree, root, "click", &log, "x");

    assert!(tree.remove_event_listener(root, "click", id));
    assert!(!tree.remove_event_listener(root, "click", id));
    tree.dispatch_event(root, Event::mouse("click", MouseEvent::default())).unwrap();
    assert!(log.borrow().is_empty());
}

#[test]
fn test_empty_type_rejected() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let result = tree.add_event_listener(root, "", |_, _| Ok(()));
    assert_eq!(result.unwrap_err(), DomError::EmptyEventType);
}

#[test]
fn test_listener_mutation_visible_to_later_phases() {
    let mut tree = DomTree::new();
    let (_, parent, target) = chain(&mut tree);
    let root = tree.root();
    let log = log();

    // Move the target under the root while in the origin phase
    tree.add_event_listener(target, "click", move |_, tree| {
        tree.append_child(root, target).map_err(|e| ListenerError::new(e.to_string()))
    })
    .unwrap();
    record(&mut tree, parent, "click", &log, "old-parent");
    record(&mut tree, root, "click", &log, "root");

    tree.dispatch_event(target, Event::mouse("click", MouseEvent::default())).unwrap();
    assert_eq!(*log.borrow(), vec!["root"]);
}

#[test]
fn test_listener_added_during_dispatch_waits() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let log = log();
    {
        let log = Rc::clone(&log);
        tree.add_event_listener(root, "click", move |_, tree| {
            let log = Rc::clone(&log);
            let root = tree.root();
            tree.add_event_listener(root, "click", move |_, _| {
                log.borrow_mut().push("late".into());
                Ok(())
            })
            .map(|_| ())
            .map_err(|e| ListenerError::new(e.to_string()))
        })
        .unwrap();
    }

    tree.dispatch_event(root, Event::mouse("click", MouseEvent::default())).unwrap();
    assert!(log.borrow().is_empty());
    tree.dispatch_event(root, Event::mouse("click", MouseEvent::default())).unwrap();
    assert_eq!(*log.borrow(), vec!["late"]);
}

// ============================================================================
// MUTATION EVENTS
// ============================================================================

#[test]
fn test_append_fires_exactly_once() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let child = tree.create_element("div");
    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = Rc::clone(&seen);
        tree.add_event_listener(root, event_types::APPEND_CHILD, move |e, _| {
            seen.borrow_mut().push((e.target(), e.related_node()));
            Ok(())
        })
        .unwrap();
    }

    tree.append_child(root, child).unwrap();
    assert_eq!(*seen.borrow(), vec![(Some(root), Some(child))]);
}

#[test]
fn test_append_bubbles_to_ancestors() {
    let mut tree = DomTree::new();
    let (grandparent, parent, _) = chain(&mut tree);
    let log = log();
    record(&mut tree, grandparent, event_types::APPEND_CHILD, &log, "grandparent");

    let extra = tree.create_text("hi");
    tree.append_child(parent, extra).unwrap();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_remove_fires_before_detach() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let child = tree.create_element("div");
    tree.append_child(root, child).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = Rc::clone(&seen);
        tree.add_event_listener(root, event_types::REMOVE_CHILD, move |e, tree| {
            let node = e.related_node().ok_or_else(|| ListenerError::new("no node"))?;
            seen.borrow_mut().push(tree.parent(node));
            Ok(())
        })
        .unwrap();
    }

    tree.remove_child(root, child).unwrap();
    assert_eq!(*seen.borrow(), vec![Some(root)]);
    assert_eq!(tree.sibling_index(child), None);
    assert_eq!(tree.depth(child), 0);
}

#[test]
fn test_reparent_fires_remove_then_append() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let a = tree.create_element("a");
    let b = tree.create_element("b");
    let c = tree.create_element("c");
    tree.append_child(root, a).unwrap();
    tree.append_child(root, b).unwrap();
    tree.append_child(a, c).unwrap();

    let log = log();
    record(&mut tree, a, event_types::REMOVE_CHILD, &log, "removed-from-a");
    record(&mut tree, b, event_types::APPEND_CHILD, &log, "appended-to-b");

    tree.append_child(b, c).unwrap();
    assert_eq!(*log.borrow(), vec!["removed-from-a", "appended-to-b"]);
}

#[test]
fn test_attribute_actions() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let actions = Rc::new(RefCell::new(Vec::new()));
    {
        let actions = Rc::clone(&actions);
        tree.add_event_listener(root, event_types::MODIFY_ATTR, move |e, _| {
            let m = e.attribute_mutation().ok_or_else(|| ListenerError::new("payload"))?;
            actions
                .borrow_mut()
                .push((m.action, m.previous.clone(), m.value.clone()));
            Ok(())
        })
        .unwrap();
    }

    tree.set_attribute(root, "title", Some("a")).unwrap();
    tree.set_attribute(root, "title", Some("b")).unwrap();
    tree.set_attribute(root, "title", Some("b")).unwrap();
    tree.set_attribute(root, "title", None).unwrap();
    tree.set_attribute(root, "missing", None).unwrap();

    assert_eq!(
        *actions.borrow(),
        vec![
            (AttributeAction::Add, None, Some("a".to_string())),
            (AttributeAction::Set, Some("a".to_string()), Some("b".to_string())),
            (AttributeAction::Remove, Some("b".to_string()), None),
        ]
    );
}

#[test]
fn test_option_fires_on_document() {
    let mut tree = DomTree::new();
    let doc = tree.document();
    let log = log();
    record(&mut tree, doc, event_types::MODIFY_OPTION, &log, "option");

    tree.set_option("theme", Some("dark")).unwrap();
    assert_eq!(tree.option("theme"), Some("dark"));
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_text_change_targets_parent() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let text = tree.create_text("old");
    tree.append_child(root, text).unwrap();

    let seen = Rc::new(RefCell::new(None));
    {
        let seen = Rc::clone(&seen);
        tree.add_event_listener(root, event_types::TEXT_CHANGE, move |e, _| {
            *seen.borrow_mut() = e.related_node();
            Ok(())
        })
        .unwrap();
    }

    tree.set_text(text, "new").unwrap();
    assert_eq!(*seen.borrow(), Some(text));
    assert_eq!(tree.text_content(root), "new");
}

#[test]
fn test_destroy_drops_listeners() {
    let mut tree = DomTree::new();
    let root = tree.root();
    let a = tree.create_element("a");
    tree.append_child(root, a).unwrap();
    tree.add_event_listener(a, "click", |_, _| Ok(())).unwrap();
    assert_eq!(tree.listener_count(a, "click"), 1);

    tree.remove_child(root, a).unwrap();
    assert_eq!(tree.listener_count(a, "click"), 1);
    tree.destroy(a).unwrap();
    assert_eq!(tree.listener_count(a, "click"), 0);
}
