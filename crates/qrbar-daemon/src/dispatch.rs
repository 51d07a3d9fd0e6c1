//! Touch hit-testing and callback dispatch.

#![allow(dead_code)]

use std::collections::HashMap;

use tracing::debug;

use crate::scene::{NodeId, SceneGraph};

/// Handler invoked when a touch lands on a registered leaf. Receives the
/// scene so it can mutate it (toggling a hidden flag is the usual reaction);
/// dispatch itself never touches the graph.
pub type TouchHandler = Box<dyn FnMut(&mut SceneGraph, NodeId, i32, i32, usize)>;

/// Explicit callback table keyed by node identity.
///
/// Populated at scene-construction time; handlers are never removed.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<NodeId, TouchHandler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for a node, replacing any previous one. At most
    /// one handler per node.
    pub fn register(&mut self, node: NodeId, handler: TouchHandler) {
        self.handlers.insert(node, handler);
    }

    pub fn has_handler(&self, node: NodeId) -> bool {
        self.handlers.contains_key(&node)
    }

    /// Hit-tests the point against the scene and invokes the matched leaf's
    /// handler, if any. Returns true only when a handler ran.
    pub fn dispatch(&mut self, scene: &mut SceneGraph, x: i32, y: i32, finger: usize) -> bool {
        let Some(node) = scene.hit_test(x, y) else {
            debug!("Touch ({}, {}) hit nothing", x, y);
            return false;
        };
        match self.handlers.get_mut(&node) {
            Some(handler) => {
                debug!("Touch ({}, {}) dispatched to {:?}", x, y, node);
                handler(scene, node, x, y, finger);
                true
            }
            None => {
                debug!("Touch ({}, {}) hit {:?}, no handler", x, y, node);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::test_leaf;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_unhandled_when_no_callback() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        test_leaf(&mut scene, root, 0, 0);

        let mut dispatcher = Dispatcher::new();
        assert!(!dispatcher.dispatch(&mut scene, 5, 5, 0));
    }

    #[test]
    fn test_unhandled_on_miss_even_with_callback() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let leaf = test_leaf(&mut scene, root, 0, 0);

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(leaf, Box::new(|_, _, _, _, _| panic!("must not run")));
        assert!(!dispatcher.dispatch(&mut scene, 50, 50, 0));
    }

    #[test]
    fn test_handler_invoked_exactly_once() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let leaf = test_leaf(&mut scene, root, 0, 0);

        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(
            leaf,
            Box::new(move |_, node, x, y, finger| {
                assert_eq!(node, leaf);
                assert_eq!((x, y, finger), (4, 7, 2));
                seen.set(seen.get() + 1);
            }),
        );

        assert!(dispatcher.dispatch(&mut scene, 4, 7, 2));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_handler_may_toggle_hidden() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let leaf = test_leaf(&mut scene, root, 0, 0);

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(
            leaf,
            Box::new(|scene, node, _, _, _| {
                let hidden = scene.is_hidden(node);
                scene.set_hidden(node, !hidden);
            }),
        );

        assert!(dispatcher.dispatch(&mut scene, 1, 1, 0));
        assert!(scene.is_hidden(leaf));
        // Hidden leaves still hit, so a second touch un-hides
        assert!(dispatcher.dispatch(&mut scene, 1, 1, 0));
        assert!(!scene.is_hidden(leaf));
    }
}
