//! Scene graph of positioned visual elements.
//!
//! Nodes live in an arena with stable ids, so hit-testing walks indices
//! instead of live display objects. Only leaves are hit-testable; groups
//! recurse. A leaf without a size is skipped by hit-testing, not an error.

#![allow(dead_code)]

use qrbar_hw::QrBitmap;

/// Stable identity of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// What a leaf renders.
pub enum Content {
    /// A QR code, drawn `scale` pixels per module.
    Qr {
        bitmap: QrBitmap,
        scale: u32,
        fg: u32,
        bg: u32,
    },
    /// A decoded RGBA image.
    Image(image::RgbaImage),
    /// A text label.
    Text { text: String, size: f32, color: u32 },
}

/// Node variant, decided at construction time.
pub enum NodeKind {
    /// Ordered children, positions relative to the group.
    Group { children: Vec<NodeId> },
    /// A renderable element. `size` is its hit-test bounding box; leaves
    /// without one (labels) never match a touch.
    Leaf {
        size: Option<(u32, u32)>,
        content: Content,
    },
}

/// A positioned visual element.
pub struct Node {
    pub x: i32,
    pub y: i32,
    pub hidden: bool,
    pub kind: NodeKind,
}

/// Arena-backed scene graph with a root group.
///
/// Detached nodes stay in the arena; churn is one small group per address
/// change, so slots are never reused.
pub struct SceneGraph {
    nodes: Vec<Node>,
    root: NodeId,
}

impl SceneGraph {
    /// Creates a scene with an empty root group at the origin.
    pub fn new() -> Self {
        let root = Node {
            x: 0,
            y: 0,
            hidden: false,
            kind: NodeKind::Group {
                children: Vec::new(),
            },
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Adds an empty group under `parent`. The parent must be a group; a
    /// leaf parent leaves the new node detached.
    pub fn add_group(&mut self, parent: NodeId, x: i32, y: i32) -> NodeId {
        let id = self.push(Node {
            x,
            y,
            hidden: false,
            kind: NodeKind::Group {
                children: Vec::new(),
            },
        });
        self.attach(parent, id);
        id
    }

    /// Adds a leaf under `parent`.
    pub fn add_leaf(
        &mut self,
        parent: NodeId,
        x: i32,
        y: i32,
        size: Option<(u32, u32)>,
        content: Content,
    ) -> NodeId {
        let id = self.push(Node {
            x,
            y,
            hidden: false,
            kind: NodeKind::Leaf { size, content },
        });
        self.attach(parent, id);
        id
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let NodeKind::Group { children } = &mut self.nodes[parent.0].kind {
            children.push(child);
        } else {
            debug_assert!(false, "attach target is not a group");
        }
    }

    /// Detaches `child` from `parent`'s child list. Returns false if it was
    /// not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if let NodeKind::Group { children } = &mut self.nodes[parent.0].kind {
            let before = children.len();
            children.retain(|c| *c != child);
            children.len() != before
        } else {
            false
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].kind {
            NodeKind::Group { children } => children,
            NodeKind::Leaf { .. } => &[],
        }
    }

    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.nodes[id.0].hidden
    }

    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        self.nodes[id.0].hidden = hidden;
    }

    /// All attached leaves in depth-first order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(self.root, &mut out);
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match &self.nodes[id.0].kind {
            NodeKind::Group { children } => {
                for child in children {
                    self.collect_leaves(*child, out);
                }
            }
            NodeKind::Leaf { .. } => out.push(id),
        }
    }

    /// Finds the first leaf in depth-first order whose bounding box contains
    /// the point. Group offsets accumulate; sizeless leaves are skipped;
    /// hidden leaves still match (a toggle handler has to fire again to
    /// un-hide them). Never mutates the graph.
    pub fn hit_test(&self, x: i32, y: i32) -> Option<NodeId> {
        self.hit_in(self.root, 0, 0, x, y)
    }

    fn hit_in(&self, id: NodeId, ox: i32, oy: i32, x: i32, y: i32) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        let nx = ox + node.x;
        let ny = oy + node.y;
        match &node.kind {
            NodeKind::Group { children } => children
                .iter()
                .find_map(|child| self.hit_in(*child, nx, ny, x, y)),
            NodeKind::Leaf {
                size: Some((w, h)), ..
            } => {
                let inside =
                    nx <= x && x < nx + *w as i32 && ny <= y && y < ny + *h as i32;
                inside.then_some(id)
            }
            NodeKind::Leaf { size: None, .. } => None,
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A 10x10 hit-testable leaf with throwaway content.
    pub(crate) fn test_leaf(scene: &mut SceneGraph, parent: NodeId, x: i32, y: i32) -> NodeId {
        scene.add_leaf(
            parent,
            x,
            y,
            Some((10, 10)),
            Content::Text {
                text: String::new(),
                size: 1.0,
                color: 0,
            },
        )
    }

    #[test]
    fn test_miss_outside_all_boxes() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        test_leaf(&mut scene, root, 5, 5);
        assert_eq!(scene.hit_test(100, 100), None);
        // Box is half-open: (15, 15) is just past the far edge
        assert_eq!(scene.hit_test(15, 15), None);
    }

    #[test]
    fn test_unique_hit() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = test_leaf(&mut scene, root, 0, 0);
        let b = test_leaf(&mut scene, root, 50, 50);
        assert_eq!(scene.hit_test(3, 3), Some(a));
        assert_eq!(scene.hit_test(55, 59), Some(b));
    }

    #[test]
    fn test_depth_first_tie_break() {
        // Two overlapping leaves at different nesting depths; the one reached
        // first in depth-first order wins, regardless of depth.
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let group = scene.add_group(root, 0, 0);
        let nested = test_leaf(&mut scene, group, 5, 5);
        let _flat = test_leaf(&mut scene, root, 5, 5);
        assert_eq!(scene.hit_test(7, 7), Some(nested));

        // Same overlap, opposite insertion order
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let first = test_leaf(&mut scene, root, 5, 5);
        let group = scene.add_group(root, 0, 0);
        let _nested = test_leaf(&mut scene, group, 5, 5);
        assert_eq!(scene.hit_test(7, 7), Some(first));
    }

    #[test]
    fn test_group_offsets_accumulate() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let group = scene.add_group(root, 100, 200);
        let leaf = test_leaf(&mut scene, group, 10, 10);
        assert_eq!(scene.hit_test(115, 215), Some(leaf));
        assert_eq!(scene.hit_test(15, 15), None);
    }

    #[test]
    fn test_sizeless_leaf_skipped() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene.add_leaf(
            root,
            0,
            0,
            None,
            Content::Text {
                text: "label".into(),
                size: 24.0,
                color: 0xFFFFFF,
            },
        );
        assert_eq!(scene.hit_test(1, 1), None);
    }

    #[test]
    fn test_hidden_leaf_still_hits() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let leaf = test_leaf(&mut scene, root, 0, 0);
        scene.set_hidden(leaf, true);
        assert_eq!(scene.hit_test(2, 2), Some(leaf));
    }

    #[test]
    fn test_remove_child() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let leaf = test_leaf(&mut scene, root, 0, 0);
        assert!(scene.remove_child(root, leaf));
        assert!(!scene.remove_child(root, leaf));
        assert_eq!(scene.hit_test(2, 2), None);
        assert!(scene.leaves().is_empty());
    }
}
