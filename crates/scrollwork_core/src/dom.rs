//! Node tree
//!
//! A minimal stand-in for a rendered page: every node has a document-space
//! rectangle and a resolved [`Style`]. Animations only ever mutate style
//! through [`NodeTree::write_style`], which also counts writes so callers can
//! verify that nothing touches a node after its section is gone.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Unique identifier for a node in the tree
    pub struct NodeId;
}

/// Axis-aligned rectangle in document coordinates (y grows downward)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Center point of the rectangle
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Whether the point lies inside the rectangle (edges inclusive)
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
    }
}

/// Resolved visual state of a node
///
/// Every field always has a concrete value; partial updates are expressed by
/// the animation layer and applied onto this.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    /// Opacity (0.0 to 1.0)
    pub opacity: f32,
    /// Translation X in pixels
    pub translate_x: f32,
    /// Translation Y in pixels
    pub translate_y: f32,
    /// Translation Z in pixels (positive = toward viewer)
    pub translate_z: f32,
    /// Uniform scale factor
    pub scale: f32,
    /// Rotation in degrees (Z-axis)
    pub rotate: f32,
    /// Rotation X in degrees (3D tilt)
    pub rotate_x: f32,
    /// Rotation Y in degrees (3D turn)
    pub rotate_y: f32,
    /// Width as a percentage of the natural width
    pub width_pct: f32,
    /// Vertical background position in percent
    pub background_y_pct: f32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
            translate_z: 0.0,
            scale: 1.0,
            rotate: 0.0,
            rotate_x: 0.0,
            rotate_y: 0.0,
            width_pct: 100.0,
            background_y_pct: 0.0,
        }
    }
}

struct Node {
    rect: Rect,
    style: Style,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
    writes: u64,
}

/// Owner of every node and its style
pub struct NodeTree {
    nodes: SlotMap<NodeId, Node>,
    total_writes: u64,
}

impl NodeTree {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            total_writes: 0,
        }
    }

    /// Insert a root-level node
    pub fn insert(&mut self, rect: Rect) -> NodeId {
        self.nodes.insert(Node {
            rect,
            style: Style::default(),
            parent: None,
            children: SmallVec::new(),
            writes: 0,
        })
    }

    /// Insert a node under `parent`
    ///
    /// Returns `None` if the parent does not exist.
    pub fn insert_child(&mut self, parent: NodeId, rect: Rect) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        let id = self.nodes.insert(Node {
            rect,
            style: Style::default(),
            parent: Some(parent),
            children: SmallVec::new(),
            writes: 0,
        });
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(id);
        }
        Some(id)
    }

    /// Remove a node and its whole subtree
    ///
    /// Returns the number of nodes removed (0 if it did not exist).
    pub fn remove(&mut self, id: NodeId) -> usize {
        let Some(node) = self.nodes.remove(id) else {
            return 0;
        };

        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|c| *c != id);
        }

        let mut removed = 1;
        let mut stack: Vec<NodeId> = node.children.into_vec();
        while let Some(child) = stack.pop() {
            if let Some(node) = self.nodes.remove(child) {
                removed += 1;
                stack.extend(node.children);
            }
        }
        removed
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.nodes.get(id).map(|n| n.rect)
    }

    /// Move or resize a node (layout changes are not style writes)
    pub fn set_rect(&mut self, id: NodeId, rect: Rect) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn style(&self, id: NodeId) -> Option<&Style> {
        self.nodes.get(id).map(|n| &n.style)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Direct children, in insertion order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Mutate a node's style
    ///
    /// Returns `false` (and does nothing) if the node is gone.
    pub fn write_style<F>(&mut self, id: NodeId, f: F) -> bool
    where
        F: FnOnce(&mut Style),
    {
        let Some(node) = self.nodes.get_mut(id) else {
            tracing::trace!(?id, "style write to missing node skipped");
            return false;
        };
        f(&mut node.style);
        node.writes += 1;
        self.total_writes += 1;
        true
    }

    /// Number of style writes a node has received
    pub fn write_count(&self, id: NodeId) -> u64 {
        self.nodes.get(id).map(|n| n.writes).unwrap_or(0)
    }

    /// Number of style writes across the whole tree, including removed nodes
    pub fn total_writes(&self) -> u64 {
        self.total_writes
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Rect, &Style)> {
        self.nodes.iter().map(|(id, n)| (id, &n.rect, &n.style))
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}
