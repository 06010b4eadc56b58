//! Arena-backed, append-only ID-tree.
//!
//! Nodes are stored in a flat `Vec` and addressed by [`NodeId`], a plain index
//! newtype. There is no node removal, detaching or reparenting: once a
//! [`Tree`] is built it is only ever walked, never mutated, so the
//! slotmap/generational-index machinery a mutable ID-tree needs (stable ids
//! across removals, `Weak` back-references to avoid cycles) would be pure
//! overhead here. A non-owning `parent` field on each node and `NodeId` being
//! `Copy` are enough to avoid any ownership cycle.

/// Index into a [`Tree`]'s arena. Only meaningful paired with the `Tree` that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index)
    }

    fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Node<T> {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    value: T,
}

/// An arena of nodes with a single designated root.
///
/// Always contains at least a root node. Construction is append-only: use
/// [`Tree::new`] to create the root, then [`Tree::append`] to grow it.
#[derive(Debug)]
pub struct Tree<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Tree<T> {
    /// Creates a tree containing only a root node.
    pub fn new(root: T) -> Self {
        Tree {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                value: root,
            }],
        }
    }

    /// Returns the id of the root node.
    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns a reference to the root node's value.
    pub fn root(&self) -> &T {
        self.value(self.root_id())
    }

    /// Appends a new child to `parent`, returning the new node's id.
    ///
    /// # Panics
    /// Panics if `parent` does not belong to this tree.
    pub fn append(&mut self, parent: NodeId, value: T) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            value,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Reparents every child of `from` onto `onto`, appending them after
    /// `onto`'s existing children, then removes the now-childless `from`
    /// from its own parent's children list. Used by branch-merging during
    /// structure construction: each branch entry is first parsed as if it
    /// were its own root, then its top-level nodes are grafted onto the real
    /// parent and the temporary root is discarded rather than lingering as a
    /// spurious sibling.
    ///
    /// # Panics
    /// Panics if `from` is the tree's root (a root has no parent to detach
    /// it from).
    pub fn graft_children(&mut self, from: NodeId, onto: NodeId) {
        let moved: Vec<NodeId> = std::mem::take(&mut self.nodes[from.index()].children);
        for &child in &moved {
            self.nodes[child.index()].parent = Some(onto);
        }
        self.nodes[onto.index()].children.extend(moved);

        let from_parent = self.nodes[from.index()]
            .parent
            .expect("graft_children: `from` must not be the tree root");
        self.nodes[from_parent.index()]
            .children
            .retain(|&id| id != from);
    }

    /// Returns the value stored at `id`.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn value(&self, id: NodeId) -> &T {
        &self.nodes[id.index()].value
    }

    /// Returns the parent id of `id`, or `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Returns the ordered ids of `id`'s children.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Returns true if `id` has no children.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.index()].children.is_empty()
    }

    /// Returns the index of `id` among its siblings (0 for the root).
    pub fn sibling_index(&self, id: NodeId) -> usize {
        match self.nodes[id.index()].parent {
            None => 0,
            Some(parent) => self.nodes[parent.index()]
                .children
                .iter()
                .position(|&c| c == id)
                .expect("child is registered under its own parent"),
        }
    }

    /// Walks `path` (a sequence of child indices) starting from `from`,
    /// returning the id reached, or `None` if any index is out of range.
    pub fn walk_from(&self, from: NodeId, path: &[usize]) -> Option<NodeId> {
        let mut current = from;
        for &i in path {
            current = *self.children(current).get(i)?;
        }
        Some(current)
    }

    /// Walks `path` starting from the root. See [`Tree::walk_from`].
    pub fn walk(&self, path: &[usize]) -> Option<NodeId> {
        self.walk_from(self.root_id(), path)
    }

    /// Returns the full index path from the root to `id` (empty for the root).
    pub fn path_to(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(self.sibling_index(current));
            current = parent;
        }
        path.reverse();
        path
    }

    /// Iterates every node in the tree (arena order, root first), for
    /// whole-tree validation passes that don't need a particular traversal
    /// order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i), &n.value))
    }

    /// Number of nodes in the tree, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Creates a tree from nested expressions, for tests and fixtures.
///
/// ```
/// # use siteconf_tree::tree;
/// let t = tree!("root");
/// assert_eq!(*t.root(), "root");
/// ```
///
/// ```
/// # use siteconf_tree::tree;
/// let t = tree! {
///     "root" => {
///         "child a",
///         "child b" => {
///             "grandchild a",
///             "grandchild b",
///         },
///         "child c",
///     }
/// };
/// assert_eq!(t.len(), 6);
/// ```
#[macro_export]
macro_rules! tree {
    (@ $t:ident, $n:expr, { }) => { };

    (@ $t:ident, $n:expr, { $value:expr }) => {
        { $t.append($n, $value); }
    };

    (@ $t:ident, $n:expr, { $value:expr, $($tail:tt)* }) => {
        {
            $t.append($n, $value);
            $crate::tree!(@ $t, $n, { $($tail)* });
        }
    };

    (@ $t:ident, $n:expr, { $value:expr => $children:tt }) => {
        {
            let child = $t.append($n, $value);
            $crate::tree!(@ $t, child, $children);
        }
    };

    (@ $t:ident, $n:expr, { $value:expr => $children:tt, $($tail:tt)* }) => {
        {
            {
                let child = $t.append($n, $value);
                $crate::tree!(@ $t, child, $children);
            }
            $crate::tree!(@ $t, $n, { $($tail)* });
        }
    };

    ($root:expr) => { $crate::Tree::new($root) };

    ($root:expr => $children:tt) => {
        {
            let mut t = $crate::Tree::new($root);
            let root_id = t.root_id();
            $crate::tree!(@ t, root_id, $children);
            t
        }
    };
}
