//! Structure Tree (spec §3.2/§4.3): the compiled, immutable-after-construction
//! tree of structure nodes, and the branch-merging builder that produces it
//! from a mixed list of string/record/branch entries.

use siteconf_tree::{NodeId, Tree};

use crate::error::{CoreError, Result};
use crate::schema::{Assertion, ContentSelector, FileContentExtractor, FilePathExtractor, UrlConverter, UrlMatcher};

/// One level of the declarative site-topology tree.
///
/// Compiled once at config load and never mutated; `parent`/`children` are
/// navigational, not ownership — the arena in [`StructureTree`] owns every
/// node.
pub struct StructureNode {
    pub is_root: bool,
    pub source: String,
    pub url_matcher: Option<UrlMatcher>,
    pub url_converter: Option<UrlConverter>,
    pub content_selector: Option<ContentSelector>,
    pub file_content_extractor: Option<FileContentExtractor>,
    pub file_path_extractor: Option<FilePathExtractor>,
    pub assertion: Option<Assertion>,
    pub paging: bool,
}

impl StructureNode {
    fn root() -> Self {
        StructureNode {
            is_root: true,
            source: "<root>".to_string(),
            url_matcher: None,
            url_converter: None,
            content_selector: None,
            file_content_extractor: None,
            file_path_extractor: None,
            assertion: None,
            paging: false,
        }
    }

    /// A pass-through node is one with no `url_matcher`: it is evaluated
    /// against the parent's response rather than issuing a new request
    /// (spec §3.2).
    pub fn needs_no_request(&self) -> bool {
        self.url_matcher.is_none()
    }
}

/// The compiled tree: an arena of [`StructureNode`] plus the root's id.
pub struct StructureTree {
    arena: Tree<StructureNode>,
}

impl StructureTree {
    pub fn root_id(&self) -> NodeId {
        self.arena.root_id()
    }

    pub fn node(&self, id: NodeId) -> &StructureNode {
        self.arena.value(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena.children(id)
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.arena.is_leaf(id)
    }

    pub fn sibling_index(&self, id: NodeId) -> usize {
        self.arena.sibling_index(id)
    }

    /// Walks `path` (a sequence of child indices) from the root, per spec
    /// §GLOSSARY's "structure path".
    pub fn walk(&self, path: &[usize]) -> Option<NodeId> {
        self.arena.walk(path)
    }

    pub fn path_to(&self, id: NodeId) -> Vec<usize> {
        self.arena.path_to(id)
    }
}

/// One entry in a raw structure-definition list (spec §4.3 step 2): either a
/// single node's worth of options, or a branch of sibling subtrees.
pub enum StructureDefItem {
    Node(NodeDef),
    Branch(Vec<Vec<StructureDefItem>>),
}

/// The raw, uncompiled option set for a single structure node (spec §4.2).
/// Built either by the Rust builder (closures allowed) or by the YAML loader
/// (literals only — see [`crate::config`]).
#[derive(Default)]
pub struct NodeDef {
    pub source: String,
    pub url_matcher: Option<UrlMatcher>,
    pub url_converter: Option<UrlConverter>,
    pub content_selector: Option<ContentSelector>,
    pub file_content_extractor: Option<FileContentExtractor>,
    pub file_path_extractor: Option<FilePathExtractor>,
    pub assertion: Option<Assertion>,
    pub paging: bool,
}

/// Builds a [`StructureTree`] from a structure-definition list (spec §4.3).
///
/// Each entry in the list nests inside the previous one — the cursor
/// advances to every freshly appended node, so a flat list like
/// `[a, b]` produces the chain `root -> a -> b`, not two siblings of
/// `root`. A branch breaks the chain into multiple sibling subtrees hung
/// off the node the cursor had reached just before the branch.
///
/// The branch case is handled by building each entry's subtree under a
/// temporary "holder" node in the same arena, then grafting the holder's
/// children onto the real parent — the arena's `graft_children` does the
/// detach-and-reparent in one step, so no second pass over a standalone
/// per-entry tree is needed (a Vec/usize arena makes this a pointer-free
/// `Vec` splice rather than a slotmap/Rc juggling act).
pub fn build(items: Vec<StructureDefItem>) -> Result<StructureTree> {
    let mut arena = Tree::new(StructureNode::root());
    let root_id = arena.root_id();
    append_items(&mut arena, root_id, items)?;
    let tree = StructureTree { arena };
    check(&tree)?;
    Ok(tree)
}

fn append_items(
    arena: &mut Tree<StructureNode>,
    parent: NodeId,
    items: Vec<StructureDefItem>,
) -> Result<()> {
    let mut cursor = parent;
    let mut branched = false;

    for item in items {
        if branched {
            return Err(CoreError::config(
                "no further structure entries are permitted after a branch",
                "<branch>",
            ));
        }

        match item {
            StructureDefItem::Node(def) => {
                let node = compile_node(def)?;
                cursor = arena.append(cursor, node);
            }
            StructureDefItem::Branch(entries) => {
                for entry in entries {
                    let holder = arena.append(cursor, StructureNode::root());
                    append_items(arena, holder, entry)?;
                    arena.graft_children(holder, cursor);
                }
                branched = true;
            }
        }
    }

    Ok(())
}

fn compile_node(def: NodeDef) -> Result<StructureNode> {
    Ok(StructureNode {
        is_root: false,
        source: def.source,
        url_matcher: def.url_matcher,
        url_converter: def.url_converter,
        content_selector: def.content_selector,
        file_content_extractor: def.file_content_extractor,
        file_path_extractor: def.file_path_extractor,
        assertion: def.assertion,
        paging: def.paging,
    })
}

/// Spec §4.3 step 5: rejects any non-leaf node with a `file_content_extractor`.
fn check(tree: &StructureTree) -> Result<()> {
    for (id, node) in tree.arena.nodes() {
        if node.file_content_extractor.is_some() && !tree.arena.is_leaf(id) {
            return Err(CoreError::config(
                "file_content is only allowed on leaf nodes",
                node.source.clone(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(source: &str) -> NodeDef {
        NodeDef {
            source: source.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn flat_list_nests_each_entry_under_the_previous() {
        // [a, b] is the chain root -> a -> b, not two siblings of root
        // (S1's two-entry structure is parent/child, matching against the
        // start response and then against links found within it).
        let items = vec![
            StructureDefItem::Node(leaf("a")),
            StructureDefItem::Node(leaf("b")),
        ];
        let tree = build(items).unwrap();
        let root_children = tree.children(tree.root_id());
        assert_eq!(root_children.len(), 1);
        let a = root_children[0];
        assert_eq!(tree.node(a).source, "a");
        let a_children = tree.children(a);
        assert_eq!(a_children.len(), 1);
        assert_eq!(tree.node(a_children[0]).source, "b");
    }

    #[test]
    fn branch_produces_sibling_subtrees_under_the_cursor() {
        let items = vec![
            StructureDefItem::Node(leaf("root-child")),
            StructureDefItem::Branch(vec![
                vec![StructureDefItem::Node(leaf("branch-a"))],
                vec![StructureDefItem::Node(leaf("branch-b"))],
            ]),
        ];
        let tree = build(items).unwrap();
        let root_child = tree.children(tree.root_id())[0];
        let branch_children = tree.children(root_child);
        assert_eq!(branch_children.len(), 2);
        assert_eq!(tree.node(branch_children[0]).source, "branch-a");
        assert_eq!(tree.node(branch_children[1]).source, "branch-b");
        // the branch merge leaves no spurious holder node behind
        assert!(tree.is_leaf(branch_children[0]));
        assert!(tree.is_leaf(branch_children[1]));
    }

    #[test]
    fn trailing_item_after_branch_is_rejected() {
        let items = vec![
            StructureDefItem::Branch(vec![vec![StructureDefItem::Node(leaf("x"))]]),
            StructureDefItem::Node(leaf("trailing")),
        ];
        let err = build(items).unwrap_err();
        assert!(matches!(err, CoreError::ConfigError { .. }));
    }

    #[test]
    fn file_content_on_non_leaf_is_rejected() {
        let items = vec![
            StructureDefItem::Node({
                let mut n = leaf("parent");
                n.file_content_extractor = Some(FileContentExtractor::xpath("//p/text()"));
                n
            }),
            StructureDefItem::Node(leaf("child")),
        ];
        let err = build(items).unwrap_err();
        assert!(matches!(err, CoreError::ConfigError { .. }));
    }

    #[test]
    fn file_content_on_leaf_is_accepted() {
        let items = vec![StructureDefItem::Node({
            let mut n = leaf("leaf");
            n.file_content_extractor = Some(FileContentExtractor::xpath("//p/text()"));
            n
        })];
        assert!(build(items).is_ok());
    }
}
