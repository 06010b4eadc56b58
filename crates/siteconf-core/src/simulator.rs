//! The Simulator (spec §4.6): a dry run reporting every structure path whose
//! chain of `url_matcher`s accepts an arbitrary candidate URL, along with a
//! synthesized file-path for each hit.
//!
//! Implemented per the spec's own simplified description rather than the
//! reference implementation's more tangled edge-case behavior around
//! re-using ancestor contributions — see `DESIGN.md`.

use siteconf_html::LinkEl;
use siteconf_tree::NodeId;

use crate::component::PreReqArgs;
use crate::paths::join;
use crate::tree::StructureTree;

/// One simulated hit: a fully-matching path from a root child down to some
/// node, and the file-path that would result.
#[derive(Debug, Clone)]
pub struct SimulatedHit {
    pub structure_path: Vec<usize>,
    pub file_path: String,
}

/// Walks every root-to-node chain. Recursion into a node's children proceeds
/// regardless of whether the node's own `url_matcher` accepted `url` — the
/// probe is a single fixed string reused at every depth, so a node failing
/// to match it says nothing about whether some descendant might still be
/// structurally reachable. Only nodes whose own matcher accepts contribute a
/// hit (or, for pass-through nodes with no matcher at all, contribute
/// unconditionally — they'd run against the same response in a real crawl).
pub fn simulate(tree: &StructureTree, url: &str) -> Vec<SimulatedHit> {
    let link_el = LinkEl::synthetic(url, "");
    let mut hits = Vec::new();
    for &child in tree.children(tree.root_id()) {
        walk(tree, child, url, &link_el, String::new(), &mut hits);
    }
    hits
}

fn walk(
    tree: &StructureTree,
    node_id: NodeId,
    url: &str,
    link_el: &LinkEl,
    file_path_so_far: String,
    hits: &mut Vec<SimulatedHit>,
) {
    let node = tree.node(node_id);
    let accepted = match &node.url_matcher {
        Some(matcher) => matcher.accepts(url),
        None => true,
    };

    let file_path = if accepted {
        let url_match = node.url_matcher.as_ref().and_then(|m| m.try_match(url));
        let pre_req = PreReqArgs {
            url,
            link_el,
            url_match: url_match.as_ref(),
        };
        match &node.file_path_extractor {
            Some(extractor) => join(&file_path_so_far, &extractor.simulate(&pre_req)),
            None => file_path_so_far.clone(),
        }
    } else {
        file_path_so_far.clone()
    };

    if accepted {
        hits.push(SimulatedHit {
            structure_path: tree.path_to(node_id),
            file_path: file_path.clone(),
        });
    }

    for &child in tree.children(node_id) {
        walk(tree, child, url, link_el, file_path.clone(), hits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FilePathExtractor, UrlMatcher};
    use crate::tree::{build, NodeDef, StructureDefItem};

    fn node(source: &str, pattern: &str, file_path: &str) -> NodeDef {
        NodeDef {
            source: source.to_string(),
            url_matcher: Some(UrlMatcher::regex(pattern).unwrap()),
            file_path_extractor: Some(FilePathExtractor::template(file_path)),
            ..Default::default()
        }
    }

    #[test]
    fn simulate_reports_every_matching_depth() {
        let items = vec![StructureDefItem::Node(node(
            "a",
            r"https://example\.com/",
            "root",
        ))];
        let tree = build(items).unwrap();
        let hits = simulate(&tree, "https://example.com/");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].structure_path, vec![0]);
        assert_eq!(hits[0].file_path, "root");
    }

    #[test]
    fn simulate_skips_non_matching_branches() {
        let items = vec![StructureDefItem::Node(node(
            "a",
            r"https://example\.com/nope",
            "x",
        ))];
        let tree = build(items).unwrap();
        assert!(simulate(&tree, "https://example.com/").is_empty());
    }

    #[test]
    fn simulate_concatenates_file_path_down_the_chain() {
        let items = vec![
            StructureDefItem::Node(node("a", r"https://example\.com/", "root/")),
            StructureDefItem::Node(node("b", r"https://example\.com/", "leaf")),
        ];
        let tree = build(items).unwrap();
        let hits = simulate(&tree, "https://example.com/");
        // both "a" and "b" accept the same probe URL in this synthetic test
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].file_path, "root/");
        assert_eq!(hits[1].file_path, "root/leaf");
    }

    #[test]
    fn simulate_recurses_past_a_non_matching_ancestor() {
        // "a" doesn't accept the probe URL, but "b" underneath it does — the
        // walk must still reach and report "b", since a single ancestor
        // failing to match the fixed probe says nothing about whether a
        // descendant is structurally reachable.
        let items = vec![
            StructureDefItem::Node(node("a", r"https://example\.com/nope", "root")),
            StructureDefItem::Node(node("b", r"https://example\.com/", "leaf")),
        ];
        let tree = build(items).unwrap();
        let hits = simulate(&tree, "https://example.com/");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].structure_path, vec![0, 0]);
        // "a" didn't match, so its own contribution is skipped rather than
        // prepended.
        assert_eq!(hits[0].file_path, "leaf");
    }
}
