use std::collections::BTreeMap;

use url::Url;

use crate::node::Node;

/// A detached, owned snapshot of the element that produced a link. Never a
/// borrow into the parsed document: a `RequestUrl`'s `link_el` must outlive
/// the response it was extracted from, since it rides along as request
/// metadata until the follow-up response arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEl {
    pub tag_name: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
}

impl LinkEl {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Builds a synthetic anchor for a URL with no real source element, used
    /// by the start-response parent context and by the simulator.
    pub fn synthetic(href: &str, text: &str) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert("href".to_string(), href.to_string());
        LinkEl {
            tag_name: "a".to_string(),
            attrs,
            text: text.to_string(),
        }
    }

    fn from_node(node: &Node) -> Self {
        LinkEl {
            tag_name: node.tag_name(),
            attrs: node.attributes(),
            text: node.text_content(),
        }
    }
}

const HREF_TAGS: &[&str] = &["a", "area", "link"];
const SRC_TAGS: &[&str] = &[
    "img", "embed", "iframe", "input", "script", "source", "track", "video",
];

fn link_url(tag: &str, el: &Node) -> Option<String> {
    if HREF_TAGS.contains(&tag) {
        el.attribute("href")
    } else if SRC_TAGS.contains(&tag) {
        el.attribute("src")
    } else {
        el.attribute("href").or_else(|| el.attribute("src"))
    }
}

/// Extracts `(element, absolute url)` pairs for every descendant of
/// `content_nodes` bearing a link, in document order, resolved against
/// `base_url`.
pub fn extract_links(content_nodes: &[Node], base_url: &Url) -> Vec<(LinkEl, Url)> {
    let mut out = Vec::new();
    for scope in content_nodes {
        collect(scope, base_url, &mut out);
    }
    out
}

fn collect(node: &Node, base_url: &Url, out: &mut Vec<(LinkEl, Url)>) {
    for child in node.children() {
        if child.is_element() {
            let tag = child.tag_name().to_lowercase();
            if let Some(raw) = link_url(&tag, &child) {
                if let Ok(abs) = base_url.join(&raw) {
                    out.push((LinkEl::from_node(&child), abs));
                }
            }
        }
        collect(&child, base_url, out);
    }
}
