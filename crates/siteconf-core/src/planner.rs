//! The Command Planner (spec §4.5): given a response and an optional parent
//! context, walks the structure tree to produce the ordered list of commands
//! for that response.
//!
//! Pure and single-threaded per invocation (spec §5): it reads the tree and
//! the response, never mutates either, and performs no I/O.

use siteconf_html::{extract_links, Document, LinkEl, Node as HtmlNode};

use crate::command::{Command, UrlInfo};
use crate::component::{ParamKit, PreReqArgs, UrlMatch};
use crate::error::{CoreError, Result};
use crate::paths::{dirname, join};
use crate::response::PlannerResponse;
use crate::tree::{StructureNode, StructureTree};

/// Resolved parent context for one `plan` invocation (spec §4.5.1): either
/// synthesized for the start response, or copied out of the `RequestUrl`
/// that produced this response.
struct ParentContext {
    url: String,
    file_path: String,
    structure_path: Vec<usize>,
    link_el: LinkEl,
    url_match: Option<UrlMatch>,
}

impl ParentContext {
    fn pre_req(&self) -> PreReqArgs<'_> {
        PreReqArgs {
            url: &self.url,
            link_el: &self.link_el,
            url_match: self.url_match.as_ref(),
        }
    }

    fn kit<'a>(&'a self, res: &'a Document, content_node: &'a [HtmlNode]) -> ParamKit<'a> {
        ParamKit {
            url: &self.url,
            link_el: &self.link_el,
            url_match: self.url_match.as_ref(),
            res,
            content_node,
        }
    }
}

/// The Planner's entry point (spec §4.5).
pub fn plan(tree: &StructureTree, response: &PlannerResponse) -> Result<Vec<Command>> {
    let doc = &response.document;
    let ctx = resolve_parent_context(doc, response.parent_url_info.as_ref())?;
    plan_from_context(tree, doc, &ctx)
}

fn resolve_parent_context(doc: &Document, parent_url_info: Option<&UrlInfo>) -> Result<ParentContext> {
    match parent_url_info {
        None => {
            let title = doc
                .xpath("//title/text()")
                .ok()
                .and_then(|nodes| nodes.first().map(HtmlNode::text_content))
                .unwrap_or_default();
            Ok(ParentContext {
                url: doc.base_url().to_string(),
                file_path: String::new(),
                structure_path: Vec::new(),
                link_el: LinkEl::synthetic(doc.base_url().as_str(), &title),
                url_match: None,
            })
        }
        Some(UrlInfo::RequestUrl {
            url,
            file_path,
            structure_path,
            link_el,
            url_match,
        }) => Ok(ParentContext {
            url: url.clone(),
            file_path: file_path.clone(),
            structure_path: structure_path.clone(),
            link_el: link_el.clone(),
            url_match: url_match.clone(),
        }),
        Some(_) => Err(CoreError::config(
            "parent_url_info passed to plan() must be a RequestUrl",
            "<parent_url_info>",
        )),
    }
}

fn plan_from_context(tree: &StructureTree, doc: &Document, ctx: &ParentContext) -> Result<Vec<Command>> {
    let parent_id = tree.walk(&ctx.structure_path).ok_or_else(|| {
        CoreError::config(
            "structure_path does not resolve to a node",
            format!("{:?}", ctx.structure_path),
        )
    })?;
    let parent = tree.node(parent_id);

    let content_node = content_scope(doc, ctx, parent)?;

    if let Some(assertion) = &parent.assertion {
        let kit = ctx.kit(doc, &content_node);
        assertion.check(doc, &kit, &ctx.structure_path)?;
    }

    let mut parent_file_path = ctx.file_path.clone();
    if let Some(extractor) = &parent.file_path_extractor {
        if extractor.needs_response() {
            let kit = ctx.kit(doc, &content_node);
            parent_file_path = join(&parent_file_path, &extractor.compute_post_request(&kit)?);
        }
    }

    if tree.is_leaf(parent_id) {
        let kit = ctx.kit(doc, &content_node);
        let bytes = match &parent.file_content_extractor {
            Some(extractor) => extractor.extract(doc, &kit)?,
            None => doc.raw_body().to_vec(),
        };
        return Ok(vec![Command::SaveFileContent {
            file_path: parent_file_path,
            file_content: bytes,
        }]);
    }

    let mut commands = Vec::new();
    commands.extend(plan_paging(doc, ctx, parent, &content_node)?);

    let mut any_child_forwarded = false;
    for &child_id in tree.children(parent_id) {
        let child = tree.node(child_id);
        let child_path = {
            let mut p = ctx.structure_path.clone();
            p.push(tree.sibling_index(child_id));
            p
        };

        if child.url_matcher.is_none() || parent.is_root {
            if parent.is_root {
                let accepted = child
                    .url_matcher
                    .as_ref()
                    .is_some_and(|m| m.accepts(&ctx.url));
                if !accepted {
                    continue;
                }
            }
            any_child_forwarded = true;

            let pre_req = ctx.pre_req();
            let mut refined_file_path = parent_file_path.clone();
            if let Some(extractor) = &child.file_path_extractor {
                if let Some(component) = extractor.can_compute_pre_request(&pre_req) {
                    refined_file_path = join(&refined_file_path, &component?);
                }
            }
            let refined_url = match &child.url_converter {
                Some(converter) => converter.convert(&pre_req)?,
                None => ctx.url.clone(),
            };

            let child_ctx = ParentContext {
                url: refined_url,
                file_path: refined_file_path,
                structure_path: child_path,
                link_el: ctx.link_el.clone(),
                url_match: ctx.url_match.clone(),
            };
            commands.extend(plan_from_context(tree, doc, &child_ctx)?);
            continue;
        }

        // Link-driven branch: child.url_matcher is Some and the parent isn't
        // root (root's children are always matched pass-through, above).
        let matcher = child.url_matcher.as_ref().unwrap();
        for (link_el, url) in extract_links(&content_node, doc.base_url()) {
            let url_str = url.as_str();
            if !matcher.accepts(url_str) {
                continue;
            }
            any_child_forwarded = true;
            let url_match = matcher.try_match(url_str);
            let pre_req = PreReqArgs {
                url: url_str,
                link_el: &link_el,
                url_match: url_match.as_ref(),
            };

            let mut file_path = parent_file_path.clone();
            let mut file_path_needs_response = false;
            if let Some(extractor) = &child.file_path_extractor {
                match extractor.can_compute_pre_request(&pre_req) {
                    Some(component) => file_path = join(&file_path, &component?),
                    None => file_path_needs_response = true,
                }
            }

            let converted_url = match &child.url_converter {
                Some(converter) => converter.convert(&pre_req)?,
                None => url_str.to_string(),
            };

            let file_content_needs_response = child
                .file_content_extractor
                .as_ref()
                .map(|e| e.needs_response())
                .unwrap_or(false);

            if tree.is_leaf(child_id) && !file_path_needs_response && !file_content_needs_response {
                if let Some(extractor) = &child.file_content_extractor {
                    if let Some(bytes) = extractor.extract_pre_request(&pre_req) {
                        commands.push(Command::SaveFileContent {
                            file_path,
                            file_content: bytes?,
                        });
                        continue;
                    }
                }
                commands.push(Command::DownloadUrl {
                    url: converted_url,
                    file_path,
                });
            } else {
                commands.push(Command::RequestUrl(UrlInfo::RequestUrl {
                    url: converted_url,
                    file_path,
                    structure_path: {
                        let mut p = ctx.structure_path.clone();
                        p.push(tree.sibling_index(child_id));
                        p
                    },
                    link_el,
                    url_match,
                }));
            }
        }
    }

    if parent.is_root && !any_child_forwarded {
        let sources: Vec<String> = tree
            .children(parent_id)
            .iter()
            .map(|&c| tree.node(c).source.clone())
            .collect();
        return Err(CoreError::config(
            "Start url doesn't match any url matcher",
            sources.join(", "),
        ));
    }

    Ok(commands)
}

fn plan_paging(
    doc: &Document,
    ctx: &ParentContext,
    parent: &StructureNode,
    content_node: &[HtmlNode],
) -> Result<Vec<Command>> {
    if !parent.paging {
        return Ok(Vec::new());
    }
    let Some(matcher) = &parent.url_matcher else {
        return Ok(Vec::new());
    };

    let mut commands = Vec::new();
    for (link_el, url) in extract_links(content_node, doc.base_url()) {
        let url_str = url.as_str();
        if !matcher.accepts(url_str) {
            continue;
        }
        let url_match = matcher.try_match(url_str);
        let pre_req = PreReqArgs {
            url: url_str,
            link_el: &link_el,
            url_match: url_match.as_ref(),
        };

        let converted_url = match &parent.url_converter {
            Some(converter) => converter.convert(&pre_req)?,
            None => url_str.to_string(),
        };

        // Open question (a): a post-request file-path extractor can't
        // resolve here, so the outgoing page request records an empty
        // file_path rather than deferring to the parent's — matching the
        // behavior observed in the reference implementation.
        let file_path = match &parent.file_path_extractor {
            Some(extractor) => match extractor.can_compute_pre_request(&pre_req) {
                Some(component) => join(&dirname(&ctx.file_path), &component?),
                None => String::new(),
            },
            None => dirname(&ctx.file_path),
        };

        commands.push(Command::RequestUrl(UrlInfo::RequestUrl {
            url: converted_url,
            file_path,
            structure_path: ctx.structure_path.clone(),
            link_el,
            url_match,
        }));
    }
    Ok(commands)
}

fn content_scope(doc: &Document, ctx: &ParentContext, parent: &StructureNode) -> Result<Vec<HtmlNode>> {
    match &parent.content_selector {
        Some(selector) => {
            let kit = ctx.kit(doc, &[]);
            selector.select(doc, &kit)
        }
        None => Ok(doc.root().into_iter().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Assertion, FileContentExtractor as FCE, FilePathExtractor as FPE};
    use crate::tree::{build, NodeDef, StructureDefItem};
    use url::Url;

    fn doc(body: &str) -> Document {
        Document::parse(body, Url::parse("http://example.com/").unwrap()).unwrap()
    }

    fn plan_start(tree: &StructureTree, body: &str) -> Result<Vec<Command>> {
        let response = PlannerResponse::new(doc(body), None);
        plan(tree, &response)
    }

    // S1: single-level download.
    #[test]
    fn s1_single_level_download() {
        let items = vec![
            StructureDefItem::Node(NodeDef {
                source: "root".to_string(),
                url_matcher: Some(UrlMatcher::regex(r"http://example\.com/").unwrap()),
                file_path_extractor: Some(FPE::template("foo")),
                ..Default::default()
            }),
            StructureDefItem::Node(NodeDef {
                source: "item".to_string(),
                url_matcher: Some(UrlMatcher::regex(r"http://example\.com/contents/(\w+)").unwrap()),
                file_path_extractor: Some(FPE::template(r"$1.txt")),
                ..Default::default()
            }),
        ];
        let tree = build(items).unwrap();
        let body = r#"<a href="/contents/foo">foo</a><a href="/contents/bar">bar</a>"#;
        let commands = plan_start(&tree, body).unwrap();
        assert_eq!(commands.len(), 2);
        match &commands[0] {
            Command::DownloadUrl { url, file_path } => {
                assert_eq!(url, "http://example.com/contents/foo");
                assert_eq!(file_path, "foo/foo.txt");
            }
            other => panic!("expected DownloadUrl, got {other:?}"),
        }
        match &commands[1] {
            Command::DownloadUrl { url, file_path } => {
                assert_eq!(url, "http://example.com/contents/bar");
                assert_eq!(file_path, "foo/bar.txt");
            }
            other => panic!("expected DownloadUrl, got {other:?}"),
        }
    }

    // S4: branches — only the matching branch contributes commands; the
    // other branch's mismatch does not raise.
    #[test]
    fn s4_only_matching_branch_contributes() {
        let items = vec![StructureDefItem::Branch(vec![
            vec![StructureDefItem::Node(NodeDef {
                source: "no-match".to_string(),
                url_matcher: Some(UrlMatcher::regex(r"http://example\.com/nope").unwrap()),
                file_path_extractor: Some(FPE::template("nope")),
                ..Default::default()
            })],
            vec![StructureDefItem::Node(NodeDef {
                source: "match".to_string(),
                url_matcher: Some(UrlMatcher::regex(r"http://example\.com/").unwrap()),
                file_path_extractor: Some(FPE::template("foo")),
                ..Default::default()
            })],
        ])];
        let tree = build(items).unwrap();
        let body = r#"<a href="/contents/baz">baz</a>"#;
        let commands = plan_start(&tree, body).unwrap();
        // the matching branch is a leaf with no file_content extractor, so
        // the root response body itself is saved rather than the anchor
        // being descended into further.
        assert_eq!(commands.len(), 1);
    }

    // S5: assert failure.
    #[test]
    fn s5_assert_failure_raises() {
        let items = vec![StructureDefItem::Node(NodeDef {
            source: "root".to_string(),
            url_matcher: Some(UrlMatcher::regex(r"http://example\.com/").unwrap()),
            assertion: Some(Assertion::xpath("//a[.='baz']")),
            file_path_extractor: Some(FPE::template("foo")),
            ..Default::default()
        })];
        let tree = build(items).unwrap();
        let body = r#"<a href="/x">not baz</a>"#;
        let err = plan_start(&tree, body).unwrap_err();
        assert!(matches!(err, CoreError::AssertionFailed { .. }));
    }

    // S6: leaf inline content, JSON-encoded.
    #[test]
    fn s6_leaf_inline_content() {
        let items = vec![StructureDefItem::Node(NodeDef {
            source: "root".to_string(),
            url_matcher: Some(UrlMatcher::regex(r"http://example\.com/").unwrap()),
            file_content_extractor: Some(FCE::xpath("//p/text()")),
            file_path_extractor: Some(FPE::template("foo")),
            ..Default::default()
        })];
        let tree = build(items).unwrap();
        let body = "<p>foo</p><p>bar</p>";
        let commands = plan_start(&tree, body).unwrap();
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            Command::SaveFileContent { file_path, file_content } => {
                assert_eq!(file_path, "foo");
                assert_eq!(file_content, br#"["foo","bar"]"#);
            }
            other => panic!("expected SaveFileContent, got {other:?}"),
        }
    }

    #[test]
    fn start_url_mismatch_is_a_config_error() {
        let items = vec![StructureDefItem::Node(NodeDef {
            source: "root".to_string(),
            url_matcher: Some(UrlMatcher::regex(r"http://example\.com/nope").unwrap()),
            file_path_extractor: Some(FPE::template("foo")),
            ..Default::default()
        })];
        let tree = build(items).unwrap();
        let err = plan_start(&tree, "<p></p>").unwrap_err();
        assert!(matches!(err, CoreError::ConfigError { .. }));
    }
}
