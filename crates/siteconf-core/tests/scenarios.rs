//! End-to-end scenarios against a hand-built `SiteConfig`/`StructureTree`,
//! mirroring the way the reference implementation's own test suite is
//! example-based rather than generative.

use siteconf_core::{build, node, plan, Command, CoreError, PlannerResponse, StructureDefItem, UrlInfo};
use siteconf_html::Document;
use url::Url;

fn doc(body: &str) -> Document {
    Document::parse(body, Url::parse("http://example.com/").unwrap()).unwrap()
}

fn plan_start(
    tree: &siteconf_core::StructureTree,
    body: &str,
) -> Result<Vec<Command>, CoreError> {
    let response = PlannerResponse::new(doc(body), None);
    plan(tree, &response)
}

// S2: URL rewrite via `as_url`.
#[test]
fn s2_as_url_rewrites_download_target() {
    let items = vec![
        StructureDefItem::Node(
            node("root")
                .with_url_regex(r"http://example\.com/")
                .unwrap()
                .with_file_path_template("foo"),
        ),
        StructureDefItem::Node(
            node("item")
                .with_url_regex(r"http://example\.com/contents/(\w+)")
                .unwrap()
                .with_as_url_template(r"http://cdn.example.com/images/$1.jpg")
                .with_file_path_template(r"$1.jpg"),
        ),
    ];
    let tree = build(items).unwrap();
    let body = r#"<a href="/contents/baz">baz</a>"#;
    let commands = plan_start(&tree, body).unwrap();
    assert_eq!(commands.len(), 1);
    match &commands[0] {
        Command::DownloadUrl { url, file_path } => {
            assert_eq!(url, "http://cdn.example.com/images/baz.jpg");
            assert_eq!(file_path, "foo/baz.jpg");
        }
        other => panic!("expected DownloadUrl, got {other:?}"),
    }
}

// S3: paging, pre-request file-path extractor. Paging only ever fires for a
// non-leaf node (spec §4.5.2 step 4 returns before step 5/§4.5.3), so the
// root here chains into a download-producing child rather than being a leaf
// itself.
#[test]
fn s3_paging_pre_request_file_path() {
    let items = vec![
        StructureDefItem::Node(
            node("root")
                .with_url_regex(r"http://example\.com/(\?page=(\d+))?")
                .unwrap()
                .with_file_path_pre_fn(|args| {
                    match args.url_match.as_ref().and_then(|m| m.group(2)) {
                        Some(page) => Some(page),
                        None => Some("1".to_string()),
                    }
                })
                .paging(true),
        ),
        StructureDefItem::Node(
            node("item")
                .with_url_regex(r"http://example\.com/contents/(\w+)")
                .unwrap()
                .with_file_path_template(r"$1"),
        ),
    ];
    let tree = build(items).unwrap();
    let body = r#"
        <a href="/?page=2">next</a>
        <a href="/contents/a">a</a>
        <a href="/contents/b">b</a>
    "#;
    let commands = plan_start(&tree, body).unwrap();

    // Paging's RequestUrl precedes the child-driven downloads (spec §4.5.6).
    assert_eq!(commands.len(), 3);
    match &commands[0] {
        Command::RequestUrl(info) => {
            assert_eq!(info.url(), "http://example.com/?page=2");
            assert_eq!(info.file_path(), "2");
        }
        other => panic!("expected RequestUrl, got {other:?}"),
    }
    match &commands[1] {
        Command::DownloadUrl { url, file_path } => {
            assert_eq!(url, "http://example.com/contents/a");
            assert_eq!(file_path, "1/a");
        }
        other => panic!("expected DownloadUrl, got {other:?}"),
    }
    match &commands[2] {
        Command::DownloadUrl { url, file_path } => {
            assert_eq!(url, "http://example.com/contents/b");
            assert_eq!(file_path, "1/b");
        }
        other => panic!("expected DownloadUrl, got {other:?}"),
    }
}

// Invariant 3: a `RequestUrl`'s `structure_path` resolves back to the node
// that produced it, with length equal to its depth (root excluded).
// Invariant 8: that `RequestUrl`'s `file_path` is a prefix of every
// descendant `file_path` produced by planning the subtree rooted at it.
#[test]
fn s3_request_url_structure_path_resolves_and_file_path_prefixes_descendants() {
    let items = vec![
        StructureDefItem::Node(
            node("root")
                .with_url_regex(r"http://example\.com/(\?page=(\d+))?")
                .unwrap()
                .with_file_path_pre_fn(|args| {
                    match args.url_match.as_ref().and_then(|m| m.group(2)) {
                        Some(page) => Some(page),
                        None => Some("1".to_string()),
                    }
                })
                .paging(true),
        ),
        StructureDefItem::Node(
            node("item")
                .with_url_regex(r"http://example\.com/contents/(\w+)")
                .unwrap()
                .with_file_path_template(r"$1"),
        ),
    ];
    let tree = build(items).unwrap();

    let first_page = r#"<a href="/?page=2">next</a>"#;
    let commands = plan_start(&tree, first_page).unwrap();
    assert_eq!(commands.len(), 1);
    let paging_request = match &commands[0] {
        Command::RequestUrl(info) => info.clone(),
        other => panic!("expected RequestUrl, got {other:?}"),
    };

    let structure_path = match &paging_request {
        UrlInfo::RequestUrl { structure_path, .. } => structure_path.clone(),
        _ => unreachable!(),
    };
    // depth 1 (root excluded): "root" is the sole child of the tree's
    // synthesized root.
    assert_eq!(structure_path, vec![0]);
    let resolved = tree.walk(&structure_path).unwrap();
    assert_eq!(tree.node(resolved).source, "root");

    // Plan the subtree rooted at the paging RequestUrl: its own file_path
    // ("2") must prefix every descendant file_path produced from it.
    let second_page_body = r#"<a href="/contents/c">c</a>"#;
    let response = PlannerResponse::new(doc(second_page_body), Some(paging_request.clone()));
    let descendants = plan(&tree, &response).unwrap();
    assert_eq!(descendants.len(), 1);
    match &descendants[0] {
        Command::DownloadUrl { file_path, .. } => {
            assert!(
                file_path.starts_with(paging_request.file_path()),
                "{file_path:?} does not start with parent file_path {:?}",
                paging_request.file_path()
            );
            assert_eq!(file_path, "2/c");
        }
        other => panic!("expected DownloadUrl, got {other:?}"),
    }
}

// Invariant 1: the synthesized tree root is unmatched and marked as root.
#[test]
fn invariant_root_is_unmatched() {
    let tree = build(vec![StructureDefItem::Node(
        node("a").with_url_regex(r"http://example\.com/").unwrap(),
    )])
    .unwrap();
    let root = tree.node(tree.root_id());
    assert!(root.is_root);
    assert!(root.url_matcher.is_none());
}

// Invariant 2: a node with a `file_content` extractor must be a leaf;
// rejected at build time otherwise.
#[test]
fn invariant_file_content_requires_leaf() {
    let items = vec![
        StructureDefItem::Node(
            node("a")
                .with_url_regex(r"http://example\.com/")
                .unwrap()
                .with_file_content_xpath("//p/text()"),
        ),
        StructureDefItem::Node(node("b").with_url_regex(r"http://example\.com/x").unwrap()),
    ];
    let err = build(items).unwrap_err();
    assert!(matches!(err, CoreError::ConfigError { .. }));
}

// Invariant 4: a leaf with no response-dependent extractors yields
// `DownloadUrl`, never `RequestUrl`.
#[test]
fn invariant_leaf_without_response_dependency_downloads() {
    let items = vec![
        StructureDefItem::Node(
            node("root")
                .with_url_regex(r"http://example\.com/")
                .unwrap()
                .with_file_path_template("foo"),
        ),
        StructureDefItem::Node(
            node("item")
                .with_url_regex(r"http://example\.com/contents/(\w+)")
                .unwrap()
                .with_file_path_template(r"$1.txt"),
        ),
    ];
    let tree = build(items).unwrap();
    let commands = plan_start(&tree, r#"<a href="/contents/x">x</a>"#).unwrap();
    assert_eq!(commands.len(), 1);
    assert!(matches!(commands[0], Command::DownloadUrl { .. }));
}

// Invariant 5: a start URL matching no root child's matcher is a
// `ConfigError`, not a silently empty command list.
#[test]
fn invariant_start_url_mismatch_is_config_error() {
    let tree = build(vec![StructureDefItem::Node(
        node("a").with_url_regex(r"http://example\.com/nope").unwrap(),
    )])
    .unwrap();
    let err = plan_start(&tree, "<p></p>").unwrap_err();
    assert!(matches!(err, CoreError::ConfigError { .. }));
}

// Law 7: the Planner is a pure function of its inputs.
#[test]
fn idempotence_same_inputs_same_commands() {
    let items = vec![
        StructureDefItem::Node(
            node("root")
                .with_url_regex(r"http://example\.com/")
                .unwrap()
                .with_file_path_template("foo"),
        ),
        StructureDefItem::Node(
            node("item")
                .with_url_regex(r"http://example\.com/contents/(\w+)")
                .unwrap()
                .with_file_path_template(r"$1.txt"),
        ),
    ];
    let tree = build(items).unwrap();
    let body = r#"<a href="/contents/foo">foo</a>"#;
    let first = plan_start(&tree, body).unwrap();
    let second = plan_start(&tree, body).unwrap();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(format!("{a:?}"), format!("{b:?}"));
    }
}
