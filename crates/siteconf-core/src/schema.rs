//! Option Schemas (spec §4.2): compiling each recognized structure-node
//! option into a typed, closed-sum component.
//!
//! Each option gets its own narrow enum rather than a shared
//! `CallableAdapter<T>` base, per the "mixed callable types: model components
//! as a closed sum over return contracts rather than a common base" design
//! note — the planner dispatches on the enum, nothing dispatches by
//! inheritance.

use std::sync::Arc;

use regex::Regex;

use siteconf_html::{Document, LinkEl, Node as HtmlNode};

use crate::component::{BoxedFn, ParamKit, PreReqArgs, Source, UrlMatch};
use crate::error::{CoreError, Result};

/// `url` (spec §4.2 row 1): literal regex (full-match) or a predicate over
/// the candidate URL string alone.
#[derive(Clone)]
pub enum UrlMatcher {
    Regex(Regex, Source),
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>, Source),
}

impl UrlMatcher {
    pub fn regex(pattern: &str) -> Result<Self> {
        let re = compile_regex(pattern)?;
        Ok(UrlMatcher::Regex(re, Source::Literal(pattern.to_string())))
    }

    pub fn source(&self) -> &Source {
        match self {
            UrlMatcher::Regex(_, s) | UrlMatcher::Custom(_, s) => s,
        }
    }

    /// Fullmatches `url`, returning the owned match on success. A functional
    /// matcher never produces a match object (spec §3.4: "`url_match`:
    /// optional regex-match ... null if the matcher was functional").
    pub fn try_match(&self, url: &str) -> Option<UrlMatch> {
        match self {
            UrlMatcher::Regex(re, _) => fullmatch(re, url).map(|_| UrlMatch::new(re.clone(), url)),
            UrlMatcher::Custom(_, _) => None,
        }
    }

    /// Whether the URL is accepted at all, independent of whether a regex
    /// match object is produced. The planner uses this to decide routing;
    /// [`Self::try_match`] additionally hands back the match when there is one.
    pub fn accepts(&self, url: &str) -> bool {
        match self {
            UrlMatcher::Regex(re, _) => fullmatch(re, url).is_some(),
            UrlMatcher::Custom(f, _) => f(url),
        }
    }
}

fn fullmatch<'t>(re: &Regex, text: &'t str) -> Option<regex::Match<'t>> {
    re.find(text)
        .filter(|m| m.start() == 0 && m.end() == text.len())
}

fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        CoreError::config(
            format!("invalid regex: {e}"),
            pattern.to_string(),
        )
    })
}

/// `as_url` (spec §4.2 row 2): a regex-expansion template or a closure over
/// the pre-request argument subset.
#[derive(Clone)]
pub enum UrlConverter {
    Template(String, Source),
    Custom(BoxedFn<PreReqArgsOwned, Option<String>>, Source),
}

/// An owned copy of [`PreReqArgs`] so it can cross the `Arc<dyn Fn>`
/// boundary without borrowing from the caller's stack frame.
#[derive(Clone)]
pub struct PreReqArgsOwned {
    pub url: String,
    pub link_el: LinkEl,
    pub url_match: Option<UrlMatch>,
}

impl<'a> From<&PreReqArgs<'a>> for PreReqArgsOwned {
    fn from(a: &PreReqArgs<'a>) -> Self {
        PreReqArgsOwned {
            url: a.url.to_string(),
            link_el: a.link_el.clone(),
            url_match: a.url_match.cloned(),
        }
    }
}

impl UrlConverter {
    pub fn template(template: &str) -> Self {
        UrlConverter::Template(template.to_string(), Source::Literal(template.to_string()))
    }

    pub fn source(&self) -> &Source {
        match self {
            UrlConverter::Template(_, s) | UrlConverter::Custom(_, s) => s,
        }
    }

    pub fn convert(&self, args: &PreReqArgs<'_>) -> Result<String> {
        match self {
            UrlConverter::Template(tpl, _) => Ok(args
                .url_match
                .and_then(|m| m.expand(tpl))
                .unwrap_or_else(|| tpl.clone())),
            UrlConverter::Custom(f, source) => {
                let out = f(PreReqArgsOwned::from(args));
                crate::component::require(out, source)
            }
        }
    }
}

/// `content` (spec §4.2 row 3): an XPath expression scoping subsequent
/// extraction, or a closure returning a selector-list. Always evaluated
/// against an actual response.
#[derive(Clone)]
pub enum ContentSelector {
    Xpath(String, Source),
    Custom(BoxedFn<ParamKitOwned, Vec<HtmlNode>>, Source),
}

/// An owned copy of the argument kit once a response is available. `res` and
/// `content_node` can't be meaningfully owned across a closure boundary
/// (they borrow from the response document), so they're passed by reference
/// inside a short-lived wrapper instead of being cloned.
pub struct ParamKitOwned {
    pub url: String,
    pub link_el: LinkEl,
    pub url_match: Option<UrlMatch>,
}

impl<'a> From<&ParamKit<'a>> for ParamKitOwned {
    fn from(k: &ParamKit<'a>) -> Self {
        ParamKitOwned {
            url: k.url.to_string(),
            link_el: k.link_el.clone(),
            url_match: k.url_match.cloned(),
        }
    }
}

impl ContentSelector {
    pub fn xpath(expr: &str) -> Self {
        ContentSelector::Xpath(expr.to_string(), Source::Literal(expr.to_string()))
    }

    pub fn source(&self) -> &Source {
        match self {
            ContentSelector::Xpath(_, s) | ContentSelector::Custom(_, s) => s,
        }
    }

    pub fn select(&self, res: &Document, kit: &ParamKit<'_>) -> Result<Vec<HtmlNode>> {
        match self {
            ContentSelector::Xpath(expr, source) => res.xpath(expr).map_err(|e| {
                CoreError::runtime(source.describe(), e.to_string())
            }),
            ContentSelector::Custom(f, _source) => Ok(f(ParamKitOwned::from(kit))),
        }
    }
}

/// `file_content` (spec §4.2 row 4): XPath over the content subtree (results
/// JSON-encoded), or a closure. Leaf-only (enforced by [`crate::tree::check`]).
///
/// Mirrors [`FilePathExtractor`]'s pre/post split: a closure that only reads
/// `url`/`link_el`/`url_match` can resolve its content before any request is
/// even made, which is what lets the planner shortcut straight to
/// `SaveFileContent` instead of queuing a `RequestUrl` (spec §4.5.4).
#[derive(Clone)]
pub enum FileContentExtractor {
    Xpath(String, Source),
    PreRequest(BoxedFn<PreReqArgsOwned, Option<FileContentValue>>, Source),
    PostRequest(BoxedFn<ParamKitOwned, Option<FileContentValue>>, Source),
}

#[derive(Debug, Clone)]
pub enum FileContentValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl FileContentValue {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            FileContentValue::Text(s) => s.into_bytes(),
            FileContentValue::Bytes(b) => b,
        }
    }
}

impl FileContentExtractor {
    pub fn xpath(expr: &str) -> Self {
        FileContentExtractor::Xpath(expr.to_string(), Source::Literal(expr.to_string()))
    }

    pub fn source(&self) -> &Source {
        match self {
            FileContentExtractor::Xpath(_, s)
            | FileContentExtractor::PreRequest(_, s)
            | FileContentExtractor::PostRequest(_, s) => s,
        }
    }

    pub fn needs_response(&self) -> bool {
        !matches!(self, FileContentExtractor::PreRequest(_, _))
    }

    /// Resolves file content without a response, when possible — the
    /// planner's leaf shortcut (spec §4.5.4: "can produce file content
    /// pre-request").
    pub fn extract_pre_request(&self, args: &PreReqArgs<'_>) -> Option<Result<Vec<u8>>> {
        match self {
            FileContentExtractor::PreRequest(f, source) => {
                let out = f(PreReqArgsOwned::from(args));
                Some(crate::component::require(out, source).map(FileContentValue::into_bytes))
            }
            FileContentExtractor::Xpath(_, _) | FileContentExtractor::PostRequest(_, _) => None,
        }
    }

    /// Resolves file content once a response exists (spec §4.5.2 step 4).
    pub fn extract(&self, res: &Document, kit: &ParamKit<'_>) -> Result<Vec<u8>> {
        match self {
            FileContentExtractor::Xpath(expr, source) => {
                let nodes = res
                    .xpath_scoped(expr, Some(kit.content_node))
                    .map_err(|e| CoreError::runtime(source.describe(), e.to_string()))?;
                let texts: Vec<String> = nodes.iter().map(|n| n.text_content()).collect();
                let json = serde_json::to_string(&texts).map_err(|e| {
                    CoreError::runtime(source.describe(), format!("JSON encoding failed: {e}"))
                })?;
                Ok(json.into_bytes())
            }
            FileContentExtractor::PreRequest(f, source) => {
                let out = f(PreReqArgsOwned::from(&kit.pre_req()));
                Ok(crate::component::require(out, source)?.into_bytes())
            }
            FileContentExtractor::PostRequest(f, source) => {
                let out = f(ParamKitOwned::from(kit));
                Ok(crate::component::require(out, source)?.into_bytes())
            }
        }
    }
}

/// `file_path` (spec §4.2 row 5): the one option whose "needs response" split
/// actually changes planner control flow (spec §4.5.3/§4.5.4).
#[derive(Clone)]
pub enum FilePathExtractor {
    Template(String, Source),
    PreRequest(BoxedFn<PreReqArgsOwned, Option<String>>, Source),
    PostRequest(BoxedFn<ParamKitOwned, Option<String>>, Source),
}

impl FilePathExtractor {
    pub fn template(template: &str) -> Self {
        FilePathExtractor::Template(template.to_string(), Source::Literal(template.to_string()))
    }

    pub fn source(&self) -> &Source {
        match self {
            FilePathExtractor::Template(_, s)
            | FilePathExtractor::PreRequest(_, s)
            | FilePathExtractor::PostRequest(_, s) => s,
        }
    }

    pub fn needs_response(&self) -> bool {
        matches!(self, FilePathExtractor::PostRequest(_, _))
    }

    pub fn can_compute_pre_request(&self, args: &PreReqArgs<'_>) -> Option<Result<String>> {
        match self {
            FilePathExtractor::Template(tpl, _) => Some(Ok(args
                .url_match
                .and_then(|m| m.expand(tpl))
                .unwrap_or_else(|| tpl.clone()))),
            FilePathExtractor::PreRequest(f, source) => {
                let out = f(PreReqArgsOwned::from(args));
                Some(crate::component::require(out, source))
            }
            FilePathExtractor::PostRequest(_, _) => None,
        }
    }

    pub fn compute_post_request(&self, kit: &ParamKit<'_>) -> Result<String> {
        match self {
            FilePathExtractor::Template(tpl, _) => Ok(kit
                .url_match
                .and_then(|m| m.expand(tpl))
                .unwrap_or_else(|| tpl.clone())),
            FilePathExtractor::PreRequest(f, source) => {
                let out = f(PreReqArgsOwned::from(&kit.pre_req()));
                crate::component::require(out, source)
            }
            FilePathExtractor::PostRequest(f, source) => {
                let out = f(ParamKitOwned::from(kit));
                crate::component::require(out, source)
            }
        }
    }

    /// The simulator's own file-path contribution rule (spec §4.6): verbatim
    /// template, synthetic pre-request invocation, or `"__unknown__"`.
    pub fn simulate(&self, args: &PreReqArgs<'_>) -> String {
        match self {
            FilePathExtractor::Template(tpl, _) => tpl.clone(),
            FilePathExtractor::PreRequest(f, _) => {
                f(PreReqArgsOwned::from(args)).unwrap_or_else(|| "__unknown__".to_string())
            }
            FilePathExtractor::PostRequest(_, _) => "__unknown__".to_string(),
        }
    }
}

/// `assert` (spec §4.2 row 6): one XPath boolean assertion, a list of
/// sub-matchers (all must pass), or a closure.
#[derive(Clone)]
pub enum Assertion {
    Xpath(String, Source),
    All(Vec<Assertion>),
    Custom(BoxedFn<ParamKitOwned, bool>, Source),
}

impl Assertion {
    pub fn xpath(expr: &str) -> Self {
        Assertion::Xpath(expr.to_string(), Source::Literal(expr.to_string()))
    }

    /// Evaluates the assertion, returning `Ok(())` or `Err(AssertionFailed)`.
    /// A raised component error and an explicit falsy return are both
    /// treated as assertion failure (spec §9 open question (b)).
    pub fn check(&self, res: &Document, kit: &ParamKit<'_>, structure_path: &[usize]) -> Result<()> {
        let ok = match self {
            Assertion::Xpath(expr, source) => res.xpath_bool(expr).map_err(|e| {
                CoreError::runtime(source.describe(), e.to_string())
            })?,
            Assertion::All(subs) => {
                for sub in subs {
                    sub.check(res, kit, structure_path)?;
                }
                true
            }
            Assertion::Custom(f, _source) => f(ParamKitOwned::from(kit)),
        };
        if ok {
            Ok(())
        } else {
            Err(CoreError::assertion_failed(
                "assert returned false",
                structure_path.to_vec(),
            ))
        }
    }
}
