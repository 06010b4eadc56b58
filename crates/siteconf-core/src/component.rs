//! The callable-adapter machinery (spec §3.3/§4.1) and the argument-name
//! protocol (spec §6.2), reimplemented without runtime signature
//! introspection.
//!
//! Rust closures don't carry inspectable parameter names, so `accepted_names`
//! isn't discovered from a closure's source the way the original did with
//! `inspect.signature`. Instead, each option slot exposes a handful of
//! narrowly-typed constructors — one per permitted argument subset — and a
//! compiled component records *which* constructor built it. Calling the
//! "wrong" constructor for a closure (one that would need an argument outside
//! the slot's permitted subset) is a type error at the call site, not a
//! validation failure discovered later: the equivalent of "a component
//! declaring a required parameter outside its permitted subset fails
//! validation" (spec invariant 6) is enforced by the Rust type system instead
//! of at runtime.

use std::sync::Arc;

use regex::Regex;

use siteconf_html::{Document, LinkEl, Node as HtmlNode};

/// An owned regex match: the pattern and the string it matched, not a
/// borrowed `regex::Captures`. Cheap to clone (`Regex` is internally
/// reference-counted) and free of lifetime entanglement with whatever
/// produced the original match, so it can ride along on a `RequestUrl` across
/// an async boundary (spec §9 design note on regex matches crossing call
/// boundaries).
#[derive(Debug, Clone)]
pub struct UrlMatch {
    regex: Regex,
    input: String,
}

impl UrlMatch {
    pub fn new(regex: Regex, input: impl Into<String>) -> Self {
        UrlMatch {
            regex,
            input: input.into(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// The whole match (group 0).
    pub fn whole(&self) -> String {
        self.regex
            .captures(&self.input)
            .and_then(|c| c.get(0))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn group(&self, i: usize) -> Option<String> {
        self.regex
            .captures(&self.input)
            .and_then(|c| c.get(i))
            .map(|m| m.as_str().to_string())
    }

    /// Expands a `\g<1>`/`\1`/`$1`-style template against this match,
    /// re-running the regex against the retained input rather than storing
    /// captures.
    ///
    /// Configs copy the `\g<name>`/`\N` backreference syntax verbatim
    /// (that's what the spec's own worked examples use); the `regex` crate's
    /// `Captures::expand` only understands `$name`/`${name}`, so backslash
    /// references are translated into `$`-syntax first. Any literal `$` in
    /// the template is escaped as `$$` so it survives untouched.
    pub fn expand(&self, template: &str) -> Option<String> {
        let caps = self.regex.captures(&self.input)?;
        let mut dst = String::new();
        caps.expand(&translate_backrefs(template), &mut dst);
        Some(dst)
    }
}

/// Translates Python `re.sub`-style backreferences (`\1`, `\g<1>`, `\g<name>`)
/// into the `regex` crate's `${name}` syntax, escaping any literal `$` along
/// the way.
fn translate_backrefs(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some('g') => {
                    chars.next();
                    if chars.peek() == Some(&'<') {
                        chars.next();
                        let mut name = String::new();
                        for c2 in chars.by_ref() {
                            if c2 == '>' {
                                break;
                            }
                            name.push(c2);
                        }
                        out.push_str("${");
                        out.push_str(&name);
                        out.push('}');
                    } else {
                        out.push_str("\\g");
                    }
                }
                Some(d) if d.is_ascii_digit() => {
                    let mut num = String::new();
                    while let Some(&d2) = chars.peek() {
                        if d2.is_ascii_digit() {
                            num.push(d2);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push_str("${");
                    out.push_str(&num);
                    out.push('}');
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}


/// Where a compiled component's behavior came from, kept only for
/// diagnostics (`RuntimeComponentError`/`ConfigError` messages).
#[derive(Debug, Clone)]
pub enum Source {
    /// A literal string or regex from the structure definition; reproduced
    /// verbatim.
    Literal(String),
    /// A user-supplied closure. Rust has no source-text reflection, so the
    /// call site that registered the closure is used instead.
    Closure(&'static std::panic::Location<'static>),
}

impl Source {
    pub fn describe(&self) -> String {
        match self {
            Source::Literal(s) => s.clone(),
            Source::Closure(loc) => format!("<closure at {loc}>"),
        }
    }

    #[track_caller]
    pub fn closure() -> Self {
        Source::Closure(std::panic::Location::caller())
    }
}

/// The pre-request argument subset: everything `url`/`as_url`/`file_path`
/// callables may see before a response exists (spec §6.2, `url`/`link_el`/
/// `url_match` rows).
pub struct PreReqArgs<'a> {
    pub url: &'a str,
    pub link_el: &'a LinkEl,
    pub url_match: Option<&'a UrlMatch>,
}

/// The full argument kit, available once a response exists: adds `res` and
/// `content_node` (spec §6.2).
pub struct ParamKit<'a> {
    pub url: &'a str,
    pub link_el: &'a LinkEl,
    pub url_match: Option<&'a UrlMatch>,
    pub res: &'a Document,
    pub content_node: &'a [HtmlNode],
}

impl<'a> ParamKit<'a> {
    pub fn pre_req(&self) -> PreReqArgs<'a> {
        PreReqArgs {
            url: self.url,
            link_el: self.link_el,
            url_match: self.url_match,
        }
    }
}

/// A closure's return value, treated as a `ConfigError`-worthy omission when
/// `None` (spec §3.3: "a `null` return from a component is a configuration
/// error").
pub fn require<T>(value: Option<T>, source: &Source) -> crate::error::Result<T> {
    value.ok_or_else(|| crate::error::CoreError::runtime(source.describe(), "returned null"))
}

pub type BoxedFn<Args, Out> = Arc<dyn Fn(Args) -> Out + Send + Sync>;
