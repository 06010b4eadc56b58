//! Site configuration (spec §3.1/§6.1): the compiled, immutable `SiteConfig`,
//! a Rust builder for defining structure trees with closures, and a
//! `serde_yaml`-backed loader for the literal-only subset (SPEC_FULL §10.2).
//!
//! Both paths converge on the same [`crate::tree::build`]: the builder
//! assembles [`StructureDefItem`] values directly, the YAML loader parses a
//! [`SiteConfigFile`] and compiles each entry's literal options into the
//! same compiled component types — a closure is only reachable through the
//! builder.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use url::Url;

use crate::component::Source;
use crate::error::{CoreError, Result};
use crate::schema::{
    Assertion, ContentSelector, FileContentExtractor, FileContentValue, FilePathExtractor,
    ParamKitOwned, PreReqArgsOwned, UrlConverter, UrlMatcher,
};
use crate::tree::{build, NodeDef, StructureDefItem, StructureTree};

#[derive(Debug, Clone)]
pub struct LoginConfig {
    pub url: Url,
    pub formdata: BTreeMap<String, String>,
}

/// A compiled, immutable configuration (spec §3.1). Created once via
/// [`SiteConfig::compile`]; `tree` never mutates afterward.
pub struct SiteConfig {
    pub start_url: Url,
    pub save_dir: String,
    pub login: Option<LoginConfig>,
    pub tree: StructureTree,
}

/// The uncompiled record a caller hands to [`SiteConfig::compile`] — either
/// built in Rust via [`builder`] or loaded from YAML via [`load_yaml`].
pub struct SiteConfigDefinition {
    pub start_url: String,
    pub save_dir: String,
    pub structure: Vec<StructureDefItem>,
    pub login: Option<LoginConfig>,
}

impl SiteConfig {
    pub fn compile(def: SiteConfigDefinition) -> Result<Self> {
        let start_url = Url::parse(&def.start_url)
            .map_err(|e| CoreError::config(format!("invalid start_url: {e}"), def.start_url.clone()))?;
        if def.save_dir.is_empty() {
            return Err(CoreError::config("save_dir must not be empty", def.save_dir));
        }
        let tree = build(def.structure)?;
        Ok(SiteConfig {
            start_url,
            save_dir: def.save_dir,
            login: def.login,
            tree,
        })
    }
}

// ---------------------------------------------------------------------
// Rust builder
// ---------------------------------------------------------------------

/// Starts a structure-node definition. Chain the `with_*` methods to attach
/// compiled components, then push the result into a `Vec<StructureDefItem>`
/// wrapped in `StructureDefItem::Node`.
pub fn node(source: impl Into<String>) -> NodeDef {
    NodeDef {
        source: source.into(),
        ..Default::default()
    }
}

impl NodeDef {
    pub fn with_url_regex(mut self, pattern: &str) -> Result<Self> {
        self.url_matcher = Some(UrlMatcher::regex(pattern)?);
        Ok(self)
    }

    #[track_caller]
    pub fn with_url_fn(mut self, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.url_matcher = Some(UrlMatcher::Custom(Arc::new(f), Source::closure()));
        self
    }

    pub fn with_as_url_template(mut self, template: &str) -> Self {
        self.url_converter = Some(UrlConverter::template(template));
        self
    }

    #[track_caller]
    pub fn with_as_url_fn(
        mut self,
        f: impl Fn(PreReqArgsOwned) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.url_converter = Some(UrlConverter::Custom(Arc::new(f), Source::closure()));
        self
    }

    pub fn with_content_xpath(mut self, expr: &str) -> Self {
        self.content_selector = Some(ContentSelector::xpath(expr));
        self
    }

    #[track_caller]
    pub fn with_content_fn(
        mut self,
        f: impl Fn(ParamKitOwned) -> Vec<siteconf_html::Node> + Send + Sync + 'static,
    ) -> Self {
        self.content_selector = Some(ContentSelector::Custom(Arc::new(f), Source::closure()));
        self
    }

    pub fn with_file_path_template(mut self, template: &str) -> Self {
        self.file_path_extractor = Some(FilePathExtractor::template(template));
        self
    }

    #[track_caller]
    pub fn with_file_path_pre_fn(
        mut self,
        f: impl Fn(PreReqArgsOwned) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.file_path_extractor = Some(FilePathExtractor::PreRequest(Arc::new(f), Source::closure()));
        self
    }

    #[track_caller]
    pub fn with_file_path_post_fn(
        mut self,
        f: impl Fn(ParamKitOwned) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.file_path_extractor = Some(FilePathExtractor::PostRequest(Arc::new(f), Source::closure()));
        self
    }

    pub fn with_file_content_xpath(mut self, expr: &str) -> Self {
        self.file_content_extractor = Some(FileContentExtractor::xpath(expr));
        self
    }

    #[track_caller]
    pub fn with_file_content_pre_fn(
        mut self,
        f: impl Fn(PreReqArgsOwned) -> Option<FileContentValue> + Send + Sync + 'static,
    ) -> Self {
        self.file_content_extractor =
            Some(FileContentExtractor::PreRequest(Arc::new(f), Source::closure()));
        self
    }

    #[track_caller]
    pub fn with_file_content_post_fn(
        mut self,
        f: impl Fn(ParamKitOwned) -> Option<FileContentValue> + Send + Sync + 'static,
    ) -> Self {
        self.file_content_extractor =
            Some(FileContentExtractor::PostRequest(Arc::new(f), Source::closure()));
        self
    }

    pub fn with_assert_xpath(mut self, expr: &str) -> Self {
        self.assertion = Some(Assertion::xpath(expr));
        self
    }

    #[track_caller]
    pub fn with_assert_fn(
        mut self,
        f: impl Fn(ParamKitOwned) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.assertion = Some(Assertion::Custom(Arc::new(f), Source::closure()));
        self
    }

    pub fn paging(mut self, paging: bool) -> Self {
        self.paging = paging;
        self
    }
}

// ---------------------------------------------------------------------
// YAML loading (literal-only)
// ---------------------------------------------------------------------

/// The on-disk shape of a site configuration file (SPEC_FULL §10.2).
#[derive(Debug, Deserialize)]
pub struct SiteConfigFile {
    pub start_url: String,
    pub save_dir: String,
    pub structure: Vec<StructureDefItemYaml>,
    #[serde(default)]
    pub login: Option<LoginConfigYaml>,
}

#[derive(Debug, Deserialize)]
pub struct LoginConfigYaml {
    pub url: String,
    #[serde(default)]
    pub formdata: BTreeMap<String, String>,
}

/// Mirrors [`StructureDefItem`] at the YAML layer: a bare string (shorthand
/// for `{url: "..."}`), a mapping of recognized options, or a list of
/// branches.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StructureDefItemYaml {
    UrlOnly(String),
    Options(StructureOptions),
    Branch(Vec<Vec<StructureDefItemYaml>>),
}

/// Recognized option names (spec §6.1); unknown fields are rejected by
/// `serde`'s `deny_unknown_fields`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructureOptions {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub as_url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub file_content: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub assert: Option<AssertYaml>,
    #[serde(default)]
    pub paging: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AssertYaml {
    Xpath(String),
    All(Vec<AssertYaml>),
}

fn compile_assert(a: &AssertYaml) -> Assertion {
    match a {
        AssertYaml::Xpath(expr) => Assertion::xpath(expr),
        AssertYaml::All(items) => Assertion::All(items.iter().map(compile_assert).collect()),
    }
}

fn compile_options(source: String, opts: StructureOptions) -> Result<NodeDef> {
    let url_matcher = opts.url.as_deref().map(UrlMatcher::regex).transpose()?;
    Ok(NodeDef {
        source,
        url_matcher,
        url_converter: opts.as_url.as_deref().map(UrlConverter::template),
        content_selector: opts.content.as_deref().map(ContentSelector::xpath),
        file_content_extractor: opts.file_content.as_deref().map(FileContentExtractor::xpath),
        file_path_extractor: opts.file_path.as_deref().map(FilePathExtractor::template),
        assertion: opts.assert.as_ref().map(compile_assert),
        paging: opts.paging,
    })
}

fn compile_item(item: StructureDefItemYaml) -> Result<StructureDefItem> {
    match item {
        StructureDefItemYaml::UrlOnly(pattern) => {
            let opts = StructureOptions {
                url: Some(pattern.clone()),
                as_url: None,
                content: None,
                file_content: None,
                file_path: None,
                assert: None,
                paging: false,
            };
            Ok(StructureDefItem::Node(compile_options(pattern, opts)?))
        }
        StructureDefItemYaml::Options(opts) => {
            let source = format!("{opts:?}");
            Ok(StructureDefItem::Node(compile_options(source, opts)?))
        }
        StructureDefItemYaml::Branch(entries) => {
            let compiled = entries
                .into_iter()
                .map(|entry| entry.into_iter().map(compile_item).collect::<Result<Vec<_>>>())
                .collect::<Result<Vec<_>>>()?;
            Ok(StructureDefItem::Branch(compiled))
        }
    }
}

/// Parses and compiles a YAML site configuration document.
pub fn load_yaml(yaml: &str) -> Result<SiteConfigDefinition> {
    let file: SiteConfigFile = serde_yaml::from_str(yaml)
        .map_err(|e| CoreError::config(format!("invalid site configuration YAML: {e}"), yaml.to_string()))?;

    let structure = file
        .structure
        .into_iter()
        .map(compile_item)
        .collect::<Result<Vec<_>>>()?;

    let login = file
        .login
        .map(|l| -> Result<LoginConfig> {
            let url = Url::parse(&l.url)
                .map_err(|e| CoreError::config(format!("invalid login url: {e}"), l.url.clone()))?;
            Ok(LoginConfig {
                url,
                formdata: l.formdata,
            })
        })
        .transpose()?;

    Ok(SiteConfigDefinition {
        start_url: file.start_url,
        save_dir: file.save_dir,
        structure,
        login,
    })
}
