//! A minimal, real async crawl loop driving the site-configuration evaluator
//! (SPEC_FULL §10.6): seeds the start URL, feeds fetched pages into
//! [`siteconf_core::plan`], and dispatches the resulting commands either
//! back into the fetch queue or to a [`Writer`].

mod config;
mod crawler;
mod writer;

pub use config::{CrawlerConfig, OnError};
pub use crawler::SiteCrawler;
pub use writer::{FsWriter, Writer};

pub use anyhow;
