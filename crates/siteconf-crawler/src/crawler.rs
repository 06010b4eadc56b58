use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::header::USER_AGENT;
use siteconf_core::{plan, Command, PlannerResponse, SiteConfig, UrlInfo};
use siteconf_html::Document;
use tokio::sync::Semaphore;

use crate::config::{CrawlerConfig, OnError};
use crate::writer::Writer;

/// A unit of pending work for the fetch queue (spec §4.7): either the seed
/// request, a follow-up carrying the parent `UrlInfo` the Planner asked for,
/// or a plain byte download.
enum Fetch {
    Start,
    Follow(UrlInfo),
    Download { url: String, file_path: String },
}

/// The Spider Facade (spec §4.7) plus its fetch engine: holds the compiled
/// config, drives an async crawl loop the way the teacher's `crawl_site`
/// drives its sitemap crawl, and translates `Command`s into follow-up
/// requests or `Writer` calls.
pub struct SiteCrawler<W> {
    config: Arc<SiteConfig>,
    crawler_conf: CrawlerConfig,
    writer: Arc<W>,
    http: reqwest::Client,
}

impl<W> Clone for SiteCrawler<W> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            crawler_conf: self.crawler_conf.clone(),
            writer: self.writer.clone(),
            http: self.http.clone(),
        }
    }
}

impl<W: Writer + 'static> SiteCrawler<W> {
    pub fn new(config: SiteConfig, crawler_conf: CrawlerConfig, writer: W) -> Result<Self> {
        let http = reqwest::Client::builder()
            .gzip(true)
            .deflate(true)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            config: Arc::new(config),
            crawler_conf,
            writer: Arc::new(writer),
            http,
        })
    }

    /// Runs the crawl to completion: seeds the start URL (after an optional
    /// login step), drives every follow-up `RequestUrl`/`DownloadUrl` the
    /// Planner emits, and returns once the fetch queue is drained.
    pub async fn run(self) -> Result<()> {
        if let Some(login) = &self.config.login {
            log::info!("logging in at {}", login.url);
            self.http
                .post(login.url.clone())
                .header(USER_AGENT, &self.crawler_conf.user_agent)
                .form(&login.formdata)
                .send()
                .await
                .context("login request failed")?
                .error_for_status()
                .context("login request rejected")?;
        }

        log::info!("starting crawl at {}", self.config.start_url);

        let semaphore = Arc::new(Semaphore::new(self.crawler_conf.concurrent_downloads.max(1)));
        let mut pending = FuturesUnordered::new();
        pending.push(self.clone().dispatch(Fetch::Start, semaphore.clone()));

        while let Some(outcome) = pending.next().await {
            match outcome {
                Ok(next) => {
                    for fetch in next {
                        pending.push(self.clone().dispatch(fetch, semaphore.clone()));
                    }
                }
                Err(e) => match self.crawler_conf.on_dl_error {
                    OnError::Fail => return Err(e),
                    OnError::SkipAndLog => log::warn!("skipping: {e:#}"),
                },
            }
        }

        log::info!("crawl complete");
        Ok(())
    }

    async fn dispatch(self, fetch: Fetch, semaphore: Arc<Semaphore>) -> Result<Vec<Fetch>> {
        let _permit = semaphore
            .acquire_owned()
            .await
            .expect("semaphore is never closed");
        match fetch {
            Fetch::Start => self.visit(self.config.start_url.to_string(), None).await,
            Fetch::Follow(info) => {
                let url = info.url().to_string();
                self.visit(url, Some(info)).await
            }
            Fetch::Download { url, file_path } => self.download(url, file_path).await,
        }
    }

    async fn visit(&self, url: String, parent_url_info: Option<UrlInfo>) -> Result<Vec<Fetch>> {
        log::debug!("fetching {url}");
        let resp = self
            .http
            .get(&url)
            .header(USER_AGENT, &self.crawler_conf.user_agent)
            .send()
            .await
            .with_context(|| format!("fetching {url}"))?
            .error_for_status()
            .with_context(|| format!("fetching {url}"))?;

        let base = reqwest::Url::parse(resp.url().as_str())?;
        let body = resp.text().await.with_context(|| format!("reading {url}"))?;

        let config = self.config.clone();
        let writer = self.writer.clone();

        let fetches = tokio::task::spawn_blocking(move || -> Result<Vec<Fetch>> {
            let document = Document::parse(&body, base)?;
            let response = PlannerResponse::new(document, parent_url_info);
            let commands = plan(&config.tree, &response)?;
            log::debug!("plan produced {} commands for {url}", commands.len());

            let mut fetches = Vec::new();
            for command in commands {
                match command {
                    Command::RequestUrl(info) => fetches.push(Fetch::Follow(info)),
                    Command::DownloadUrl { url, file_path } => {
                        fetches.push(Fetch::Download { url, file_path })
                    }
                    Command::SaveFileContent {
                        file_path,
                        file_content,
                    } => {
                        let path = full_path(&config.save_dir, &file_path);
                        writer.write(&path, &file_content)?;
                    }
                }
            }
            Ok(fetches)
        })
        .await??;

        Ok(fetches)
    }

    async fn download(&self, url: String, file_path: String) -> Result<Vec<Fetch>> {
        log::debug!("downloading {url} -> {file_path}");
        let bytes = self
            .http
            .get(&url)
            .header(USER_AGENT, &self.crawler_conf.user_agent)
            .send()
            .await
            .with_context(|| format!("downloading {url}"))?
            .error_for_status()
            .with_context(|| format!("downloading {url}"))?
            .bytes()
            .await
            .with_context(|| format!("reading {url}"))?;

        let path = full_path(&self.config.save_dir, &file_path);
        let writer = self.writer.clone();
        tokio::task::spawn_blocking(move || writer.write(&path, &bytes)).await??;
        Ok(Vec::new())
    }
}

fn full_path(save_dir: &str, file_path: &str) -> PathBuf {
    Path::new(save_dir).join(file_path)
}
