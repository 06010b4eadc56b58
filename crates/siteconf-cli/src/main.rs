use std::fs;
use std::path::PathBuf;

use clap::Parser;
use siteconf_core::{simulate, SiteConfig};
use siteconf_crawler::{CrawlerConfig, FsWriter, SiteCrawler};

/// Drive a site-configuration crawl, or dry-run a URL against it
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    /// Run a crawl to completion
    Crawl(CrawlArgs),
    /// Report every structure path a URL would match, without fetching
    Simulate(SimulateArgs),
}

/// Run a crawl to completion
#[derive(Debug, clap::Args)]
pub struct CrawlArgs {
    /// Path to the site configuration YAML file
    #[arg(long, short)]
    pub config: PathBuf,
    /// Override crawler's user agent
    #[arg(long)]
    pub user_agent: Option<String>,
    /// Override crawler's maximum concurrent requests
    #[arg(long)]
    pub concurrent_downloads: Option<usize>,
    /// Optional crawler tuning overrides file
    #[arg(long, env = "SITECONF_CRAWLER_CONFIG")]
    pub crawler_config: Option<PathBuf>,
}

impl TryFrom<&CrawlArgs> for CrawlerConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CrawlArgs) -> Result<Self, Self::Error> {
        let mut conf = match &args.crawler_config {
            Some(path) => serde_yaml::from_str(&fs::read_to_string(path)?)?,
            None => CrawlerConfig::default(),
        };
        if let Some(user_agent) = &args.user_agent {
            conf.user_agent = user_agent.clone();
        }
        if let Some(n) = args.concurrent_downloads {
            conf.concurrent_downloads = n;
        }
        Ok(conf)
    }
}

/// Report every structure path a URL would match, without fetching
#[derive(Debug, clap::Args)]
pub struct SimulateArgs {
    /// Path to the site configuration YAML file
    #[arg(long, short)]
    pub config: PathBuf,
    /// The URL to test
    pub url: String,
}

fn load_config(path: &PathBuf) -> anyhow::Result<SiteConfig> {
    let yaml = fs::read_to_string(path)?;
    let def = siteconf_core::load_yaml(&yaml)?;
    Ok(SiteConfig::compile(def)?)
}

fn crawl(args: CrawlArgs) -> anyhow::Result<()> {
    let crawler_conf = (&args).try_into()?;
    let config = load_config(&args.config)?;
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(SiteCrawler::new(config, crawler_conf, FsWriter)?.run())
}

fn simulate_cmd(args: SimulateArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config)?;
    let hits = simulate(&config.tree, &args.url);
    if hits.is_empty() {
        println!("no structure path matches {}", args.url);
    }
    for hit in hits {
        println!("{:?} -> {}", hit.structure_path, hit.file_path);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    match args.cmd {
        SubCommand::Crawl(args) => crawl(args),
        SubCommand::Simulate(args) => simulate_cmd(args),
    }
}
