use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,

    #[serde(default = "default_on_dl_error")]
    pub on_dl_error: OnError,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: String::from("siteconf-bot"),
            concurrent_downloads: 16,
            on_dl_error: OnError::SkipAndLog,
        }
    }
}

fn default_user_agent() -> String {
    CrawlerConfig::default().user_agent
}

fn default_concurrent_downloads() -> usize {
    CrawlerConfig::default().concurrent_downloads
}

fn default_on_dl_error() -> OnError {
    CrawlerConfig::default().on_dl_error
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OnError {
    Fail,
    SkipAndLog,
}
