//! UrlInfo and Command (spec §3.4/§3.5): the Planner's state bundle and its
//! output payloads.

use siteconf_html::LinkEl;

use crate::component::UrlMatch;

/// The Planner's state bundle, carried across fetches (spec §3.4). Every
/// variant carries `url` and `file_path`; `RequestUrl` additionally carries
/// what's needed to resume traversal on the response it requested.
#[derive(Debug, Clone)]
pub enum UrlInfo {
    /// Passed back to the Planner as `parent_url_info` once its response
    /// arrives.
    RequestUrl {
        url: String,
        file_path: String,
        structure_path: Vec<usize>,
        link_el: LinkEl,
        url_match: Option<UrlMatch>,
    },
    /// Asks the fetch engine to retrieve `url` and persist the body verbatim
    /// to `file_path`.
    DownloadUrl { url: String, file_path: String },
    /// Already-extracted content, persisted without an extra request.
    SaveFileContent {
        url: String,
        file_path: String,
        file_content: Vec<u8>,
    },
}

impl UrlInfo {
    pub fn url(&self) -> &str {
        match self {
            UrlInfo::RequestUrl { url, .. }
            | UrlInfo::DownloadUrl { url, .. }
            | UrlInfo::SaveFileContent { url, .. } => url,
        }
    }

    pub fn file_path(&self) -> &str {
        match self {
            UrlInfo::RequestUrl { file_path, .. }
            | UrlInfo::DownloadUrl { file_path, .. }
            | UrlInfo::SaveFileContent { file_path, .. } => file_path,
        }
    }
}

/// An emitted unit of Planner output (spec §3.5). `Command` and `UrlInfo`
/// overlap in shape; `Command` is what the Planner returns, `UrlInfo::RequestUrl`
/// is what a `Command::RequestUrl` becomes once threaded back through the
/// fetch engine as the next call's parent context.
#[derive(Debug, Clone)]
pub enum Command {
    RequestUrl(UrlInfo),
    DownloadUrl { url: String, file_path: String },
    SaveFileContent {
        file_path: String,
        file_content: Vec<u8>,
    },
}

impl Command {
    pub fn file_path(&self) -> &str {
        match self {
            Command::RequestUrl(info) => info.file_path(),
            Command::DownloadUrl { file_path, .. } => file_path,
            Command::SaveFileContent { file_path, .. } => file_path,
        }
    }
}
