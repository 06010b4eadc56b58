//! The Planner's view of a fetched page: a parsed [`Document`] plus whatever
//! `UrlInfo` the fetch engine threaded back from the request that produced it
//! (spec §6.3).

use siteconf_html::Document;

use crate::command::UrlInfo;

/// One fetched-and-parsed page, ready to hand to [`crate::planner::plan`].
pub struct PlannerResponse {
    pub document: Document,
    /// `None` for the start response; `Some` for every follow-up fetch
    /// (spec §4.5.1).
    pub parent_url_info: Option<UrlInfo>,
}

impl PlannerResponse {
    pub fn new(document: Document, parent_url_info: Option<UrlInfo>) -> Self {
        PlannerResponse {
            document,
            parent_url_info,
        }
    }
}
