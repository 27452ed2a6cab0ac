//! Audit module: producing one [`SiteAuditResult`] per site
//!
//! This module contains:
//! - The [`Auditor`] seam the orchestrator calls
//! - HTTP fetching, robots.txt handling and HTML signal extraction
//! - The signal rubric that turns pages into dimension scores
//! - [`HttpAuditor`] for live sites and [`FixtureAuditor`] for recorded ones

mod fetcher;
mod fixture;
mod http;
mod parser;
mod robots;
mod scoring;

pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use fixture::{FixtureAuditor, FixtureEntry};
pub use http::HttpAuditor;
pub use parser::{parse_page, PageSignals};
pub use robots::{fetch_robots, RobotsRules};
pub use scoring::{score_site, SiteCrawl};

use crate::model::SiteAuditResult;
use crate::UrlError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors an auditor can report for one site
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Invalid site URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Start page disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },

    #[error("Audit of {url} exceeded {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Produces a score breakdown for one site
///
/// Implementations own their per-site timeout. The returned result's `url`
/// and `role` are overwritten by the orchestrator with the requested values;
/// an `Err` or a failed outcome is a terminal failure for that site and is
/// never retried.
#[async_trait]
pub trait Auditor: Send + Sync {
    async fn audit(&self, url: &str, max_pages: u32) -> Result<SiteAuditResult, AuditError>;
}
