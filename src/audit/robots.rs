//! Robots.txt handling for site audits
//!
//! Rules are fetched once per audited site and checked before every page
//! request. A missing or unreadable robots.txt allows everything.

use crate::audit::fetcher::fetch_text;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use tracing::debug;
use url::Url;

/// Robots.txt rules of one site
#[derive(Debug, Clone)]
pub struct RobotsRules {
    /// Raw robots.txt content (empty means allow all)
    content: String,
    found: bool,
}

impl RobotsRules {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            found: true,
        }
    }

    /// Permissive rules used when robots.txt cannot be fetched
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            found: false,
        }
    }

    /// Whether the site served a robots.txt
    pub fn found(&self) -> bool {
        self.found
    }

    /// Checks a full URL against the rules for `agent` (the crawler's product token)
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }
}

/// Fetches `/robots.txt` from the origin of `site`
pub async fn fetch_robots(client: &Client, site: &Url) -> RobotsRules {
    let Ok(robots_url) = site.join("/robots.txt") else {
        return RobotsRules::allow_all();
    };

    match fetch_text(client, robots_url.as_str()).await {
        Some(content) => {
            debug!("Loaded robots.txt from {}", robots_url);
            RobotsRules::from_content(&content)
        }
        None => {
            debug!("No robots.txt at {}, allowing all", robots_url);
            RobotsRules::allow_all()
        }
    }
}
