//! HTTP auditor: crawls a site and scores it with the signal rubric

use crate::audit::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::audit::parser::{parse_page, PageSignals};
use crate::audit::robots::{fetch_robots, RobotsRules};
use crate::audit::scoring::{score_site, SiteCrawl};
use crate::audit::{AuditError, Auditor};
use crate::config::AuditorConfig;
use crate::model::{CrawlMetadata, SiteAuditResult, SiteRole};
use crate::url::{normalize_site_url, same_site, site_key};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// Auditor that crawls live sites over HTTP
///
/// Pages are visited breadth-first from the requested URL, staying on the
/// same site and honoring robots.txt, until `max_pages` URLs have been tried.
/// The whole audit is bounded by the configured site timeout.
#[derive(Debug, Clone)]
pub struct HttpAuditor {
    client: Client,
    agent: String,
    site_timeout: Duration,
}

impl HttpAuditor {
    pub fn new(config: &AuditorConfig) -> Result<Self, AuditError> {
        Ok(Self {
            client: build_http_client(config)?,
            agent: config.crawler_name.clone(),
            site_timeout: Duration::from_secs(config.site_timeout_secs),
        })
    }

    async fn crawl(&self, start: Url, max_pages: u32) -> Result<SiteCrawl, AuditError> {
        let robots = fetch_robots(&self.client, &start).await;
        if !robots.is_allowed(start.as_str(), &self.agent) {
            return Err(AuditError::RobotsDenied {
                url: start.to_string(),
            });
        }

        let mut crawl = SiteCrawl {
            robots_found: robots.found(),
            ..SiteCrawl::default()
        };
        let mut queue = VecDeque::from([start.clone()]);
        let mut seen: HashSet<String> = HashSet::from([site_key(&start)]);
        let mut attempts = 0u32;

        while let Some(url) = queue.pop_front() {
            if attempts >= max_pages {
                break;
            }
            attempts += 1;

            match fetch_url(&self.client, url.as_str()).await {
                FetchResult::Success { final_url, body, .. } => {
                    let base = Url::parse(&final_url).unwrap_or_else(|_| url.clone());
                    let page = parse_page(&body, &base);
                    debug!(
                        "Audited {} ({} words, {} internal links)",
                        final_url,
                        page.word_count,
                        page.internal_links.len()
                    );
                    self.enqueue_links(&start, &page, &robots, &mut queue, &mut seen);
                    crawl.pages.push(page);
                }
                failure => {
                    if crawl.pages.is_empty() && url == start {
                        return Err(AuditError::Fetch {
                            url: start.to_string(),
                            message: failure.describe(),
                        });
                    }
                    debug!("Skipping {}: {}", url, failure.describe());
                    crawl.failed_fetches += 1;
                }
            }
        }

        Ok(crawl)
    }

    fn enqueue_links(
        &self,
        start: &Url,
        page: &PageSignals,
        robots: &RobotsRules,
        queue: &mut VecDeque<Url>,
        seen: &mut HashSet<String>,
    ) {
        for link in &page.internal_links {
            let Ok(url) = normalize_site_url(link) else {
                continue;
            };
            if !same_site(start, &url) || !robots.is_allowed(url.as_str(), &self.agent) {
                continue;
            }
            if seen.insert(site_key(&url)) {
                queue.push_back(url);
            }
        }
    }
}

#[async_trait]
impl Auditor for HttpAuditor {
    async fn audit(&self, url: &str, max_pages: u32) -> Result<SiteAuditResult, AuditError> {
        let start = normalize_site_url(url)?;
        let started = Instant::now();

        let crawl = match tokio::time::timeout(self.site_timeout, self.crawl(start.clone(), max_pages)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AuditError::Timeout {
                    url: url.to_string(),
                    secs: self.site_timeout.as_secs(),
                })
            }
        };

        let (dimensions, issues) = score_site(&crawl);
        let mut result = SiteAuditResult::succeeded(url, SiteRole::Competitor, dimensions);
        result.issues = issues;
        result.crawl = CrawlMetadata {
            pages_crawled: crawl.pages.len() as u32,
            final_url: crawl
                .pages
                .first()
                .map(|p| p.url.clone())
                .filter(|u| *u != start.as_str()),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            "Audited {}: {} pages, score {}",
            url, result.crawl.pages_crawled, result.total_score
        );
        Ok(result)
    }
}
