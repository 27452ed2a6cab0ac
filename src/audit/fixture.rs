//! Fixture auditor: replays recorded audit results
//!
//! A fixture file is a JSON object keyed by site URL. Each entry either
//! carries a recorded `result` or a scripted `error`, and may add an
//! artificial `delay-ms` before answering:
//!
//! ```json
//! {
//!   "https://example.com/": { "result": { "url": "https://example.com/", ... } },
//!   "https://down.example/": { "error": "connection refused", "delay-ms": 200 }
//! }
//! ```
//!
//! Keys are matched by site identity, so `example.com` and
//! `https://www.example.com/` select the same entry.

use crate::audit::{AuditError, Auditor};
use crate::model::SiteAuditResult;
use crate::url::{normalize_site_url, site_key};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// One scripted answer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FixtureEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<SiteAuditResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Panic inside the audit task instead of answering
    #[serde(default)]
    pub panic: bool,

    #[serde(default)]
    pub delay_ms: u64,
}

impl FixtureEntry {
    pub fn result(result: SiteAuditResult) -> Self {
        Self {
            result: Some(result),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = delay.as_millis() as u64;
        self
    }
}

/// Auditor answering from an in-memory table of fixtures
#[derive(Debug, Clone, Default)]
pub struct FixtureAuditor {
    entries: HashMap<String, FixtureEntry>,
}

impl FixtureAuditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads fixtures from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, AuditError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, AuditError> {
        let raw: HashMap<String, FixtureEntry> = serde_json::from_str(content)?;
        let mut auditor = Self::new();
        for (url, entry) in raw {
            auditor.insert(&url, entry)?;
        }
        Ok(auditor)
    }

    /// Adds or replaces the entry for `url`
    pub fn insert(&mut self, url: &str, entry: FixtureEntry) -> Result<(), AuditError> {
        let key = site_key(&normalize_site_url(url)?);
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, url: &str, entry: FixtureEntry) -> Result<Self, AuditError> {
        self.insert(url, entry)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Auditor for FixtureAuditor {
    async fn audit(&self, url: &str, _max_pages: u32) -> Result<SiteAuditResult, AuditError> {
        let key = site_key(&normalize_site_url(url)?);
        let entry = self
            .entries
            .get(&key)
            .ok_or_else(|| AuditError::Fixture(format!("no fixture for {}", url)))?;

        if entry.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(entry.delay_ms)).await;
        }

        if entry.panic {
            panic!("scripted panic while auditing {}", url);
        }
        if let Some(message) = &entry.error {
            return Err(AuditError::Fetch {
                url: url.to_string(),
                message: message.clone(),
            });
        }

        debug!("Replaying fixture for {}", url);
        entry
            .result
            .clone()
            .ok_or_else(|| AuditError::Fixture(format!("fixture for {} has no result", url)))
    }
}
