//! Per-site audit records
//!
//! A [`SiteAuditResult`] is produced once per site by the orchestrator and is
//! immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scored category of a site audit
///
/// The declaration order is the canonical iteration order for reports and
/// deterministic tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
    /// Classic on-page search optimization (titles, descriptions, headings)
    Seo,
    /// Answer-engine optimization (question headings, FAQ markup, lists)
    Aeo,
    /// JSON-LD and Open Graph markup
    StructuredData,
    /// Depth and organization of the written content
    Content,
    /// Transport and rendering basics (HTTPS, viewport, response health)
    Technical,
    /// Internal linking and outbound references
    LinkProfile,
}

impl Dimension {
    /// All dimensions in canonical order
    pub const ALL: [Dimension; 6] = [
        Dimension::Seo,
        Dimension::Aeo,
        Dimension::StructuredData,
        Dimension::Content,
        Dimension::Technical,
        Dimension::LinkProfile,
    ];

    /// Stable machine name (matches the serde and config spelling)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seo => "seo",
            Self::Aeo => "aeo",
            Self::StructuredData => "structured-data",
            Self::Content => "content",
            Self::Technical => "technical",
            Self::LinkProfile => "link-profile",
        }
    }

    /// Human-readable label used in reports and action descriptions
    pub fn label(&self) -> &'static str {
        match self {
            Self::Seo => "SEO",
            Self::Aeo => "AEO",
            Self::StructuredData => "structured data",
            Self::Content => "content",
            Self::Technical => "technical health",
            Self::LinkProfile => "link profile",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.as_str() == name)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score of one dimension: points earned out of points available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub current: u32,
    pub max: u32,
}

impl DimensionScore {
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    /// Points still available in this dimension
    pub fn headroom(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }
}

/// Whether a site is the user's own or a competitor's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SiteRole {
    User,
    Competitor,
}

/// Why a site's audit did not produce a score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// The job-level deadline passed before the audit settled
    Timeout,
    /// The job was cancelled while the audit was running
    Cancelled,
    /// The audit task panicked
    Panicked,
    /// The auditor reported an error
    Error(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("TIMEOUT"),
            Self::Cancelled => f.write_str("CANCELLED"),
            Self::Panicked => f.write_str("PANICKED"),
            Self::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}

/// Terminal outcome of one site's audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum AuditOutcome {
    Succeeded,
    Failed { reason: FailureReason },
}

impl AuditOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// A finding reported by the auditor; carried through but never interpreted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditIssue {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<Dimension>,
}

/// Information about how a site was crawled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlMetadata {
    pub pages_crawled: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub duration_ms: u64,
}

/// The result of auditing one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteAuditResult {
    pub url: String,
    pub role: SiteRole,
    pub total_score: u32,
    pub dimensions: BTreeMap<Dimension, DimensionScore>,
    #[serde(default)]
    pub issues: Vec<AuditIssue>,
    #[serde(default)]
    pub crawl: CrawlMetadata,
    pub outcome: AuditOutcome,
}

impl SiteAuditResult {
    /// Builds a successful result whose total is the sum of its dimensions
    pub fn succeeded(
        url: impl Into<String>,
        role: SiteRole,
        dimensions: BTreeMap<Dimension, DimensionScore>,
    ) -> Self {
        let total_score = dimensions.values().map(|d| d.current).sum();
        Self {
            url: url.into(),
            role,
            total_score,
            dimensions,
            issues: Vec::new(),
            crawl: CrawlMetadata::default(),
            outcome: AuditOutcome::Succeeded,
        }
    }

    /// Builds a failed result carrying no scores
    pub fn failed(url: impl Into<String>, role: SiteRole, reason: FailureReason) -> Self {
        Self {
            url: url.into(),
            role,
            total_score: 0,
            dimensions: BTreeMap::new(),
            issues: Vec::new(),
            crawl: CrawlMetadata::default(),
            outcome: AuditOutcome::Failed { reason },
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Failure reason, if the audit failed
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match &self.outcome {
            AuditOutcome::Succeeded => None,
            AuditOutcome::Failed { reason } => Some(reason),
        }
    }

    /// Current points in a dimension (0 when the dimension was not scored)
    pub fn dimension_score(&self, dimension: Dimension) -> u32 {
        self.dimensions
            .get(&dimension)
            .map(|d| d.current)
            .unwrap_or(0)
    }
}
