use crate::model::Effort;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Rivalscope
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    pub auditor: AuditorConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Job orchestration limits
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OrchestratorConfig {
    /// Wall-clock ceiling for the auditing phase of one job (seconds)
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,

    /// Page budget used when the caller does not pass one
    #[serde(default = "default_max_pages")]
    pub default_max_pages: u32,

    /// Largest page budget a request may ask for
    #[serde(default = "default_max_pages_limit")]
    pub max_pages_limit: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            job_timeout_secs: default_job_timeout_secs(),
            default_max_pages: default_max_pages(),
            max_pages_limit: default_max_pages_limit(),
        }
    }
}

/// Auditor identification and timeouts
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AuditorConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,

    /// Timeout of a single HTTP request (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout of one whole site audit (seconds)
    #[serde(default = "default_site_timeout_secs")]
    pub site_timeout_secs: u64,
}

impl AuditorConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn user_agent(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Which competitors gaps are measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapScope {
    /// Every competitor whose audit succeeded, unless the user leads them all
    #[default]
    All,
    /// Only competitors ranked ahead of the user
    Outranking,
}

/// Analysis policy knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalysisConfig {
    /// A gap of at least this fraction of the dimension maximum is high priority
    #[serde(default = "default_high_priority_fraction")]
    pub high_priority_fraction: f64,

    /// Number of gaps exposed in the result
    #[serde(default = "default_top_gaps")]
    pub top_gaps: usize,

    /// Maximum number of quick wins
    #[serde(default = "default_quick_win_limit")]
    pub quick_win_limit: usize,

    #[serde(default)]
    pub gap_scope: GapScope,

    #[serde(default)]
    pub weights: PriorityWeights,

    /// Per-dimension effort overrides, keyed by dimension name
    #[serde(default)]
    pub effort: BTreeMap<String, Effort>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            high_priority_fraction: default_high_priority_fraction(),
            top_gaps: default_top_gaps(),
            quick_win_limit: default_quick_win_limit(),
            gap_scope: GapScope::default(),
            weights: PriorityWeights::default(),
            effort: BTreeMap::new(),
        }
    }
}

/// Weights of the action priority score
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PriorityWeights {
    /// Multiplier for estimated impact points
    #[serde(default = "default_impact_weight")]
    pub impact: f64,

    /// Multiplier for places gained in the ranking
    #[serde(default = "default_rank_weight")]
    pub rank: f64,

    #[serde(default)]
    pub effort_low: f64,

    #[serde(default = "default_effort_medium_penalty")]
    pub effort_medium: f64,

    #[serde(default = "default_effort_high_penalty")]
    pub effort_high: f64,
}

impl PriorityWeights {
    /// Penalty subtracted from the priority score for an effort tier
    pub fn effort_penalty(&self, effort: Effort) -> f64 {
        match effort {
            Effort::Low => self.effort_low,
            Effort::Medium => self.effort_medium,
            Effort::High => self.effort_high,
        }
    }
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            impact: default_impact_weight(),
            rank: default_rank_weight(),
            effort_low: 0.0,
            effort_medium: default_effort_medium_penalty(),
            effort_high: default_effort_high_penalty(),
        }
    }
}

/// Job state backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path to the SQLite database file (sqlite backend only)
    pub database_path: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the markdown report file
    #[serde(default = "default_report_path")]
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: default_report_path(),
        }
    }
}

fn default_job_timeout_secs() -> u64 {
    300
}

fn default_max_pages() -> u32 {
    25
}

fn default_max_pages_limit() -> u32 {
    200
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_site_timeout_secs() -> u64 {
    120
}

fn default_high_priority_fraction() -> f64 {
    0.2
}

fn default_top_gaps() -> usize {
    10
}

fn default_quick_win_limit() -> usize {
    5
}

fn default_impact_weight() -> f64 {
    1.0
}

fn default_rank_weight() -> f64 {
    10.0
}

fn default_effort_medium_penalty() -> f64 {
    5.0
}

fn default_effort_high_penalty() -> f64 {
    10.0
}

fn default_report_path() -> String {
    "./comparison.md".to_string()
}
