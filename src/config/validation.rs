use crate::config::types::{
    AnalysisConfig, AuditorConfig, Config, OrchestratorConfig, StorageBackend, StorageConfig,
};
use crate::model::Dimension;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_orchestrator_config(&config.orchestrator)?;
    validate_auditor_config(&config.auditor)?;
    validate_analysis_config(&config.analysis)?;
    validate_storage_config(&config.storage)?;

    if config.output.report_path.is_empty() {
        return Err(ConfigError::Validation(
            "report_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates orchestration limits
fn validate_orchestrator_config(config: &OrchestratorConfig) -> Result<(), ConfigError> {
    if config.job_timeout_secs < 1 || config.job_timeout_secs > 3600 {
        return Err(ConfigError::Validation(format!(
            "job_timeout_secs must be between 1 and 3600, got {}",
            config.job_timeout_secs
        )));
    }

    if config.max_pages_limit < 1 || config.max_pages_limit > 10_000 {
        return Err(ConfigError::Validation(format!(
            "max_pages_limit must be between 1 and 10000, got {}",
            config.max_pages_limit
        )));
    }

    if config.default_max_pages < 1 || config.default_max_pages > config.max_pages_limit {
        return Err(ConfigError::Validation(format!(
            "default_max_pages must be between 1 and max_pages_limit ({}), got {}",
            config.max_pages_limit, config.default_max_pages
        )));
    }

    Ok(())
}

/// Validates auditor identification and timeouts
fn validate_auditor_config(config: &AuditorConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.site_timeout_secs < config.request_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "site_timeout_secs ({}) must be >= request_timeout_secs ({})",
            config.site_timeout_secs, config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates analysis policy values
fn validate_analysis_config(config: &AnalysisConfig) -> Result<(), ConfigError> {
    if !(config.high_priority_fraction > 0.0 && config.high_priority_fraction <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "high_priority_fraction must be in (0, 1], got {}",
            config.high_priority_fraction
        )));
    }

    if config.top_gaps < 1 {
        return Err(ConfigError::Validation("top_gaps must be >= 1".to_string()));
    }

    if config.quick_win_limit < 1 {
        return Err(ConfigError::Validation(
            "quick_win_limit must be >= 1".to_string(),
        ));
    }

    let weights = &config.weights;
    for (name, value) in [
        ("impact", weights.impact),
        ("rank", weights.rank),
        ("effort-low", weights.effort_low),
        ("effort-medium", weights.effort_medium),
        ("effort-high", weights.effort_high),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Validation(format!(
                "weight '{}' must be a finite, non-negative number, got {}",
                name, value
            )));
        }
    }

    for name in config.effort.keys() {
        if Dimension::from_name(name).is_none() {
            return Err(ConfigError::Validation(format!(
                "Unknown dimension '{}' in [analysis.effort]",
                name
            )));
        }
    }

    Ok(())
}

/// Validates storage backend settings
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.backend == StorageBackend::Sqlite
        && config
            .database_path
            .as_deref()
            .map_or(true, |p| p.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "database_path is required for the sqlite backend".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
