//! Rivalscope main entry point
//!
//! This is the command-line interface for the Rivalscope competitive auditor.

use clap::Parser;
use rivalscope::audit::{Auditor, FixtureAuditor, HttpAuditor};
use rivalscope::config::{load_config_with_hash, Config, StorageBackend};
use rivalscope::orchestrator::{ComparisonService, JobResults};
use rivalscope::output::{print_comparison, print_status, write_markdown_report};
use rivalscope::state::JobId;
use rivalscope::storage::{open_store, ComparisonStore, MemoryStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Interval between progress checks of a running job
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Rivalscope: audit your site against its competitors
///
/// Rivalscope audits a site and up to three competitors, ranks them,
/// finds the dimensions where competitors lead and proposes the fixes
/// most likely to move the site up the ranking.
#[derive(Parser, Debug)]
#[command(name = "rivalscope")]
#[command(version = "0.1.0")]
#[command(about = "Competitive site audits with a ranked action plan", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// The site to improve
    #[arg(long, value_name = "URL", required_unless_present = "show")]
    user: Option<String>,

    /// A competitor site (repeat for up to three)
    #[arg(long = "competitor", value_name = "URL", required_unless_present = "show")]
    competitors: Vec<String>,

    /// Pages to crawl per site (defaults to the configured value)
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Replay recorded audit results from a JSON file instead of crawling
    #[arg(long, value_name = "FILE")]
    fixtures: Option<PathBuf>,

    /// Where to write the markdown report (overrides the configured path)
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Print the comparison as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and request, show the plan and exit
    #[arg(long, conflicts_with = "show")]
    dry_run: bool,

    /// Print a stored job from the database and exit
    #[arg(long, value_name = "JOB_ID", conflicts_with = "dry_run")]
    show: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(job_id) = &cli.show {
        handle_show(&config, job_id, cli.json)?;
    } else if cli.dry_run {
        handle_dry_run(&config, &cli)?;
    } else {
        handle_compare(&config, &config_hash, &cli).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rivalscope=info,warn"),
            1 => EnvFilter::new("rivalscope=debug,info"),
            2 => EnvFilter::new("rivalscope=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn build_auditor(config: &Config, cli: &Cli) -> Result<Arc<dyn Auditor>, Box<dyn std::error::Error>> {
    match &cli.fixtures {
        Some(path) => {
            let auditor = FixtureAuditor::from_file(path)?;
            tracing::info!(
                "Replaying {} recorded sites from {}",
                auditor.len(),
                path.display()
            );
            Ok(Arc::new(auditor))
        }
        None => Ok(Arc::new(HttpAuditor::new(&config.auditor)?)),
    }
}

/// Handles the --dry-run mode: validates the request and shows the plan
fn handle_dry_run(config: &Config, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Rivalscope Dry Run ===\n");

    let service = ComparisonService::from_config(
        config,
        build_auditor(config, cli)?,
        Arc::new(MemoryStore::new()),
    );
    let request = service.validate_request(
        cli.user.as_deref().unwrap_or_default(),
        &cli.competitors,
        cli.max_pages,
    )?;

    println!("Sites:");
    println!("  You: {}", request.user_url);
    for url in &request.competitor_urls {
        println!("  Competitor: {}", url);
    }
    println!("  Pages per site: {}", request.max_pages);

    println!("\nAuditor:");
    match &cli.fixtures {
        Some(path) => println!("  Fixtures: {}", path.display()),
        None => {
            println!("  User agent: {}", config.auditor.user_agent());
            println!("  Site timeout: {}s", config.auditor.site_timeout_secs);
        }
    }
    println!("  Job timeout: {}s", config.orchestrator.job_timeout_secs);

    println!("\nAnalysis:");
    println!("  Gap scope: {:?}", config.analysis.gap_scope);
    println!("  Top gaps: {}", config.analysis.top_gaps);
    println!("  Quick wins: up to {}", config.analysis.quick_win_limit);

    println!("\nOutput:");
    println!("  Storage: {:?}", config.storage.backend);
    println!("  Report: {}", report_path(config, cli).display());

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would audit {} sites",
        1 + request.competitor_urls.len()
    );

    Ok(())
}

/// Handles the --show mode: prints a stored job
fn handle_show(config: &Config, job_id: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if config.storage.backend != StorageBackend::Sqlite {
        return Err("--show needs the sqlite storage backend".into());
    }
    let job_id: JobId = job_id.parse()?;
    let store = open_store(&config.storage)?;
    let state = store.load(&job_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    print_status(&state.job.status_view());
    if let Some(result) = &state.result {
        println!();
        print_comparison(result);
    }
    Ok(())
}

/// Handles the main comparison run
async fn handle_compare(
    config: &Config,
    config_hash: &str,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn ComparisonStore> = open_store(&config.storage)?;
    let service = ComparisonService::from_config(config, build_auditor(config, cli)?, store);

    let job_id = service.start(
        cli.user.as_deref().unwrap_or_default(),
        &cli.competitors,
        cli.max_pages,
    )?;
    tracing::info!("Started job {}", job_id);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last_progress = None;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::warn!("Interrupt received, cancelling job {}", job_id);
                match service.cancel(&job_id).await {
                    Ok(view) => print_status(&view),
                    Err(e) => {
                        tracing::warn!("Could not cancel job {}: {}", job_id, e);
                        service.wait(&job_id, POLL_INTERVAL).await?;
                    }
                }
                break;
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {
                let view = service.status(&job_id)?;
                if last_progress != Some(view.progress) {
                    tracing::info!(
                        "Progress: {}% ({}/{} sites settled, {})",
                        view.progress,
                        view.sites_completed,
                        view.sites_total,
                        view.status
                    );
                    last_progress = Some(view.progress);
                }
                if view.status.is_terminal() {
                    break;
                }
            }
        }
    }

    match service.results(&job_id)? {
        JobResults::Ready(result) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_comparison(&result);
            }

            let job = service.store().load(&job_id)?.job;
            let path = report_path(config, cli);
            write_markdown_report(&job, &result, Some(config_hash), &path)?;
            tracing::info!("Report written to {}", path.display());
            Ok(())
        }
        JobResults::Failed { error } => {
            tracing::error!("Job {} failed: {}", job_id, error);
            Err(format!("comparison failed: {}", error).into())
        }
        JobResults::Cancelled => {
            println!("Job {} was cancelled; no results.", job_id);
            Ok(())
        }
        JobResults::NotReady { status, progress } => {
            println!("Job {} is still {} ({}%).", job_id, status, progress);
            Ok(())
        }
    }
}

fn report_path(config: &Config, cli: &Cli) -> PathBuf {
    cli.report
        .clone()
        .unwrap_or_else(|| Path::new(&config.output.report_path).to_path_buf())
}
