//! # Newsdesk Collector
//!
//! Incrementally collects announcements from news and notice pages of
//! insurers and public agencies, summarizes the new ones through an LLM, and
//! exports each run to CSV.
//!
//! ## Usage
//!
//! ```sh
//! newsdesk_collector -s sources.yaml -x exclusions.csv -o output
//! ```
//!
//! ## Architecture
//!
//! A run is a single sequential pass:
//! 1. **Listing**: each catalog source reports the entries it currently shows
//! 2. **Novelty**: entries whose title is already in the source's store are dropped
//! 3. **Content**: new entries are fetched (HTML or PDF); unreadable ones are skipped
//! 4. **Summary**: up to the per-source quota of new entries are summarized
//! 5. **Persistence**: each source saves its store before the next source starts
//! 6. **Output**: the combined items are keyword-filtered and written to CSV

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod exclusion;
mod models;
mod novelty;
mod orchestrator;
mod outputs;
mod pipeline;
mod resolver;
mod sources;
mod store;
mod summarize;
#[cfg(test)]
mod testing;
mod utils;

use cli::Cli;
use config::Catalog;
use exclusion::ExclusionRules;
use orchestrator::{Orchestrator, SourceOutcome};
use pipeline::RunContext;
use resolver::{ContentResolver, DEFAULT_USER_AGENT};
use summarize::{LlmSummarizer, SummaryGate};
use utils::{ensure_writable_dir, run_timestamp};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newsdesk_collector starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Early check: the export directory must be writable before any source runs.
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Configuration ----
    let catalog = Catalog::load(&args.sources)?;
    let sources = sources::from_catalog(&catalog)?;
    let rules = ExclusionRules::load(&args.exclusions)?;

    let any_quota = args.quota > 0 || catalog.sources.iter().any(|s| s.quota.unwrap_or(0) > 0);
    let summaries = if args.no_summary || !any_quota {
        info!("Summaries disabled for this run");
        SummaryGate::disabled()
    } else {
        match LlmSummarizer::load(args.config.as_deref(), &args.template).await {
            Ok(summarizer) => SummaryGate::new(Box::new(summarizer)),
            Err(e) => {
                warn!(error = %e, "Summarizer unavailable; collecting without summaries");
                SummaryGate::disabled()
            }
        }
    };

    let resolver = ContentResolver::new(
        Duration::from_secs(args.timeout_secs),
        args.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT),
        !args.keep_markup,
    )?;

    let ctx = RunContext {
        collected_at: run_timestamp(Local::now()),
        quota: args.quota,
        resolver,
        summaries,
    };
    info!(collected_at = %ctx.collected_at, sources = sources.len(), quota = ctx.quota, "Run context ready");

    // ---- Collect, filter, export ----
    let orchestrator = Orchestrator::new(sources, rules, args.output_dir.clone(), args.excel_bom);
    let report = orchestrator.run(&ctx).await?;

    for (organization, outcome) in &report.sources {
        if let SourceOutcome::Failed(reason) = outcome {
            warn!(%organization, %reason, "Source produced nothing this run");
        }
    }

    match &report.export_path {
        Some(path) => info!(path = %path.display(), items = report.exported, "Wrote run export"),
        None => info!("No new items in this run"),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        failed_sources = report.failed_sources(),
        excluded = report.excluded,
        "Execution complete"
    );

    Ok(())
}
