//! Command-line interface definitions.
//!
//! Every option can also be supplied through the environment variable named
//! next to it.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for one collection run.
///
/// # Examples
///
/// ```sh
/// # Catalog and exclusions from the working directory, CSV into ./output
/// newsdesk_collector
///
/// # Explicit paths, three summaries per source
/// newsdesk_collector -s conf/sources.yaml -x conf/exclusions.csv -o exports -q 3
///
/// # Collect without calling the model
/// newsdesk_collector --no-summary
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Source catalog (YAML)
    #[arg(short, long, env = "NEWSDESK_SOURCES", default_value = "sources.yaml")]
    pub sources: PathBuf,

    /// Exclusion keywords (CSV with `organization,exception_keyword`)
    #[arg(short = 'x', long, env = "NEWSDESK_EXCLUSIONS", default_value = "exclusions.csv")]
    pub exclusions: PathBuf,

    /// Directory for the CSV export
    #[arg(short, long, env = "NEWSDESK_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// New items per source that get a summary, unless the catalog overrides it
    #[arg(short, long, env = "NEWSDESK_QUOTA", default_value_t = 5)]
    pub quota: usize,

    /// Timeout for every HTTP request, in seconds
    #[arg(long, env = "NEWSDESK_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[arg(long, env = "NEWSDESK_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Return raw HTML instead of visible page text as item content
    #[arg(long)]
    pub keep_markup: bool,

    /// Optional path to the awful_aj config.yaml
    #[arg(short, long, env = "NEWSDESK_LLM_CONFIG")]
    pub config: Option<String>,

    /// awful_aj chat template used for summaries
    #[arg(long, env = "NEWSDESK_TEMPLATE", default_value = "news_summary")]
    pub template: String,

    /// Do not summarize anything in this run
    #[arg(long)]
    pub no_summary: bool,

    /// Start the CSV with a UTF-8 byte order mark
    #[arg(long)]
    pub excel_bom: bool,
}
