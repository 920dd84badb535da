//! Summarization gate.
//!
//! Each source may summarize at most `quota` of its new items per run; the
//! rest are stored with an empty summary. Summarization fails open: any
//! error from the model is logged and produces an empty summary, never a
//! lost item.

use crate::api::ask_with_backoff;
use crate::error::{Error, Result};
use crate::utils::{truncate_chars, truncate_for_log};
use async_trait::async_trait;
use awful_aj::{config, config::AwfulJadeConfig, config_dir, template, template::ChatTemplate};
use tracing::{debug, info, instrument, warn};

/// Content beyond this many characters is not sent to the model.
pub const MAX_PROMPT_CHARS: usize = 12_000;

/// Whether the next item still fits within the quota.
pub fn should_summarize(processed_so_far: usize, quota: usize) -> bool {
    processed_so_far < quota
}

/// Produces a short natural-language summary of an announcement.
#[async_trait(?Send)]
pub trait Summarizer {
    async fn summarize(&self, title: &str, content: &str) -> Result<String>;
}

/// Wraps a [`Summarizer`] and turns its failures into empty summaries.
pub struct SummaryGate {
    summarizer: Box<dyn Summarizer>,
}

impl SummaryGate {
    pub fn new(summarizer: Box<dyn Summarizer>) -> Self {
        Self { summarizer }
    }

    /// A gate that never calls out and always yields empty summaries.
    pub fn disabled() -> Self {
        Self::new(Box::new(NoopSummarizer))
    }

    #[instrument(level = "info", skip(self, content))]
    pub async fn summarize_or_empty(&self, title: &str, content: &str) -> String {
        match self.summarizer.summarize(title, content).await {
            Ok(summary) => summary.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Summarization failed; keeping item without summary");
                String::new()
            }
        }
    }
}

/// Summarizer used when summaries are turned off.
#[derive(Debug, Default)]
pub struct NoopSummarizer;

#[async_trait(?Send)]
impl Summarizer for NoopSummarizer {
    async fn summarize(&self, _title: &str, _content: &str) -> Result<String> {
        Ok(String::new())
    }
}

/// Summarizer backed by an OpenAI-compatible model through `awful_aj`.
pub struct LlmSummarizer {
    config: AwfulJadeConfig,
    template: ChatTemplate,
}

impl LlmSummarizer {
    /// Load the `awful_aj` configuration and the named chat template.
    ///
    /// Without an explicit `config_path`, `config.yaml` is read from the
    /// `awful_aj` configuration directory.
    pub async fn load(config_path: Option<&str>, template_name: &str) -> Result<Self> {
        let conf_file = match config_path {
            Some(p) => std::path::PathBuf::from(p),
            None => config_dir()
                .map_err(|e| Error::Config(format!("no awful_aj config dir: {e}")))?
                .join("config.yaml"),
        };
        let conf_path = conf_file
            .to_str()
            .ok_or_else(|| Error::Config(format!("not a valid config filename: {}", conf_file.display())))?;

        let config = config::load_config(conf_path)
            .map_err(|e| Error::Config(format!("loading {conf_path}: {e}")))?;
        let template = template::load_template(template_name)
            .await
            .map_err(|e| Error::Config(format!("loading template {template_name}: {e}")))?;
        info!(config_path = conf_path, template = template_name, "Loaded summarizer");

        Ok(Self { config, template })
    }
}

#[async_trait(?Send)]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, title: &str, content: &str) -> Result<String> {
        let prompt = build_prompt(title, content);
        debug!(chars = prompt.chars().count(), "Sending summary prompt");
        let summary = ask_with_backoff(&self.config, &prompt, &self.template)
            .await
            .map_err(|e| Error::Summarization(e.to_string()))?;
        debug!(response = %truncate_for_log(&summary, 200), "Model replied");
        Ok(summary)
    }
}

fn build_prompt(title: &str, content: &str) -> String {
    format!("Title: {title}\n\n{}", truncate_chars(content, MAX_PROMPT_CHARS))
}
