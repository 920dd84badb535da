//! Content resolution for collected links.
//!
//! A link is either a PDF document (decided purely by a `.pdf` path suffix)
//! or a web page. PDFs are downloaded and their text extracted; pages are
//! fetched and, when they are HTML, reduced to their visible body text.
//!
//! Failures are split in two:
//! - a download that is not actually a PDF, or a PDF with no text, resolves
//!   to an empty string;
//! - network, HTTP status and decoding failures are [`Error::ContentFetch`],
//!   which [`ContentResolver::resolve_soft`] logs and flattens to an empty
//!   string.
//!
//! Either way an empty result means "skip this item".

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const PDF_MAGIC: &[u8] = b"%PDF";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Fetches the raw text behind a link.
///
/// Holds the single HTTP client used for every outbound request of a run
/// (listing pages and feeds go through [`get_text`](Self::get_text)), so the
/// configured timeout applies uniformly.
#[derive(Debug, Clone)]
pub struct ContentResolver {
    client: reqwest::Client,
    strip_markup: bool,
}

impl ContentResolver {
    /// Build a resolver whose requests all time out after `timeout`.
    pub fn new(timeout: Duration, user_agent: &str, strip_markup: bool) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,application/pdf,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            strip_markup,
        })
    }

    /// GET `url` and return the body as text, failing on non-2xx status.
    pub async fn get_text(&self, url: &str) -> Result<(String, Option<String>)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::fetch(url, e))?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| Error::fetch(url, e))?;
        Ok((body, content_type))
    }

    /// Resolve `link` to its text content.
    #[instrument(level = "info", skip(self))]
    pub async fn resolve(&self, link: &str) -> Result<String> {
        if is_pdf_link(link) {
            return self.resolve_pdf(link).await;
        }

        let (body, content_type) = self.get_text(link).await?;
        let is_html = content_type
            .as_deref()
            .map(|ct| ct.contains("html"))
            .unwrap_or_else(|| body.trim_start().starts_with('<'));

        let content = if self.strip_markup && is_html {
            visible_text(&body)
        } else {
            body
        };
        info!(bytes = content.len(), "Resolved page");
        Ok(content)
    }

    /// Like [`resolve`](Self::resolve), but fetch errors are logged and
    /// become an empty string.
    pub async fn resolve_soft(&self, link: &str) -> String {
        match self.resolve(link).await {
            Ok(content) => content,
            Err(e) => {
                warn!(%link, error = %e, "Content fetch failed; treating as empty");
                String::new()
            }
        }
    }

    async fn resolve_pdf(&self, link: &str) -> Result<String> {
        let bytes = self
            .client
            .get(link)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::fetch(link, e))?
            .bytes()
            .await
            .map_err(|e| Error::fetch(link, e))?;

        if !bytes.starts_with(PDF_MAGIC) {
            warn!(%link, bytes = bytes.len(), "Invalid PDF header; treating as empty");
            return Ok(String::new());
        }

        let bytes = bytes.to_vec();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| Error::fetch(link, format!("PDF extraction aborted: {e}")))?
            .map_err(|e| Error::fetch(link, format!("PDF extraction failed: {e:?}")))?;

        let text = collapse_whitespace(&text);
        if text.is_empty() {
            warn!(%link, "PDF has no extractable text; treating as empty");
        } else {
            info!(bytes = text.len(), "Extracted PDF text");
        }
        Ok(text)
    }
}

/// True when the link's path ends in `.pdf`, ignoring case, query and fragment.
pub fn is_pdf_link(link: &str) -> bool {
    let path = match Url::parse(link) {
        Ok(url) => url.path().to_string(),
        Err(_) => link
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    path.to_ascii_lowercase().ends_with(".pdf")
}

/// Visible text of an HTML document's body, whitespace collapsed.
/// Script, style and noscript contents are dropped.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let mut out = String::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name()))
            .is_some_and(|name| matches!(name, "script" | "style" | "noscript"));
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    let text = collapse_whitespace(&out);
    debug!(bytes = text.len(), "Extracted visible text");
    text
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}
