//! RSS 2.0 feeds as listings.

use crate::config::SourceSpec;
use crate::error::{Error, Result};
use crate::models::CollectedItem;
use crate::pipeline::{Listing, RunContext};
use crate::resolver::collapse_whitespace;
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<String>,
}

/// HTML named entities that show up in agency feeds but are not valid XML.
const HTML_ENTITIES: [(&str, &str); 9] = [
    ("&nbsp;", "&#160;"),
    ("&middot;", "&#183;"),
    ("&hellip;", "&#8230;"),
    ("&ndash;", "&#8211;"),
    ("&mdash;", "&#8212;"),
    ("&lsquo;", "&#8216;"),
    ("&rsquo;", "&#8217;"),
    ("&ldquo;", "&#8220;"),
    ("&rdquo;", "&#8221;"),
];

fn replace_entities(text: &str) -> String {
    HTML_ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Rewrite HTML entities to numeric references outside CDATA sections.
/// CDATA content is never entity-decoded, so it is copied untouched.
fn scrub_html_entities(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(start) = rest.find("<![CDATA[") {
        out.push_str(&replace_entities(&rest[..start]));
        let cdata = &rest[start..];
        let end = cdata.find("]]>").map_or(cdata.len(), |i| i + 3);
        out.push_str(&cdata[..end]);
        rest = &cdata[end..];
    }
    out.push_str(&replace_entities(rest));
    out
}

#[derive(Debug)]
pub struct FeedListing {
    organization: String,
    url: String,
    extra: BTreeMap<String, Value>,
}

impl FeedListing {
    pub fn from_spec(spec: &SourceSpec) -> Self {
        Self {
            organization: spec.organization.clone(),
            url: spec.url.clone(),
            extra: spec.extra.clone(),
        }
    }

    /// Turn feed XML into candidate items, in feed order.
    ///
    /// Items without a title or link are dropped. The first `<category>`
    /// becomes the `category` passthrough field.
    pub fn parse_feed(&self, xml: &str, collected_at: &str) -> Result<Vec<CollectedItem>> {
        let rss: Rss = from_str(&scrub_html_entities(xml))
            .map_err(|e| Error::listing(&self.url, format!("invalid RSS: {e}")))?;

        let mut items = Vec::with_capacity(rss.channel.items.len());
        for entry in rss.channel.items {
            let title = entry.title.as_deref().map(collapse_whitespace).unwrap_or_default();
            let link = entry.link.as_deref().map(str::trim).unwrap_or_default();
            if title.is_empty() || link.is_empty() {
                warn!(%title, %link, "Feed item without title or link; skipping");
                continue;
            }

            let mut item = CollectedItem::new(
                &self.organization,
                title,
                link,
                entry.pub_date.as_deref().map(str::trim).unwrap_or_default(),
                collected_at,
            );
            item.extra.extend(self.extra.clone());
            if let Some(category) = entry.categories.into_iter().find(|c| !c.trim().is_empty()) {
                item.extra.insert("category".to_string(), Value::from(category.trim()));
            }
            items.push(item);
        }
        Ok(items)
    }
}

#[async_trait(?Send)]
impl Listing for FeedListing {
    fn organization(&self) -> &str {
        &self.organization
    }

    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    async fn list(&self, ctx: &RunContext) -> Result<Vec<CollectedItem>> {
        let (xml, _) = ctx
            .resolver
            .get_text(&self.url)
            .await
            .map_err(|e| Error::listing(&self.url, e))?;
        let items = self.parse_feed(&xml, &ctx.collected_at)?;
        info!(count = items.len(), "Parsed feed");
        Ok(items)
    }
}
