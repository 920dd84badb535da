//! Data models for collected announcements.
//!
//! [`CollectedItem`] is the single record type that flows through the
//! pipeline: it is produced by a source listing, persisted in the per-source
//! store, filtered, and finally exported.
//!
//! Field names on disk follow the store schema (`pubDate`,
//! `execution_timestamp`, …) so existing store files remain readable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One announcement collected from a source.
///
/// The title is the natural key: two items from the same source with the
/// same title are the same item, regardless of link or date.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CollectedItem {
    /// Which source produced the item. Stable across runs.
    pub organization: String,
    /// Headline as shown on the listing page. Compared byte-for-byte.
    pub title: String,
    /// Absolute URL of the full announcement.
    pub link: String,
    /// Publication date as displayed by the source. Not normalized.
    #[serde(rename = "pubDate", default)]
    pub published: String,
    /// Timestamp of the run that first collected the item.
    #[serde(rename = "execution_timestamp", default)]
    pub collected_at: String,
    /// Generated summary, or empty when none was produced.
    #[serde(default)]
    pub summary: String,
    /// Source-specific passthrough fields such as `label` or `category`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CollectedItem {
    /// Create a candidate item with an empty summary and no extras.
    pub fn new(
        organization: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
        published: impl Into<String>,
        collected_at: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            title: title.into(),
            link: link.into(),
            published: published.into(),
            collected_at: collected_at.into(),
            summary: String::new(),
            extra: BTreeMap::new(),
        }
    }
}
