//! Source catalog loading.
//!
//! The catalog is a YAML file listing every source of a run, in the order
//! they are fetched:
//!
//! ```yaml
//! sources:
//!   - organization: Example Mutual
//!     kind: html
//!     url: https://example.com/news
//!     store: data/example_mutual.json
//!     quota: 3
//!     item: "ul.board li"
//!     title: "a.subject"
//!     link: "a.subject"
//!     date: "span.date"
//!     extra:
//!       label: press
//!   - organization: Agency
//!     kind: rss
//!     url: https://agency.example/rss.xml
//!     store: data/agency.json
//! ```
//!
//! Store paths are relative to the working directory.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// An HTML listing page scraped with CSS selectors.
    Html,
    /// An RSS 2.0 feed.
    Rss,
}

fn default_link_attr() -> String {
    "href".to_string()
}

/// One catalog entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSpec {
    pub organization: String,
    pub kind: SourceKind,
    pub url: String,
    pub store: PathBuf,
    /// Overrides the run-wide summary quota for this source.
    #[serde(default)]
    pub quota: Option<usize>,
    /// Selector for one entry of the listing (`html` only).
    #[serde(default)]
    pub item: Option<String>,
    /// Selector for the title inside an entry; the entry itself when absent.
    #[serde(default)]
    pub title: Option<String>,
    /// Selector for the link element inside an entry; the entry itself when absent.
    #[serde(default)]
    pub link: Option<String>,
    /// Attribute holding the link URL.
    #[serde(default = "default_link_attr")]
    pub link_attr: String,
    /// Selector for the displayed publication date.
    #[serde(default)]
    pub date: Option<String>,
    /// Passthrough fields attached to every item of this source.
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub sources: Vec<SourceSpec>,
}

impl Catalog {
    /// Read and validate the catalog at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        let catalog = Self::parse(&raw)?;
        info!(sources = catalog.sources.len(), "Loaded source catalog");
        Ok(catalog)
    }

    /// Parse and validate catalog YAML.
    pub fn parse(raw: &str) -> Result<Self> {
        let catalog: Catalog =
            serde_yaml::from_str(raw).map_err(|e| Error::Config(format!("invalid catalog: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        let mut stores = HashSet::new();
        for spec in &self.sources {
            if spec.organization.trim().is_empty() {
                return Err(Error::Config(format!("source {} has no organization", spec.url)));
            }
            if spec.kind == SourceKind::Html && spec.item.is_none() {
                return Err(Error::Config(format!(
                    "html source {} needs an `item` selector",
                    spec.organization
                )));
            }
            if !stores.insert(&spec.store) {
                return Err(Error::Config(format!(
                    "store {} is shared by more than one source",
                    spec.store.display()
                )));
            }
        }
        Ok(())
    }
}
