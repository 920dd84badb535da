//! Keyword exclusion over the aggregated run output.
//!
//! Rules come from a CSV file with the columns `organization` and
//! `exception_keyword`. Several rows may share an organization. The
//! organization `all` applies to every item. An item is dropped when any
//! applicable keyword occurs in its title (case-sensitive substring).

use crate::error::{Error, Result};
use crate::models::CollectedItem;
use itertools::Itertools;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Organization value that applies a keyword to every source.
pub const WILDCARD: &str = "all";

#[derive(Debug, Deserialize)]
struct RuleRow {
    organization: String,
    exception_keyword: String,
}

/// Exclusion keywords grouped by organization.
#[derive(Debug, Default, Clone)]
pub struct ExclusionRules {
    global: Vec<String>,
    by_organization: HashMap<String, Vec<String>>,
}

impl ExclusionRules {
    /// Load rules from `path`. A missing file means no exclusions.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No exclusion file; nothing will be excluded");
            return Ok(Self::default());
        }
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Config(format!("opening {}: {e}", path.display())))?;
        let rules = Self::from_reader(file)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        info!(
            global = rules.global.len(),
            organizations = rules.by_organization.len(),
            "Loaded exclusion rules"
        );
        Ok(rules)
    }

    /// Parse rules from CSV text with a header row.
    pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let rows = rdr
            .deserialize::<RuleRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::from_pairs(
            rows.into_iter().map(|r| (r.organization, r.exception_keyword)),
        ))
    }

    /// Build rules from `(organization, keyword)` pairs. Blank keywords are ignored.
    pub fn from_pairs<I, O, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (O, K)>,
        O: Into<String>,
        K: Into<String>,
    {
        let mut grouped = pairs
            .into_iter()
            .map(|(o, k)| -> (String, String) { (o.into(), k.into()) })
            .filter(|(_, k)| !k.trim().is_empty())
            .into_group_map();
        let global = grouped.remove(WILDCARD).unwrap_or_default();
        Self {
            global,
            by_organization: grouped,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.by_organization.is_empty()
    }

    /// The first keyword that excludes `item`, if any.
    pub fn matching_keyword(&self, item: &CollectedItem) -> Option<&str> {
        let own = self
            .by_organization
            .get(&item.organization)
            .map(Vec::as_slice)
            .unwrap_or_default();
        self.global
            .iter()
            .chain(own)
            .find(|kw| item.title.contains(kw.as_str()))
            .map(String::as_str)
    }
}

/// Drop every item matched by `rules`, logging each removal.
pub fn filter_excluded(items: Vec<CollectedItem>, rules: &ExclusionRules) -> Vec<CollectedItem> {
    if rules.is_empty() {
        debug!("No exclusion rules; keeping all items");
        return items;
    }
    items
        .into_iter()
        .filter(|item| match rules.matching_keyword(item) {
            Some(keyword) => {
                info!(organization = %item.organization, title = %item.title, %keyword, "Excluded item");
                false
            }
            None => true,
        })
        .collect()
}
