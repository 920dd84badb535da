//! Source fetchers built from the catalog.
//!
//! Each catalog entry becomes an [`IncrementalSource`] around a listing of
//! the matching kind:
//!
//! | Kind | Module | Method |
//! |------|--------|--------|
//! | `html` | [`listing`] | CSS selectors over a listing page |
//! | `rss` | [`feed`] | RSS 2.0 `channel/item` entries |
//!
//! Sources share nothing but the [`RunContext`](crate::pipeline::RunContext)
//! they are given, and each owns its store file.

pub mod feed;
pub mod listing;

use crate::config::{Catalog, SourceKind, SourceSpec};
use crate::error::Result;
use crate::pipeline::{IncrementalSource, Source};
use crate::store::ItemStore;
use feed::FeedListing;
use listing::HtmlListing;
use tracing::debug;

/// Build one source from a catalog entry.
pub fn from_spec(spec: &SourceSpec) -> Result<Box<dyn Source>> {
    let store = ItemStore::new(&spec.store);
    debug!(organization = %spec.organization, kind = ?spec.kind, store = %spec.store.display(), "Building source");
    let source: Box<dyn Source> = match spec.kind {
        SourceKind::Html => Box::new(IncrementalSource::new(HtmlListing::from_spec(spec)?, store, spec.quota)),
        SourceKind::Rss => Box::new(IncrementalSource::new(FeedListing::from_spec(spec), store, spec.quota)),
    };
    Ok(source)
}

/// Build every source of the catalog, in catalog order.
pub fn from_catalog(catalog: &Catalog) -> Result<Vec<Box<dyn Source>>> {
    catalog.sources.iter().map(from_spec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_catalog_keeps_order() {
        let raw = "sources:\n  - {organization: B, kind: rss, url: 'https://b', store: b.json}\n  - {organization: A, kind: html, url: 'https://a', store: a.json, item: li}\n";
        let sources = from_catalog(&Catalog::parse(raw).unwrap()).unwrap();
        let orgs: Vec<&str> = sources.iter().map(|s| s.organization()).collect();
        assert_eq!(orgs, vec!["B", "A"]);
    }

    #[test]
    fn test_bad_selector_fails_build() {
        let raw = "sources:\n  - {organization: A, kind: html, url: 'https://a', store: a.json, item: 'li[['}\n";
        assert!(from_catalog(&Catalog::parse(raw).unwrap()).is_err());
    }
}
