//! Selector-driven HTML listing pages.
//!
//! A listing page shows one entry per announcement. Each entry is located
//! with the `item` selector; its title, link and date are read from
//! elements inside it. Relative links are resolved against the page URL.

use crate::config::SourceSpec;
use crate::error::{Error, Result};
use crate::models::CollectedItem;
use crate::pipeline::{Listing, RunContext};
use crate::resolver::collapse_whitespace;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};
use url::Url;

#[derive(Debug)]
pub struct HtmlListing {
    organization: String,
    url: Url,
    item: Selector,
    title: Option<Selector>,
    link: Option<Selector>,
    link_attr: String,
    date: Option<Selector>,
    extra: BTreeMap<String, Value>,
}

fn selector(organization: &str, css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| Error::Config(format!("{organization}: invalid selector {css:?}: {e}")))
}

fn optional_selector(organization: &str, css: Option<&str>) -> Result<Option<Selector>> {
    css.map(|css| selector(organization, css)).transpose()
}

impl HtmlListing {
    /// Compile the selectors of a catalog entry.
    pub fn from_spec(spec: &SourceSpec) -> Result<Self> {
        let org = spec.organization.as_str();
        let url = Url::parse(&spec.url)
            .map_err(|e| Error::Config(format!("{org}: invalid url {}: {e}", spec.url)))?;
        let item_css = spec
            .item
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{org}: missing item selector")))?;

        Ok(Self {
            organization: spec.organization.clone(),
            url,
            item: selector(org, item_css)?,
            title: optional_selector(org, spec.title.as_deref())?,
            link: optional_selector(org, spec.link.as_deref())?,
            link_attr: spec.link_attr.clone(),
            date: optional_selector(org, spec.date.as_deref())?,
            extra: spec.extra.clone(),
        })
    }

    /// Extract candidate items from a listing page's HTML.
    pub fn parse_page(&self, html: &str, collected_at: &str) -> Vec<CollectedItem> {
        let document = Html::parse_document(html);
        let mut items = Vec::new();

        for entry in document.select(&self.item) {
            let title = self
                .pick(entry, self.title.as_ref())
                .map(element_text)
                .unwrap_or_default();
            if title.is_empty() {
                debug!("Entry without title; skipping");
                continue;
            }

            let href = self
                .pick(entry, self.link.as_ref())
                .and_then(|el| el.value().attr(&self.link_attr))
                .map(str::trim)
                .filter(|h| !h.is_empty() && !h.starts_with("javascript:"));
            let Some(link) = href.and_then(|h| self.url.join(h).ok()) else {
                warn!(%title, "Entry without usable link; skipping");
                continue;
            };

            let published = self
                .date
                .as_ref()
                .and_then(|sel| entry.select(sel).next())
                .map(element_text)
                .unwrap_or_default();

            let mut item = CollectedItem::new(&self.organization, title, link, published, collected_at);
            item.extra.extend(self.extra.clone());
            items.push(item);
        }
        items
    }

    fn pick<'a>(&self, entry: ElementRef<'a>, sel: Option<&Selector>) -> Option<ElementRef<'a>> {
        match sel {
            Some(sel) => entry.select(sel).next(),
            None => Some(entry),
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

#[async_trait(?Send)]
impl Listing for HtmlListing {
    fn organization(&self) -> &str {
        &self.organization
    }

    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    async fn list(&self, ctx: &RunContext) -> Result<Vec<CollectedItem>> {
        let (html, _) = ctx
            .resolver
            .get_text(self.url.as_str())
            .await
            .map_err(|e| Error::listing(self.url.as_str(), e))?;
        let items = self.parse_page(&html, &ctx.collected_at);
        info!(count = items.len(), "Parsed listing page");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Catalog;
    use crate::pipeline::tests::context;
    use crate::testing::{Route, serve};

    const PAGE: &str = r#"<html><body>
        <ul class="board">
          <li><a class="subject" href="/news/view?id=3">  Premium
               adjustment notice </a><span class="date">2025.05.06</span></li>
          <li><a class="subject" href="https://cdn.example.com/files/rates.pdf">Rate table</a></li>
          <li><a class="subject" href="javascript:void(0)">Popup only</a></li>
          <li><span class="date">2025.05.01</span></li>
        </ul></body></html>"#;

    fn spec(url: &str) -> SourceSpec {
        let raw = format!(
            "sources:\n  - organization: Example Mutual\n    kind: html\n    url: {url}\n    store: s.json\n    item: 'ul.board li'\n    title: a.subject\n    link: a.subject\n    date: span.date\n    extra: {{label: press}}\n"
        );
        Catalog::parse(&raw).unwrap().sources.remove(0)
    }

    #[test]
    fn test_parse_page_extracts_entries() {
        let listing = HtmlListing::from_spec(&spec("https://example.com/news/list")).unwrap();
        let items = listing.parse_page(PAGE, "ts");

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Premium adjustment notice");
        assert_eq!(items[0].link, "https://example.com/news/view?id=3");
        assert_eq!(items[0].published, "2025.05.06");
        assert_eq!(items[0].organization, "Example Mutual");
        assert_eq!(items[0].collected_at, "ts");
        assert_eq!(items[0].extra.get("label"), Some(&Value::from("press")));

        assert_eq!(items[1].link, "https://cdn.example.com/files/rates.pdf");
        assert_eq!(items[1].published, "");
    }

    #[test]
    fn test_entry_can_be_its_own_link() {
        let raw = "sources:\n  - {organization: A, kind: html, url: 'https://a.example/', store: a.json, item: 'a.card'}\n";
        let spec = Catalog::parse(raw).unwrap().sources.remove(0);
        let listing = HtmlListing::from_spec(&spec).unwrap();
        let items = listing.parse_page(r#"<a class="card" href="p/1">One</a><a class="card" href="p/2">Two</a>"#, "ts");
        let links: Vec<&str> = items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(links, vec!["https://a.example/p/1", "https://a.example/p/2"]);
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let mut spec = spec("https://example.com/");
        spec.title = Some("a[".to_string());
        assert!(matches!(HtmlListing::from_spec(&spec), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_list_fetches_page() {
        let base = serve(vec![("/news/list", Route::html(PAGE))]).await;
        let listing = HtmlListing::from_spec(&spec(&format!("{base}/news/list"))).unwrap();
        let items = listing.list(&context(0)).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].link, format!("{base}/news/view?id=3"));
    }

    #[tokio::test]
    async fn test_unreachable_listing_is_listing_error() {
        let base = serve(vec![]).await;
        let listing = HtmlListing::from_spec(&spec(&format!("{base}/gone"))).unwrap();
        let err = listing.list(&context(0)).await.unwrap_err();
        assert!(matches!(err, Error::Listing { .. }));
    }
}
