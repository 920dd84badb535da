//! Incremental collection pipeline shared by every source.
//!
//! A source only has to say what its listing currently shows (a
//! [`Listing`]). [`IncrementalSource`] turns that into the fetch-and-persist
//! step of a run:
//!
//! 1. load the source's store
//! 2. drop candidates whose title is already stored (or repeated in the batch)
//! 3. resolve each new item's content; items without content are skipped
//! 4. summarize while the per-source quota allows
//! 5. append accepted items to the store and save it once
//!
//! Persisting per source means a failure later in the run never loses the
//! items already collected by earlier sources.

use crate::error::Result;
use crate::models::CollectedItem;
use crate::novelty::{dedup_batch, filter_new};
use crate::resolver::ContentResolver;
use crate::store::ItemStore;
use crate::summarize::{SummaryGate, should_summarize};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

/// Everything a source needs from the run it is part of.
///
/// Built once per run and handed to each source by reference, so every item
/// of a run carries the same `collected_at` value.
pub struct RunContext {
    /// Collection timestamp shared by all items of this run.
    pub collected_at: String,
    /// Default number of items per source eligible for summarization.
    pub quota: usize,
    /// HTTP access for listings and content.
    pub resolver: ContentResolver,
    /// Summarization collaborator.
    pub summaries: SummaryGate,
}

/// One independent producer of collected items.
#[async_trait(?Send)]
pub trait Source {
    /// Organization name used in logs and on every produced item.
    fn organization(&self) -> &str;

    /// Produce this run's new items. Implementations persist what they
    /// return before returning it.
    async fn fetch(&self, ctx: &RunContext) -> Result<Vec<CollectedItem>>;
}

/// What a source's listing page or feed currently shows.
#[async_trait(?Send)]
pub trait Listing {
    fn organization(&self) -> &str;

    /// Candidate items in listing order, without summaries.
    async fn list(&self, ctx: &RunContext) -> Result<Vec<CollectedItem>>;
}

/// A [`Listing`] bound to its store and summary quota.
pub struct IncrementalSource<L> {
    listing: L,
    store: ItemStore,
    quota: Option<usize>,
}

impl<L: Listing> IncrementalSource<L> {
    /// `quota` overrides the run default when set.
    pub fn new(listing: L, store: ItemStore, quota: Option<usize>) -> Self {
        Self {
            listing,
            store,
            quota,
        }
    }
}

#[async_trait(?Send)]
impl<L: Listing> Source for IncrementalSource<L> {
    fn organization(&self) -> &str {
        self.listing.organization()
    }

    #[instrument(level = "info", skip_all, fields(organization = %self.organization()))]
    async fn fetch(&self, ctx: &RunContext) -> Result<Vec<CollectedItem>> {
        let mut stored = self.store.load().await?;
        let candidates = self.listing.list(ctx).await?;
        let listed = candidates.len();

        let fresh = filter_new(dedup_batch(candidates), &stored);
        info!(
            listed,
            stored = stored.len(),
            fresh = fresh.len(),
            store = %self.store.path().display(),
            "Filtered listing against store"
        );

        let quota = self.quota.unwrap_or(ctx.quota);
        let mut accepted = Vec::with_capacity(fresh.len());

        for mut item in fresh {
            let content = ctx.resolver.resolve_soft(&item.link).await;
            if content.trim().is_empty() {
                warn!(title = %item.title, link = %item.link, "No content; skipping item");
                continue;
            }

            if should_summarize(accepted.len(), quota) {
                item.summary = ctx.summaries.summarize_or_empty(&item.title, &content).await;
            } else {
                debug!(title = %item.title, quota, "Quota reached; not summarizing");
            }
            item.collected_at.clone_from(&ctx.collected_at);

            stored.push(item.clone());
            accepted.push(item);
        }

        if accepted.is_empty() {
            info!("No new items");
        } else {
            self.store.save(&stored).await?;
            info!(count = accepted.len(), "Collected new items");
        }
        Ok(accepted)
    }
}
