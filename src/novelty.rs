//! Title-based novelty detection.
//!
//! An item is new when no stored item carries exactly the same title.
//! Titles are compared byte-for-byte: whitespace or punctuation variants of
//! a headline are distinct items.

use crate::models::CollectedItem;
use itertools::Itertools;
use std::collections::HashSet;

/// Return the candidates whose title does not appear in `existing`,
/// preserving candidate order.
pub fn filter_new(candidates: Vec<CollectedItem>, existing: &[CollectedItem]) -> Vec<CollectedItem> {
    let seen: HashSet<&str> = existing.iter().map(|i| i.title.as_str()).collect();
    candidates
        .into_iter()
        .filter(|c| !seen.contains(c.title.as_str()))
        .collect()
}

/// Keep only the first occurrence of each title within one batch.
pub fn dedup_batch(candidates: Vec<CollectedItem>) -> Vec<CollectedItem> {
    candidates
        .into_iter()
        .unique_by(|c| c.title.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(titles: &[&str]) -> Vec<CollectedItem> {
        titles
            .iter()
            .map(|t| CollectedItem::new("Org", *t, format!("https://example.com/{t}"), "", "ts"))
            .collect()
    }

    fn titles(items: &[CollectedItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_filters_known_titles_and_keeps_order() {
        let existing = items(&["B", "D"]);
        let out = filter_new(items(&["A", "B", "C", "D", "E"]), &existing);
        assert_eq!(titles(&out), vec!["A", "C", "E"]);
    }

    #[test]
    fn test_empty_store_passes_everything() {
        let out = filter_new(items(&["A", "B"]), &[]);
        assert_eq!(titles(&out), vec!["A", "B"]);
    }

    #[test]
    fn test_rerun_after_persisting_yields_nothing() {
        let batch = items(&["A", "B", "C"]);
        let mut store = items(&["B"]);

        let first = filter_new(batch.clone(), &store);
        store.extend(first);
        let second = filter_new(batch, &store);
        assert!(second.is_empty());
    }

    #[test]
    fn test_near_miss_titles_are_distinct() {
        let existing = items(&["Quarterly results"]);
        let out = filter_new(
            items(&["Quarterly results ", "quarterly results", "Quarterly  results"]),
            &existing,
        );
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_link_does_not_affect_novelty() {
        let existing = items(&["A"]);
        let mut candidate = items(&["A"]);
        candidate[0].link = "https://elsewhere.example/other".to_string();
        assert!(filter_new(candidate, &existing).is_empty());
    }

    #[test]
    fn test_dedup_batch_keeps_first_occurrence() {
        let mut batch = items(&["A", "B", "A", "C", "B"]);
        batch[2].link = "https://example.com/second-a".to_string();
        let out = dedup_batch(batch);
        assert_eq!(titles(&out), vec!["A", "B", "C"]);
        assert_eq!(out[0].link, "https://example.com/A");
    }
}
