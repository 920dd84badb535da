//! Runs every source of a run and produces the CSV snapshot.
//!
//! Sources are fetched one after another in catalog order. A failing source
//! is logged and contributes no items; it never stops the sources after it.
//! The combined output is filtered by the exclusion rules once, then
//! exported.

use crate::error::Result;
use crate::exclusion::{ExclusionRules, filter_excluded};
use crate::models::CollectedItem;
use crate::outputs::tabular;
use crate::pipeline::{RunContext, Source};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use tracing::{error, info, instrument};

/// How one source fared in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Collected(usize),
    Failed(String),
}

/// Summary of a finished run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Outcome per organization, in fetch order.
    pub sources: Vec<(String, SourceOutcome)>,
    /// Items dropped by the exclusion rules.
    pub excluded: usize,
    /// Items written to the export.
    pub exported: usize,
    /// The CSV file, when anything was exported.
    pub export_path: Option<PathBuf>,
}

impl RunReport {
    pub fn failed_sources(&self) -> usize {
        self.sources
            .iter()
            .filter(|(_, o)| matches!(o, SourceOutcome::Failed(_)))
            .count()
    }
}

pub struct Orchestrator {
    sources: Vec<Box<dyn Source>>,
    rules: ExclusionRules,
    output_dir: PathBuf,
    excel_bom: bool,
}

impl Orchestrator {
    pub fn new(sources: Vec<Box<dyn Source>>, rules: ExclusionRules, output_dir: PathBuf, excel_bom: bool) -> Self {
        Self {
            sources,
            rules,
            output_dir,
            excel_bom,
        }
    }

    /// Fetch every source, then filter and export the combined items.
    ///
    /// Only the export step can fail the run; by then every source has
    /// already persisted its own items.
    #[instrument(level = "info", skip_all, fields(collected_at = %ctx.collected_at, sources = self.sources.len()))]
    pub async fn run(&self, ctx: &RunContext) -> Result<RunReport> {
        let mut report = RunReport::default();

        let results: Vec<(String, Result<Vec<CollectedItem>>)> = stream::iter(self.sources.iter())
            .then(move |source| async move { (source.organization().to_string(), source.fetch(ctx).await) })
            .collect()
            .await;

        let mut collected = Vec::new();
        for (organization, result) in results {
            match result {
                Ok(items) => {
                    info!(%organization, count = items.len(), "Source finished");
                    report.sources.push((organization, SourceOutcome::Collected(items.len())));
                    collected.extend(items);
                }
                Err(e) => {
                    error!(%organization, error = %e, "Source failed; continuing with the next one");
                    report.sources.push((organization, SourceOutcome::Failed(e.to_string())));
                }
            }
        }

        let total = collected.len();
        let kept = filter_excluded(collected, &self.rules);
        report.excluded = total - kept.len();
        info!(total, excluded = report.excluded, "Applied exclusion rules");

        let path = tabular::export_path(&self.output_dir, &ctx.collected_at);
        report.export_path = tabular::export(&kept, &path, self.excel_bom)?;
        report.exported = if report.export_path.is_some() { kept.len() } else { 0 };

        info!(
            exported = report.exported,
            failed_sources = report.failed_sources(),
            "Run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pipeline::tests::context;
    use async_trait::async_trait;

    struct Canned {
        organization: &'static str,
        titles: Vec<&'static str>,
    }

    #[async_trait(?Send)]
    impl Source for Canned {
        fn organization(&self) -> &str {
            self.organization
        }

        async fn fetch(&self, ctx: &RunContext) -> Result<Vec<CollectedItem>> {
            Ok(self
                .titles
                .iter()
                .map(|t| CollectedItem::new(self.organization, *t, format!("https://x/{t}"), "", &ctx.collected_at))
                .collect())
        }
    }

    struct Broken;

    #[async_trait(?Send)]
    impl Source for Broken {
        fn organization(&self) -> &str {
            "Broken"
        }

        async fn fetch(&self, _ctx: &RunContext) -> Result<Vec<CollectedItem>> {
            Err(Error::listing("https://broken.example", "HTTP 500"))
        }
    }

    fn canned(organization: &'static str, titles: &[&'static str]) -> Box<dyn Source> {
        Box::new(Canned {
            organization,
            titles: titles.to_vec(),
        })
    }

    fn read_titles(path: &std::path::Path) -> Vec<(String, String)> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.records()
            .map(|r| {
                let r = r.unwrap();
                (r[2].to_string(), r[3].to_string())
            })
            .collect()
    }

    #[tokio::test]
    async fn test_failed_source_does_not_stop_the_run() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            vec![canned("OrgA", &["a1", "a2"]), Box::new(Broken), canned("OrgB", &["b1"])],
            ExclusionRules::default(),
            tmp.path().to_path_buf(),
            false,
        );

        let report = orchestrator.run(&context(0)).await.unwrap();
        assert_eq!(report.failed_sources(), 1);
        assert_eq!(report.sources[0], ("OrgA".to_string(), SourceOutcome::Collected(2)));
        assert!(matches!(report.sources[1].1, SourceOutcome::Failed(_)));
        assert_eq!(report.exported, 3);

        let rows = read_titles(report.export_path.as_deref().unwrap());
        let expected: Vec<(String, String)> = [("OrgA", "a1"), ("OrgA", "a2"), ("OrgB", "b1")]
            .iter()
            .map(|(o, t)| (o.to_string(), t.to_string()))
            .collect();
        assert_eq!(rows, expected);
    }

    #[tokio::test]
    async fn test_exclusions_apply_to_the_aggregate() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            vec![
                canned("OrgA", &["contains X", "contains Y", "plain"]),
                canned("OrgB", &["contains Y"]),
            ],
            ExclusionRules::from_pairs([("all", "X"), ("OrgA", "Y")]),
            tmp.path().to_path_buf(),
            false,
        );

        let report = orchestrator.run(&context(0)).await.unwrap();
        assert_eq!(report.excluded, 2);
        let rows = read_titles(report.export_path.as_deref().unwrap());
        assert_eq!(
            rows,
            vec![
                ("OrgA".to_string(), "plain".to_string()),
                ("OrgB".to_string(), "contains Y".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_nothing_new_writes_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            vec![canned("OrgA", &[])],
            ExclusionRules::default(),
            tmp.path().to_path_buf(),
            false,
        );

        let report = orchestrator.run(&context(0)).await.unwrap();
        assert_eq!(report.export_path, None);
        assert_eq!(report.exported, 0);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_export_failure_is_returned() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            vec![canned("OrgA", &["a1"])],
            ExclusionRules::default(),
            tmp.path().join("does/not/exist"),
            false,
        );
        let err = orchestrator.run(&context(0)).await.unwrap_err();
        assert!(matches!(err, Error::ExportWrite { .. }));
    }
}
