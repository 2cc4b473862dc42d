//! Harvest orchestrator: fetch → map → validate → push → reconcile → delete.

use chrono::{DateTime, Utc};

use crate::config::format_timestamp;
use crate::error::Result;
use crate::mapper::map_record;
use crate::oai::RecordSource;
use crate::reconcile::{plan, PushOutcome, SyncPlan, TargetCatalog};
use crate::target::TargetRecord;
use crate::validation::{validate, RejectionReport};

/// Parameters of one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Data catalog the records are pushed to.
    pub catalog_id: String,
    /// Only harvest records changed since this time; `None` harvests all.
    pub from: Option<DateTime<Utc>>,
    /// Map and validate, but leave the target untouched.
    pub dry_run: bool,
}

/// A record the target refused or could not be reached for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub pid: String,
    pub error: String,
}

/// What a harvest run did.
#[derive(Debug, Default)]
pub struct HarvestReport {
    pub fetched: usize,
    pub skipped_non_corpus: usize,
    /// Records that passed validation, in harvest order.
    pub accepted: Vec<String>,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub rejections: RejectionReport,
    pub push_failures: Vec<SyncFailure>,
    /// `None` when reconciliation was skipped because a push failed.
    pub sync_plan: Option<SyncPlan>,
    pub deleted: Vec<String>,
    pub delete_failures: Vec<SyncFailure>,
    pub dry_run: bool,
}

impl HarvestReport {
    /// Whether every push and delete succeeded.
    pub fn is_complete(&self) -> bool {
        self.push_failures.is_empty() && self.delete_failures.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.push_failures.len() + self.delete_failures.len()
    }

    fn record_push(&mut self, outcome: PushOutcome) {
        match outcome {
            PushOutcome::Created => self.created += 1,
            PushOutcome::Updated => self.updated += 1,
            PushOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Run one harvest.
///
/// Mapping errors and validation failures only exclude the record in
/// question. Push failures are collected and the remaining records are
/// still pushed, but then no deletions are made. Fetch errors and errors
/// while listing PIDs abort the run.
pub fn run_harvest<S, T>(source: &S, target: &mut T, options: &HarvestOptions) -> Result<HarvestReport>
where
    S: RecordSource + ?Sized,
    T: TargetCatalog + ?Sized,
{
    let mut report = HarvestReport {
        dry_run: options.dry_run,
        ..HarvestReport::default()
    };

    let records = source.fetch_records(options.from.as_ref())?;
    report.fetched = records.len();

    let mut accepted: Vec<TargetRecord> = Vec::new();
    for source_record in &records {
        if !source_record.is_corpus() {
            report.skipped_non_corpus += 1;
            continue;
        }

        let mapped = match map_record(source_record, &options.catalog_id) {
            Ok(mapped) => mapped,
            Err(e) => {
                tracing::warn!(record = source_record.display_id(), error = %e, "record dropped");
                report.rejections.add_dropped(&e);
                continue;
            }
        };

        let validation = validate(&mapped.record);
        if !validation.is_valid() {
            tracing::warn!(
                pid = %validation.pid,
                rules = %validation.rule_ids(),
                "record rejected"
            );
            report.rejections.add_rejection(&validation);
            continue;
        }
        accepted.push(mapped.record);
    }
    report.accepted = accepted
        .iter()
        .map(|r| r.persistent_identifier.clone())
        .collect();

    tracing::info!(
        fetched = report.fetched,
        accepted = accepted.len(),
        rejected = report.rejections.len(),
        skipped = report.skipped_non_corpus,
        "records mapped"
    );

    if !options.dry_run {
        for record in &accepted {
            match target.upsert(record) {
                Ok(outcome) => report.record_push(outcome),
                Err(e) => {
                    tracing::error!(pid = %record.persistent_identifier, error = %e, "push failed");
                    report.push_failures.push(SyncFailure {
                        pid: record.persistent_identifier.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    if !report.push_failures.is_empty() {
        tracing::warn!(
            failed = report.push_failures.len(),
            "not reconciling deletions because some pushes failed"
        );
        return Ok(report);
    }

    let sync_plan = plan(&source.corpus_pids()?, &target.record_pids()?);
    if !options.dry_run {
        for pid in &sync_plan.to_delete {
            match target.delete(pid) {
                Ok(_) => report.deleted.push(pid.clone()),
                Err(e) => {
                    tracing::error!(pid = %pid, error = %e, "delete failed");
                    report.delete_failures.push(SyncFailure {
                        pid: pid.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }
    report.sync_plan = Some(sync_plan);

    if report.is_complete() {
        match &options.from {
            Some(from) => tracing::info!(
                "Success, records harvested since {}",
                format_timestamp(from)
            ),
            None => tracing::info!("Success, all records harvested"),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvesterError;
    use crate::reconcile::InMemoryCatalog;
    use crate::source::{ActorReference, LangString, OrganizationRef, SourceActor, SourceRecord, SourceRole};
    use crate::validation::ValidationRule;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    const CATALOG: &str = "urn:nbn:fi:att:data-catalog-kielipankki";

    struct StaticSource(Vec<SourceRecord>);

    impl RecordSource for StaticSource {
        fn fetch_records(&self, _from: Option<&DateTime<Utc>>) -> Result<Vec<SourceRecord>> {
            Ok(self.0.clone())
        }
    }

    /// Catalog that refuses one PID.
    struct FlakyCatalog {
        inner: InMemoryCatalog,
        refuse: String,
    }

    impl TargetCatalog for FlakyCatalog {
        fn record_pids(&self) -> Result<BTreeSet<String>> {
            self.inner.record_pids()
        }

        fn upsert(&mut self, record: &TargetRecord) -> Result<PushOutcome> {
            if record.persistent_identifier == self.refuse {
                return Err(HarvesterError::UnexpectedResponse("refused".to_string()));
            }
            self.inner.upsert(record)
        }

        fn delete(&mut self, pid: &str) -> Result<bool> {
            self.inner.delete(pid)
        }
    }

    fn corpus(pid: &str) -> SourceRecord {
        let helsinki = SourceActor::Organization(OrganizationRef {
            name: "University of Helsinki".to_string(),
            department: None,
        });
        SourceRecord {
            self_link: Some(format!("http://urn.fi/{pid}")),
            resource_type: Some("corpus".to_string()),
            titles: vec![LangString {
                lang: Some("en".to_string()),
                text: format!("Corpus {pid}"),
            }],
            licences: vec!["CLARIN_PUB".to_string()],
            actors: vec![
                ActorReference {
                    role: SourceRole::ResourceCreator,
                    actor: helsinki.clone(),
                },
                ActorReference {
                    role: SourceRole::DistributionRightsHolder,
                    actor: helsinki,
                },
            ],
            ..SourceRecord::default()
        }
    }

    fn options(dry_run: bool) -> HarvestOptions {
        HarvestOptions {
            catalog_id: CATALOG.to_string(),
            from: None,
            dry_run,
        }
    }

    fn seeded_catalog(pids: &[&str]) -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        for pid in pids {
            let record = map_record(&corpus(pid), CATALOG).unwrap().record;
            catalog.upsert(&record).unwrap();
        }
        catalog
    }

    #[test]
    fn test_full_sync_pushes_and_deletes() {
        let source = StaticSource(vec![
            corpus("urn:nbn:fi:lb-1"),
            corpus("urn:nbn:fi:lb-2"),
            corpus("urn:nbn:fi:lb-3"),
        ]);
        let mut target = seeded_catalog(&["urn:nbn:fi:lb-1", "urn:nbn:fi:lb-2", "urn:nbn:fi:lb-4"]);

        let report = run_harvest(&source, &mut target, &options(false)).unwrap();

        assert!(report.is_complete());
        assert_eq!((report.created, report.unchanged), (1, 2));
        assert_eq!(report.deleted, vec!["urn:nbn:fi:lb-4".to_string()]);
        assert_eq!(
            target.record_pids().unwrap(),
            BTreeSet::from([
                "urn:nbn:fi:lb-1".to_string(),
                "urn:nbn:fi:lb-2".to_string(),
                "urn:nbn:fi:lb-3".to_string()
            ])
        );
    }

    #[test]
    fn test_non_corpus_and_unmappable_records_skipped() {
        let mut tool = corpus("urn:nbn:fi:lb-5");
        tool.resource_type = Some("toolService".to_string());
        let mut broken = corpus("urn:nbn:fi:lb-6");
        broken.self_link = None;

        let source = StaticSource(vec![tool, broken, corpus("urn:nbn:fi:lb-7")]);
        let mut target = InMemoryCatalog::new();
        let report = run_harvest(&source, &mut target, &options(false)).unwrap();

        assert_eq!(report.skipped_non_corpus, 1);
        assert_eq!(report.rejections.dropped.len(), 1);
        assert_eq!(report.accepted, vec!["urn:nbn:fi:lb-7".to_string()]);
    }

    #[test]
    fn test_rejected_record_not_pushed_nor_deleted() {
        let mut no_creator = corpus("urn:nbn:fi:lb-2022001");
        no_creator
            .actors
            .retain(|a| a.role != SourceRole::ResourceCreator);

        let source = StaticSource(vec![no_creator]);
        let mut target = seeded_catalog(&["urn:nbn:fi:lb-2022001"]);
        let before = target.get("urn:nbn:fi:lb-2022001").cloned();

        let report = run_harvest(&source, &mut target, &options(false)).unwrap();

        assert_eq!(report.rejections.rejected.len(), 1);
        assert_eq!(
            report.rejections.rejected[0].rules,
            vec![ValidationRule::MissingCreator]
        );
        assert!(report.deleted.is_empty());
        assert_eq!(target.get("urn:nbn:fi:lb-2022001").cloned(), before);
    }

    #[test]
    fn test_push_failure_blocks_deletions() {
        let source = StaticSource(vec![corpus("urn:nbn:fi:lb-1"), corpus("urn:nbn:fi:lb-2")]);
        let mut target = FlakyCatalog {
            inner: seeded_catalog(&["urn:nbn:fi:lb-9"]),
            refuse: "urn:nbn:fi:lb-1".to_string(),
        };

        let report = run_harvest(&source, &mut target, &options(false)).unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.push_failures.len(), 1);
        assert_eq!(report.created, 1);
        assert!(report.sync_plan.is_none());
        assert!(target.inner.get("urn:nbn:fi:lb-9").is_some());
    }

    #[test]
    fn test_dry_run_leaves_target_untouched() {
        let source = StaticSource(vec![corpus("urn:nbn:fi:lb-1")]);
        let mut target = seeded_catalog(&["urn:nbn:fi:lb-9"]);

        let report = run_harvest(&source, &mut target, &options(true)).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.created, 0);
        assert_eq!(
            report.sync_plan.unwrap().to_delete,
            BTreeSet::from(["urn:nbn:fi:lb-9".to_string()])
        );
        assert_eq!(target.len(), 1);
        assert!(target.get("urn:nbn:fi:lb-1").is_none());
    }

    #[test]
    fn test_repeated_harvest_is_idempotent() {
        let source = StaticSource(vec![corpus("urn:nbn:fi:lb-1")]);
        let mut target = InMemoryCatalog::new();

        run_harvest(&source, &mut target, &options(false)).unwrap();
        let first = target.get("urn:nbn:fi:lb-1").cloned();
        let report = run_harvest(&source, &mut target, &options(false)).unwrap();

        assert_eq!(report.unchanged, 1);
        assert_eq!(target.get("urn:nbn:fi:lb-1").cloned(), first);
        assert_eq!(target.len(), 1);
    }
}
