//! Sync reconciler: which records to push and which to delete.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::Result;
use crate::target::TargetRecord;

/// The actions needed to make the target mirror the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Every PID present at the source.
    pub to_push: BTreeSet<String>,
    /// PIDs present in the target but gone from the source.
    pub to_delete: BTreeSet<String>,
}

impl SyncPlan {
    pub fn is_noop(&self) -> bool {
        self.to_push.is_empty() && self.to_delete.is_empty()
    }
}

/// Diff source and target PID sets.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
/// use kielipankki_harvester::reconcile::plan;
///
/// let source: BTreeSet<String> = ["A", "B", "C"].map(String::from).into();
/// let target: BTreeSet<String> = ["A", "B", "D"].map(String::from).into();
///
/// let plan = plan(&source, &target);
/// assert_eq!(plan.to_push, source);
/// assert_eq!(plan.to_delete, BTreeSet::from(["D".to_string()]));
/// ```
pub fn plan(source_pids: &BTreeSet<String>, target_pids: &BTreeSet<String>) -> SyncPlan {
    SyncPlan {
        to_push: source_pids.clone(),
        to_delete: target_pids.difference(source_pids).cloned().collect(),
    }
}

/// What an upsert did in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Created,
    Updated,
    /// The stored record was already identical.
    Unchanged,
}

/// A catalog records are pushed to, keyed by PID.
///
/// `upsert` must be idempotent: pushing the same record twice leaves the
/// catalog in the same observable state as pushing it once.
pub trait TargetCatalog {
    /// PIDs of every record currently in the catalog.
    fn record_pids(&self) -> Result<BTreeSet<String>>;

    /// Create the record, or replace the one with the same PID.
    fn upsert(&mut self, record: &TargetRecord) -> Result<PushOutcome>;

    /// Delete the record with the given PID. Returns whether it existed.
    fn delete(&mut self, pid: &str) -> Result<bool>;
}

/// Catalog kept in memory, for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    records: BTreeMap<String, TargetRecord>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pid: &str) -> Option<&TargetRecord> {
        self.records.get(pid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TargetCatalog for InMemoryCatalog {
    fn record_pids(&self) -> Result<BTreeSet<String>> {
        Ok(self.records.keys().cloned().collect())
    }

    fn upsert(&mut self, record: &TargetRecord) -> Result<PushOutcome> {
        let outcome = match self.records.get(&record.persistent_identifier) {
            None => PushOutcome::Created,
            Some(existing) if existing == record => PushOutcome::Unchanged,
            Some(_) => PushOutcome::Updated,
        };
        self.records
            .insert(record.persistent_identifier.clone(), record.clone());
        Ok(outcome)
    }

    fn delete(&mut self, pid: &str) -> Result<bool> {
        Ok(self.records.remove(pid).is_some())
    }
}
