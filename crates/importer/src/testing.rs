//! In-memory store double for unit tests

use crate::store::RelationshipStore;
use crate::{ImportError, Result};
use relimport_core::{
    ImportConflict, ImportCount, ImportOptions, ImportSummaries, ImportSummary, Relationship,
};
use std::collections::HashSet;
use std::sync::Mutex;

/// Records every call; fails a bucket on demand
#[derive(Default)]
pub struct MockStore {
    existing: HashSet<String>,
    /// Uids whose mutation yields a conflict summary
    rejected: HashSet<String>,
    fail_on: Option<&'static str>,
    calls: Mutex<Vec<(&'static str, Vec<Option<String>>)>>,
    checks: Mutex<Vec<String>>,
}

impl MockStore {
    pub fn with_existing(uids: &[&str]) -> Self {
        Self {
            existing: uids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn rejecting(mut self, uids: &[&str]) -> Self {
        self.rejected = uids.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Make the named bucket ("create", "update", "delete") return `Err`
    pub fn failing_on(mut self, bucket: &'static str) -> Self {
        self.fail_on = Some(bucket);
        self
    }

    pub fn calls(&self) -> Vec<(&'static str, Vec<Option<String>>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn existence_checks(&self) -> Vec<String> {
        self.checks.lock().unwrap().clone()
    }

    fn record(
        &self,
        bucket: &'static str,
        records: Vec<Relationship>,
        count: ImportCount,
    ) -> Result<ImportSummaries> {
        self.calls
            .lock()
            .unwrap()
            .push((bucket, records.iter().map(|r| r.relationship.clone()).collect()));

        if self.fail_on == Some(bucket) {
            return Err(ImportError::Store(format!("{} bucket unavailable", bucket)));
        }

        Ok(records.iter().map(|r| self.summarize(r, count)).collect())
    }

    fn summarize(&self, record: &Relationship, count: ImportCount) -> ImportSummary {
        let reference = record
            .uid()
            .map(str::to_string)
            .or_else(|| record.relationship_type.clone())
            .unwrap_or_default();

        if self.rejected.contains(&reference) {
            ImportSummary::error("rejected")
                .with_reference(reference.as_str())
                .with_conflict(ImportConflict::new(reference.as_str(), "rejected"))
        } else {
            ImportSummary::success(count).with_reference(reference)
        }
    }
}

impl RelationshipStore for MockStore {
    async fn relationship_exists(&self, uid: &str) -> Result<bool> {
        self.checks.lock().unwrap().push(uid.to_string());
        Ok(self.existing.contains(uid))
    }

    async fn create_relationships(&self, records: Vec<Relationship>, _: &ImportOptions) -> Result<ImportSummaries> {
        self.record("create", records, ImportCount::imported())
    }

    async fn update_relationships(&self, records: Vec<Relationship>, _: &ImportOptions) -> Result<ImportSummaries> {
        self.record("update", records, ImportCount::updated())
    }

    async fn delete_relationships(&self, records: Vec<Relationship>, _: &ImportOptions) -> Result<ImportSummaries> {
        self.record("delete", records, ImportCount::deleted())
    }

    async fn update_relationship(&self, record: Relationship, _: &ImportOptions) -> Result<ImportSummary> {
        let summaries = self.record("update_one", vec![record], ImportCount::updated())?;
        summaries
            .into_iter()
            .next()
            .ok_or_else(|| ImportError::Store("no summary".into()))
    }
}
