//! Strategy-driven routing of records into create/update/delete buckets

use crate::store::RelationshipStore;
use crate::Result;
use relimport_core::{ImportStrategy, Relationship};
use tracing::{debug, warn};

/// Mutation a record is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Create,
    Update,
    Delete,
}

/// Records grouped by mutation, each group in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    pub create: Vec<Relationship>,
    pub update: Vec<Relationship>,
    pub delete: Vec<Relationship>,
}

impl Buckets {
    pub fn push(&mut self, bucket: Bucket, record: Relationship) {
        match bucket {
            Bucket::Create => self.create.push(record),
            Bucket::Update => self.update.push(record),
            Bucket::Delete => self.delete.push(record),
        }
    }

    pub fn len(&self) -> usize {
        self.create.len() + self.update.len() + self.delete.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Create-or-update decision from what is known about a record's identifier.
///
/// `existing` is `None` when the record has no identifier; the existence check
/// is never consulted in that case.
pub fn route(existing: Option<bool>) -> Bucket {
    match existing {
        None | Some(false) => Bucket::Create,
        Some(true) => Bucket::Update,
    }
}

/// Sorts records into buckets, consulting the store's existence check for
/// strategies that depend on it.
pub struct StrategyClassifier<'a, S> {
    store: &'a S,
}

impl<'a, S: RelationshipStore> StrategyClassifier<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create or update, for `CreateAndUpdate` and `Sync`
    pub async fn classify(&self, record: &Relationship) -> Result<Bucket> {
        let existing = match record.uid() {
            None => None,
            Some(uid) => Some(self.store.relationship_exists(uid).await?),
        };
        Ok(route(existing))
    }

    /// Partition `records` according to `strategy`
    pub async fn partition(&self, strategy: ImportStrategy, records: Vec<Relationship>) -> Result<Buckets> {
        let mut buckets = Buckets::default();

        match strategy {
            ImportStrategy::Create => buckets.create = records,
            ImportStrategy::Update => buckets.update = records,
            ImportStrategy::Delete => buckets.delete = records,
            ImportStrategy::CreateAndUpdate | ImportStrategy::Sync => {
                for record in records {
                    let bucket = self.classify(&record).await?;
                    buckets.push(bucket, record);
                }
            }
            ImportStrategy::Unspecified => {
                warn!("No import strategy given, {} records ignored", records.len());
            }
        }

        debug!(
            "Partitioned into create={} update={} delete={}",
            buckets.create.len(),
            buckets.update.len(),
            buckets.delete.len()
        );

        Ok(buckets)
    }
}
