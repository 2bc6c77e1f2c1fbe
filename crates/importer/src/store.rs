//! Downstream collaborators and the SurrealDB-backed reference store

use crate::Result;
use relimport_core::{
    ImportConflict, ImportCount, ImportOptions, ImportSummaries, ImportSummary, Relationship,
    RelationshipItem, User,
};
use relimport_db::{RelationshipRow, Repository};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Persistence operations an import is dispatched to
///
/// Batch methods return one summary per input record, in input order. A record
/// that fails business validation yields an error summary; `Err` is reserved
/// for failures that make the whole store unusable.
#[allow(async_fn_in_trait)]
pub trait RelationshipStore: Send + Sync {
    /// True iff a relationship with this uid is currently stored
    async fn relationship_exists(&self, uid: &str) -> Result<bool>;

    async fn create_relationships(
        &self,
        records: Vec<Relationship>,
        options: &ImportOptions,
    ) -> Result<ImportSummaries>;

    async fn update_relationships(
        &self,
        records: Vec<Relationship>,
        options: &ImportOptions,
    ) -> Result<ImportSummaries>;

    async fn delete_relationships(
        &self,
        records: Vec<Relationship>,
        options: &ImportOptions,
    ) -> Result<ImportSummaries>;

    async fn update_relationship(
        &self,
        record: Relationship,
        options: &ImportOptions,
    ) -> Result<ImportSummary>;
}

/// Ambient session lookup used when options carry no user
pub trait CurrentUserProvider: Send + Sync {
    fn current_user(&self) -> Option<User>;
}

/// Business checks applied before a record is written
pub fn validate(record: &Relationship) -> Vec<ImportConflict> {
    let mut conflicts = Vec::new();

    if record.relationship_type.is_none() {
        conflicts.push(ImportConflict::new("relationshipType", "Relationship type is required"));
    }

    let from = check_item("from", record.from.as_ref(), &mut conflicts);
    let to = check_item("to", record.to.as_ref(), &mut conflicts);

    if let (Some(from), Some(to)) = (from, to) {
        if from == to {
            conflicts.push(ImportConflict::new(
                "to",
                format!("Relationship cannot link {} {} to itself", from.0, from.1),
            ));
        }
    }

    conflicts
}

fn check_item<'a>(
    side: &str,
    item: Option<&'a RelationshipItem>,
    conflicts: &mut Vec<ImportConflict>,
) -> Option<(relimport_core::ItemKind, &'a str)> {
    let Some(item) = item else {
        conflicts.push(ImportConflict::new(side, format!("Missing '{}' item", side)));
        return None;
    };

    let reference = item.reference();
    if reference.is_none() {
        conflicts.push(ImportConflict::new(
            side,
            "Item must reference exactly one of trackedEntityInstance, enrollment or event",
        ));
    }
    reference
}

/// Identifier for records submitted without one
pub fn generate_uid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Reference store writing to the relationship repository
#[derive(Clone)]
pub struct RepositoryStore {
    repo: Repository,
}

impl RepositoryStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// `batch_uids` holds the uids already created earlier in the same batch,
    /// which a dry run never writes.
    async fn create_one(
        &self,
        record: Relationship,
        options: &ImportOptions,
        batch_uids: &mut HashSet<String>,
    ) -> Result<ImportSummary> {
        if let Some(uid) = record.uid() {
            if batch_uids.contains(uid) || self.repo.relationship_exists(uid).await? {
                return Ok(ImportSummary::error(format!("Relationship {} already exists", uid))
                    .with_reference(uid)
                    .with_conflict(ImportConflict::new(uid, "Relationship already exists")));
            }
        }

        let conflicts = validate(&record);
        if !conflicts.is_empty() {
            return Ok(invalid(&record, conflicts));
        }

        let uid = record.uid().map(str::to_string).unwrap_or_else(generate_uid);
        if options.dry_run {
            debug!("Dry run, skipping create of {}", uid);
        } else {
            let row = RelationshipRow::from_record(&record, uid.clone(), options.username());
            self.repo.create_relationship(row).await?;
        }

        batch_uids.insert(uid.clone());
        Ok(ImportSummary::success(ImportCount::imported()).with_reference(uid))
    }

    async fn update_existing(&self, record: Relationship, options: &ImportOptions) -> Result<ImportSummary> {
        let Some(uid) = record.uid().map(str::to_string) else {
            return Ok(ImportSummary::error("Relationship uid is required for update")
                .with_conflict(ImportConflict::new("relationship", "Missing uid")));
        };

        let Some(existing) = self.repo.get_relationship(&uid).await? else {
            return Ok(ImportSummary::error(format!("Relationship {} does not exist", uid))
                .with_reference(uid.as_str())
                .with_conflict(ImportConflict::new(uid.as_str(), "Relationship does not exist")));
        };

        let conflicts = validate(&record);
        if !conflicts.is_empty() {
            return Ok(invalid(&record, conflicts));
        }

        if options.dry_run {
            debug!("Dry run, skipping update of {}", uid);
        } else {
            let row = existing.apply_update(&record, options.username());
            self.repo.update_relationship(row).await?;
        }

        Ok(ImportSummary::success(ImportCount::updated()).with_reference(uid))
    }

    async fn delete_one(&self, record: Relationship, options: &ImportOptions) -> Result<ImportSummary> {
        let Some(uid) = record.uid().map(str::to_string) else {
            return Ok(ImportSummary::error("Relationship uid is required for delete")
                .with_conflict(ImportConflict::new("relationship", "Missing uid")));
        };

        let removed = if options.dry_run {
            self.repo.relationship_exists(&uid).await?
        } else {
            self.repo.delete_relationship(&uid).await?.is_some()
        };

        if !removed {
            return Ok(ImportSummary::error(format!("Relationship {} cannot be deleted as it is not present", uid))
                .with_reference(uid.as_str())
                .with_conflict(ImportConflict::new(uid.as_str(), "Relationship does not exist")));
        }

        Ok(ImportSummary::success(ImportCount::deleted()).with_reference(uid))
    }
}

fn invalid(record: &Relationship, conflicts: Vec<ImportConflict>) -> ImportSummary {
    let summary = ImportSummary::error("Relationship is invalid").with_conflicts(conflicts);
    match record.uid() {
        Some(uid) => summary.with_reference(uid),
        None => summary,
    }
}

impl RelationshipStore for RepositoryStore {
    async fn relationship_exists(&self, uid: &str) -> Result<bool> {
        Ok(self.repo.relationship_exists(uid).await?)
    }

    #[instrument(skip(self, records, options), fields(count = records.len()))]
    async fn create_relationships(
        &self,
        records: Vec<Relationship>,
        options: &ImportOptions,
    ) -> Result<ImportSummaries> {
        let mut summaries = ImportSummaries::new();
        let mut batch_uids = HashSet::new();
        for record in records {
            summaries.add_import_summary(self.create_one(record, options, &mut batch_uids).await?);
        }
        info!("Created {} of {} relationships", summaries.imported, summaries.len());
        Ok(summaries)
    }

    #[instrument(skip(self, records, options), fields(count = records.len()))]
    async fn update_relationships(
        &self,
        records: Vec<Relationship>,
        options: &ImportOptions,
    ) -> Result<ImportSummaries> {
        let mut summaries = ImportSummaries::new();
        for record in records {
            summaries.add_import_summary(self.update_existing(record, options).await?);
        }
        info!("Updated {} of {} relationships", summaries.updated, summaries.len());
        Ok(summaries)
    }

    #[instrument(skip(self, records, options), fields(count = records.len()))]
    async fn delete_relationships(
        &self,
        records: Vec<Relationship>,
        options: &ImportOptions,
    ) -> Result<ImportSummaries> {
        let mut summaries = ImportSummaries::new();
        for record in records {
            summaries.add_import_summary(self.delete_one(record, options).await?);
        }
        info!("Deleted {} of {} relationships", summaries.deleted, summaries.len());
        Ok(summaries)
    }

    #[instrument(skip(self, record, options))]
    async fn update_relationship(
        &self,
        record: Relationship,
        options: &ImportOptions,
    ) -> Result<ImportSummary> {
        self.update_existing(record, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relimport_core::ItemKind;

    fn linked(kind: &str) -> Relationship {
        Relationship::new(kind).between(
            RelationshipItem::tracked_entity_instance("TEI_A"),
            RelationshipItem::enrollment("ENR_B"),
        )
    }

    #[test]
    fn test_valid_record_has_no_conflicts() {
        assert!(validate(&linked("mother-child")).is_empty());
    }

    #[test]
    fn test_missing_type_and_items() {
        let conflicts = validate(&Relationship::default());
        let objects: Vec<_> = conflicts.iter().map(|c| c.object.as_str()).collect();
        assert_eq!(objects, vec!["relationshipType", "from", "to"]);
    }

    #[test]
    fn test_ambiguous_item() {
        let mut record = linked("x");
        record.from = Some(RelationshipItem {
            tracked_entity_instance: Some("A".into()),
            event: Some("E".into()),
            ..RelationshipItem::default()
        });

        let conflicts = validate(&record);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].object, "from");
    }

    #[test]
    fn test_self_link() {
        let record = Relationship::new("x").between(
            RelationshipItem::event("EVT"),
            RelationshipItem::event("EVT"),
        );
        let conflicts = validate(&record);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].value.contains(&ItemKind::Event.to_string()));
    }

    #[test]
    fn test_generated_uids_are_unique() {
        assert_ne!(generate_uid(), generate_uid());
        assert_eq!(generate_uid().len(), 32);
    }
}
