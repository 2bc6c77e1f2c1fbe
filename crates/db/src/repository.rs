//! Repository pattern for relationship storage

use crate::schema::RELATIONSHIP_TABLE;
use crate::{DbConnection, DbError, Result};
use chrono::{DateTime, Utc};
use relimport_core::{Relationship, RelationshipItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

/// A relationship as stored, keyed by `uid`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationshipRow {
    pub uid: String,
    pub relationship_type: Option<String>,
    pub relationship_name: Option<String>,
    #[serde(default)]
    pub bidirectional: bool,
    pub from: Option<RelationshipItem>,
    pub to: Option<RelationshipItem>,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Username the record was first imported by
    pub created_by: Option<String>,
    /// Username of the most recent update
    pub last_updated_by: Option<String>,
}

impl RelationshipRow {
    /// Build a fresh row from an imported record
    pub fn from_record(record: &Relationship, uid: impl Into<String>, username: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            uid: uid.into(),
            relationship_type: record.relationship_type.clone(),
            relationship_name: record.relationship_name.clone(),
            bidirectional: record.bidirectional,
            from: record.from.clone(),
            to: record.to.clone(),
            created: now,
            last_updated: now,
            created_by: username.map(str::to_string),
            last_updated_by: username.map(str::to_string),
        }
    }

    /// Replace the mutable fields with those of `record`, keeping creation data
    pub fn apply_update(mut self, record: &Relationship, username: Option<&str>) -> Self {
        self.relationship_type = record.relationship_type.clone();
        self.relationship_name = record.relationship_name.clone();
        self.bidirectional = record.bidirectional;
        self.from = record.from.clone();
        self.to = record.to.clone();
        self.last_updated = Utc::now();
        self.last_updated_by = username.map(str::to_string);
        self
    }

    /// Convert back into the wire representation
    pub fn to_record(&self) -> Relationship {
        Relationship {
            relationship: Some(self.uid.clone()),
            relationship_type: self.relationship_type.clone(),
            relationship_name: self.relationship_name.clone(),
            bidirectional: self.bidirectional,
            from: self.from.clone(),
            to: self.to.clone(),
            created: Some(self.created.naive_utc()),
            last_updated: Some(self.last_updated.naive_utc()),
        }
    }
}

/// Repository for all database operations
#[derive(Clone)]
pub struct Repository {
    db: DbConnection,
}

impl Repository {
    /// Create a new repository
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Check whether a relationship with this uid is stored
    #[instrument(skip(self))]
    pub async fn relationship_exists(&self, uid: &str) -> Result<bool> {
        Ok(self.get_relationship(uid).await?.is_some())
    }

    /// Get a relationship by uid
    #[instrument(skip(self))]
    pub async fn get_relationship(&self, uid: &str) -> Result<Option<RelationshipRow>> {
        let row: Option<RelationshipRow> = self.db.select((RELATIONSHIP_TABLE, uid)).await?;
        Ok(row)
    }

    /// Create a relationship under its uid
    #[instrument(skip(self, row), fields(uid = %row.uid))]
    pub async fn create_relationship(&self, row: RelationshipRow) -> Result<RelationshipRow> {
        let uid = row.uid.clone();
        let created: Option<RelationshipRow> = self.db
            .create((RELATIONSHIP_TABLE, uid.clone()))
            .content(row)
            .await?;

        created.ok_or_else(|| DbError::CreateFailed(format!("relationship {}", uid)))
    }

    /// Replace a stored relationship
    #[instrument(skip(self, row), fields(uid = %row.uid))]
    pub async fn update_relationship(&self, row: RelationshipRow) -> Result<RelationshipRow> {
        let uid = row.uid.clone();
        let updated: Option<RelationshipRow> = self.db
            .update((RELATIONSHIP_TABLE, uid.clone()))
            .content(row)
            .await?;

        updated.ok_or_else(|| DbError::NotFound(RELATIONSHIP_TABLE.into(), uid))
    }

    /// Delete a relationship, returning it if it existed
    #[instrument(skip(self))]
    pub async fn delete_relationship(&self, uid: &str) -> Result<Option<RelationshipRow>> {
        let deleted: Option<RelationshipRow> = self.db.delete((RELATIONSHIP_TABLE, uid)).await?;
        Ok(deleted)
    }

    /// List most recently updated relationships
    #[instrument(skip(self))]
    pub async fn list_relationships(&self, limit: usize) -> Result<Vec<RelationshipRow>> {
        let mut rows: Vec<RelationshipRow> = self.db.select(RELATIONSHIP_TABLE).await?;

        // Sorting and limiting in Rust keeps the query free of multi-statement `take` handling.
        rows.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        rows.truncate(limit);

        Ok(rows)
    }

    /// Get database statistics
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<DbStats> {
        let rows: Vec<RelationshipRow> = self.db.select(RELATIONSHIP_TABLE).await?;

        let mut stats = DbStats {
            relationship_count: rows.len(),
            ..DbStats::default()
        };
        for row in &rows {
            if row.bidirectional {
                stats.bidirectional_count += 1;
            }
            let key = row.relationship_type.clone().unwrap_or_else(|| "(untyped)".into());
            *stats.by_type.entry(key).or_insert(0) += 1;
        }

        Ok(stats)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DbStats {
    pub relationship_count: usize,
    pub bidirectional_count: usize,
    pub by_type: BTreeMap<String, usize>,
}
