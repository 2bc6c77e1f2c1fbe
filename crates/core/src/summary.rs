//! Import summaries - per-record outcomes and their aggregate

use serde::{Deserialize, Serialize};

/// Outcome of one record mutation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    Success,
    Warning,
    Error,
}

impl Default for ImportStatus {
    fn default() -> Self {
        Self::Success
    }
}

impl std::fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportStatus::Success => write!(f, "SUCCESS"),
            ImportStatus::Warning => write!(f, "WARNING"),
            ImportStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Why one record's mutation did not fully succeed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportConflict {
    /// What the conflict is about (a uid, a field name)
    pub object: String,
    pub value: String,
}

impl ImportConflict {
    pub fn new(object: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            value: value.into(),
        }
    }
}

/// Counters for one record or a whole import
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportCount {
    pub imported: u32,
    pub updated: u32,
    pub ignored: u32,
    pub deleted: u32,
}

impl ImportCount {
    pub fn imported() -> Self {
        Self { imported: 1, ..Self::default() }
    }

    pub fn updated() -> Self {
        Self { updated: 1, ..Self::default() }
    }

    pub fn ignored() -> Self {
        Self { ignored: 1, ..Self::default() }
    }

    pub fn deleted() -> Self {
        Self { deleted: 1, ..Self::default() }
    }
}

/// Outcome of a single record mutation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub status: ImportStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub import_count: ImportCount,

    /// Empty means the record went through cleanly
    #[serde(default)]
    pub conflicts: Vec<ImportConflict>,

    /// Identifier of the affected record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl ImportSummary {
    pub fn success(import_count: ImportCount) -> Self {
        Self {
            status: ImportStatus::Success,
            import_count,
            ..Self::default()
        }
    }

    /// An error summary counted as ignored
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            status: ImportStatus::Error,
            description: Some(description.into()),
            import_count: ImportCount::ignored(),
            ..Self::default()
        }
    }

    /// Builder: set reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Builder: add a conflict
    pub fn with_conflict(mut self, conflict: ImportConflict) -> Self {
        self.conflicts.push(conflict);
        self
    }

    /// Builder: add several conflicts
    pub fn with_conflicts(mut self, conflicts: impl IntoIterator<Item = ImportConflict>) -> Self {
        self.conflicts.extend(conflicts);
        self
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Ordered collection of summaries for one import call
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummaries {
    /// Worst status among all summaries added
    pub status: ImportStatus,
    pub imported: u32,
    pub updated: u32,
    pub deleted: u32,
    pub ignored: u32,

    #[serde(default)]
    pub import_summaries: Vec<ImportSummary>,
}

impl ImportSummaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one summary, folding its counts and status into the totals
    pub fn add_import_summary(&mut self, summary: ImportSummary) {
        self.imported += summary.import_count.imported;
        self.updated += summary.import_count.updated;
        self.deleted += summary.import_count.deleted;
        self.ignored += summary.import_count.ignored;
        self.status = self.status.max(summary.status);
        self.import_summaries.push(summary);
    }

    /// Append every summary of `other`, in order
    pub fn add_import_summaries(&mut self, other: ImportSummaries) {
        for summary in other.import_summaries {
            self.add_import_summary(summary);
        }
    }

    /// Drop summaries without conflicts; totals are left as they were
    pub fn retain_conflicts(&mut self) {
        self.import_summaries.retain(ImportSummary::has_conflicts);
    }

    pub fn len(&self) -> usize {
        self.import_summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.import_summaries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImportSummary> {
        self.import_summaries.iter()
    }
}

impl FromIterator<ImportSummary> for ImportSummaries {
    fn from_iter<I: IntoIterator<Item = ImportSummary>>(iter: I) -> Self {
        let mut summaries = ImportSummaries::new();
        for summary in iter {
            summaries.add_import_summary(summary);
        }
        summaries
    }
}

impl IntoIterator for ImportSummaries {
    type Item = ImportSummary;
    type IntoIter = std::vec::IntoIter<ImportSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.import_summaries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_and_status() {
        let mut summaries = ImportSummaries::new();
        summaries.add_import_summary(ImportSummary::success(ImportCount::imported()));
        summaries.add_import_summary(ImportSummary::success(ImportCount::updated()));
        assert_eq!(summaries.status, ImportStatus::Success);

        summaries.add_import_summary(
            ImportSummary::error("boom").with_conflict(ImportConflict::new("R1", "boom")),
        );

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries.imported, 1);
        assert_eq!(summaries.updated, 1);
        assert_eq!(summaries.ignored, 1);
        assert_eq!(summaries.status, ImportStatus::Error);
    }

    #[test]
    fn test_retain_conflicts_keeps_order_and_totals() {
        let mut summaries: ImportSummaries = vec![
            ImportSummary::error("a").with_conflict(ImportConflict::new("A", "bad")),
            ImportSummary::success(ImportCount::imported()),
            ImportSummary::error("b").with_conflict(ImportConflict::new("B", "bad")),
        ]
        .into_iter()
        .collect();

        summaries.retain_conflicts();

        let refs: Vec<_> = summaries.iter().map(|s| s.description.clone().unwrap()).collect();
        assert_eq!(refs, vec!["a", "b"]);
        assert_eq!(summaries.imported, 1);
        assert_eq!(summaries.ignored, 2);
    }

    #[test]
    fn test_serialized_shape() {
        let summary = ImportSummary::success(ImportCount::imported()).with_reference("R1");
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["status"], "SUCCESS");
        assert_eq!(json["importCount"]["imported"], 1);
        assert_eq!(json["reference"], "R1");
        assert!(json["conflicts"].as_array().unwrap().is_empty());
    }
}
