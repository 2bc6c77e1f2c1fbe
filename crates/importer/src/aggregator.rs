//! Merging per-bucket results and applying the report mode

use relimport_core::{ImportSummaries, ReportMode};

/// Concatenate bucket results in create, update, delete order
pub fn merge(create: ImportSummaries, update: ImportSummaries, delete: ImportSummaries) -> ImportSummaries {
    let mut merged = ImportSummaries::new();
    merged.add_import_summaries(create);
    merged.add_import_summaries(update);
    merged.add_import_summaries(delete);
    merged
}

/// Under `ErrorsOnly`, keep only summaries that carry conflicts
pub fn filter(mut summaries: ImportSummaries, mode: ReportMode) -> ImportSummaries {
    match mode {
        ReportMode::ErrorsOnly => {
            summaries.retain_conflicts();
            summaries
        }
        ReportMode::Full => summaries,
    }
}
