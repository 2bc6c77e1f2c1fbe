//! Import dispatcher - decode, resolve, classify, mutate, report

use crate::aggregator;
use crate::classifier::StrategyClassifier;
use crate::options::ImportOptionsResolver;
use crate::store::{CurrentUserProvider, RelationshipStore};
use crate::Result;
use relimport_core::{
    ImportOptions, ImportSummaries, ImportSummary, PayloadDecoder, PayloadFormat, RawPayload,
    Relationship,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Routes decoded relationship records to a store and reports the outcome
pub struct ImportDispatcher<S, U> {
    store: S,
    resolver: ImportOptionsResolver<U>,
    decoder: Arc<PayloadDecoder>,
}

impl<S, U> ImportDispatcher<S, U>
where
    S: RelationshipStore,
    U: CurrentUserProvider,
{
    /// Create a new dispatcher
    pub fn new(store: S, users: U, decoder: Arc<PayloadDecoder>) -> Self {
        Self {
            store,
            resolver: ImportOptionsResolver::new(users),
            decoder,
        }
    }

    /// Builder: options used when a caller passes none
    pub fn with_default_options(mut self, defaults: ImportOptions) -> Self {
        self.resolver = self.resolver.with_defaults(defaults);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decode a JSON or XML payload and import every record in it.
    ///
    /// A payload that cannot be decoded fails before anything is written.
    #[instrument(skip(self, payload, options), fields(format = %payload.format, bytes = payload.content.len()))]
    pub async fn import_payload(
        &self,
        payload: RawPayload<'_>,
        options: Option<ImportOptions>,
    ) -> Result<ImportSummaries> {
        let records = self.decoder.decode_payload(payload)?;
        self.import_batch(records, options).await
    }

    /// Import already decoded records.
    ///
    /// Buckets run create, update, delete. An error from the store stops the
    /// remaining buckets; buckets already applied stay applied.
    #[instrument(skip(self, records, options), fields(records = records.len()))]
    pub async fn import_batch(
        &self,
        records: Vec<Relationship>,
        options: Option<ImportOptions>,
    ) -> Result<ImportSummaries> {
        let options = self.resolver.resolve(options);
        info!(
            "Importing {} relationships with strategy {}",
            records.len(),
            options.import_strategy
        );

        let buckets = StrategyClassifier::new(&self.store)
            .partition(options.import_strategy, records)
            .await?;

        let created = self.store.create_relationships(buckets.create, &options).await?;
        let updated = self.store.update_relationships(buckets.update, &options).await?;
        let deleted = self.store.delete_relationships(buckets.delete, &options).await?;

        let summaries = aggregator::merge(created, updated, deleted);
        info!(
            "Import finished: status={} imported={} updated={} deleted={} ignored={}",
            summaries.status, summaries.imported, summaries.updated, summaries.deleted, summaries.ignored
        );

        Ok(aggregator::filter(summaries, options.report_mode))
    }

    /// Update a single relationship addressed by `uid`.
    ///
    /// `uid` replaces whatever identifier the payload carries.
    #[instrument(skip(self, content, options))]
    pub async fn update_one(
        &self,
        uid: &str,
        content: &str,
        format: PayloadFormat,
        options: Option<ImportOptions>,
    ) -> Result<ImportSummary> {
        let mut record = self.decoder.decode_one(content, format)?;
        record.set_uid(uid);

        let options = self.resolver.resolve(options);
        self.store.update_relationship(record, &options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::StaticUserProvider;
    use crate::testing::MockStore;
    use crate::ImportError;
    use relimport_core::{ImportStrategy, ReportMode, User};

    fn dispatcher(store: MockStore) -> ImportDispatcher<MockStore, StaticUserProvider> {
        ImportDispatcher::new(
            store,
            StaticUserProvider::new(User::new("session")),
            Arc::new(PayloadDecoder::default()),
        )
    }

    fn rel(uid: &str, kind: &str) -> Relationship {
        Relationship::new(kind).with_uid(uid)
    }

    fn references(summaries: &ImportSummaries) -> Vec<String> {
        summaries.iter().filter_map(|s| s.reference.clone()).collect()
    }

    #[tokio::test]
    async fn test_create_and_update_scenario() {
        let dispatcher = dispatcher(MockStore::with_existing(&["X"]));

        let summaries = dispatcher
            .import_batch(
                vec![rel("", "a"), rel("X", "b")],
                Some(ImportOptions::new(ImportStrategy::CreateAndUpdate)),
            )
            .await
            .unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(references(&summaries), vec!["a", "X"]);
        assert_eq!(summaries.imported, 1);
        assert_eq!(summaries.updated, 1);

        let calls = dispatcher.store().calls();
        assert_eq!(calls[0], ("create", vec![None]));
        assert_eq!(calls[1], ("update", vec![Some("X".to_string())]));
        assert_eq!(calls[2], ("delete", vec![]));
    }

    #[tokio::test]
    async fn test_delete_scenario() {
        let dispatcher = dispatcher(MockStore::with_existing(&["X"]));

        let summaries = dispatcher
            .import_batch(vec![rel("X", "c")], Some(ImportOptions::new(ImportStrategy::Delete)))
            .await
            .unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries.deleted, 1);

        let calls = dispatcher.store().calls();
        assert!(calls[0].1.is_empty());
        assert!(calls[1].1.is_empty());
        assert_eq!(calls[2].1, vec![Some("X".to_string())]);
        assert!(dispatcher.store().existence_checks().is_empty());
    }

    #[tokio::test]
    async fn test_summary_count_matches_input_for_every_strategy() {
        for strategy in [
            ImportStrategy::Create,
            ImportStrategy::Update,
            ImportStrategy::Delete,
            ImportStrategy::CreateAndUpdate,
            ImportStrategy::Sync,
        ] {
            let dispatcher = dispatcher(MockStore::with_existing(&["B", "D"]));
            let records = vec![rel("A", "a"), rel("B", "b"), rel("", "c"), rel("D", "d")];

            let summaries = dispatcher
                .import_batch(records, Some(ImportOptions::new(strategy)))
                .await
                .unwrap();

            assert_eq!(summaries.len(), 4, "strategy {}", strategy);
        }
    }

    #[tokio::test]
    async fn test_creates_precede_updates_in_report() {
        let dispatcher = dispatcher(MockStore::with_existing(&["U1", "U2"]));
        let records = vec![rel("U1", "a"), rel("C1", "b"), rel("U2", "c"), rel("C2", "d")];

        let summaries = dispatcher
            .import_batch(records, Some(ImportOptions::new(ImportStrategy::Sync)))
            .await
            .unwrap();

        assert_eq!(references(&summaries), vec!["C1", "C2", "U1", "U2"]);
    }

    #[tokio::test]
    async fn test_unspecified_strategy_is_silent_no_op() {
        let dispatcher = dispatcher(MockStore::default());

        let summaries = dispatcher
            .import_batch(vec![rel("X", "a")], Some(ImportOptions::new(ImportStrategy::Unspecified)))
            .await
            .unwrap();

        assert!(summaries.is_empty());
        assert!(dispatcher.store().calls().iter().all(|(_, records)| records.is_empty()));
    }

    #[tokio::test]
    async fn test_errors_only_report() {
        let dispatcher = dispatcher(MockStore::default().rejecting(&["B"]));
        let options = ImportOptions::new(ImportStrategy::Create).with_report_mode(ReportMode::ErrorsOnly);

        let summaries = dispatcher
            .import_batch(vec![rel("A", "a"), rel("B", "b"), rel("C", "c")], Some(options))
            .await
            .unwrap();

        assert_eq!(references(&summaries), vec!["B"]);
        assert_eq!(summaries.imported, 2);
        assert_eq!(summaries.ignored, 1);
    }

    #[tokio::test]
    async fn test_store_failure_aborts_later_buckets() {
        let dispatcher = dispatcher(MockStore::with_existing(&["X"]).failing_on("update"));

        let err = dispatcher
            .import_batch(vec![rel("", "a"), rel("X", "b")], None)
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Store(_)));
        let buckets: Vec<_> = dispatcher.store().calls().into_iter().map(|(b, _)| b).collect();
        assert_eq!(buckets, vec!["create", "update"]);
    }

    #[tokio::test]
    async fn test_unknown_field_aborts_before_mutation() {
        let dispatcher = dispatcher(MockStore::default());
        let payload = r#"{"relationships": [{"relationshipType": "a", "weight": 3}]}"#;

        let err = dispatcher
            .import_payload(RawPayload::new(payload, PayloadFormat::Json), None)
            .await
            .unwrap_err();

        assert!(err.is_parse_error());
        assert!(dispatcher.store().calls().is_empty());
    }

    #[tokio::test]
    async fn test_import_payload_single_record() {
        let dispatcher = dispatcher(MockStore::default());
        let payload = r#"{"relationship": "R1", "relationshipType": "a"}"#;

        let summaries = dispatcher
            .import_payload(RawPayload::new(payload, PayloadFormat::Json), Some(ImportOptions::new(ImportStrategy::Create)))
            .await
            .unwrap();

        assert_eq!(references(&summaries), vec!["R1"]);
    }

    #[tokio::test]
    async fn test_update_one_forces_path_identifier() {
        let dispatcher = dispatcher(MockStore::default());
        let payload = "<relationship><relationship>FROM_BODY</relationship><relationshipType>a</relationshipType></relationship>";

        let summary = dispatcher
            .update_one("FROM_PATH", payload, PayloadFormat::Xml, None)
            .await
            .unwrap();

        assert_eq!(summary.reference.as_deref(), Some("FROM_PATH"));
        assert_eq!(
            dispatcher.store().calls(),
            vec![("update_one", vec![Some("FROM_PATH".to_string())])]
        );
    }

    #[tokio::test]
    async fn test_update_one_rejects_batch_payload() {
        let dispatcher = dispatcher(MockStore::default());
        let payload = r#"{"relationships": []}"#;

        let err = dispatcher
            .update_one("R1", payload, PayloadFormat::Json, None)
            .await
            .unwrap_err();

        assert!(err.is_parse_error());
    }
}
