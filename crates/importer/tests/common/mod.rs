//! Common test utilities

use relimport_core::{PayloadDecoder, User};
use relimport_db::{init_memory, Repository};
use relimport_importer::{ImportDispatcher, RepositoryStore, StaticUserProvider};
use std::sync::Arc;

pub type TestDispatcher = ImportDispatcher<RepositoryStore, StaticUserProvider>;

/// Create a test repository with in-memory database
pub async fn create_test_repo() -> Repository {
    let db = init_memory().await.expect("Failed to create test database");
    Repository::new(db)
}

/// Dispatcher over a fresh in-memory store, attributed to `importer`
pub async fn create_test_dispatcher() -> TestDispatcher {
    let repo = create_test_repo().await;
    ImportDispatcher::new(
        RepositoryStore::new(repo),
        StaticUserProvider::new(User::new("importer")),
        Arc::new(PayloadDecoder::default()),
    )
}

/// A valid single relationship in JSON
pub fn json_relationship(uid: &str, kind: &str) -> String {
    let uid_field = if uid.is_empty() {
        String::new()
    } else {
        format!(r#""relationship": "{}","#, uid)
    };
    format!(
        r#"{{
            {}
            "relationshipType": "{}",
            "from": {{"trackedEntityInstance": "TEI_{}_A"}},
            "to": {{"trackedEntityInstance": "TEI_{}_B"}}
        }}"#,
        uid_field, kind, kind, kind
    )
}

/// A JSON batch of the given single records
pub fn json_batch(records: &[String]) -> String {
    format!(r#"{{"relationships": [{}]}}"#, records.join(","))
}
