//! SurrealDB schema definitions

use crate::{DbConnection, Result};
use tracing::info;

/// Table holding imported relationships, keyed by relationship uid
pub const RELATIONSHIP_TABLE: &str = "relationship";

/// Initialize the database schema
pub async fn initialize_schema(db: &DbConnection) -> Result<()> {
    info!("Initializing database schema...");

    db.query(SCHEMA_DEFINITION).await?;

    info!("Schema initialized successfully");
    Ok(())
}

// Records carry nested `from`/`to` objects, so the table stays schemaless and
// only the lookup fields are indexed.
const SCHEMA_DEFINITION: &str = r#"
DEFINE TABLE IF NOT EXISTS relationship SCHEMALESS;

DEFINE INDEX IF NOT EXISTS idx_relationship_uid ON relationship FIELDS uid UNIQUE;
DEFINE INDEX IF NOT EXISTS idx_relationship_type ON relationship FIELDS relationship_type;
"#;

#[cfg(test)]
mod tests {
    use crate::init_memory;

    #[tokio::test]
    async fn test_schema_initialization() {
        let db = init_memory().await.expect("Failed to init db");

        let rows: Vec<serde_json::Value> = db.select("relationship").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_schema_is_reentrant() {
        let db = init_memory().await.expect("Failed to init db");
        super::initialize_schema(&db).await.expect("Second initialization failed");
    }
}
