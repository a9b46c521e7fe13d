use sqlx::PgPool;

use crate::error::StoreError;

// ============================================================================
// Relational Schema
// ============================================================================
//
// The schema is a read-only value loaded once at process start. Deployment
// tooling applies ddl() out-of-band at provisioning time; ensure_schema is
// the in-process convenience for tests and single-node setups. Both are
// idempotent because every statement is IF NOT EXISTS.
//
// ============================================================================

const DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS event_sources ( \
         id UUID PRIMARY KEY, \
         type TEXT NOT NULL, \
         version BIGINT NOT NULL \
     )",
    "CREATE TABLE IF NOT EXISTS events ( \
         event_source_id UUID NOT NULL REFERENCES event_sources (id), \
         name TEXT NOT NULL, \
         data BYTEA NOT NULL, \
         sequence BIGINT NOT NULL, \
         timestamp TIMESTAMPTZ NOT NULL, \
         UNIQUE (event_source_id, sequence) \
     )",
    "CREATE INDEX IF NOT EXISTS event_sources_type_idx ON event_sources (type)",
];

/// Ordered table-definition statements for the event store.
///
/// Statement order matters: events carries a foreign key to event_sources.
pub fn ddl() -> &'static [&'static str] {
    DDL
}

/// Apply the schema statements in order. Idempotent.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in DDL {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::debug!(statements = DDL.len(), "Event store schema ensured");
    Ok(())
}

/// Check whether the required tables exist.
pub async fn schema_present(pool: &PgPool) -> Result<bool, StoreError> {
    for probe in [
        "SELECT 1 FROM event_sources LIMIT 1",
        "SELECT 1 FROM events LIMIT 1",
    ] {
        if let Err(err) = sqlx::query(probe).fetch_optional(pool).await {
            return match StoreError::from(err) {
                StoreError::SchemaMissing => Ok(false),
                other => Err(other),
            };
        }
    }

    Ok(true)
}
