use uuid::Uuid;

// ============================================================================
// Store Errors
// ============================================================================
//
// Every fallible operation in this crate surfaces one of these variants.
// Conflict and precondition variants are recoverable by the caller;
// serialization and schema variants are not.
//
// ============================================================================

/// PostgreSQL error code for an undefined table.
const UNDEFINED_TABLE: &str = "42P01";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The stored version did not match the caller's expected version.
    ///
    /// Nothing was written. The caller must re-read the aggregate, reapply
    /// its command, and retry with the current version.
    #[error(
        "concurrency conflict on {aggregate_id}: expected version {expected}, stored version is {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    /// An event payload could not be encoded or decoded.
    #[error("failed to encode or decode event payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored event carries a type tag with no registered decoder.
    #[error("no decoder registered for event type {0:?}")]
    UnknownEventType(String),

    /// The backing store is unreachable or a query failed.
    #[error("backing store error: {0}")]
    Connectivity(sqlx::Error),

    /// The event store tables are absent.
    #[error("event store tables are missing; apply the statements from schema::ddl()")]
    SchemaMissing,

    /// The operation exists on the interface but is not implemented in this
    /// revision.
    #[error("{0} not supported in this revision")]
    NotSupported(&'static str),

    /// Save was called with no pending events.
    #[error("cannot append an empty event list")]
    EmptyAppend,

    /// Pending events are not numbered contiguously from the expected
    /// version.
    #[error("pending events must be numbered contiguously: expected sequence {expected}, found {found}")]
    SequenceGap { expected: i64, found: i64 },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNDEFINED_TABLE) {
                return StoreError::SchemaMissing;
            }
        }
        StoreError::Connectivity(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_carries_both_versions() {
        let aggregate_id = Uuid::new_v4();
        let err = StoreError::ConcurrencyConflict {
            aggregate_id,
            expected: 3,
            actual: 5,
        };

        let message = err.to_string();
        assert!(message.contains(&aggregate_id.to_string()));
        assert!(message.contains("expected version 3"));
        assert!(message.contains("stored version is 5"));
    }

    #[test]
    fn non_database_sqlx_errors_map_to_connectivity() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Connectivity(_)));
    }

    #[test]
    fn serde_errors_map_to_serialization() {
        let json_err = serde_json::from_str::<i64>("not a number").unwrap_err();
        let err = StoreError::from(json_err);
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
