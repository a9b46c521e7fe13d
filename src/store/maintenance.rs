use sqlx::PgPool;

use crate::error::StoreError;

// ============================================================================
// Maintenance - Index Pruning
// ============================================================================

/// Remove every event source row that has no remaining events, regardless
/// of aggregate type. Returns the number of rows removed.
///
/// Idempotent: a second consecutive call with no intervening save removes
/// zero rows. Runs in its own transaction; an in-flight save for the same id
/// holds the FOR UPDATE lock on its source row, so pruning and first-insert
/// serialize per id and never race destructively.
pub async fn prune(pool: &PgPool) -> Result<u64, StoreError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "DELETE FROM event_sources es \
         WHERE NOT EXISTS ( \
             SELECT 1 FROM events e WHERE e.event_source_id = es.id \
         )",
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let removed = result.rows_affected();
    if removed > 0 {
        tracing::info!(removed = removed, "Pruned event sources with no events");
    }

    Ok(removed)
}
