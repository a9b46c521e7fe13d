use chrono::{DateTime, Utc};
use futures_util::{Stream, StreamExt, TryStreamExt};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::{DomainEvent, EventCodec, EventEnvelope, PendingEvent, Snapshot};
use crate::error::StoreError;

// ============================================================================
// Generic Event Store - Repository for Events
// ============================================================================
//
// This is a GENERIC event store that works with ANY event type.
//
// Type Parameter:
// - `E`: The domain event type (must implement DomainEvent trait)
//
// Responsibilities:
// 1. Append events atomically with optimistic concurrency control
// 2. Replay event history for aggregates in strict sequence order
// 3. List known aggregate ids for bulk rebuild scans
//
// Concurrency model: the version column of the event_sources row is the
// compare-and-swap token. Each append runs in one transaction that locks
// only the row for its own aggregate id, so writers to unrelated aggregates
// never contend. Conflicting writers to the same id race; exactly one wins
// per contested version and the rest receive ConcurrencyConflict. Retry is
// the caller's responsibility.
//
// ============================================================================

pub struct EventStore<E: DomainEvent> {
    pool: PgPool,
    aggregate_type: String, // e.g., "Order", "Customer", "Product"
    codec: EventCodec<E>,
}

impl<E: DomainEvent> EventStore<E> {
    pub fn new(pool: PgPool, aggregate_type: &str, codec: EventCodec<E>) -> Self {
        Self {
            pool,
            aggregate_type: aggregate_type.to_string(),
            codec,
        }
    }

    /// Append events to the event store.
    /// Returns the new version number after appending.
    ///
    /// The whole call is one atomic unit of work: any failure before commit
    /// (codec error, connectivity loss, constraint violation) rolls back
    /// every change, so a partial append is never observable.
    pub async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        pending: Vec<PendingEvent<E>>,
    ) -> Result<i64, StoreError> {
        validate_pending(expected_version, &pending)?;

        // Encode up front so a codec failure costs no database work.
        let mut encoded = Vec::with_capacity(pending.len());
        for pending_event in &pending {
            let (name, payload) = self.codec.encode(&pending_event.event)?;
            encoded.push((pending_event.sequence, name, payload));
        }

        let mut tx = self.pool.begin().await?;

        // Lock the source row for this aggregate only. Unrelated aggregates
        // are unaffected; a concurrent writer to the same id blocks here
        // until we commit and then sees our version.
        let stored = sqlx::query_as::<_, (i64,)>(
            "SELECT version FROM event_sources WHERE id = $1 FOR UPDATE",
        )
        .bind(aggregate_id)
        .fetch_optional(&mut *tx)
        .await?;

        let actual_version = match stored {
            Some((version,)) => version,
            None => {
                // First save for an unseen id: the stored version is 0. A
                // racing first-saver may commit the row between our select
                // and this insert, so take the row via ON CONFLICT and
                // re-lock instead of failing on the primary key.
                sqlx::query(
                    "INSERT INTO event_sources (id, type, version) VALUES ($1, $2, 0) \
                     ON CONFLICT (id) DO NOTHING",
                )
                .bind(aggregate_id)
                .bind(&self.aggregate_type)
                .execute(&mut *tx)
                .await?;

                let (version,) = sqlx::query_as::<_, (i64,)>(
                    "SELECT version FROM event_sources WHERE id = $1 FOR UPDATE",
                )
                .bind(aggregate_id)
                .fetch_one(&mut *tx)
                .await?;

                version
            }
        };

        if actual_version != expected_version {
            // Dropping the transaction rolls back the source row insert, if
            // this call made one.
            return Err(StoreError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: actual_version,
            });
        }

        for (sequence, name, payload) in &encoded {
            sqlx::query(
                "INSERT INTO events (event_source_id, name, data, sequence, timestamp) \
                 VALUES ($1, $2, $3, $4, now())",
            )
            .bind(aggregate_id)
            .bind(name)
            .bind(payload)
            .bind(sequence)
            .execute(&mut *tx)
            .await?;
        }

        let new_version = expected_version + encoded.len() as i64;

        sqlx::query("UPDATE event_sources SET version = $2 WHERE id = $1")
            .bind(aggregate_id)
            .bind(new_version)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type,
            new_version = new_version,
            event_count = encoded.len(),
            "✅ Appended events to event store"
        );

        Ok(new_version)
    }

    /// Replay committed events for an aggregate as a lazy stream, strictly
    /// ascending by sequence, starting after `since_version`.
    ///
    /// The stream is finite and not restartable; a fresh call is required to
    /// re-read from the start or to pick up later commits. Visibility is
    /// read committed: an in-flight append for the same id is never
    /// observed, not even partially.
    pub fn stream_events(
        &self,
        aggregate_id: Uuid,
        since_version: i64,
    ) -> impl Stream<Item = Result<EventEnvelope<E>, StoreError>> + Send + '_ {
        sqlx::query_as::<_, (i64, String, Vec<u8>, DateTime<Utc>)>(
            "SELECT sequence, name, data, timestamp FROM events \
             WHERE event_source_id = $1 AND sequence > $2 \
             ORDER BY sequence ASC",
        )
        .bind(aggregate_id)
        .bind(since_version)
        .fetch(&self.pool)
        .map(move |row| {
            let (sequence, name, payload, timestamp) = row?;
            let event = self.codec.decode(&name, &payload)?;

            Ok(EventEnvelope {
                sequence,
                event_type: name,
                event,
                timestamp,
            })
        })
    }

    /// Load the event history for an aggregate into memory.
    pub async fn load_events(
        &self,
        aggregate_id: Uuid,
        since_version: i64,
    ) -> Result<Vec<EventEnvelope<E>>, StoreError> {
        let events = self
            .stream_events(aggregate_id, since_version)
            .try_collect::<Vec<_>>()
            .await?;

        tracing::debug!(
            aggregate_id = %aggregate_id,
            since_version = since_version,
            count = events.len(),
            "Loaded events for aggregate"
        );

        Ok(events)
    }

    /// List every known aggregate id for this store's logical type.
    /// Order across ids is unspecified.
    pub fn list_ids(&self) -> impl Stream<Item = Result<Uuid, StoreError>> + Send + '_ {
        sqlx::query_as::<_, (Uuid,)>("SELECT id FROM event_sources WHERE type = $1")
            .bind(self.aggregate_type.clone())
            .fetch(&self.pool)
            .map(|row| {
                let (id,) = row?;
                Ok(id)
            })
    }

    /// Get current version of an aggregate. An unseen id has version 0.
    pub async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, StoreError> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT version FROM event_sources WHERE id = $1")
            .bind(aggregate_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(version,)| version).unwrap_or(0))
    }

    /// Check if an aggregate has any committed events.
    pub async fn exists(&self, aggregate_id: Uuid) -> Result<bool, StoreError> {
        let version = self.current_version(aggregate_id).await?;
        Ok(version > 0)
    }

    /// Store a snapshot for an aggregate.
    ///
    /// Unimplemented in this revision; always fails with `NotSupported` so
    /// callers can distinguish "unsupported" from "no snapshot exists".
    pub async fn save_snapshot(&self, _snapshot: Snapshot) -> Result<(), StoreError> {
        Err(StoreError::NotSupported("snapshots"))
    }

    /// Fetch the latest snapshot for an aggregate.
    ///
    /// Unimplemented in this revision; always fails with `NotSupported`.
    pub async fn get_snapshot(&self, _aggregate_id: Uuid) -> Result<Option<Snapshot>, StoreError> {
        Err(StoreError::NotSupported("snapshots"))
    }
}

/// Validate the append preconditions: a non-empty batch numbered
/// contiguously from `expected_version + 1`.
fn validate_pending<E>(
    expected_version: i64,
    pending: &[PendingEvent<E>],
) -> Result<(), StoreError> {
    if pending.is_empty() {
        return Err(StoreError::EmptyAppend);
    }

    for (offset, pending_event) in pending.iter().enumerate() {
        let expected = expected_version + offset as i64 + 1;
        if pending_event.sequence != expected {
            return Err(StoreError::SequenceGap {
                expected,
                found: pending_event.sequence,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Clone, Debug)]
    struct TestEvent {
        data: String,
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            "TestEvent"
        }
    }

    fn pending(sequences: &[i64]) -> Vec<PendingEvent<TestEvent>> {
        sequences
            .iter()
            .map(|&seq| {
                PendingEvent::new(
                    seq,
                    TestEvent {
                        data: format!("event {seq}"),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn empty_batch_is_rejected() {
        let result = validate_pending::<TestEvent>(0, &[]);
        assert!(matches!(result, Err(StoreError::EmptyAppend)));
    }

    #[test]
    fn contiguous_batch_from_next_version_is_accepted() {
        assert!(validate_pending(0, &pending(&[1, 2, 3])).is_ok());
        assert!(validate_pending(7, &pending(&[8, 9])).is_ok());
    }

    #[test]
    fn batch_not_starting_at_next_version_is_rejected() {
        let result = validate_pending(0, &pending(&[2, 3]));
        assert!(matches!(
            result,
            Err(StoreError::SequenceGap {
                expected: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn gap_inside_batch_is_rejected() {
        let result = validate_pending(0, &pending(&[1, 3]));
        assert!(matches!(
            result,
            Err(StoreError::SequenceGap {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn duplicate_sequence_in_batch_is_rejected() {
        let result = validate_pending(4, &pending(&[5, 5]));
        assert!(matches!(
            result,
            Err(StoreError::SequenceGap {
                expected: 6,
                found: 5
            })
        ));
    }
}
