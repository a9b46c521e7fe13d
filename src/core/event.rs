use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Event Types - Pending and Committed Forms
// ============================================================================
//
// The store is GENERIC and works with ANY event type. The domain layer hands
// it pending events that already carry their sequence numbers; the store
// hands back committed events together with the type tag and the commit
// timestamp it assigned.
//
// ============================================================================

/// Generic domain event trait.
///
/// All domain events must implement this trait to be used with the event
/// store. The type tag is an instance accessor so that a single event enum
/// can tag each variant with its own logical name.
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    fn event_type(&self) -> &'static str;
}

/// A not-yet-persisted event together with the sequence slot it will occupy.
///
/// The sequence is assigned by the caller at emission time: the first pending
/// event of a save must carry `expected_version + 1`, the next
/// `expected_version + 2`, and so on with no gaps.
#[derive(Debug, Clone)]
pub struct PendingEvent<E> {
    pub sequence: i64,
    pub event: E,
}

impl<E> PendingEvent<E> {
    pub fn new(sequence: i64, event: E) -> Self {
        Self { sequence, event }
    }
}

/// A committed event replayed from the store.
///
/// The timestamp is the one the store assigned at commit time, never a
/// caller-supplied value.
#[derive(Debug, Clone)]
pub struct EventEnvelope<E> {
    pub sequence: i64,
    pub event_type: String,
    pub event: E,
    pub timestamp: DateTime<Utc>,
}

/// Materialized point-in-time aggregate state intended to shortcut replay.
///
/// Present for interface compatibility only: snapshot operations fail with
/// `StoreError::NotSupported` in this revision.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub aggregate_id: Uuid,
    pub version: i64,
    pub state: Vec<u8>,
}
