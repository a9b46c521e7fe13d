// ============================================================================
// pg_eventstore - Event Sourcing Persistence Core
// ============================================================================
//
// Durably records the ordered event history of aggregates in PostgreSQL and
// replays it to reconstruct state. Appends are atomic with optimistic
// concurrency control: the version column of the source row is the
// compare-and-swap token, so writers to unrelated aggregates never contend
// and conflicting writers to the same aggregate fail fast.
//
// Domain-specific code (aggregate roots, command handling, event dispatch)
// lives with the caller; this crate only ever sees opaque payloads and the
// tag -> decoder registry the domain layer supplies.
//
// ============================================================================

pub mod core;
pub mod error;
pub mod store;

// Re-export the public surface
pub use crate::core::{Decoder, DomainEvent, EventCodec, EventEnvelope, PendingEvent, Snapshot};
pub use crate::error::StoreError;
pub use crate::store::{maintenance, schema, EventStore};
