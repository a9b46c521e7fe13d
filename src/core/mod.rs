// ============================================================================
// Event Store Core - Generic Event Abstractions
// ============================================================================
//
// This module contains the GENERIC event-facing types of the store.
//
// Key Principles:
// - No domain-specific code
// - Generic over event types
// - Payloads are opaque to the persistence layer
//
// ============================================================================

pub mod codec;
pub mod event;

// Re-export core types for convenience
pub use codec::{Decoder, EventCodec};
pub use event::{DomainEvent, EventEnvelope, PendingEvent, Snapshot};
