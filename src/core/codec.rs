use std::collections::HashMap;

use crate::core::event::DomainEvent;
use crate::error::StoreError;

// ============================================================================
// Event Codec - Type-Tag Registry
// ============================================================================
//
// Encodes events to an opaque byte payload plus a logical type tag, and
// decodes them back through a registry of per-tag decoder functions. The
// registry is populated once at process start by the domain layer; the store
// itself holds no knowledge of specific event shapes.
//
// Decoding a tag with no registered decoder is an explicit failure, never a
// silent skip.
//
// ============================================================================

/// Decoder function for one logical event type tag.
pub type Decoder<E> = fn(&[u8]) -> Result<E, serde_json::Error>;

/// Codec for one domain event type.
///
/// Type Parameter:
/// - `E`: The domain event type (must implement DomainEvent trait)
#[derive(Clone)]
pub struct EventCodec<E> {
    decoders: HashMap<String, Decoder<E>>,
}

impl<E: DomainEvent> EventCodec<E> {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register a decoder for a logical event type tag.
    pub fn register(mut self, event_type: &str, decoder: Decoder<E>) -> Self {
        self.decoders.insert(event_type.to_string(), decoder);
        self
    }

    /// Encode an event into its type tag and opaque payload bytes.
    pub fn encode(&self, event: &E) -> Result<(String, Vec<u8>), StoreError> {
        let payload = serde_json::to_vec(event)?;
        Ok((event.event_type().to_string(), payload))
    }

    /// Decode a stored payload through the decoder registered for its tag.
    pub fn decode(&self, event_type: &str, payload: &[u8]) -> Result<E, StoreError> {
        let decoder = self
            .decoders
            .get(event_type)
            .ok_or_else(|| StoreError::UnknownEventType(event_type.to_string()))?;

        decoder(payload).map_err(StoreError::from)
    }
}

impl<E: DomainEvent> Default for EventCodec<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    #[serde(tag = "type", content = "data")]
    enum TestEvent {
        Created { name: String },
        Renamed { name: String },
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Created { .. } => "TestCreated",
                TestEvent::Renamed { .. } => "TestRenamed",
            }
        }
    }

    fn codec() -> EventCodec<TestEvent> {
        EventCodec::new()
            .register("TestCreated", |payload| serde_json::from_slice(payload))
            .register("TestRenamed", |payload| serde_json::from_slice(payload))
    }

    #[test]
    fn encode_tags_each_variant() {
        let codec = codec();

        let (tag, _) = codec
            .encode(&TestEvent::Created {
                name: "a".to_string(),
            })
            .unwrap();
        assert_eq!(tag, "TestCreated");

        let (tag, _) = codec
            .encode(&TestEvent::Renamed {
                name: "b".to_string(),
            })
            .unwrap();
        assert_eq!(tag, "TestRenamed");
    }

    #[test]
    fn decode_round_trips_encoded_events() {
        let codec = codec();
        let event = TestEvent::Created {
            name: "round trip".to_string(),
        };

        let (tag, payload) = codec.encode(&event).unwrap();
        let decoded = codec.decode(&tag, &payload).unwrap();

        assert_eq!(decoded, event);
    }

    #[test]
    fn unknown_tag_fails_explicitly() {
        let codec = codec();

        let err = codec.decode("NeverRegistered", b"{}").unwrap_err();
        assert!(matches!(err, StoreError::UnknownEventType(tag) if tag == "NeverRegistered"));
    }

    #[test]
    fn malformed_payload_is_a_serialization_error() {
        let codec = codec();

        let err = codec.decode("TestCreated", b"not json").unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
