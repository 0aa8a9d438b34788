use serde::{Deserialize, Serialize};

use farmstock_core::{CompanyName, EventId};

/// Envelope for a published event, carrying the stream metadata consumers need.
///
/// Notes:
/// - `stream` identifies the per-(item, warehouse) ledger stream.
/// - `sequence_number` is the entry's position in that stream (1-based).
/// - `company` is the owning unit of the entry, when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: EventId,
    company: Option<CompanyName>,
    stream: String,
    event_type: String,
    sequence_number: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: EventId,
        company: Option<CompanyName>,
        stream: impl Into<String>,
        event_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            company,
            stream: stream.into(),
            event_type: event_type.into(),
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn company(&self) -> Option<&CompanyName> {
        self.company.as_ref()
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

/// Messages that belong to an owning company.
///
/// Workers pinned to one company use this to skip everything else.
pub trait CompanyScoped {
    fn company(&self) -> Option<&CompanyName>;
}

impl<E> CompanyScoped for EventEnvelope<E> {
    fn company(&self) -> Option<&CompanyName> {
        self.company.as_ref()
    }
}
