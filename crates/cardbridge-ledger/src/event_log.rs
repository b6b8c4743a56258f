//! Append-only outbound record log.
//!
//! The log is the bridge's only side channel to the fulfillment
//! collaborator. Consumers either poll by sequence number or subscribe to a
//! broadcast channel; a lagging subscriber can always catch up by polling,
//! because the log keeps every record.

use cardbridge_types::{AcceptanceEvent, BridgeEvent, EventEnvelope, EventId, SettlementRecord};
use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;

/// Destination for emitted records.
pub trait EventSink: Send + Sync {
    /// Append one record and return its id.
    fn emit(&self, event: BridgeEvent) -> EventId;
}

/// In-memory [`EventSink`] with polling and subscription.
pub struct EventLog {
    records: RwLock<Vec<EventEnvelope>>,
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventLog {
    /// Create a log whose subscription channel buffers `capacity` records.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "EventLog capacity must be > 0");
        let (sender, _) = broadcast::channel(capacity);
        Self {
            records: RwLock::new(Vec::new()),
            sender,
        }
    }

    /// Receive every record emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Records with `sequence >= from`, in order.
    #[must_use]
    pub fn since(&self, from: u64) -> Vec<EventEnvelope> {
        let records = self.records.read();
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(records.len());
        records[start..].to_vec()
    }

    /// Every record, in order.
    #[must_use]
    pub fn records(&self) -> Vec<EventEnvelope> {
        self.records.read().clone()
    }

    #[must_use]
    pub fn acceptances(&self) -> Vec<AcceptanceEvent> {
        self.records
            .read()
            .iter()
            .filter_map(|r| r.event.as_acceptance().cloned())
            .collect()
    }

    #[must_use]
    pub fn settlements(&self) -> Vec<SettlementRecord> {
        self.records
            .read()
            .iter()
            .filter_map(|r| r.event.as_settlement().cloned())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: BridgeEvent) -> EventId {
        // Held across the broadcast so subscribers see sequence order.
        let mut records = self.records.write();
        let envelope = EventEnvelope {
            id: EventId::new(),
            sequence: records.len() as u64,
            emitted_at: Utc::now(),
            event,
        };
        let id = envelope.id;
        tracing::debug!(
            sequence = envelope.sequence,
            kind = envelope.event.kind(),
            "Record emitted"
        );
        records.push(envelope.clone());
        // No subscribers is not an error: the log keeps the record.
        let _ = self.sender.send(envelope);
        id
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(cardbridge_types::constants::DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}
