//! Session event types and EventBus
//!
//! The session controller publishes what changed; view adapters subscribe
//! and re-render. Events are serializable so an adapter can forward them
//! over any transport it likes.

use crate::models::UiPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default number of buffered events per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Events emitted by the session controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Active UI section changed
    PhaseChanged {
        old_phase: UiPhase,
        new_phase: UiPhase,
        timestamp: DateTime<Utc>,
    },

    /// Extraction succeeded and the address collection was replaced
    AddressesLoaded {
        session_id: Uuid,
        count: usize,
        /// Whether the response carried several addresses (enables navigation)
        multiple: bool,
        timestamp: DateTime<Utc>,
    },

    /// Cursor moved to another address
    CursorMoved {
        from: usize,
        to: usize,
        timestamp: DateTime<Utc>,
    },

    /// Extraction request failed; `message` is what the user sees
    ExtractionFailed {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Forwarding addresses to server-side storage failed (form is still shown)
    AddressStorageFailed {
        session_id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Submit was blocked by blank required fields
    SubmissionRejected {
        missing_fields: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// Submission payload assembled and ready to post
    SubmissionPrepared {
        address_count: usize,
        same_dimensions: bool,
        timestamp: DateTime<Utc>,
    },

    /// Session cleared back to the input phase
    SessionReset { timestamp: DateTime<Utc> },
}

/// Broadcast channel for session events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use shipform_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
