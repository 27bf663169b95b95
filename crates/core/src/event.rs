//! Domain events for observing the analysis pipeline.
//!
//! Events are published when something interesting happens. The busy flag
//! transitions of the insight orchestrator are published here so an external
//! watcher sees every `Idle → Running → Idle` pair.

use crate::insight::AnalysisMode;
use crate::message::ChatRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The snapshot store adopted a new snapshot
    SnapshotPublished {
        version: u64,
        timestamp: DateTime<Utc>,
    },

    /// The orchestrator entered or left the running state
    AnalysisStateChanged {
        is_busy: bool,
        timestamp: DateTime<Utc>,
    },

    /// One analysis request finished (successfully or with the fallback record)
    AnalysisCompleted {
        ticket: u64,
        mode: AnalysisMode,
        fallback: bool,
        timestamp: DateTime<Utc>,
    },

    /// A chat session was opened for a snapshot version
    ChatSessionOpened {
        session_id: String,
        snapshot_version: u64,
        timestamp: DateTime<Utc>,
    },

    /// A message was appended to a chat transcript
    ChatMessageAppended {
        session_id: String,
        role: ChatRole,
        timestamp: DateTime<Utc>,
    },

    /// An error occurred and was absorbed
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
