//! Versioned snapshot store.
//!
//! Holds the current telemetry snapshot behind a `tokio::sync::watch`
//! channel. Every accepted publish bumps the version, which is what chat
//! sessions bind to.

use chrono::Utc;
use ecopulse_core::{DomainEvent, EventBus, Result, TelemetrySnapshot, VersionedSnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

pub struct SnapshotStore {
    sender: watch::Sender<VersionedSnapshot>,
    events: Option<Arc<EventBus>>,
}

impl SnapshotStore {
    /// Create a store holding `initial` as version 1.
    ///
    /// Fails with `InvalidSnapshot` when the snapshot has no history.
    pub fn new(initial: TelemetrySnapshot) -> Result<Self> {
        initial.validate()?;
        let (sender, _) = watch::channel(VersionedSnapshot::new(1, initial));
        Ok(Self {
            sender,
            events: None,
        })
    }

    /// Publish `SnapshotPublished` events on the given bus.
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Adopt a new snapshot and notify subscribers. Returns the new version.
    ///
    /// An invalid snapshot is rejected and the current one stays in place.
    pub fn publish(&self, snapshot: TelemetrySnapshot) -> Result<u64> {
        snapshot.validate()?;

        let snapshot = Arc::new(snapshot);
        let mut version = 0;
        self.sender.send_modify(|current| {
            version = current.version + 1;
            *current = VersionedSnapshot {
                version,
                snapshot: Arc::clone(&snapshot),
            };
        });

        info!(version, points = snapshot.history.len(), "Snapshot published");
        if let Some(events) = &self.events {
            events.publish(DomainEvent::SnapshotPublished {
                version,
                timestamp: Utc::now(),
            });
        }
        Ok(version)
    }

    /// The snapshot currently in effect.
    pub fn current(&self) -> VersionedSnapshot {
        self.sender.borrow().clone()
    }

    pub fn version(&self) -> u64 {
        self.sender.borrow().version
    }

    /// A receiver that observes every subsequent publish.
    pub fn subscribe(&self) -> watch::Receiver<VersionedSnapshot> {
        self.sender.subscribe()
    }
}
