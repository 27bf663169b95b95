//! Dashboard controller: decides when analyses run.
//!
//! A mode change triggers exactly one fresh analysis and a manual refresh
//! triggers another. Overlapping triggers are coalesced by the orchestrator,
//! so the newest request is what the caller eventually observes.

use crate::chat::ChatSessionManager;
use crate::orchestrator::InsightOrchestrator;
use chrono::{DateTime, Utc};
use ecopulse_core::{
    AnalysisMode, BatteryProjection, ChatMessage, InsightRecord, Result, VersionedSnapshot,
};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::info;

pub struct Dashboard {
    snapshots: watch::Receiver<VersionedSnapshot>,
    orchestrator: Arc<InsightOrchestrator>,
    chat: tokio::sync::Mutex<ChatSessionManager>,
    mode: Mutex<AnalysisMode>,
}

impl Dashboard {
    pub fn new(
        snapshots: watch::Receiver<VersionedSnapshot>,
        orchestrator: Arc<InsightOrchestrator>,
        chat: ChatSessionManager,
        mode: AnalysisMode,
    ) -> Self {
        Self {
            snapshots,
            orchestrator,
            chat: tokio::sync::Mutex::new(chat),
            mode: Mutex::new(mode),
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The snapshot currently published by the store.
    pub fn snapshot(&self) -> VersionedSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Switch modes. Runs one analysis when the mode actually changed and
    /// returns its record; returns `None` without running otherwise.
    pub async fn set_mode(&self, mode: AnalysisMode) -> Result<Option<InsightRecord>> {
        let previous = {
            let mut current = self.mode.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, mode)
        };
        if previous == mode {
            return Ok(None);
        }

        info!(from = %previous, to = %mode, "Analysis mode changed");
        self.analyze(mode).await.map(Some)
    }

    /// Run one analysis of the current snapshot in the current mode.
    pub async fn refresh(&self) -> Result<InsightRecord> {
        self.analyze(self.mode()).await
    }

    /// Battery projection for the current snapshot.
    pub fn projection(&self) -> Result<BatteryProjection> {
        ecopulse_analytics::project(&self.snapshot().snapshot)
    }

    /// Send a chat message through a session bound to the current snapshot.
    pub async fn chat(&self, text: &str) -> Result<ChatMessage> {
        let snapshot = self.snapshot();
        self.chat.lock().await.send(&snapshot, text).await
    }

    /// The active session's transcript, oldest first.
    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.chat
            .lock()
            .await
            .active()
            .map(|session| session.transcript().messages().to_vec())
            .unwrap_or_default()
    }

    /// Completion time of the latest analysis.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.orchestrator.last_updated()
    }

    pub fn orchestrator(&self) -> &Arc<InsightOrchestrator> {
        &self.orchestrator
    }

    async fn analyze(&self, mode: AnalysisMode) -> Result<InsightRecord> {
        let snapshot = self.snapshot();
        self.orchestrator.run_analysis(&snapshot.snapshot, mode).await
    }
}
