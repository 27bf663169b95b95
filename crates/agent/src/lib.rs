//! The analysis pipeline of EcoPulse.
//!
//! Turns telemetry snapshots into insights and conversations:
//!
//! 1. **Build** a prompt from the current snapshot and analysis mode
//! 2. **Generate** text through the configured provider, at most one call in flight
//! 3. **Extract** the labeled sections into a typed [`InsightRecord`]
//! 4. **Chat** through a session bound to one snapshot version
//!
//! Remote failures never reach the caller: they are absorbed into fixed
//! fallback records and sentinel chat replies.
//!
//! [`InsightRecord`]: ecopulse_core::InsightRecord

pub mod chat;
pub mod dashboard;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use chat::{ChatSession, ChatSessionManager};
pub use dashboard::Dashboard;
pub use orchestrator::{AnalysisOutcome, InsightOrchestrator};
