//! Chat sessions bound to a telemetry snapshot version.
//!
//! The system instruction is frozen when the session opens. When the store
//! publishes a newer snapshot the manager discards the session and opens a
//! fresh one rather than refreshing it mid-conversation.

use chrono::Utc;
use ecopulse_analytics::build_chat_instruction;
use ecopulse_core::{
    ChatMessage, DomainEvent, Error, EventBus, Provider, RemoteSession, Result,
    Transcript, VersionedSnapshot,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// First message of every transcript.
pub const GREETING: &str = "ECOPULSE NEURAL LINK ESTABLISHED. STANDING BY FOR QUERIES.";

/// Reply recorded when the backend answers with empty text.
pub const NULL_RESPONSE: &str = "ERROR: NULL_RESPONSE";

/// Reply recorded when the backend call fails.
pub const SYSTEM_TIMEOUT: &str = "CRITICAL ERROR: SYSTEM_TIMEOUT";

/// One conversation with the backend, bound to a snapshot version.
pub struct ChatSession {
    id: String,
    snapshot_version: u64,
    /// `None` when the remote session could not be opened
    handle: Option<Box<dyn RemoteSession>>,
    transcript: Transcript,
    events: Arc<EventBus>,
}

impl ChatSession {
    /// Open a session seeded with `snapshot`.
    ///
    /// Fails only with `InvalidSnapshot`. A failure to open the remote
    /// session is absorbed: the session stays usable and every send answers
    /// with the timeout sentinel.
    pub async fn open(
        provider: &dyn Provider,
        snapshot: &VersionedSnapshot,
        events: Arc<EventBus>,
    ) -> Result<Self> {
        let instruction = build_chat_instruction(&snapshot.snapshot)?;
        let id = uuid::Uuid::new_v4().to_string();

        let handle = match provider.create_session(&instruction).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(session = %id, error = %e, "Failed to open chat session");
                events.publish(DomainEvent::ErrorOccurred {
                    context: "chat session".into(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                None
            }
        };

        info!(session = %id, snapshot_version = snapshot.version, connected = handle.is_some(), "Chat session opened");
        events.publish(DomainEvent::ChatSessionOpened {
            session_id: id.clone(),
            snapshot_version: snapshot.version,
            timestamp: Utc::now(),
        });

        let mut session = Self {
            id,
            snapshot_version: snapshot.version,
            handle,
            transcript: Transcript::new(),
            events,
        };
        session.append(ChatMessage::model(GREETING));
        Ok(session)
    }

    /// Send a user message and return the model reply.
    ///
    /// Both messages are appended to the transcript in order. Remote
    /// failures become the `CRITICAL ERROR: SYSTEM_TIMEOUT` reply.
    pub async fn send(&mut self, text: &str) -> ChatMessage {
        self.append(ChatMessage::user(text));

        let reply = match &self.handle {
            Some(handle) => match handle.send(text).await {
                Ok(response) if response.text.is_empty() => {
                    debug!(session = %self.id, "Empty chat reply");
                    NULL_RESPONSE.to_string()
                }
                Ok(response) => response.text,
                Err(e) => {
                    warn!(session = %self.id, error = %e, "Chat send failed");
                    self.events.publish(DomainEvent::ErrorOccurred {
                        context: "chat send".into(),
                        error_message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                    SYSTEM_TIMEOUT.to_string()
                }
            },
            None => SYSTEM_TIMEOUT.to_string(),
        };

        let reply = ChatMessage::model(reply);
        self.append(reply.clone());
        reply
    }

    fn append(&mut self, message: ChatMessage) {
        self.events.publish(DomainEvent::ChatMessageAppended {
            session_id: self.id.clone(),
            role: message.role,
            timestamp: message.timestamp,
        });
        self.transcript.push(message);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn snapshot_version(&self) -> u64 {
        self.snapshot_version
    }

    /// Whether the remote session was opened successfully.
    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}

/// Owns the active chat session and replaces it when the snapshot moves.
pub struct ChatSessionManager {
    provider: Arc<dyn Provider>,
    events: Arc<EventBus>,
    active: Option<ChatSession>,
}

impl ChatSessionManager {
    pub fn new(provider: Arc<dyn Provider>, events: Arc<EventBus>) -> Self {
        Self {
            provider,
            events,
            active: None,
        }
    }

    /// The session bound to `snapshot`, opening a new one when there is none
    /// or the active one is bound to another version.
    pub async fn ensure_session(&mut self, snapshot: &VersionedSnapshot) -> Result<&mut ChatSession> {
        let stale = self
            .active
            .as_ref()
            .is_none_or(|session| session.snapshot_version != snapshot.version);

        if stale {
            let session = ChatSession::open(self.provider.as_ref(), snapshot, self.events.clone()).await?;
            if let Some(previous) = self.active.replace(session) {
                debug!(
                    session = %previous.id,
                    from = previous.snapshot_version,
                    to = snapshot.version,
                    "Discarded chat session bound to an older snapshot"
                );
            }
        }

        self.active
            .as_mut()
            .ok_or_else(|| Error::Internal("no active chat session".into()))
    }

    /// Send through the session bound to `snapshot`.
    pub async fn send(&mut self, snapshot: &VersionedSnapshot, text: &str) -> Result<ChatMessage> {
        let session = self.ensure_session(snapshot).await?;
        Ok(session.send(text).await)
    }

    pub fn active(&self) -> Option<&ChatSession> {
        self.active.as_ref()
    }

    /// Abandon the active session, if any.
    pub fn reset(&mut self) {
        self.active = None;
    }
}
