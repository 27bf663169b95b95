//! Insight orchestration with a single in-flight analysis.
//!
//! Requests go through a one-slot pending queue: the newest request replaces
//! any request still waiting, and whichever caller finds the orchestrator
//! idle becomes the driver that drains the slot. Every caller resolves with
//! the first outcome whose ticket is at least its own, so a superseded
//! request observes the result of the request that replaced it.
//!
//! ```text
//!          run_analysis ──▶ pending (latest wins)
//!                                 │
//!   Idle ──try_acquire──▶ Running ┴─▶ generate ─▶ extract ─▶ outcome
//!    ▲                       │
//!    └──── pending empty ────┘
//! ```

use chrono::{DateTime, Utc};
use ecopulse_analytics::{SectionMap, SectionTag, build_prompt};
use ecopulse_core::{
    AnalysisMode, DomainEvent, Error, EventBus, GenerationRequest, InsightRecord, Provider,
    Result, TelemetrySnapshot,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// The result of one completed analysis.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Ticket of the request that produced this record
    pub ticket: u64,
    pub mode: AnalysisMode,
    pub record: InsightRecord,
    /// Wall-clock completion time, for a "last updated" readout
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Queued {
    ticket: u64,
    mode: AnalysisMode,
    request: GenerationRequest,
}

#[derive(Debug, Default)]
struct RunState {
    running: bool,
    next_ticket: u64,
    pending: Option<Queued>,
}

/// Coordinates prompt building, the remote generation call and section
/// extraction. Never runs two remote calls at once.
pub struct InsightOrchestrator {
    provider: Arc<dyn Provider>,
    events: Arc<EventBus>,
    state: Mutex<RunState>,
    outcome: watch::Sender<Option<AnalysisOutcome>>,
    busy: watch::Sender<bool>,
}

impl InsightOrchestrator {
    pub fn new(provider: Arc<dyn Provider>, events: Arc<EventBus>) -> Self {
        Self {
            provider,
            events,
            state: Mutex::new(RunState::default()),
            outcome: watch::Sender::new(None),
            busy: watch::Sender::new(false),
        }
    }

    /// Analyze `snapshot` in `mode`.
    ///
    /// Remote failures are absorbed into [`InsightRecord::fallback`]. The only
    /// error is `InvalidSnapshot`, raised before anything is queued.
    pub async fn run_analysis(
        &self,
        snapshot: &TelemetrySnapshot,
        mode: AnalysisMode,
    ) -> Result<InsightRecord> {
        let request = build_prompt(snapshot, mode)?;

        // Subscribe before queueing so the outcome for our ticket cannot be missed
        let mut outcomes = self.outcome.subscribe();
        let ticket = self.enqueue(request, mode);

        loop {
            if let Some(outcome) = outcomes.borrow_and_update().as_ref() {
                if outcome.ticket >= ticket {
                    return Ok(outcome.record.clone());
                }
            }

            if self.try_acquire() {
                self.drive().await;
                continue;
            }

            if outcomes.changed().await.is_err() {
                return Err(Error::Internal("analysis outcome channel closed".into()));
            }
        }
    }

    /// Whether an analysis is currently running.
    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// Observe busy flag transitions.
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    /// The most recent completed analysis.
    pub fn latest(&self) -> Option<AnalysisOutcome> {
        self.outcome.borrow().clone()
    }

    /// Completion time of the most recent analysis.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.outcome.borrow().as_ref().map(|o| o.completed_at)
    }

    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enqueue(&self, request: GenerationRequest, mode: AnalysisMode) -> u64 {
        let mut state = self.lock_state();
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        if let Some(superseded) = state.pending.replace(Queued {
            ticket,
            mode,
            request,
        }) {
            debug!(superseded = superseded.ticket, by = ticket, "Pending analysis superseded");
        }
        ticket
    }

    /// Test-and-set entry into the running state.
    fn try_acquire(&self) -> bool {
        let mut state = self.lock_state();
        if state.running {
            return false;
        }
        state.running = true;
        self.set_busy(true);
        true
    }

    /// Must be called with the state lock held so busy transitions stay
    /// ordered with the `running` flag.
    fn set_busy(&self, is_busy: bool) {
        self.busy.send_replace(is_busy);
        self.events.publish(DomainEvent::AnalysisStateChanged {
            is_busy,
            timestamp: Utc::now(),
        });
        debug!(is_busy, "Analysis state changed");
    }

    /// Drain the pending slot, one remote call at a time.
    async fn drive(&self) {
        let mut guard = DriveGuard {
            orchestrator: self,
            in_flight: None,
            finished: false,
        };

        loop {
            let next = {
                let mut state = self.lock_state();
                match state.pending.take() {
                    Some(next) => next,
                    None => {
                        state.running = false;
                        self.set_busy(false);
                        break;
                    }
                }
            };

            guard.in_flight = Some(next.clone());
            let record = self.execute(&next).await;
            guard.in_flight = None;

            let completed_at = Utc::now();
            let fallback = record.is_fallback();
            info!(ticket = next.ticket, mode = %next.mode, fallback, "Analysis completed");
            // Store the outcome first so listeners of the event can read it
            self.outcome.send_replace(Some(AnalysisOutcome {
                ticket: next.ticket,
                mode: next.mode,
                record,
                completed_at,
            }));
            self.events.publish(DomainEvent::AnalysisCompleted {
                ticket: next.ticket,
                mode: next.mode,
                fallback,
                timestamp: completed_at,
            });
        }

        guard.finished = true;
    }

    async fn execute(&self, queued: &Queued) -> InsightRecord {
        debug!(ticket = queued.ticket, mode = %queued.mode, provider = %self.provider.name(), "Requesting insights");

        match self.provider.generate(queued.request.clone()).await {
            Ok(response) => assemble_record(&response.text, queued.mode),
            Err(e) => {
                warn!(ticket = queued.ticket, error = %e, "Insight generation failed, using fallback record");
                self.events.publish(DomainEvent::ErrorOccurred {
                    context: "insight generation".into(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                InsightRecord::fallback()
            }
        }
    }
}

/// Assemble an insight record from generated text.
///
/// Every required field falls back to `"N/A"` when its section is missing;
/// the narrative is only assembled in storytelling mode.
pub fn assemble_record(text: &str, mode: AnalysisMode) -> InsightRecord {
    let sections = SectionMap::parse(text);
    if sections.is_empty() {
        debug!(chars = text.len(), "Generated text contained no section tags");
    }

    InsightRecord {
        status: sections.section(SectionTag::DashboardStatus),
        insight: sections.section(SectionTag::EnergyInsight),
        prediction: sections.section(SectionTag::AiPrediction),
        solar_forecast: sections.section(SectionTag::SolarForecast),
        alert: sections.section(SectionTag::Alert),
        action: sections.section(SectionTag::RecommendedAction),
        impact: sections.section(SectionTag::SustainabilityImpact),
        narrative: mode
            .is_storytelling()
            .then(|| sections.section(SectionTag::Narrative)),
    }
}

/// Releases the running state if the driving caller is dropped mid-call.
///
/// The interrupted request goes back into the pending slot unless a newer
/// one already took its place, and waiters are woken so one of them can
/// take over as driver.
struct DriveGuard<'a> {
    orchestrator: &'a InsightOrchestrator,
    in_flight: Option<Queued>,
    finished: bool,
}

impl Drop for DriveGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let orchestrator = self.orchestrator;
        {
            let mut state = orchestrator.lock_state();
            if let Some(interrupted) = self.in_flight.take() {
                if state.pending.is_none() {
                    state.pending = Some(interrupted);
                }
            }
            state.running = false;
            orchestrator.set_busy(false);
        }
        warn!("Analysis driver dropped mid-call; handing over to waiting callers");
        orchestrator.outcome.send_modify(|_| {});
    }
}
