//! Shared test helpers for orchestrator, chat and dashboard tests.

use async_trait::async_trait;
use ecopulse_core::error::ProviderError;
use ecopulse_core::provider::{GenerationRequest, GenerationResponse, Provider, RemoteSession, Usage};
use ecopulse_core::{EnergyPoint, SensorState, SensorStatus, TelemetrySnapshot};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Script = Arc<Mutex<VecDeque<Result<String, ProviderError>>>>;

/// A mock provider that returns a sequence of scripted replies.
///
/// `generate` and every session's `send` consume from the same queue.
/// Panics if more calls are made than replies provided.
pub struct ScriptedProvider {
    replies: Script,
    delay: Duration,
    requests: Mutex<Vec<GenerationRequest>>,
    system_prompts: Mutex<Vec<String>>,
    session_error: Option<ProviderError>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            system_prompts: Mutex::new(Vec::new()),
            session_error: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Create a provider whose replies all succeed.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    /// Every remote call suspends for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// `create_session` fails with `error`.
    pub fn failing_sessions(mut self, error: ProviderError) -> Self {
        self.session_error = Some(error);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.system_prompts.lock().unwrap().clone()
    }

    /// Highest number of overlapping `generate` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn next_reply(replies: &Script) -> Result<GenerationResponse, ProviderError> {
    let reply = replies
        .lock()
        .unwrap()
        .pop_front()
        .expect("ScriptedProvider: no more replies");
    reply.map(|text| GenerationResponse {
        text,
        model: "mock-model".into(),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
    })
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        next_reply(&self.replies)
    }

    async fn create_session(
        &self,
        system_prompt: &str,
    ) -> Result<Box<dyn RemoteSession>, ProviderError> {
        self.system_prompts.lock().unwrap().push(system_prompt.to_string());
        if let Some(error) = &self.session_error {
            return Err(error.clone());
        }
        Ok(Box::new(ScriptedSession {
            replies: Arc::clone(&self.replies),
            delay: self.delay,
        }))
    }
}

struct ScriptedSession {
    replies: Script,
    delay: Duration,
}

#[async_trait]
impl RemoteSession for ScriptedSession {
    async fn send(&self, _message: &str) -> Result<GenerationResponse, ProviderError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        next_reply(&self.replies)
    }
}

/// A reply carrying every requested section with non-empty content.
pub fn full_reply(with_narrative: bool) -> String {
    let mut text = String::from(
        "[DASHBOARD STATUS]\nGrid nominal, battery discharging.\n\
         [ENERGY INSIGHT]\nServer Rack A drives 40% of load.\n\
         [AI PREDICTION]\nPeak of 16kW expected at 19:00.\n\
         [SOLAR FORECAST]\nClear skies, 11kW at noon.\n\
         [ALERT]\nLighting Grid degraded.\n\
         [RECOMMENDED ACTION]\nShift EV charging to 13:00.\n\
         [SUSTAINABILITY IMPACT]\n4.2kg CO2 avoided today.\n",
    );
    if with_narrative {
        text.push_str("[NARRATIVE]\nThe panels drink the dawn.\n");
    }
    text
}

/// A small valid snapshot: 12kW draw, 2kW solar, 60% battery.
pub fn sample_snapshot() -> TelemetrySnapshot {
    TelemetrySnapshot {
        current_power: 12.0,
        peak_today: 15.5,
        total_consumption: 250.0,
        efficiency_score: 84.0,
        carbon_saved: 124.5,
        sensors: vec![SensorStatus {
            id: "iot-003".into(),
            name: "Lighting Grid".into(),
            status: SensorState::Degraded,
            last_ping: "5m ago".into(),
            load: 12,
        }],
        history: vec![EnergyPoint {
            time: "14:00".into(),
            usage: 12.0,
            solar: 2.0,
            battery: 60,
            cost: 1.8,
        }],
    }
}
