//! End-to-end integration tests for the EcoPulse analysis pipeline.
//!
//! These tests exercise the full path from simulated telemetry to insight
//! records and chat transcripts, with the Gemini backend served by a local
//! HTTP fixture.

use std::sync::Arc;
use std::time::Duration;

use ecopulse_agent::chat::{GREETING, SYSTEM_TIMEOUT};
use ecopulse_agent::{ChatSessionManager, Dashboard, InsightOrchestrator};
use ecopulse_config::AppConfig;
use ecopulse_core::error::ProviderError;
use ecopulse_core::provider::{GenerationRequest, GenerationResponse, Provider, RemoteSession};
use ecopulse_core::{AnalysisMode, ChatRole, DomainEvent, EventBus, InsightRecord, NOT_AVAILABLE};
use ecopulse_providers::{TimeoutProvider, build_from_config};
use ecopulse_telemetry::{SnapshotStore, TelemetrySimulator};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-test:generateContent";

// ── Fixtures ─────────────────────────────────────────────────────────────

fn gemini_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 300,
            "candidatesTokenCount": 120,
            "totalTokenCount": 420
        }
    })
}

const FULL_INSIGHT: &str = "\
[DASHBOARD STATUS]
Grid stable; battery discharging at a moderate rate.
[ENERGY INSIGHT]
Server Rack A accounts for the bulk of base load.
[AI PREDICTION]
Demand peaks near 19:00.
[SOLAR FORECAST]
Light cloud cover [1]; yield drops 15% after 15:00.
[ALERT]
EV Charging offline.
[RECOMMENDED ACTION]
Defer HVAC pre-cooling until solar recovers.
[SUSTAINABILITY IMPACT]
5.1kg CO2 avoided today.
[NARRATIVE]
The lithium heart beats slower as the sun leans west.
";

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        api_key: Some("test-key".into()),
        model: "gemini-test".into(),
        api_url: Some(server.uri()),
        request_timeout_secs: 5,
        ..AppConfig::default()
    }
}

struct Harness {
    store: SnapshotStore,
    simulator: TelemetrySimulator,
    dashboard: Dashboard,
    events: Arc<EventBus>,
}

fn harness(provider: Arc<dyn Provider>, mode: AnalysisMode) -> Harness {
    let events = Arc::new(EventBus::default());
    let mut simulator = TelemetrySimulator::seeded(24, 2024);
    let store = SnapshotStore::new(simulator.snapshot())
        .unwrap()
        .with_events(events.clone());
    let orchestrator = Arc::new(InsightOrchestrator::new(provider.clone(), events.clone()));
    let dashboard = Dashboard::new(
        store.subscribe(),
        orchestrator,
        ChatSessionManager::new(provider, events.clone()),
        mode,
    );
    Harness {
        store,
        simulator,
        dashboard,
        events,
    }
}

async fn request_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

/// A provider that never answers.
struct HangingProvider;

#[async_trait::async_trait]
impl Provider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        unreachable!()
    }

    async fn create_session(
        &self,
        _system_prompt: &str,
    ) -> Result<Box<dyn RemoteSession>, ProviderError> {
        Ok(Box::new(HangingSession))
    }
}

struct HangingSession;

#[async_trait::async_trait]
impl RemoteSession for HangingSession {
    async fn send(&self, _message: &str) -> Result<GenerationResponse, ProviderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        unreachable!()
    }
}

// ── Analysis ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn analysis_round_trip_through_gemini() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(FULL_INSIGHT)))
        .mount(&server)
        .await;

    let provider = build_from_config(&config_for(&server)).unwrap();
    let h = harness(provider, AnalysisMode::Analytical);

    let record = h.dashboard.refresh().await.unwrap();

    assert!(record.fields().iter().all(|(_, v)| *v != NOT_AVAILABLE));
    assert_eq!(record.alert, "EV Charging offline.");
    assert_eq!(
        record.solar_forecast,
        "Light cloud cover [1]; yield drops 15% after 15:00."
    );
    assert!(record.narrative.is_none());
    assert!(record.has_active_alert());
    assert!(h.dashboard.last_updated().is_some());

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    let prompt = bodies[0]["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Current System Telemetry:"));
    assert!(prompt.contains("- Compromised Nodes: Lighting Grid, EV Charging"));
    assert!(prompt.contains("[SUSTAINABILITY IMPACT]"));
    assert!(!prompt.contains("[NARRATIVE]"));
    assert_eq!(bodies[0]["tools"][0], serde_json::json!({ "googleSearch": {} }));
}

#[tokio::test]
async fn mode_change_requests_narrative_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(FULL_INSIGHT)))
        .mount(&server)
        .await;

    let provider = build_from_config(&config_for(&server)).unwrap();
    let h = harness(provider, AnalysisMode::Analytical);

    let record = h
        .dashboard
        .set_mode(AnalysisMode::Storytelling)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        record.narrative.as_deref(),
        Some("The lithium heart beats slower as the sun leans west.")
    );
    assert_eq!(
        record.headline(AnalysisMode::Storytelling),
        "The lithium heart beats slower as the sun leans west."
    );

    // Same mode again: nothing sent
    assert!(h.dashboard.set_mode(AnalysisMode::Storytelling).await.unwrap().is_none());

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    let temperature = bodies[0]["generationConfig"]["temperature"].as_f64().unwrap();
    assert!((temperature - 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn backend_error_yields_fallback_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let provider = build_from_config(&config_for(&server)).unwrap();
    let h = harness(provider, AnalysisMode::Storytelling);
    let mut rx = h.events.subscribe();

    let record = h.dashboard.refresh().await.unwrap();
    assert_eq!(record, InsightRecord::fallback());
    assert!(!h.dashboard.orchestrator().is_busy());

    let mut busy = Vec::new();
    let mut completed_with_fallback = false;
    while let Ok(event) = rx.try_recv() {
        match event.as_ref() {
            DomainEvent::AnalysisStateChanged { is_busy, .. } => busy.push(*is_busy),
            DomainEvent::AnalysisCompleted { fallback, .. } => completed_with_fallback = *fallback,
            _ => {}
        }
    }
    assert_eq!(busy, vec![true, false]);
    assert!(completed_with_fallback);
}

#[tokio::test(start_paused = true)]
async fn hung_backend_times_out_into_fallback() {
    let provider: Arc<dyn Provider> = Arc::new(TimeoutProvider::new(
        Arc::new(HangingProvider),
        Duration::from_secs(30),
    ));
    let h = harness(provider, AnalysisMode::Analytical);

    let record = h.dashboard.refresh().await.unwrap();
    assert!(record.is_fallback());
    assert!(!h.dashboard.orchestrator().is_busy());

    let reply = h.dashboard.chat("status?").await.unwrap();
    assert_eq!(reply.text, SYSTEM_TIMEOUT);
}

#[tokio::test]
async fn overlapping_refreshes_coalesce() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply(FULL_INSIGHT))
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let provider = build_from_config(&config_for(&server)).unwrap();
    let h = harness(provider, AnalysisMode::Analytical);
    let mut rx = h.events.subscribe();

    let (a, b, c) = tokio::join!(
        h.dashboard.refresh(),
        h.dashboard.refresh(),
        h.dashboard.refresh(),
    );
    assert_eq!(a.unwrap(), b.unwrap());
    assert!(c.is_ok());

    // One in flight, one pending that absorbed the third
    assert_eq!(request_bodies(&server).await.len(), 2);

    let mut busy = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let DomainEvent::AnalysisStateChanged { is_busy, .. } = event.as_ref() {
            busy.push(*is_busy);
        }
    }
    assert_eq!(busy, vec![true, false]);
}

// ── Chat ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_session_rebinds_on_new_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("ACKNOWLEDGED.")))
        .mount(&server)
        .await;

    let provider = build_from_config(&config_for(&server)).unwrap();
    let mut h = harness(provider, AnalysisMode::Analytical);

    let reply = h.dashboard.chat("battery status?").await.unwrap();
    assert_eq!(reply.text, "ACKNOWLEDGED.");

    let transcript = h.dashboard.transcript().await;
    let roles: Vec<ChatRole> = transcript.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![ChatRole::Model, ChatRole::User, ChatRole::Model]);
    assert_eq!(transcript[0].text, GREETING);

    // Roll the telemetry forward; the next message opens a fresh session
    let current = h.store.current();
    let next = h.simulator.advance(&current.snapshot, chrono::Local::now().naive_local());
    assert_eq!(h.store.publish(next).unwrap(), 2);

    h.dashboard.chat("and now?").await.unwrap();
    let transcript = h.dashboard.transcript().await;
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1].text, "and now?");

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    // The second session carries no history from the first
    assert_eq!(bodies[1]["contents"].as_array().unwrap().len(), 1);
    let instruction = bodies[1]["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
    assert!(instruction.contains("Current Demand:"));
    assert!(instruction.contains("building's core OS"));
}

#[tokio::test]
async fn chat_history_accumulates_within_a_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("NOMINAL.")))
        .mount(&server)
        .await;

    let provider = build_from_config(&config_for(&server)).unwrap();
    let h = harness(provider, AnalysisMode::Analytical);

    h.dashboard.chat("one").await.unwrap();
    h.dashboard.chat("two").await.unwrap();

    let bodies = request_bodies(&server).await;
    let contents = bodies[1]["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["parts"][0]["text"], "one");
    assert_eq!(contents[1]["parts"][0]["text"], "NOMINAL.");
    assert_eq!(contents[2]["parts"][0]["text"], "two");
    assert!(bodies[1].get("tools").is_none());
}

#[tokio::test]
async fn rejected_key_still_keeps_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let provider = build_from_config(&config_for(&server)).unwrap();
    let h = harness(provider, AnalysisMode::Analytical);

    let reply = h.dashboard.chat("hello?").await.unwrap();
    assert_eq!(reply.text, SYSTEM_TIMEOUT);

    let transcript = h.dashboard.transcript().await;
    assert_eq!(transcript[1].role, ChatRole::User);
    assert_eq!(transcript[1].text, "hello?");
    assert_eq!(transcript[2].text, SYSTEM_TIMEOUT);
}

// ── Local metrics ────────────────────────────────────────────────────────

#[tokio::test]
async fn projection_is_local_only() {
    let server = MockServer::start().await;
    let provider = build_from_config(&config_for(&server)).unwrap();
    let h = harness(provider, AnalysisMode::Analytical);

    let projection = h.dashboard.projection().unwrap();
    let snapshot = h.dashboard.snapshot();
    let latest = snapshot.snapshot.latest().unwrap();
    let net = snapshot.snapshot.current_power - latest.solar;
    if net <= 0.0 {
        assert_eq!(projection.label, "Charging");
    } else {
        assert!(projection.label.ends_with('m'));
        assert_eq!(projection.is_critical, f64::from(latest.battery) / 100.0 * 50.0 / net < 2.0);
    }

    assert!(request_bodies(&server).await.is_empty());
}
