//! CLI command implementations and the wiring they share.

pub mod analyze;
pub mod chat;
pub mod onboard;
pub mod snapshot;
pub mod status;
pub mod watch;

use ecopulse_agent::{ChatSessionManager, Dashboard, InsightOrchestrator};
use ecopulse_config::AppConfig;
use ecopulse_core::{AnalysisMode, BatteryProjection, EventBus, InsightRecord};
use ecopulse_telemetry::{SnapshotStore, TelemetrySimulator};
use std::sync::Arc;

type CommandResult<T> = Result<T, Box<dyn std::error::Error>>;

pub(crate) fn load_config() -> CommandResult<AppConfig> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Fail early with setup instructions when no API key is available.
pub(crate) fn require_api_key(config: &AppConfig) -> CommandResult<()> {
    if config.has_api_key() {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    export GEMINI_API_KEY=...      (recommended)");
    eprintln!("    export ECOPULSE_API_KEY=...    (generic)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

/// Everything a live command needs: the telemetry source, the store it
/// publishes to, and the dashboard reading from it.
pub(crate) struct Runtime {
    pub simulator: TelemetrySimulator,
    pub store: SnapshotStore,
    pub dashboard: Arc<Dashboard>,
    pub events: Arc<EventBus>,
}

pub(crate) fn bootstrap(config: &AppConfig, mode: AnalysisMode) -> CommandResult<Runtime> {
    require_api_key(config)?;
    let provider = ecopulse_providers::build_from_config(config)?;
    let events = Arc::new(EventBus::default());

    let mut simulator =
        TelemetrySimulator::with_seed(config.simulator.history_points, config.simulator.seed);
    let store = SnapshotStore::new(simulator.snapshot())?.with_events(events.clone());

    let orchestrator = Arc::new(InsightOrchestrator::new(provider.clone(), events.clone()));
    let dashboard = Arc::new(Dashboard::new(
        store.subscribe(),
        orchestrator,
        ChatSessionManager::new(provider, events.clone()),
        mode,
    ));

    Ok(Runtime {
        simulator,
        store,
        dashboard,
        events,
    })
}

/// Mode from the `--storytelling` flag, else the configured default.
pub(crate) fn resolve_mode(storytelling: bool, config: &AppConfig) -> AnalysisMode {
    if storytelling {
        AnalysisMode::Storytelling
    } else {
        config.analysis.default_mode
    }
}

pub(crate) fn print_projection(projection: &BatteryProjection) {
    let marker = if projection.is_critical { "🔴" } else { "🟢" };
    println!("  Runtime:      {marker} {}", projection.label);
    if projection.reserve_low {
        println!("  Reserve:      ⚠️  below 20%");
    }
}

pub(crate) fn print_insights(record: &InsightRecord, mode: AnalysisMode) {
    println!("  ── {} ──", record.headline(mode));
    for (label, value) in record.fields() {
        println!("  {:<16} {value}", format!("{label}:"));
    }
    if record.has_active_alert() {
        println!("\n  ⚠️  ALERT: {}", record.alert);
    }
}
