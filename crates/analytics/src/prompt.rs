//! Prompt construction for insight generation and chat sessions.
//!
//! The runtime figure embedded in the prompt is computed here independently
//! of [`crate::metrics::project`]: the backend receives a human-readable
//! string, not the structured projection.

use crate::extract::SectionTag;
use crate::metrics::BATTERY_CAPACITY_KWH;
use ecopulse_core::{AnalysisMode, GenerationRequest, Result, TelemetrySnapshot};
use tracing::debug;

/// Sampling temperature for analytical mode (favor determinism).
pub const ANALYTICAL_TEMPERATURE: f32 = 0.1;

/// Sampling temperature for storytelling mode (favor variety).
pub const STORYTELLING_TEMPERATURE: f32 = 0.8;

/// Nucleus sampling cutoff used in both modes.
pub const TOP_P: f32 = 0.95;

const ANALYTICAL_PERSONA: &str = "ANALYTICAL MODE: You are a high-performance energy \
intelligence system. Deliver precise, data-driven analysis in professional technical \
language. Concentrate on efficiency, demand peaks and concrete optimizations.";

const STORYTELLING_PERSONA: &str = "STORYTELLING MODE: You are the voice living inside \
the building's wiring. Tell the energy status as a rhythmic, cinematic journey: solar \
panels thirst for light, the battery is a heart of lead and lithium, the sensors are \
nerves twitching in the dark. Weave the figures into one cohesive energy epic.";

/// Build the generation request for one analysis run.
///
/// Fails with `InvalidSnapshot` when the snapshot has no history.
pub fn build_prompt(snapshot: &TelemetrySnapshot, mode: AnalysisMode) -> Result<GenerationRequest> {
    let latest = snapshot.latest()?;
    let net_demand = snapshot.current_power - latest.solar;
    let charge_kwh = f64::from(latest.battery) / 100.0 * BATTERY_CAPACITY_KWH;
    let runtime = if net_demand > 0.0 {
        format!("{:.1}", charge_kwh / net_demand)
    } else {
        "Infinite (Charging)".to_string()
    };

    let compromised: Vec<&str> = snapshot
        .compromised_sensors()
        .map(|s| s.name.as_str())
        .collect();
    let compromised = if compromised.is_empty() {
        "None".to_string()
    } else {
        compromised.join(", ")
    };

    let persona = match mode {
        AnalysisMode::Analytical => ANALYTICAL_PERSONA,
        AnalysisMode::Storytelling => STORYTELLING_PERSONA,
    };

    let mut text = format!(
        "Current System Telemetry:\n\
         - Demand: {demand}kW\n\
         - Peak: {peak}kW\n\
         - Solar: {solar}kW\n\
         - Net Flow: {net_demand:.2}kW\n\
         - Reserve: {battery}% (Runtime: {runtime}h)\n\
         - Sensor Count: {sensors}\n\
         - Compromised Nodes: {compromised}\n\
         \n\
         MODE: {persona}\n\
         \n\
         TASK:\n\
         1. Use search grounding to check cloud cover and weather anomalies that could affect solar yield over the next few hours.\n\
         2. Produce a 24h predictive solar yield forecast.\n\
         3. Output the following blocks exactly, each tag on its own line:\n",
        demand = snapshot.current_power,
        peak = snapshot.peak_today,
        solar = latest.solar,
        battery = latest.battery,
        sensors = snapshot.sensors.len(),
    );
    for tag in requested_sections(mode) {
        text.push_str(&tag.marker());
        text.push('\n');
    }

    debug!(%mode, prompt_chars = text.len(), "Built analysis prompt");

    Ok(GenerationRequest {
        text,
        temperature: match mode {
            AnalysisMode::Analytical => ANALYTICAL_TEMPERATURE,
            AnalysisMode::Storytelling => STORYTELLING_TEMPERATURE,
        },
        top_p: TOP_P,
        use_search_grounding: true,
    })
}

/// Sections requested for a mode, in prompt order.
pub fn requested_sections(mode: AnalysisMode) -> Vec<SectionTag> {
    let mut tags = SectionTag::REQUIRED.to_vec();
    if mode.is_storytelling() {
        tags.push(SectionTag::Narrative);
    }
    tags
}

/// Build the fixed system instruction for a chat session.
///
/// Fails with `InvalidSnapshot` when the snapshot has no history.
pub fn build_chat_instruction(snapshot: &TelemetrySnapshot) -> Result<String> {
    let latest = snapshot.latest()?;
    Ok(format!(
        "You are the EcoPulse Neural Query Interface.\n\
         You have direct access to building telemetry:\n\
         - Current Demand: {}kW\n\
         - Solar: {}kW\n\
         - Battery: {}%\n\
         \n\
         Respond with technical authority in a concise, terminal-style tone.\n\
         You are the building's core OS.",
        snapshot.current_power, latest.solar, latest.battery
    ))
}
