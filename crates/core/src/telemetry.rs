//! Telemetry domain types.
//!
//! A `TelemetrySnapshot` is a value: once built it is never mutated in place.
//! The telemetry source produces a new snapshot and the snapshot store swaps
//! it in atomically (see `VersionedSnapshot`).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One historical sample of the energy system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyPoint {
    /// Timestamp label (e.g. "14:00")
    pub time: String,

    /// Power usage in kW
    pub usage: f64,

    /// Solar yield in kW
    pub solar: f64,

    /// Battery reserve percentage (0–100)
    pub battery: u8,

    /// Cost in currency units
    pub cost: f64,
}

/// Connectivity state of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorState {
    Online,
    Degraded,
    Offline,
}

impl std::fmt::Display for SensorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SensorState::Online => "online",
            SensorState::Degraded => "degraded",
            SensorState::Offline => "offline",
        };
        f.pad(label)
    }
}

/// A single IoT sensor as reported by the telemetry source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorStatus {
    /// Unique sensor ID
    pub id: String,

    /// Display name
    pub name: String,

    pub status: SensorState,

    /// Human-readable last-contact label (e.g. "2m ago")
    pub last_ping: String,

    /// Load percentage (0–100)
    pub load: u8,
}

/// A point-in-time bundle of telemetry: current readings, history and sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Current power draw in kW
    pub current_power: f64,

    /// Peak power today in kW
    pub peak_today: f64,

    /// Cumulative consumption in kWh
    pub total_consumption: f64,

    /// Efficiency score (0–100)
    pub efficiency_score: f64,

    /// Cumulative carbon saved in kg
    pub carbon_saved: f64,

    pub sensors: Vec<SensorStatus>,

    /// Chronological history; must contain at least one point.
    pub history: Vec<EnergyPoint>,
}

impl TelemetrySnapshot {
    /// The most recent history point.
    ///
    /// Fails with `InvalidSnapshot` when the history is empty.
    pub fn latest(&self) -> Result<&EnergyPoint> {
        self.history
            .last()
            .ok_or_else(|| Error::InvalidSnapshot("energy history is empty".into()))
    }

    /// Current draw minus the latest solar yield. Positive means the
    /// battery is discharging.
    pub fn net_demand(&self) -> Result<f64> {
        Ok(self.current_power - self.latest()?.solar)
    }

    /// Sensors that are not fully online.
    pub fn compromised_sensors(&self) -> impl Iterator<Item = &SensorStatus> {
        self.sensors
            .iter()
            .filter(|s| s.status != SensorState::Online)
    }

    /// Check the data-model invariants the analysis pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        self.latest()?;
        Ok(())
    }
}

/// A snapshot tagged with the store version it was published under.
///
/// Chat sessions bind to a version; when the store moves past it the session
/// is replaced rather than refreshed.
#[derive(Debug, Clone)]
pub struct VersionedSnapshot {
    pub version: u64,
    pub snapshot: Arc<TelemetrySnapshot>,
}

impl VersionedSnapshot {
    pub fn new(version: u64, snapshot: TelemetrySnapshot) -> Self {
        Self {
            version,
            snapshot: Arc::new(snapshot),
        }
    }
}
