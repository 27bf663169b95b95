//! Synthetic telemetry source.
//!
//! Generates an hourly window of building telemetry shaped like a real
//! day: usage follows a sine over 24h, solar yield is a half-sine between
//! 06:00 and 18:00, and battery charge wanders between 40% and 80%.

use chrono::{Local, NaiveDateTime, TimeDelta, Timelike};
use ecopulse_core::{EnergyPoint, SensorState, SensorStatus, TelemetrySnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use tracing::debug;

/// Grid tariff applied to the usage baseline, per kWh.
const TARIFF_PER_KWH: f64 = 0.15;

const EFFICIENCY_SCORE: f64 = 84.0;
const CARBON_SAVED_KG: f64 = 124.5;

/// Generates synthetic telemetry snapshots.
pub struct TelemetrySimulator {
    rng: StdRng,
    history_points: usize,
}

impl TelemetrySimulator {
    /// A simulator seeded from the OS entropy source.
    pub fn new(history_points: usize) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            history_points,
        }
    }

    /// A deterministic simulator; the same seed yields the same samples.
    pub fn seeded(history_points: usize, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            history_points,
        }
    }

    /// Seeded when `seed` is set, otherwise random.
    pub fn with_seed(history_points: usize, seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(history_points, seed),
            None => Self::new(history_points),
        }
    }

    /// Number of samples in a generated window (`history_points + 1`).
    pub fn window_len(&self) -> usize {
        self.history_points + 1
    }

    /// A full snapshot whose history ends at the current local time.
    pub fn snapshot(&mut self) -> TelemetrySnapshot {
        self.snapshot_at(Local::now().naive_local())
    }

    /// A full snapshot whose history ends at `now`.
    pub fn snapshot_at(&mut self, now: NaiveDateTime) -> TelemetrySnapshot {
        let history = (0..=self.history_points)
            .rev()
            .map(|hours_ago| self.sample_at(now - TimeDelta::hours(hours_ago as i64)))
            .collect();

        let snapshot = aggregate(history, default_sensors(), EFFICIENCY_SCORE, CARBON_SAVED_KG);
        debug!(
            points = snapshot.history.len(),
            current_power = snapshot.current_power,
            "Generated telemetry snapshot"
        );
        snapshot
    }

    /// Roll the window forward: append a sample for `now` and drop the
    /// oldest one so the window length is unchanged.
    pub fn advance(&mut self, previous: &TelemetrySnapshot, now: NaiveDateTime) -> TelemetrySnapshot {
        let mut history = previous.history.clone();
        history.push(self.sample_at(now));
        let excess = history.len().saturating_sub(self.window_len().max(previous.history.len()));
        history.drain(..excess);

        aggregate(
            history,
            previous.sensors.clone(),
            previous.efficiency_score,
            previous.carbon_saved,
        )
    }

    /// One hourly sample at the given wall-clock time.
    pub fn sample_at(&mut self, at: NaiveDateTime) -> EnergyPoint {
        let hour = f64::from(at.hour());
        let usage_base = (hour / 24.0 * PI * 2.0).sin() * 5.0 + 10.0;
        let solar_base = if hour > 6.0 && hour < 18.0 {
            ((hour - 6.0) / 12.0 * PI).sin() * 12.0
        } else {
            0.0
        };

        EnergyPoint {
            time: at.format("%H:%M").to_string(),
            usage: round2(usage_base + self.rng.random::<f64>() * 2.0),
            solar: round2(solar_base + self.rng.random::<f64>()),
            battery: self.rng.random_range(40..80),
            cost: round2(usage_base * TARIFF_PER_KWH),
        }
    }
}

/// The fixed sensor fleet of the simulated building.
pub fn default_sensors() -> Vec<SensorStatus> {
    [
        ("iot-001", "HVAC Main", SensorState::Online, "2m ago", 65),
        ("iot-002", "Server Rack A", SensorState::Online, "1m ago", 88),
        ("iot-003", "Lighting Grid", SensorState::Degraded, "5m ago", 12),
        ("iot-004", "Solar Inverter", SensorState::Online, "just now", 45),
        ("iot-005", "EV Charging", SensorState::Offline, "1h ago", 0),
    ]
    .into_iter()
    .map(|(id, name, status, last_ping, load)| SensorStatus {
        id: id.into(),
        name: name.into(),
        status,
        last_ping: last_ping.into(),
        load,
    })
    .collect()
}

fn aggregate(
    history: Vec<EnergyPoint>,
    sensors: Vec<SensorStatus>,
    efficiency_score: f64,
    carbon_saved: f64,
) -> TelemetrySnapshot {
    let current_power = history.last().map_or(0.0, |p| p.usage);
    let peak_today = history.iter().map(|p| p.usage).fold(current_power, f64::max);
    let total_consumption = history.iter().map(|p| p.usage).sum();

    TelemetrySnapshot {
        current_power,
        peak_today,
        total_consumption,
        efficiency_score,
        carbon_saved,
        sensors,
        history,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
