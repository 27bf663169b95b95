//! Energy telemetry for EcoPulse.
//!
//! Provides a synthetic building-telemetry source (hourly usage, solar and
//! battery samples plus a fixed sensor fleet) and the store that publishes
//! versioned snapshots to the analysis pipeline.

pub mod simulator;
pub mod store;

pub use simulator::TelemetrySimulator;
pub use store::SnapshotStore;
