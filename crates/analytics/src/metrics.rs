//! Battery-depletion projection.

use ecopulse_core::{BatteryProjection, HoursRemaining, Result, TelemetrySnapshot};

/// Nameplate capacity of the battery bank in kWh.
pub const BATTERY_CAPACITY_KWH: f64 = 50.0;

/// Below this many hours of runtime the projection is critical.
pub const CRITICAL_RUNTIME_HOURS: f64 = 2.0;

/// Reserve percentage below which the reserve indicator turns low.
pub const LOW_RESERVE_PERCENT: u8 = 20;

/// Project how long the battery lasts at the current net demand.
///
/// Fails with `InvalidSnapshot` when the snapshot has no history.
pub fn project(snapshot: &TelemetrySnapshot) -> Result<BatteryProjection> {
    let latest = snapshot.latest()?;
    let charge_kwh = f64::from(latest.battery) / 100.0 * BATTERY_CAPACITY_KWH;
    let net_demand = snapshot.current_power - latest.solar;
    let reserve_low = latest.battery < LOW_RESERVE_PERCENT;

    if net_demand <= 0.0 {
        return Ok(BatteryProjection {
            label: "Charging".into(),
            is_critical: false,
            hours_remaining: HoursRemaining::Infinite,
            reserve_low,
        });
    }

    let hours = charge_kwh / net_demand;
    let whole_hours = hours.floor();
    let minutes = ((hours - whole_hours) * 60.0).floor();

    Ok(BatteryProjection {
        label: format!("{whole_hours}h {minutes}m"),
        is_critical: hours < CRITICAL_RUNTIME_HOURS,
        hours_remaining: HoursRemaining::Finite((hours * 10.0).round() / 10.0),
        reserve_low,
    })
}
