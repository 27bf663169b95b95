//! `ecopulse snapshot` — Render a simulated telemetry snapshot.
//!
//! Needs no API key: everything shown is computed locally.

use ecopulse_core::SensorState;
use ecopulse_telemetry::TelemetrySimulator;

pub async fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let mut simulator =
        TelemetrySimulator::with_seed(config.simulator.history_points, config.simulator.seed);
    let snapshot = simulator.snapshot();
    let projection = ecopulse_analytics::project(&snapshot)?;

    if json {
        let out = serde_json::json!({
            "snapshot": snapshot,
            "projection": projection,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let latest = snapshot.latest()?;
    println!("⚡ EcoPulse Snapshot ({})", latest.time);
    println!("=========================");
    println!("  Demand:       {:.2} kW", snapshot.current_power);
    println!("  Peak today:   {:.2} kW", snapshot.peak_today);
    println!("  Solar:        {:.2} kW", latest.solar);
    println!("  Net flow:     {:.2} kW", snapshot.net_demand()?);
    println!("  Battery:      {}%", latest.battery);
    super::print_projection(&projection);
    println!("  Consumption:  {:.1} kWh", snapshot.total_consumption);
    println!("  Efficiency:   {}", snapshot.efficiency_score);
    println!("  Carbon saved: {} kg", snapshot.carbon_saved);

    println!("\n  Sensors:");
    for sensor in &snapshot.sensors {
        let icon = match sensor.status {
            SensorState::Online => "✅",
            SensorState::Degraded => "⚠️ ",
            SensorState::Offline => "❌",
        };
        println!(
            "    {icon} {:<16} {:<9} load {:>3}%  ({})",
            sensor.name, sensor.status, sensor.load, sensor.last_ping
        );
    }

    println!("\n  History:");
    for point in snapshot.history.iter().rev().take(6).rev() {
        println!(
            "    {}  usage {:>6.2} kW  solar {:>6.2} kW  battery {:>3}%  cost {:.2}",
            point.time, point.usage, point.solar, point.battery, point.cost
        );
    }

    Ok(())
}
