//! `ecopulse analyze` — Run one insight analysis.

pub async fn run(storytelling: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let mode = super::resolve_mode(storytelling, &config);
    let runtime = super::bootstrap(&config, mode)?;
    let dashboard = runtime.dashboard;

    if !json {
        eprint!("  Analyzing ({mode})...");
    }
    let record = dashboard.refresh().await?;
    let projection = dashboard.projection()?;

    if json {
        let out = serde_json::json!({
            "mode": mode,
            "insights": record,
            "projection": projection,
            "last_updated": dashboard.last_updated(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    eprint!("\r                         \r");
    println!("⚡ EcoPulse Insights [{} · {}]", config.model, mode);
    println!("================================");
    super::print_projection(&projection);
    println!();
    super::print_insights(&record, mode);
    if let Some(updated) = dashboard.last_updated() {
        println!(
            "\n  Last updated: {}",
            updated.with_timezone(&chrono::Local).format("%H:%M:%S")
        );
    }

    if record.is_fallback() {
        eprintln!("\n  ⚠️  Insight generation failed; run with --verbose for details");
    }
    Ok(())
}
