//! `ecopulse status` — Show the effective configuration and whether the
//! provider answers.

use ecopulse_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    println!("⚡ EcoPulse Status");
    println!("=================");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Provider:       {}", config.provider);
    println!("  Model:          {}", config.model);
    println!(
        "  Endpoint:       {}",
        ecopulse_providers::resolve_base_url(&config)
            .unwrap_or_else(|_| format!("unknown provider '{}'", config.provider))
    );
    println!(
        "  API key:        {}",
        if config.has_api_key() { "configured" } else { "missing" }
    );
    println!(
        "  Timeout:        {}",
        if config.request_timeout_secs == 0 {
            "disabled".to_string()
        } else {
            format!("{}s", config.request_timeout_secs)
        }
    );
    println!("  Default mode:   {}", config.analysis.default_mode);
    println!("  History:        {} hourly points", config.simulator.history_points);
    println!(
        "  Seed:           {}",
        config
            .simulator
            .seed
            .map_or_else(|| "random".to_string(), |s| s.to_string())
    );
    println!("  Tick interval:  {}s", config.simulator.tick_interval_secs);
    println!("  Reachable:      {}", reachability(&config).await);

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `ecopulse onboard` first");
    }

    Ok(())
}

/// Ask the configured provider whether it is reachable.
async fn reachability(config: &AppConfig) -> String {
    if !config.has_api_key() {
        return "skipped (no API key)".into();
    }
    let provider = match ecopulse_providers::build_from_config(config) {
        Ok(provider) => provider,
        Err(e) => return format!("no ({e})"),
    };
    match provider.health_check().await {
        Ok(true) => "yes".into(),
        Ok(false) => "no (endpoint rejected the request)".into(),
        Err(e) => format!("no ({e})"),
    }
}
