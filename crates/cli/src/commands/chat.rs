//! `ecopulse chat` — Interactive or single-message chat mode.

use ecopulse_agent::chat::GREETING;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let mode = config.analysis.default_mode;
    let runtime = super::bootstrap(&config, mode)?;
    let dashboard = runtime.dashboard;

    if let Some(msg) = message {
        eprint!("  Querying...");
        let reply = dashboard.chat(&msg).await?;
        eprint!("\r            \r");
        println!("{}", reply.text);
        return Ok(());
    }

    let snapshot = dashboard.snapshot();
    let latest = snapshot.snapshot.latest()?;

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║       EcoPulse Neural Query Interface        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", config.model);
    println!(
        "  Snapshot:  v{} @ {} — {} kW demand, {} kW solar, {}% battery",
        snapshot.version, latest.time, snapshot.snapshot.current_power, latest.solar, latest.battery
    );
    println!();
    println!("  Type your query and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();
    println!("  CORE > {GREETING}");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }
        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }

        eprint!("  ...");
        let reply = dashboard.chat(line).await?;
        eprint!("\r     \r");
        println!();
        for text in reply.text.lines() {
            println!("  CORE > {text}");
        }
        println!();

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Link closed.");
    println!();

    Ok(())
}
