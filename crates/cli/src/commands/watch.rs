//! `ecopulse watch` — Live dashboard loop.
//!
//! Publishes a rolled-forward snapshot every `tick_interval_secs` and
//! refreshes insights in the background while stdin stays responsive.
//! Commands: `mode [analytical|storytelling]`, `refresh`, `quit`.
//!
//! Insights are printed once per completed analysis, driven by
//! `AnalysisCompleted` events; coalesced triggers share one block.

use ecopulse_agent::{AnalysisOutcome, Dashboard};
use ecopulse_core::{AnalysisMode, DomainEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

enum Command {
    Mode(AnalysisMode),
    Refresh,
    Quit,
}

fn parse_command(line: &str, current: AnalysisMode) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    match head {
        "mode" | "m" => match words.next() {
            Some(arg) => arg.parse().map(|mode| Some(Command::Mode(mode))),
            None => Ok(Some(Command::Mode(current.toggled()))),
        },
        "refresh" | "r" => Ok(Some(Command::Refresh)),
        "quit" | "exit" | "q" => Ok(Some(Command::Quit)),
        other => Err(format!(
            "unknown command '{other}' (mode [analytical|storytelling], refresh, quit)"
        )),
    }
}

pub async fn run(storytelling: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let mode = super::resolve_mode(storytelling, &config);
    let super::Runtime {
        mut simulator,
        store,
        dashboard,
        events,
    } = super::bootstrap(&config, mode)?;

    let tick = Duration::from_secs(config.simulator.tick_interval_secs);
    println!("⚡ EcoPulse Live [{} · {mode}]", config.model);
    println!("  New telemetry every {}s.", tick.as_secs());
    println!("  Commands: mode [analytical|storytelling], refresh, quit\n");

    let mut bus = events.subscribe();
    let mut cursor = RenderCursor::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(tick);
    // The first tick fires immediately; the initial snapshot is already published
    ticker.tick().await;
    spawn_refresh(&dashboard);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let current = store.current();
                let next = simulator.advance(&current.snapshot, chrono::Local::now().naive_local());
                match store.publish(next) {
                    Ok(version) => {
                        println!("  📡 Telemetry v{version} received");
                        spawn_refresh(&dashboard);
                    }
                    Err(e) => warn!(error = %e, "Rejected simulated snapshot"),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line, dashboard.mode()) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(Command::Refresh)) => spawn_refresh(&dashboard),
                    Ok(Some(Command::Mode(mode))) => spawn_set_mode(&dashboard, mode),
                    Err(e) => eprintln!("  {e}"),
                }
            }
            event = bus.recv() => match event {
                Ok(event) => match event.as_ref() {
                    DomainEvent::AnalysisStateChanged { is_busy: true, .. } => {
                        println!("  ⏳ Analyzing...");
                    }
                    DomainEvent::AnalysisCompleted { ticket, .. } => {
                        if let Some(outcome) = cursor.take(*ticket, dashboard.orchestrator().latest()) {
                            render(&dashboard, &outcome);
                        }
                    }
                    _ => {}
                },
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Event listener lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    println!("\n  Watch stopped.");
    Ok(())
}

/// Remembers the newest outcome already printed.
#[derive(Debug, Default)]
struct RenderCursor {
    shown: u64,
}

impl RenderCursor {
    /// The outcome to print for a completion of `ticket`, or `None` when it
    /// (or something newer) was printed already.
    fn take(&mut self, ticket: u64, latest: Option<AnalysisOutcome>) -> Option<AnalysisOutcome> {
        let outcome = latest.filter(|o| o.ticket >= ticket && o.ticket > self.shown)?;
        self.shown = outcome.ticket;
        Some(outcome)
    }
}

fn spawn_refresh(dashboard: &Arc<Dashboard>) {
    let dashboard = Arc::clone(dashboard);
    tokio::spawn(async move {
        if let Err(e) = dashboard.refresh().await {
            eprintln!("  [Error] {e}");
        }
    });
}

fn spawn_set_mode(dashboard: &Arc<Dashboard>, mode: AnalysisMode) {
    let dashboard = Arc::clone(dashboard);
    tokio::spawn(async move {
        match dashboard.set_mode(mode).await {
            Ok(Some(_)) => {}
            Ok(None) => println!("  Already in {mode} mode"),
            Err(e) => eprintln!("  [Error] {e}"),
        }
    });
}

fn render(dashboard: &Dashboard, outcome: &AnalysisOutcome) {
    println!();
    match dashboard.projection() {
        Ok(projection) => super::print_projection(&projection),
        Err(e) => eprintln!("  [Error] {e}"),
    }
    super::print_insights(&outcome.record, outcome.mode);
    println!(
        "  Last updated: {}\n",
        outcome
            .completed_at
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S")
    );
}
