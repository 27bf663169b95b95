//! EcoPulse CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Initialize config
//! - `status`   — Show effective configuration
//! - `snapshot` — Render a simulated telemetry snapshot
//! - `analyze`  — Run one insight analysis
//! - `chat`     — Query the building through a chat session
//! - `watch`    — Live dashboard loop

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ecopulse",
    about = "EcoPulse — energy telemetry analytics with generated insights",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Show the effective configuration
    Status,

    /// Render a simulated snapshot with its battery projection
    Snapshot {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run one insight analysis against a simulated snapshot
    Analyze {
        /// Use storytelling mode instead of the configured default
        #[arg(short, long)]
        storytelling: bool,

        /// Print the insight record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Chat with the building's neural query interface
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Publish fresh telemetry on an interval and keep insights current
    Watch {
        /// Start in storytelling mode
        #[arg(short, long)]
        storytelling: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Status => commands::status::run().await?,
        Commands::Snapshot { json } => commands::snapshot::run(json).await?,
        Commands::Analyze { storytelling, json } => {
            commands::analyze::run(storytelling, json).await?
        }
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Watch { storytelling } => commands::watch::run(storytelling).await?,
    }

    Ok(())
}
