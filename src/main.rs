//! Streaming relay gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                    RELAY GATEWAY                      │
//!                    │                                                       │
//!  Client Request    │  ┌─────────┐   ┌────────────────┐   ┌─────────────┐  │
//!  ──────────────────┼─▶│  http   │──▶│ GET /proxy     │──▶│ relay       │──┼──▶ Origin
//!                    │  │ server  │   │ GET /<prefix>/*│──▶│ credentials │──┼──▶ API
//!                    │  └─────────┘   └────────────────┘   └──────┬──────┘  │
//!                    │                                            │         │
//!  Client Response   │  ┌──────────────────────────┐              │         │
//!  ◀─────────────────┼──│ response (stream / JSON) │◀─────────────┘         │
//!                    │  └──────────────────────────┘                        │
//!                    │                                                       │
//!                    │  config · observability · lifecycle                   │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use relay_gateway::lifecycle::startup;

#[derive(Parser)]
#[command(name = "relay-gateway")]
#[command(about = "Streaming HTTP relay with credential rotation", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = startup::resolve_config(cli.config.as_deref(), cli.bind.as_deref())?;
    startup::run(config).await
}
