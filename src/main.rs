//! gateway-router: host/path routed HTTP gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing::Router ──▶ filter::FilterChain ──▶ http::forward ──▶ Upstream
//!                          │                 │                    │                      │
//!                          │            no match: 404       Respond: as-is         timeout: 504
//!                          │                                 Err: 500              failure: 502
//!     Client Response      ▼
//!     ◀────────────── upstream response, unchanged
//!
//!     Cross-cutting: config (TOML + hot reload), observability (tracing, metrics), lifecycle (signals)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use gateway_router::lifecycle::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "gateway-router", version)]
#[command(about = "Routes HTTP requests by host and path through filter chains to upstreams")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload routes when the configuration file changes
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let options = StartupOptions {
        config_path: args.config,
        watch: args.watch,
    };

    match lifecycle::run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Logging may not be up yet when startup fails.
            eprintln!("gateway-router: {}", e);
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}
