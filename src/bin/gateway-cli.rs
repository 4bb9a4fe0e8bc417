use std::path::PathBuf;
use std::process::ExitCode;

use axum::body::Bytes;
use axum::http::{header, Method, Request};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use gateway_router::config::load_config;
use gateway_router::http::GatewayRequest;
use gateway_router::routing::{Route, Router};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Offline tooling for gateway-router configuration files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and list its routes
    Check { file: PathBuf },
    /// Show which route a request would match
    Match {
        file: PathBuf,
        #[arg(long)]
        host: String,
        #[arg(long)]
        path: String,
        #[arg(long, default_value = "GET")]
        method: Method,
    },
}

fn describe(index: usize, route: &Route) -> Value {
    json!({
        "index": index,
        "id": route.id(),
        "host": route.host_pattern().map(|h| h.as_str()),
        "path": route.path_pattern(),
        "uri": route.target().as_str(),
        "filters": route.filters().names(),
    })
}

fn run(cli: Cli) -> Result<Value, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Check { file } => {
            let config = load_config(&file)?;
            let router = Router::from_config(&config.routes)?;
            let routes: Vec<Value> = router
                .routes()
                .iter()
                .enumerate()
                .map(|(i, r)| describe(i, r))
                .collect();
            Ok(json!({ "valid": true, "routes": routes }))
        }
        Commands::Match {
            file,
            host,
            path,
            method,
        } => {
            let config = load_config(&file)?;
            let router = Router::from_config(&config.routes)?;
            let request: GatewayRequest = Request::builder()
                .method(method)
                .uri(path.as_str())
                .header(header::HOST, host.as_str())
                .body(Bytes::new())?
                .into();
            let matched = router
                .routes()
                .iter()
                .enumerate()
                .find(|(_, r)| r.matches(&request))
                .map(|(i, r)| describe(i, r));
            Ok(json!({ "host": host, "path": path, "route": matched }))
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
