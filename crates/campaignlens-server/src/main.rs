use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use campaignlens_duckdb::DuckDbBackend;
use campaignlens_server::{config::Config, import::parse_csv, state::AppState};

/// `campaignlens health`: liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$CAMPAIGNLENS_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("CAMPAIGNLENS_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

enum Command {
    Serve,
    Seed { days: Option<u32> },
    Import { path: String, replace: bool },
}

fn parse_command(args: &[String]) -> Result<Command> {
    match args.get(1).map(String::as_str) {
        None | Some("serve") => Ok(Command::Serve),
        Some("seed") => {
            let days = args
                .get(2)
                .map(|d| d.parse::<u32>().context("seed: days must be a positive integer"))
                .transpose()?;
            Ok(Command::Seed { days })
        }
        Some("import") => {
            let Some(path) = args.get(2) else {
                bail!("usage: campaignlens import <file.csv> [--replace]");
            };
            Ok(Command::Import {
                path: path.clone(),
                replace: args.iter().skip(3).any(|a| a == "--replace"),
            })
        }
        Some(other) => bail!("unknown command: {other}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Health-check subcommand is handled before logging so probe output stays empty.
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    let command = parse_command(&args)?;

    // Initialise structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("campaignlens=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Ensure data directory exists before opening DuckDB.
    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/campaignlens.db", cfg.data_dir);

    // Open DuckDB: initialises the channel_metrics schema.
    let db = DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;
    let state = Arc::new(AppState::new(db, cfg.clone()));

    match command {
        Command::Seed { days } => {
            let days = days.unwrap_or(cfg.seed_days);
            let rows = state.reseed(days, rand::random()).await?;
            info!(rows, days, path = %db_path, "Seed complete");
            return Ok(());
        }
        Command::Import { path, replace } => {
            let file = std::fs::File::open(&path).with_context(|| format!("open {path}"))?;
            let outcome = parse_csv(file)?;
            for rejected in &outcome.rejected {
                tracing::warn!(line = rejected.line, reason = %rejected.reason, "Row skipped");
            }
            state.store_imported(&outcome.records, replace).await?;
            info!(
                imported = outcome.records.len(),
                rejected = outcome.rejected.len(),
                replace,
                "Import complete"
            );
            return Ok(());
        }
        Command::Serve => {}
    }

    if let Err(e) = state.seed_if_empty().await {
        tracing::warn!(error = %e, "Failed to seed empty store");
    }
    if state.live_feed.is_none() {
        info!("Live feed not configured; live requests fall back to DuckDB");
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = campaignlens_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, source = ?cfg.default_source, "campaignlens listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
