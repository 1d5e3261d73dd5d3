//! Pinwarden - Main entry point
//!
//! Builds the boards and components a manifest declares and reports which
//! resources each board ended up owning.

mod config;
mod report;

use anyhow::{bail, Result};
use clap::Parser;
use pinwarden_core::{BoardRegistry, RecordingSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pinwarden")]
#[command(about = "Plan board components and report pin ownership conflicts")]
#[command(version)]
struct Args {
    /// Path to the board manifest
    #[arg(short, long, default_value = "pinwarden.toml")]
    manifest: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Print board snapshots as JSON
    #[arg(long)]
    json: bool,

    /// Exit with an error when any resource conflict was reported
    #[arg(long)]
    deny_conflicts: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Pinwarden v{}", env!("CARGO_PKG_VERSION"));

    let manifest = config::load_manifest(&args.manifest)?;

    let registry = BoardRegistry::new();
    let diagnostics = Arc::new(RecordingSink::new());
    let components = manifest.apply(&registry, diagnostics.clone())?;

    info!(
        boards = registry.len(),
        components = components.len(),
        "Manifest applied"
    );

    let snapshots: Vec<_> = registry.boards().iter().map(|b| b.snapshot()).collect();
    let warnings = diagnostics.entries();

    if args.json {
        println!("{}", report::render_json(&snapshots, &warnings)?);
    } else {
        print!("{}", report::render_text(&snapshots, &warnings));
    }

    if args.deny_conflicts && !warnings.is_empty() {
        bail!("{} resource conflict(s) reported", warnings.len());
    }

    Ok(())
}
