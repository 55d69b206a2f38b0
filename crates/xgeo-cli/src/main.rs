//! xgeo-cli: Command-line interface for xgeo-core
//!
//! Offline companion to the browser engine: feed it response bodies captured
//! from the network tab and inspect what the engine concludes, or keep a
//! file-backed entry store between runs.
//!
//! Usage examples
//! --------------
//!
//! - Print observations for a captured response
//!   $ xgeo scan about.json
//!   $ xgeo scan about.json --url https://x.com/i/api/graphql/abc/UserAbout
//!
//! - Merge several responses into the store, then list it
//!   $ xgeo ingest a.json b.json
//!   $ xgeo entries
//!
//! - Show the badge a handle would get
//!   $ xgeo lookup @someone
//!
//! - Start over
//!   $ xgeo clear
//!
//! Logging goes to stderr. `-v` raises the level; `XGEO_LOG` takes a full
//! tracing filter (e.g. `XGEO_LOG=xgeo_core=debug`).
mod args;

use crate::args::{CliArgs, Commands};
use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xgeo_core::{Badge, EngineConfig, FileStorage, GeoEngine, Payload, SignalPipeline};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("XGEO_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_payload(path: &std::path::Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match args.command {
        Commands::Scan { payload, url, request } => {
            let body = read_payload(&payload)?;
            let pipeline = SignalPipeline::new(&config);
            let observations = match url {
                Some(url) => pipeline.process_text(&body, &url, request.as_deref()),
                None => {
                    let tree = Payload::parse(&body)
                        .with_context(|| format!("{} is not JSON", payload.display()))?;
                    pipeline.extract(&tree)
                }
            };
            if observations.is_empty() {
                eprintln!("No observations.");
            }
            println!("{}", serde_json::to_string_pretty(&observations)?);
        }

        Commands::Ingest { payloads, url } => {
            let storage = FileStorage::new(&args.store);
            let mut engine = GeoEngine::restore(storage, config)?;
            for path in payloads {
                let body = read_payload(&path)?;
                let outcomes = engine.ingest_text(&body, &url, None);
                info!(path = %path.display(), merged = outcomes.len(), "payload ingested");
                for outcome in outcomes {
                    let entry = &outcome.entry;
                    println!(
                        "{} {} @{} ({}){}",
                        if outcome.changed { "updated" } else { "kept   " },
                        entry.subject_id,
                        entry.handle.as_deref().unwrap_or("-"),
                        Badge::from_entry(entry).label,
                        if entry.is_vpn { " vpn" } else { "" }
                    );
                }
            }
            println!("Store: {} entries in {}", engine.store().len(), args.store.display());
        }

        Commands::Entries => {
            let engine = GeoEngine::restore(FileStorage::new(&args.store), config)?;
            let mut entries: Vec<_> = engine.store().iter().collect();
            entries.sort_by(|a, b| a.subject_id.cmp(&b.subject_id));
            for entry in entries {
                let badge = Badge::from_entry(entry);
                println!(
                    "{:<20} @{:<16} {:<24} {}",
                    entry.subject_id,
                    entry.handle.as_deref().unwrap_or("-"),
                    badge.label,
                    entry.confidence.as_str()
                );
            }
        }

        Commands::Lookup { handle } => {
            let engine = GeoEngine::restore(FileStorage::new(&args.store), config)?;
            match engine.store().lookup_by_handle(&handle) {
                Some(entry) => {
                    let badge = Badge::from_entry(entry);
                    println!("Subject: {}", entry.subject_id);
                    println!("Badge: {}", badge.label);
                    for line in &badge.tooltip_lines {
                        println!("  {line}");
                    }
                    println!("Signal type: {:?}", entry.signal_type);
                    println!("Confidence: {}", entry.confidence.as_str());
                }
                None => eprintln!("No entry for handle: {handle}"),
            }
        }

        Commands::Clear => {
            let mut engine = GeoEngine::restore(FileStorage::new(&args.store), config)?;
            let removed = engine.clear()?;
            println!("Removed {removed} entries from {}", args.store.display());
        }
    }

    Ok(())
}
