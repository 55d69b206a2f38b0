use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for xgeo-cli
#[derive(Debug, Parser)]
#[command(
    name = "xgeo",
    version,
    about = "Inspect captured API responses and the per-account location cache"
)]
pub struct CliArgs {
    /// JSON engine config (depth caps, operation names, storage prefix)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Entry snapshot file used as the persistent store
    #[arg(short = 's', long = "store", global = true, default_value = "xgeo-entries.json")]
    pub store: PathBuf,

    /// Increase log output (-v info, -vv debug, -vvv trace). XGEO_LOG overrides.
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the observations a captured response yields, without storing them
    Scan {
        /// Response body file (JSON)
        payload: PathBuf,

        /// Source URL of the response; when omitted the relevance gate is skipped
        #[arg(short = 'u', long = "url")]
        url: Option<String>,

        /// Request body, checked for operation names by the relevance gate
        #[arg(short = 'r', long = "request")]
        request: Option<String>,
    },

    /// Run captured responses through the engine and merge them into the store
    Ingest {
        /// Response body files (JSON)
        #[arg(required = true)]
        payloads: Vec<PathBuf>,

        /// Source URL used for every payload
        #[arg(short = 'u', long = "url", default_value = "https://x.com/i/api/graphql/offline/UserByScreenName")]
        url: String,
    },

    /// List stored entries
    Entries,

    /// Show the entry and badge for a handle
    Lookup {
        /// Account handle, with or without '@'
        handle: String,
    },

    /// Remove every stored entry
    Clear,
}
