//! FireRating CLI
//!
//! Command-line front end for door fire rating sync.
//!
//! # Commands
//!
//! - `project-id` - Print the project id derived for a model file
//! - `sync` - Upsert every door of an export file
//! - `pull` - Fetch remote ratings and optionally write them back
//! - `encode` / `decode` - URL-safe Base64 helpers

mod commands;
mod host;

use clap::{Parser, Subcommand};
use firerating_core::{IdentityScheme, SessionContext};
use firerating_sync_engine::{Endpoint, RestConfig, SyncConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// FireRating door sync tools.
#[derive(Parser)]
#[command(name = "firerating")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Use the hosted server instead of the local one
    #[arg(global = true, long, conflicts_with = "base_url")]
    hosted: bool,

    /// Custom server base URL
    #[arg(global = true, long)]
    base_url: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(global = true, long, default_value = "1000")]
    timeout_ms: u64,

    /// Derive project ids without replacing `+`
    #[arg(global = true, long)]
    legacy_ids: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the project id for a model file
    ProjectId {
        /// Machine name (defaults to the local machine)
        #[arg(short, long)]
        machine: Option<String>,

        /// Model file path
        #[arg(short, long, default_value = "")]
        file: String,
    },

    /// Upsert every door of an export file
    Sync {
        /// Door export file
        #[arg(short, long)]
        doors: PathBuf,

        /// Model file path
        #[arg(short, long, default_value = "")]
        file: String,

        /// Machine name (defaults to the local machine)
        #[arg(short, long)]
        machine: Option<String>,

        /// Number of concurrent workers
        #[arg(short, long, default_value = "1")]
        workers: usize,

        /// Skip writes when the remote document already matches
        #[arg(long)]
        verify: bool,

        /// Remote collection name
        #[arg(short, long, default_value = "doors")]
        collection: String,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Fetch remote ratings for every door
    Pull {
        /// Door export file
        #[arg(short, long)]
        doors: PathBuf,

        /// Model file path
        #[arg(short, long, default_value = "")]
        file: String,

        /// Machine name (defaults to the local machine)
        #[arg(short, long)]
        machine: Option<String>,

        /// Write fetched values back into the door file
        #[arg(long)]
        write: bool,

        /// Remote collection name
        #[arg(short, long, default_value = "doors")]
        collection: String,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Encode text as URL-safe Base64
    Encode {
        /// Text to encode
        text: String,
    },

    /// Decode a URL-safe Base64 token
    Decode {
        /// Token to decode
        token: String,
    },

    /// Show version information
    Version,
}

impl Cli {
    fn rest_config(&self) -> RestConfig {
        let endpoint = match &self.base_url {
            Some(url) => Endpoint::Custom(url.clone()),
            None => Endpoint::from_switch(!self.hosted),
        };
        RestConfig::new(endpoint)
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }

    fn identity_scheme(&self) -> IdentityScheme {
        if self.legacy_ids {
            IdentityScheme::Legacy
        } else {
            IdentityScheme::UrlSafe
        }
    }
}

fn session(machine: Option<String>, file: String) -> SessionContext {
    match machine {
        Some(machine) => SessionContext::new(machine, file),
        None => SessionContext::from_env(file),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let rest = cli.rest_config();
    let scheme = cli.identity_scheme();

    match cli.command {
        Commands::ProjectId { machine, file } => {
            commands::project_id::run(&session(machine, file), scheme);
        }
        Commands::Sync {
            doors,
            file,
            machine,
            workers,
            verify,
            collection,
            format,
        } => {
            let config = SyncConfig::new()
                .with_collection(collection)
                .with_identity_scheme(scheme)
                .with_max_workers(workers)
                .with_verify_before_write(verify);
            commands::sync::run(&doors, &session(machine, file), &rest, config, &format)?;
        }
        Commands::Pull {
            doors,
            file,
            machine,
            write,
            collection,
            format,
        } => {
            let config = SyncConfig::new()
                .with_collection(collection)
                .with_identity_scheme(scheme);
            commands::pull::run(
                &doors,
                &session(machine, file),
                &rest,
                config,
                write,
                &format,
            )?;
        }
        Commands::Encode { text } => commands::codec::encode(&text),
        Commands::Decode { token } => commands::codec::decode(&token)?,
        Commands::Version => {
            println!("FireRating CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("FireRating Core v{}", firerating_core::VERSION);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_flags() {
        let cli = Cli::parse_from(["firerating", "encode", "x"]);
        assert_eq!(cli.rest_config().endpoint, Endpoint::Local);
        assert_eq!(cli.rest_config().timeout, Duration::from_millis(1000));

        let cli = Cli::parse_from(["firerating", "--hosted", "encode", "x"]);
        assert_eq!(cli.rest_config().endpoint, Endpoint::Hosted);

        let cli = Cli::parse_from([
            "firerating",
            "--base-url",
            "http://db.example:8080",
            "--timeout-ms",
            "250",
            "encode",
            "x",
        ]);
        assert_eq!(
            cli.rest_config().endpoint,
            Endpoint::Custom("http://db.example:8080".into())
        );
        assert_eq!(cli.rest_config().timeout, Duration::from_millis(250));
    }

    #[test]
    fn hosted_conflicts_with_base_url() {
        let parsed = Cli::try_parse_from([
            "firerating",
            "--hosted",
            "--base-url",
            "http://x",
            "version",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn legacy_ids_flag() {
        let cli = Cli::parse_from(["firerating", "--legacy-ids", "project-id", "-m", "WS-01"]);
        assert_eq!(cli.identity_scheme(), IdentityScheme::Legacy);
        assert!(matches!(cli.command, Commands::ProjectId { .. }));
    }
}
