//! # Standards Catalog CLI (`stdcat`)
//!
//! The `stdcat` binary loads the configured standards workbook and either
//! answers a single query on the command line or serves the catalog over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! stdcat --config ./config/standards.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stdcat serve` | Start the web page and JSON API |
//! | `stdcat search "<text>"` | Search the catalog |
//! | `stdcat filters` | Print the section and source vocabularies |
//! | `stdcat summary` | Show how each sheet was ingested |
//!
//! ## Examples
//!
//! ```bash
//! # Everything from the NIST sheet mentioning passwords
//! stdcat search password --source NIST
//!
//! # Use a different workbook without a config file
//! stdcat --workbook ./standards.xlsx summary
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use standards_catalog::config::{self, Config};
use standards_catalog::search::{self, StandardsQuery, ALL_SECTIONS, ALL_SOURCES};
use standards_catalog::{logging, server, summary};

/// Standards Catalog: one searchable view over a multi-sheet standards workbook.
#[derive(Parser)]
#[command(name = "stdcat", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Built-in defaults apply when the file does not exist.
    #[arg(long, global = true, default_value = "./config/standards.toml")]
    config: PathBuf,

    /// Workbook to load, overriding `workbook.path` from the config.
    #[arg(long, global = true)]
    workbook: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the search page and the JSON API.
    Serve {
        /// Bind address, overriding `server.bind` from the config.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Search records by text, section and source.
    ///
    /// Text matches case-insensitively as a literal substring of any
    /// searchable field. An empty query returns every record that passes
    /// the filters.
    Search {
        /// Text to look for.
        #[arg(default_value = "")]
        query: String,

        /// Exact section to keep.
        #[arg(long, default_value = ALL_SECTIONS)]
        section: String,

        /// Exact source (sheet label) to keep.
        #[arg(long, default_value = ALL_SOURCES)]
        source: String,

        /// Print records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the section and source filter values.
    Filters {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Report per-sheet ingestion results.
    Summary,
}

fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::debug!(path = %cli.config.display(), "config file not found, using defaults");
        Config::minimal()
    };
    if let Some(workbook) = &cli.workbook {
        cfg.workbook.path = workbook.clone();
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let mut cfg = resolve_config(&cli)?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
                cfg.validate()?;
            }
            server::run_server(&cfg).await?;
        }
        Commands::Search {
            query,
            section,
            source,
            json,
        } => {
            let query = StandardsQuery::new(query, section, source);
            search::run_search(&cfg, &query, json)?;
        }
        Commands::Filters { json } => {
            search::run_filters(&cfg, json)?;
        }
        Commands::Summary => {
            summary::run_summary(&cfg)?;
        }
    }

    Ok(())
}
