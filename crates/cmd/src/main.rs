// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cmd::App;
use cmd::commands::{Request, clear_cache_command, query_command, shell_command, split_command};
use cmd::config::{CacheMode, open_store, resolve_config};
use cmd::render::{OutputFormat, render_error};
use diagnostics::*;
use loader::HttpSource;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "shardsql")]
/// Query a sharded parquet dataset with SQL
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML dataset configuration (base_url, prefix, total_parts, table)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL the parts are published under
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Local part cache directory [env: SHARDSQL_CACHE]
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Part cache: files in the cache directory, process memory, or none
    #[arg(long, global = true, value_enum, default_value_t = CacheMode::Host)]
    cache: CacheMode,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run SQL against the dataset; with no SQL, list the first works
    Query {
        /// SQL statement
        sql: Option<String>,
        /// Read the SQL statement from a file
        #[arg(long, conflicts_with = "sql")]
        file: Option<PathBuf>,
    },
    /// Search titles and author names
    Search {
        /// Search term, matched literally
        term: String,
    },
    /// Works per author, most prolific first
    Authors,
    /// Works per publication year
    Yearly,
    /// Remove every cached part
    ClearCache,
    /// Interactive SQL shell
    Shell,
    /// Split one parquet file into parts named after the configured prefix
    Split {
        /// Parquet file to split
        input: PathBuf,
        /// Directory the parts are written to
        #[arg(long, default_value = "splits")]
        out_dir: PathBuf,
        /// Number of parts [default: the configured total_parts]
        #[arg(long)]
        parts: Option<usize>,
    },
}

fn request(command: &Commands) -> Result<Option<Request>> {
    let request = match command {
        Commands::Query { sql: Some(sql), .. } => Request::Sql(sql.clone()),
        Commands::Query {
            file: Some(path), ..
        } => {
            let sql = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read SQL file: {}", path.display()))?;
            if sql.trim().is_empty() {
                bail!("SQL file {} is empty", path.display());
            }
            Request::Sql(sql)
        }
        Commands::Query { .. } => Request::DefaultListing,
        Commands::Search { term } => Request::Search(term.clone()),
        Commands::Authors => Request::AuthorStats,
        Commands::Yearly => Request::YearlyStats,
        Commands::ClearCache | Commands::Shell | Commands::Split { .. } => return Ok(None),
    };
    Ok(Some(request))
}

async fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref(), cli.base_url.as_deref())?;

    // Splitting is offline: no store, no network, no dataset load
    if let Commands::Split {
        input,
        out_dir,
        parts,
    } = &cli.command
    {
        let parts = parts.unwrap_or(config.total_parts);
        return split_command(input, out_dir, &config.prefix, parts, &mut io::stdout().lock());
    }

    let source = HttpSource::new(config.request_timeout()).context("Failed to build HTTP client")?;
    let store = open_store(cli.cache, cli.cache_dir.clone()).await;
    let mut app = App::new(config, store, Arc::new(source))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Commands::ClearCache = cli.command {
        return clear_cache_command(&app, &mut out).await;
    }

    // Part fetching and SQL errors both abort a one-shot command
    let pending = request(&cli.command)?;
    let summary = app.start().await.context("Failed to load dataset")?;
    let rows = summary.total_rows;
    debug!("Dataset ready with {rows} rows");

    match pending {
        Some(request) => query_command(&app, &request, cli.format, &mut out).await,
        None => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            shell_command(&app, input, cli.format, &mut out).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    diagnostics::init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = format!("{err:#}");
            error!("Command failed: {message}");
            let written = match cli.format {
                OutputFormat::Html => render_error(&err, cli.format, &mut io::stdout()),
                OutputFormat::Text | OutputFormat::Csv => {
                    render_error(&err, cli.format, &mut io::stderr())
                }
            };
            _ = written.and_then(|()| io::stdout().flush());
            ExitCode::FAILURE
        }
    }
}
