use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::info;

mod config;
mod db;
mod domain;
mod errors;
mod etl;
mod explore;
mod fixtures;
mod logging;
mod schema;
mod spreadsheets;

#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::db::Database;
use crate::etl::{Loader, Outcome, Pipeline};
use crate::explore::ExploreAction;

#[derive(Parser)]
#[command(name = "listings_etl")]
#[command(about = "Load per-city listing CSVs into SQLite")]
#[command(version)]
struct Cli {
    /// TOML config file (defaults to config/etl.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run extract, transform and load for each configured source (default)
    Run {
        /// Only these sources, comma-separated, in this order
        #[arg(long)]
        sources: Option<String>,
        /// Also write each cleaned batch as JSON under the processed directory
        #[arg(long)]
        write_processed: bool,
    },
    /// Write sample source CSVs
    Sample {
        /// Output directory (defaults to the configured raw directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Browse the loaded listings (read-only)
    Explore {
        /// Show latest N entries
        #[arg(long)]
        latest: Option<usize>,
        /// Show city statistics
        #[arg(long)]
        stats: bool,
        /// Show table schema
        #[arg(long)]
        schema: bool,
        /// Run a read-only SQL query
        #[arg(long)]
        query: Option<String>,
        /// Also save the result as an .xlsx workbook
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

fn run_pipeline(config: &Config, sources: Option<String>) -> anyhow::Result<()> {
    let sources: Vec<String> = match sources {
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => config.source_names(),
    };

    let loader = Loader::new(Database::new(&config.db_path));
    let pipeline = Pipeline::new(config, loader);
    let summary = pipeline
        .run(&sources)
        .context("pipeline aborted")?;

    println!("\n📊 Pipeline results:");
    for o in &summary.outcomes {
        match &o.outcome {
            Outcome::Loaded(n) => println!("   ✅ {}: {} records loaded", o.source_id, n),
            Outcome::Failed { stage, reason } => {
                println!("   ⚠️  {}: failed at {} ({})", o.source_id, stage, reason)
            }
        }
    }
    println!("   Total loaded: {}", summary.total_loaded());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let _guard = logging::init_logging(&config.log_dir)
        .with_context(|| format!("creating log directory {}", config.log_dir.display()))?;

    match cli.command.unwrap_or(Commands::Run {
        sources: None,
        write_processed: false,
    }) {
        Commands::Run {
            sources,
            write_processed,
        } => {
            config.write_processed |= write_processed;
            info!(db = %config.db_path.display(), "starting pipeline");
            run_pipeline(&config, sources)?;
        }
        Commands::Sample { out } => {
            let dir = out.unwrap_or_else(|| config.raw_dir.clone());
            for path in fixtures::write_sample_sources(&dir)? {
                println!("✅ Created '{}'", path.display());
            }
        }
        Commands::Explore {
            latest,
            stats,
            schema,
            query,
            export,
        } => {
            let db = Database::new(&config.db_path);
            let action = match (latest, stats, schema, query) {
                (Some(n), _, _, _) => Some(ExploreAction::Latest(n)),
                (None, true, _, _) => Some(ExploreAction::Stats),
                (None, false, true, _) => Some(ExploreAction::Schema),
                (None, false, false, Some(sql)) => Some(ExploreAction::Query(sql)),
                (None, false, false, None) => None,
            };

            let mut out = io::stdout().lock();
            match action {
                Some(action) => explore::explore_once(&db, &action, export.as_deref(), &mut out)?,
                None if export.is_some() => bail!("--export needs one of --latest, --stats, --schema or --query"),
                None => explore::interactive(&db, &mut io::stdin().lock(), &mut out)?,
            }
        }
    }

    Ok(())
}
