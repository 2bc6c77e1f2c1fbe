//! Relationship import CLI
//!
//! A command-line front end for importing tracker relationships into the
//! local store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relimport_core::{ImportOptions, ImportStrategy, PayloadFormat, RawPayload, ReportMode, User};
use relimport_db::{init_memory, DbConnection, Repository};
use relimport_importer::{EnvUserProvider, ImportConfig, ImportDispatcher, RepositoryStore};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// relimport - Import tracker relationships from JSON or XML payloads
#[derive(Parser)]
#[command(name = "relimport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database path (defaults to $RELIMPORT_DB_PATH, then ~/.relimport/data)
    #[arg(short, long)]
    db_path: Option<PathBuf>,

    /// Use in-memory database (for testing)
    #[arg(long)]
    memory: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a batch (or single) relationship payload
    Import {
        /// Path to payload file
        path: PathBuf,

        /// Payload format: json or xml (inferred from extension if omitted)
        #[arg(short, long)]
        format: Option<String>,

        /// Import strategy, e.g. CREATE, UPDATE, DELETE, CREATE_AND_UPDATE
        #[arg(short, long)]
        strategy: Option<String>,

        /// Report mode: FULL or ERRORS_ONLY
        #[arg(short, long)]
        report_mode: Option<String>,

        /// Username to attribute the import to
        #[arg(short, long)]
        user: Option<String>,

        /// Validate and report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Update one relationship from a single-record payload
    Update {
        /// Relationship uid
        uid: String,

        /// Path to payload file
        path: PathBuf,

        /// Payload format: json or xml (inferred from extension if omitted)
        #[arg(short, long)]
        format: Option<String>,

        /// Username to attribute the update to
        #[arg(short, long)]
        user: Option<String>,
    },

    /// List recently updated relationships
    List {
        /// Maximum results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show a relationship by uid
    Show {
        /// Relationship uid
        uid: String,
    },

    /// Show database statistics
    Stats,

    /// Delete the local database (fresh start)
    ResetDb {
        /// Database path (defaults to ~/.relimport/data)
        #[arg(short, long)]
        db_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ImportConfig::from_env().context("Invalid configuration")?;

    if let Commands::ResetDb { db_path } = &cli.command {
        let path = resolve_db_path(db_path.clone(), &config)?;

        if path.exists() {
            std::fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to remove db at {}", path.display()))?;
            println!("✓ Removed database at {}", path.display());
        } else {
            println!("Database not found at {}, nothing to remove", path.display());
        }
        return Ok(());
    }

    let db = if cli.memory {
        info!("Using in-memory database");
        init_memory().await?
    } else {
        let db_path = resolve_db_path(cli.db_path.clone(), &config)?;
        open_persistent(&db_path).await?
    };

    let repo = Repository::new(db);

    // Execute command
    match cli.command {
        Commands::Import {
            path,
            format,
            strategy,
            report_mode,
            user,
            dry_run,
        } => {
            let mut options = config.default_options();
            if let Some(strategy) = strategy {
                options.import_strategy = strategy.parse::<ImportStrategy>()?;
            }
            if let Some(report_mode) = report_mode {
                options.report_mode = report_mode.parse::<ReportMode>()?;
            }
            if let Some(user) = user {
                options = options.with_user(User::new(user));
            }
            if dry_run {
                options = options.dry_run();
            }
            cmd_import(repo, &config, path, format, options).await?;
        }
        Commands::Update {
            uid,
            path,
            format,
            user,
        } => {
            let mut options = config.default_options();
            if let Some(user) = user {
                options = options.with_user(User::new(user));
            }
            cmd_update(repo, &config, uid, path, format, options).await?;
        }
        Commands::List { limit } => {
            cmd_list(repo, limit).await?;
        }
        Commands::Show { uid } => {
            cmd_show(repo, uid).await?;
        }
        Commands::Stats => {
            cmd_stats(repo).await?;
        }
        Commands::ResetDb { .. } => {
            // Handled before database init.
        }
    }

    Ok(())
}

fn resolve_db_path(flag: Option<PathBuf>, config: &ImportConfig) -> Result<PathBuf> {
    if let Some(path) = flag.or_else(|| config.db_path.clone()) {
        return Ok(path);
    }

    let mut path = dirs::home_dir().context("Could not find home directory")?;
    path.push(".relimport");
    path.push("data");
    Ok(path)
}

#[cfg(feature = "rocksdb")]
async fn open_persistent(db_path: &Path) -> Result<DbConnection> {
    // Ensure directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!("Using database at: {}", db_path.display());
    Ok(relimport_db::init_persistent(db_path).await?)
}

#[cfg(not(feature = "rocksdb"))]
async fn open_persistent(db_path: &Path) -> Result<DbConnection> {
    anyhow::bail!(
        "Persistent storage at {} requires the `rocksdb` feature; use --memory",
        db_path.display()
    )
}

fn read_payload(path: &Path, format: Option<String>) -> Result<(String, PayloadFormat)> {
    let format = match format {
        Some(format) => format.parse::<PayloadFormat>()?,
        None => PayloadFormat::from_path(path).with_context(|| {
            format!("Cannot infer payload format of {}; pass --format", path.display())
        })?,
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok((content, format))
}

fn dispatcher(repo: Repository, config: &ImportConfig) -> ImportDispatcher<RepositoryStore, EnvUserProvider> {
    ImportDispatcher::new(RepositoryStore::new(repo), EnvUserProvider, config.decoder())
        .with_default_options(config.default_options())
}

async fn cmd_import(
    repo: Repository,
    config: &ImportConfig,
    path: PathBuf,
    format: Option<String>,
    options: ImportOptions,
) -> Result<()> {
    let (content, format) = read_payload(&path, format)?;
    info!("Importing {} as {} ({})", path.display(), format, options.import_strategy);

    let summaries = dispatcher(repo, config)
        .import_payload(RawPayload::new(&content, format), Some(options))
        .await
        .with_context(|| format!("Failed to import {}", path.display()))?;

    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}

async fn cmd_update(
    repo: Repository,
    config: &ImportConfig,
    uid: String,
    path: PathBuf,
    format: Option<String>,
    options: ImportOptions,
) -> Result<()> {
    let (content, format) = read_payload(&path, format)?;

    let summary = dispatcher(repo, config)
        .update_one(&uid, &content, format, Some(options))
        .await
        .with_context(|| format!("Failed to update relationship {}", uid))?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn cmd_list(repo: Repository, limit: usize) -> Result<()> {
    let rows = repo.list_relationships(limit).await?;

    if rows.is_empty() {
        println!("No relationships yet. Import some with: relimport import <file>");
        return Ok(());
    }

    println!("Recent relationships ({}):\n", rows.len());

    for row in rows {
        let kind = row.relationship_type.as_deref().unwrap_or("(untyped)");
        let arrow = if row.bidirectional { "↔" } else { "→" };
        let end = |item: &Option<relimport_core::RelationshipItem>| {
            item.as_ref()
                .and_then(|i| i.reference())
                .map(|(item_kind, uid)| format!("{} {}", item_kind, uid))
                .unwrap_or_else(|| "?".to_string())
        };

        println!("• {} [{}]", kind, row.uid);
        println!("  {} {} {}", end(&row.from), arrow, end(&row.to));
        println!();
    }

    Ok(())
}

async fn cmd_show(repo: Repository, uid: String) -> Result<()> {
    let row = repo
        .get_relationship(&uid)
        .await?
        .with_context(|| format!("Relationship not found: {}", uid))?;

    println!("{}", serde_json::to_string_pretty(&row.to_record())?);
    Ok(())
}

async fn cmd_stats(repo: Repository) -> Result<()> {
    let stats = repo.get_stats().await?;

    println!("Database Statistics:");
    println!("  • Relationships: {}", stats.relationship_count);
    println!("  • Bidirectional: {}", stats.bidirectional_count);
    for (kind, count) in &stats.by_type {
        println!("  • {}: {}", kind, count);
    }

    Ok(())
}
