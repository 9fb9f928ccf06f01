//! sqlsynth CLI
//!
//! Command-line tool for inspecting query scans and paginated rewrites.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sqlsynth_core::{
    scan_with, BoxError, Dialect, DialectKind, DialectRegistry, PageRequest, ScanOptions,
};
use sqlsynth_exec::prelude::*;

/// Dialect-aware pagination and statement tooling.
#[derive(Parser)]
#[command(name = "sqlsynth")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL, used to pick the dialect.
    #[arg(short, long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the top-level clause offsets of a query as JSON.
    Scan {
        /// The query to scan.
        sql: String,

        /// Dialect whose lexing rules apply, e.g. `mysql` for backslash
        /// escapes in string literals.
        #[arg(long)]
        dialect: Option<String>,
    },

    /// Print the count and page queries for a query.
    Paginate {
        /// The query to paginate.
        sql: String,

        /// Page number, starting at 1.
        #[arg(short, long, default_value_t = 1)]
        page: u64,

        /// Rows per page.
        #[arg(short, long, default_value_t = 10)]
        size: u32,

        /// Dialect name, overriding the one detected from the database URL.
        #[arg(long)]
        dialect: Option<String>,
    },

    /// Run one page of a query against a SQLite database and print it.
    Fetch {
        /// The query to run.
        sql: String,

        /// Page number, starting at 1.
        #[arg(short, long, default_value_t = 1)]
        page: u64,

        /// Rows per page.
        #[arg(short, long, default_value_t = 10)]
        size: u32,
    },

    /// Print the dialect resolved from the database URL.
    Dialect,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => ExecutorConfig::load(path)?,
        None => ExecutorConfig::default(),
    };
    if let Some(url) = cli.database_url {
        config = config.with_database_url(url);
    }

    match cli.command {
        Commands::Scan { sql, dialect } => {
            let options = match dialect {
                Some(name) => name.parse::<DialectKind>()?.dialect().scan_options(),
                None => ScanOptions::default(),
            };
            let meta = scan_with(&sql, options);
            println!("{}", serde_json::to_string_pretty(&meta)?);
        }

        Commands::Paginate {
            sql,
            page,
            size,
            dialect,
        } => {
            let dialect = match dialect {
                Some(name) => name.parse::<DialectKind>()?.dialect(),
                None => resolve_dialect(&config)?,
            };
            let paged = dialect.paginate(&sql, PageRequest::new(page, size))?;
            info!(dialect = dialect.name(), "Rewrote query");
            println!("-- count\n{};", paged.count_sql);
            println!("-- page {page}\n{};", paged.page_sql);
        }

        Commands::Fetch { sql, page, size } => {
            let dialect = resolve_dialect(&config)?;
            if dialect.kind() != DialectKind::Sqlite {
                bail!("fetch only supports SQLite databases, got {}", dialect.name());
            }
            let url = config.database_url.as_deref().unwrap_or_default();

            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await
                .with_context(|| format!("Failed to connect to {url}"))?;
            let mut conn = SqliteConnection::acquire(&pool).await?;

            let result = fetch_page(
                &mut conn,
                dialect,
                &sql,
                &[],
                PageRequest::new(page, size),
                row_to_json,
            )
            .await?;

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "total": result.total,
                    "total_pages": result.total_pages,
                    "current_page": result.current_page,
                    "page_size": result.page_size,
                    "rows": result.rows,
                }))?
            );
        }

        Commands::Dialect => {
            let dialect = resolve_dialect(&config)?;
            println!("{} ({:?} paging)", dialect.name(), dialect.page_strategy());
        }
    }

    Ok(())
}

fn resolve_dialect(config: &ExecutorConfig) -> anyhow::Result<&'static dyn Dialect> {
    let Some(url) = config.database_url.as_deref() else {
        bail!("no database URL; pass --database-url or set DATABASE_URL");
    };
    Ok(DialectRegistry::global().resolve(url)?)
}

/// Converts a SQLite row into a JSON object keyed by column name.
fn row_to_json(row: SqliteRow) -> Result<serde_json::Value, BoxError> {
    let mut object = serde_json::Map::new();
    for (index, column) in row.columns().iter().enumerate() {
        let value = if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
            serde_json::json!(v)
        } else if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
            serde_json::json!(v)
        } else if let Ok(v) = row.try_get::<Option<String>, _>(index) {
            serde_json::json!(v)
        } else {
            let bytes: Option<Vec<u8>> = row.try_get(index)?;
            serde_json::json!(bytes)
        };
        object.insert(column.name().to_owned(), value);
    }
    Ok(serde_json::Value::Object(object))
}
