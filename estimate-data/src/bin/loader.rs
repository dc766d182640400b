use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use estimate_data::CatalogLoader;
use estimate_db_sqlite::{SqliteStore, database_url};

/// Load product prices from a CSV file into the catalog.
///
/// The CSV file needs a `name,price` header. Names must match estimate rows
/// exactly; prices may use spaces or commas as thousands separators.
#[derive(Parser, Debug)]
#[command(name = "catalog-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing product prices
    #[arg(short, long)]
    file: PathBuf,

    /// Database file, `:memory:`, or a sqlx SQLite URL
    #[arg(short, long, default_value = "estimates.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let url = database_url(&args.database);
    let store = SqliteStore::new(&url)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        store
            .run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        store
            .run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Loading prices from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = CatalogLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let summary = CatalogLoader::load(&store, &records)
        .await
        .context("Failed to load prices into the catalog")?;

    println!(
        "Catalog updated: {} added, {} modified, {} unchanged.",
        summary.added, summary.modified, summary.unchanged
    );

    Ok(())
}
