use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::debug;

use estimate_cli::config::AppConfig;
use estimate_cli::{app, logging, utils};
use estimate_core::{CostField, EstimateKind, ItemField};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Construction estimates: consumables, floor, partitions and roof.
///
/// Edits are applied through the same panel runtime a client card uses, so
/// catalog prices are current and totals are recomputed before saving.
#[derive(Debug, Parser)]
#[command(name = "estimates")]
struct Cli {
    /// Store backend to use (`sqlite` or `memory`).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Store connection string.
    /// For SQLite this is a file path (e.g. `estimates.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// TOML file with `[store]` and `save_delay_ms`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `info,estimate_core=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the estimate kinds.
    Kinds,

    /// Print a client's estimate.
    Show {
        #[arg(long, value_parser = parse_kind)]
        kind: EstimateKind,
        #[arg(long)]
        client: String,
    },

    /// Set the quantity, price or total of one row.
    SetItem {
        #[arg(long, value_parser = parse_kind)]
        kind: EstimateKind,
        #[arg(long)]
        client: String,
        /// 1-based row number as printed by `show`, or the row name.
        #[arg(long)]
        row: String,
        #[arg(long, value_parser = parse_item_field)]
        field: ItemField,
        #[arg(long, allow_hyphen_values = true, value_parser = parse_value)]
        value: Decimal,
    },

    /// Set an extra cost: installation, delivery or roof-work.
    SetCost {
        #[arg(long, value_parser = parse_kind)]
        kind: EstimateKind,
        #[arg(long)]
        client: String,
        #[arg(long, value_parser = parse_cost_field)]
        field: CostField,
        #[arg(long, allow_hyphen_values = true, value_parser = parse_value)]
        value: Decimal,
    },

    /// Set one catalog price.
    SetPrice {
        #[arg(long)]
        name: String,
        #[arg(long, allow_hyphen_values = true, value_parser = parse_value)]
        price: Decimal,
    },

    /// Remove one product from the catalog.
    RemovePrice {
        #[arg(long)]
        name: String,
    },

    /// List the catalog.
    Prices,

    /// Load a `name,price` CSV into the catalog.
    ImportPrices {
        #[arg(long)]
        file: PathBuf,
    },
}

fn parse_kind(s: &str) -> Result<EstimateKind, String> {
    EstimateKind::parse(s).ok_or_else(|| {
        let known: Vec<&str> = EstimateKind::all().iter().map(|k| k.as_str()).collect();
        format!("unknown estimate kind '{s}' (expected one of: {})", known.join(", "))
    })
}

fn parse_item_field(s: &str) -> Result<ItemField, String> {
    ItemField::parse(s).ok_or_else(|| format!("unknown row field '{s}' (expected quantity, price or total)"))
}

fn parse_cost_field(s: &str) -> Result<CostField, String> {
    CostField::parse(s).ok_or_else(|| {
        format!("unknown cost field '{s}' (expected installation, delivery or roof-work)")
    })
}

fn parse_value(s: &str) -> Result<Decimal, String> {
    utils::parse_decimal(s).map_err(|e| e.to_string())
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_default_logging();

    let cli = Cli::parse();

    if let Some(level) = &cli.log_level {
        logging::set_log_level(level)?;
    }
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    }
    .with_overrides(cli.backend, cli.db);

    if let Command::Kinds = cli.command {
        println!("{}", app::describe_kinds());
        return Ok(());
    }

    debug!("connecting to {} backend", config.store.backend);
    let registry = app::build_registry();
    let store = registry
        .create(&config.store)
        .await
        .with_context(|| format!("cannot open {} store", config.store.backend))?;

    match cli.command {
        Command::Kinds => {}
        Command::Show { kind, client } => {
            print!("{}", app::show_estimate(&store, kind, &client).await?);
        }
        Command::SetItem {
            kind,
            client,
            row,
            field,
            value,
        } => {
            let report =
                app::set_item(&store, kind, &client, &row, field, value, config.panel_config()).await?;
            print!("{report}");
        }
        Command::SetCost {
            kind,
            client,
            field,
            value,
        } => {
            let report = app::set_cost(&store, kind, &client, field, value, config.panel_config()).await?;
            print!("{report}");
        }
        Command::SetPrice { name, price } => {
            let change = app::set_price(&*store, &name, price).await?;
            println!("{change:?}: {} = {price}", name.trim());
        }
        Command::RemovePrice { name } => {
            if app::remove_price(&*store, &name).await? {
                println!("Removed: {}", name.trim());
            } else {
                println!("Not in catalog: {}", name.trim());
            }
        }
        Command::Prices => {
            for entry in app::list_prices(&*store).await? {
                println!("{:>12}  {}", entry.price, entry.name);
            }
        }
        Command::ImportPrices { file } => {
            let summary = app::import_prices(&*store, &file).await?;
            println!(
                "Imported {}: {} added, {} modified, {} unchanged",
                file.display(),
                summary.added,
                summary.modified,
                summary.unchanged
            );
        }
    }

    Ok(())
}
