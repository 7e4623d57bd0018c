use analytics::{AnalyticsAggregator, AnalyticsBreakdown, AnalyticsResult};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};
use configuration::{Config, StorageBackend};
use core_types::{parse_bound, BoundKind, ItemKind, LedgerItem, NewItem};
use database::{connect, open_repository, run_migrations, ItemRepository};
use rust_decimal::Decimal;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// The main entry point for the ledger application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config(cli.config.as_deref())?;
    if let Some(backend) = cli.storage {
        config.storage.backend = backend;
    }
    let _log_guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => handle_serve(args, config).await,
        Commands::Migrate => handle_migrate(&config).await,
        Commands::Items(args) => handle_items(args, &config).await,
        Commands::Add(args) => handle_add(args, &config).await,
        Commands::Analytics(args) => handle_analytics(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Track income and expenses, and analyse them over date ranges.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file (default: ./ledger.toml, optional).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the storage backend from the config. `memory` is only
    /// accepted by `serve`; it would be empty again on the next command.
    #[arg(long, global = true, value_enum)]
    storage: Option<StorageBackend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server.
    Serve(ServeArgs),
    /// Apply pending database migrations.
    Migrate,
    /// List recorded items, newest first.
    Items(ItemsArgs),
    /// Record a new income or expense item.
    Add(AddArgs),
    /// Show count, sum, average, median and 90th percentile over a range.
    Analytics(AnalyticsArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to bind (overrides server.host).
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to bind (overrides server.port).
    #[arg(long)]
    port: Option<u16>,

    /// Directory of static files to serve (overrides server.static_dir).
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[derive(Parser)]
struct ItemsArgs {
    /// Earliest date, RFC 3339 or YYYY-MM-DD.
    #[arg(long, value_parser = parse_start)]
    from: Option<DateTime<Utc>>,

    /// Latest date, RFC 3339 or YYYY-MM-DD (a bare date includes the whole day).
    #[arg(long, value_parser = parse_end)]
    to: Option<DateTime<Utc>>,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct AddArgs {
    /// "income" or "expense".
    #[arg(long = "type")]
    kind: ItemKind,

    /// Non-negative amount, e.g. 12.50.
    #[arg(long)]
    amount: Decimal,

    #[arg(long)]
    category: String,

    /// When it happened, RFC 3339 or YYYY-MM-DD (default: now).
    #[arg(long, value_parser = parse_start)]
    date: Option<DateTime<Utc>>,
}

#[derive(Parser)]
struct AnalyticsArgs {
    /// Range start, RFC 3339 or YYYY-MM-DD.
    #[arg(long, value_parser = parse_start)]
    from: DateTime<Utc>,

    /// Range end, RFC 3339 or YYYY-MM-DD (a bare date includes the whole day).
    #[arg(long, value_parser = parse_end)]
    to: DateTime<Utc>,

    /// Also break the statistics down by item type.
    #[arg(long)]
    by_kind: bool,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

fn parse_start(input: &str) -> Result<DateTime<Utc>, String> {
    parse_bound("from", input, BoundKind::Start).map_err(|e| e.to_string())
}

fn parse_end(input: &str) -> Result<DateTime<Utc>, String> {
    parse_bound("to", input, BoundKind::End).map_err(|e| e.to_string())
}

// ==============================================================================
// Command Handlers
// ==============================================================================

async fn handle_serve(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.static_dir.is_some() {
        config.server.static_dir = args.static_dir;
    }
    config.validate()?;

    web_server::run_server(&config).await
}

async fn handle_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = connect(&config.database).await?;
    run_migrations(&pool).await?;
    println!("Migrations completed successfully.");
    Ok(())
}

async fn handle_items(args: ItemsArgs, config: &Config) -> anyhow::Result<()> {
    if let (Some(from), Some(to)) = (args.from, args.to) {
        anyhow::ensure!(from <= to, "'from' ({from}) must not be after 'to' ({to})");
    }

    let repo = open_persistent_repository(config).await?;
    let items = repo.list(args.from, args.to).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        println!("No items found.");
    } else {
        println!("{}", items_table(&items));
    }
    Ok(())
}

async fn handle_add(args: AddArgs, config: &Config) -> anyhow::Result<()> {
    let date = args.date.unwrap_or_else(Utc::now);
    let item = NewItem::new(args.kind, args.amount, args.category, date).validate()?;

    let repo = open_persistent_repository(config).await?;
    let created = repo.create(&item).await?;

    tracing::info!(id = created.id, "Item recorded.");
    println!("{}", items_table(std::slice::from_ref(&created)));
    Ok(())
}

async fn handle_analytics(args: AnalyticsArgs, config: &Config) -> anyhow::Result<()> {
    let aggregator = AnalyticsAggregator::new();
    // Reject an inverted range before touching storage.
    aggregator.compute(&[], args.from, args.to)?;

    let repo = open_persistent_repository(config).await?;
    let items = repo.items_in_range(args.from, args.to).await?;

    if args.by_kind {
        let breakdown = aggregator.compute_by_kind(&items, args.from, args.to)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&breakdown)?);
        } else {
            println!("{}", breakdown_table(&breakdown));
        }
    } else {
        let result = aggregator.compute(&items, args.from, args.to)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("{}", analytics_table(&[("all", &result)]));
        }
    }
    Ok(())
}

/// Opens the configured store for a one-shot command. The in-memory store
/// starts empty and dies with the process, so it is refused here.
async fn open_persistent_repository(config: &Config) -> anyhow::Result<Arc<dyn ItemRepository>> {
    require_persistent_store(config.storage.backend)?;
    Ok(open_repository(config.storage.backend, &config.database).await?)
}

fn require_persistent_store(backend: StorageBackend) -> anyhow::Result<()> {
    anyhow::ensure!(
        backend != StorageBackend::Memory,
        "the memory store does not outlive a single command; use `--storage memory` with `serve` only"
    );
    Ok(())
}

// ==============================================================================
// Table Rendering
// ==============================================================================

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h).fg(Color::White)));
    table
}

fn amount_cell(amount: Decimal) -> Cell {
    Cell::new(amount.round_dp(2)).set_alignment(CellAlignment::Right)
}

fn items_table(items: &[LedgerItem]) -> Table {
    let mut table = new_table(&["ID", "DATE", "TYPE", "CATEGORY", "AMOUNT"]);
    for item in items {
        let kind_color = match item.kind {
            ItemKind::Income => Color::Green,
            ItemKind::Expense => Color::Red,
        };
        table.add_row(vec![
            Cell::new(item.id).fg(Color::Yellow),
            Cell::new(item.date.format("%Y-%m-%d %H:%M")).fg(Color::Cyan),
            Cell::new(item.kind).fg(kind_color),
            Cell::new(&item.category),
            amount_cell(item.amount),
        ]);
    }
    table
}

fn analytics_table(rows: &[(&str, &AnalyticsResult)]) -> Table {
    let mut table = new_table(&["SCOPE", "COUNT", "SUM", "AVG", "MEDIAN", "P90"]);
    for (scope, result) in rows {
        table.add_row(vec![
            Cell::new(scope),
            Cell::new(result.count).set_alignment(CellAlignment::Right),
            amount_cell(result.sum),
            amount_cell(result.avg),
            amount_cell(result.median),
            amount_cell(result.percentile_90),
        ]);
    }
    table
}

fn breakdown_table(breakdown: &AnalyticsBreakdown) -> String {
    let table = analytics_table(&[
        ("all", &breakdown.total),
        (ItemKind::Income.as_str(), &breakdown.income),
        (ItemKind::Expense.as_str(), &breakdown.expense),
    ]);
    format!("{table}\nNet (income - expense): {}", breakdown.net.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn add_arguments_parse() {
        let cli = Cli::try_parse_from([
            "ledger", "add", "--type", "expense", "--amount", "12.50", "--category", "Lunch", "--date", "2024-03-01",
        ])
        .unwrap();
        let Commands::Add(args) = cli.command else {
            panic!("expected the add command");
        };
        assert_eq!(args.kind, ItemKind::Expense);
        assert_eq!(args.amount, Decimal::new(1250, 2));
        assert_eq!(args.date.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn analytics_requires_both_bounds() {
        assert!(Cli::try_parse_from(["ledger", "analytics", "--from", "2024-01-01"]).is_err());
        let cli = Cli::try_parse_from([
            "ledger", "--storage", "memory", "analytics", "--from", "2024-01-01", "--to", "2024-01-31",
        ])
        .unwrap();
        assert_eq!(cli.storage, Some(StorageBackend::Memory));
    }

    #[test]
    fn one_shot_commands_need_a_persistent_store() {
        assert!(require_persistent_store(StorageBackend::Postgres).is_ok());
        let err = require_persistent_store(StorageBackend::Memory).unwrap_err();
        assert!(err.to_string().contains("serve"));
    }

    #[test]
    fn bad_dates_are_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["ledger", "items", "--from", "last week"]).is_err());
    }
}
