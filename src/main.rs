use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use stockroom::{
    config::{self, AppConfig},
    export,
    models::{
        InventoryItem, ItemUpdate, MovementType, NewItem, NewMovement, NewSale, SalesTransaction,
        StockMovement, StockStatus,
    },
    reports,
    storage::JsonFileStore,
    InventoryStore, ServiceError,
};
use validator::Validate;

type Store = InventoryStore<JsonFileStore>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config().context("failed to load application config")?;
    config::init_tracing(config.log_level(), config.log_json);

    let mut store = InventoryStore::open(JsonFileStore::new(config.data_path()));

    match cli.command {
        Commands::Items(command) => handle_items_command(&mut store, &config, command, cli.json)?,
        Commands::Stock(command) => handle_stock_command(&mut store, command, cli.json)?,
        Commands::Sales(command) => handle_sales_command(&mut store, &config, command, cli.json)?,
        Commands::Dashboard => handle_dashboard(&store, &config, cli.json)?,
        Commands::Report(command) => handle_report_command(&store, &config, command, cli.json)?,
        Commands::Export(args) => handle_export(&store, args, cli.json)?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "stockroom",
    about = "Local-first inventory management: items, stock ledger, sales, and reports",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the item catalog
    #[command(subcommand)]
    Items(ItemsCommands),
    /// Record and inspect stock movements
    #[command(subcommand)]
    Stock(StockCommands),
    /// Record and inspect sales
    #[command(subcommand)]
    Sales(SalesCommands),
    /// Show aggregate statistics and low-stock alerts
    Dashboard,
    /// Printable reports over inventory and sales
    #[command(subcommand)]
    Report(ReportCommands),
    /// Export the item snapshot as CSV
    Export(ExportArgs),
}

#[derive(Subcommand)]
enum ItemsCommands {
    Add(AddItemArgs),
    Update(UpdateItemArgs),
    Delete(ItemSelectorArgs),
    Show(ItemSelectorArgs),
    List(ListItemsArgs),
}

#[derive(Subcommand)]
enum StockCommands {
    /// Receive stock (quantity added to the current level)
    In(StockChangeArgs),
    /// Remove stock; rejected when it exceeds the current level
    Out(StockChangeArgs),
    /// Set an absolute stock level
    Adjust(StockAdjustArgs),
    /// Movement ledger for one item, newest first
    History(ItemSelectorArgs),
}

#[derive(Subcommand)]
enum SalesCommands {
    Record(RecordSaleArgs),
    List,
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Headline totals: items, inventory value, revenue, profit
    Summary,
    /// Inventory grouped by category
    Categories,
    /// Best-selling items by revenue
    TopItems(TopItemsArgs),
    /// Item counts per stock status
    Status,
    /// The complete printable report
    Full(TopItemsArgs),
}

#[derive(Args)]
struct AddItemArgs {
    #[arg(long, help = "Unique SKU for the item")]
    sku: String,
    #[arg(long, help = "Display name for the item")]
    name: String,
    #[arg(long, default_value = "", help = "Category used for report grouping")]
    category: String,
    #[arg(long, default_value = "pcs", help = "Unit of measure (e.g. pcs, kg)")]
    unit: String,
    #[arg(long, value_parser = parse_decimal, help = "Purchase cost per unit")]
    cost_price: Decimal,
    #[arg(long, value_parser = parse_decimal, help = "Selling price per unit")]
    selling_price: Decimal,
    #[arg(long, default_value_t = 0, help = "Opening stock level")]
    stock: i64,
    #[arg(long, default_value_t = 0, help = "Minimum level before the item counts as low stock")]
    min_stock: i64,
}

#[derive(Args)]
struct UpdateItemArgs {
    #[command(flatten)]
    selector: ItemSelector,
    #[arg(long, help = "New SKU value")]
    new_sku: Option<String>,
    #[arg(long, help = "New display name")]
    name: Option<String>,
    #[arg(long, help = "New category")]
    category: Option<String>,
    #[arg(long, help = "New unit of measure")]
    unit: Option<String>,
    #[arg(long, value_parser = parse_decimal, help = "New cost price")]
    cost_price: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal, help = "New selling price")]
    selling_price: Option<Decimal>,
    #[arg(long, help = "New minimum stock level")]
    min_stock: Option<i64>,
}

#[derive(Args)]
struct ItemSelectorArgs {
    #[command(flatten)]
    selector: ItemSelector,
}

#[derive(Args)]
struct ItemSelector {
    #[arg(long, value_parser = clap::value_parser!(Uuid), help = "Item identifier")]
    id: Option<Uuid>,
    #[arg(long, help = "Item SKU (alternative to --id)")]
    sku: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StockStatusArg {
    InStock,
    LowStock,
    OutOfStock,
}

impl From<StockStatusArg> for StockStatus {
    fn from(value: StockStatusArg) -> Self {
        match value {
            StockStatusArg::InStock => StockStatus::InStock,
            StockStatusArg::LowStock => StockStatus::LowStock,
            StockStatusArg::OutOfStock => StockStatus::OutOfStock,
        }
    }
}

#[derive(Args)]
struct ListItemsArgs {
    #[arg(long, help = "Search term matched against name and SKU")]
    search: Option<String>,
    #[arg(long, help = "Filter by category (exact match)")]
    category: Option<String>,
    #[arg(long, value_enum, help = "Filter by stock status")]
    status: Option<StockStatusArg>,
}

#[derive(Args)]
struct StockChangeArgs {
    #[command(flatten)]
    selector: ItemSelector,
    #[arg(long, value_parser = parse_positive_i64, help = "Quantity to move")]
    quantity: i64,
    #[arg(long, help = "Optional reason for this movement")]
    reason: Option<String>,
    #[arg(long, help = "Optional reference (e.g. PO-001, Invoice #123)")]
    reference: Option<String>,
}

#[derive(Args)]
struct StockAdjustArgs {
    #[command(flatten)]
    selector: ItemSelector,
    #[arg(long, value_parser = parse_non_negative_i64, help = "New absolute stock level")]
    level: i64,
    #[arg(long, help = "Optional reason for this adjustment")]
    reason: Option<String>,
    #[arg(long, help = "Optional reference")]
    reference: Option<String>,
}

#[derive(Args)]
struct RecordSaleArgs {
    #[command(flatten)]
    selector: ItemSelector,
    #[arg(long, value_parser = parse_positive_i64, help = "Quantity sold")]
    quantity: i64,
    #[arg(
        long,
        value_parser = parse_decimal,
        help = "Unit price; defaults to the item's selling price"
    )]
    unit_price: Option<Decimal>,
    #[arg(long, help = "Customer name")]
    customer: Option<String>,
    #[arg(long, help = "Reference (e.g. Invoice #123)")]
    reference: Option<String>,
}

#[derive(Args)]
struct TopItemsArgs {
    #[arg(long, default_value_t = 10, help = "Maximum number of items to rank")]
    limit: usize,
}

#[derive(Args)]
struct ExportArgs {
    #[arg(long, help = "Output path; defaults to inventory-report-<date>.csv")]
    output: Option<PathBuf>,
}

fn handle_items_command(
    store: &mut Store,
    config: &AppConfig,
    command: ItemsCommands,
    json: bool,
) -> Result<()> {
    match command {
        ItemsCommands::Add(args) => {
            let new = NewItem {
                sku: normalize_string(args.sku),
                name: normalize_string(args.name),
                category: normalize_string(args.category),
                unit: normalize_string(args.unit),
                cost_price: args.cost_price,
                selling_price: args.selling_price,
                current_stock: args.stock,
                min_stock_level: args.min_stock,
            };
            new.validate().map_err(ServiceError::from)?;
            // SKU uniqueness is a convention checked here, not in the store.
            if store.item_by_sku(&new.sku).is_some() {
                return Err(ServiceError::DuplicateSku(new.sku).into());
            }
            let item = store.add_item(new);
            if json {
                print_json(&item)?;
            } else {
                println!("Created item {} (SKU {})", item.id, item.sku);
            }
            Ok(())
        }
        ItemsCommands::Update(args) => {
            let target = resolve_item(store, &args.selector)?;
            if let Some(new_sku) = args.new_sku.as_deref() {
                if store
                    .item_by_sku(new_sku)
                    .is_some_and(|other| other.id != target.id)
                {
                    return Err(ServiceError::DuplicateSku(new_sku.to_string()).into());
                }
            }
            let update = ItemUpdate {
                sku: args.new_sku.map(normalize_string),
                name: args.name.map(normalize_string),
                category: args.category.map(normalize_string),
                unit: args.unit.map(normalize_string),
                cost_price: args.cost_price,
                selling_price: args.selling_price,
                current_stock: None,
                min_stock_level: args.min_stock,
            };
            let updated = store
                .update_item(target.id, update)
                .with_context(|| format!("failed to update item {}", target.id))?;
            if json {
                print_json(&updated)?;
            } else {
                println!("Updated item {} (SKU {})", updated.id, updated.sku);
            }
            Ok(())
        }
        ItemsCommands::Delete(args) => {
            let target = resolve_item(store, &args.selector)?;
            store
                .delete_item(target.id)
                .with_context(|| format!("failed to delete item {}", target.id))?;
            if json {
                print_json(&serde_json::json!({
                    "itemId": target.id,
                    "status": "deleted"
                }))?;
            } else {
                println!(
                    "Deleted item {} (SKU {}) and its movements and sales",
                    target.id, target.sku
                );
            }
            Ok(())
        }
        ItemsCommands::Show(args) => {
            let item = resolve_item(store, &args.selector)?;
            if json {
                print_json(&item)?;
            } else {
                render_item(&item, config);
                let history = store.item_movements(item.id);
                if !history.is_empty() {
                    println!("Recent movements:");
                    for movement in history.iter().take(5) {
                        render_movement(movement, &item);
                    }
                }
            }
            Ok(())
        }
        ItemsCommands::List(args) => {
            let items = filter_items(store.items(), &args);
            if json {
                print_json(&items)?;
            } else if items.is_empty() {
                println!("No items matched the provided filters.");
            } else {
                println!("Items ({} total)", items.len());
                for item in &items {
                    render_item(item, config);
                }
            }
            Ok(())
        }
    }
}

fn handle_stock_command(store: &mut Store, command: StockCommands, json: bool) -> Result<()> {
    match command {
        StockCommands::In(args) => {
            let item = resolve_item(store, &args.selector)?;
            let movement = store.add_stock_movement(NewMovement {
                item_id: item.id,
                movement_type: MovementType::StockIn,
                quantity: args.quantity,
                previous_stock: item.current_stock,
                new_stock: item.current_stock + args.quantity,
                reason: args.reason.and_then(non_empty),
                reference: args.reference.and_then(non_empty),
            });
            report_movement(&movement, &item, json)
        }
        StockCommands::Out(args) => {
            let item = resolve_item(store, &args.selector)?;
            // The store records whatever it is given; the oversell guard
            // lives here.
            if args.quantity > item.current_stock {
                return Err(ServiceError::InsufficientStock(format!(
                    "cannot remove {} {}: only {} in stock for {}",
                    args.quantity, item.unit, item.current_stock, item.sku
                ))
                .into());
            }
            let movement = store.add_stock_movement(NewMovement {
                item_id: item.id,
                movement_type: MovementType::StockOut,
                quantity: args.quantity,
                previous_stock: item.current_stock,
                new_stock: item.current_stock - args.quantity,
                reason: args.reason.and_then(non_empty),
                reference: args.reference.and_then(non_empty),
            });
            report_movement(&movement, &item, json)
        }
        StockCommands::Adjust(args) => {
            let item = resolve_item(store, &args.selector)?;
            let movement = store.add_stock_movement(NewMovement {
                item_id: item.id,
                movement_type: MovementType::Adjustment,
                quantity: args.level,
                previous_stock: item.current_stock,
                new_stock: args.level,
                reason: args.reason.and_then(non_empty),
                reference: args.reference.and_then(non_empty),
            });
            report_movement(&movement, &item, json)
        }
        StockCommands::History(args) => {
            let item = resolve_item(store, &args.selector)?;
            let history = store.item_movements(item.id);
            if json {
                print_json(&history)?;
            } else if history.is_empty() {
                println!("No movements recorded for {}", item.sku);
            } else {
                println!("Movements for {} ({} total):", item.sku, history.len());
                for movement in &history {
                    render_movement(movement, &item);
                }
            }
            Ok(())
        }
    }
}

fn handle_sales_command(
    store: &mut Store,
    config: &AppConfig,
    command: SalesCommands,
    json: bool,
) -> Result<()> {
    match command {
        SalesCommands::Record(args) => {
            let item = resolve_item(store, &args.selector)?;
            if args.quantity > item.current_stock {
                return Err(ServiceError::InsufficientStock(format!(
                    "{} has only {} {} available",
                    item.sku, item.current_stock, item.unit
                ))
                .into());
            }
            let unit_price = args.unit_price.unwrap_or(item.selling_price);
            let sale = store
                .add_sale(NewSale {
                    item_id: item.id,
                    quantity: args.quantity,
                    unit_price,
                    customer: args.customer.and_then(non_empty),
                    reference: args.reference.and_then(non_empty),
                })
                .with_context(|| format!("failed to record sale for {}", item.sku))?;
            if json {
                print_json(&sale)?;
            } else {
                println!(
                    "Recorded sale of {} {} of {} for {} {} (profit {} {})",
                    sale.quantity,
                    item.unit,
                    item.name,
                    sale.total_amount,
                    config.currency,
                    sale.profit,
                    config.currency
                );
            }
            Ok(())
        }
        SalesCommands::List => {
            let mut sales: Vec<&SalesTransaction> = store.sales().iter().collect();
            sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            if json {
                print_json(&sales)?;
                return Ok(());
            }
            if sales.is_empty() {
                println!("No sales recorded.");
                return Ok(());
            }
            let summary = reports::summary(store.items(), store.sales());
            let margin = reports::average_margin(store.sales());
            println!(
                "Sales ({} transactions) • revenue {} {} • profit {} {} • avg margin {:.1}%",
                sales.len(),
                summary.total_sales,
                config.currency,
                summary.total_profit,
                config.currency,
                margin
            );
            for sale in &sales {
                render_sale(sale, store, config);
            }
            Ok(())
        }
    }
}

fn handle_dashboard(store: &Store, config: &AppConfig, json: bool) -> Result<()> {
    let stats = store.dashboard_stats();
    if json {
        print_json(&stats)?;
        return Ok(());
    }

    println!("Dashboard");
    println!("  Total items:     {}", stats.total_items);
    println!(
        "  Inventory value: {} {}",
        stats.total_value, config.currency
    );
    println!("  Low stock:       {}", stats.low_stock_items);
    println!("  Out of stock:    {}", stats.out_of_stock_items);
    println!(
        "  Today's sales:   {} {}",
        stats.today_sales, config.currency
    );
    println!(
        "  Today's profit:  {} {}",
        stats.today_profit, config.currency
    );

    let low = store.low_stock_items();
    if !low.is_empty() {
        println!("Low stock alert:");
        for item in low {
            println!(
                "  - {} ({}) • {} {} left, minimum {}",
                item.name, item.sku, item.current_stock, item.unit, item.min_stock_level
            );
        }
    }
    Ok(())
}

fn handle_report_command(
    store: &Store,
    config: &AppConfig,
    command: ReportCommands,
    json: bool,
) -> Result<()> {
    match command {
        ReportCommands::Summary => {
            let summary = reports::summary(store.items(), store.sales());
            if json {
                print_json(&summary)?;
            } else {
                render_summary(&summary, config);
            }
            Ok(())
        }
        ReportCommands::Categories => {
            let groups = reports::inventory_by_category(store.items());
            if json {
                print_json(&groups)?;
            } else {
                render_categories(&groups, config);
            }
            Ok(())
        }
        ReportCommands::TopItems(args) => {
            let ranked = reports::top_items(store.items(), store.sales(), args.limit);
            if json {
                print_json(&ranked)?;
            } else {
                render_top_items(&ranked, config);
            }
            Ok(())
        }
        ReportCommands::Status => {
            let counts = reports::stock_status_summary(store.items());
            if json {
                print_json(&counts)?;
            } else {
                render_status_summary(&counts);
            }
            Ok(())
        }
        ReportCommands::Full(args) => {
            if json {
                let payload = serde_json::json!({
                    "generatedAt": Utc::now(),
                    "summary": reports::summary(store.items(), store.sales()),
                    "categories": reports::inventory_by_category(store.items()),
                    "topItems": reports::top_items(store.items(), store.sales(), args.limit),
                    "stockStatus": reports::stock_status_summary(store.items()),
                    "items": store.items(),
                });
                print_json(&payload)?;
                return Ok(());
            }

            println!("Inventory Management Report");
            println!("Generated on {}", Utc::now().format("%Y-%m-%d"));
            println!();
            render_summary(&reports::summary(store.items(), store.sales()), config);
            println!();
            render_categories(&reports::inventory_by_category(store.items()), config);
            println!();
            render_status_summary(&reports::stock_status_summary(store.items()));
            println!();
            render_top_items(
                &reports::top_items(store.items(), store.sales(), args.limit),
                config,
            );
            println!();
            println!("Complete inventory list:");
            for item in store.items() {
                render_item(item, config);
            }
            Ok(())
        }
    }
}

fn handle_export(store: &Store, args: ExportArgs, json: bool) -> Result<()> {
    let csv = export::items_csv(store.items());
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(export::default_export_filename(Utc::now().date_naive())));
    fs::write(&path, &csv).with_context(|| format!("failed writing {}", path.display()))?;
    if json {
        print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "items": store.items().len()
        }))?;
    } else {
        println!(
            "Exported {} item(s) to {}",
            store.items().len(),
            path.display()
        );
    }
    Ok(())
}

fn resolve_item(store: &Store, selector: &ItemSelector) -> Result<InventoryItem> {
    match (selector.id, selector.sku.as_deref()) {
        (Some(id), _) => store
            .item(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("item {}", id)).into()),
        (None, Some(sku)) => store
            .item_by_sku(sku)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("no item with SKU '{}'", sku)).into()),
        (None, None) => {
            Err(ServiceError::InvalidInput("supply --id or --sku to select an item".into()).into())
        }
    }
}

fn filter_items<'a>(items: &'a [InventoryItem], args: &ListItemsArgs) -> Vec<&'a InventoryItem> {
    let search = args.search.as_deref().map(str::to_lowercase);
    let status: Option<StockStatus> = args.status.map(Into::into);
    items
        .iter()
        .filter(|item| {
            let matches_search = search.as_deref().map_or(true, |term| {
                item.name.to_lowercase().contains(term) || item.sku.to_lowercase().contains(term)
            });
            let matches_category = args
                .category
                .as_deref()
                .map_or(true, |category| item.category == category);
            let matches_status = status.map_or(true, |status| item.stock_status() == status);
            matches_search && matches_category && matches_status
        })
        .collect()
}

fn report_movement(movement: &StockMovement, item: &InventoryItem, json: bool) -> Result<()> {
    if json {
        print_json(movement)?;
    } else {
        println!(
            "Recorded {} for {}: {} -> {} {}",
            movement.movement_type, item.sku, movement.previous_stock, movement.new_stock, item.unit
        );
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_item(item: &InventoryItem, config: &AppConfig) {
    let category = if item.category.is_empty() {
        "-"
    } else {
        &item.category
    };
    println!(
        "- {} • {} • {} • stock {} {} (min {}) • cost {} {} • price {} {} • {}",
        item.sku,
        item.name,
        category,
        item.current_stock,
        item.unit,
        item.min_stock_level,
        item.cost_price,
        config.currency,
        item.selling_price,
        config.currency,
        item.stock_status()
    );
}

fn render_movement(movement: &StockMovement, item: &InventoryItem) {
    let detail = [
        movement.reason.as_deref().unwrap_or("-"),
        movement.reference.as_deref().unwrap_or("-"),
    ]
    .join(" / ");
    println!(
        "  • {} • {} • qty {} • {} -> {} {} • {}",
        movement.created_at.format("%Y-%m-%d %H:%M"),
        movement.movement_type,
        movement.quantity,
        movement.previous_stock,
        movement.new_stock,
        item.unit,
        detail
    );
}

fn render_sale(sale: &SalesTransaction, store: &Store, config: &AppConfig) {
    let name = store
        .item(sale.item_id)
        .map(|item| item.name.as_str())
        .unwrap_or("Unknown Item");
    println!(
        "- {} • {} • {} x {} {} • total {} {} • profit {} {} • {}",
        sale.created_at.format("%Y-%m-%d %H:%M"),
        name,
        sale.quantity,
        sale.unit_price,
        config.currency,
        sale.total_amount,
        config.currency,
        sale.profit,
        config.currency,
        sale.customer.as_deref().unwrap_or("-")
    );
}

fn render_summary(summary: &reports::ReportSummary, config: &AppConfig) {
    println!("Summary");
    println!("  Total items:     {}", summary.total_items);
    println!(
        "  Inventory value: {} {}",
        summary.inventory_value, config.currency
    );
    println!(
        "  Total sales:     {} {}",
        summary.total_sales, config.currency
    );
    println!(
        "  Total profit:    {} {}",
        summary.total_profit, config.currency
    );
}

fn render_categories(groups: &[reports::CategorySummary], config: &AppConfig) {
    println!("Inventory by category:");
    if groups.is_empty() {
        println!("  (no items)");
    }
    for group in groups {
        println!(
            "  - {} • {} item(s) • qty {} • value {} {}",
            group.category, group.items, group.quantity, group.value, config.currency
        );
    }
}

fn render_top_items(ranked: &[reports::ItemSalesSummary], config: &AppConfig) {
    println!("Top performing items:");
    if ranked.is_empty() {
        println!("  (no sales)");
    }
    for entry in ranked {
        println!(
            "  - {} • sold {} {} • revenue {} {} • profit {} {} • {} transaction(s)",
            entry.name,
            entry.quantity,
            entry.unit,
            entry.revenue,
            config.currency,
            entry.profit,
            config.currency,
            entry.transactions
        );
    }
}

fn render_status_summary(counts: &reports::StatusSummary) {
    println!("Stock status overview:");
    println!("  In stock:     {}", counts.in_stock);
    println!("  Low stock:    {}", counts.low_stock);
    println!("  Out of stock: {}", counts.out_of_stock);
}

fn normalize_string(value: String) -> String {
    value.trim().to_string()
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw).map_err(|_| format!("invalid decimal '{raw}'"))
}

fn parse_positive_i64(raw: &str) -> Result<i64, String> {
    let value: i64 = raw
        .parse()
        .map_err(|_| format!("invalid integer '{raw}'"))?;
    if value <= 0 {
        Err("value must be greater than zero".to_string())
    } else {
        Ok(value)
    }
}

fn parse_non_negative_i64(raw: &str) -> Result<i64, String> {
    let value: i64 = raw
        .parse()
        .map_err(|_| format!("invalid integer '{raw}'"))?;
    if value < 0 {
        Err("value cannot be negative".to_string())
    } else {
        Ok(value)
    }
}
