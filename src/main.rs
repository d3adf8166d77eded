use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;
use warehouse_ledger::{
    config::{self, AppConfig},
    db::{self, DbPool},
    dto::LedgerPosting,
    entities::{inventory, inventory_trx},
    events::{self, EventSender},
    services::{CounterService, InventoryQueryService, InventoryService},
    ServiceError,
};

#[derive(Parser)]
#[command(
    name = "warehouse-ledger",
    version,
    about = "Post warehouse orders to the inventory ledger and inspect lots"
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
    /// Apply pending database migrations
    Migrate,
    /// Post an order (receipt, usage, return or transfer) to the ledger
    Post(PostArgs),
    /// List active lots for an item at a location, oldest first
    Lots(LotsArgs),
    /// Show the ledger rows written for an order
    Trx(TrxArgs),
    /// Compare on-hand lot quantities with ledger movements for an item
    Reconcile(ReconcileArgs),
    /// Pick-counter sessions
    #[command(subcommand)]
    Counter(CounterCommands),
}

#[derive(Args)]
struct PostArgs {
    /// Order id
    #[arg(long)]
    order: i32,
    /// Inventory lot id; required for usage and return orders
    #[arg(long)]
    lot: Option<i32>,
}

#[derive(Args)]
struct LotsArgs {
    #[arg(long)]
    item: i32,
    #[arg(long)]
    location: i32,
}

#[derive(Args)]
struct TrxArgs {
    #[arg(long)]
    order: i32,
}

#[derive(Args)]
struct ReconcileArgs {
    #[arg(long)]
    item: i32,
}

#[derive(Subcommand)]
enum CounterCommands {
    /// Start counting on a counter
    Start {
        #[arg(long)]
        counter: i32,
        #[arg(long)]
        order: Option<i32>,
        #[arg(long)]
        expected: i32,
    },
    /// Add scanned units to a running count
    Scan {
        #[arg(long)]
        counter: i32,
        #[arg(long)]
        qty: i32,
    },
    /// Finish a running count
    Finish {
        #[arg(long)]
        counter: i32,
    },
    /// Show a counter's current state
    Show {
        #[arg(long)]
        counter: i32,
    },
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
    event_sender: EventSender,
    event_task: JoinHandle<()>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        let db = Arc::new(db_pool);

        let (event_sender, event_rx) = events::channel(config.event_channel_capacity);
        let event_task = tokio::spawn(events::process_events(event_rx));

        Ok(Self {
            config,
            db,
            event_sender,
            event_task,
        })
    }

    fn inventory_service(&self) -> InventoryService {
        InventoryService::new(self.db.clone()).with_events(self.event_sender.clone())
    }

    fn query_service(&self) -> InventoryQueryService {
        InventoryQueryService::new(self.db.clone())
    }

    fn counter_service(&self) -> CounterService {
        CounterService::new(self.db.clone())
    }

    /// Lets the event loop drain before the process exits.
    async fn shutdown(self) -> Result<()> {
        drop(self.event_sender);
        self.event_task.await.context("event task panicked")?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let json = cli.json;
    let context = CliContext::initialize().await?;

    if context.config.auto_migrate || matches!(cli.command, Commands::Migrate) {
        db::run_migrations(&context.db)
            .await
            .context("failed to run migrations")?;
    }

    let outcome = match cli.command {
        Commands::Migrate => {
            info!("Schema is up to date");
            Ok(())
        }
        Commands::Post(args) => handle_post(&context, args, json).await,
        Commands::Lots(args) => handle_lots(&context, args, json).await,
        Commands::Trx(args) => handle_trx(&context, args, json).await,
        Commands::Reconcile(args) => handle_reconcile(&context, args, json).await,
        Commands::Counter(command) => handle_counter(&context, command, json).await,
    };

    context.shutdown().await?;

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => Ok(report_failure(&err, json)),
    }
}

/// Prints a failed command. Ledger errors render as their error response;
/// business-rule rejections exit with 2, everything else with 1.
fn report_failure(err: &anyhow::Error, json: bool) -> ExitCode {
    let Some(service_err) = err.downcast_ref::<ServiceError>() else {
        eprintln!("error: {:#}", err);
        return ExitCode::FAILURE;
    };

    let response = service_err.to_response();
    if json {
        match serde_json::to_string_pretty(&response) {
            Ok(body) => eprintln!("{}", body),
            Err(_) => eprintln!("{}", response.message),
        }
    } else {
        eprintln!(
            "error [{} {}]: {:#}",
            service_err.status_code().as_u16(),
            response.code,
            err
        );
    }

    if service_err.is_business_rule() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

async fn handle_post(context: &CliContext, args: PostArgs, json: bool) -> Result<()> {
    let posting = context
        .inventory_service()
        .post_order(args.order, args.lot)
        .await
        .with_context(|| format!("failed to post order {}", args.order))?;

    if json {
        return print_json(&posting);
    }

    match &posting {
        LedgerPosting::Receipt(p) => {
            println!("Receipt posted to new lot");
            render_lot(&p.lot);
        }
        LedgerPosting::Usage(p) => {
            println!("Usage posted");
            render_lot(&p.lot);
        }
        LedgerPosting::Return(p) => {
            println!(
                "Return posted ({} still returnable)",
                p.remaining_returnable
            );
            render_lot(&p.lot);
        }
        LedgerPosting::Transfer(p) => {
            println!(
                "Transfer of {} from location {} to {} in {} leg(s)",
                p.quantity(),
                p.from_loc_id,
                p.to_loc_id,
                p.legs.len()
            );
            for leg in &p.legs {
                println!(
                    "- {} from lot {} into lot {}{}",
                    leg.quantity,
                    leg.source.id,
                    leg.destination.id,
                    if leg.merged { " (merged)" } else { "" }
                );
            }
        }
    }
    for trx in posting.transactions() {
        render_trx(trx);
    }
    Ok(())
}

async fn handle_lots(context: &CliContext, args: LotsArgs, json: bool) -> Result<()> {
    let service = context.query_service();
    let lots = service.lots(args.item, args.location).await?;
    if json {
        return print_json(&lots);
    }

    let summary = service.stock_summary(args.item, args.location).await?;
    println!(
        "Item {} at location {}: {} on hand in {} lot(s), value {}",
        summary.item_id, summary.loc_id, summary.quantity, summary.lot_count, summary.total_cost
    );
    for lot in &lots {
        render_lot(lot);
    }
    Ok(())
}

async fn handle_trx(context: &CliContext, args: TrxArgs, json: bool) -> Result<()> {
    let rows = context
        .query_service()
        .transactions_for_order(args.order)
        .await?;
    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No ledger rows for order {}", args.order);
    }
    for trx in &rows {
        render_trx(trx);
    }
    Ok(())
}

async fn handle_reconcile(context: &CliContext, args: ReconcileArgs, json: bool) -> Result<()> {
    let reconciliation = context.query_service().reconcile_item(args.item).await?;
    if json {
        return print_json(&reconciliation);
    }
    println!(
        "Item {}: on hand {}, ledger net {}, {}",
        reconciliation.item_id,
        reconciliation.on_hand,
        reconciliation.ledger_net,
        if reconciliation.is_balanced() {
            "balanced"
        } else {
            "NOT balanced"
        }
    );
    for lot_id in &reconciliation.inconsistent_lots {
        println!("- lot {} total_cost does not match quantity * unit_cost", lot_id);
    }
    Ok(())
}

async fn handle_counter(context: &CliContext, command: CounterCommands, json: bool) -> Result<()> {
    let service = context.counter_service();
    match command {
        CounterCommands::Start {
            counter,
            order,
            expected,
        } => {
            let runtime = service.start(counter, order, expected).await?;
            if json {
                return print_json(&runtime);
            }
            println!("Counter {} counting, expecting {}", counter, runtime.expected_qty);
        }
        CounterCommands::Scan { counter, qty } => {
            let runtime = service.scan(counter, qty).await?;
            if json {
                return print_json(&runtime);
            }
            println!(
                "Counter {} scanned {} of {}",
                counter, runtime.scanned_qty, runtime.expected_qty
            );
        }
        CounterCommands::Finish { counter } => {
            let result = service.finish(counter).await?;
            if json {
                return print_json(&result);
            }
            println!(
                "Counter {} finished: scanned {}, variance {}",
                counter, result.runtime.scanned_qty, result.variance
            );
        }
        CounterCommands::Show { counter } => match service.runtime(counter).await? {
            Some(runtime) if json => return print_json(&runtime),
            Some(runtime) => println!(
                "Counter {} {} ({} of {})",
                counter, runtime.status, runtime.scanned_qty, runtime.expected_qty
            ),
            None => println!("Counter {} has never been started", counter),
        },
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_lot(lot: &inventory::Model) {
    println!(
        "- Lot {} • item {} • location {} • qty {} @ {} = {}{}",
        lot.id,
        lot.item_id,
        lot.loc_id,
        lot.quantity,
        lot.unit_cost,
        lot.total_cost,
        match lot.receipt_id {
            Some(receipt_id) => format!(" • receipt {}", receipt_id),
            None => " • transfer".to_string(),
        }
    );
}

fn render_trx(trx: &inventory_trx::Model) {
    println!(
        "  trx {} • {} {} • lot {} • location {} • qty {:+} @ {} = {}",
        trx.id,
        trx.order_type,
        if trx.is_inbound() { "in" } else { "out" },
        trx.inv_id,
        trx.loc_id,
        trx.qty,
        trx.unit_cost,
        trx.total_cost
    );
}
