use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use hazmo_inventory::{
    commands::products::UpdateOutcome,
    config::{self, AppConfig},
    events::{process_events, EventSender},
    models::{AddProductForm, Product, ProductField, ProductId, Supplier, SupplierId},
    selection::ClickTarget,
    store::{EntityStore, HttpStore, InMemoryStore},
    view::{SupplierCard, TableView},
    InventorySyncService,
};
use serde::Serialize;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize(cli.offline).await?;
    let mut view = context.table_view();

    let report = view.load().await.context("failed to load inventory")?;
    debug!(
        target: "hazmo_cli",
        suppliers = report.suppliers,
        failed = report.failed.len(),
        "inventory loaded"
    );
    for (supplier_id, error) in &report.failed {
        eprintln!("warning: products of supplier {} not loaded: {}", supplier_id, error);
    }

    match cli.command {
        Commands::List => handle_list(&view, cli.json).await?,
        Commands::Add(args) => handle_add(&mut view, args, cli.json).await?,
        Commands::Set(args) => handle_set(&mut view, args, cli.json).await?,
        Commands::Delete(args) => handle_delete(&mut view, args, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "hazmo-cli", about = "Inventory of suppliers and their products")]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Run against a seeded in-memory store instead of the hosted one"
    )]
    offline: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every supplier with its products
    List,
    /// Add a product to a supplier
    Add(AddArgs),
    /// Change one field of a product
    Set(SetArgs),
    /// Delete selected products, stopping at the first failure
    Delete(DeleteArgs),
}

#[derive(Args)]
struct AddArgs {
    #[arg(long, help = "Supplier that owns the new product")]
    supplier: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "", help = "Dose in mL; leave out for none")]
    dose: String,
    #[arg(long)]
    quantity: String,
    #[arg(long, help = "Expiration date as YYYY-MM-DD")]
    expiration: String,
    #[arg(long)]
    cost: String,
    #[arg(long)]
    retail: String,
}

#[derive(Args)]
struct SetArgs {
    product: String,
    #[arg(help = "One of name, dose, quantity, expiration, cost, retail, numSold, notes")]
    field: ProductField,
    value: String,
}

#[derive(Args)]
struct DeleteArgs {
    #[arg(
        long = "select",
        required = true,
        value_parser = parse_selection,
        help = "Product to delete as SUPPLIER:PRODUCT; repeat for several"
    )]
    selections: Vec<(SupplierId, ProductId)>,
}

fn parse_selection(raw: &str) -> Result<(SupplierId, ProductId), String> {
    match raw.split_once(':') {
        Some((supplier, product)) if !supplier.is_empty() && !product.is_empty() => {
            Ok((SupplierId::from(supplier), ProductId::from(product)))
        }
        _ => Err(format!("expected SUPPLIER:PRODUCT, got '{}'", raw)),
    }
}

async fn handle_list(view: &TableView, json: bool) -> Result<()> {
    let cards = view.cards().await;
    if json {
        return print_json(&cards);
    }
    if cards.is_empty() {
        println!("No suppliers found.");
    }
    for card in &cards {
        render_card(card);
    }
    Ok(())
}

async fn handle_add(view: &mut TableView, args: AddArgs, json: bool) -> Result<()> {
    let form = AddProductForm {
        name: args.name,
        dose: args.dose,
        quantity: args.quantity,
        expiration: args.expiration,
        cost: args.cost,
        retail: args.retail,
    };
    view.open_add_dialog(SupplierId::from(args.supplier.as_str()));
    let result = view.submit_add_form(form).await;
    report_notice(view);

    let product = result.context("failed to create product")?;
    if json {
        print_json(&product)?;
    } else {
        render_product(&product);
    }
    Ok(())
}

async fn handle_set(view: &mut TableView, args: SetArgs, json: bool) -> Result<()> {
    let product_id = ProductId::from(args.product.as_str());
    let outcome = view
        .commit_edit(product_id.clone(), args.field, &args.value)
        .await;
    report_notice(view);

    let outcome = outcome.with_context(|| format!("failed to update product {}", product_id))?;
    if json {
        print_json(&outcome)?;
    } else if let UpdateOutcome::Updated(product) = &outcome {
        render_product(product);
    } else {
        println!("{} already has that {}; nothing sent.", product_id, args.field);
    }
    Ok(())
}

async fn handle_delete(view: &mut TableView, args: DeleteArgs, json: bool) -> Result<()> {
    for (supplier_id, product_id) in &args.selections {
        if !view.selection().is_selected(supplier_id, product_id) {
            view.click_row(supplier_id, product_id, ClickTarget::Row);
        }
    }

    let report = view
        .delete_selected()
        .await
        .context("failed to delete products")?;
    if json {
        print_json(&report)?;
    } else {
        for (supplier_id, product_id) in &report.deleted {
            println!("- deleted {} from {}", product_id, supplier_id);
        }
        for (supplier_id, product_id) in &report.skipped {
            println!("- skipped {} from {}", product_id, supplier_id);
        }
    }
    report_notice(view);

    match report.failed {
        Some(failure) => Err(anyhow!(
            "deletion stopped at {}: {}",
            failure.product_id,
            failure.error
        )),
        None => Ok(()),
    }
}

struct CliContext {
    config: AppConfig,
    store: Arc<dyn EntityStore>,
    event_sender: EventSender,
}

impl CliContext {
    async fn initialize(offline: bool) -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(&config.log_level, config.log_json);

        let store: Arc<dyn EntityStore> = if offline {
            Arc::new(seeded_store().await)
        } else {
            Arc::new(
                HttpStore::new(&config.store_url, config.api_key.clone())
                    .context("failed to build store client")?,
            )
        };

        let (event_sender, event_rx) = EventSender::channel(config.event_channel_capacity);
        tokio::spawn(process_events(event_rx));

        Ok(Self {
            config,
            store,
            event_sender,
        })
    }

    fn table_view(&self) -> TableView {
        let sync = InventorySyncService::new(self.store.clone(), Some(self.event_sender.clone()));
        TableView::new(sync, self.config.notice_auto_hide())
    }
}

async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.add_supplier(Supplier::new("S1", "Northwind Medical")).await;
    store.add_supplier(Supplier::new("S2", "Harbor Pharma")).await;
    store
        .add_product(Product {
            id: ProductId::from("P1"),
            supplier_id: SupplierId::from("S1"),
            name: "Saline".into(),
            dose: Some(10),
            quantity: 5,
            expiration: "2025-01-01".into(),
            cost: 1.0,
            retail: 2.0,
            num_sold: Some(0),
            notes: None,
        })
        .await;
    store
        .add_product(Product {
            id: ProductId::from("P2"),
            supplier_id: SupplierId::from("S2"),
            name: "Lidocaine".into(),
            dose: None,
            quantity: 12,
            expiration: "2026-06-30".into(),
            cost: 4.5,
            retail: 9.0,
            num_sold: Some(3),
            notes: Some("keep refrigerated".into()),
        })
        .await;
    store
}

fn report_notice(view: &TableView) {
    if let Some(notice) = view.notice() {
        if notice.is_error() {
            eprintln!("{}", notice.message);
        } else {
            println!("{}", notice.message);
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_card(card: &SupplierCard) {
    println!(
        "{} ({}) • {} product(s)",
        card.supplier.name,
        card.supplier.id,
        card.products.len()
    );
    for row in &card.products {
        render_product(&row.product);
    }
}

fn render_product(product: &Product) {
    let dose = product.dose_label();
    let name = if dose.is_empty() {
        product.name.clone()
    } else {
        format!("{} {}", product.name, dose)
    };
    println!(
        "- {} • {} • qty {} • exp {} • cost {:.2} • retail {:.2} • sold {}",
        product.id,
        name,
        product.quantity,
        product.expiration,
        product.cost,
        product.retail,
        product.num_sold.unwrap_or(0)
    );
    if let Some(notes) = product.notes.as_deref().filter(|n| !n.is_empty()) {
        println!("    {}", notes);
    }
}
