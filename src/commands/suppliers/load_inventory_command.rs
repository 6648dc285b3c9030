use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::{
    commands::{Command, SyncContext},
    errors::{ServiceError, StoreError},
    events::Event,
    models::SupplierId,
    store::ProductFilter,
};

/// Fetches every supplier, then each supplier's products, into the mirror.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadInventoryCommand;

#[derive(Debug, Default, Serialize)]
pub struct HydrationReport {
    pub suppliers: usize,
    /// Suppliers whose product slice was populated, in completion order.
    pub loaded: Vec<SupplierId>,
    pub failed: Vec<(SupplierId, StoreError)>,
}

impl HydrationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[async_trait]
impl Command for LoadInventoryCommand {
    type Result = HydrationReport;

    #[instrument(skip(self, ctx))]
    async fn execute(&self, ctx: &SyncContext) -> Result<Self::Result, ServiceError> {
        let suppliers = ctx.store.list_suppliers().await.map_err(|e| {
            error!("Failed to list suppliers: {}", e);
            ServiceError::Store(e)
        })?;

        ctx.mirror.write().await.set_suppliers(suppliers.clone());

        let mut report = HydrationReport {
            suppliers: suppliers.len(),
            ..Default::default()
        };

        // One request per supplier; each slice lands as soon as its own
        // request completes.
        let mut pending: FuturesUnordered<_> = suppliers
            .into_iter()
            .filter(|supplier| {
                if supplier.id.is_empty() {
                    warn!(name = %supplier.name, "skipping supplier without id");
                }
                !supplier.id.is_empty()
            })
            .map(|supplier| {
                let store = ctx.store.clone();
                async move {
                    let filter = ProductFilter::by_supplier(supplier.id.clone());
                    (supplier.id, store.list_products(filter).await)
                }
            })
            .collect();

        while let Some((supplier_id, result)) = pending.next().await {
            match result {
                Ok(products) => {
                    let count = products.len();
                    let dropped = ctx
                        .mirror
                        .write()
                        .await
                        .replace_supplier(supplier_id.clone(), products);
                    if dropped > 0 {
                        warn!(%supplier_id, dropped, "store returned products of another supplier");
                    }
                    info!(%supplier_id, count, "supplier products loaded");
                    report.loaded.push(supplier_id);
                }
                Err(e) => {
                    warn!(%supplier_id, error = %e, "failed to load supplier products");
                    report.failed.push((supplier_id, e));
                }
            }
        }

        ctx.emit(Event::Hydrated {
            suppliers: report.suppliers,
            loaded: report.loaded.len(),
            failed: report.failed.len(),
        });

        Ok(report)
    }
}
