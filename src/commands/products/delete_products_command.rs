use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::{
    commands::{Command, SyncContext},
    errors::{ServiceError, StoreError},
    events::Event,
    models::{ProductId, SupplierId},
};

/// Deletes selected products one at a time, stopping at the first failure.
///
/// Deletions that succeeded before the failure stay applied; nothing is
/// rolled back and nothing after the failure is attempted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteProductsCommand {
    pub batch: Vec<(SupplierId, Vec<ProductId>)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchDeleteFailure {
    pub supplier_id: SupplierId,
    pub product_id: ProductId,
    pub error: StoreError,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchDeleteReport {
    pub deleted: Vec<(SupplierId, ProductId)>,
    pub failed: Option<BatchDeleteFailure>,
    /// Never attempted because an earlier deletion failed.
    pub skipped: Vec<(SupplierId, ProductId)>,
}

impl BatchDeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

impl DeleteProductsCommand {
    pub fn len(&self) -> usize {
        self.batch.iter().map(|(_, ids)| ids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Command for DeleteProductsCommand {
    type Result = BatchDeleteReport;

    #[instrument(skip(self, ctx), fields(count = self.len()))]
    async fn execute(&self, ctx: &SyncContext) -> Result<Self::Result, ServiceError> {
        let mut report = BatchDeleteReport::default();
        let pairs: Vec<(SupplierId, ProductId)> = self
            .batch
            .iter()
            .flat_map(|(supplier_id, ids)| {
                ids.iter()
                    .map(|id| (supplier_id.clone(), id.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        let mut queue = pairs.into_iter();

        while let Some((supplier_id, product_id)) = queue.next() {
            if let Err(e) = ctx.store.delete_product(product_id.clone()).await {
                error!(%product_id, "Error deleting product: {}", e);
                report.skipped = queue.by_ref().collect();
                ctx.emit(Event::BatchDeleteHalted {
                    product_id: product_id.clone(),
                    deleted: report.deleted.len(),
                    skipped: report.skipped.len(),
                    error: e.to_string(),
                });
                report.failed = Some(BatchDeleteFailure {
                    supplier_id,
                    product_id,
                    error: e,
                });
                return Ok(report);
            }

            ctx.mirror.write().await.remove(&supplier_id, &product_id);
            info!(%product_id, "Product deleted");
            ctx.emit(Event::ProductDeleted {
                supplier_id: supplier_id.clone(),
                product_id: product_id.clone(),
            });
            report.deleted.push((supplier_id, product_id));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::store::MockEntityStore;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::sync::Arc;

    fn product(id: &str) -> Product {
        Product {
            id: ProductId::from(id),
            supplier_id: SupplierId::from("S1"),
            name: id.into(),
            dose: None,
            quantity: 1,
            expiration: "2025-01-01".into(),
            cost: 1.0,
            retail: 2.0,
            num_sold: None,
            notes: None,
        }
    }

    fn batch(ids: &[&str]) -> DeleteProductsCommand {
        DeleteProductsCommand {
            batch: vec![(
                SupplierId::from("S1"),
                ids.iter().map(|id| ProductId::from(*id)).collect(),
            )],
        }
    }

    async fn context(store: MockEntityStore) -> SyncContext {
        let ctx = SyncContext::new(Arc::new(store), None);
        ctx.mirror.write().await.replace_supplier(
            SupplierId::from("S1"),
            vec![product("P1"), product("P2"), product("P3")],
        );
        ctx
    }

    #[tokio::test]
    async fn halts_at_first_failure_without_rollback() {
        let mut store = MockEntityStore::new();
        let mut seq = Sequence::new();
        store
            .expect_delete_product()
            .with(eq(ProductId::from("P1")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        store
            .expect_delete_product()
            .with(eq(ProductId::from("P2")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(StoreError::Transport("timeout".into())));
        store
            .expect_delete_product()
            .with(eq(ProductId::from("P3")))
            .times(0);
        let ctx = context(store).await;

        let report = batch(&["P1", "P2", "P3"]).execute(&ctx).await.unwrap();

        assert!(!report.is_complete());
        assert_eq!(
            report.deleted,
            vec![(SupplierId::from("S1"), ProductId::from("P1"))]
        );
        assert_eq!(
            report.failed.as_ref().map(|f| f.product_id.clone()),
            Some(ProductId::from("P2"))
        );
        assert_eq!(
            report.skipped,
            vec![(SupplierId::from("S1"), ProductId::from("P3"))]
        );
        assert_eq!(
            ctx.mirror.read().await.products(&SupplierId::from("S1")),
            &[product("P2"), product("P3")]
        );
    }

    #[tokio::test]
    async fn complete_batch_removes_everything() {
        let mut store = MockEntityStore::new();
        store.expect_delete_product().times(2).returning(|_| Ok(()));
        let ctx = context(store).await;

        let report = batch(&["P3", "P1"]).execute(&ctx).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.deleted.len(), 2);
        assert_eq!(
            ctx.mirror.read().await.products(&SupplierId::from("S1")),
            &[product("P2")]
        );
    }

    #[tokio::test]
    async fn empty_batch_is_a_noop() {
        let mut store = MockEntityStore::new();
        store.expect_delete_product().times(0);
        let ctx = context(store).await;

        let cmd = DeleteProductsCommand::default();
        assert!(cmd.is_empty());
        let report = cmd.execute(&ctx).await.unwrap();
        assert!(report.is_complete());
        assert!(report.deleted.is_empty());
    }
}
