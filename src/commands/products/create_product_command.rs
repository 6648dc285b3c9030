use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::{
    commands::{Command, SyncContext},
    errors::ServiceError,
    events::Event,
    models::{AddProductForm, Product, SupplierId},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductCommand {
    pub supplier_id: SupplierId,
    pub form: AddProductForm,
}

#[async_trait]
impl Command for CreateProductCommand {
    type Result = Product;

    #[instrument(skip(self, ctx), fields(supplier_id = %self.supplier_id))]
    async fn execute(&self, ctx: &SyncContext) -> Result<Self::Result, ServiceError> {
        if self.supplier_id.is_empty() || !ctx.mirror.read().await.has_supplier(&self.supplier_id)
        {
            return Err(ServiceError::UnknownSupplier(self.supplier_id.clone()));
        }

        let new_product = self.form.parse(self.supplier_id.clone())?;

        let created = ctx
            .store
            .create_product(new_product)
            .await
            .map_err(|e| {
                error!("Failed to create product: {}", e);
                ServiceError::Store(e)
            })?
            .ok_or(ServiceError::EmptyResult("product.create"))?;

        if created.supplier_id != self.supplier_id {
            warn!(
                returned = %created.supplier_id,
                "store filed the created product under another supplier"
            );
        }

        ctx.mirror.write().await.append(created.clone());
        info!(product_id = %created.id, "Product created");

        ctx.emit(Event::ProductCreated {
            supplier_id: created.supplier_id.clone(),
            product_id: created.id.clone(),
        });

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::models::{Product, ProductId, Supplier};
    use crate::store::MockEntityStore;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn form() -> AddProductForm {
        AddProductForm {
            name: "Gadget".into(),
            dose: String::new(),
            quantity: "3".into(),
            expiration: "2025-01-01".into(),
            cost: "2.5".into(),
            retail: "5.0".into(),
        }
    }

    fn gadget() -> Product {
        Product {
            id: ProductId::from("P2"),
            supplier_id: SupplierId::from("S1"),
            name: "Gadget".into(),
            dose: None,
            quantity: 3,
            expiration: "2025-01-01".into(),
            cost: 2.5,
            retail: 5.0,
            num_sold: Some(0),
            notes: None,
        }
    }

    async fn context(store: MockEntityStore) -> SyncContext {
        let ctx = SyncContext::new(Arc::new(store), None);
        ctx.mirror
            .write()
            .await
            .set_suppliers(vec![Supplier::new("S1", "Acme")]);
        ctx
    }

    fn command() -> CreateProductCommand {
        CreateProductCommand {
            supplier_id: SupplierId::from("S1"),
            form: form(),
        }
    }

    #[tokio::test]
    async fn appends_store_returned_entity() {
        let mut store = MockEntityStore::new();
        store
            .expect_create_product()
            .withf(|p| p.name == "Gadget" && p.quantity == 3 && p.dose.is_none())
            .times(1)
            .returning(|_| Ok(Some(gadget())));
        let ctx = context(store).await;

        let created = command().execute(&ctx).await.unwrap();

        assert_eq!(created.id, ProductId::from("P2"));
        let mirror = ctx.mirror.read().await;
        assert_eq!(mirror.products(&SupplierId::from("S1")), &[gadget()]);
    }

    #[tokio::test]
    async fn invalid_form_sends_nothing() {
        let mut store = MockEntityStore::new();
        store.expect_create_product().times(0);
        let ctx = context(store).await;

        let mut cmd = command();
        cmd.form.quantity = "three".into();

        assert_matches!(cmd.execute(&ctx).await, Err(ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_supplier_is_a_caller_error() {
        let mut store = MockEntityStore::new();
        store.expect_create_product().times(0);
        let ctx = context(store).await;

        let cmd = CreateProductCommand {
            supplier_id: SupplierId::from(""),
            form: form(),
        };
        assert_matches!(
            cmd.execute(&ctx).await,
            Err(ServiceError::UnknownSupplier(_))
        );
    }

    #[tokio::test]
    async fn empty_result_leaves_mirror_alone() {
        let mut store = MockEntityStore::new();
        store.expect_create_product().returning(|_| Ok(None));
        let ctx = context(store).await;

        assert_matches!(
            command().execute(&ctx).await,
            Err(ServiceError::EmptyResult("product.create"))
        );
        assert_eq!(ctx.mirror.read().await.product_count(), 0);
    }

    #[tokio::test]
    async fn store_failure_leaves_mirror_alone() {
        let mut store = MockEntityStore::new();
        store
            .expect_create_product()
            .returning(|_| Err(StoreError::Transport("connection reset".into())));
        let ctx = context(store).await;

        assert_matches!(command().execute(&ctx).await, Err(ServiceError::Store(_)));
        assert_eq!(ctx.mirror.read().await.product_count(), 0);
    }
}
