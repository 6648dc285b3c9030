use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    commands::{Command, SyncContext},
    errors::ServiceError,
    events::Event,
    models::{FieldValue, Product, ProductField, ProductId, ProductPatch},
};

/// Changes one attribute of one product.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateProductCommand {
    pub product_id: ProductId,
    pub field: ProductField,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UpdateOutcome {
    /// The value matched the last known one; nothing was sent.
    Unchanged,
    Updated(Product),
}

#[async_trait]
impl Command for UpdateProductCommand {
    type Result = UpdateOutcome;

    #[instrument(skip(self, ctx), fields(product_id = %self.product_id, field = %self.field))]
    async fn execute(&self, ctx: &SyncContext) -> Result<Self::Result, ServiceError> {
        let value = self.field.coerce(self.value.clone())?;

        let current = ctx
            .mirror
            .read()
            .await
            .find(&self.product_id)
            .map(|product| product.field_value(self.field))
            .ok_or_else(|| ServiceError::UnknownProduct(self.product_id.clone()))?;

        if self.field.comparable(current) == self.field.comparable(value.clone()) {
            debug!("value unchanged, skipping update");
            return Ok(UpdateOutcome::Unchanged);
        }

        // Held until the mirror has been reconciled.
        let permit = ctx.edit_session.try_begin()?;

        let patch = ProductPatch {
            id: self.product_id.clone(),
            field: self.field,
            value,
        };
        let updated = ctx
            .store
            .update_product(patch)
            .await
            .map_err(|e| {
                error!("Failed to update product: {}", e);
                ServiceError::Store(e)
            })?
            .ok_or(ServiceError::EmptyResult("product.update"))?;

        if ctx.mirror.write().await.replace(updated.clone()).is_none() {
            warn!(
                supplier_id = %updated.supplier_id,
                "updated product is not in its supplier's slice"
            );
        }
        drop(permit);
        info!("Product updated");

        ctx.emit(Event::ProductUpdated {
            product_id: updated.id.clone(),
            field: self.field,
        });

        Ok(UpdateOutcome::Updated(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::models::SupplierId;
    use crate::store::MockEntityStore;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn widget(quantity: i64) -> Product {
        Product {
            id: ProductId::from("P1"),
            supplier_id: SupplierId::from("S1"),
            name: "Widget".into(),
            dose: None,
            quantity,
            expiration: "2025-01-01".into(),
            cost: 1.0,
            retail: 2.0,
            num_sold: Some(0),
            notes: None,
        }
    }

    async fn context(store: MockEntityStore) -> SyncContext {
        let ctx = SyncContext::new(Arc::new(store), None);
        ctx.mirror
            .write()
            .await
            .replace_supplier(SupplierId::from("S1"), vec![widget(5)]);
        ctx
    }

    fn set_quantity(quantity: i64) -> UpdateProductCommand {
        UpdateProductCommand {
            product_id: ProductId::from("P1"),
            field: ProductField::Quantity,
            value: FieldValue::Integer(quantity),
        }
    }

    #[tokio::test]
    async fn replaces_entry_with_store_result() {
        let mut store = MockEntityStore::new();
        store
            .expect_update_product()
            .withf(|patch| {
                patch.id == ProductId::from("P1")
                    && patch.field == ProductField::Quantity
                    && patch.value == FieldValue::Integer(9)
            })
            .times(1)
            .returning(|_| Ok(Some(widget(9))));
        let ctx = context(store).await;

        let outcome = set_quantity(9).execute(&ctx).await.unwrap();

        assert_eq!(outcome, UpdateOutcome::Updated(widget(9)));
        assert_eq!(
            ctx.mirror.read().await.products(&SupplierId::from("S1")),
            &[widget(9)]
        );
        assert!(!ctx.edit_session.is_active());
    }

    #[tokio::test]
    async fn equal_value_sends_no_request() {
        let mut store = MockEntityStore::new();
        store.expect_update_product().times(0);
        let ctx = context(store).await;

        let outcome = set_quantity(5).execute(&ctx).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Unchanged);
    }

    #[tokio::test]
    async fn stored_name_with_padding_matches_trimmed_input() {
        let mut store = MockEntityStore::new();
        store.expect_update_product().times(0);
        let ctx = SyncContext::new(Arc::new(store), None);
        let padded = Product {
            name: "Widget ".into(),
            ..widget(5)
        };
        ctx.mirror
            .write()
            .await
            .replace_supplier(SupplierId::from("S1"), vec![padded]);

        let value = ProductField::Name.parse_input(" Widget").unwrap();
        let cmd = UpdateProductCommand {
            product_id: ProductId::from("P1"),
            field: ProductField::Name,
            value,
        };
        assert_eq!(cmd.execute(&ctx).await.unwrap(), UpdateOutcome::Unchanged);
    }

    #[tokio::test]
    async fn refused_while_another_edit_is_in_flight() {
        let mut store = MockEntityStore::new();
        store.expect_update_product().times(0);
        let ctx = context(store).await;

        let _held = ctx.edit_session.try_begin().unwrap();
        assert_matches!(
            set_quantity(9).execute(&ctx).await,
            Err(ServiceError::EditInProgress)
        );
    }

    #[tokio::test]
    async fn failure_keeps_mirror_and_releases_session() {
        let mut store = MockEntityStore::new();
        store
            .expect_update_product()
            .returning(|_| Err(StoreError::Rejected(vec!["conditional check failed".into()])));
        let ctx = context(store).await;

        assert_matches!(set_quantity(9).execute(&ctx).await, Err(ServiceError::Store(_)));
        assert_eq!(
            ctx.mirror.read().await.products(&SupplierId::from("S1")),
            &[widget(5)]
        );
        assert!(!ctx.edit_session.is_active());
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let store = MockEntityStore::new();
        let ctx = context(store).await;
        let cmd = UpdateProductCommand {
            product_id: ProductId::from("P404"),
            ..set_quantity(1)
        };
        assert_matches!(
            cmd.execute(&ctx).await,
            Err(ServiceError::UnknownProduct(_))
        );
    }
}
