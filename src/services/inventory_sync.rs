use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    commands::{
        products::{
            BatchDeleteReport, CreateProductCommand, DeleteProductsCommand, UpdateOutcome,
            UpdateProductCommand,
        },
        suppliers::{HydrationReport, LoadInventoryCommand},
        Command, SyncContext,
    },
    errors::ServiceError,
    events::EventSender,
    mirror::Mirror,
    models::{AddProductForm, FieldValue, Product, ProductField, ProductId, Supplier, SupplierId},
    store::EntityStore,
};

/// Keeps the local mirror consistent with the hosted store.
///
/// Every mutation goes to the store first; the mirror is patched only from
/// the entity the store returns.
#[derive(Clone)]
pub struct InventorySyncService {
    ctx: SyncContext,
}

impl InventorySyncService {
    pub fn new(store: Arc<dyn EntityStore>, event_sender: Option<EventSender>) -> Self {
        Self {
            ctx: SyncContext::new(store, event_sender),
        }
    }

    /// True while a field update is waiting on the store.
    pub fn is_editing(&self) -> bool {
        self.ctx.edit_session.is_active()
    }

    /// Point-in-time copy of the mirror.
    pub async fn snapshot(&self) -> Mirror {
        self.ctx.mirror.read().await.clone()
    }

    pub async fn suppliers(&self) -> Vec<Supplier> {
        self.ctx.mirror.read().await.suppliers().to_vec()
    }

    pub async fn products(&self, supplier_id: &SupplierId) -> Vec<Product> {
        self.ctx.mirror.read().await.products(supplier_id).to_vec()
    }

    pub async fn find_product(&self, product_id: &ProductId) -> Option<Product> {
        self.ctx.mirror.read().await.find(product_id).cloned()
    }

    /// Loads suppliers, then every supplier's products concurrently.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) -> Result<HydrationReport, ServiceError> {
        let report = LoadInventoryCommand.execute(&self.ctx).await?;
        info!(
            suppliers = report.suppliers,
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Inventory hydrated"
        );
        Ok(report)
    }

    #[instrument(skip(self, form), fields(supplier_id = %supplier_id))]
    pub async fn create_product(
        &self,
        supplier_id: SupplierId,
        form: AddProductForm,
    ) -> Result<Product, ServiceError> {
        CreateProductCommand { supplier_id, form }
            .execute(&self.ctx)
            .await
    }

    /// Sends a single-field patch, unless the value equals the mirrored one.
    #[instrument(skip(self, value), fields(product_id = %product_id, field = %field))]
    pub async fn update_field(
        &self,
        product_id: ProductId,
        field: ProductField,
        value: FieldValue,
    ) -> Result<UpdateOutcome, ServiceError> {
        UpdateProductCommand {
            product_id,
            field,
            value,
        }
        .execute(&self.ctx)
        .await
    }

    /// Same as [`update_field`](Self::update_field), starting from raw input text.
    pub async fn update_field_from_input(
        &self,
        product_id: ProductId,
        field: ProductField,
        raw: &str,
    ) -> Result<UpdateOutcome, ServiceError> {
        let value = field.parse_input(raw)?;
        self.update_field(product_id, field, value).await
    }

    #[instrument(skip(self, batch))]
    pub async fn delete_products(
        &self,
        batch: Vec<(SupplierId, Vec<ProductId>)>,
    ) -> Result<BatchDeleteReport, ServiceError> {
        DeleteProductsCommand { batch }.execute(&self.ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use crate::store::MockEntityStore;
    use assert_matches::assert_matches;

    fn widget(quantity: i64) -> Product {
        Product {
            id: ProductId::from("P1"),
            supplier_id: SupplierId::from("S1"),
            name: "Widget".into(),
            dose: Some(5),
            quantity,
            expiration: "2025-01-01".into(),
            cost: 1.0,
            retail: 2.0,
            num_sold: Some(0),
            notes: None,
        }
    }

    fn hydrating_store() -> MockEntityStore {
        let mut store = MockEntityStore::new();
        store
            .expect_list_suppliers()
            .returning(|| Ok(vec![Supplier::new("S1", "Acme")]));
        store
            .expect_list_products()
            .returning(|_| Ok(vec![widget(5)]));
        store
    }

    #[tokio::test]
    async fn non_numeric_input_never_reaches_the_store() {
        let mut store = hydrating_store();
        store.expect_update_product().times(0);
        let service = InventorySyncService::new(Arc::new(store), None);
        service.hydrate().await.unwrap();

        let result = service
            .update_field_from_input(ProductId::from("P1"), ProductField::Quantity, "lots")
            .await;

        assert_matches!(result, Err(ServiceError::Validation(_)));
        assert_eq!(service.products(&SupplierId::from("S1")).await, vec![widget(5)]);
    }

    #[tokio::test]
    async fn input_equal_to_mirror_is_unchanged() {
        let mut store = hydrating_store();
        store.expect_update_product().times(0);
        let service = InventorySyncService::new(Arc::new(store), None);
        service.hydrate().await.unwrap();

        let outcome = service
            .update_field_from_input(ProductId::from("P1"), ProductField::Quantity, " 5 ")
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Unchanged);
    }

    #[tokio::test]
    async fn confirmed_mutations_are_published() {
        let mut store = hydrating_store();
        store
            .expect_update_product()
            .times(1)
            .returning(|_| Ok(Some(widget(7))));
        let (sender, mut rx) = EventSender::channel(8);
        let service = InventorySyncService::new(Arc::new(store), Some(sender));

        service.hydrate().await.unwrap();
        service
            .update_field(ProductId::from("P1"), ProductField::Quantity, FieldValue::Integer(7))
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(Event::Hydrated {
                suppliers: 1,
                loaded: 1,
                failed: 0
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(Event::ProductUpdated {
                product_id: ProductId::from("P1"),
                field: ProductField::Quantity,
            })
        );
        assert_eq!(
            service.find_product(&ProductId::from("P1")).await,
            Some(widget(7))
        );
    }

    #[tokio::test]
    async fn full_event_channel_does_not_hold_the_edit_session() {
        let mut store = hydrating_store();
        store
            .expect_update_product()
            .times(2)
            .returning(|patch| match patch.value {
                FieldValue::Integer(quantity) => Ok(Some(widget(quantity))),
                _ => Ok(None),
            });
        // One slot, never drained: the hydration event fills it.
        let (sender, _rx) = EventSender::channel(1);
        let service = InventorySyncService::new(Arc::new(store), Some(sender));
        service.hydrate().await.unwrap();

        let first = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            service.update_field(ProductId::from("P1"), ProductField::Quantity, FieldValue::Integer(9)),
        )
        .await
        .expect("update waited on the event channel")
        .unwrap();
        assert_eq!(first, UpdateOutcome::Updated(widget(9)));
        assert!(!service.is_editing());

        let second = service
            .update_field(ProductId::from("P1"), ProductField::Quantity, FieldValue::Integer(10))
            .await
            .unwrap();
        assert_eq!(second, UpdateOutcome::Updated(widget(10)));
    }

    #[tokio::test]
    async fn dropped_event_receiver_does_not_fail_operations() {
        let store = hydrating_store();
        let (sender, rx) = EventSender::channel(1);
        drop(rx);
        let service = InventorySyncService::new(Arc::new(store), Some(sender));

        let report = service.hydrate().await.unwrap();
        assert!(report.is_complete());
        assert_eq!(service.snapshot().await.product_count(), 1);
    }
}
