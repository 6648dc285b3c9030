// In-memory entity store with failure injection

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedRwLockWriteGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::{EntityStore, ProductFilter};
use crate::errors::StoreError;
use crate::models::{
    FieldValue, NewProduct, Product, ProductField, ProductId, ProductPatch, Supplier, SupplierId,
};

/// One request as seen by the store, used for the call log and for faults.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListSuppliers,
    ListProducts(SupplierId),
    Create(SupplierId),
    Update(ProductId),
    Delete(ProductId),
}

/// What an injected fault does to a matching request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail the request.
    Fail,
    /// Succeed but return no entity.
    Empty,
}

#[derive(Debug, Default)]
struct StoreState {
    suppliers: Vec<Supplier>,
    products: Vec<Product>,
    faults: HashMap<StoreOp, Fault>,
    calls: Vec<StoreOp>,
}

/// Entity store kept in process memory.
///
/// Ids are minted with UUIDv4 like the hosted service does. Every request is
/// appended to a call log, and faults can be injected per request.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    release: Arc<RwLock<()>>,
}

/// Holds every store request until dropped.
pub struct StoreHold {
    _guard: OwnedRwLockWriteGuard<()>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_supplier(&self, supplier: Supplier) {
        self.state.lock().await.suppliers.push(supplier);
    }

    /// Seeds a product as if it already existed in the store.
    pub async fn add_product(&self, product: Product) {
        self.state.lock().await.products.push(product);
    }

    pub async fn products(&self) -> Vec<Product> {
        self.state.lock().await.products.clone()
    }

    pub async fn inject(&self, op: StoreOp, fault: Fault) {
        self.state.lock().await.faults.insert(op, fault);
    }

    /// Requests received so far, in arrival order.
    pub async fn calls(&self) -> Vec<StoreOp> {
        self.state.lock().await.calls.clone()
    }

    /// Blocks every request until the returned hold is dropped.
    pub async fn hold(&self) -> StoreHold {
        StoreHold {
            _guard: self.release.clone().write_owned().await,
        }
    }

    async fn begin(&self, op: StoreOp) -> Result<Option<Fault>, StoreError> {
        drop(self.release.read().await);
        let mut state = self.state.lock().await;
        debug!(?op, "in-memory store request");
        state.calls.push(op.clone());
        match state.faults.get(&op) {
            Some(Fault::Fail) => Err(StoreError::Injected(format!("{:?}", op))),
            other => Ok(other.copied()),
        }
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn list_suppliers(&self) -> Result<Vec<Supplier>, StoreError> {
        if self.begin(StoreOp::ListSuppliers).await? == Some(Fault::Empty) {
            return Ok(Vec::new());
        }
        Ok(self.state.lock().await.suppliers.clone())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError> {
        let supplier_id = filter
            .supplier_id
            .as_ref()
            .map(|f| f.eq.clone())
            .unwrap_or_else(|| SupplierId::new(""));
        if self.begin(StoreOp::ListProducts(supplier_id)).await? == Some(Fault::Empty) {
            return Ok(Vec::new());
        }
        let state = self.state.lock().await;
        Ok(state
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Option<Product>, StoreError> {
        let fault = self
            .begin(StoreOp::Create(product.supplier_id.clone()))
            .await?;
        let mut state = self.state.lock().await;
        if !state.suppliers.iter().any(|s| s.id == product.supplier_id) {
            return Err(StoreError::Rejected(vec![format!(
                "supplier {} does not exist",
                product.supplier_id
            )]));
        }
        let created = Product {
            id: ProductId::new(Uuid::new_v4().to_string()),
            supplier_id: product.supplier_id,
            name: product.name,
            dose: product.dose,
            quantity: product.quantity,
            expiration: product.expiration,
            cost: product.cost,
            retail: product.retail,
            num_sold: Some(0),
            notes: None,
        };
        state.products.push(created.clone());
        if fault == Some(Fault::Empty) {
            return Ok(None);
        }
        Ok(Some(created))
    }

    async fn update_product(&self, patch: ProductPatch) -> Result<Option<Product>, StoreError> {
        let fault = self.begin(StoreOp::Update(patch.id.clone())).await?;
        let mut state = self.state.lock().await;
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == patch.id)
            .ok_or_else(|| StoreError::Rejected(vec![format!("product {} not found", patch.id)]))?;
        apply_patch(product, &patch)?;
        if fault == Some(Fault::Empty) {
            return Ok(None);
        }
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        self.begin(StoreOp::Delete(id.clone())).await?;
        let mut state = self.state.lock().await;
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before {
            return Err(StoreError::Rejected(vec![format!("product {} not found", id)]));
        }
        Ok(())
    }
}

fn apply_patch(product: &mut Product, patch: &ProductPatch) -> Result<(), StoreError> {
    let mismatch = || {
        StoreError::Rejected(vec![format!(
            "invalid value {} for {}",
            patch.value, patch.field
        )])
    };
    match (patch.field, &patch.value) {
        (ProductField::Name, FieldValue::Text(v)) => product.name = v.clone(),
        (ProductField::Dose, FieldValue::Integer(v)) => product.dose = Some(*v),
        (ProductField::Dose, FieldValue::Null) => product.dose = None,
        (ProductField::Quantity, FieldValue::Integer(v)) => product.quantity = *v,
        (ProductField::Expiration, FieldValue::Text(v)) => product.expiration = v.clone(),
        (ProductField::Cost, FieldValue::Decimal(v)) => product.cost = *v,
        (ProductField::Retail, FieldValue::Decimal(v)) => product.retail = *v,
        (ProductField::NumSold, FieldValue::Integer(v)) => product.num_sold = Some(*v),
        (ProductField::NumSold, FieldValue::Null) => product.num_sold = None,
        (ProductField::Notes, FieldValue::Text(v)) => product.notes = Some(v.clone()),
        (ProductField::Notes, FieldValue::Null) => product.notes = None,
        _ => return Err(mismatch()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn new_product(supplier: &str, name: &str) -> NewProduct {
        NewProduct {
            supplier_id: SupplierId::from(supplier),
            name: name.into(),
            dose: None,
            quantity: 1,
            expiration: "2025-01-01".into(),
            cost: 1.0,
            retail: 2.0,
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_default_num_sold() {
        let store = InMemoryStore::new();
        store.add_supplier(Supplier::new("S1", "Acme")).await;

        let created = store
            .create_product(new_product("S1", "Gadget"))
            .await
            .unwrap()
            .unwrap();

        assert!(!created.id.as_str().is_empty());
        assert_eq!(created.num_sold, Some(0));
        assert_eq!(store.products().await, vec![created]);
    }

    #[tokio::test]
    async fn create_rejects_unknown_supplier() {
        let store = InMemoryStore::new();
        assert_matches!(
            store.create_product(new_product("S9", "Gadget")).await,
            Err(StoreError::Rejected(_))
        );
    }

    #[tokio::test]
    async fn list_filters_by_supplier() {
        let store = InMemoryStore::new();
        store.add_supplier(Supplier::new("S1", "Acme")).await;
        store.add_supplier(Supplier::new("S2", "Globex")).await;
        store.create_product(new_product("S1", "A")).await.unwrap();
        store.create_product(new_product("S2", "B")).await.unwrap();

        let listed = store
            .list_products(ProductFilter::by_supplier(SupplierId::from("S2")))
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "B");
    }

    #[tokio::test]
    async fn injected_fault_fails_and_is_logged() {
        let store = InMemoryStore::new();
        store
            .inject(StoreOp::Delete(ProductId::from("P1")), Fault::Fail)
            .await;

        assert_matches!(
            store.delete_product(ProductId::from("P1")).await,
            Err(StoreError::Injected(_))
        );
        assert_eq!(
            store.calls().await,
            vec![StoreOp::Delete(ProductId::from("P1"))]
        );
    }

    #[tokio::test]
    async fn update_rejects_mismatched_value() {
        let store = InMemoryStore::new();
        store.add_supplier(Supplier::new("S1", "Acme")).await;
        let created = store
            .create_product(new_product("S1", "A"))
            .await
            .unwrap()
            .unwrap();

        let patch = ProductPatch {
            id: created.id,
            field: ProductField::Quantity,
            value: FieldValue::Text("many".into()),
        };
        assert_matches!(
            store.update_product(patch).await,
            Err(StoreError::Rejected(_))
        );
    }
}
