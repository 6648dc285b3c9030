#![allow(dead_code)]

use std::sync::Arc;

use hazmo_inventory::{
    models::{Product, ProductId, Supplier, SupplierId},
    store::InMemoryStore,
    InventorySyncService,
};

pub fn product(id: &str, supplier: &str, quantity: i64) -> Product {
    Product {
        id: ProductId::from(id),
        supplier_id: SupplierId::from(supplier),
        name: format!("item-{}", id),
        dose: None,
        quantity,
        expiration: "2025-01-01".into(),
        cost: 1.0,
        retail: 2.0,
        num_sold: Some(0),
        notes: None,
    }
}

pub fn sid(id: &str) -> SupplierId {
    SupplierId::from(id)
}

pub fn pid(id: &str) -> ProductId {
    ProductId::from(id)
}

/// Two suppliers: S1 with P1 (quantity 5), S2 with P2 and P3.
pub async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.add_supplier(Supplier::new("S1", "Acme")).await;
    store.add_supplier(Supplier::new("S2", "Globex")).await;
    store.add_product(product("P1", "S1", 5)).await;
    store.add_product(product("P2", "S2", 1)).await;
    store.add_product(product("P3", "S2", 2)).await;
    store
}

/// A service over `store` that has already hydrated.
pub async fn hydrated_service(store: &InMemoryStore) -> InventorySyncService {
    let service = InventorySyncService::new(Arc::new(store.clone()), None);
    service
        .hydrate()
        .await
        .expect("hydration against the in-memory store");
    service
}
