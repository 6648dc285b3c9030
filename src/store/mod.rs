//! Boundary to the hosted entity store.
//!
//! The store owns persistence, filtering and authorization. The client only
//! issues list/create/update/delete requests and trusts what comes back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::models::{NewProduct, Product, ProductId, ProductPatch, Supplier, SupplierId};

pub mod http;
pub mod memory;

pub use http::HttpStore;
pub use memory::{Fault, InMemoryStore, StoreOp};

/// Remote list/create/update/delete over the `supplier` and `product` collections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Every supplier, unfiltered.
    async fn list_suppliers(&self) -> Result<Vec<Supplier>, StoreError>;

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError>;

    /// Returns the created entity with its store-assigned id, if the store sent one back.
    async fn create_product(&self, product: NewProduct) -> Result<Option<Product>, StoreError>;

    /// Returns the full updated entity, if the store sent one back.
    async fn update_product(&self, patch: ProductPatch) -> Result<Option<Product>, StoreError>;

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError>;
}

/// Equality predicate, serialised as `{ "eq": value }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqFilter<T> {
    pub eq: T,
}

/// Product list filter, serialised as `{ "supplierId": { "eq": "<id>" } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<EqFilter<SupplierId>>,
}

impl ProductFilter {
    pub fn by_supplier(supplier_id: SupplierId) -> Self {
        Self {
            supplier_id: Some(EqFilter { eq: supplier_id }),
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.supplier_id
            .as_ref()
            .map_or(true, |filter| filter.eq == product.supplier_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplier_filter_wire_shape() {
        let filter = ProductFilter::by_supplier(SupplierId::from("S1"));
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            serde_json::json!({ "supplierId": { "eq": "S1" } })
        );
        assert_eq!(
            serde_json::to_value(ProductFilter::default()).unwrap(),
            serde_json::json!({})
        );
    }
}
