//! Client-side mirror of store state, keyed by supplier.
//!
//! The mirror is a cache. Every mutation here is driven by an entity the store
//! already returned; nothing is written speculatively.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Product, ProductId, Supplier, SupplierId};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mirror {
    suppliers: Vec<Supplier>,
    products: BTreeMap<SupplierId, Vec<Product>>,
}

impl Mirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppliers(&self) -> &[Supplier] {
        &self.suppliers
    }

    pub fn supplier(&self, id: &SupplierId) -> Option<&Supplier> {
        self.suppliers.iter().find(|s| &s.id == id)
    }

    pub fn has_supplier(&self, id: &SupplierId) -> bool {
        self.supplier(id).is_some()
    }

    /// Replaces the supplier list and drops slices of suppliers that are gone.
    pub fn set_suppliers(&mut self, suppliers: Vec<Supplier>) {
        self.products
            .retain(|id, _| suppliers.iter().any(|s| &s.id == id));
        self.suppliers = suppliers;
    }

    /// Products of one supplier in store order; empty when not loaded.
    pub fn products(&self, supplier_id: &SupplierId) -> &[Product] {
        self.products
            .get(supplier_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_loaded(&self, supplier_id: &SupplierId) -> bool {
        self.products.contains_key(supplier_id)
    }

    /// Sets `mirror[supplier_id]` to a freshly listed slice.
    ///
    /// Entries owned by another supplier are dropped and counted.
    pub fn replace_supplier(&mut self, supplier_id: SupplierId, products: Vec<Product>) -> usize {
        let before = products.len();
        let kept: Vec<Product> = products
            .into_iter()
            .filter(|p| p.supplier_id == supplier_id)
            .collect();
        let dropped = before - kept.len();
        self.products.insert(supplier_id, kept);
        dropped
    }

    /// Appends a created product to the end of its supplier's slice.
    ///
    /// A product whose id is already present replaces that entry instead, so
    /// an id never appears twice.
    pub fn append(&mut self, product: Product) {
        let slice = self
            .products
            .entry(product.supplier_id.clone())
            .or_default();
        match slice.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => slice.push(product),
        }
    }

    /// Replaces the entry with the same id in its supplier's slice, keeping
    /// its position. Returns the index, or `None` when nothing matched.
    pub fn replace(&mut self, product: Product) -> Option<usize> {
        let slice = self.products.get_mut(&product.supplier_id)?;
        let index = slice.iter().position(|p| p.id == product.id)?;
        slice[index] = product;
        Some(index)
    }

    pub fn remove(&mut self, supplier_id: &SupplierId, product_id: &ProductId) -> Option<Product> {
        let slice = self.products.get_mut(supplier_id)?;
        let index = slice.iter().position(|p| &p.id == product_id)?;
        Some(slice.remove(index))
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&Product> {
        self.products
            .values()
            .flat_map(|slice| slice.iter())
            .find(|p| &p.id == product_id)
    }

    pub fn product_count(&self) -> usize {
        self.products.values().map(Vec::len).sum()
    }

    /// Every product under key K has `supplier_id == K`.
    pub fn is_consistent(&self) -> bool {
        self.products
            .iter()
            .all(|(id, slice)| slice.iter().all(|p| &p.supplier_id == id))
    }
}
