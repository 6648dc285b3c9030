//! Row selection for the product tables.
//!
//! Selection is local state only. Suppliers keep the order in which they were
//! first selected and products keep click order. A batch delete walks it in
//! that order.

use crate::models::{ProductId, SupplierId};

/// Where inside a row a click landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The row itself, or a non-interactive cell.
    Row,
    /// A nested input control.
    Input,
    /// A nested multi-line text control.
    TextArea,
}

impl ClickTarget {
    pub fn toggles_selection(&self) -> bool {
        matches!(self, ClickTarget::Row)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Never holds an empty product list.
    by_supplier: Vec<(SupplierId, Vec<ProductId>)>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, supplier_id: &SupplierId) -> Option<usize> {
        self.by_supplier.iter().position(|(id, _)| id == supplier_id)
    }

    /// Flips one product's membership. Returns whether it is now selected.
    pub fn toggle(&mut self, supplier_id: &SupplierId, product_id: &ProductId) -> bool {
        let slot = match self.position(supplier_id) {
            Some(slot) => slot,
            None => {
                self.by_supplier.push((supplier_id.clone(), Vec::new()));
                self.by_supplier.len() - 1
            }
        };
        let ids = &mut self.by_supplier[slot].1;
        let selected = match ids.iter().position(|id| id == product_id) {
            Some(index) => {
                ids.remove(index);
                false
            }
            None => {
                ids.push(product_id.clone());
                true
            }
        };
        if ids.is_empty() {
            self.by_supplier.remove(slot);
        }
        selected
    }

    /// Row click handler. Clicks on nested controls leave selection alone and
    /// return `None`.
    pub fn click(
        &mut self,
        supplier_id: &SupplierId,
        product_id: &ProductId,
        target: ClickTarget,
    ) -> Option<bool> {
        if !target.toggles_selection() {
            return None;
        }
        Some(self.toggle(supplier_id, product_id))
    }

    pub fn is_selected(&self, supplier_id: &SupplierId, product_id: &ProductId) -> bool {
        self.selected(supplier_id).contains(product_id)
    }

    pub fn selected(&self, supplier_id: &SupplierId) -> &[ProductId] {
        self.position(supplier_id)
            .map(|slot| self.by_supplier[slot].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn count(&self, supplier_id: &SupplierId) -> usize {
        self.selected(supplier_id).len()
    }

    pub fn total(&self) -> usize {
        self.by_supplier.iter().map(|(_, ids)| ids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_supplier.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_supplier.clear();
    }

    pub fn clear_supplier(&mut self, supplier_id: &SupplierId) {
        self.by_supplier.retain(|(id, _)| id != supplier_id);
    }

    /// Forgets products that no longer exist.
    pub fn prune<'a, I>(&mut self, removed: I)
    where
        I: IntoIterator<Item = &'a (SupplierId, ProductId)>,
    {
        for (supplier_id, product_id) in removed {
            if self.is_selected(supplier_id, product_id) {
                self.toggle(supplier_id, product_id);
            }
        }
    }

    /// Snapshot in delete order.
    pub fn batch(&self) -> Vec<(SupplierId, Vec<ProductId>)> {
        self.by_supplier.clone()
    }
}
