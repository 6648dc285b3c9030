use serde::Serialize;

use crate::{
    mirror::Mirror,
    models::{Product, Supplier},
    selection::Selection,
};

/// One supplier's block in the inventory table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierCard {
    pub supplier: Supplier,
    pub products: Vec<SupplierRow>,
    pub selected_count: usize,
    /// Delete is only offered once something in this card is selected.
    pub can_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierRow {
    pub product: Product,
    pub selected: bool,
}

/// Builds the cards in supplier order.
pub fn build_cards(mirror: &Mirror, selection: &Selection) -> Vec<SupplierCard> {
    mirror
        .suppliers()
        .iter()
        .map(|supplier| {
            let products: Vec<SupplierRow> = mirror
                .products(&supplier.id)
                .iter()
                .map(|product| SupplierRow {
                    selected: selection.is_selected(&supplier.id, &product.id),
                    product: product.clone(),
                })
                .collect();
            let selected_count = products.iter().filter(|row| row.selected).count();
            SupplierCard {
                supplier: supplier.clone(),
                products,
                selected_count,
                can_delete: selected_count > 0,
            }
        })
        .collect()
}
