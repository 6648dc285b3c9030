// Entity models mirrored from the remote store
pub mod product;
pub mod suppliers;

pub use product::{
    AddProductForm, FieldValue, NewProduct, Product, ProductField, ProductId, ProductPatch,
};
pub use suppliers::{Supplier, SupplierId};
