pub mod create_product_command;
pub mod delete_products_command;
pub mod update_product_command;

pub use create_product_command::CreateProductCommand;
pub use delete_products_command::{BatchDeleteFailure, BatchDeleteReport, DeleteProductsCommand};
pub use update_product_command::{UpdateOutcome, UpdateProductCommand};
