pub mod load_inventory_command;

pub use load_inventory_command::{HydrationReport, LoadInventoryCommand};
