// Mirror synchronisation against the hosted store
pub mod inventory_sync;

pub use inventory_sync::InventorySyncService;
