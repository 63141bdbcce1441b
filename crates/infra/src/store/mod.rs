//! In-memory storage: versioned repositories, the inventory store and
//! per-record locks.

pub mod inventory;
pub mod locks;
pub mod repository;

pub use inventory::InventoryStore;
pub use locks::LockTable;
pub use repository::Repository;
