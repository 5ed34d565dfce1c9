// Implementations of the confession and comment stores.

pub mod in_memory;
pub mod sqlite_store;

pub use in_memory::InMemoryConfessionStore;
pub use sqlite_store::SqliteConfessionStore;
