mod json_store;
mod memory_store;
mod interface;

pub use interface::{KeyValueStore, Result, BackendError};
pub use json_store::JsonFileStore;
pub use memory_store::MemoryStore;
