//! Checkpoint store adapters.
//!
//! - `FileCheckpointStore` - one JSON file per pending redirect
//! - `InMemoryCheckpointStore` - for tests and ephemeral sessions

mod file_store;
mod in_memory;

pub use file_store::FileCheckpointStore;
pub use in_memory::InMemoryCheckpointStore;
