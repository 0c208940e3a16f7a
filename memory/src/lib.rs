// The maira-memory crate provides the persistent document-memory store:
// - Memory record data structure (matches the on-disk JSON shape)
// - Store with load/append/persist/reset operations
// - Injected persistence backend (file-backed or in-memory)

pub mod backend;
pub mod errors;
mod record;
mod store;

pub use backend::{FileBackend, InMemoryBackend, MemoryBackend, MemoryBackendRef};
pub use errors::MemoryError;
pub use record::MemoryRecord;
pub use store::MemoryStore;
