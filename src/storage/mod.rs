pub mod kv;
pub mod local_cache;

pub use kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use local_cache::LocalCache;
