pub mod cache_store;
pub mod file_cache_store;
pub mod memory_cache_store;
pub mod postgres_cache_store;

pub use cache_store::{CacheEntry, CacheError, CacheStats, CacheStore, ClearReport};
pub use file_cache_store::FileCacheStore;
pub use memory_cache_store::MemoryCacheStore;
pub use postgres_cache_store::PostgresCacheStore;
