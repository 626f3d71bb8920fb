// 缓存模块
// 本地键值存储以及已脱敏用户的读写

pub mod keys;
pub mod operations;
pub mod store;

pub use operations::SessionCacheOperations;
pub use store::{
    FileStore, KeyValueStore, MemoryStore, RedisStore, StorageNotice, watch_storage_events,
};
