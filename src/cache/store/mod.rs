/// 本地键值存储
/// 相当于浏览器的 localStorage：单一可变槽位，后写者胜
mod file;
mod memory;
mod shared;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use shared::{RedisStore, StorageNotice, StorageOp, watch_storage_events};

use crate::error::ClientResult;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;
}
