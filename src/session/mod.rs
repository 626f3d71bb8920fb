//! 会话缓存协调
//!
//! 页面挂载时向后端确认会话，成功则缓存脱敏后的用户，被拒绝则清除缓存，
//! 网络失败则沿用缓存；同进程内通过广播通知其它组件重新读取缓存。

mod patch;
mod reconciler;
mod route;
mod view;

use std::sync::Arc;

use uuid::Uuid;

pub use reconciler::{AuthState, BootstrapOutcome, SessionReconciler, Visibility};
pub use route::Route;
pub use view::SessionView;

use crate::cache::{FileStore, KeyValueStore, MemoryStore, RedisStore};
use crate::config::{Config, StoreKind};
use crate::error::ClientResult;

/// 按配置打开的存储；Redis 模式下附带客户端，用于订阅其它进程的变更
pub struct OpenedStore {
    pub store: Arc<dyn KeyValueStore>,
    pub redis: Option<redis::Client>,
}

pub fn open_store(config: &Config, origin: Uuid) -> ClientResult<OpenedStore> {
    Ok(match &config.store {
        StoreKind::Memory => OpenedStore {
            store: Arc::new(MemoryStore::new()),
            redis: None,
        },
        StoreKind::File(path) => OpenedStore {
            store: Arc::new(FileStore::new(path.clone())),
            redis: None,
        },
        StoreKind::Redis(url) => {
            let store = RedisStore::open(url, origin)?;
            let client = store.client().clone();
            OpenedStore {
                store: Arc::new(store),
                redis: Some(client),
            }
        }
    })
}
