use serde_json::Value;
use tracing::warn;

use crate::cache::store::KeyValueStore;
use crate::error::ClientResult;
use crate::models::CachedSession;

/// 已脱敏用户的缓存操作
pub struct SessionCacheOperations;

impl SessionCacheOperations {
    /// 读取缓存的用户，损坏的条目视为不存在
    pub fn load(store: &dyn KeyValueStore, key: &str) -> ClientResult<Option<CachedSession>> {
        let Some(raw) = store.get(key)? else {
            return Ok(None);
        };
        match CachedSession::from_json(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("Failed to parse cached user under {:?}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// 缓存用户，写入前总是再脱敏一次
    pub fn save(store: &dyn KeyValueStore, key: &str, session: &CachedSession) -> ClientResult<()> {
        store.set(key, &session.to_json()?)
    }

    /// 直接缓存后端返回的用户 JSON
    pub fn save_raw(
        store: &dyn KeyValueStore,
        key: &str,
        user: Value,
    ) -> ClientResult<CachedSession> {
        let session = CachedSession::redact(user)?;
        Self::save(store, key, &session)?;
        Ok(session)
    }

    pub fn clear(store: &dyn KeyValueStore, key: &str) -> ClientResult<()> {
        store.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cache::store::MemoryStore;
    use crate::models::contains_credential;

    #[test]
    fn save_raw_never_persists_password() {
        let store = MemoryStore::new();
        let session = SessionCacheOperations::save_raw(
            &store,
            "user",
            json!({ "email": "a@b.com", "password": "pw", "token": 3 }),
        )
        .unwrap();
        assert_eq!(session.token, Some(3));

        let raw = store.get("user").unwrap().unwrap();
        let stored: Value = serde_json::from_str(&raw).unwrap();
        assert!(!contains_credential(&stored));
        assert_eq!(stored, json!({ "email": "a@b.com", "token": 3 }));
    }

    #[test]
    fn corrupt_entry_reads_as_absent() {
        let store = MemoryStore::new();
        store.set("user", "[1,2,3]").unwrap();
        assert_eq!(SessionCacheOperations::load(&store, "user").unwrap(), None);

        SessionCacheOperations::clear(&store, "user").unwrap();
        assert!(store.is_empty());
    }
}
