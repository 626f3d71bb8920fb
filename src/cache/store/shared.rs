use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;
use redis::{Client as RedisClient, Commands, RedisResult};
use serde::{Deserialize, Serialize};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, warn};
use uuid::Uuid;

use super::KeyValueStore;
use crate::cache::keys::{STORAGE_CHANNEL, redis_session_key};
use crate::error::ClientResult;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageOp {
    Set,
    Remove,
}

/// 存储变更通知，相当于浏览器其它标签页触发的 storage 事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageNotice {
    pub key: String,
    pub op: StorageOp,
    pub origin: Uuid,
}

/// 多个客户端进程共享的 Redis 存储
///
/// 每次写入后都会在 [`STORAGE_CHANNEL`] 上发布一条通知，带上写入方的 origin。
/// 同步连接只建立一次，出错后下次调用时重连。
pub struct RedisStore {
    client: RedisClient,
    origin: Uuid,
    conn: Mutex<Option<redis::Connection>>,
}

impl RedisStore {
    pub fn open(url: &str, origin: Uuid) -> ClientResult<Self> {
        Ok(Self {
            client: RedisClient::open(url)?,
            origin,
            conn: Mutex::new(None),
        })
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// 在缓存的连接上执行命令；连接断开时重连并重试一次
    fn with_connection<T, F>(&self, mut command: F) -> ClientResult<T>
    where
        F: FnMut(&mut redis::Connection) -> RedisResult<T>,
    {
        run_blocking(|| -> ClientResult<T> {
            let mut slot = self.conn.lock();
            let mut retried = false;
            loop {
                let mut conn = match slot.take() {
                    Some(conn) => conn,
                    None => self.client.get_connection_with_timeout(CONNECT_TIMEOUT)?,
                };
                match command(&mut conn) {
                    Ok(value) => {
                        *slot = Some(conn);
                        return Ok(value);
                    }
                    Err(e) if !retried && (e.is_io_error() || e.is_connection_dropped()) => {
                        warn!("Redis connection lost, reconnecting: {}", e);
                        retried = true;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        })
    }

    fn notice_payload(&self, key: &str, op: StorageOp) -> ClientResult<String> {
        let notice = StorageNotice {
            key: key.to_string(),
            op,
            origin: self.origin,
        };
        Ok(serde_json::to_string(&notice)?)
    }
}

/// 在多线程运行时的工作线程上执行阻塞调用时，先让出该线程
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

impl KeyValueStore for RedisStore {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let redis_key = redis_session_key(key);
        self.with_connection(|conn| conn.get(&redis_key))
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let redis_key = redis_session_key(key);
        let payload = self.notice_payload(key, StorageOp::Set)?;
        let receivers: i64 = self.with_connection(|conn| {
            let _: () = conn.set(&redis_key, value)?;
            conn.publish(STORAGE_CHANNEL, &payload)
        })?;
        debug!("Published storage notice for {} to {} receivers", key, receivers);
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let redis_key = redis_session_key(key);
        let payload = self.notice_payload(key, StorageOp::Remove)?;
        let receivers: i64 = self.with_connection(|conn| {
            let _: () = conn.del(&redis_key)?;
            conn.publish(STORAGE_CHANNEL, &payload)
        })?;
        debug!("Published storage notice for {} to {} receivers", key, receivers);
        Ok(())
    }
}

/// 解析通知并过滤掉自己发出的那些
fn accept_notice(payload: &str, own_origin: Uuid) -> Option<StorageNotice> {
    match serde_json::from_str::<StorageNotice>(payload) {
        Ok(notice) if notice.origin == own_origin => None,
        Ok(notice) => Some(notice),
        Err(e) => {
            warn!("Malformed storage notice: {}", e);
            None
        }
    }
}

/// 订阅存储变更通知，只把其它 origin 的通知交给回调
///
/// 订阅流结束（连接断开）时返回。
pub async fn watch_storage_events<F>(
    client: &RedisClient,
    own_origin: Uuid,
    mut on_notice: F,
) -> ClientResult<()>
where
    F: FnMut(StorageNotice) + Send,
{
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(STORAGE_CHANNEL).await?;
    let mut messages = pubsub.on_message();

    while let Some(msg) = messages.next().await {
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Unreadable storage notice payload: {}", e);
                continue;
            }
        };
        if let Some(notice) = accept_notice(&payload, own_origin) {
            on_notice(notice);
        }
    }

    debug!("Storage notice stream closed");
    Ok(())
}
