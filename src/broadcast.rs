use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 64;

/// 认证状态变化的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthChangeReason {
    LoggedIn,
    LoggedOut,
    SessionRefreshed,
    SessionExpired,
    ToursUpdated,
    TokensChanged,
}

/// 同一进程内的 "auth-changed" 事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEvent {
    pub reason: AuthChangeReason,
    pub origin: Uuid,
    pub at: DateTime<Utc>,
}

impl AuthEvent {
    pub fn new(reason: AuthChangeReason, origin: Uuid) -> Self {
        Self {
            reason,
            origin,
            at: Utc::now(),
        }
    }
}

/// 发布/订阅对象，订阅者收到事件后自行重新读取缓存
#[derive(Debug, Clone)]
pub struct AuthBroadcast {
    sender: broadcast::Sender<AuthEvent>,
}

impl Default for AuthBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthBroadcast {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// 发布事件，没有订阅者时静默丢弃，返回收到事件的订阅者数量
    pub fn publish(&self, event: AuthEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                debug!("No subscribers for {:?}", event.reason);
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
