/// 缓存键模块

/// 本地存储中已脱敏用户的默认键
pub const USER_KEY: &str = "user";

/// Redis 中会话键前缀
const SESSION_PREFIX: &str = "journey:session:";

/// 存储变更通知频道
pub const STORAGE_CHANNEL: &str = "journey:storage";

/// 生成 Redis 中的会话键
pub fn redis_session_key(key: &str) -> String {
    format!("{}{}", SESSION_PREFIX, key)
}

#[cfg(test)]
mod tests {
    #[test]
    fn redis_key_is_prefixed() {
        assert_eq!(super::redis_session_key("user"), "journey:session:user");
    }
}
