use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_LOGOUT_PATHS: &str = "/user/logout,/logout,/auth/logout";
const DEFAULT_SESSION_FILE: &str = ".journey/session.json";

/// 本地会话存储后端
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    File(PathBuf),
    Redis(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub http_timeout_secs: u64,
    pub logout_paths: Vec<String>,
    pub store: StoreKind,
    pub session_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            http_timeout_secs: 15,
            logout_paths: split_paths(DEFAULT_LOGOUT_PATHS),
            store: StoreKind::Memory,
            session_key: crate::cache::keys::USER_KEY.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> ClientResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源构造配置，便于测试
    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

        let http_timeout_secs = lookup("HTTP_TIMEOUT_SECS")
            .and_then(|v| v.trim().trim_end_matches('s').parse::<u64>().ok())
            .unwrap_or(15);

        let logout_paths = split_paths(
            &lookup("LOGOUT_PATHS").unwrap_or_else(|| DEFAULT_LOGOUT_PATHS.into()),
        );

        let store = match lookup("SESSION_STORE")
            .unwrap_or_else(|| "file".into())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => StoreKind::Memory,
            "file" => StoreKind::File(
                lookup("SESSION_FILE")
                    .unwrap_or_else(|| DEFAULT_SESSION_FILE.into())
                    .into(),
            ),
            "redis" => StoreKind::Redis(lookup("REDIS_URL").ok_or_else(|| {
                ClientError::Config("REDIS_URL is required when SESSION_STORE=redis".into())
            })?),
            other => {
                return Err(ClientError::Config(format!(
                    "unknown SESSION_STORE value: {}",
                    other
                )));
            }
        };

        Ok(Config {
            api_base_url: api_base_url.trim().trim_end_matches('/').to_string(),
            http_timeout_secs,
            logout_paths,
            store,
            session_key: lookup("SESSION_KEY")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| crate::cache::keys::USER_KEY.into()),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn split_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            if p.starts_with('/') {
                p.to_string()
            } else {
                format!("/{}", p)
            }
        })
        .collect()
}
