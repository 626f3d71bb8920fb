use std::collections::BTreeMap;
use std::fmt;

use reqwest::StatusCode;

/// 表单校验错误，字段名 -> 错误信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 没有错误时返回 Ok，否则转成 `ClientError::Validation`
    pub fn into_result(self) -> ClientResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// 401 / 403，视为本地登出
    #[error("not authenticated")]
    Unauthorized,
    #[error("endpoint not found")]
    NotFound,
    #[error("server responded with {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("store error: {0}")]
    Store(String),
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// 面向用户的内联提示，服务端返回的文本优先
    pub fn inline_message(&self) -> String {
        match self {
            ClientError::Http { status, body } if body.trim().is_empty() => {
                format!("HTTP {}", status.as_u16())
            }
            ClientError::Http { body, .. } => body.clone(),
            ClientError::Unauthorized => "No login found. Please log in.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Store(e.to_string())
    }
}

impl From<redis::RedisError> for ClientError {
    fn from(e: redis::RedisError) -> Self {
        ClientError::Store(e.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Email is required");
        errors.add("email", "Email is invalid");
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert!(matches!(
            errors.into_result(),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn inline_message_prefers_server_text() {
        let err = ClientError::Http {
            status: StatusCode::BAD_REQUEST,
            body: "Insufficient tokens".into(),
        };
        assert_eq!(err.inline_message(), "Insufficient tokens");

        let err = ClientError::Http {
            status: StatusCode::BAD_GATEWAY,
            body: "  ".into(),
        };
        assert_eq!(err.inline_message(), "HTTP 502");
    }
}
