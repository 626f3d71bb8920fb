use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult};

/// 永远不能进入本地缓存的凭据字段（小写比较）
const CREDENTIAL_KEYS: &[&str] = &["password", "passwordhash", "password_hash", "confirmpassword"];

fn is_credential_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    CREDENTIAL_KEYS.contains(&lower.as_str())
}

/// 递归删除对象中的凭据字段
pub fn strip_credentials(value: &mut Value) {
    match value {
        Value::Object(map) => strip_credentials_map(map),
        Value::Array(items) => items.iter_mut().for_each(strip_credentials),
        _ => {}
    }
}

fn strip_credentials_map(map: &mut Map<String, Value>) {
    map.retain(|key, _| !is_credential_key(key));
    map.values_mut().for_each(strip_credentials);
}

/// 检查 JSON 中是否还残留凭据字段
pub fn contains_credential(value: &Value) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(key, v)| is_credential_key(key) || contains_credential(v)),
        Value::Array(items) => items.iter().any(contains_credential),
        _ => false,
    }
}

/// 后端用户 ID，数字或字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{}", n),
            UserId::Text(s) => f.write_str(s),
        }
    }
}

/// 客户端缓存的已脱敏用户
///
/// 唯一的构造途径是经过脱敏的反序列化，所以缓存副本里不可能出现密码字段，
/// 即使本地存储被手工篡改也一样。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct CachedSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// 令牌余额
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<i64>,
    /// 行程摘要，不做进一步建模
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tours: Vec<Value>,
    /// 其它非凭据字段（rating、joinDate 等）原样保留
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for CachedSession {
    type Error = String;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        strip_credentials_map(&mut map);

        Ok(CachedSession {
            id: take_field(&mut map, "id")?,
            name: take_field(&mut map, "name")?,
            email: take_field(&mut map, "email")?,
            token: take_field(&mut map, "token")?,
            tours: take_field(&mut map, "tours")?,
            extra: map,
        })
    }
}

fn take_field<T>(map: &mut Map<String, Value>, key: &str) -> Result<T, String>
where
    T: DeserializeOwned + Default,
{
    match map.remove(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(v) => serde_json::from_value(v).map_err(|e| format!("field `{}`: {}", key, e)),
    }
}

impl CachedSession {
    /// 将后端返回的任意用户 JSON 脱敏后转成缓存记录
    pub fn redact(value: Value) -> ClientResult<Self> {
        match value {
            Value::Object(map) => Self::try_from(map)
                .map_err(|e| ClientError::Decode(serde::de::Error::custom(e))),
            other => Err(ClientError::Decode(serde::de::Error::custom(format!(
                "expected a user object, got {}",
                json_kind(&other)
            )))),
        }
    }

    pub fn to_json(&self) -> ClientResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> ClientResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("traveller")
    }

    /// 姓名首字母，例如 "Ada Lovelace" -> "AL"
    pub fn initials(&self) -> String {
        self.name
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn tour_count(&self) -> usize {
        self.tours.len()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `/user/me` 的两种响应形态：`{ "user": {...} }` 或直接是用户对象
#[derive(Debug, Clone)]
pub enum UserEnvelope {
    Wrapped { user: Value },
    Bare(Value),
}

impl<'de> Deserialize<'de> for UserEnvelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Object(mut map) if map.get("user").is_some_and(Value::is_object) => {
                let user = map.remove("user").unwrap_or(Value::Null);
                UserEnvelope::Wrapped { user }
            }
            other => UserEnvelope::Bare(other),
        })
    }
}

impl UserEnvelope {
    pub fn into_session(self) -> ClientResult<CachedSession> {
        match self {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => {
                CachedSession::redact(user)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// 注册表单，比请求体多出确认密码
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl From<&SignupForm> for SignupRequest {
    fn from(form: &SignupForm) -> Self {
        SignupRequest {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn wrapped_user_is_unwrapped_and_redacted() {
        let envelope: UserEnvelope =
            serde_json::from_value(json!({ "user": { "email": "a@b.com", "password": "x" } }))
                .unwrap();
        let session = envelope.into_session().unwrap();
        assert_eq!(session.email.as_deref(), Some("a@b.com"));
        assert_eq!(
            serde_json::to_value(&session).unwrap(),
            json!({ "email": "a@b.com" })
        );
    }

    #[test]
    fn bare_user_keeps_extra_fields() {
        let envelope: UserEnvelope = serde_json::from_value(json!({
            "id": 7,
            "name": "Ada Lovelace",
            "token": 12,
            "rating": 4.5,
            "tours": [{ "id": 1, "destination": "Sylhet" }],
            "Password": "secret"
        }))
        .unwrap();
        let session = envelope.into_session().unwrap();
        assert_eq!(session.id, Some(UserId::Number(7)));
        assert_eq!(session.token, Some(12));
        assert_eq!(session.tour_count(), 1);
        assert_eq!(session.extra.get("rating"), Some(&json!(4.5)));
        assert!(!session.extra.contains_key("Password"));
        assert_eq!(session.initials(), "AL");
    }

    #[test]
    fn tampered_cache_entry_loses_its_credential() {
        let raw = r#"{"email":"a@b.com","password":"leak","tours":[{"user":{"password":"x"}}]}"#;
        let session = CachedSession::from_json(raw).unwrap();
        let value = serde_json::to_value(&session).unwrap();
        assert!(!contains_credential(&value));
    }

    #[test]
    fn null_fields_read_as_defaults() {
        let session =
            CachedSession::redact(json!({ "email": "a@b.com", "tours": null, "token": null }))
                .unwrap();
        assert!(session.tours.is_empty());
        assert_eq!(session.token, None);
        assert_eq!(session.display_name(), "a@b.com");
    }

    #[test]
    fn non_object_user_is_a_decode_error() {
        assert!(matches!(
            CachedSession::redact(json!("nope")),
            Err(ClientError::Decode(_))
        ));
    }
}
