use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::ApiClient;
use crate::error::ClientResult;
use crate::models::{LoginRequest, SignupRequest, UserEnvelope};

impl ApiClient {
    /// `GET /user/me`
    pub async fn me(&self) -> ClientResult<UserEnvelope> {
        self.get_json("/user/me").await
    }

    /// `POST /user/login`，返回未脱敏的用户 JSON
    pub async fn login(&self, req: &LoginRequest) -> ClientResult<Value> {
        self.post_json("/user/login", req).await
    }

    /// `POST /user/signup`
    pub async fn signup(&self, req: &SignupRequest) -> ClientResult<Value> {
        self.post_json("/user/signup", req).await
    }

    /// 向候选登出地址发送 POST，只返回状态码，不做映射
    pub async fn logout_at(&self, path: &str) -> ClientResult<StatusCode> {
        let response = self.post(path).send().await?;
        let status = response.status();
        debug!("POST {} -> {}", path, status.as_u16());
        Ok(status)
    }
}
