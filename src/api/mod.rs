//! 后端 HTTP 接口
//!
//! 只按照客户端观察到的契约调用，后端本身不在本 crate 范围内。

mod token;
mod trip;
mod user;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::utils::join_url;

/// 带 cookie 的 HTTP 客户端，对应浏览器里的 `credentials: "include"`
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(self.url(path))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(self.url(path))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// 发送请求并把非 2xx 状态映射为错误
    async fn send(
        &self,
        method: &str,
        path: &str,
        request: RequestBuilder,
    ) -> ClientResult<Response> {
        debug!("{} {}", method, path);
        let response = request.send().await?;
        let status = response.status();
        debug!("{} {} -> {}", method, path, status.as_u16());
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        request: RequestBuilder,
    ) -> ClientResult<T> {
        let response = self.send(method, path, request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send_json("GET", path, self.get(path)).await
    }

    async fn get_json_with<Q, T>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json("GET", path, self.get(path).query(query)).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json("POST", path, self.post(path).json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send_json("POST", path, self.post(path)).await
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
        StatusCode::NOT_FOUND => Err(ClientError::NotFound),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::Http { status, body })
        }
    }
}
