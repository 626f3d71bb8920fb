use super::ApiClient;
use crate::error::ClientResult;
use crate::models::{CouponRequest, TokenBalance, TokenReceipt};

impl ApiClient {
    pub async fn token_balance(&self) -> ClientResult<TokenBalance> {
        self.get_json("/token/balance").await
    }

    /// `POST /token/add?tokens=N`
    pub async fn add_tokens(&self, tokens: i64) -> ClientResult<TokenReceipt> {
        let path = "/token/add";
        self.send_json("POST", path, self.post(path).query(&[("tokens", tokens)]))
            .await
    }

    pub async fn apply_coupon(&self, code: &str) -> ClientResult<TokenReceipt> {
        let req = CouponRequest {
            coupon_code: code.trim().to_string(),
        };
        self.post_json("/token/apply-coupon", &req).await
    }
}
