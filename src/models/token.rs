use serde::{Deserialize, Serialize};

/// `GET /token/balance` 的响应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub tokens: i64,
}

/// 购买令牌或兑换优惠码后的回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenReceipt {
    pub tokens: i64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CouponRequest {
    #[serde(rename = "couponCode")]
    pub coupon_code: String,
}
