use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 行程规划表单，未知字段原样透传给生成服务
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    #[serde(default)]
    pub start_location: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityRequest {
    pub description: String,
    pub dayid: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TitleRequest {
    pub tourid: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherQuery {
    pub place: String,
    pub start: String,
    pub end: String,
}

/// 路线出行方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Cycling,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteQuery {
    pub start: String,
    pub end: String,
    pub mode: TravelMode,
}
