use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::ApiClient;
use crate::error::ClientResult;
use crate::models::{
    ActivityRequest, LandmarkPrediction, PlanRequest, RouteQuery, TitleRequest, WeatherQuery,
};

// 行程相关接口，除预览、天气和路线外都返回更新后的完整用户
impl ApiClient {
    pub async fn plan_preview(&self, req: &PlanRequest) -> ClientResult<Value> {
        self.post_json("/api/plan/preview", req).await
    }

    pub async fn plan_commit(&self, preview: &Value) -> ClientResult<Value> {
        self.post_json("/api/plan/commit", preview).await
    }

    pub async fn weather(&self, query: &WeatherQuery) -> ClientResult<Value> {
        self.get_json_with("/api/weather", query).await
    }

    pub async fn route(&self, query: &RouteQuery) -> ClientResult<Value> {
        self.get_json_with("/api/route", query).await
    }

    pub async fn add_activity(&self, req: &ActivityRequest) -> ClientResult<Value> {
        self.post_json("/activity/add", req).await
    }

    pub async fn complete_activity(&self, activity_id: i64) -> ClientResult<Value> {
        self.post_empty(&format!("/activity/{}/complete", activity_id)).await
    }

    /// multipart 上传，字段为 `file` 和 `dayid`
    pub async fn upload_photo(
        &self,
        day_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<Value> {
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("dayid", day_id.to_string());
        let path = "/photo/upload";
        self.send_json("POST", path, self.post(path).multipart(form)).await
    }

    /// 地标识别，multipart 只有 `file` 一个字段
    pub async fn predict_landmark(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<LandmarkPrediction> {
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        let path = "/api/landmark/predict";
        self.send_json("POST", path, self.post(path).multipart(form)).await
    }

    pub async fn set_tour_title(&self, req: &TitleRequest) -> ClientResult<Value> {
        self.post_json("/tour/title", req).await
    }

    pub async fn generate_video(&self, tour_id: i64) -> ClientResult<Value> {
        self.post_empty(&format!("/tour/{}/video/generate", tour_id)).await
    }

    pub async fn generate_blog(&self, tour_id: i64) -> ClientResult<Value> {
        self.post_empty(&format!("/api/blog/generate/{}", tour_id)).await
    }
}
