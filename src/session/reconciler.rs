use std::future::Future;
use std::sync::{Arc, Weak};

use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::{OnceCell, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::patch::{append_photo, looks_like_user, rename_tour};
use super::route::Route;
use crate::api::ApiClient;
use crate::broadcast::{AuthBroadcast, AuthChangeReason, AuthEvent};
use crate::cache::{KeyValueStore, SessionCacheOperations, watch_storage_events};
use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    ActivityRequest, CachedSession, LandmarkPrediction, LoginRequest, PlanRequest, RouteQuery,
    SignupForm, SignupRequest, TitleRequest, TokenReceipt, UserEnvelope, WeatherQuery,
};
use crate::utils::validation;

/// 客户端认证状态，首次 bootstrap 完成前为 `Unknown`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unknown,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(self) -> bool {
        self == AuthState::Authenticated
    }
}

/// bootstrap 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// `/user/me` 成功，缓存已刷新
    Refreshed,
    /// 后端拒绝（401/403），缓存已清除
    Expired,
    /// 网络错误或其它状态，沿用缓存
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// 会话缓存协调器
///
/// 让 "是否已登录" 标志以及脱敏后的用户快照与服务端会话大致保持一致，
/// 避免每个页面都重复请求后端。
pub struct SessionReconciler {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    key: String,
    logout_paths: Vec<String>,
    broadcast: AuthBroadcast,
    origin: Uuid,
    state: watch::Sender<AuthState>,
    bootstrapped: OnceCell<BootstrapOutcome>,
}

impl SessionReconciler {
    pub fn new(config: &Config, store: Arc<dyn KeyValueStore>) -> ClientResult<Self> {
        Self::with_origin(config, store, Uuid::new_v4())
    }

    pub fn with_origin(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        origin: Uuid,
    ) -> ClientResult<Self> {
        let (state, _) = watch::channel(AuthState::Unknown);
        Ok(Self {
            api: ApiClient::new(config)?,
            store,
            key: config.session_key.clone(),
            logout_paths: config.logout_paths.clone(),
            broadcast: AuthBroadcast::new(),
            origin,
            state,
            bootstrapped: OnceCell::new(),
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    pub fn broadcast(&self) -> &AuthBroadcast {
        &self.broadcast
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.broadcast.subscribe()
    }

    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn watch_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// 读取缓存的脱敏用户，读取失败视为未缓存
    pub fn current_user(&self) -> Option<CachedSession> {
        match SessionCacheOperations::load(&*self.store, &self.key) {
            Ok(user) => user,
            Err(e) => {
                warn!("Failed to read session cache: {}", e);
                None
            }
        }
    }

    /// 每个实例只执行一次；并发或重复调用都等待同一个结果
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        *self.bootstrapped.get_or_init(|| self.refresh()).await
    }

    pub fn has_bootstrapped(&self) -> bool {
        self.bootstrapped.initialized()
    }

    async fn refresh(&self) -> BootstrapOutcome {
        match self.api.me().await.and_then(UserEnvelope::into_session) {
            Ok(session) => {
                if let Err(e) = SessionCacheOperations::save(&*self.store, &self.key, &session) {
                    warn!("Failed to cache refreshed session: {}", e);
                }
                self.set_state(AuthState::Authenticated);
                self.announce(AuthChangeReason::SessionRefreshed);
                BootstrapOutcome::Refreshed
            }
            Err(ClientError::Unauthorized) => {
                self.drop_session(AuthChangeReason::SessionExpired);
                BootstrapOutcome::Expired
            }
            Err(e) => {
                warn!("Session check failed, keeping cached state: {}", e);
                self.sync();
                BootstrapOutcome::Unavailable
            }
        }
    }

    /// 仅根据本地缓存重新推导认证状态，不访问网络
    pub fn sync(&self) -> bool {
        let authenticated = self.current_user().is_some();
        self.set_state(if authenticated {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        });
        authenticated
    }

    /// 其它进程（标签页）修改了存储
    pub fn on_storage_event(&self, key: &str) -> Option<bool> {
        if key != self.key {
            return None;
        }
        Some(self.sync())
    }

    /// 页面从后台恢复时重新同步
    pub fn on_visibility_change(&self, visibility: Visibility) -> Option<bool> {
        match visibility {
            Visibility::Visible => Some(self.sync()),
            Visibility::Hidden => None,
        }
    }

    /// 如果目标页面需要登录而当前未登录，则改为跳转登录页
    pub fn gate(&self, target: Route) -> Route {
        if !target.requires_auth() || self.sync() {
            target
        } else {
            Route::Login
        }
    }

    /// 尽力通知后端登出，然后无条件清除本地缓存
    pub async fn logout(&self) -> Route {
        let mut acknowledged = false;
        for path in &self.logout_paths {
            match self.api.logout_at(path).await {
                Ok(StatusCode::NOT_FOUND) => {
                    debug!("Logout endpoint {} not found, trying next", path);
                }
                Ok(status) => {
                    if !status.is_success() {
                        warn!("Server logout failed: {}", status.as_u16());
                    }
                    acknowledged = true;
                    break;
                }
                Err(e) => warn!("Logout request to {} failed: {}", path, e),
            }
        }
        if !acknowledged {
            warn!("No logout endpoint acknowledged the request");
        }

        self.drop_session(AuthChangeReason::LoggedOut);
        Route::Landing
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<CachedSession> {
        validation::validate_login(email, password)?;
        let req = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let user = self.api.login(&req).await?;
        let session = self.apply_user_update(user, AuthChangeReason::LoggedIn)?;
        info!("Logged in as {}", session.display_name());
        Ok(session)
    }

    /// 注册成功后不自动登录，返回脱敏后的用户
    pub async fn signup(&self, form: &SignupForm) -> ClientResult<CachedSession> {
        validation::validate_signup(form)?;
        let user = self.api.signup(&SignupRequest::from(form)).await?;
        CachedSession::redact(user)
    }

    /// 所有返回完整用户的接口共用：脱敏、缓存、广播
    pub fn apply_user_update(
        &self,
        user: Value,
        reason: AuthChangeReason,
    ) -> ClientResult<CachedSession> {
        let session = SessionCacheOperations::save_raw(&*self.store, &self.key, user)?;
        self.set_state(AuthState::Authenticated);
        self.announce(reason);
        Ok(session)
    }

    pub async fn preview_plan(&self, req: &PlanRequest) -> ClientResult<Value> {
        validation::validate_plan(req)?;
        self.guarded(self.api.plan_preview(req)).await
    }

    pub async fn commit_plan(&self, preview: &Value) -> ClientResult<CachedSession> {
        let user = self.guarded(self.api.plan_commit(preview)).await?;
        self.apply_user_update(user, AuthChangeReason::ToursUpdated)
    }

    pub async fn weather(&self, query: &WeatherQuery) -> ClientResult<Value> {
        self.guarded(self.api.weather(query)).await
    }

    pub async fn route(&self, query: &RouteQuery) -> ClientResult<Value> {
        self.guarded(self.api.route(query)).await
    }

    pub async fn add_activity(
        &self,
        day_id: i64,
        description: &str,
    ) -> ClientResult<CachedSession> {
        validation::validate_activity(description)?;
        let req = ActivityRequest {
            description: description.trim().to_string(),
            dayid: day_id,
        };
        let user = self.guarded(self.api.add_activity(&req)).await?;
        self.apply_user_update(user, AuthChangeReason::ToursUpdated)
    }

    pub async fn complete_activity(&self, activity_id: i64) -> ClientResult<CachedSession> {
        let user = self.guarded(self.api.complete_activity(activity_id)).await?;
        self.apply_user_update(user, AuthChangeReason::ToursUpdated)
    }

    /// 后端可能返回完整用户，也可能只返回照片信息；后者在本地缓存上追加
    pub async fn upload_photo(
        &self,
        day_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<Option<CachedSession>> {
        validation::validate_photo(file_name, &bytes)?;
        let payload = self
            .guarded(self.api.upload_photo(day_id, file_name, bytes))
            .await?;
        if looks_like_user(&payload) {
            return self
                .apply_user_update(payload, AuthChangeReason::ToursUpdated)
                .map(Some);
        }
        self.patch_cached(AuthChangeReason::ToursUpdated, |session| {
            append_photo(session, day_id, &payload)
        })
    }

    /// 识别照片中的地标，不改动缓存
    pub async fn predict_landmark(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<LandmarkPrediction> {
        validation::validate_photo(file_name, &bytes)?;
        self.guarded(self.api.predict_landmark(file_name, bytes)).await
    }

    pub async fn set_tour_title(
        &self,
        tour_id: i64,
        title: &str,
    ) -> ClientResult<Option<CachedSession>> {
        validation::validate_title(title)?;
        let title = title.trim();
        let req = TitleRequest {
            tourid: tour_id,
            title: title.to_string(),
        };
        let payload = self.guarded(self.api.set_tour_title(&req)).await?;
        if looks_like_user(&payload) {
            return self
                .apply_user_update(payload, AuthChangeReason::ToursUpdated)
                .map(Some);
        }
        self.patch_cached(AuthChangeReason::ToursUpdated, |session| {
            rename_tour(session, tour_id, title)
        })
    }

    pub async fn generate_video(&self, tour_id: i64) -> ClientResult<CachedSession> {
        let user = self.guarded(self.api.generate_video(tour_id)).await?;
        self.apply_user_update(user, AuthChangeReason::ToursUpdated)
    }

    pub async fn generate_blog(&self, tour_id: i64) -> ClientResult<CachedSession> {
        let user = self.guarded(self.api.generate_blog(tour_id)).await?;
        self.apply_user_update(user, AuthChangeReason::ToursUpdated)
    }

    pub async fn refresh_balance(&self) -> ClientResult<i64> {
        let balance = self.guarded(self.api.token_balance()).await?;
        self.update_cached_tokens(balance.tokens);
        Ok(balance.tokens)
    }

    pub async fn buy_tokens(&self, amount: i64) -> ClientResult<TokenReceipt> {
        validation::validate_token_amount(amount)?;
        let receipt = self.guarded(self.api.add_tokens(amount)).await?;
        self.update_cached_tokens(receipt.tokens);
        Ok(receipt)
    }

    pub async fn redeem_coupon(&self, code: &str) -> ClientResult<TokenReceipt> {
        validation::validate_coupon(code)?;
        let receipt = self.guarded(self.api.apply_coupon(code)).await?;
        self.update_cached_tokens(receipt.tokens);
        Ok(receipt)
    }

    /// 订阅广播，每个事件都重新同步；协调器释放后任务自动结束
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.subscribe();
        let this = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        let Some(this) = this.upgrade() else { break };
                        this.sync();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// 监听其它进程通过 Redis 发布的存储变更
    pub fn spawn_storage_watcher(self: &Arc<Self>, client: redis::Client) -> JoinHandle<()> {
        let this: Weak<Self> = Arc::downgrade(self);
        let origin = self.origin;
        tokio::spawn(async move {
            let result = watch_storage_events(&client, origin, |notice| {
                if let Some(this) = this.upgrade() {
                    debug!("Storage notice from {}: {:?}", notice.origin, notice.op);
                    this.on_storage_event(&notice.key);
                }
            })
            .await;
            if let Err(e) = result {
                warn!("Storage watcher stopped: {}", e);
            }
        })
    }

    /// 执行后端调用；认证被拒时按本地登出处理，错误仍返回给调用方
    async fn guarded<T, F>(&self, call: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        call.await.inspect_err(|e| {
            if e.is_auth_rejection() {
                info!("Backend rejected the session, clearing local cache");
                self.drop_session(AuthChangeReason::SessionExpired);
            }
        })
    }

    fn patch_cached<F>(
        &self,
        reason: AuthChangeReason,
        patch: F,
    ) -> ClientResult<Option<CachedSession>>
    where
        F: FnOnce(&mut CachedSession) -> bool,
    {
        let Some(mut session) = self.current_user() else {
            self.announce(reason);
            return Ok(None);
        };
        if patch(&mut session) {
            SessionCacheOperations::save(&*self.store, &self.key, &session)?;
        }
        self.announce(reason);
        Ok(Some(session))
    }

    fn update_cached_tokens(&self, tokens: i64) {
        if let Some(mut session) = self.current_user() {
            session.token = Some(tokens);
            if let Err(e) = SessionCacheOperations::save(&*self.store, &self.key, &session) {
                warn!("Failed to cache token balance: {}", e);
            }
        }
        self.announce(AuthChangeReason::TokensChanged);
    }

    fn drop_session(&self, reason: AuthChangeReason) {
        if let Err(e) = SessionCacheOperations::clear(&*self.store, &self.key) {
            warn!("Failed to clear session cache: {}", e);
        }
        self.set_state(AuthState::Unauthenticated);
        self.announce(reason);
    }

    fn set_state(&self, next: AuthState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            info!("Auth state -> {:?}", next);
        }
    }

    fn announce(&self, reason: AuthChangeReason) {
        self.broadcast.publish(AuthEvent::new(reason, self.origin));
    }
}
