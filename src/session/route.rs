/// 客户端路由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Register,
    Home,
    Plan,
    Profile,
    About,
    HowItWorks,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Home => "/idle",
            Route::Plan => "/plan",
            Route::Profile => "/profile",
            Route::About => "/about",
            Route::HowItWorks => "/howitworks",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        [
            Route::Landing,
            Route::Login,
            Route::Register,
            Route::Home,
            Route::Plan,
            Route::Profile,
            Route::About,
            Route::HowItWorks,
        ]
        .into_iter()
        .find(|r| r.path() == path)
    }

    /// 需要登录才能进入的页面
    pub fn requires_auth(self) -> bool {
        matches!(self, Route::Plan | Route::Profile)
    }
}
