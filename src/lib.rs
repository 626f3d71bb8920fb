pub mod api;
pub mod broadcast;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod utils;

pub use broadcast::{AuthBroadcast, AuthChangeReason, AuthEvent};
pub use config::Config;
pub use error::{ClientError, ClientResult};
pub use models::CachedSession;
pub use session::{AuthState, BootstrapOutcome, Route, SessionReconciler, SessionView};
