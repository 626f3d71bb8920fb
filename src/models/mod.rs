pub mod landmark;
pub mod token;
pub mod trip;
pub mod user;

pub use landmark::LandmarkPrediction;
pub use token::{CouponRequest, TokenBalance, TokenReceipt};
pub use trip::{ActivityRequest, PlanRequest, RouteQuery, TitleRequest, TravelMode, WeatherQuery};
pub use user::{
    CachedSession, LoginRequest, SignupForm, SignupRequest, UserEnvelope, UserId,
    contains_credential, strip_credentials,
};
