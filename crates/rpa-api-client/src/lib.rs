//! HTTP access to the Research Paper Assistant backend.
//!
//! One [`ApiClient`] exists per surface. It reads the surface's token from
//! storage on every request, refuses to present a token whose claim type
//! belongs elsewhere, and turns a 401 into a cleared store plus a raised
//! logout signal. [`UserApi`] and [`AdminApi`] wrap the endpoints each
//! surface calls; [`flows`] ties login and logout responses to an
//! [`rpa_auth::AuthSession`].

mod admin_api;
mod client;
mod config;
mod error;
pub mod flows;
mod user_api;

pub use admin_api::{AdminApi, AdminLoginResponse, AdminMe, RevokeResponse, SessionPage, SessionRow};
pub use client::{ApiClient, RequestOptions};
pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use error::{ApiError, ApiResult};
pub use flows::Credentials;
pub use reqwest::Method;
pub use user_api::{
    AccountUsage, Preferences, RegisterRequest, UserApi, UserLoginResponse, UserMe,
};
