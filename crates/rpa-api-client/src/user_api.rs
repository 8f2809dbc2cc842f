//! User-surface endpoints.

use crate::{ApiClient, ApiResult, Credentials, RequestOptions};
use rpa_auth::Profile;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<Profile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

/// Response of `GET /auth/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserMe {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_login_at: Option<String>,
    #[serde(default)]
    pub analytics_opt_out: Option<bool>,
}

/// Response of `GET /auth/usage`: record counts per kind of user data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUsage {
    #[serde(default)]
    pub counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub last_login_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Preferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics_opt_out: Option<bool>,
}

/// Typed access to the `/auth/...` endpoints.
#[derive(Debug, Clone)]
pub struct UserApi {
    client: ApiClient,
}

impl UserApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn login(&self, credentials: &Credentials) -> ApiResult<UserLoginResponse> {
        self.client
            .post("/auth/login", &credentials.payload(), &RequestOptions::new())
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<Value> {
        self.client
            .post("/auth/register", request, &RequestOptions::new())
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> ApiResult<Value> {
        let body = serde_json::json!({ "email": email.trim() });
        self.client
            .post("/auth/forgot-password", &body, &RequestOptions::new())
            .await
    }

    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> ApiResult<Value> {
        let body = serde_json::json!({
            "reset_token": reset_token,
            "new_password": new_password,
        });
        self.client
            .post("/auth/reset-password", &body, &RequestOptions::new())
            .await
    }

    /// Revoke every session of the signed-in user on the backend.
    pub async fn logout_all(&self) -> ApiResult<Value> {
        self.client
            .post_empty("/auth/logout-all", &RequestOptions::new())
            .await
    }

    pub async fn me(&self) -> ApiResult<UserMe> {
        self.client.get("/auth/me", &RequestOptions::new()).await
    }

    pub async fn delete_account(&self) -> ApiResult<Value> {
        self.client.delete("/auth/me", &RequestOptions::new()).await
    }

    pub async fn delete_account_data(&self) -> ApiResult<Value> {
        self.client
            .delete("/auth/me/data", &RequestOptions::new())
            .await
    }

    pub async fn account_usage(&self) -> ApiResult<AccountUsage> {
        self.client.get("/auth/usage", &RequestOptions::new()).await
    }

    pub async fn export_all_data(&self) -> ApiResult<Value> {
        self.client.get("/auth/export", &RequestOptions::new()).await
    }

    pub async fn update_preferences(&self, preferences: &Preferences) -> ApiResult<Value> {
        self.client
            .patch("/auth/preferences", preferences, &RequestOptions::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_with_user() {
        let response: UserLoginResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a.b.c",
            "refresh_token": "r",
            "token_type": "bearer",
            "user": { "id": 3, "name": "Ada", "email": "ada@example.com" }
        }))
        .unwrap();

        assert_eq!(response.access_token.as_deref(), Some("a.b.c"));
        assert_eq!(response.user.unwrap().id, "3");
    }

    #[test]
    fn test_me_flattens_profile() {
        let me: UserMe = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "name": "Ada",
            "email": "ada@example.com",
            "role": "user",
            "analytics_opt_out": true
        }))
        .unwrap();

        assert_eq!(me.profile.id, "u1");
        assert_eq!(me.profile.role.as_deref(), Some("user"));
        assert_eq!(me.analytics_opt_out, Some(true));
    }

    #[test]
    fn test_usage_counts() {
        let usage: AccountUsage = serde_json::from_value(serde_json::json!({
            "counts": { "papers": 4, "queries": 10 },
            "total_records": 14
        }))
        .unwrap();
        assert_eq!(usage.counts["papers"], 4);
        assert_eq!(usage.total_records, 14);
    }

    #[test]
    fn test_preferences_skip_unset() {
        assert_eq!(
            serde_json::to_value(Preferences::default()).unwrap(),
            serde_json::json!({})
        );
    }
}
