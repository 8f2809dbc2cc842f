//! Admin-surface endpoints.

use crate::{ApiClient, ApiError, ApiResult, Credentials, RequestOptions};
use rpa_auth::Profile;
use serde::Deserialize;
use serde_json::Value;

/// Response of `POST /admin/auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminLoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    admin_id: Option<Value>,
}

impl AdminLoginResponse {
    /// The admin id as text, whether the backend sent a string or a number.
    pub fn admin_id(&self) -> Option<String> {
        match self.admin_id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Response of `GET /admin/auth/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminMe {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(default)]
    pub last_login_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionRow {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

/// One page of `GET /admin/sessions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionPage {
    #[serde(default)]
    pub items: Vec<SessionRow>,
    #[serde(default)]
    pub total: u64,
}

/// Admin session listings come back either bare or paged.
#[derive(Deserialize)]
#[serde(untagged)]
enum SessionListing {
    List(Vec<SessionRow>),
    Page(SessionPage),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RevokeResponse {
    #[serde(default)]
    pub revoked: bool,
}

/// Percent-encode one path segment.
fn path_segment(id: &str) -> ApiResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::InvalidInput("session id must not be empty".to_string()));
    }
    Ok(url::form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20"))
}

/// Typed access to the `/admin/...` endpoints.
#[derive(Debug, Clone)]
pub struct AdminApi {
    client: ApiClient,
}

impl AdminApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn login(&self, credentials: &Credentials) -> ApiResult<AdminLoginResponse> {
        self.client
            .post("/admin/auth/login", &credentials.payload(), &RequestOptions::new())
            .await
    }

    pub async fn me(&self) -> ApiResult<AdminMe> {
        self.client.get("/admin/auth/me", &RequestOptions::new()).await
    }

    /// End the admin session on the backend. A 401 here does not raise the
    /// logout signal; the caller is signing out anyway.
    pub async fn logout(&self) -> ApiResult<Value> {
        self.client
            .post_empty("/admin/auth/logout", &RequestOptions::new().skip_logout())
            .await
    }

    /// The signed-in admin's own sessions.
    pub async fn sessions(&self) -> ApiResult<Vec<SessionRow>> {
        let listing: SessionListing = self
            .client
            .get("/admin/auth/sessions", &RequestOptions::new())
            .await?;
        Ok(match listing {
            SessionListing::List(rows) => rows,
            SessionListing::Page(page) => page.items,
        })
    }

    pub async fn revoke_session(&self, session_id: &str) -> ApiResult<RevokeResponse> {
        let path = format!("/admin/auth/sessions/{}", path_segment(session_id)?);
        self.client.delete(&path, &RequestOptions::new()).await
    }

    /// End-user sessions, paged. A 401 here leaves the admin signed in.
    pub async fn user_sessions(&self, page: u32, limit: u32) -> ApiResult<SessionPage> {
        let options = RequestOptions::new()
            .skip_logout()
            .query("page", page)
            .query("limit", limit);
        self.client.get("/admin/sessions", &options).await
    }

    pub async fn revoke_user_session(&self, session_id: &str) -> ApiResult<RevokeResponse> {
        let path = format!("/admin/sessions/{}", path_segment(session_id)?);
        self.client.delete(&path, &RequestOptions::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_id_accepts_number_or_string() {
        let numeric: AdminLoginResponse =
            serde_json::from_str(r#"{"access_token":"a.b.c","admin_id":5}"#).unwrap();
        assert_eq!(numeric.admin_id().as_deref(), Some("5"));

        let text: AdminLoginResponse = serde_json::from_str(r#"{"admin_id":"adm-1"}"#).unwrap();
        assert_eq!(text.admin_id().as_deref(), Some("adm-1"));
        assert_eq!(text.access_token, None);
    }

    #[test]
    fn test_session_listing_shapes() {
        let bare: SessionListing =
            serde_json::from_str(r#"[{"id":"s1","revoked":true}]"#).unwrap();
        let paged: SessionListing =
            serde_json::from_str(r#"{"items":[{"id":"s2"}],"total":1}"#).unwrap();

        assert!(matches!(bare, SessionListing::List(rows) if rows[0].revoked));
        assert!(matches!(paged, SessionListing::Page(page) if page.items[0].id == "s2"));
    }

    #[test]
    fn test_path_segment_encoding() {
        assert_eq!(path_segment("abc-123").unwrap(), "abc-123");
        assert_eq!(path_segment("a/b c").unwrap(), "a%2Fb%20c");
        assert!(path_segment("  ").is_err());
    }
}
