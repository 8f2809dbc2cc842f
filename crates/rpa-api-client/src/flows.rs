//! Sign-in and sign-out flows.
//!
//! These connect login/logout responses to the session held by the API's
//! client. The session itself never calls the network.

use crate::{AdminApi, ApiError, ApiResult, UserApi, UserLoginResponse};
use rpa_auth::{normalize_token, AuthError, Profile, Surface, TokenRejection, TokenVerdict};
use serde_json::Value;
use std::fmt;
use tracing::{info, warn};

/// Email and password typed into a login form.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Whether the form may be submitted.
    pub fn can_submit(&self) -> bool {
        self.email.trim().chars().count() > 3 && !self.password.trim().is_empty()
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.email.trim().chars().count() <= 3 {
            return Err(ApiError::InvalidInput("enter a valid email".to_string()));
        }
        if self.password.trim().is_empty() {
            return Err(ApiError::InvalidInput("enter your password".to_string()));
        }
        Ok(())
    }

    /// Request body with the email trimmed.
    pub(crate) fn payload(&self) -> Value {
        serde_json::json!({
            "email": self.email.trim(),
            "password": self.password,
        })
    }
}

/// Log a user in and record the result in the user session.
pub async fn sign_in_user(api: &UserApi, credentials: &Credentials) -> ApiResult<UserLoginResponse> {
    credentials.validate()?;
    let response = api.login(credentials).await?;

    let token = response
        .access_token
        .as_deref()
        .map(normalize_token)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingToken)?;

    let session = api.client().session();
    session.login(&token, response.user.clone())?;
    if let Some(refresh) = response.refresh_token.as_deref().filter(|t| !t.is_empty()) {
        session
            .store()
            .set_refresh_token(refresh)
            .map_err(AuthError::from)?;
    }

    Ok(response)
}

/// Log an admin in and record the result in the admin session.
///
/// The returned token is checked before the session sees it: it must have
/// three segments and an admin claim type.
pub async fn sign_in_admin(api: &AdminApi, credentials: &Credentials) -> ApiResult<Profile> {
    credentials.validate()?;
    let response = api.login(credentials).await?;

    let token = normalize_token(response.access_token.as_deref().unwrap_or_default());
    if token.is_empty() {
        return Err(ApiError::MissingToken);
    }
    if token.split('.').count() != 3 {
        warn!("Admin login returned a token without three segments");
        return Err(TokenRejection::Malformed("expected three segments".to_string()).into());
    }
    if let TokenVerdict::Rejected(rejection) = Surface::Admin.verify(&token) {
        warn!(kind = rejection.kind(), "Admin login returned a token for another surface");
        return Err(rejection.into());
    }

    let profile =
        Profile::new(response.admin_id().unwrap_or_default()).with_email(credentials.email.trim());
    api.client().session().login(&token, Some(profile.clone()))?;
    Ok(profile)
}

/// Best-effort backend logout, then forget the admin session locally.
pub async fn sign_out_admin(api: &AdminApi) -> ApiResult<()> {
    if let Err(e) = api.logout().await {
        warn!(error = %e, "Admin logout request failed, signing out locally");
    }
    api.client().session().logout()?;
    Ok(())
}

/// Revoke every backend session of the user, then forget the local one.
pub async fn sign_out_everywhere(api: &UserApi) -> ApiResult<()> {
    api.logout_all().await?;
    api.client().session().logout()?;
    info!("Signed out of all sessions");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_submit() {
        assert!(Credentials::new("a@b.c", "pw").can_submit());
        assert!(!Credentials::new("  a@b ", "pw").can_submit());
        assert!(!Credentials::new("a@b.c", "   ").can_submit());
    }

    #[test]
    fn test_validate_messages() {
        assert!(matches!(
            Credentials::new("x", "pw").validate(),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(Credentials::new(" admin@example.com ", "secret").validate().is_ok());
    }

    #[test]
    fn test_payload_trims_email_only() {
        let payload = Credentials::new(" admin@example.com ", " secret ").payload();
        assert_eq!(payload["email"], "admin@example.com");
        assert_eq!(payload["password"], " secret ");
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("a@b.c", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }
}
