//! Session-aware HTTP client.

use crate::{ApiError, ApiResult, ClientConfig};
use reqwest::{Client, Method, Response, StatusCode};
use rpa_auth::{AuthSession, LogoutNotice, LogoutReason, Surface, TokenVerdict};
use rpa_storage::SettingsStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

const ANALYTICS_HEADER: &str = "X-Disable-Analytics";
const REFRESH_PATH: &str = "/auth/refresh";

/// Per-request switches.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Leave the session alone when this request gets a 401.
    pub skip_logout: bool,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_logout(mut self) -> Self {
        self.skip_logout = true;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

enum RefreshOutcome {
    Refreshed,
    /// No refresh token stored.
    Unavailable,
    Failed,
}

/// HTTP client bound to one surface's session.
///
/// The token is read from the session's store at call time and never cached
/// here.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
    session: Arc<AuthSession>,
    settings: SettingsStore,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("surface", &self.session.surface())
            .field("base_url", &self.config.base_url.as_str())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: Arc<AuthSession>) -> ApiResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let settings = SettingsStore::new(session.store().storage());
        Ok(Self {
            http,
            config,
            session,
            settings,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn surface(&self) -> Surface {
        self.session.surface()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: &RequestOptions) -> ApiResult<T> {
        self.send(Method::GET, path, None, options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> ApiResult<T> {
        self.send(Method::DELETE, path, None, options).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, options: &RequestOptions) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, Some(body), options).await
    }

    /// POST without a request body.
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> ApiResult<T> {
        self.send(Method::POST, path, None, options).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B, options: &RequestOptions) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.send(Method::PATCH, path, Some(body), options).await
    }

    /// Send a request through both hooks and decode the JSON response.
    ///
    /// An empty response body decodes as `null`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: &RequestOptions,
    ) -> ApiResult<T> {
        let url = self.config.endpoint(path)?;
        let value = self.execute(method, url, body.as_ref(), options).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> ApiResult<Value> {
        let response = self.dispatch(method.clone(), url.clone(), body, options).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return read_body(response).await;
        }

        let error = unauthorized(response).await;
        if options.skip_logout {
            debug!(surface = %self.surface(), %url, "Ignoring 401 for skip_logout request");
            return Err(error);
        }

        if self.refresh_enabled() {
            match self.refresh().await {
                RefreshOutcome::Refreshed => {
                    let retried = self.dispatch(method, url, body, options).await?;
                    if retried.status() != StatusCode::UNAUTHORIZED {
                        return read_body(retried).await;
                    }
                    let error = unauthorized(retried).await;
                    self.invalidate(LogoutReason::Unauthorized { status: 401 });
                    return Err(error);
                }
                RefreshOutcome::Failed => {
                    self.invalidate(LogoutReason::RefreshFailed);
                    return Err(error);
                }
                RefreshOutcome::Unavailable => {}
            }
        }

        self.invalidate(LogoutReason::Unauthorized { status: 401 });
        Err(error)
    }

    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> ApiResult<Response> {
        let mut request = self.http.request(method, url);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(token) = self.authorize() {
            request = request.bearer_auth(token);
        }
        if self.analytics_disabled() {
            request = request.header(ANALYTICS_HEADER, "true");
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Outgoing hook: the token to present, if any.
    ///
    /// A stored token that fails the claim check invalidates the session and
    /// the request goes out without credentials.
    fn authorize(&self) -> Option<String> {
        let raw = match self.session.store().get_token() {
            Ok(token) => token?,
            Err(e) => {
                warn!(surface = %self.surface(), error = %e, "Failed to read stored token");
                return None;
            }
        };
        if raw.trim().is_empty() {
            return None;
        }

        match self.surface().verify(&raw) {
            TokenVerdict::Valid { token, claim_type } => {
                debug!(surface = %self.surface(), claim_type = ?claim_type, "Attaching bearer token");
                Some(token)
            }
            TokenVerdict::Rejected(rejection) => {
                warn!(
                    surface = %self.surface(),
                    kind = rejection.kind(),
                    "Stored token failed the claim check, sending request without it"
                );
                self.invalidate(LogoutReason::RejectedToken(rejection));
                None
            }
        }
    }

    fn analytics_disabled(&self) -> bool {
        match self.settings.load() {
            Ok(settings) => settings.is_some_and(|s| s.analytics_disabled()),
            Err(e) => {
                debug!(error = %e, "Failed to read client settings");
                false
            }
        }
    }

    fn refresh_enabled(&self) -> bool {
        self.config.refresh_on_unauthorized && self.session.store().keys().refresh.is_some()
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Bypasses both hooks.
    async fn refresh(&self) -> RefreshOutcome {
        let store = self.session.store();
        let refresh_token = match store.get_refresh_token() {
            Ok(Some(token)) if !token.trim().is_empty() => token,
            Ok(_) => return RefreshOutcome::Unavailable,
            Err(e) => {
                warn!(error = %e, "Failed to read refresh token");
                return RefreshOutcome::Failed;
            }
        };

        let url = match self.config.endpoint(REFRESH_PATH) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Invalid refresh URL");
                return RefreshOutcome::Failed;
            }
        };

        let response = match self
            .http
            .post(url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token refresh request failed");
                return RefreshOutcome::Failed;
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, body_len = body.len(), "Token refresh rejected");
            return RefreshOutcome::Failed;
        }

        let refreshed: RefreshResponse = match response.json().await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                warn!(error = %e, "Invalid token refresh response");
                return RefreshOutcome::Failed;
            }
        };
        let Some(access_token) = refreshed.access_token.filter(|t| !t.trim().is_empty()) else {
            warn!("Token refresh response did not include an access token");
            return RefreshOutcome::Failed;
        };

        if let Err(e) = self.session.login(&access_token, self.session.profile()) {
            warn!(error = %e, "Refreshed token was not accepted");
            return RefreshOutcome::Failed;
        }
        if let Some(new_refresh) = refreshed.refresh_token.filter(|t| !t.is_empty()) {
            if let Err(e) = store.set_refresh_token(&new_refresh) {
                warn!(error = %e, "Failed to store rotated refresh token");
            }
        }

        info!(surface = %self.surface(), "Access token refreshed");
        RefreshOutcome::Refreshed
    }

    /// Clear the store and raise the logout signal once.
    fn invalidate(&self, reason: LogoutReason) {
        let surface = self.surface();
        if let Err(e) = self.session.store().clear_all() {
            warn!(%surface, error = %e, "Failed to clear token store");
        }
        warn!(%surface, event = surface.logout_event(), %reason, "Session invalidated");
        self.session.signal().raise(LogoutNotice::new(surface, reason));
    }
}

async fn unauthorized(response: Response) -> ApiError {
    let body = response.text().await.unwrap_or_default();
    ApiError::from_status(StatusCode::UNAUTHORIZED.as_u16(), body)
}

async fn read_body(response: Response) -> ApiResult<Value> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        debug!(status = status.as_u16(), "Request failed");
        return Err(ApiError::from_status(status.as_u16(), text));
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}
