//! Client configuration.

use crate::{ApiError, ApiResult};
use std::time::Duration;
use url::Url;

/// Fixed request timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Settings for one [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
    /// Try `POST /auth/refresh` once before giving up on a 401.
    /// Only surfaces with a refresh token key use it.
    pub refresh_on_unauthorized: bool,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            refresh_on_unauthorized: false,
        }
    }

    /// Parse `base_url` and build a config with defaults.
    pub fn parse(base_url: &str) -> ApiResult<Self> {
        let url = Url::parse(base_url.trim())
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self::new(url))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_refresh_on_unauthorized(mut self, enabled: bool) -> Self {
        self.refresh_on_unauthorized = enabled;
        self
    }

    /// Resolve `path` (which starts with `/`) against the base URL,
    /// keeping any path prefix the base URL has.
    pub fn endpoint(&self, path: &str) -> ApiResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| ApiError::InvalidUrl(format!("{base}/{path}: {e}")))
    }
}
