//! CLI command implementations.

mod account;
mod admin;
mod auth;
mod settings;

pub use account::{logout_all, usage};
pub use admin::{revoke, sessions};
pub use auth::{login, logout, me, status};
pub use settings::usage_tracking;

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use rpa_api_client::{AdminApi, ApiClient, ClientConfig, UserApi};
use rpa_auth::{AuthSession, LogoutSignal, RouteDecision, RouteGuard, Surface};
use rpa_config_and_utils::{Config, Paths};
use rpa_storage::{KeyValueStorage, SettingsStore};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

/// Shown when the user session is invalidated mid-command.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please sign in again.";

/// Exit code for a Protected command run while signed out.
const REDIRECT_EXIT_CODE: u8 = 2;

/// Everything a command needs for one surface.
pub struct AppContext {
    pub paths: Paths,
    pub surface: Surface,
    pub format: OutputFormat,
    pub storage: Arc<dyn KeyValueStorage>,
    pub session: Arc<AuthSession>,
    pub client: ApiClient,
}

impl AppContext {
    /// Open the storage file under `paths` and build the surface's session
    /// and HTTP client.
    pub fn open(
        paths: Paths,
        config: &Config,
        surface: Surface,
        api_url: Option<&str>,
        format: OutputFormat,
    ) -> Result<Self> {
        paths.ensure_dirs()?;
        let storage = rpa_storage::open_file_storage(&paths.storage_file())
            .with_context(|| format!("failed to open {}", paths.storage_file().display()))?;

        let signal = LogoutSignal::new();
        if surface == Surface::User {
            signal.subscribe(move |notice| {
                if notice.surface == Surface::User {
                    output::print_error(SESSION_EXPIRED_MESSAGE, &format);
                }
            });
        }

        let session = AuthSession::with_storage(surface, Arc::clone(&storage), signal)?;

        let base_url = match api_url {
            Some(url) => ClientConfig::parse(url)?.base_url,
            None => config.api_base_url()?,
        };
        let client_config = ClientConfig::new(base_url)
            .with_timeout(config.timeout())
            .with_refresh_on_unauthorized(config.refresh_on_unauthorized);
        debug!(%surface, base_url = %client_config.base_url, "Opened client context");

        let client = ApiClient::new(client_config, Arc::clone(&session))?;

        Ok(Self {
            paths,
            surface,
            format,
            storage,
            session,
            client,
        })
    }

    pub fn user_api(&self) -> UserApi {
        UserApi::new(self.client.clone())
    }

    pub fn admin_api(&self) -> AdminApi {
        AdminApi::new(self.client.clone())
    }

    pub fn settings(&self) -> SettingsStore {
        SettingsStore::new(Arc::clone(&self.storage))
    }

    /// Apply `guard` to the current session.
    ///
    /// Returns `None` when the command may run, or the exit code to stop
    /// with after printing where to go instead.
    pub fn enforce(&self, guard: RouteGuard) -> Option<ExitCode> {
        match guard.check(&self.session) {
            RouteDecision::Render => None,
            RouteDecision::Redirect { to } => {
                debug!(surface = %self.surface, ?guard, to, "Route guard redirect");
                match guard {
                    RouteGuard::Protected => {
                        output::print_redirect(to, "You are not signed in.", &self.format);
                        Some(ExitCode::from(REDIRECT_EXIT_CODE))
                    }
                    RouteGuard::Public => {
                        output::print_redirect(to, "You are already signed in.", &self.format);
                        Some(ExitCode::SUCCESS)
                    }
                }
            }
        }
    }
}

/// Map an API failure to the text a person should see.
fn api_failure(error: rpa_api_client::ApiError, fallback: &str) -> anyhow::Error {
    anyhow::anyhow!(error.user_message(fallback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpa_storage::StorageKeys;
    use tempfile::TempDir;

    fn context(dir: &TempDir, surface: Surface) -> AppContext {
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        AppContext::open(
            paths,
            &Config::default(),
            surface,
            None,
            OutputFormat::Json,
        )
        .unwrap()
    }

    #[test]
    fn test_protected_command_redirects_when_signed_out() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, Surface::Admin);

        assert_eq!(
            ctx.enforce(RouteGuard::Protected),
            Some(ExitCode::from(REDIRECT_EXIT_CODE))
        );
        assert_eq!(ctx.enforce(RouteGuard::Public), None);
    }

    #[test]
    fn test_public_command_redirects_when_signed_in() {
        let dir = TempDir::new().unwrap();
        {
            let ctx = context(&dir, Surface::User);
            ctx.session
                .login("abc.eyJ0eXBlIjoidXNlcl9hY2Nlc3MifQ.sig", None)
                .unwrap();
        }

        // A new process reads the same storage file.
        let ctx = context(&dir, Surface::User);
        assert!(ctx.session.is_authenticated());
        assert_eq!(ctx.enforce(RouteGuard::Public), Some(ExitCode::SUCCESS));
        assert_eq!(ctx.enforce(RouteGuard::Protected), None);
    }

    #[test]
    fn test_user_token_does_not_sign_in_admin() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, Surface::User);
        ctx.storage
            .set(
                StorageKeys::ADMIN_ACCESS_TOKEN,
                "abc.eyJ0eXBlIjoidXNlcl9hY2Nlc3MifQ.sig",
            )
            .unwrap();

        let admin = context(&dir, Surface::Admin);
        assert!(!admin.session.is_authenticated());
        assert!(!admin.storage.has(StorageKeys::ADMIN_ACCESS_TOKEN).unwrap());
    }

    #[test]
    fn test_api_url_override() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let ctx = AppContext::open(
            paths,
            &Config::default(),
            Surface::User,
            Some("http://localhost:9000/api"),
            OutputFormat::Text,
        )
        .unwrap();

        assert_eq!(
            ctx.client.config().base_url.as_str(),
            "http://localhost:9000/api"
        );
    }
}
