//! Local client settings.

use super::AppContext;
use crate::output;
use anyhow::Result;
use std::process::ExitCode;

/// Turn usage analytics on or off for requests from this machine.
pub async fn usage_tracking(ctx: &AppContext, enabled: bool) -> Result<ExitCode> {
    let store = ctx.settings();
    let mut settings = store.load()?.unwrap_or_default();
    settings.usage_tracking = Some(enabled);
    store.save(&settings)?;

    let message = if enabled {
        "Usage tracking enabled"
    } else {
        "Usage tracking disabled; requests will carry X-Disable-Analytics"
    };
    output::print_success(message, &ctx.format);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use rpa_auth::Surface;
    use rpa_config_and_utils::{Config, Paths};
    use rpa_storage::{KeyValueStorage, StorageKeys};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_usage_tracking_persists() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let ctx = AppContext::open(paths, &Config::default(), Surface::User, None, OutputFormat::Json)
            .unwrap();

        usage_tracking(&ctx, false).await.unwrap();
        let settings = ctx.settings().load().unwrap().unwrap();
        assert!(settings.analytics_disabled());

        usage_tracking(&ctx, true).await.unwrap();
        assert!(!ctx.settings().load().unwrap().unwrap().analytics_disabled());
    }

    #[tokio::test]
    async fn test_usage_tracking_keeps_other_settings() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let ctx = AppContext::open(paths, &Config::default(), Surface::User, None, OutputFormat::Json)
            .unwrap();
        ctx.storage
            .set(StorageKeys::SETTINGS, r#"{"compactMode":true,"language":"de"}"#)
            .unwrap();

        usage_tracking(&ctx, false).await.unwrap();

        let settings = ctx.settings().load().unwrap().unwrap();
        assert_eq!(settings.usage_tracking, Some(false));
        assert_eq!(settings.language.as_deref(), Some("de"));
        assert_eq!(settings.extra["compactMode"], serde_json::Value::Bool(true));
    }
}
