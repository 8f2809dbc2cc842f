//! Sign-in, sign-out and identity commands for either surface.

use super::{api_failure, AppContext};
use crate::output::{self, OutputFormat};
use anyhow::{bail, Result};
use rpa_api_client::flows::{sign_in_admin, sign_in_user, sign_out_admin};
use rpa_api_client::Credentials;
use rpa_auth::{RouteGuard, Surface};
use serde_json::json;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::info;

/// Login with email and password.
pub async fn login(ctx: &AppContext, email: Option<String>) -> Result<ExitCode> {
    if let Some(code) = ctx.enforce(RouteGuard::Public) {
        return Ok(code);
    }

    let email = match email {
        Some(email) => email,
        None => {
            print!("Email: ");
            io::stdout().flush()?;
            let mut email = String::new();
            io::stdin().read_line(&mut email)?;
            email
        }
    };
    let password = rpassword::prompt_password("Password: ")?;

    let credentials = Credentials::new(email.trim(), password);
    if !credentials.can_submit() {
        bail!("Enter a valid email and password");
    }

    let profile = match ctx.surface {
        Surface::User => sign_in_user(&ctx.user_api(), &credentials)
            .await
            .map_err(|e| api_failure(e, "Login failed"))?
            .user,
        Surface::Admin => Some(
            sign_in_admin(&ctx.admin_api(), &credentials)
                .await
                .map_err(|e| api_failure(e, "Admin login failed"))?,
        ),
    };

    let shown = profile
        .as_ref()
        .and_then(|p| p.email.clone())
        .unwrap_or_else(|| credentials.email.trim().to_string());
    info!(surface = %ctx.surface, "Login completed");

    match ctx.format {
        OutputFormat::Text => {
            println!("Logged in as {}", shown);
            println!("Continue at {}", ctx.surface.landing_path());
        }
        OutputFormat::Json => output::print_json(&json!({
            "status": "success",
            "surface": ctx.surface,
            "profile": profile,
            "landing_path": ctx.surface.landing_path(),
        })),
    }
    Ok(ExitCode::SUCCESS)
}

/// Logout and clear the local session.
pub async fn logout(ctx: &AppContext) -> Result<ExitCode> {
    match ctx.surface {
        Surface::User => ctx.session.logout()?,
        Surface::Admin => sign_out_admin(&ctx.admin_api())
            .await
            .map_err(|e| api_failure(e, "Logout failed"))?,
    }

    output::print_success("Logged out successfully", &ctx.format);
    Ok(ExitCode::SUCCESS)
}

/// Show the local session state. Never calls the backend.
pub async fn status(ctx: &AppContext) -> Result<ExitCode> {
    let snapshot = ctx.session.snapshot();

    match ctx.format {
        OutputFormat::Text => {
            output::print_row("Surface", ctx.surface.as_str());
            output::print_row(
                "Auth",
                if snapshot.is_authenticated {
                    "logged in"
                } else {
                    "not logged in"
                },
            );
            if let Some(profile) = &snapshot.profile {
                output::print_row("ID", &profile.id);
                output::print_row("Email", output::or_dash(profile.email.as_deref()));
            }
            output::print_row("API", ctx.client.config().base_url.as_str());
            output::print_row("Storage", &ctx.paths.storage_file().display().to_string());
        }
        OutputFormat::Json => output::print_json(&json!({
            "surface": ctx.surface,
            "logged_in": snapshot.is_authenticated,
            "profile": snapshot.profile,
            "api_base_url": ctx.client.config().base_url.as_str(),
        })),
    }
    Ok(ExitCode::SUCCESS)
}

/// Fetch the signed-in identity from the backend.
pub async fn me(ctx: &AppContext) -> Result<ExitCode> {
    if let Some(code) = ctx.enforce(RouteGuard::Protected) {
        return Ok(code);
    }

    let (profile, last_login_at) = match ctx.surface {
        Surface::User => {
            let me = ctx
                .user_api()
                .me()
                .await
                .map_err(|e| api_failure(e, "Failed to load profile"))?;
            (me.profile, me.last_login_at)
        }
        Surface::Admin => {
            let me = ctx
                .admin_api()
                .me()
                .await
                .map_err(|e| api_failure(e, "Failed to load admin profile"))?;
            (me.profile, me.last_login_at)
        }
    };

    match ctx.format {
        OutputFormat::Text => {
            output::print_heading("Profile");
            output::print_row("ID", &profile.id);
            output::print_row("Name", output::or_dash(profile.name.as_deref()));
            output::print_row("Email", output::or_dash(profile.email.as_deref()));
            output::print_row("Role", output::or_dash(profile.role.as_deref()));
            output::print_row("Last login", output::or_dash(last_login_at.as_deref()));
        }
        OutputFormat::Json => output::print_json(&json!({
            "profile": profile,
            "last_login_at": last_login_at,
        })),
    }
    Ok(ExitCode::SUCCESS)
}
