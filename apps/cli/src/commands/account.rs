//! User account commands.

use super::{api_failure, AppContext};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use rpa_api_client::flows::sign_out_everywhere;
use rpa_auth::RouteGuard;
use serde_json::json;
use std::process::ExitCode;

/// Show how much data the account holds.
pub async fn usage(ctx: &AppContext) -> Result<ExitCode> {
    if let Some(code) = ctx.enforce(RouteGuard::Protected) {
        return Ok(code);
    }

    let usage = ctx
        .user_api()
        .account_usage()
        .await
        .map_err(|e| api_failure(e, "Failed to load account usage"))?;

    match ctx.format {
        OutputFormat::Text => {
            output::print_heading("Account usage");
            for (kind, count) in &usage.counts {
                output::print_row(&kind.replace('_', " "), &count.to_string());
            }
            output::print_divider();
            output::print_row("Total", &usage.total_records.to_string());
            output::print_row("Last login", output::or_dash(usage.last_login_at.as_deref()));
        }
        OutputFormat::Json => output::print_json(&json!({
            "counts": usage.counts,
            "total_records": usage.total_records,
            "last_login_at": usage.last_login_at,
        })),
    }
    Ok(ExitCode::SUCCESS)
}

/// Revoke every session of the account, this one included.
pub async fn logout_all(ctx: &AppContext) -> Result<ExitCode> {
    if let Some(code) = ctx.enforce(RouteGuard::Protected) {
        return Ok(code);
    }

    sign_out_everywhere(&ctx.user_api())
        .await
        .map_err(|e| api_failure(e, "Failed to sign out everywhere"))?;

    output::print_success("Signed out of all sessions", &ctx.format);
    Ok(ExitCode::SUCCESS)
}
