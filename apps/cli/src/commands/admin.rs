//! Admin session management commands.

use super::{api_failure, AppContext};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use rpa_api_client::SessionRow;
use rpa_auth::RouteGuard;
use serde_json::json;
use std::process::ExitCode;

fn print_sessions(rows: &[SessionRow]) {
    if rows.is_empty() {
        println!("No sessions found.");
        return;
    }
    println!(
        "{:<38} {:<28} {:<8} {}",
        "ID", "USER", "STATUS", "EXPIRES"
    );
    output::print_divider();
    for row in rows {
        println!(
            "{:<38} {:<28} {:<8} {}",
            row.id,
            output::or_dash(row.user_email.as_deref().or(row.user_id.as_deref())),
            if row.revoked { "revoked" } else { "active" },
            output::or_dash(row.expires_at.as_deref()),
        );
    }
}

/// List the admin's own sessions, or end-user sessions with `users`.
pub async fn sessions(ctx: &AppContext, users: bool, page: u32, limit: u32) -> Result<ExitCode> {
    if let Some(code) = ctx.enforce(RouteGuard::Protected) {
        return Ok(code);
    }

    let api = ctx.admin_api();
    let (rows, total) = if users {
        let page = api
            .user_sessions(page, limit)
            .await
            .map_err(|e| api_failure(e, "Failed to load sessions"))?;
        (page.items, Some(page.total))
    } else {
        let rows = api
            .sessions()
            .await
            .map_err(|e| api_failure(e, "Failed to load sessions"))?;
        (rows, None)
    };

    match ctx.format {
        OutputFormat::Text => {
            print_sessions(&rows);
            if let Some(total) = total {
                println!("\nPage {} ({} sessions total)", page, total);
            }
        }
        OutputFormat::Json => {
            let items: Vec<_> = rows
                .iter()
                .map(|row| {
                    json!({
                        "id": row.id,
                        "user_id": row.user_id,
                        "user_email": row.user_email,
                        "created_at": row.created_at,
                        "expires_at": row.expires_at,
                        "revoked": row.revoked,
                        "user_agent": row.user_agent,
                        "ip": row.ip,
                    })
                })
                .collect();
            output::print_json(&json!({ "items": items, "total": total }));
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Revoke one session by id.
pub async fn revoke(ctx: &AppContext, id: &str, user: bool) -> Result<ExitCode> {
    if let Some(code) = ctx.enforce(RouteGuard::Protected) {
        return Ok(code);
    }

    let api = ctx.admin_api();
    let response = if user {
        api.revoke_user_session(id).await
    } else {
        api.revoke_session(id).await
    }
    .map_err(|e| api_failure(e, "Failed to revoke session"))?;

    if response.revoked {
        output::print_success(&format!("Session {} revoked", id), &ctx.format);
    } else {
        output::print_error(&format!("Session {} was not revoked", id), &ctx.format);
    }
    Ok(ExitCode::SUCCESS)
}
