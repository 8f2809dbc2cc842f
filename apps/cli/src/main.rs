//! rpa - command-line client for the Research Paper Assistant.
//!
//! Each invocation works like a page load: it opens the storage file,
//! restores the surface's session, applies the command's route guard and
//! runs the command.

mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use commands::AppContext;
use rpa_auth::Surface;
use rpa_config_and_utils::{init_logging, Config, Paths};
use std::process::ExitCode;
use tracing::debug;

/// rpa - Sign in to the Research Paper Assistant as a user or an admin.
#[derive(Parser)]
#[command(name = "rpa")]
#[command(about = "Research Paper Assistant client for authentication and account management")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use the admin surface instead of the user surface
    #[arg(long, global = true)]
    admin: bool,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Backend base URL for this invocation
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login {
        /// Email address (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Logout and clear the local session
    Logout,

    /// Show the local session state
    Status,

    /// Show the signed-in profile
    Me,

    /// Show how much data your account holds
    Usage,

    /// Sign out of every session of your account
    LogoutAll,

    /// List admin sessions
    Sessions {
        /// List end-user sessions instead
        #[arg(long)]
        users: bool,

        /// Page number (with --users)
        #[arg(long, default_value = "1")]
        page: u32,

        /// Page size (with --users)
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Revoke a session
    Revoke {
        /// Session ID
        id: String,

        /// Revoke an end-user session instead of an admin session
        #[arg(long)]
        user: bool,
    },

    /// Change local client settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Allow or refuse usage analytics
    UsageTracking {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Commands {
    /// Account commands only exist on one surface; the rest follow `--admin`.
    fn surface(&self, admin_flag: bool) -> Surface {
        match self {
            Commands::Usage | Commands::LogoutAll => Surface::User,
            Commands::Sessions { .. } | Commands::Revoke { .. } => Surface::Admin,
            _ if admin_flag => Surface::Admin,
            _ => Surface::User,
        }
    }
}

async fn run(cli: Cli, paths: Paths, config: Config) -> anyhow::Result<ExitCode> {
    let surface = cli.command.surface(cli.admin);
    let ctx = AppContext::open(paths, &config, surface, cli.api_url.as_deref(), cli.format)?;
    debug!(%surface, "Running command");

    match cli.command {
        Commands::Login { email } => commands::login(&ctx, email).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::Status => commands::status(&ctx).await,
        Commands::Me => commands::me(&ctx).await,
        Commands::Usage => commands::usage(&ctx).await,
        Commands::LogoutAll => commands::logout_all(&ctx).await,
        Commands::Sessions { users, page, limit } => {
            commands::sessions(&ctx, users, page, limit).await
        }
        Commands::Revoke { id, user } => commands::revoke(&ctx, &id, user).await,
        Commands::Settings { command } => match command {
            SettingsCommands::UsageTracking { state } => {
                commands::usage_tracking(&ctx, state == Toggle::On).await
            }
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let paths = match Paths::new() {
        Ok(paths) => paths,
        Err(e) => {
            output::print_error(&e.to_string(), &cli.format);
            return ExitCode::FAILURE;
        }
    };
    let config = match Config::load(&paths) {
        Ok(config) => config,
        Err(e) => {
            output::print_error(&format!("Invalid configuration: {}", e), &cli.format);
            return ExitCode::FAILURE;
        }
    };

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging(&paths, &level);

    let format = cli.format;
    match run(cli, paths, config).await {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&e.to_string(), &format);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["rpa", "me", "--admin", "--format", "json"]).unwrap();
        assert!(cli.admin);
        assert_eq!(cli.format, output::OutputFormat::Json);
        assert_eq!(cli.command.surface(cli.admin), Surface::Admin);
    }

    #[test]
    fn test_account_commands_pin_their_surface() {
        let cli = Cli::try_parse_from(["rpa", "--admin", "usage"]).unwrap();
        assert_eq!(cli.command.surface(cli.admin), Surface::User);

        let cli = Cli::try_parse_from(["rpa", "revoke", "s1", "--user"]).unwrap();
        assert_eq!(cli.command.surface(cli.admin), Surface::Admin);
        assert!(matches!(cli.command, Commands::Revoke { user: true, .. }));
    }

    #[test]
    fn test_settings_toggle() {
        let cli = Cli::try_parse_from(["rpa", "settings", "usage-tracking", "off"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Settings {
                command: SettingsCommands::UsageTracking { state: Toggle::Off }
            }
        ));
        assert!(Cli::try_parse_from(["rpa", "settings", "usage-tracking", "maybe"]).is_err());
    }

    #[test]
    fn test_sessions_defaults() {
        let cli = Cli::try_parse_from(["rpa", "sessions", "--users"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sessions {
                users: true,
                page: 1,
                limit: 20
            }
        ));
    }
}
