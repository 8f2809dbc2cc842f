//! The two parallel guard instances: user and admin.

use crate::claims::{verify_token, TokenVerdict};
use rpa_storage::TokenKeys;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Claim types accepted on the user surface.
const USER_CLAIM_TYPES: &[&str] = &["access", "user_access"];

/// Claim types accepted on the admin surface.
const ADMIN_CLAIM_TYPES: &[&str] = &["access", "admin_access"];

/// One of the two session surfaces, each with its own storage keys,
/// endpoints, paths and accepted token claim types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    User,
    Admin,
}

impl Surface {
    /// Values of the `type` claim a token may carry on this surface.
    pub fn accepted_claim_types(self) -> &'static [&'static str] {
        match self {
            Surface::User => USER_CLAIM_TYPES,
            Surface::Admin => ADMIN_CLAIM_TYPES,
        }
    }

    pub fn token_keys(self) -> TokenKeys {
        match self {
            Surface::User => TokenKeys::user(),
            Surface::Admin => TokenKeys::admin(),
        }
    }

    /// Where `Protected` routes send anonymous visitors.
    pub fn login_path(self) -> &'static str {
        match self {
            Surface::User => "/login",
            Surface::Admin => "/admin/login",
        }
    }

    /// Where `Public` routes send signed-in visitors.
    pub fn landing_path(self) -> &'static str {
        match self {
            Surface::User => "/dashboard",
            Surface::Admin => "/admin",
        }
    }

    pub fn login_endpoint(self) -> &'static str {
        match self {
            Surface::User => "/auth/login",
            Surface::Admin => "/admin/auth/login",
        }
    }

    /// Name of this surface's logout broadcast, used in logs.
    pub fn logout_event(self) -> &'static str {
        match self {
            Surface::User => "auth:logout",
            Surface::Admin => "admin:logout",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Surface::User => "user",
            Surface::Admin => "admin",
        }
    }

    /// Verify `raw` against this surface's accepted claim types.
    pub fn verify(self, raw: &str) -> TokenVerdict {
        verify_token(raw, self.accepted_claim_types())
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown surface name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown surface {0:?} (expected \"user\" or \"admin\")")]
pub struct ParseSurfaceError(String);

impl FromStr for Surface {
    type Err = ParseSurfaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Surface::User),
            "admin" => Ok(Surface::Admin),
            other => Err(ParseSurfaceError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_claim_types() {
        assert_eq!(Surface::User.accepted_claim_types(), &["access", "user_access"]);
        assert_eq!(Surface::Admin.accepted_claim_types(), &["access", "admin_access"]);
    }

    #[test]
    fn test_paths() {
        assert_eq!(Surface::User.login_path(), "/login");
        assert_eq!(Surface::User.landing_path(), "/dashboard");
        assert_eq!(Surface::Admin.login_path(), "/admin/login");
        assert_eq!(Surface::Admin.landing_path(), "/admin");
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("user".parse::<Surface>().unwrap(), Surface::User);
        assert_eq!(" ADMIN ".parse::<Surface>().unwrap(), Surface::Admin);
        assert!("root".parse::<Surface>().is_err());
        assert_eq!(Surface::Admin.to_string(), "admin");
    }

    #[test]
    fn test_token_keys_match_storage() {
        assert_eq!(Surface::User.token_keys(), TokenKeys::user());
        assert_eq!(Surface::Admin.token_keys(), TokenKeys::admin());
    }
}
