//! Storage key constants.

/// Storage keys used by the client.
pub struct StorageKeys;

impl StorageKeys {
    /// User surface access token
    pub const USER_ACCESS_TOKEN: &'static str = "rpa_access_token";

    /// User surface refresh token
    pub const USER_REFRESH_TOKEN: &'static str = "rpa_refresh_token";

    /// User surface profile (JSON)
    pub const USER_PROFILE: &'static str = "rpa_user";

    /// Admin surface access token
    pub const ADMIN_ACCESS_TOKEN: &'static str = "rpa_admin_access_token";

    /// Admin surface profile (JSON)
    pub const ADMIN_PROFILE: &'static str = "rpa_admin_user";

    /// Client settings (JSON)
    pub const SETTINGS: &'static str = "rpa_settings";
}

/// The keys one surface's token store reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenKeys {
    pub token: &'static str,
    pub profile: &'static str,
    /// Surfaces without refresh support have no refresh key.
    pub refresh: Option<&'static str>,
}

impl TokenKeys {
    pub const fn user() -> Self {
        Self {
            token: StorageKeys::USER_ACCESS_TOKEN,
            profile: StorageKeys::USER_PROFILE,
            refresh: Some(StorageKeys::USER_REFRESH_TOKEN),
        }
    }

    pub const fn admin() -> Self {
        Self {
            token: StorageKeys::ADMIN_ACCESS_TOKEN,
            profile: StorageKeys::ADMIN_PROFILE,
            refresh: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_storage_keys_are_unique() {
        let keys = [
            StorageKeys::USER_ACCESS_TOKEN,
            StorageKeys::USER_REFRESH_TOKEN,
            StorageKeys::USER_PROFILE,
            StorageKeys::ADMIN_ACCESS_TOKEN,
            StorageKeys::ADMIN_PROFILE,
            StorageKeys::SETTINGS,
        ];
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len(), "Storage keys must be unique");
    }

    #[test]
    fn test_surfaces_do_not_share_keys() {
        let user = TokenKeys::user();
        let admin = TokenKeys::admin();
        assert_ne!(user.token, admin.token);
        assert_ne!(user.profile, admin.profile);
        assert!(admin.refresh.is_none());
    }
}
