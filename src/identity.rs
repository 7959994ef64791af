//! Current-user identity.
//!
//! Identity is owned by the platform's auth API; this module only shapes the
//! returned profile for the UI. The display name falls back from the
//! profile's preferred name to the email local part to "Anonymous".

use uuid::Uuid;

use crate::backend::models::UserProfile;

/// The identity the UI acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// Stable user identifier.
    pub id: Uuid,
    /// Display name shown in headers, messages and presence.
    pub username: String,
}

impl CurrentUser {
    /// Build the UI identity from an auth profile.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            username: derive_username(profile),
        }
    }
}

/// Display-name fallback chain: preferred name, email local part, Anonymous.
#[must_use]
pub fn derive_username(profile: &UserProfile) -> String {
    if let Some(name) = profile
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        return name.to_string();
    }
    if let Some(email) = profile.email.as_deref() {
        if let Some(local) = email.split('@').next().filter(|l| !l.is_empty()) {
            return local.to_string();
        }
    }
    "Anonymous".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(email: Option<&str>, display_name: Option<&str>) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            email: email.map(ToString::to_string),
            display_name: display_name.map(ToString::to_string),
        }
    }

    #[test]
    fn prefers_display_name() {
        let p = profile(Some("ada@example.com"), Some("Ada Lovelace"));
        assert_eq!(derive_username(&p), "Ada Lovelace");
    }

    #[test]
    fn falls_back_to_email_local_part() {
        let p = profile(Some("ada@example.com"), None);
        assert_eq!(derive_username(&p), "ada");

        let blank = profile(Some("grace@example.com"), Some("   "));
        assert_eq!(derive_username(&blank), "grace");
    }

    #[test]
    fn anonymous_when_nothing_usable() {
        let p = profile(None, None);
        assert_eq!(derive_username(&p), "Anonymous");

        let odd = profile(Some("@example.com"), None);
        assert_eq!(derive_username(&odd), "Anonymous");
    }
}
