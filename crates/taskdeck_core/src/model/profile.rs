//! User profile and theme preference.

use serde::{Deserialize, Serialize};

/// Two-valued UI theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Parses a stored theme string. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Profile document stored next to the authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Matches the identity provider uid.
    pub uid: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub theme: Theme,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl UserProfile {
    /// Builds the default profile for a fresh account.
    pub fn new(
        uid: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        phone: Option<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            name: name.into(),
            phone,
            is_premium: false,
            theme: Theme::Light,
            created_at: now_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Theme, UserProfile};

    #[test]
    fn theme_parse_and_toggle() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse(" light "), Some(Theme::Light));
        assert_eq!(Theme::parse("sepia"), None);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().as_str(), "light");
    }

    #[test]
    fn new_profile_is_free_tier_with_light_theme() {
        let profile = UserProfile::new("u1", "a@b.co", "Ada", None, 10);
        assert!(!profile.is_premium);
        assert_eq!(profile.theme, Theme::Light);

        let json = serde_json::to_value(&profile).expect("profile should serialize");
        assert_eq!(json["isPremium"], false);
        assert_eq!(json["theme"], "light");
        assert!(json.get("phone").is_none());
    }
}
