/// User profiles and partner linking.
use serde::{Deserialize, Serialize};

/// Shown when a linked partner has not set a display name.
pub const DEFAULT_PARTNER_NAME: &str = "Your Partner";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nicknames: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hobby: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
}

impl UserProfile {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: None,
            username: None,
            nicknames: None,
            hobby: None,
            phone_number: None,
            description: None,
            partner_id: None,
        }
    }

    /// Display name for headings, falling back to the uid.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.uid)
    }

    /// Display name when shown as someone's partner.
    pub fn partner_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(DEFAULT_PARTNER_NAME)
    }

    /// Merge an update into this profile.
    ///
    /// Fields left as `None` in the update are kept; `Some("")` clears the field.
    pub fn apply(&mut self, update: ProfileUpdate) {
        merge_field(&mut self.display_name, update.display_name);
        merge_field(&mut self.username, update.username);
        merge_field(&mut self.nicknames, update.nicknames);
        merge_field(&mut self.hobby, update.hobby);
        merge_field(&mut self.phone_number, update.phone_number);
        merge_field(&mut self.description, update.description);
        merge_field(&mut self.partner_id, update.partner_id);
    }
}

/// Partial profile edit; only the provided fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub nicknames: Option<String>,
    pub hobby: Option<String>,
    pub phone_number: Option<String>,
    pub description: Option<String>,
    pub partner_id: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn merge_field(field: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        let trimmed = value.trim();
        *field = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_unspecified_fields() {
        let mut profile = UserProfile::new("alice", "alice@example.org");
        profile.hobby = Some("climbing".to_string());

        profile.apply(ProfileUpdate {
            display_name: Some("Alice".to_string()),
            ..Default::default()
        });

        assert_eq!(profile.display_name.as_deref(), Some("Alice"));
        assert_eq!(profile.hobby.as_deref(), Some("climbing"));
    }

    #[test]
    fn test_apply_empty_string_clears() {
        let mut profile = UserProfile::new("alice", "alice@example.org");
        profile.partner_id = Some("bob".to_string());

        profile.apply(ProfileUpdate {
            partner_id: Some("  ".to_string()),
            ..Default::default()
        });

        assert!(profile.partner_id.is_none());
    }

    #[test]
    fn test_partner_name_fallback() {
        let mut profile = UserProfile::new("bob", "bob@example.org");
        assert_eq!(profile.partner_name(), "Your Partner");
        assert_eq!(profile.name(), "bob");

        profile.display_name = Some("Bob".to_string());
        assert_eq!(profile.partner_name(), "Bob");
        assert_eq!(profile.name(), "Bob");
    }

    #[test]
    fn test_update_is_empty() {
        assert!(ProfileUpdate::default().is_empty());
        assert!(!ProfileUpdate {
            hobby: Some("chess".to_string()),
            ..Default::default()
        }
        .is_empty());
    }
}
