use crate::models::tag::{Group, Tag};
use serde::{Deserialize, Serialize};

/// Browser profile with its groups and tags resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub platform: Option<String>,
    pub note: Option<String>,
    pub proxy: Option<String>,
    pub status: String,
    pub shared_on_cloud: bool,
    pub created_at: String,
    pub updated_at: String,
    pub last_started_at: Option<String>,
    pub groups: Vec<Group>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileCreate {
    pub name: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update, None fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub platform: Option<String>,
    pub note: Option<String>,
    pub proxy: Option<String>,
    pub status: Option<String>,
    pub shared_on_cloud: Option<bool>,
    pub groups: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults_to_empty_lists() {
        let parsed: ProfileCreate = serde_json::from_str(r#"{"name": "work"}"#).unwrap();
        assert_eq!(parsed.name, "work");
        assert!(parsed.groups.is_empty());
        assert!(parsed.tags.is_empty());
    }

    #[test]
    fn test_update_distinguishes_missing_fields() {
        let parsed: ProfileUpdate =
            serde_json::from_str(r#"{"status": "Running"}"#).unwrap();
        assert_eq!(parsed.status.as_deref(), Some("Running"));
        assert!(parsed.name.is_none());
        assert!(parsed.tags.is_none());
    }
}
