use serde::Serialize;

/// User row as stored locally. The password hash never leaves this type;
/// API responses use [`PublicUser`].
#[derive(Clone, Debug)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    /// Bound hardware ID. Unset until the first successful login that
    /// supplies one; written at most once per binding epoch.
    pub hwid: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl User {
    /// Whether a hardware ID is currently bound to this account.
    /// An empty string counts as unset.
    pub fn hwid_bound(&self) -> bool {
        self.hwid.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// Client-visible projection of a user record
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub created_at: String,
    pub last_login: Option<String>,
    pub is_active: bool,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at.clone(),
            last_login: user.last_login.clone(),
            is_active: user.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(hwid: Option<&str>) -> User {
        User {
            id: 1,
            email: "user@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            hwid: hwid.map(|h| h.to_string()),
            is_active: true,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            last_login: None,
        }
    }

    #[test]
    fn test_hwid_bound() {
        assert!(!sample_user(None).hwid_bound());
        assert!(!sample_user(Some("")).hwid_bound());
        assert!(sample_user(Some("ABC123")).hwid_bound());
    }

    #[test]
    fn test_public_user_omits_hash() {
        let user = sample_user(Some("ABC123"));
        let public = PublicUser::from(&user);
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("hwid"));
        assert!(json.contains("user@example.com"));
    }
}
