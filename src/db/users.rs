use anyhow::Context;
use rusqlite::{params, OptionalExtension, Row};

use crate::auth::authenticator::UserRepository;
use crate::models::user::User;
use crate::utils::time::now_rfc3339;

use super::Store;

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        hwid: row.get("hwid")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
        last_login: row.get("last_login")?,
    })
}

impl Store {
    pub fn create_user(&self, email: &str, password_hash: &str) -> anyhow::Result<User> {
        let now = now_rfc3339();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (email, password_hash, is_active, created_at) VALUES (?1, ?2, 1, ?3)",
            params![email, password_hash, now],
        )
        .with_context(|| format!("failed to insert user {email}"))?;

        Ok(User {
            id: conn.last_insert_rowid(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            hwid: None,
            is_active: true,
            created_at: now,
            last_login: None,
        })
    }

    pub fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.conn()
            .query_row(
                "SELECT * FROM users WHERE email = ?1",
                params![email],
                user_from_row,
            )
            .optional()
            .context("user lookup by email failed")
    }

    pub fn find_user_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        self.conn()
            .query_row(
                "SELECT * FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()
            .context("user lookup by id failed")
    }

    pub fn set_password_hash(&self, user_id: i64, password_hash: &str) -> anyhow::Result<()> {
        let updated = self.conn().execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, user_id],
        )?;
        anyhow::ensure!(updated == 1, "no user with id {user_id}");
        Ok(())
    }
}

impl UserRepository for Store {
    fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.find_user_by_email(email)
    }

    fn bind_hwid_if_unset(&self, user_id: i64, hwid: &str) -> anyhow::Result<bool> {
        // Single UPDATE so concurrent first logins cannot both win.
        let updated = self.conn().execute(
            "UPDATE users SET hwid = ?1 WHERE id = ?2 AND (hwid IS NULL OR hwid = '')",
            params![hwid, user_id],
        )?;
        Ok(updated == 1)
    }

    fn touch_last_login(&self, user_id: i64) -> anyhow::Result<()> {
        self.conn().execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![now_rfc3339(), user_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_create_and_find_user() {
        let store = Store::open_in_memory().unwrap();
        let created = store.create_user("alice@example.com", "$argon2id$x").unwrap();

        let found = store
            .find_user_by_email("alice@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert!(found.is_active);
        assert!(found.hwid.is_none());

        assert!(store.find_user_by_email("bob@example.com").unwrap().is_none());
        assert!(store.find_user_by_id(created.id).unwrap().is_some());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = Store::open_in_memory().unwrap();
        store.create_user("alice@example.com", "h").unwrap();
        assert!(store.create_user("alice@example.com", "h").is_err());
    }

    #[test]
    fn test_bind_hwid_only_once() {
        let store = Store::open_in_memory().unwrap();
        let user = store.create_user("alice@example.com", "h").unwrap();

        assert!(store.bind_hwid_if_unset(user.id, "machine-a").unwrap());
        assert!(!store.bind_hwid_if_unset(user.id, "machine-b").unwrap());

        let reread = store.find_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(reread.hwid.as_deref(), Some("machine-a"));
    }

    #[test]
    fn test_bind_hwid_treats_empty_string_as_unset() {
        let store = Store::open_in_memory().unwrap();
        let user = store.create_user("alice@example.com", "h").unwrap();
        store
            .conn()
            .execute("UPDATE users SET hwid = '' WHERE id = ?1", params![user.id])
            .unwrap();

        assert!(store.bind_hwid_if_unset(user.id, "machine-a").unwrap());
    }

    #[test]
    fn test_concurrent_binds_have_one_winner() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let user = store.create_user("alice@example.com", "h").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.bind_hwid_if_unset(user.id, &format!("machine-{i}")).unwrap()
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_touch_last_login() {
        let store = Store::open_in_memory().unwrap();
        let user = store.create_user("alice@example.com", "h").unwrap();
        assert!(user.last_login.is_none());

        store.touch_last_login(user.id).unwrap();
        let reread = store.find_user_by_id(user.id).unwrap().unwrap();
        assert!(reread.last_login.is_some());
    }

    #[test]
    fn test_set_password_hash() {
        let store = Store::open_in_memory().unwrap();
        let user = store.create_user("alice@example.com", "old").unwrap();
        store.set_password_hash(user.id, "new").unwrap();

        let reread = store.find_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(reread.password_hash, "new");

        assert!(store.set_password_hash(999, "x").is_err());
    }
}
