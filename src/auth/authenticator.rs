use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::error::AuthError;
use crate::models::user::User;

use super::password::verify_password;
use crate::utils::auth::constant_time_eq;

/// User lookup and mutation operations the authenticator depends on.
///
/// Kept synchronous since the backing store is an embedded database
/// with sub-millisecond queries.
pub trait UserRepository: Send + Sync {
    fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Atomically set the hardware id if no value is bound yet.
    /// Returns true when this call performed the bind.
    fn bind_hwid_if_unset(&self, user_id: i64, hwid: &str) -> anyhow::Result<bool>;

    fn touch_last_login(&self, user_id: i64) -> anyhow::Result<()>;
}

impl<T: UserRepository + ?Sized> UserRepository for Arc<T> {
    fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        (**self).find_by_email(email)
    }

    fn bind_hwid_if_unset(&self, user_id: i64, hwid: &str) -> anyhow::Result<bool> {
        (**self).bind_hwid_if_unset(user_id, hwid)
    }

    fn touch_last_login(&self, user_id: i64) -> anyhow::Result<()> {
        (**self).touch_last_login(user_id)
    }
}

/// Credential and device checks for login, in a fixed order so the
/// reported failure is always the first check that did not pass.
pub struct Authenticator<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> Authenticator<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Run the full login procedure and return the authenticated user.
    ///
    /// `hwid` is the caller's device fingerprint. When absent the device
    /// check is skipped entirely. When present and the account has no
    /// bound device yet, this login binds it.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        hwid: Option<&str>,
    ) -> Result<User, AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::EmailRequired);
        }
        if password.is_empty() {
            return Err(AuthError::PasswordRequired);
        }

        let normalized = email.trim().to_lowercase();
        let mut user = self
            .repo
            .find_by_email(&normalized)
            .map_err(AuthError::Internal)?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        let password_ok =
            verify_password(password, &user.password_hash).map_err(AuthError::Internal)?;
        if !password_ok {
            debug!(user_id = user.id, "password mismatch");
            return Err(AuthError::InvalidPassword);
        }

        if let Some(hwid) = hwid.map(str::trim).filter(|h| !h.is_empty()) {
            self.check_or_bind_hwid(&mut user, hwid)?;
        }

        if let Err(e) = self.repo.touch_last_login(user.id) {
            warn!(user_id = user.id, error = %e, "failed to record last login");
        }

        info!(user_id = user.id, "login succeeded");
        Ok(user)
    }

    fn check_or_bind_hwid(&self, user: &mut User, hwid: &str) -> Result<(), AuthError> {
        if !user.hwid_bound() {
            if self
                .repo
                .bind_hwid_if_unset(user.id, hwid)
                .map_err(AuthError::Internal)?
            {
                info!(user_id = user.id, "bound hardware id on first login");
                user.hwid = Some(hwid.to_string());
                return Ok(());
            }

            // Lost the race against a concurrent first login. Re-read
            // and fall through to the equality check.
            *user = self
                .repo
                .find_by_email(&user.email)
                .map_err(AuthError::Internal)?
                .ok_or(AuthError::UserNotFound)?;
        }

        match user.hwid.as_deref() {
            Some(bound) if constant_time_eq(bound.as_bytes(), hwid.as_bytes()) => Ok(()),
            _ => {
                warn!(user_id = user.id, "hardware id mismatch");
                Err(AuthError::HwidMismatch)
            }
        }
    }
}
