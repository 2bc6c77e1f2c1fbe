//! Current-user providers

use crate::store::CurrentUserProvider;
use relimport_core::User;

pub const ENV_USER: &str = "RELIMPORT_USER";
pub const ENV_USER_UID: &str = "RELIMPORT_USER_UID";

/// Always reports the same user (or none)
#[derive(Debug, Clone, Default)]
pub struct StaticUserProvider {
    user: Option<User>,
}

impl StaticUserProvider {
    pub fn new(user: User) -> Self {
        Self { user: Some(user) }
    }

    /// A session without a logged-in user
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl CurrentUserProvider for StaticUserProvider {
    fn current_user(&self) -> Option<User> {
        self.user.clone()
    }
}

/// Reads the session user from `RELIMPORT_USER` / `RELIMPORT_USER_UID`
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvUserProvider;

impl CurrentUserProvider for EnvUserProvider {
    fn current_user(&self) -> Option<User> {
        let username = std::env::var(ENV_USER).ok().filter(|u| !u.trim().is_empty())?;
        let user = User::new(username.trim());

        match std::env::var(ENV_USER_UID).ok().filter(|u| !u.trim().is_empty()) {
            Some(uid) => Some(user.with_uid(uid.trim())),
            None => Some(user),
        }
    }
}
