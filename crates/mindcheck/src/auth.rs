use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;
use crate::live::{LiveFeed, Subscription};

/// Identifier issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: UserId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: UserId::new(uid),
            display_name: None,
            email: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub identity: Identity,
    #[serde(default)]
    pub role: Role,
}

/// User documents kept alongside the identity provider.
pub trait UserDirectory: Send + Sync {
    fn upsert(&self, profile: UserProfile) -> Result<(), RepositoryError>;
    fn role(&self, uid: &UserId) -> Result<Option<Role>, RepositoryError>;
    fn count(&self) -> Result<usize, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("user '{0}' is not an administrator")]
    NotAdmin(UserId),
    #[error(transparent)]
    Directory(#[from] RepositoryError),
}

/// Unknown users and members are both refused.
pub fn require_admin<D>(directory: &D, uid: &UserId) -> Result<(), AuthError>
where
    D: UserDirectory + ?Sized,
{
    match directory.role(uid)? {
        Some(Role::Admin) => Ok(()),
        _ => Err(AuthError::NotAdmin(uid.clone())),
    }
}

/// Signed-in identity with auth-state-changed notifications.
#[derive(Clone)]
pub struct AuthState {
    feed: LiveFeed<Option<Identity>>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthState {
    pub fn new() -> Self {
        let feed = LiveFeed::new();
        feed.publish(None);
        Self { feed }
    }

    pub fn current(&self) -> Option<Identity> {
        self.feed.latest().flatten()
    }

    pub fn sign_in(&self, identity: Identity) {
        self.feed.publish(Some(identity));
    }

    pub fn sign_out(&self) {
        self.feed.publish(None);
    }

    /// `listener` runs immediately with the current state, then on every change.
    pub fn watch<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&Option<Identity>) + Send + 'static,
    {
        self.feed.subscribe(listener, |_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Directory {
        roles: Mutex<HashMap<UserId, Role>>,
    }

    impl UserDirectory for Directory {
        fn upsert(&self, profile: UserProfile) -> Result<(), RepositoryError> {
            self.roles
                .lock()
                .expect("directory mutex poisoned")
                .insert(profile.identity.uid, profile.role);
            Ok(())
        }

        fn role(&self, uid: &UserId) -> Result<Option<Role>, RepositoryError> {
            Ok(self
                .roles
                .lock()
                .expect("directory mutex poisoned")
                .get(uid)
                .copied())
        }

        fn count(&self) -> Result<usize, RepositoryError> {
            Ok(self.roles.lock().expect("directory mutex poisoned").len())
        }
    }

    #[test]
    fn only_admins_pass_the_gate() {
        let directory = Directory::default();
        directory
            .upsert(UserProfile {
                identity: Identity::new("admin-1"),
                role: Role::Admin,
            })
            .expect("upsert");
        directory
            .upsert(UserProfile {
                identity: Identity::new("member-1"),
                role: Role::Member,
            })
            .expect("upsert");

        assert!(require_admin(&directory, &UserId::new("admin-1")).is_ok());
        assert!(matches!(
            require_admin(&directory, &UserId::new("member-1")),
            Err(AuthError::NotAdmin(_))
        ));
        assert!(matches!(
            require_admin(&directory, &UserId::new("stranger")),
            Err(AuthError::NotAdmin(_))
        ));
    }

    #[test]
    fn watch_reports_current_state_then_changes() {
        let auth = AuthState::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let subscription = auth.watch(move |identity| {
            sink.lock()
                .expect("seen mutex poisoned")
                .push(identity.as_ref().map(|identity| identity.uid.0.clone()))
        });
        auth.sign_in(Identity::new("u-1").with_display_name("Asha"));
        auth.sign_out();
        subscription.cancel();
        auth.sign_in(Identity::new("u-2"));

        assert_eq!(
            *seen.lock().expect("seen mutex poisoned"),
            vec![None, Some("u-1".to_string()), None]
        );
        assert_eq!(auth.current().map(|identity| identity.uid), Some(UserId::new("u-2")));
    }
}
