//! In-memory session holder.
//!
//! # Design
//! The session is owned here and only read by the request pipeline, through
//! the closure returned by `access_token_finder`. `SessionStore` is a cheap
//! cloneable handle, so the UI can sign in and out while handlers built
//! earlier keep observing the current state.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::api_v1::handler::AccessTokenFinder;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub api_key: String,
    pub user: UserData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(AuthenticatedUser),
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            Session::Authenticated(user) => Some(&user.api_key),
            Session::Anonymous => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    session: Arc<RwLock<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Session {
        self.read(Session::clone)
    }

    pub fn is_logged_in(&self) -> bool {
        self.read(Session::is_logged_in)
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(|session| session.api_key().map(str::to_string))
    }

    pub fn sign_in(&self, user: AuthenticatedUser) {
        tracing::info!(username = %user.user.username, "signed in");
        self.write(Session::Authenticated(user));
    }

    pub fn sign_out(&self) {
        tracing::info!("signed out");
        self.write(Session::Anonymous);
    }

    /// Token lookup for `HttpApiV1RequestHandler`, evaluated per request.
    pub fn access_token_finder(&self) -> AccessTokenFinder {
        let store = self.clone();
        Arc::new(move || store.access_token())
    }

    fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        match self.session.read() {
            Ok(session) => f(&session),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn write(&self, session: Session) {
        match self.session.write() {
            Ok(mut current) => *current = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linus() -> AuthenticatedUser {
        AuthenticatedUser {
            api_key: "foo".to_string(),
            user: UserData {
                id: "foo".to_string(),
                username: "Linus".to_string(),
            },
        }
    }

    #[test]
    fn starts_anonymous() {
        let store = SessionStore::new();
        assert_eq!(store.current(), Session::Anonymous);
        assert!(!store.is_logged_in());
        assert!(store.access_token().is_none());
    }

    #[test]
    fn finder_follows_sign_in_and_out() {
        let store = SessionStore::new();
        let finder = store.access_token_finder();
        assert_eq!(finder(), None);

        store.sign_in(linus());
        assert!(store.is_logged_in());
        assert_eq!(finder(), Some("foo".to_string()));

        store.sign_out();
        assert_eq!(finder(), None);
    }

    #[test]
    fn authenticated_user_uses_camel_case() {
        let json = serde_json::to_value(linus()).unwrap();
        assert_eq!(json["apiKey"], "foo");
        assert_eq!(json["user"]["username"], "Linus");
    }
}
