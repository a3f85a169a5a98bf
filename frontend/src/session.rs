use serde::{Deserialize, Serialize};

use crate::structs::Identity;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub token: String,
}

impl Session {
    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Where a session survives page reloads.
pub trait SessionStorage {
    fn load(&self) -> Option<Session>;
    fn save(&mut self, session: &Session);
    fn remove(&mut self);
}

/// The one session a client holds, passed to whatever needs to make
/// authenticated calls.
pub struct ClientSession<S: SessionStorage> {
    current: Option<Session>,
    storage: S,
}

impl<S: SessionStorage> ClientSession<S> {
    /// Picks up a session persisted by an earlier page load, if any.
    pub fn restore(storage: S) -> Self {
        Self {
            current: storage.load(),
            storage,
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.current.as_ref().map(|s| &s.identity)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    /// Replaces any session already held.
    pub fn establish(&mut self, identity: Identity, token: String) -> &Session {
        let session = Session { identity, token };
        self.storage.save(&session);
        self.current.insert(session)
    }

    /// Logout, or the server no longer accepting the token.
    pub fn clear(&mut self) {
        self.current = None;
        self.storage.remove();
    }
}

/// Keeps nothing beyond the current process.
#[derive(Default, Debug)]
pub struct MemoryStorage {
    pub saved: Option<Session>,
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Option<Session> {
        self.saved.clone()
    }

    fn save(&mut self, session: &Session) {
        self.saved = Some(session.clone());
    }

    fn remove(&mut self) {
        self.saved = None;
    }
}
