//! Session-scoped authentication.
//!
//! `SessionAuthenticator` is the only writer of the current identity and of
//! the `currentUser` tab storage entry. Everything else reads through
//! [`SessionView`].

use crate::notify::Notifier;
use crate::roster::{self, Identity, Role};
use crate::storage::TabStorage;
use tracing::{debug, info, warn};

pub const SESSION_KEY: &str = "currentUser";

pub struct SessionAuthenticator {
    storage: Box<dyn TabStorage>,
    current: Option<Identity>,
}

/// Read-only view handed to routing and record handlers.
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    identity: Option<&'a Identity>,
}

impl<'a> SessionView<'a> {
    #[cfg(test)]
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    #[cfg(test)]
    pub fn of(identity: &'a Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&'a Identity> {
        self.identity
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.map(|i| i.role)
    }
}

/// Storage failures are logged and otherwise ignored; the in-memory session
/// stays authoritative for this process.
fn persist(storage: &mut dyn TabStorage, identity: &Identity) {
    match serde_json::to_string(identity) {
        Ok(raw) => {
            if let Err(e) = storage.set_item(SESSION_KEY, &raw) {
                warn!(target: "campusd::session", error = %e, "failed to persist session");
            }
        }
        Err(e) => warn!(target: "campusd::session", error = %e, "failed to encode session"),
    }
}

impl SessionAuthenticator {
    pub fn new(storage: Box<dyn TabStorage>) -> Self {
        Self {
            storage,
            current: None,
        }
    }

    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            identity: self.current.as_ref(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_identity(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    /// Exact, case-sensitive match against the roster. A miss leaves the
    /// current session untouched and does not say which field was wrong.
    pub fn authenticate(&mut self, username: &str, password: &str, notices: &mut Notifier) -> bool {
        let Some(identity) = roster::find_by_credentials(username, password) else {
            info!(target: "campusd::session", "login rejected");
            notices.destructive("Login failed", "Invalid username or password");
            return false;
        };

        persist(self.storage.as_mut(), &identity);

        info!(
            target: "campusd::session",
            user = %identity.username,
            role = identity.role.as_str(),
            "login accepted"
        );
        notices.info(
            "Login successful",
            format!("Welcome back, {}!", identity.full_name),
        );
        self.current = Some(identity);
        true
    }

    pub fn end_session(&mut self, notices: &mut Notifier) {
        if let Some(prev) = self.current.take() {
            info!(target: "campusd::session", user = %prev.username, "logout");
        }
        if let Err(e) = self.storage.remove_item(SESSION_KEY) {
            warn!(target: "campusd::session", error = %e, "failed to clear persisted session");
        }
        notices.info("Logged out", "You have been logged out successfully");
    }

    /// Reload the persisted identity. Missing, unparseable or unknown entries
    /// all leave the session absent; unknown ones are also dropped from storage.
    pub fn restore_from_storage(&mut self) {
        let raw = match self.storage.get_item(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                warn!(target: "campusd::session", error = %e, "failed to read persisted session");
                return;
            }
        };

        let identity: Identity = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                debug!(target: "campusd::session", error = %e, "ignoring unparseable session entry");
                return;
            }
        };

        if !roster::is_known(&identity) {
            warn!(
                target: "campusd::session",
                user = %identity.username,
                "persisted session does not match roster; discarding"
            );
            if let Err(e) = self.storage.remove_item(SESSION_KEY) {
                warn!(target: "campusd::session", error = %e, "failed to clear persisted session");
            }
            return;
        }

        info!(target: "campusd::session", user = %identity.username, "session restored");
        self.current = Some(identity);
    }

    /// Move to new backing storage, then restore from it. A live identity is
    /// carried over when the new storage holds no session entry; an existing
    /// entry wins and is re-validated like any restore.
    pub fn rebind_storage(&mut self, storage: Box<dyn TabStorage>) {
        self.storage = storage;
        let stored = match self.storage.get_item(SESSION_KEY) {
            Ok(v) => v.is_some(),
            Err(e) => {
                warn!(target: "campusd::session", error = %e, "failed to read persisted session");
                false
            }
        };

        if stored {
            self.current = None;
            self.restore_from_storage();
            return;
        }

        if let Some(identity) = &self.current {
            persist(self.storage.as_mut(), identity);
            debug!(target: "campusd::session", user = %identity.username, "session carried to new storage");
        }
    }

    /// The tab went away: storage is wiped and the identity dropped, silently.
    pub fn end_tab(&mut self) {
        self.current = None;
        if let Err(e) = self.storage.clear() {
            warn!(target: "campusd::session", error = %e, "failed to clear tab storage");
        }
    }
}
