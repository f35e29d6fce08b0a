// src/session.rs
use crate::models::Identity;
use crate::storage::{KeyValueStore, AUTH_KEY};
use log::{info, warn};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            SessionState::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Holds the signed-in identity, mirrors it into durable storage and
/// publishes every transition to subscribers.
///
/// Storage failures never reach the caller: they are logged and the
/// in-process state still transitions.
pub struct SessionStore<S> {
    store: S,
    tx: watch::Sender<SessionState>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        let (tx, _) = watch::channel(SessionState::Anonymous);
        SessionStore { store, tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.tx.borrow().identity().cloned()
    }

    pub fn login(&self, identity: Identity) {
        self.persist(&identity);
        info!("User {} signed in.", identity.id);
        self.publish(SessionState::Authenticated(identity));
    }

    pub fn logout(&self) {
        if let Err(e) = self.store.remove(AUTH_KEY) {
            warn!("Failed to clear persisted session: {}", e);
        }
        if self.tx.borrow().is_authenticated() {
            info!("User signed out.");
        }
        self.publish(SessionState::Anonymous);
    }

    /// Loads a previously persisted identity. Does nothing once a user is
    /// already signed in.
    pub fn restore(&self) -> SessionState {
        if self.tx.borrow().is_authenticated() {
            return self.current();
        }
        let restored = match self.store.get(AUTH_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Identity>(&raw) {
                Ok(identity) => {
                    info!("Restored session for user {}.", identity.id);
                    SessionState::Authenticated(identity)
                }
                Err(e) => {
                    warn!("Ignoring corrupt persisted session: {}", e);
                    SessionState::Anonymous
                }
            },
            Ok(None) => SessionState::Anonymous,
            Err(e) => {
                warn!("Failed to read persisted session: {}", e);
                SessionState::Anonymous
            }
        };
        self.publish(restored.clone());
        restored
    }

    pub fn update_name(&self, name: impl Into<String>) {
        let Some(mut identity) = self.identity() else {
            return;
        };
        identity.name = name.into();
        self.persist(&identity);
        info!("User {} renamed to {:?}.", identity.id, identity.name);
        self.publish(SessionState::Authenticated(identity));
    }

    fn persist(&self, identity: &Identity) {
        match serde_json::to_string(identity) {
            Ok(raw) => {
                if let Err(e) = self.store.set(AUTH_KEY, &raw) {
                    warn!("Failed to persist session for user {}: {}", identity.id, e);
                }
            }
            Err(e) => warn!("Failed to serialize session for user {}: {}", identity.id, e),
        }
    }

    fn publish(&self, next: SessionState) {
        self.tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }
}
