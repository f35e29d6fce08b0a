// src/context.rs
use crate::directory::AccountDirectory;
use crate::error::ApiError;
use crate::models::{Account, Identity};
use crate::selection::AccountSelection;
use crate::session::SessionState;
use crate::storage::KeyValueStore;
use log::{debug, error, info};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccountSnapshot {
    pub accounts: Vec<Account>,
    pub selected_id: Option<i64>,
    pub loading: bool,
}

impl AccountSnapshot {
    pub fn selected_account(&self) -> Option<&Account> {
        let id = self.selected_id?;
        self.accounts.iter().find(|a| a.id == id)
    }
}

#[derive(Debug)]
pub enum LoadOutcome {
    Applied,
    Stale,
    Failed(ApiError),
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied)
    }
}

struct Inner<S> {
    selection: AccountSelection<S>,
    identity_id: Option<i64>,
    generation: u64,
    loading: bool,
}

/// Keeps an [`AccountSelection`] in sync with the remote directory.
///
/// Each fetch takes a ticket from a generation counter. A result is applied
/// only if its ticket is still the latest when it arrives, so an older
/// response can never overwrite a newer one.
pub struct AccountContext<D, S> {
    directory: D,
    inner: Mutex<Inner<S>>,
    tx: watch::Sender<AccountSnapshot>,
}

impl<D: AccountDirectory, S: KeyValueStore> AccountContext<D, S> {
    pub fn new(directory: D, store: S) -> Self {
        let (tx, _) = watch::channel(AccountSnapshot::default());
        AccountContext {
            directory,
            inner: Mutex::new(Inner {
                selection: AccountSelection::new(store),
                identity_id: None,
                generation: 0,
                loading: false,
            }),
            tx,
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn subscribe(&self) -> watch::Receiver<AccountSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        self.tx.borrow().clone()
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.lock().selection.selected_id()
    }

    pub fn selected_account(&self) -> Option<Account> {
        self.lock().selection.selected_account().cloned()
    }

    /// Loads the accounts of `identity`. Without an identity the list,
    /// the selection and the persisted selection key are all cleared.
    pub async fn load(&self, identity: Option<&Identity>) -> LoadOutcome {
        match identity {
            Some(identity) => self.load_for(identity.id).await,
            None => {
                let mut inner = self.lock();
                inner.generation += 1;
                inner.identity_id = None;
                inner.loading = false;
                inner.selection.on_accounts_loaded(Vec::new());
                self.publish(&inner);
                LoadOutcome::Applied
            }
        }
    }

    pub async fn refresh(&self) -> LoadOutcome {
        let identity_id = self.lock().identity_id;
        match identity_id {
            Some(id) => self.load_for(id).await,
            None => self.load(None).await,
        }
    }

    pub fn cancel_pending(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        if inner.loading {
            debug!("Cancelled pending account load.");
            inner.loading = false;
            self.publish(&inner);
        }
    }

    pub fn select(&self, account_id: Option<i64>) {
        let mut inner = self.lock();
        inner.selection.select(account_id);
        self.publish(&inner);
    }

    pub async fn create_account(&self, identity: &Identity, name: &str) -> Result<Account, ApiError> {
        let account = self.directory.create_account(identity.id, name).await?;
        if let LoadOutcome::Failed(e) = self.load_for(identity.id).await {
            error!("Account {} created but reload failed: {}", account.id, e);
        }
        Ok(account)
    }

    /// Reloads whenever the session changes, until the session store goes
    /// away. A session change while a fetch is in flight abandons that fetch.
    pub async fn follow(&self, mut session: watch::Receiver<SessionState>) {
        loop {
            let identity = session.borrow_and_update().identity().cloned();
            let interrupted = tokio::select! {
                _ = self.load(identity.as_ref()) => None,
                changed = session.changed() => Some(changed),
            };
            let changed = match interrupted {
                Some(changed) => {
                    self.cancel_pending();
                    changed
                }
                None => session.changed().await,
            };
            if changed.is_err() {
                break;
            }
        }
        debug!("Session closed; account context stopped following.");
    }

    async fn load_for(&self, identity_id: i64) -> LoadOutcome {
        let ticket = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.identity_id = Some(identity_id);
            inner.loading = true;
            self.publish(&inner);
            inner.generation
        };

        let result = self.directory.fetch_accounts(identity_id).await;

        let mut inner = self.lock();
        if inner.generation != ticket {
            debug!(
                "Discarding stale account list for user {} (fetch {}, latest {}).",
                identity_id, ticket, inner.generation
            );
            return LoadOutcome::Stale;
        }
        inner.loading = false;
        match result {
            Ok(accounts) => {
                info!("Loaded {} accounts for user {}.", accounts.len(), identity_id);
                inner.selection.on_accounts_loaded(accounts);
                self.publish(&inner);
                LoadOutcome::Applied
            }
            Err(e) => {
                error!("Failed to load accounts for user {}: {}", identity_id, e);
                inner.selection.reset();
                self.publish(&inner);
                LoadOutcome::Failed(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, inner: &Inner<S>) {
        self.tx.send_replace(AccountSnapshot {
            accounts: inner.selection.accounts().to_vec(),
            selected_id: inner.selection.selected_id(),
            loading: inner.loading,
        });
    }
}
