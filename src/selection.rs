// src/selection.rs
use crate::models::Account;
use crate::storage::{KeyValueStore, SELECTED_ACCOUNT_KEY};
use log::{debug, warn};

/// After every operation the selected id is either `None` or the id of an
/// account in [`accounts`](Self::accounts). Storage problems are logged and
/// otherwise ignored.
pub struct AccountSelection<S> {
    store: S,
    accounts: Vec<Account>,
    selected: Option<i64>,
}

impl<S: KeyValueStore> AccountSelection<S> {
    pub fn new(store: S) -> Self {
        AccountSelection {
            store,
            accounts: Vec::new(),
            selected: None,
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.selected
    }

    pub fn selected_account(&self) -> Option<&Account> {
        let id = self.selected?;
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Reconciles the selection against a freshly fetched list. Must run
    /// for every new list, not only the first.
    pub fn on_accounts_loaded(&mut self, accounts: Vec<Account>) {
        self.accounts = accounts;

        let Some(first) = self.accounts.first().map(|a| a.id) else {
            self.selected = None;
            self.forget();
            return;
        };

        match self.persisted_id() {
            Some(saved) if self.contains(saved) => {
                debug!("Restored selected account {}.", saved);
                self.selected = Some(saved);
            }
            _ => {
                debug!("Defaulting selection to first account {}.", first);
                self.selected = Some(first);
                self.remember(first);
            }
        }
    }

    pub fn select(&mut self, account_id: Option<i64>) {
        match account_id {
            None => {
                self.selected = None;
                self.forget();
            }
            Some(id) if self.contains(id) => {
                self.selected = Some(id);
                self.remember(id);
            }
            Some(id) => debug!("Ignoring selection of unknown account {}.", id),
        }
    }

    /// Drops the in-memory list and selection, leaving the persisted key
    /// alone so a later successful load can restore it.
    pub fn reset(&mut self) {
        self.accounts.clear();
        self.selected = None;
    }

    fn contains(&self, id: i64) -> bool {
        self.accounts.iter().any(|a| a.id == id)
    }

    fn persisted_id(&self) -> Option<i64> {
        match self.store.get(SELECTED_ACCOUNT_KEY) {
            Ok(Some(raw)) => match raw.trim().parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!("Ignoring malformed persisted account id {:?}.", raw);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read persisted account selection: {}", e);
                None
            }
        }
    }

    fn remember(&self, id: i64) {
        if let Err(e) = self.store.set(SELECTED_ACCOUNT_KEY, &id.to_string()) {
            warn!("Failed to persist account selection {}: {}", id, e);
        }
    }

    fn forget(&self) {
        if let Err(e) = self.store.remove(SELECTED_ACCOUNT_KEY) {
            warn!("Failed to clear persisted account selection: {}", e);
        }
    }
}
