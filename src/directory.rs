// src/directory.rs
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::Account;
use std::future::Future;
use std::sync::Arc;

pub trait AccountDirectory: Send + Sync {
    fn fetch_accounts(
        &self,
        identity_id: i64,
    ) -> impl Future<Output = Result<Vec<Account>, ApiError>> + Send;

    fn create_account(
        &self,
        identity_id: i64,
        name: &str,
    ) -> impl Future<Output = Result<Account, ApiError>> + Send;
}

impl AccountDirectory for ApiClient {
    async fn fetch_accounts(&self, identity_id: i64) -> Result<Vec<Account>, ApiError> {
        self.list_accounts(identity_id).await
    }

    async fn create_account(&self, identity_id: i64, name: &str) -> Result<Account, ApiError> {
        ApiClient::create_account(self, identity_id, name).await
    }
}

impl<D: AccountDirectory> AccountDirectory for Arc<D> {
    fn fetch_accounts(
        &self,
        identity_id: i64,
    ) -> impl Future<Output = Result<Vec<Account>, ApiError>> + Send {
        (**self).fetch_accounts(identity_id)
    }

    fn create_account(
        &self,
        identity_id: i64,
        name: &str,
    ) -> impl Future<Output = Result<Account, ApiError>> + Send {
        (**self).create_account(identity_id, name)
    }
}
