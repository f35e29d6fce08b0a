// src/api/accounts.rs
use super::ApiClient;
use crate::error::ApiError;
use crate::models::{Account, DashboardSummary, TradeRequest};
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountBody<'a> {
    user_id: i64,
    name: &'a str,
}

impl ApiClient {
    /// `GET /accounts?userId=` in the order the service returns them.
    ///
    /// A 2xx body that is not a JSON array is read as an empty list.
    pub async fn list_accounts(&self, user_id: i64) -> Result<Vec<Account>, ApiError> {
        let body: Value = self
            .send_json(self.get("/accounts").query(&[("userId", user_id)]))
            .await?;
        if !body.is_array() {
            warn!("Account list for user {} was not an array; treating as empty.", user_id);
            return Ok(Vec::new());
        }
        serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Any refusal from the service is reported as
    /// [`ApiError::CreationFailed`]; transport failures stay `Transport`.
    pub async fn create_account(&self, user_id: i64, name: &str) -> Result<Account, ApiError> {
        let request = self
            .post("/accounts")
            .json(&CreateAccountBody { user_id, name });
        match self.send_json::<Account>(request).await {
            Ok(account) => {
                info!("Created account {} for user {}.", account.id, user_id);
                Ok(account)
            }
            Err(ApiError::Server { status, message }) => {
                Err(ApiError::CreationFailed { status, message })
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_account(&self, account_id: i64) -> Result<Account, ApiError> {
        self.send_json(self.get(&format!("/accounts/{account_id}")))
            .await
    }

    pub async fn trade(&self, account_id: i64, trade: &TradeRequest) -> Result<Account, ApiError> {
        let account = self
            .send_json(self.post(&format!("/accounts/{account_id}/trade")).json(trade))
            .await?;
        info!(
            "Trade {:?} {} x{} on account {} accepted.",
            trade.action, trade.ticker, trade.shares, account_id
        );
        Ok(account)
    }

    pub async fn rename_account(&self, account_id: i64, name: &str) -> Result<Account, ApiError> {
        self.send_json(
            self.patch(&format!("/accounts/{account_id}/rename"))
                .query(&[("name", name)]),
        )
        .await
    }

    pub async fn delete_account(&self, account_id: i64) -> Result<(), ApiError> {
        self.send(self.delete(&format!("/accounts/{account_id}")))
            .await?;
        info!("Deleted account {}.", account_id);
        Ok(())
    }

    pub async fn dashboard(&self, user_id: i64) -> Result<DashboardSummary, ApiError> {
        self.send_json(self.get("/accounts/dashboard").query(&[("userId", user_id)]))
            .await
    }
}
