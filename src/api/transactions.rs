// src/api/transactions.rs
use super::ApiClient;
use crate::error::ApiError;
use crate::models::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Page { page: 0, size: 20 }
    }
}

impl ApiClient {
    pub async fn account_transactions(
        &self,
        account_id: i64,
        page: Page,
    ) -> Result<Vec<Transaction>, ApiError> {
        let request = self.get("/transactions").query(&[
            ("accountId", account_id.to_string()),
            ("page", page.page.to_string()),
            ("size", page.size.to_string()),
        ]);
        self.send_json(request).await
    }

    pub async fn get_transaction(&self, transaction_id: i64) -> Result<Transaction, ApiError> {
        self.send_json(self.get(&format!("/transactions/{transaction_id}")))
            .await
    }
}
