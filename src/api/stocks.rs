// src/api/stocks.rs
use super::ApiClient;
use crate::error::ApiError;
use crate::models::Quote;
use serde_json::Value;

// search, metrics and news are forwarded from the market data provider
// unchanged, so they stay untyped.
impl ApiClient {
    pub async fn search(&self, query: &str) -> Result<Value, ApiError> {
        self.send_json(self.get("/stock/search").query(&[("query", query)]))
            .await
    }

    pub async fn quote(&self, ticker: &str) -> Result<Quote, ApiError> {
        self.send_json(self.get("/stock/quote").query(&[("ticker", ticker)]))
            .await
    }

    pub async fn metrics(&self, ticker: &str) -> Result<Value, ApiError> {
        self.send_json(self.get("/stock/metrics").query(&[("ticker", ticker)]))
            .await
    }

    pub async fn news(&self, category: &str) -> Result<Value, ApiError> {
        self.send_json(self.get("/stock/news").query(&[("category", category)]))
            .await
    }
}
