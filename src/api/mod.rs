// src/api/mod.rs
//! Thin typed wrappers over the Trade Wars REST API.
//!
//! Every call is a fresh round trip: nothing is cached and nothing is
//! retried. Route groups live in submodules as extra `impl ApiClient`
//! blocks.

mod accounts;
mod stocks;
mod tournaments;
mod transactions;
mod users;

pub use transactions::Page;

use crate::config::Config;
use crate::error::ApiError;
use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(ApiClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.api_base_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub(crate) fn patch(&self, path: &str) -> RequestBuilder {
        self.client.patch(self.url(path))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            error!("Failed to parse API response: {}", e);
            ApiError::Decode(e.to_string())
        })
    }

    pub(crate) async fn send_text(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = self.send(request).await?;
        Ok(response.text().await?)
    }

    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            error!("HTTP request failed: {}", e);
            ApiError::Transport(e)
        })?;
        let status = response.status();
        debug!("{} {}", status, response.url());
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        error!("Request failed: HTTP {} {}", status, message);
        Err(ApiError::Server { status, message })
    }
}
