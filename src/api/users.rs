// src/api/users.rs
use super::ApiClient;
use crate::error::ApiError;
use crate::models::Identity;
use serde::Serialize;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl ApiClient {
    /// Registers a user. An email that is already taken comes back as a
    /// `Server` error with status 409.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Identity, ApiError> {
        let body = Credentials {
            email,
            password,
            name: Some(name),
        };
        self.send_json(self.post("/users/signup").json(&body)).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        let body = Credentials {
            email,
            password,
            name: None,
        };
        self.send_json(self.post("/users/login").json(&body)).await
    }
}
