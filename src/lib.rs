// src/lib.rs
//! Client-side core of the Trade Wars paper-trading platform: the signed-in
//! session, the user's trading accounts and which of them is selected, plus
//! typed wrappers over the backend's REST API.

pub mod api;
pub mod config;
pub mod context;
pub mod directory;
pub mod error;
pub mod models;
pub mod portfolio;
pub mod selection;
pub mod session;
pub mod storage;

pub use api::ApiClient;
pub use config::Config;
pub use context::{AccountContext, AccountSnapshot, LoadOutcome};
pub use directory::AccountDirectory;
pub use error::{ApiError, ConfigError, StoreError};
pub use selection::AccountSelection;
pub use session::{SessionState, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
