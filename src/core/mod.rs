// src/core/mod.rs
//! Configuration, credentials and the backend client

pub mod config_manager;
pub mod credentials;
pub mod service_client;

pub use config_manager::{ConfigManager, EnvironmentConfig};
pub use credentials::{CredentialStore, FileCredentialStore, StaticCredentials};
pub use service_client::{MatchBackend, ResumeId, ServiceClient, ServiceError};
