// src/core/credentials.rs
//! Bearer credential lookup. A missing credential is normal: the service
//! may be used anonymously.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn bearer_token(&self) -> Option<String>;
}

/// Fixed credential, mostly for tests and one-shot CLI runs.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(pub Option<String>);

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn bearer_token(&self) -> Option<String> {
        self.0.clone().filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct StorageFile {
    auth_token: Option<String>,
}

/// Local storage persisted as a TOML file, re-read on every lookup so a
/// login elsewhere is picked up without restarting.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn bearer_token(&self) -> Option<String> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("No credential storage at {}: {}", self.path.display(), e);
                return None;
            }
        };

        match toml::from_str::<StorageFile>(&content) {
            Ok(storage) => storage
                .auth_token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Failed to parse {}: {}", self.path.display(), e);
                None
            }
        }
    }
}
