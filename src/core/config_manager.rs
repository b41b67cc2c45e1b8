// src/core/config_manager.rs
//! Layered configuration: config.yaml section, then environment overrides

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::job_detection::{DegradedPolicy, MatchTimeouts, MonitorTiming};

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub api_base_url: String,
    pub resume_timeout_ms: u64,
    pub match_timeout_ms: u64,
    pub save_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub settle_delay_ms: u64,
    pub max_text_chars: usize,
    pub degraded_policy: DegradedPolicy,
    pub credentials_path: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            resume_timeout_ms: 3000,
            match_timeout_ms: 5000,
            save_timeout_ms: 10000,
            poll_interval_ms: 1000,
            settle_delay_ms: 2000,
            max_text_chars: 5000,
            degraded_policy: DegradedPolicy::PerCall,
            credentials_path: PathBuf::from("storage.toml"),
            log_file: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment_name: String,
    pub environment: EnvironmentConfig,
}

impl ConfigManager {
    /// Load from `path`, or `config.yaml` in the working directory when none is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let environment_name = Self::get_environment();
        info!("Loading configuration for environment: {}", environment_name);

        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut environment = Self::load_from_file(&path, &environment_name)?;

        if let Ok(url) = std::env::var("JOBALYTICS_API_URL") {
            if !url.trim().is_empty() {
                environment.api_base_url = url;
            }
        }

        Ok(Self {
            environment_name,
            environment,
        })
    }

    fn get_environment() -> String {
        std::env::var("JOBALYTICS_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn load_from_file(path: &Path, environment: &str) -> Result<EnvironmentConfig> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(EnvironmentConfig::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content, environment)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn parse(content: &str, environment: &str) -> Result<EnvironmentConfig> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        Ok(match environment {
            "production" => file.production,
            _ => file.local,
        })
    }

    pub fn with_api_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.environment.api_base_url = url;
        }
        self
    }

    pub fn match_timeouts(&self) -> MatchTimeouts {
        MatchTimeouts {
            resume: Duration::from_millis(self.environment.resume_timeout_ms),
            score: Duration::from_millis(self.environment.match_timeout_ms),
            save: Duration::from_millis(self.environment.save_timeout_ms),
        }
    }

    pub fn monitor_timing(&self) -> MonitorTiming {
        MonitorTiming {
            poll_interval: Duration::from_millis(self.environment.poll_interval_ms),
            settle_delay: Duration::from_millis(self.environment.settle_delay_ms),
        }
    }
}
