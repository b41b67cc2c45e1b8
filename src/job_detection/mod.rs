// src/job_detection/mod.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod extractor;
pub mod heuristic;
pub mod match_service;
pub mod monitor;
pub mod pipeline;
pub mod sites;

pub use extractor::Extractor;
pub use heuristic::HeuristicScorer;
pub use match_service::{DegradedPolicy, MatchService, MatchTimeouts};
pub use monitor::{MonitorTiming, NavigationState, PageEvent, PageMonitor};
pub use pipeline::DetectionPipeline;
pub use sites::{SiteProfile, SiteRegistry};

pub const TITLE_PLACEHOLDER: &str = "Job Opening";
pub const COMPANY_PLACEHOLDER: &str = "Unknown";

/// Where the description text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Selector(String),
    FullPage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedJob {
    pub text: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub source: TextSource,
}

/// Payload for the job-save collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub description: String,
    pub url: String,
}

impl JobPosting {
    /// Missing metadata never blocks a save.
    pub fn from_extracted(job: &ExtractedJob, url: &str) -> Self {
        Self {
            title: job
                .title
                .clone()
                .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string()),
            company: job
                .company
                .clone()
                .unwrap_or_else(|| COMPANY_PLACEHOLDER.to_string()),
            description: job.text.clone(),
            url: url.to_string(),
        }
    }
}

/// Score in [0, 1] together with whether it came from the local heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    score: f64,
    degraded: bool,
}

impl MatchResult {
    pub fn live(score: f64) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            degraded: false,
        }
    }

    /// From a heuristic percentage.
    pub fn degraded(percent: u32) -> Self {
        Self {
            score: (f64::from(percent) / 100.0).clamp(0.0, 1.0),
            degraded: true,
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Rounded percentage shown to the user.
    pub fn percent(&self) -> u32 {
        (self.score * 100.0).round() as u32
    }
}

/// Outcome of one detection pipeline pass.
#[derive(Debug, Clone)]
pub struct Detection {
    pub url: String,
    pub job: ExtractedJob,
    pub result: MatchResult,
    pub detected_at: DateTime<Utc>,
}
