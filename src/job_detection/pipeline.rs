// src/job_detection/pipeline.rs
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use super::extractor::Extractor;
use super::match_service::MatchService;
use super::sites::SiteRegistry;
use super::{Detection, ExtractedJob, JobPosting};
use crate::page::PageContext;

/// Extractor → match service, shared by the monitor and the CLI.
#[derive(Clone)]
pub struct DetectionPipeline {
    page: Arc<dyn PageContext>,
    sites: Arc<SiteRegistry>,
    extractor: Extractor,
    service: Arc<MatchService>,
}

impl DetectionPipeline {
    pub fn new(
        page: Arc<dyn PageContext>,
        sites: Arc<SiteRegistry>,
        extractor: Extractor,
        service: Arc<MatchService>,
    ) -> Self {
        Self {
            page,
            sites,
            extractor,
            service,
        }
    }

    pub fn page(&self) -> &Arc<dyn PageContext> {
        &self.page
    }

    pub fn sites(&self) -> &SiteRegistry {
        &self.sites
    }

    /// Extracts from whatever the page currently shows.
    pub async fn extract_current(&self) -> Result<(String, ExtractedJob)> {
        let snapshot = self
            .page
            .snapshot()
            .await
            .context("Failed to read page")?;
        let site = self.sites.for_url(&snapshot.url);
        let job = self.extractor.extract(&snapshot, site);
        info!(
            "Extracted {} chars from {} ({:?})",
            job.text.chars().count(),
            snapshot.url,
            job.source
        );
        Ok((snapshot.url, job))
    }

    /// One full pass. Failures stop here and are only logged.
    pub async fn detect(&self, url: &str) -> Option<Detection> {
        match self.try_detect().await {
            Ok(detection) => Some(detection),
            Err(e) => {
                error!("Detection failed for {}: {:#}", url, e);
                None
            }
        }
    }

    async fn try_detect(&self) -> Result<Detection> {
        let (url, job) = self.extract_current().await?;
        let result = self.service.get_match_score(&job.text).await;
        Ok(Detection {
            url,
            job,
            result,
            detected_at: Utc::now(),
        })
    }

    /// Saves the job the page currently shows.
    pub async fn save_current(&self) -> Result<JobPosting> {
        let (url, job) = self.extract_current().await?;
        let posting = JobPosting::from_extracted(&job, &url);
        self.service
            .save_job(&posting)
            .await
            .context("Failed to save job")?;
        info!("Saved job '{}' at {}", posting.title, posting.company);
        Ok(posting)
    }
}
