// src/popup.rs
//! Manual actions from the toolbar popup. Unlike the in-page widget these
//! report failures to the user instead of degrading.

use std::sync::Arc;
use tracing::{error, info};

use crate::core::service_client::{ResumeId, ResumeRecord, ServiceError};
use crate::job_detection::{Extractor, JobPosting, MatchService, SiteRegistry};
use crate::overlay::ScoreLabel;
use crate::page::PageContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupStatus {
    pub kind: StatusKind,
    pub message: String,
}

impl PopupStatus {
    fn success(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PopupSummary {
    pub resumes: Vec<ResumeRecord>,
    pub job_count: usize,
}

impl PopupSummary {
    /// Resume choices as shown in the selector.
    pub fn resume_options(&self) -> Vec<(ResumeId, String)> {
        self.resumes
            .iter()
            .map(|r| {
                let name = r.filename.clone().unwrap_or_else(|| format!("Resume {}", r.id));
                (r.id.clone(), name)
            })
            .collect()
    }
}

pub struct PopupPanel {
    service: Arc<MatchService>,
    sites: Arc<SiteRegistry>,
    extractor: Extractor,
    backend_label: String,
}

impl PopupPanel {
    pub fn new(
        service: Arc<MatchService>,
        sites: Arc<SiteRegistry>,
        extractor: Extractor,
        backend_label: impl Into<String>,
    ) -> Self {
        Self {
            service,
            sites,
            extractor,
            backend_label: backend_label.into(),
        }
    }

    pub async fn load(&self) -> Result<PopupSummary, PopupStatus> {
        let (resumes, jobs) = tokio::join!(self.service.list_resumes(), self.service.list_jobs());

        match (resumes, jobs) {
            (Ok(resumes), Ok(jobs)) => Ok(PopupSummary {
                resumes,
                job_count: jobs.len(),
            }),
            (Err(e), _) | (_, Err(e)) => {
                error!("Popup load failed: {}", e);
                let message = match e {
                    // Reachable, but answering with an error
                    ServiceError::Status { .. } => {
                        "Backend error - check if server is running".to_string()
                    }
                    _ => format!("Backend not running on {}", self.backend_label),
                };
                Err(PopupStatus::error(message))
            }
        }
    }

    pub async fn show_match(&self, resume_id: Option<&ResumeId>, page: &dyn PageContext) -> PopupStatus {
        let Some(resume_id) = resume_id else {
            return PopupStatus::error("Please upload a resume first");
        };

        let snapshot = match page.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => return PopupStatus::error(format!("Error: {:#}", e)),
        };
        let job = self
            .extractor
            .extract(&snapshot, self.sites.for_url(&snapshot.url));

        match self.service.match_with_resume(resume_id, &job.text).await {
            Ok(response) => {
                let percent = (response.score * 100.0).round() as u32;
                info!("Manual match for resume {}: {}%", resume_id, percent);
                PopupStatus::success(format!(
                    "Match Score: {}% - {}",
                    percent,
                    ScoreLabel::for_percent(percent).text()
                ))
            }
            Err(e) => PopupStatus::error(format!("Error: {}", e)),
        }
    }

    pub async fn save_job(&self, title: &str, company: &str, page: &dyn PageContext) -> PopupStatus {
        if title.trim().is_empty() || company.trim().is_empty() {
            return PopupStatus::error("Please fill in title and company");
        }

        let snapshot = match page.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => return PopupStatus::error(format!("Error: {:#}", e)),
        };
        let job = self
            .extractor
            .extract(&snapshot, self.sites.for_url(&snapshot.url));
        let posting = JobPosting {
            title: title.trim().to_string(),
            company: company.trim().to_string(),
            description: job.text,
            url: snapshot.url,
        };

        match self.service.save_job(&posting).await {
            Ok(_) => PopupStatus::success("Job saved successfully!"),
            Err(e) => {
                error!("Popup save failed: {}", e);
                PopupStatus::error("Failed to save job")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_detection::match_service::tests::FakeBackend;
    use crate::job_detection::{DegradedPolicy, MatchTimeouts};
    use crate::page::StaticPage;
    use std::sync::atomic::Ordering;

    fn panel(backend: Arc<FakeBackend>) -> PopupPanel {
        let service = MatchService::new(backend, MatchTimeouts::default(), DegradedPolicy::PerCall);
        PopupPanel::new(
            Arc::new(service),
            Arc::new(SiteRegistry::builtin()),
            Extractor::default(),
            "localhost:8000",
        )
    }

    fn page() -> StaticPage {
        StaticPage::new(
            "https://www.indeed.com/viewjob?jk=9",
            r#"<body><div id="jobDescriptionText">Senior Go developer</div></body>"#,
        )
    }

    #[tokio::test]
    async fn test_load_lists_resumes_and_jobs() {
        let panel = panel(Arc::new(FakeBackend::with_resume(Some(0.5))));
        let summary = panel.load().await.unwrap();
        assert_eq!(summary.job_count, 0);
        assert_eq!(
            summary.resume_options(),
            vec![(ResumeId::parse("1"), "cv.pdf".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_reports_unreachable_backend() {
        let backend = Arc::new(FakeBackend::default());
        *backend.resume_delay.lock().unwrap() = Some(std::time::Duration::from_secs(30));
        let status = panel(backend).load().await.unwrap_err();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.message, "Backend not running on localhost:8000");
    }

    #[tokio::test]
    async fn test_load_reports_backend_error_status() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_resumes.store(true, Ordering::SeqCst);
        let status = panel(backend).load().await.unwrap_err();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.message, "Backend error - check if server is running");
    }

    #[tokio::test]
    async fn test_show_match_requires_resume() {
        let panel = panel(Arc::new(FakeBackend::default()));
        let status = panel.show_match(None, &page()).await;
        assert_eq!(status, PopupStatus::error("Please upload a resume first"));
    }

    #[tokio::test]
    async fn test_show_match_formats_score() {
        let panel = panel(Arc::new(FakeBackend::with_resume(Some(0.62))));
        let status = panel.show_match(Some(&ResumeId::parse("1")), &page()).await;
        assert_eq!(status, PopupStatus::success("Match Score: 62% - Good Match"));
    }

    #[tokio::test]
    async fn test_show_match_surfaces_failure() {
        let panel = panel(Arc::new(FakeBackend::with_resume(None)));
        let status = panel.show_match(Some(&ResumeId::parse("1")), &page()).await;
        assert_eq!(status.kind, StatusKind::Error);
    }

    #[tokio::test]
    async fn test_save_job_validates_and_saves() {
        let backend = Arc::new(FakeBackend::default());
        let panel = panel(backend.clone());

        let status = panel.save_job("Go Dev", "  ", &page()).await;
        assert_eq!(status, PopupStatus::error("Please fill in title and company"));

        let status = panel.save_job("Go Dev", "Gophers Inc", &page()).await;
        assert_eq!(status, PopupStatus::success("Job saved successfully!"));
        let saved = backend.saved.lock().unwrap();
        assert_eq!(saved[0].description, "Senior Go developer");
        assert_eq!(saved[0].url, "https://www.indeed.com/viewjob?jk=9");
    }

    #[tokio::test]
    async fn test_save_job_failure_notice() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_save.store(true, Ordering::SeqCst);
        let status = panel(backend).save_job("a", "b", &page()).await;
        assert_eq!(status, PopupStatus::error("Failed to save job"));
    }
}
