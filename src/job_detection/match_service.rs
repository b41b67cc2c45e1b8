// src/job_detection/match_service.rs
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::heuristic::HeuristicScorer;
use super::{JobPosting, MatchResult};
use crate::core::service_client::{
    JobRecord, MatchBackend, MatchJobRequest, MatchJobResponse, ResumeId, ResumeRecord,
    SavedJob, ServiceError,
};

/// Whether a transport failure pins the service to local scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedPolicy {
    /// Every call decides live vs degraded from its own outcome.
    #[default]
    PerCall,
    /// After a transport failure, skip remote calls for this service's lifetime.
    Sticky,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchTimeouts {
    pub resume: Duration,
    pub score: Duration,
    pub save: Duration,
}

impl Default for MatchTimeouts {
    fn default() -> Self {
        Self {
            resume: Duration::from_secs(3),
            score: Duration::from_secs(5),
            save: Duration::from_secs(10),
        }
    }
}

/// Resolves a score for job text, remotely when possible.
pub struct MatchService {
    backend: Arc<dyn MatchBackend>,
    heuristic: HeuristicScorer,
    timeouts: MatchTimeouts,
    policy: DegradedPolicy,
    known_degraded: AtomicBool,
}

async fn bounded<T>(
    operation: &'static str,
    after: Duration,
    call: impl Future<Output = Result<T, ServiceError>>,
) -> Result<T, ServiceError> {
    match tokio::time::timeout(after, call).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ServiceError::Timeout { operation, after }),
    }
}

impl MatchService {
    pub fn new(backend: Arc<dyn MatchBackend>, timeouts: MatchTimeouts, policy: DegradedPolicy) -> Self {
        Self {
            backend,
            heuristic: HeuristicScorer::default(),
            timeouts,
            policy,
            known_degraded: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &Arc<dyn MatchBackend> {
        &self.backend
    }

    pub fn heuristic(&self) -> &HeuristicScorer {
        &self.heuristic
    }

    pub fn is_known_degraded(&self) -> bool {
        self.known_degraded.load(Ordering::Relaxed)
    }

    /// Never fails: every failure path ends in a heuristic result.
    pub async fn get_match_score(&self, text: &str) -> MatchResult {
        if self.policy == DegradedPolicy::Sticky && self.is_known_degraded() {
            info!("Service known unavailable, scoring locally");
            return self.local_score(text);
        }

        let resume = match self.active_resume().await {
            Ok(Some(resume)) => resume,
            Ok(None) => {
                info!("No resume uploaded, scoring locally");
                return self.local_score(text);
            }
            Err(e) => return self.fail_over(text, &e),
        };

        match self.match_with_resume(&resume.id, text).await {
            Ok(response) => {
                self.known_degraded.store(false, Ordering::Relaxed);
                info!("Remote match score {:.4} for resume {}", response.score, resume.id);
                MatchResult::live(response.score)
            }
            Err(e) => self.fail_over(text, &e),
        }
    }

    /// First resume of the store, `None` when nothing was uploaded.
    pub async fn active_resume(&self) -> Result<Option<ResumeRecord>, ServiceError> {
        Ok(self.list_resumes().await?.into_iter().next())
    }

    pub async fn list_resumes(&self) -> Result<Vec<ResumeRecord>, ServiceError> {
        bounded("resume lookup", self.timeouts.resume, self.backend.list_resumes()).await
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobRecord>, ServiceError> {
        bounded("job listing", self.timeouts.resume, self.backend.list_jobs()).await
    }

    pub async fn match_with_resume(
        &self,
        resume_id: &ResumeId,
        text: &str,
    ) -> Result<MatchJobResponse, ServiceError> {
        let request = MatchJobRequest {
            resume_id: resume_id.clone(),
            job_description: text.to_string(),
        };
        bounded("match scoring", self.timeouts.score, self.backend.match_job(&request)).await
    }

    pub async fn save_job(&self, posting: &JobPosting) -> Result<SavedJob, ServiceError> {
        bounded("job save", self.timeouts.save, self.backend.save_job(posting)).await
    }

    fn fail_over(&self, text: &str, error: &ServiceError) -> MatchResult {
        warn!("Match service unavailable, switching to offline scoring: {}", error);
        self.known_degraded.store(true, Ordering::Relaxed);
        self.local_score(text)
    }

    fn local_score(&self, text: &str) -> MatchResult {
        MatchResult::degraded(self.heuristic.score(text))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::service_client::HealthStatus;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Scripted backend shared by the detection tests.
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub resumes: Mutex<Vec<ResumeRecord>>,
        pub score: Mutex<Option<f64>>,
        pub resume_delay: Mutex<Option<Duration>>,
        pub score_delay: Mutex<Option<Duration>>,
        pub save_delay: Mutex<Option<Duration>>,
        pub fail_resumes: AtomicBool,
        pub fail_save: AtomicBool,
        pub resume_calls: AtomicUsize,
        pub match_calls: AtomicUsize,
        pub saved: Mutex<Vec<JobPosting>>,
    }

    impl FakeBackend {
        pub fn with_resume(score: Option<f64>) -> Self {
            let backend = Self::default();
            *backend.resumes.lock().unwrap() = vec![ResumeRecord {
                id: ResumeId::parse("1"),
                filename: Some("cv.pdf".to_string()),
                text: Some("Rust and Python engineer".to_string()),
            }];
            *backend.score.lock().unwrap() = score;
            backend
        }
    }

    #[async_trait]
    impl MatchBackend for FakeBackend {
        async fn list_resumes(&self) -> Result<Vec<ResumeRecord>, ServiceError> {
            self.resume_calls.fetch_add(1, Ordering::SeqCst);
            let delay = *self.resume_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_resumes.load(Ordering::SeqCst) {
                return Err(ServiceError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(self.resumes.lock().unwrap().clone())
        }

        async fn list_jobs(&self) -> Result<Vec<JobRecord>, ServiceError> {
            Ok(self
                .saved
                .lock()
                .unwrap()
                .iter()
                .enumerate()
                .map(|(i, p)| JobRecord {
                    id: serde_json::json!(i),
                    title: Some(p.title.clone()),
                    company: Some(p.company.clone()),
                })
                .collect())
        }

        async fn match_job(&self, _request: &MatchJobRequest) -> Result<MatchJobResponse, ServiceError> {
            self.match_calls.fetch_add(1, Ordering::SeqCst);
            let delay = *self.score_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let score = *self.score.lock().unwrap();
            match score {
                Some(score) => Ok(MatchJobResponse {
                    score,
                    matched_skills: vec![],
                    missing_skills: vec![],
                    experience_match: None,
                }),
                None => Err(ServiceError::Status {
                    status: 500,
                    message: "boom".to_string(),
                }),
            }
        }

        async fn save_job(&self, posting: &JobPosting) -> Result<SavedJob, ServiceError> {
            let delay = *self.save_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_save.load(Ordering::SeqCst) {
                return Err(ServiceError::Status {
                    status: 500,
                    message: "db down".to_string(),
                });
            }
            self.saved.lock().unwrap().push(posting.clone());
            Ok(SavedJob {
                id: serde_json::json!(1),
                title: Some(posting.title.clone()),
            })
        }

        async fn health(&self) -> Result<HealthStatus, ServiceError> {
            Ok(HealthStatus {
                status: "ok".to_string(),
            })
        }
    }

    fn service(backend: Arc<FakeBackend>, policy: DegradedPolicy) -> MatchService {
        MatchService::new(backend, MatchTimeouts::default(), policy)
    }

    #[tokio::test]
    async fn test_empty_resume_list_degrades() {
        let backend = Arc::new(FakeBackend::default());
        let service = service(backend.clone(), DegradedPolicy::PerCall);

        let result = service.get_match_score("... python react ...").await;
        assert!(result.is_degraded());
        assert!((0.45..=0.95).contains(&result.score()));
        assert_eq!(backend.match_calls.load(Ordering::SeqCst), 0);
        assert!(!service.is_known_degraded());
    }

    #[tokio::test]
    async fn test_remote_score_is_live() {
        let backend = Arc::new(FakeBackend::with_resume(Some(0.73)));
        let service = service(backend, DegradedPolicy::PerCall);

        let result = service.get_match_score("Rust engineer").await;
        assert!(!result.is_degraded());
        assert_eq!(result.score(), 0.73);
    }

    #[tokio::test(start_paused = true)]
    async fn test_score_timeout_uses_heuristic_only() {
        let backend = Arc::new(FakeBackend::with_resume(Some(0.99)));
        *backend.score_delay.lock().unwrap() = Some(Duration::from_secs(60));
        let service = service(backend.clone(), DegradedPolicy::PerCall);
        let text = "python react kubernetes";

        let started = tokio::time::Instant::now();
        let result = service.get_match_score(text).await;

        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(started.elapsed() < Duration::from_secs(60));
        assert!(result.is_degraded());
        let base = service.heuristic().base_score(text);
        assert!(result.percent() >= base && result.percent() < base + 10);
        assert_ne!(result.score(), 0.99);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_lookup_timeout_degrades() {
        let backend = Arc::new(FakeBackend::with_resume(Some(0.8)));
        *backend.resume_delay.lock().unwrap() = Some(Duration::from_secs(10));
        let service = service(backend.clone(), DegradedPolicy::PerCall);

        let result = service.get_match_score("java").await;
        assert!(result.is_degraded());
        assert_eq!(backend.match_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_status_degrades_then_recovers_per_call() {
        let backend = Arc::new(FakeBackend::with_resume(None));
        let service = service(backend.clone(), DegradedPolicy::PerCall);

        assert!(service.get_match_score("go").await.is_degraded());
        assert!(service.is_known_degraded());

        *backend.score.lock().unwrap() = Some(0.5);
        let result = service.get_match_score("go").await;
        assert!(!result.is_degraded());
        assert!(!service.is_known_degraded());
        assert_eq!(backend.match_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sticky_policy_skips_remote_after_failure() {
        let backend = Arc::new(FakeBackend::with_resume(Some(0.5)));
        backend.fail_resumes.store(true, Ordering::SeqCst);
        let service = service(backend.clone(), DegradedPolicy::Sticky);

        assert!(service.get_match_score("rust").await.is_degraded());
        backend.fail_resumes.store(false, Ordering::SeqCst);
        assert!(service.get_match_score("rust").await.is_degraded());
        assert_eq!(backend.resume_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sticky_policy_ignores_missing_resume() {
        let backend = Arc::new(FakeBackend::default());
        let service = service(backend.clone(), DegradedPolicy::Sticky);

        assert!(service.get_match_score("rust").await.is_degraded());
        assert!(service.get_match_score("rust").await.is_degraded());
        assert_eq!(backend.resume_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_save_job_surfaces_errors() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_save.store(true, Ordering::SeqCst);
        let service = service(backend.clone(), DegradedPolicy::PerCall);
        let posting = JobPosting {
            title: "t".to_string(),
            company: "c".to_string(),
            description: "d".to_string(),
            url: "u".to_string(),
        };
        assert!(service.save_job(&posting).await.is_err());

        backend.fail_save.store(false, Ordering::SeqCst);
        assert!(service.save_job(&posting).await.is_ok());
        assert_eq!(backend.saved.lock().unwrap().len(), 1);
    }
}
