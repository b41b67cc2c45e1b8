// src/core/service_client.rs
//! REST client for the resume/job matching service.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, trace};

use super::credentials::CredentialStore;
use crate::job_detection::JobPosting;

const RESUMES_ENDPOINT: &str = "/api/resumes";
const JOBS_ENDPOINT: &str = "/api/jobs";
const MATCH_JOB_ENDPOINT: &str = "/api/match-job";
const HEALTH_ENDPOINT: &str = "/health";

/// Hard ceiling for any request; callers apply tighter per-call bounds.
const CLIENT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned error status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Score out of range: {0}")]
    InvalidScore(f64),
}

/// Opaque resume identifier, echoed back to the service verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeId(pub serde_json::Value);

impl ResumeId {
    /// Numeric ids stay numeric so the service sees the type it issued.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(n) => Self(serde_json::Value::from(n)),
            Err(_) => Self(serde_json::Value::String(raw.trim().to_string())),
        }
    }
}

impl std::fmt::Display for ResumeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: ResumeId,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: serde_json::Value,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchJobRequest {
    pub resume_id: ResumeId,
    pub job_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchJobResponse {
    pub score: f64,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub experience_match: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedJob {
    pub id: serde_json::Value,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// The remote collaborator as seen by the detection engine.
#[async_trait]
pub trait MatchBackend: Send + Sync {
    async fn list_resumes(&self) -> Result<Vec<ResumeRecord>, ServiceError>;
    async fn list_jobs(&self) -> Result<Vec<JobRecord>, ServiceError>;
    async fn match_job(&self, request: &MatchJobRequest) -> Result<MatchJobResponse, ServiceError>;
    async fn save_job(&self, posting: &JobPosting) -> Result<SavedJob, ServiceError>;
    async fn health(&self) -> Result<HealthStatus, ServiceError>;
}

pub struct ServiceClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl ServiceClient {
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialStore>) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, ServiceError> {
        let response = self.authorize(request).await.send().await?;

        let status = response.status();
        trace!("Response status: {}", status);

        let body = response.text().await?;
        if !status.is_success() {
            error!("Service error response {}: {}", status, body);
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R, ServiceError> {
        let url = self.url(endpoint);
        debug!("GET {}", url);
        self.send(self.client.get(&url)).await
    }

    async fn post_json<T: Serialize + Sync, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: &T,
    ) -> Result<R, ServiceError> {
        let url = self.url(endpoint);
        debug!("POST {}", url);
        self.send(self.client.post(&url).json(payload)).await
    }
}

#[async_trait]
impl MatchBackend for ServiceClient {
    async fn list_resumes(&self) -> Result<Vec<ResumeRecord>, ServiceError> {
        self.get(RESUMES_ENDPOINT).await
    }

    async fn list_jobs(&self) -> Result<Vec<JobRecord>, ServiceError> {
        self.get(JOBS_ENDPOINT).await
    }

    async fn match_job(&self, request: &MatchJobRequest) -> Result<MatchJobResponse, ServiceError> {
        let response: MatchJobResponse = self.post_json(MATCH_JOB_ENDPOINT, request).await?;
        if !response.score.is_finite() || !(0.0..=1.0).contains(&response.score) {
            return Err(ServiceError::InvalidScore(response.score));
        }
        Ok(response)
    }

    async fn save_job(&self, posting: &JobPosting) -> Result<SavedJob, ServiceError> {
        self.post_json(JOBS_ENDPOINT, posting).await
    }

    async fn health(&self) -> Result<HealthStatus, ServiceError> {
        self.get(HEALTH_ENDPOINT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::StaticCredentials;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accepts one connection, replies with the canned response and returns
    /// the raw request it received.
    async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let reply = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&received).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if received.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&received).to_string()
        });

        (base_url, handle)
    }

    fn client(base_url: &str, token: Option<&str>) -> ServiceClient {
        ServiceClient::new(
            base_url,
            Arc::new(StaticCredentials(token.map(str::to_string))),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_resumes_attaches_bearer_token() {
        let (base, server) = serve_once("200 OK", r#"[{"id": 7, "filename": "cv.pdf"}]"#).await;
        let resumes = client(&base, Some("secret")).list_resumes().await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(resumes.len(), 1);
        assert_eq!(resumes[0].id, ResumeId(serde_json::json!(7)));
        assert!(request.starts_with("GET /api/resumes HTTP/1.1"));
        assert!(request.to_lowercase().contains("authorization: bearer secret"));
    }

    #[tokio::test]
    async fn test_no_token_means_no_authorization_header() {
        let (base, server) = serve_once("200 OK", "[]").await;
        let resumes = client(&base, None).list_resumes().await.unwrap();
        let request = server.await.unwrap();

        assert!(resumes.is_empty());
        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_match_job_sends_resume_and_text() {
        let (base, server) = serve_once("200 OK", r#"{"score": 0.73, "matched_skills": ["rust"]}"#).await;
        let request = MatchJobRequest {
            resume_id: ResumeId::parse("7"),
            job_description: "Rust engineer".to_string(),
        };
        let response = client(&base, None).match_job(&request).await.unwrap();
        let raw = server.await.unwrap();

        assert!((response.score - 0.73).abs() < 1e-9);
        assert_eq!(response.matched_skills, vec!["rust".to_string()]);
        assert!(raw.starts_with("POST /api/match-job HTTP/1.1"));
        assert!(raw.contains(r#""resume_id":7"#));
        assert!(raw.contains(r#""job_description":"Rust engineer""#));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let (base, server) = serve_once("404 Not Found", r#"{"detail": "Resume not found"}"#).await;
        let request = MatchJobRequest {
            resume_id: ResumeId::parse("99"),
            job_description: String::new(),
        };
        let err = client(&base, None).match_job(&request).await.unwrap_err();
        server.await.unwrap();

        match err {
            ServiceError::Status { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("Resume not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_rejected() {
        let (base, server) = serve_once("200 OK", r#"{"score": 73.0}"#).await;
        let request = MatchJobRequest {
            resume_id: ResumeId::parse("1"),
            job_description: String::new(),
        };
        let err = client(&base, None).match_job(&request).await.unwrap_err();
        server.await.unwrap();
        assert!(matches!(err, ServiceError::InvalidScore(s) if s == 73.0));
    }

    #[tokio::test]
    async fn test_save_job_posts_posting() {
        let (base, server) = serve_once("200 OK", r#"{"id": 12, "title": "Rust Dev"}"#).await;
        let posting = JobPosting {
            title: "Rust Dev".to_string(),
            company: "Unknown".to_string(),
            description: "text".to_string(),
            url: "https://www.indeed.com/viewjob?jk=1".to_string(),
        };
        let saved = client(&base, None).save_job(&posting).await.unwrap();
        let raw = server.await.unwrap();

        assert_eq!(saved.id, serde_json::json!(12));
        assert!(raw.starts_with("POST /api/jobs HTTP/1.1"));
        assert!(raw.contains(r#""company":"Unknown""#));
    }

    #[test]
    fn test_resume_id_parse_and_display() {
        assert_eq!(ResumeId::parse(" 42 ").0, serde_json::json!(42));
        assert_eq!(ResumeId::parse("abc").0, serde_json::json!("abc"));
        assert_eq!(ResumeId::parse("abc").to_string(), "abc");
        assert_eq!(ResumeId::parse("42").to_string(), "42");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let c = client("http://localhost:8000/", None);
        assert_eq!(c.url(RESUMES_ENDPOINT), "http://localhost:8000/api/resumes");
    }
}
