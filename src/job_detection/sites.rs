// src/job_detection/sites.rs
use url::Url;

/// A URL-shape rule marking a navigation as a job detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlShape {
    /// The query string carries this parameter (any value).
    QueryParam(String),
    /// The path contains this literal fragment.
    PathContains(String),
}

impl UrlShape {
    pub fn query_param(name: &str) -> Self {
        Self::QueryParam(name.to_string())
    }

    pub fn path_contains(fragment: &str) -> Self {
        Self::PathContains(fragment.to_string())
    }

    fn matches(&self, url: &Url) -> bool {
        match self {
            UrlShape::QueryParam(name) => url.query_pairs().any(|(key, _)| key == name.as_str()),
            UrlShape::PathContains(fragment) => url.path().contains(fragment.as_str()),
        }
    }
}

/// Per-site selectors and detail-page rules.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub id: String,
    /// Matched as a substring of the page hostname.
    pub host: String,
    pub description_selectors: Vec<String>,
    pub title_selectors: Vec<String>,
    pub company_selectors: Vec<String>,
    /// Any one matching shape makes the URL a detail view.
    pub detail_shapes: Vec<UrlShape>,
}

impl SiteProfile {
    pub fn matches_host(&self, host: &str) -> bool {
        host.to_lowercase().contains(&self.host)
    }

    pub fn is_job_detail(&self, url: &Url) -> bool {
        url.host_str()
            .map(|host| self.matches_host(host))
            .unwrap_or(false)
            && self.detail_shapes.iter().any(|shape| shape.matches(url))
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn linkedin() -> SiteProfile {
    SiteProfile {
        id: "linkedin".to_string(),
        host: "linkedin.com".to_string(),
        description_selectors: owned(&[
            ".jobs-description",
            ".jobs-box__html-content",
            ".jobs-description-content__text",
            ".jobs-description__container",
            "[data-test-id='job-description']",
        ]),
        title_selectors: owned(&[
            ".job-details-jobs-unified-top-card__job-title",
            ".jobs-unified-top-card__job-title",
            "h1.top-card-layout__title",
            "h1[data-test-id='job-title']",
        ]),
        company_selectors: owned(&[
            ".job-details-jobs-unified-top-card__company-name",
            ".jobs-unified-top-card__company-name",
            ".top-card-layout__card .top-card-layout__second-subline",
            "a[data-test-id='job-poster-name']",
        ]),
        detail_shapes: vec![
            UrlShape::query_param("currentJobId"),
            UrlShape::path_contains("/jobs/view/"),
        ],
    }
}

fn indeed() -> SiteProfile {
    SiteProfile {
        id: "indeed".to_string(),
        host: "indeed.com".to_string(),
        description_selectors: owned(&["#jobDescriptionText", ".jobsearch-jobDescriptionText"]),
        title_selectors: owned(&[
            "h1.jobsearch-JobInfoHeader-title",
            "[data-testid='jobsearch-JobInfoHeader-title']",
        ]),
        company_selectors: owned(&[
            "[data-testid='inlineHeader-companyName']",
            "[data-company-name='true']",
            ".jobsearch-InlineCompanyRating a",
        ]),
        detail_shapes: vec![
            UrlShape::query_param("vjk"),
            UrlShape::query_param("jk"),
            UrlShape::path_contains("/viewjob"),
        ],
    }
}

fn naukri() -> SiteProfile {
    SiteProfile {
        id: "naukri".to_string(),
        host: "naukri.com".to_string(),
        description_selectors: owned(&[
            ".styles_JDC__dang-inner-html__h0K4t",
            ".job-description",
            ".jd-description",
            "[class*='description']",
        ]),
        title_selectors: owned(&["h1[class*='jd-header-title']", ".jd-header-title", "h1"]),
        company_selectors: owned(&[
            "[class*='jd-header-comp-name'] a",
            "[class*='jd-header-comp-name']",
            ".jd-header-comp-name",
        ]),
        detail_shapes: vec![UrlShape::path_contains("/job-listings")],
    }
}

/// The fixed allow-list of supported recruiting sites.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    profiles: Vec<SiteProfile>,
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SiteRegistry {
    pub fn builtin() -> Self {
        Self {
            profiles: vec![naukri(), indeed(), linkedin()],
        }
    }

    /// Site whose host substring matches the URL's hostname.
    pub fn for_url(&self, raw_url: &str) -> Option<&SiteProfile> {
        let host = crate::utils::host_of(raw_url)?;
        self.profiles.iter().find(|p| p.matches_host(&host))
    }

    /// Site for the URL, only when the URL is one of its job detail views.
    pub fn detail_site(&self, raw_url: &str) -> Option<&SiteProfile> {
        let url = Url::parse(raw_url).ok()?;
        self.profiles.iter().find(|p| p.is_job_detail(&url))
    }

    pub fn is_supported(&self, raw_url: &str) -> bool {
        self.for_url(raw_url).is_some()
    }
}
