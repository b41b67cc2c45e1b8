// src/lib.rs
//! Job-posting detection for a browser companion: recognizes job detail
//! pages on supported boards, scores them against the user's resume and
//! keeps a single draggable score widget on the page.

pub mod cli;
pub mod core;
pub mod job_detection;
pub mod overlay;
pub mod page;
pub mod popup;
pub mod utils;

pub use crate::core::{ConfigManager, ServiceClient, ServiceError};
pub use job_detection::{
    Detection, DetectionPipeline, JobPosting, MatchResult, MatchService, PageMonitor,
    SiteRegistry,
};
pub use page::{FetchedPage, PageContext, PageSnapshot, StaticPage};
