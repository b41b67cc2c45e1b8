// src/job_detection/heuristic.rs
//! Offline stand-in score. Results from here are always reported as
//! degraded so the widget can say the number is approximate.

use rand::Rng;

pub const BASE_SCORE: u32 = 45;
pub const PER_KEYWORD: u32 = 5;
pub const MAX_SCORE: u32 = 95;
/// Jitter is drawn from `0..JITTER_SPAN`.
pub const JITTER_SPAN: u32 = 10;

const DEFAULT_KEYWORDS: &[&str] = &[
    "python", "java", "javascript", "typescript", "c++", "c#", "rust", "golang", "scala",
    "kotlin", "swift", "php", "ruby", "react", "angular", "vue", "node", "django", "flask",
    "fastapi", "spring", "html", "css", "sql", "postgres", "mongodb", "redis", "aws",
    "azure", "gcp", "docker", "kubernetes", "terraform", "git", "linux", "graphql",
    "machine learning", "tensorflow", "pytorch",
];

#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    keywords: Vec<String>,
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect())
    }
}

impl HeuristicScorer {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Distinct keywords present in the text, case-insensitive.
    pub fn matched_keywords(&self, text: &str) -> Vec<&str> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Deterministic part of the score.
    pub fn base_score(&self, text: &str) -> u32 {
        self.score_with_jitter(text, 0)
    }

    pub fn score_with_jitter(&self, text: &str, jitter: u32) -> u32 {
        let matches = self.matched_keywords(text).len() as u32;
        BASE_SCORE
            .saturating_add(PER_KEYWORD.saturating_mul(matches))
            .saturating_add(jitter.min(JITTER_SPAN - 1))
            .min(MAX_SCORE)
    }

    /// Percentage in `[45, 95]`.
    pub fn score(&self, text: &str) -> u32 {
        let jitter = rand::thread_rng().gen_range(0..JITTER_SPAN);
        self.score_with_jitter(text, jitter)
    }
}
