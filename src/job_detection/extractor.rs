// src/job_detection/extractor.rs
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::sites::SiteProfile;
use super::{ExtractedJob, TextSource};
use crate::page::PageSnapshot;
use crate::utils::{clean_text, truncate_chars};

/// Upper bound on description text sent to the scorer.
pub const MAX_TEXT_CHARS: usize = 5000;

const NON_RENDERED: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Pulls job text out of a page, first matching selector wins.
#[derive(Debug, Clone)]
pub struct Extractor {
    max_chars: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(MAX_TEXT_CHARS)
    }
}

impl Extractor {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn extract(&self, snapshot: &PageSnapshot, site: Option<&SiteProfile>) -> ExtractedJob {
        let document = Html::parse_document(&snapshot.html);

        let Some(site) = site else {
            debug!("Unrecognized site, using full page text for {}", snapshot.url);
            return self.full_page(&document, None, None);
        };

        let title = find_text_by_selectors(&document, &site.title_selectors).map(|(t, _)| t);
        let company = find_text_by_selectors(&document, &site.company_selectors).map(|(t, _)| t);

        match find_text_by_selectors(&document, &site.description_selectors) {
            Some((text, selector)) => ExtractedJob {
                text: truncate_chars(&text, self.max_chars),
                title,
                company,
                source: TextSource::Selector(selector),
            },
            None => {
                warn!("No description selector matched on {}, falling back to page text", site.id);
                self.full_page(&document, title, company)
            }
        }
    }

    fn full_page(
        &self,
        document: &Html,
        title: Option<String>,
        company: Option<String>,
    ) -> ExtractedJob {
        let text = match Selector::parse("body") {
            Ok(body) => document
                .select(&body)
                .next()
                .map(rendered_text)
                .unwrap_or_else(|| rendered_text(document.root_element())),
            Err(_) => rendered_text(document.root_element()),
        };

        ExtractedJob {
            text: truncate_chars(&text, self.max_chars),
            title,
            company,
            source: TextSource::FullPage,
        }
    }
}

fn find_text_by_selectors(document: &Html, selectors: &[String]) -> Option<(String, String)> {
    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            warn!("Skipping invalid selector: {}", selector_str);
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = rendered_text(element);
            if !text.is_empty() {
                return Some((text, selector_str.clone()));
            }
        }
    }
    None
}

/// Text a user would see inside the element.
fn rendered_text(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(element, &mut parts);
    clean_text(&parts.join(" "))
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let text: &str = &text.text;
            out.push(text.to_owned());
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !NON_RENDERED.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        }
    }
}
