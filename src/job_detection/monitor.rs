// src/job_detection/monitor.rs
//! Turns navigation churn into at most one detection per distinct URL.
//!
//! Three triggers feed the same check: one at install time, a fixed poll of
//! the current URL, and DOM mutation events. The check updates the
//! navigation state before anything asynchronous is scheduled, so two
//! triggers seeing the same new URL cannot both pass it.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::pipeline::DetectionPipeline;
use super::{Detection, JobPosting};
use crate::overlay::{Notice, OverlaySurface, Point, WidgetController, WidgetRegion};

/// Inputs arriving from the page besides the URL poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    DomMutated,
    Close,
    Save,
    PointerDown { region: WidgetRegion, at: Point },
    PointerMove { at: Point },
    PointerUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Install,
    Poll,
    Mutation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Unchanged,
    NotJobPage,
    Scheduled(String),
}

/// The last URL a check has looked at.
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    last_url: String,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_url(&self) -> &str {
        &self.last_url
    }

    /// Records `url`; true only when it differs from the previous one.
    pub fn observe(&mut self, url: &str) -> bool {
        if self.last_url == url {
            return false;
        }
        self.last_url = url.to_string();
        true
    }

    pub fn is_current(&self, url: &str) -> bool {
        self.last_url == url
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorTiming {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
}

impl Default for MonitorTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            settle_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
struct PendingDetection {
    url: String,
    due: Instant,
}

type InFlight = Pin<Box<dyn Future<Output = (String, Option<Detection>)> + Send>>;
type SaveInFlight = Pin<Box<dyn Future<Output = anyhow::Result<JobPosting>> + Send>>;

pub struct PageMonitor<S: OverlaySurface> {
    pipeline: DetectionPipeline,
    state: NavigationState,
    widget: WidgetController<S>,
    timing: MonitorTiming,
    pending: Option<PendingDetection>,
    pipelines_started: usize,
    last_detection: Option<Detection>,
}

impl<S: OverlaySurface> PageMonitor<S> {
    pub fn new(pipeline: DetectionPipeline, surface: S, timing: MonitorTiming) -> Self {
        Self {
            pipeline,
            state: NavigationState::new(),
            widget: WidgetController::new(surface),
            timing,
            pending: None,
            pipelines_started: 0,
            last_detection: None,
        }
    }

    pub fn widget(&self) -> &WidgetController<S> {
        &self.widget
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.state
    }

    pub fn pipelines_started(&self) -> usize {
        self.pipelines_started
    }

    pub fn last_detection(&self) -> Option<&Detection> {
        self.last_detection.as_ref()
    }

    /// The idempotent check every trigger runs.
    pub fn check(&mut self, trigger: Trigger) -> CheckOutcome {
        let url = self.pipeline.page().current_url();
        if !self.state.observe(&url) {
            return CheckOutcome::Unchanged;
        }

        let Some(site) = self.pipeline.sites().detail_site(&url) else {
            debug!("{:?}: {} is not a job detail page", trigger, url);
            return CheckOutcome::NotJobPage;
        };

        info!("{:?}: job detail page on {} detected: {}", trigger, site.id, url);
        self.widget.dismiss();
        self.pending = Some(PendingDetection {
            url: url.clone(),
            due: Instant::now() + self.timing.settle_delay,
        });
        CheckOutcome::Scheduled(url)
    }

    /// Drives the monitor until `shutdown` resolves, then hands it back.
    pub async fn run<F>(mut self, mut events: mpsc::UnboundedReceiver<PageEvent>, shutdown: F) -> Self
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        self.check(Trigger::Install);

        let mut poll = tokio::time::interval_at(
            Instant::now() + self.timing.poll_interval,
            self.timing.poll_interval,
        );
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight: Option<InFlight> = None;
        let mut saving: Option<SaveInFlight> = None;
        let mut events_open = true;

        loop {
            let due = self.pending.as_ref().map(|p| p.due);

            tokio::select! {
                _ = &mut shutdown => break,
                _ = poll.tick() => {
                    self.check(Trigger::Poll);
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event, &mut saving),
                    None => events_open = false,
                },
                _ = tokio::time::sleep_until(due.unwrap_or_else(Instant::now)), if due.is_some() => {
                    if let Some(flight) = self.start_pending() {
                        in_flight = Some(flight);
                    }
                }
                (url, detection) = async {
                    match in_flight.as_mut() {
                        Some(flight) => flight.await,
                        None => std::future::pending().await,
                    }
                }, if in_flight.is_some() => {
                    in_flight = None;
                    self.complete(&url, detection);
                }
                outcome = async {
                    match saving.as_mut() {
                        Some(save) => save.await,
                        None => std::future::pending().await,
                    }
                }, if saving.is_some() => {
                    saving = None;
                    self.finish_save(outcome);
                }
            }
        }

        self
    }

    fn start_pending(&mut self) -> Option<InFlight> {
        let pending = self.pending.take()?;
        if !self.state.is_current(&pending.url) {
            debug!("Skipping detection for {}, page has moved on", pending.url);
            return None;
        }

        self.pipelines_started += 1;
        let pipeline = self.pipeline.clone();
        let url = pending.url;
        Some(Box::pin(async move {
            let detection = pipeline.detect(&url).await;
            (url, detection)
        }))
    }

    fn complete(&mut self, url: &str, detection: Option<Detection>) {
        // Navigation state lags the page by up to one poll, so ask the page too.
        if !self.state.is_current(url) || self.pipeline.page().current_url() != url {
            info!("Discarding stale detection for {}", url);
            return;
        }
        if let Some(detection) = detection {
            info!(
                "Showing {}% for {} (detected at {})",
                detection.result.percent(),
                url,
                detection.detected_at.to_rfc3339()
            );
            self.widget.show(&detection.result);
            self.last_detection = Some(detection);
        }
    }

    fn handle_event(&mut self, event: PageEvent, saving: &mut Option<SaveInFlight>) {
        match event {
            PageEvent::DomMutated => {
                self.check(Trigger::Mutation);
            }
            PageEvent::Close => {
                self.widget.dismiss();
            }
            PageEvent::PointerDown { region, at } => {
                self.widget.pointer_down(region, at);
            }
            PageEvent::PointerMove { at } => self.widget.pointer_move(at),
            PageEvent::PointerUp => self.widget.pointer_up(),
            PageEvent::Save if saving.is_some() => debug!("Save already in progress"),
            PageEvent::Save => *saving = self.start_save(),
        }
    }

    /// The save call runs beside the loop like a detection does.
    fn start_save(&mut self) -> Option<SaveInFlight> {
        if self.widget.current().is_none() {
            debug!("Save requested with no widget showing");
            return None;
        }
        let pipeline = self.pipeline.clone();
        Some(Box::pin(async move { pipeline.save_current().await }))
    }

    fn finish_save(&mut self, outcome: anyhow::Result<JobPosting>) {
        match outcome {
            Ok(_) => self.widget.notify(Notice::JobSaved),
            Err(e) => {
                warn!("Job save failed: {:#}", e);
                self.widget.notify(Notice::SaveFailed(format!("{:#}", e)));
            }
        }
    }
}
