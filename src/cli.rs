// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::core::{ConfigManager, FileCredentialStore, ResumeId, ServiceClient};
use crate::job_detection::pipeline::DetectionPipeline;
use crate::job_detection::{Extractor, MatchService, PageEvent, PageMonitor, SiteRegistry};
use crate::overlay::{ConsoleSurface, Point, WidgetController, WidgetRegion};
use crate::page::{FetchedPage, PageContext, StaticPage};
use crate::popup::{PopupPanel, StatusKind};

#[derive(Parser)]
#[command(name = "jobalytics")]
#[command(about = "Detect job postings and score them against your resume")]
pub struct CompanionCli {
    #[command(subcommand)]
    pub command: CompanionCommand,

    /// Configuration file (defaults to ./config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides config and JOBALYTICS_API_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum CompanionCommand {
    /// Watch a browsing session driven from stdin
    Watch {
        #[arg(long, default_value = "about:blank")]
        start: String,
    },
    /// Print the job text extracted from a page
    Extract {
        url: String,
        /// Read the document from a file instead of fetching it
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Run one detection pass and render the widget
    Score {
        url: String,
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Manual popup actions
    Popup {
        #[command(subcommand)]
        action: PopupAction,
    },
}

#[derive(Subcommand)]
pub enum PopupAction {
    /// Show resumes and saved job count
    Status,
    /// Match the page against a resume (first one when omitted)
    Match {
        url: String,
        #[arg(long)]
        resume: Option<String>,
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Save the page as a job
    Save {
        url: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        html: Option<PathBuf>,
    },
}

/// One line typed into `watch`.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchInput {
    Navigate(String),
    Event(PageEvent),
    Drag { dx: f64, dy: f64 },
}

pub fn parse_watch_line(line: &str) -> Option<WatchInput> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    match head {
        "close" => Some(WatchInput::Event(PageEvent::Close)),
        "save" => Some(WatchInput::Event(PageEvent::Save)),
        "drag" => {
            let dx = parts.next()?.parse().ok()?;
            let dy = parts.next()?.parse().ok()?;
            Some(WatchInput::Drag { dx, dy })
        }
        url if url.contains("://") => Some(WatchInput::Navigate(url.to_string())),
        _ => None,
    }
}

struct Companion {
    config: ConfigManager,
    sites: Arc<SiteRegistry>,
    extractor: Extractor,
    service: Arc<MatchService>,
}

impl Companion {
    fn build(config: ConfigManager) -> Result<Self> {
        let credentials = Arc::new(FileCredentialStore::new(
            config.environment.credentials_path.clone(),
        ));
        let client = ServiceClient::new(&config.environment.api_base_url, credentials)
            .context("Failed to create service client")?;
        let service = MatchService::new(
            Arc::new(client),
            config.match_timeouts(),
            config.environment.degraded_policy,
        );

        Ok(Self {
            sites: Arc::new(SiteRegistry::builtin()),
            extractor: Extractor::new(config.environment.max_text_chars),
            service: Arc::new(service),
            config,
        })
    }

    fn pipeline(&self, page: Arc<dyn PageContext>) -> DetectionPipeline {
        DetectionPipeline::new(
            page,
            self.sites.clone(),
            self.extractor.clone(),
            self.service.clone(),
        )
    }

    fn popup(&self) -> PopupPanel {
        PopupPanel::new(
            self.service.clone(),
            self.sites.clone(),
            self.extractor.clone(),
            self.config.environment.api_base_url.clone(),
        )
    }
}

async fn open_page(url: &str, html: Option<&Path>) -> Result<Arc<dyn PageContext>> {
    match html {
        Some(path) => {
            let document = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(Arc::new(StaticPage::new(url, document)))
        }
        None => Ok(Arc::new(FetchedPage::new(url)?)),
    }
}

pub async fn handle_command(cli: CompanionCli) -> Result<()> {
    let config = ConfigManager::load(cli.config.as_deref())?.with_api_url(cli.api_url);
    info!(
        "Environment: {}, backend: {}",
        config.environment_name, config.environment.api_base_url
    );
    let companion = Companion::build(config)?;

    match cli.command {
        CompanionCommand::Watch { start } => watch(&companion, start).await?,

        CompanionCommand::Extract { url, html } => {
            let page = open_page(&url, html.as_deref()).await?;
            let (_, job) = companion.pipeline(page).extract_current().await?;
            println!("{}", serde_json::to_string_pretty(&job)?);
        }

        CompanionCommand::Score { url, html } => {
            if companion.sites.detail_site(&url).is_none() {
                warn!("{} is not a recognized job detail page, scoring anyway", url);
            }
            let page = open_page(&url, html.as_deref()).await?;
            match companion.pipeline(page).detect(&url).await {
                Some(detection) => {
                    println!("Detected at {}", detection.detected_at.to_rfc3339());
                    let mut widget = WidgetController::new(ConsoleSurface);
                    widget.show(&detection.result);
                }
                None => println!("❌ Detection failed for {}", url),
            }
        }

        CompanionCommand::Popup { action } => popup(&companion, action).await?,
    }

    Ok(())
}

async fn popup(companion: &Companion, action: PopupAction) -> Result<()> {
    let panel = companion.popup();

    match action {
        PopupAction::Status => match panel.load().await {
            Ok(summary) => {
                match companion.service.backend().health().await {
                    Ok(health) => println!("Backend: {}", health.status),
                    Err(e) => warn!("Health check failed: {}", e),
                }
                println!("Saved jobs: {}", summary.job_count);
                if summary.resumes.is_empty() {
                    println!("No resumes uploaded");
                }
                for (id, name) in summary.resume_options() {
                    println!("  [{}] {}", id, name);
                }
            }
            Err(status) => println!("❌ {}", status.message),
        },

        PopupAction::Match { url, resume, html } => {
            let resume_id = match resume {
                Some(raw) => Some(ResumeId::parse(&raw)),
                None => match panel.load().await {
                    Ok(summary) => summary.resumes.into_iter().next().map(|r| r.id),
                    Err(status) => {
                        println!("❌ {}", status.message);
                        return Ok(());
                    }
                },
            };
            let page = open_page(&url, html.as_deref()).await?;
            let status = panel.show_match(resume_id.as_ref(), page.as_ref()).await;
            print_status(status.kind, &status.message);
        }

        PopupAction::Save {
            url,
            title,
            company,
            html,
        } => {
            let page = open_page(&url, html.as_deref()).await?;
            let status = panel.save_job(&title, &company, page.as_ref()).await;
            print_status(status.kind, &status.message);
        }
    }

    Ok(())
}

fn print_status(kind: StatusKind, message: &str) {
    match kind {
        StatusKind::Success => println!("✅ {}", message),
        StatusKind::Error => println!("❌ {}", message),
    }
}

async fn watch(companion: &Companion, start: String) -> Result<()> {
    let page = Arc::new(FetchedPage::new(start)?);
    let monitor = PageMonitor::new(
        companion.pipeline(page.clone()),
        ConsoleSurface,
        companion.config.monitor_timing(),
    );

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (eof_tx, eof_rx) = oneshot::channel::<()>();

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            };

            let sent = match parse_watch_line(&line) {
                Some(WatchInput::Navigate(url)) => {
                    page.navigate(url);
                    events_tx.send(PageEvent::DomMutated)
                }
                Some(WatchInput::Event(event)) => events_tx.send(event),
                Some(WatchInput::Drag { dx, dy }) => events_tx
                    .send(PageEvent::PointerDown {
                        region: WidgetRegion::Header,
                        at: Point::default(),
                    })
                    .and_then(|_| events_tx.send(PageEvent::PointerMove { at: Point::new(dx, dy) }))
                    .and_then(|_| events_tx.send(PageEvent::PointerUp)),
                None => {
                    if !line.trim().is_empty() {
                        println!("Unrecognized input: {}", line.trim());
                    }
                    Ok(())
                }
            };
            if sent.is_err() {
                break;
            }
        }
        let _ = eof_tx.send(());
    });

    let shutdown = async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Interrupted"),
            _ = eof_rx => info!("Input closed"),
        }
    };

    let monitor = monitor.run(events_rx, shutdown).await;
    reader.abort();
    info!(
        "Stopped after {} detection(s), last URL {}",
        monitor.pipelines_started(),
        monitor.navigation().last_url()
    );
    Ok(())
}
