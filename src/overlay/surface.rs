// src/overlay/surface.rs
use std::fmt;

/// Absolute page coordinates in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A mounted overlay element.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayElement {
    pub id: String,
    pub markup: String,
    pub position: Point,
}

/// User-visible transient message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    JobSaved,
    SaveFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::JobSaved => write!(f, "Job saved successfully!"),
            Notice::SaveFailed(_) => write!(f, "Failed to save job"),
        }
    }
}

/// Where overlay elements live. Only the widget controller talks to it.
pub trait OverlaySurface: Send {
    fn mount(&mut self, element: OverlayElement);
    fn unmount(&mut self, id: &str);
    fn reposition(&mut self, id: &str, position: Point);
    fn notify(&mut self, notice: Notice);
}

/// Keeps elements in memory, in mount order.
#[derive(Debug, Default)]
pub struct InMemorySurface {
    pub elements: Vec<OverlayElement>,
    pub notices: Vec<Notice>,
}

impl InMemorySurface {
    pub fn element(&self, id: &str) -> Option<&OverlayElement> {
        self.elements.iter().find(|e| e.id == id)
    }
}

impl OverlaySurface for InMemorySurface {
    fn mount(&mut self, element: OverlayElement) {
        self.elements.push(element);
    }

    fn unmount(&mut self, id: &str) {
        self.elements.retain(|e| e.id != id);
    }

    fn reposition(&mut self, id: &str, position: Point) {
        if let Some(element) = self.elements.iter_mut().find(|e| e.id == id) {
            element.position = position;
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// Prints overlay activity to stdout for the CLI.
#[derive(Debug, Default)]
pub struct ConsoleSurface;

impl OverlaySurface for ConsoleSurface {
    fn mount(&mut self, element: OverlayElement) {
        println!(
            "[overlay {}] mounted at ({:.0}, {:.0})\n{}",
            element.id, element.position.x, element.position.y, element.markup
        );
    }

    fn unmount(&mut self, id: &str) {
        println!("[overlay {}] removed", id);
    }

    fn reposition(&mut self, id: &str, position: Point) {
        println!("[overlay {}] moved to ({:.0}, {:.0})", id, position.x, position.y);
    }

    fn notify(&mut self, notice: Notice) {
        match &notice {
            Notice::SaveFailed(reason) => println!("[notice] {} ({})", notice, reason),
            Notice::JobSaved => println!("[notice] {}", notice),
        }
    }
}
