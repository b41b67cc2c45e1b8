// src/overlay/widget.rs
use tracing::debug;
use uuid::Uuid;

use super::render::{render_widget, ScoreLabel};
use super::surface::{Notice, OverlayElement, OverlaySurface, Point};
use crate::job_detection::MatchResult;

pub const DEFAULT_POSITION: Point = Point { x: 20.0, y: 80.0 };

/// Pointer targets on the widget. Only the header and score area drag;
/// the buttons stay plain click targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetRegion {
    Header,
    Score,
    CloseButton,
    SaveButton,
}

impl WidgetRegion {
    pub fn is_drag_handle(&self) -> bool {
        matches!(self, WidgetRegion::Header | WidgetRegion::Score)
    }
}

/// Lives from pointer-down on a handle until pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub origin_pointer: Point,
    pub origin_position: Point,
}

impl DragSession {
    fn position_for(&self, pointer: Point) -> Point {
        Point {
            x: self.origin_position.x + (pointer.x - self.origin_pointer.x),
            y: self.origin_position.y + (pointer.y - self.origin_pointer.y),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetInstance {
    pub id: Uuid,
    pub percent: u32,
    pub label: ScoreLabel,
    pub degraded: bool,
    pub position: Point,
    pub drag: Option<DragSession>,
}

/// Owns the single on-page widget.
pub struct WidgetController<S: OverlaySurface> {
    surface: S,
    current: Option<WidgetInstance>,
}

impl<S: OverlaySurface> WidgetController<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            current: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn current(&self) -> Option<&WidgetInstance> {
        self.current.as_ref()
    }

    /// Replaces whatever is showing with a widget for `result`.
    pub fn show(&mut self, result: &MatchResult) -> &WidgetInstance {
        self.dismiss();

        let percent = result.percent();
        let instance = WidgetInstance {
            id: Uuid::new_v4(),
            percent,
            label: ScoreLabel::for_percent(percent),
            degraded: result.is_degraded(),
            position: DEFAULT_POSITION,
            drag: None,
        };

        self.surface.mount(OverlayElement {
            id: instance.id.to_string(),
            markup: render_widget(&instance),
            position: instance.position,
        });
        debug!("Widget {} shown at {}%", instance.id, percent);

        self.current.insert(instance)
    }

    /// Removes the widget without replacement. Returns whether one was showing.
    pub fn dismiss(&mut self) -> bool {
        match self.current.take() {
            Some(instance) => {
                self.surface.unmount(&instance.id.to_string());
                debug!("Widget {} removed", instance.id);
                true
            }
            None => false,
        }
    }

    pub fn notify(&mut self, notice: Notice) {
        self.surface.notify(notice);
    }

    /// Starts a drag when the pointer lands on a handle.
    pub fn pointer_down(&mut self, region: WidgetRegion, at: Point) -> bool {
        let Some(instance) = self.current.as_mut() else {
            return false;
        };
        if !region.is_drag_handle() {
            return false;
        }
        instance.drag = Some(DragSession {
            origin_pointer: at,
            origin_position: instance.position,
        });
        true
    }

    pub fn pointer_move(&mut self, at: Point) {
        let Some(instance) = self.current.as_mut() else {
            return;
        };
        let Some(session) = instance.drag else {
            return;
        };
        instance.position = session.position_for(at);
        self.surface
            .reposition(&instance.id.to_string(), instance.position);
    }

    pub fn pointer_up(&mut self) {
        if let Some(instance) = self.current.as_mut() {
            instance.drag = None;
        }
    }
}
