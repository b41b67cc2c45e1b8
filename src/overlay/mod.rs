// src/overlay/mod.rs
pub mod render;
pub mod surface;
pub mod widget;

pub use render::{render_widget, ScoreLabel};
pub use surface::{ConsoleSurface, InMemorySurface, Notice, OverlayElement, OverlaySurface, Point};
pub use widget::{DragSession, WidgetController, WidgetInstance, WidgetRegion};
