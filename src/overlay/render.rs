// src/overlay/render.rs
use super::widget::WidgetInstance;

pub const WIDGET_ELEMENT_ID: &str = "jobalytics-widget";
pub const DEGRADED_NOTICE: &str = "Approximate score (offline mode)";

/// Qualitative band for a rounded percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreLabel {
    Excellent,
    Good,
    Fair,
    Low,
}

impl ScoreLabel {
    pub fn for_percent(percent: u32) -> Self {
        match percent {
            80.. => ScoreLabel::Excellent,
            60..=79 => ScoreLabel::Good,
            40..=59 => ScoreLabel::Fair,
            _ => ScoreLabel::Low,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            ScoreLabel::Excellent => "Excellent Match",
            ScoreLabel::Good => "Good Match",
            ScoreLabel::Fair => "Fair Match",
            ScoreLabel::Low => "Low Match",
        }
    }
}

pub fn render_widget(instance: &WidgetInstance) -> String {
    let degraded = if instance.degraded {
        format!(r#"<p class="jobalytics-degraded">{}</p>"#, DEGRADED_NOTICE)
    } else {
        String::new()
    };

    format!(
        r#"<div id="{id}" data-instance="{instance_id}" style="position:fixed;left:{x:.0}px;top:{y:.0}px">
  <div class="jobalytics-header" data-drag-handle="header">
    <span>Jobalytics Match</span>
    <button id="jobalytics-close" aria-label="Close">&times;</button>
  </div>
  <div class="jobalytics-score" data-drag-handle="score">
    <div class="score-circle" style="background: conic-gradient(#667eea {deg:.1}deg, #e0e0e0 0deg)">
      <div class="score-inner"><span class="score-value">{percent}%</span></div>
    </div>
    <p class="score-label">{label}</p>
    {degraded}
  </div>
  <button id="jobalytics-save" class="save-btn">Save Job</button>
</div>"#,
        id = WIDGET_ELEMENT_ID,
        instance_id = instance.id,
        x = instance.position.x,
        y = instance.position.y,
        deg = f64::from(instance.percent) * 3.6,
        percent = instance.percent,
        label = instance.label.text(),
        degraded = degraded,
    )
}
