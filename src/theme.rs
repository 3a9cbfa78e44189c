use crate::ir::Style;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub circle_fill: String,
    pub circle_stroke: String,
    pub circle_stroke_width: f32,
    pub font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub edge_color: String,
    pub edge_width: f32,
    pub marker_color: String,
    pub marker_text_color: String,
    pub marker_radius: f64,
    pub marker_label: String,
    pub background: String,
}

impl Theme {
    /// Palette of the original relation widget.
    pub fn classic() -> Self {
        Self {
            circle_fill: "#94CFF6".to_string(),
            circle_stroke: "#82BDF5".to_string(),
            circle_stroke_width: 1.0,
            font_family: "Arial".to_string(),
            font_size: 14.0,
            text_color: "#fff".to_string(),
            edge_color: "#c6d9ec".to_string(),
            edge_width: 2.0,
            marker_color: "#c6d9ec".to_string(),
            marker_text_color: "#fff".to_string(),
            marker_radius: 8.0,
            marker_label: "?".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            circle_fill: "#F8FAFF".to_string(),
            circle_stroke: "#C7D2E5".to_string(),
            circle_stroke_width: 1.4,
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            text_color: "#1C2430".to_string(),
            edge_color: "#7A8AA6".to_string(),
            edge_width: 1.4,
            marker_color: "#EEF2F8".to_string(),
            marker_text_color: "#1C2430".to_string(),
            marker_radius: 8.0,
            marker_label: "?".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn circle_style(&self) -> Style {
        Style::new()
            .with("fill", self.circle_fill.clone())
            .with("stroke", self.circle_stroke.clone())
            .with("stroke-width", format!("{}", self.circle_stroke_width))
    }

    pub fn text_style(&self) -> Style {
        Style::new()
            .with("font-size", format!("{}px", self.font_size))
            .with("font-family", self.font_family.clone())
            .with("fill", self.text_color.clone())
    }

    pub fn edge_style(&self) -> Style {
        Style::new()
            .with("stroke", self.edge_color.clone())
            .with("stroke-width", format!("{}", self.edge_width))
    }

    pub fn marker_circle_style(&self) -> Style {
        Style::new()
            .with("fill", self.marker_color.clone())
            .with("stroke", self.marker_color.clone())
    }

    pub fn marker_text_style(&self) -> Style {
        Style::new().with("stroke", self.marker_text_color.clone())
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
