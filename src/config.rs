use crate::error::{ChartError, Result};
use crate::ir::Style;
use crate::layout::Placement;
use crate::theme::Theme;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options recognised by a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartOptions {
    /// Selector of the element the host mounts the chart into.
    pub container: String,
    pub width: f64,
    pub height: f64,
    /// Placements to use instead of computed ones, keyed by node id.
    pub shapes: IndexMap<String, Placement>,
    pub circle_style: Style,
    pub text_style: Style,
}

impl ChartOptions {
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.circle_style = theme.circle_style();
        self.text_style = theme.text_style();
        self
    }
}

impl Default for ChartOptions {
    fn default() -> Self {
        let theme = Theme::classic();
        Self {
            container: "body".to_string(),
            width: 800.0,
            height: 480.0,
            shapes: IndexMap::new(),
            circle_style: theme.circle_style(),
            text_style: theme.text_style(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub options: ChartOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    edge_color: Option<String>,
    edge_width: Option<f32>,
    marker_color: Option<String>,
    marker_text_color: Option<String>,
    marker_radius: Option<f64>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    container: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    shapes: Option<IndexMap<String, Placement>>,
    circle_style: Option<Style>,
    text_style: Option<Style>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_config(&contents)?)
}

/// Parses a config document (JSON, or JSON5 as a fallback) on top of the defaults.
pub fn parse_config(contents: &str) -> Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|_| ChartError::invalid_config(json_err.to_string()))?,
    };

    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => {
                return Err(ChartError::invalid_config(format!("unknown theme '{other}'")));
            }
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.edge_color {
            config.theme.edge_color = v;
        }
        if let Some(v) = vars.edge_width {
            config.theme.edge_width = v;
        }
        if let Some(v) = vars.marker_color {
            config.theme.marker_color = v;
        }
        if let Some(v) = vars.marker_text_color {
            config.theme.marker_text_color = v;
        }
        if let Some(v) = vars.marker_radius {
            config.theme.marker_radius = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    config.options = config.options.with_theme(&config.theme);
    if let Some(v) = parsed.container {
        config.options.container = v;
    }
    if let Some(v) = parsed.width {
        config.options.width = v;
    }
    if let Some(v) = parsed.height {
        config.options.height = v;
    }
    if let Some(v) = parsed.shapes {
        config.options.shapes = v;
    }
    // A chart-level style replaces the theme default wholesale; only per-node styles merge.
    if let Some(v) = parsed.circle_style {
        config.options.circle_style = v;
    }
    if let Some(v) = parsed.text_style {
        config.options.text_style = v;
    }

    if config.options.width <= 0.0 || config.options.height <= 0.0 {
        return Err(ChartError::invalid_config(format!(
            "canvas size must be positive, got {}x{}",
            config.options.width, config.options.height
        )));
    }

    Ok(config)
}
