pub mod chart;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod drag;
pub mod edges;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod popup;
pub mod render;
pub mod surface;
pub mod text_metrics;
pub mod theme;
pub mod topology;
pub mod viewport;

pub use chart::RelationChart;
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{ChartOptions, Config};
pub use error::{ChartError, Result};
pub use ir::{Annotations, FlatNode, NodeData, Style};
pub use layout::Placement;
pub use surface::{RenderSurface, SvgSurface};
pub use theme::Theme;

/// Everything needed to turn a node tree into a standalone SVG in one call. Edge annotations
/// only matter to hosts that forward clicks, so they are set on a [`RelationChart`] instead.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub chart: ChartOptions,
}

impl RenderOptions {
    pub fn classic() -> Self {
        Self::with_theme(Theme::classic())
    }

    pub fn modern() -> Self {
        Self::with_theme(Theme::modern())
    }

    fn with_theme(theme: Theme) -> Self {
        Self {
            chart: ChartOptions::default().with_theme(&theme),
            theme,
        }
    }
}

impl From<Config> for RenderOptions {
    fn from(config: Config) -> Self {
        Self {
            theme: config.theme,
            chart: config.options,
        }
    }
}

/// Parses `input` (JSON or JSON5), renders it onto a fresh [`SvgSurface`] and serializes it.
pub fn render_with_options(input: &str, options: RenderOptions) -> Result<String> {
    let data = parser::parse_chart_input(input)?;
    let surface = SvgSurface::new().with_background(options.theme.background.clone());
    let mut chart = RelationChart::new(surface, options.chart).with_theme(options.theme);
    chart.render(&data)?;
    Ok(render::render_svg(chart.surface()))
}
