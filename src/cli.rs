use crate::chart::RelationChart;
use crate::config::load_config;
use crate::layout_dump::write_layout_dump;
use crate::parser::{parse_annotations, parse_chart_input};
use crate::render::{render_svg, write_output_png, write_output_svg};
use crate::surface::SvgSurface;
use crate::viewport::Key;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

static DRAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([^:]+?)\s*:\s*(-?[0-9]*\.?[0-9]+)\s*,\s*(-?[0-9]*\.?[0-9]+)\s*$").unwrap()
});

#[derive(Parser, Debug)]
#[command(name = "relchart", version, about = "Radial relation chart renderer")]
pub struct Args {
    /// Input file (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Annotation JSON file mapping "parentId-childId" to popup items
    #[arg(short = 'a', long = "annotations")]
    pub annotations: Option<PathBuf>,

    /// Config JSON file (theme, size, styles, themeVariables)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Width, overrides the config file
    #[arg(short = 'w', long = "width")]
    pub width: Option<f64>,

    /// Height, overrides the config file
    #[arg(short = 'H', long = "height")]
    pub height: Option<f64>,

    /// Drag a node before rendering, e.g. `B:10,-5`. Repeatable.
    #[arg(long = "drag", value_parser = parse_drag)]
    pub drags: Vec<DragStep>,

    /// Press an arrow key before rendering. Repeatable.
    #[arg(long = "pan", value_parser = parse_pan)]
    pub pans: Vec<Key>,

    /// Write node placements and edges as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

/// One scripted pointer gesture: press on `node`, move by `(dx, dy)`, release.
#[derive(Debug, Clone, PartialEq)]
pub struct DragStep {
    pub node: String,
    pub dx: f64,
    pub dy: f64,
}

fn parse_drag(value: &str) -> std::result::Result<DragStep, String> {
    let caps = DRAG_RE
        .captures(value)
        .ok_or_else(|| format!("expected ID:DX,DY, got '{value}'"))?;
    let number = |idx: usize| {
        caps[idx]
            .parse::<f64>()
            .map_err(|err| format!("bad offset in '{value}': {err}"))
    };
    Ok(DragStep {
        node: caps[1].to_string(),
        dx: number(2)?,
        dy: number(3)?,
    })
}

fn parse_pan(value: &str) -> std::result::Result<Key, String> {
    value.parse()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RELCHART_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = load_config(args.config.as_deref()).context("failed to load config")?;
    if let Some(width) = args.width {
        config.options.width = width;
    }
    if let Some(height) = args.height {
        config.options.height = height;
    }
    if config.options.width <= 0.0 || config.options.height <= 0.0 {
        anyhow::bail!(
            "canvas size must be positive, got {}x{}",
            config.options.width,
            config.options.height
        );
    }

    let input = read_input(args.input.as_deref())?;
    let data = parse_chart_input(&input)?;
    let annotations = match args.annotations.as_deref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_annotations(&raw)?
        }
        None => Default::default(),
    };

    let surface = SvgSurface::new().with_background(config.theme.background.clone());
    let mut chart = RelationChart::new(surface, config.options.clone())
        .with_theme(config.theme.clone())
        .with_annotations(annotations);
    chart.render(&data)?;

    for step in &args.drags {
        chart.drag_start(&step.node)?;
        chart.drag_move(&step.node, step.dx, step.dy)?;
        chart.drag_end(&step.node)?;
    }
    for key in &args.pans {
        chart.key_down(*key);
    }

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &chart)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    let svg = render_svg(chart.surface());
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, config.options.width, config.options.height)?;
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
