use relation_chart::{RenderOptions, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartRenderOptions {
    theme: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    font_family: Option<String>,
    font_size: Option<f32>,
}

fn build_render_options(options: ChartRenderOptions) -> RenderOptions {
    let mut theme = if options.theme.as_deref() == Some("modern") {
        relation_chart::Theme::modern()
    } else {
        relation_chart::Theme::classic()
    };

    if let Some(font_family) = options.font_family {
        theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        theme.font_size = font_size;
    }

    let mut chart = relation_chart::ChartOptions::default().with_theme(&theme);
    if let Some(width) = options.width {
        chart.width = width;
    }
    if let Some(height) = options.height {
        chart.height = height;
    }

    RenderOptions { theme, chart }
}

#[wasm_bindgen]
pub fn render_relation_svg(data: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<ChartRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        ChartRenderOptions::default()
    };

    render_with_options(data, build_render_options(options))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}
