use crate::ir::Style;
use crate::surface::{Handle, Shape, SvgSurface};
use anyhow::Result;
use std::path::Path;

/// Serializes the scene to a standalone SVG document.
pub fn render_svg(surface: &SvgSurface) -> String {
    let mut svg = String::new();
    let (width, height) = surface.size();
    let view_box = surface.view_box_attr();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"{}\" data-container=\"{}\" width=\"{width}\" height=\"{height}\" viewBox=\"{view_box}\"",
        escape_xml(surface.element_id()),
        escape_xml(surface.container()),
    ));
    if let Some(background) = surface.background() {
        svg.push_str(&format!(" style=\"background:{}\"", escape_xml(background)));
    }
    svg.push('>');

    for handle in surface.top_level() {
        push_object(&mut svg, surface, *handle);
    }

    svg.push_str("</svg>");
    svg
}

/// `M x1,y1 L x2,y2 ...` without separating spaces, e.g. `M400,240L544,240`.
pub fn path_data(points: &[(f64, f64)]) -> String {
    let mut d = String::new();
    for (idx, (x, y)) in points.iter().enumerate() {
        let command = if idx == 0 { 'M' } else { 'L' };
        d.push_str(&format!("{command}{x},{y}"));
    }
    d
}

fn push_object(svg: &mut String, surface: &SvgSurface, handle: Handle) {
    let Some(object) = surface.object(handle) else {
        return;
    };
    match &object.shape {
        Shape::Circle { cx, cy, r } => {
            svg.push_str(&format!(
                "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{r}\"{}/>",
                style_attrs(&object.style, &[])
            ));
        }
        Shape::Text { x, y, content } => {
            svg.push_str(&format!(
                "<text x=\"{x}\" y=\"{y}\"{}>{}</text>",
                style_attrs(
                    &object.style,
                    &[("text-anchor", "middle"), ("dominant-baseline", "central")]
                ),
                escape_xml(content)
            ));
        }
        Shape::Path { points } => {
            svg.push_str(&format!(
                "<path d=\"{}\"{}/>",
                path_data(points),
                style_attrs(&object.style, &[("fill", "none")])
            ));
        }
        Shape::Group { members } => {
            svg.push_str(&format!("<g{}>", style_attrs(&object.style, &[])));
            for member in members {
                push_object(svg, surface, *member);
            }
            svg.push_str("</g>");
        }
    }
}

/// Style attributes, preceded by every default the style does not set itself.
fn style_attrs(style: &Style, defaults: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (key, value) in defaults {
        if style.get(key).is_none() {
            out.push_str(&format!(" {key}=\"{value}\""));
        }
    }
    for (key, value) in style.iter() {
        out.push_str(&format!(" {}=\"{}\"", escape_xml(key), escape_xml(value)));
    }
    out
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, width: f64, height: f64) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Arial".to_string();
    opt.default_size = usvg::Size::from_wh(width as f32, height as f32)
        .unwrap_or(usvg::Size::from_wh(800.0, 480.0).unwrap());

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    let transform = resvg::tiny_skia::Transform::default();
    resvg::render(&tree, transform, &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _width: f64, _height: f64) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
