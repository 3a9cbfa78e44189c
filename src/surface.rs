//! Drawing-surface capability consumed by the chart, and a retained SVG scene implementing it.

use crate::ir::Style;
use crate::text_metrics::{
    DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, LINE_HEIGHT, measure_text_width, parse_font_size,
};
use indexmap::IndexMap;
use serde::Serialize;

/// Opaque reference to something drawn on a surface. Never reused by a surface, so a handle
/// that outlived a `clear` simply stops matching anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Handle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    pub fn union(&self, other: &BBox) -> BBox {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        BBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// What the chart needs from a drawing library.
///
/// Mutators ignore handles the surface does not know (for instance after `clear`).
pub trait RenderSurface {
    /// Attaches the surface to the host. Called once by the chart before anything is drawn.
    fn mount(&mut self, element_id: &str, container: &str, width: f64, height: f64);
    fn create_circle(&mut self, cx: f64, cy: f64, r: f64, style: &Style) -> Handle;
    fn create_text(&mut self, x: f64, y: f64, text: &str, style: &Style) -> Handle;
    fn create_path(&mut self, points: &[(f64, f64)], style: &Style) -> Handle;
    /// Bundles already created objects into one unit that moves and is styled as a whole.
    fn group(&mut self, members: &[Handle]) -> Handle;
    /// Moves circles to centre `(x, y)` and texts to anchor `(x, y)`; groups forward to members.
    fn set_position(&mut self, handle: Handle, x: f64, y: f64);
    fn set_path(&mut self, handle: Handle, points: &[(f64, f64)]);
    fn set_style(&mut self, handle: Handle, style: &Style);
    fn to_back(&mut self, handle: Handle);
    fn bounding_box(&self, handle: Handle) -> Option<BBox>;
    /// Topmost top-level object under `(x, y)`.
    fn hit_test(&self, x: f64, y: f64) -> Option<Handle>;
    fn view_box(&self) -> ViewBox;
    fn set_view_box(&mut self, view_box: ViewBox);
    /// Removes everything drawn; the surface stays usable.
    fn clear(&mut self);
    /// Detaches the surface from the host; nothing can be drawn afterwards.
    fn remove(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { cx: f64, cy: f64, r: f64 },
    Text { x: f64, y: f64, content: String },
    Path { points: Vec<(f64, f64)> },
    Group { members: Vec<Handle> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub shape: Shape,
    pub style: Style,
}

/// Retained SVG scene. Serialize it with [`crate::render::render_svg`].
#[derive(Debug, Clone)]
pub struct SvgSurface {
    element_id: String,
    container: String,
    width: f64,
    height: f64,
    view_box: ViewBox,
    background: Option<String>,
    objects: IndexMap<Handle, SceneObject>,
    order: Vec<Handle>,
    next_handle: usize,
    mounted: bool,
}

impl Default for SvgSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgSurface {
    pub fn new() -> Self {
        Self {
            element_id: String::new(),
            container: String::new(),
            width: 0.0,
            height: 0.0,
            view_box: ViewBox::new(0.0, 0.0, 0.0, 0.0),
            background: None,
            objects: IndexMap::new(),
            order: Vec::new(),
            next_handle: 0,
            mounted: false,
        }
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// The `viewBox` attribute value, `"x y width height"`.
    pub fn view_box_attr(&self) -> String {
        let vb = self.view_box;
        format!("{} {} {} {}", vb.x, vb.y, vb.width, vb.height)
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn object(&self, handle: Handle) -> Option<&SceneObject> {
        self.objects.get(&handle)
    }

    /// Top-level objects, back to front.
    pub fn top_level(&self) -> &[Handle] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn insert(&mut self, shape: Shape, style: &Style) -> Handle {
        let handle = Handle(self.next_handle);
        self.next_handle += 1;
        self.objects.insert(
            handle,
            SceneObject {
                shape,
                style: style.clone(),
            },
        );
        self.order.push(handle);
        handle
    }

    fn hits(&self, handle: Handle, x: f64, y: f64) -> bool {
        let Some(object) = self.objects.get(&handle) else {
            return false;
        };
        match &object.shape {
            Shape::Circle { cx, cy, r } => (x - cx).hypot(y - cy) <= *r,
            Shape::Text { .. } => self
                .bounding_box(handle)
                .is_some_and(|bbox| bbox.contains(x, y)),
            Shape::Path { points } => {
                let stroke = object
                    .style
                    .get("stroke-width")
                    .and_then(|w| w.parse::<f64>().ok())
                    .unwrap_or(1.0);
                let tolerance = (stroke / 2.0).max(3.0);
                points
                    .windows(2)
                    .any(|seg| distance_to_segment((x, y), seg[0], seg[1]) <= tolerance)
            }
            Shape::Group { members } => members.iter().any(|member| self.hits(*member, x, y)),
        }
    }

    fn text_bbox(&self, x: f64, y: f64, content: &str, style: &Style) -> BBox {
        let font_size = style
            .get("font-size")
            .and_then(parse_font_size)
            .unwrap_or(DEFAULT_FONT_SIZE);
        let family = style.get("font-family").unwrap_or(DEFAULT_FONT_FAMILY);
        let width = measure_text_width(content, font_size, family);
        let height = font_size * LINE_HEIGHT;
        BBox {
            x: x - width / 2.0,
            y: y - height / 2.0,
            width,
            height,
        }
    }
}

impl RenderSurface for SvgSurface {
    fn mount(&mut self, element_id: &str, container: &str, width: f64, height: f64) {
        self.element_id = element_id.to_string();
        self.container = container.to_string();
        self.width = width;
        self.height = height;
        self.view_box = ViewBox::new(0.0, 0.0, width, height);
        self.mounted = true;
    }

    fn create_circle(&mut self, cx: f64, cy: f64, r: f64, style: &Style) -> Handle {
        self.insert(Shape::Circle { cx, cy, r }, style)
    }

    fn create_text(&mut self, x: f64, y: f64, text: &str, style: &Style) -> Handle {
        self.insert(
            Shape::Text {
                x,
                y,
                content: text.to_string(),
            },
            style,
        )
    }

    fn create_path(&mut self, points: &[(f64, f64)], style: &Style) -> Handle {
        self.insert(
            Shape::Path {
                points: points.to_vec(),
            },
            style,
        )
    }

    fn group(&mut self, members: &[Handle]) -> Handle {
        let members: Vec<Handle> = members
            .iter()
            .copied()
            .filter(|member| self.objects.contains_key(member))
            .collect();
        self.order.retain(|handle| !members.contains(handle));
        self.insert(Shape::Group { members }, &Style::new())
    }

    fn set_position(&mut self, handle: Handle, x: f64, y: f64) {
        let members = match self.objects.get_mut(&handle).map(|object| &mut object.shape) {
            Some(Shape::Circle { cx, cy, .. }) => {
                *cx = x;
                *cy = y;
                return;
            }
            Some(Shape::Text { x: tx, y: ty, .. }) => {
                *tx = x;
                *ty = y;
                return;
            }
            Some(Shape::Group { members }) => members.clone(),
            Some(Shape::Path { .. }) | None => return,
        };
        for member in members {
            self.set_position(member, x, y);
        }
    }

    fn set_path(&mut self, handle: Handle, points: &[(f64, f64)]) {
        if let Some(SceneObject {
            shape: Shape::Path { points: current },
            ..
        }) = self.objects.get_mut(&handle)
        {
            *current = points.to_vec();
        }
    }

    fn set_style(&mut self, handle: Handle, style: &Style) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.style.extend(style);
        }
    }

    fn to_back(&mut self, handle: Handle) {
        if let Some(pos) = self.order.iter().position(|h| *h == handle) {
            let handle = self.order.remove(pos);
            self.order.insert(0, handle);
        }
    }

    fn bounding_box(&self, handle: Handle) -> Option<BBox> {
        let object = self.objects.get(&handle)?;
        match &object.shape {
            Shape::Circle { cx, cy, r } => Some(BBox {
                x: cx - r,
                y: cy - r,
                width: r * 2.0,
                height: r * 2.0,
            }),
            Shape::Text { x, y, content } => Some(self.text_bbox(*x, *y, content, &object.style)),
            Shape::Path { points } => {
                let (first, rest) = points.split_first()?;
                let (mut min_x, mut min_y, mut max_x, mut max_y) =
                    (first.0, first.1, first.0, first.1);
                for (px, py) in rest {
                    min_x = min_x.min(*px);
                    min_y = min_y.min(*py);
                    max_x = max_x.max(*px);
                    max_y = max_y.max(*py);
                }
                Some(BBox {
                    x: min_x,
                    y: min_y,
                    width: max_x - min_x,
                    height: max_y - min_y,
                })
            }
            Shape::Group { members } => members
                .iter()
                .filter_map(|member| self.bounding_box(*member))
                .reduce(|acc, bbox| acc.union(&bbox)),
        }
    }

    fn hit_test(&self, x: f64, y: f64) -> Option<Handle> {
        self.order
            .iter()
            .rev()
            .copied()
            .find(|handle| self.hits(*handle, x, y))
    }

    fn view_box(&self) -> ViewBox {
        self.view_box
    }

    fn set_view_box(&mut self, view_box: ViewBox) {
        self.view_box = view_box;
    }

    fn clear(&mut self) {
        self.objects.clear();
        self.order.clear();
    }

    fn remove(&mut self) {
        self.clear();
        self.mounted = false;
    }
}

fn distance_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (p.0 - a.0).hypot(p.1 - a.1);
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    (p.0 - cx).hypot(p.1 - cy)
}
