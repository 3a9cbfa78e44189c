//! The relation chart: radial layout, drawing, dragging and edge popups on one surface.

use crate::config::ChartOptions;
use crate::drag::DragController;
use crate::edges::EdgeRegistry;
use crate::error::{ChartError, Result};
use crate::ir::{Annotations, FlatNode, NodeData, Style};
use crate::layout::{Placement, RadialLayout};
use crate::parser::normalize_forest;
use crate::popup::Popup;
use crate::surface::{Handle, RenderSurface, ViewBox};
use crate::theme::Theme;
use crate::topology::TopologyStore;
use crate::viewport::{Key, pan};
use indexmap::IndexMap;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

static NEXT_CHART_ID: AtomicUsize = AtomicUsize::new(1);

/// What a top-level surface object stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Node(String),
    Edge(usize),
}

pub struct RelationChart<S: RenderSurface> {
    cid: String,
    options: ChartOptions,
    theme: Theme,
    annotations: Annotations,
    data: Vec<Vec<NodeData>>,
    layout: RadialLayout,
    store: TopologyStore,
    edges: EdgeRegistry,
    visuals: IndexMap<String, Handle>,
    targets: HashMap<Handle, Target>,
    drags: HashMap<String, DragController>,
    popup: Option<Popup>,
    surface: S,
}

impl<S: RenderSurface> RelationChart<S> {
    /// Mounts `surface` under a fresh element id. Placements in `options.shapes` are used
    /// instead of computed ones.
    pub fn new(mut surface: S, options: ChartOptions) -> Self {
        let cid = format!("rel{}", NEXT_CHART_ID.fetch_add(1, Ordering::Relaxed));
        surface.mount(&cid, &options.container, options.width, options.height);
        Self {
            layout: RadialLayout::new(options.width, options.height),
            store: TopologyStore::seeded(&options.shapes),
            cid,
            options,
            theme: Theme::default(),
            annotations: Annotations::new(),
            data: Vec::new(),
            edges: EdgeRegistry::new(),
            visuals: IndexMap::new(),
            targets: HashMap::new(),
            drags: HashMap::new(),
            popup: None,
            surface,
        }
    }

    /// Theme used for edges and markers. Node styles come from the options.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Lays out and draws `data` breadth-first. Ids that already have a placement keep it, and
    /// nodes or edges already on the surface are not drawn again.
    ///
    /// A top-level node may name a `parent` that is already placed. It is hooked onto that
    /// parent instead of being laid out as a root, taking the parent's first child slot when it
    /// has no placement of its own. Such a render adds to the chart's data; a render of plain
    /// roots replaces it.
    pub fn render(&mut self, data: &[NodeData]) -> Result<()> {
        if data.is_empty() {
            debug!(chart = %self.cid, "nothing to render");
            return Ok(());
        }
        let forest = normalize_forest(data.to_vec())?;
        for node in &forest {
            if let Some(parent) = &node.parent {
                self.check_attachable(parent, &node.id)?;
            }
        }

        self.draw_forest(&forest)?;
        if forest.iter().all(NodeData::is_root) {
            self.data = vec![forest];
        } else {
            self.data.push(forest);
        }
        debug!(
            chart = %self.cid,
            nodes = self.visuals.len(),
            edges = self.edges.len(),
            "chart rendered"
        );
        Ok(())
    }

    fn check_attachable(&self, parent_id: &str, node_id: &str) -> Result<()> {
        if self.store.get(parent_id).is_some() || self.store.get(node_id).is_some() {
            return Ok(());
        }
        Err(ChartError::invalid_input(format!(
            "node '{node_id}' references parent '{parent_id}', which has no placement"
        )))
    }

    fn draw_forest(&mut self, forest: &[NodeData]) -> Result<()> {
        let mut queue: VecDeque<(&NodeData, bool)> =
            forest.iter().map(|node| (node, true)).collect();
        while let Some((item, top_level)) = queue.pop_front() {
            if top_level {
                match &item.parent {
                    Some(parent) => self.attach(parent, item)?,
                    None => {
                        self.store.set(&item.id, self.layout.root());
                        self.draw_node(item)?;
                    }
                }
            }
            self.draw_children(item)?;
            queue.extend(item.child_nodes.iter().map(|child| (child, false)));
        }
        Ok(())
    }

    fn attach(&mut self, parent_id: &str, node: &NodeData) -> Result<()> {
        self.check_attachable(parent_id, &node.id)?;
        if let Some(anchor) = self.store.get(parent_id) {
            self.store.set(&node.id, self.layout.child(&anchor, 1, 0));
        }
        self.draw_node(node)?;
        if self.visuals.contains_key(parent_id) && self.edges.find(parent_id, &node.id).is_none() {
            self.link(parent_id, &node.id)?;
        }
        Ok(())
    }

    fn draw_children(&mut self, parent: &NodeData) -> Result<()> {
        let count = parent.child_nodes.len();
        if count == 0 {
            return Ok(());
        }
        let anchor = self
            .store
            .get(&parent.id)
            .ok_or_else(|| ChartError::unknown_node(&parent.id))?;

        for (index, child) in parent.child_nodes.iter().enumerate() {
            self.store
                .set(&child.id, self.layout.child(&anchor, count, index));
            self.draw_node(child)?;
            self.link(&parent.id, &child.id)?;
        }
        Ok(())
    }

    fn link(&mut self, parent_id: &str, child_id: &str) -> Result<()> {
        let idx = self.edges.create_edge(
            &self.store,
            &mut self.surface,
            &self.theme,
            parent_id,
            child_id,
        )?;
        if let Some(edge) = self.edges.get(idx) {
            self.targets.insert(edge.line, Target::Edge(idx));
            self.targets.insert(edge.marker, Target::Edge(idx));
        }
        Ok(())
    }

    /// Draws every stored render again, in the order they happened.
    fn replay(&mut self) -> Result<()> {
        let batches = self.data.clone();
        for forest in &batches {
            self.draw_forest(forest)?;
        }
        Ok(())
    }

    fn draw_node(&mut self, node: &NodeData) -> Result<()> {
        self.store.insert_flat(node);
        if self.visuals.contains_key(&node.id) {
            return Ok(());
        }
        let placement = self
            .store
            .get(&node.id)
            .ok_or_else(|| ChartError::unknown_node(&node.id))?;

        let circle_style = self.options.circle_style.merged(node.circle_style.as_ref());
        let text_style = self.options.text_style.merged(node.text_style.as_ref());
        let surface = &mut self.surface;
        let circle = surface.create_circle(placement.x, placement.y, placement.r, &circle_style);
        let label = surface.create_text(placement.x, placement.y, &node.title, &text_style);
        let group = surface.group(&[circle, label]);
        surface.set_style(group, &Style::new().with("cursor", "move"));

        self.visuals.insert(node.id.clone(), group);
        self.targets.insert(group, Target::Node(node.id.clone()));
        self.drags.entry(node.id.clone()).or_default();
        Ok(())
    }

    /// Wipes the surface, forgets every placement (seeded ones too) and renders the last input
    /// again from scratch.
    pub fn recover(&mut self) -> Result<()> {
        self.surface.clear();
        self.forget_visuals();
        self.store.reset();
        debug!(chart = %self.cid, renders = self.data.len(), "recovering original layout");
        self.replay()
    }

    /// Wipes the surface. Placements are kept, so a later [`render`](Self::render) draws nodes
    /// where they were.
    pub fn clear(&mut self) {
        self.surface.clear();
        self.forget_visuals();
    }

    fn forget_visuals(&mut self) {
        self.edges.clear();
        self.visuals.clear();
        self.targets.clear();
        self.drags.clear();
        self.popup = None;
    }

    /// New chart on `surface` with the same input, options and annotations, starting from this
    /// chart's current placements.
    pub fn clone_onto<T: RenderSurface>(&self, surface: T) -> Result<RelationChart<T>> {
        let mut options = self.options.clone();
        options.shapes = self.store.placements().clone();
        let mut chart = RelationChart::new(surface, options)
            .with_theme(self.theme.clone())
            .with_annotations(self.annotations.clone());
        chart.data = self.data.clone();
        chart.replay()?;
        Ok(chart)
    }

    /// Detaches and returns the surface; every store goes with the chart.
    pub fn destroy(self) -> S {
        let mut surface = self.surface;
        surface.remove();
        surface
    }

    /// Flat copies of every drawn node, in first-drawn order.
    pub fn data_flatten(&self) -> Vec<FlatNode> {
        self.store.flat_nodes().cloned().collect()
    }

    /// Pointer-down on a node: anchors the gesture at the node's rendered centre.
    pub fn drag_start(&mut self, node_id: &str) -> Result<()> {
        let visual = self.node_visual_checked(node_id)?;
        let bbox = self
            .surface
            .bounding_box(visual)
            .ok_or_else(|| ChartError::unknown_node(node_id))?;
        let center = bbox.center();
        self.drags
            .entry(node_id.to_string())
            .or_default()
            .start(center);
        trace!(node = node_id, x = center.0, y = center.1, "drag started");
        Ok(())
    }

    /// Pointer move by `(dx, dy)` since pointer-down. Ignored unless the node is being dragged.
    pub fn drag_move(&mut self, node_id: &str, dx: f64, dy: f64) -> Result<()> {
        let visual = self.node_visual_checked(node_id)?;
        let Some((x, y)) = self
            .drags
            .get(node_id)
            .and_then(|controller| controller.drag_to(dx, dy))
        else {
            return Ok(());
        };

        self.store.move_to(node_id, x, y)?;
        self.surface.set_position(visual, x, y);
        self.edges
            .reline_incident(node_id, &self.store, &mut self.surface)?;
        trace!(node = node_id, x, y, "node dragged");
        Ok(())
    }

    pub fn drag_end(&mut self, node_id: &str) -> Result<()> {
        self.node_visual_checked(node_id)?;
        if let Some(controller) = self.drags.get_mut(node_id) {
            controller.end();
        }
        Ok(())
    }

    fn node_visual_checked(&self, node_id: &str) -> Result<Handle> {
        if self.store.get(node_id).is_none() {
            return Err(ChartError::unknown_node(node_id));
        }
        self.visuals
            .get(node_id)
            .copied()
            .ok_or_else(|| ChartError::unknown_node(node_id))
    }

    /// Click at canvas `(x, y)`; `(client_x, client_y)` positions the popup. Only edges react.
    pub fn click(&mut self, x: f64, y: f64, client_x: f64, client_y: f64) -> Option<&Popup> {
        let hit = self.surface.hit_test(x, y)?;
        match self.targets.get(&hit).cloned() {
            Some(Target::Edge(idx)) => self.click_edge(idx, client_x, client_y),
            Some(Target::Node(_)) | None => None,
        }
    }

    /// Shows the annotation of edge `idx`, replacing any open popup. Unannotated edges leave
    /// the current popup alone.
    pub fn click_edge(&mut self, idx: usize, client_x: f64, client_y: f64) -> Option<&Popup> {
        let key = self.edges.get(idx)?.key();
        let popup = Popup::lookup(&self.annotations, &key, client_x, client_y)?;
        debug!(chart = %self.cid, key = %popup.key, items = popup.items.len(), "popup opened");
        self.popup = Some(popup);
        self.popup.as_ref()
    }

    pub fn close_popup(&mut self) -> Option<Popup> {
        self.popup.take()
    }

    pub fn active_popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    /// Pans the view box for arrow keys; other keys change nothing.
    pub fn key_down(&mut self, key: Key) -> ViewBox {
        let next = pan(self.surface.view_box(), key);
        self.surface.set_view_box(next);
        next
    }

    pub fn cid(&self) -> &str {
        &self.cid
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Top-level nodes of the last full render followed by every subtree attached since, all
    /// normalized.
    pub fn data(&self) -> impl Iterator<Item = &NodeData> {
        self.data.iter().flatten()
    }

    pub fn placement(&self, node_id: &str) -> Option<Placement> {
        self.store.get(node_id)
    }

    pub fn store(&self) -> &TopologyStore {
        &self.store
    }

    pub fn edges(&self) -> &EdgeRegistry {
        &self.edges
    }

    pub fn node_visual(&self, node_id: &str) -> Option<Handle> {
        self.visuals.get(node_id).copied()
    }

    pub fn is_dragging(&self, node_id: &str) -> bool {
        self.drags
            .get(node_id)
            .is_some_and(DragController::is_dragging)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_svg;
    use crate::surface::{Shape, SvgSurface};

    fn tree() -> Vec<NodeData> {
        vec![
            NodeData::new("A", "Alpha")
                .with_child(NodeData::new("B", "Beta").with_child(NodeData::new("D", "Delta")))
                .with_child(NodeData::new("C", "Gamma")),
        ]
    }

    fn chart() -> RelationChart<SvgSurface> {
        let mut chart = RelationChart::new(SvgSurface::new(), ChartOptions::default());
        chart.render(&tree()).unwrap();
        chart
    }

    fn edge_points(chart: &RelationChart<SvgSurface>, from: &str, to: &str) -> Vec<(f64, f64)> {
        let edge = chart
            .edges()
            .iter()
            .find(|edge| edge.from.id == from && edge.to.id == to)
            .unwrap();
        match &chart.surface().object(edge.line).unwrap().shape {
            Shape::Path { points } => points.clone(),
            other => panic!("expected path, got {other:?}"),
        }
    }

    #[test]
    fn root_and_children_follow_the_radial_layout() {
        let chart = chart();
        let a = chart.placement("A").unwrap();
        assert_eq!((a.x, a.y, a.r, a.polar), (400.0, 240.0, 48.0, 48.0));

        let b = chart.placement("B").unwrap();
        assert_eq!((b.x, b.y, b.polar, b.r), (544.0, 240.0, 144.0, 29.0));

        let c = chart.placement("C").unwrap();
        assert_eq!((c.x, c.y), (504.0, 344.0));
        assert!((c.polar - 146.4).abs() < 1e-9);

        let d = chart.placement("D").unwrap();
        assert_eq!((d.x, d.y), (688.0, 240.0));
        assert_eq!(chart.edges().len(), 3);
    }

    #[test]
    fn mounts_under_a_generated_id() {
        let chart = chart();
        assert!(chart.cid().starts_with("rel"));
        assert_eq!(chart.surface().element_id(), chart.cid());
        assert_eq!(chart.surface().container(), "body");
        let view_box = chart.surface().view_box();
        assert_eq!(view_box, ViewBox::new(0.0, 0.0, 800.0, 480.0));
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut chart = RelationChart::new(SvgSurface::new(), ChartOptions::default());
        chart.render(&[]).unwrap();
        assert!(chart.surface().is_empty());
        assert!(chart.data_flatten().is_empty());
    }

    #[test]
    fn drag_moves_node_and_incident_edges_only() {
        let mut chart = chart();
        let before_ac = edge_points(&chart, "A", "C");

        chart.drag_start("B").unwrap();
        assert!(chart.is_dragging("B"));
        chart.drag_move("B", 10.0, -5.0).unwrap();
        chart.drag_end("B").unwrap();
        assert!(!chart.is_dragging("B"));

        let b = chart.placement("B").unwrap();
        assert_eq!((b.x, b.y, b.polar, b.r), (554.0, 235.0, 144.0, 29.0));
        assert_eq!(edge_points(&chart, "A", "B")[1], (554.0, 235.0));
        assert_eq!(edge_points(&chart, "B", "D")[0], (554.0, 235.0));
        assert_eq!(edge_points(&chart, "A", "C"), before_ac);

        let visual = chart.node_visual("B").unwrap();
        let center = chart.surface().bounding_box(visual).unwrap().center();
        assert!((center.0 - 554.0).abs() < 1e-9 && (center.1 - 235.0).abs() < 1e-9);
    }

    #[test]
    fn moves_without_a_start_are_ignored() {
        let mut chart = chart();
        chart.drag_move("B", 50.0, 50.0).unwrap();
        assert_eq!(chart.placement("B").unwrap().x, 544.0);

        chart.drag_start("B").unwrap();
        chart.drag_end("B").unwrap();
        chart.drag_move("B", 50.0, 50.0).unwrap();
        assert_eq!(chart.placement("B").unwrap().x, 544.0);
    }

    #[test]
    fn dragging_unknown_nodes_fails() {
        let mut chart = chart();
        for result in [
            chart.drag_start("ghost"),
            chart.drag_move("ghost", 1.0, 1.0),
            chart.drag_end("ghost"),
        ] {
            let err = result.unwrap_err();
            assert!(matches!(err, ChartError::UnknownNodeReference { id } if id == "ghost"));
        }
    }

    #[test]
    fn recover_restores_the_original_layout() {
        let mut chart = chart();
        let original: Vec<_> = ["A", "B", "C", "D"]
            .iter()
            .map(|id| chart.placement(id).unwrap())
            .collect();

        chart.drag_start("C").unwrap();
        chart.drag_move("C", -200.0, 40.0).unwrap();
        chart.drag_end("C").unwrap();
        assert_ne!(chart.placement("C"), Some(original[2]));

        chart.recover().unwrap();
        let recovered: Vec<_> = ["A", "B", "C", "D"]
            .iter()
            .map(|id| chart.placement(id).unwrap())
            .collect();
        assert_eq!(recovered, original);
        assert_eq!(chart.edges().len(), 3);
    }

    #[test]
    fn clone_starts_from_dragged_positions() {
        let mut chart = chart();
        chart.drag_start("B").unwrap();
        chart.drag_move("B", 10.0, -5.0).unwrap();
        chart.drag_end("B").unwrap();

        let copy = chart.clone_onto(SvgSurface::new()).unwrap();
        assert_ne!(copy.cid(), chart.cid());
        assert_eq!(copy.placement("B"), chart.placement("B"));
        assert_eq!(copy.placement("D"), chart.placement("D"));
        assert_eq!(copy.data_flatten(), chart.data_flatten());
    }

    #[test]
    fn rendering_twice_does_not_duplicate() {
        let mut chart = chart();
        let objects = chart.surface().len();
        chart.render(&tree()).unwrap();
        assert_eq!(chart.surface().len(), objects);
        assert_eq!(chart.edges().len(), 3);
    }

    #[test]
    fn clear_then_render_redraws_at_stored_placements() {
        let mut chart = chart();
        chart.drag_start("D").unwrap();
        chart.drag_move("D", 5.0, 5.0).unwrap();
        chart.drag_end("D").unwrap();

        chart.clear();
        assert!(chart.surface().is_empty());
        assert!(chart.edges().is_empty());

        chart.render(&tree()).unwrap();
        assert_eq!(chart.placement("D").unwrap().x, 693.0);
        assert_eq!(edge_points(&chart, "B", "D")[1], (693.0, 245.0));
    }

    fn attached(id: &str, title: &str, parent: &str) -> NodeData {
        let mut node = NodeData::new(id, title);
        node.parent = Some(parent.to_string());
        node
    }

    #[test]
    fn subtree_render_extends_a_placed_node() {
        let mut chart = RelationChart::new(SvgSurface::new(), ChartOptions::default());
        let tree = NodeData::new("A", "Alpha").with_child(NodeData::new("B", "Beta"));
        chart.render(&[tree]).unwrap();
        let beta = chart.node_visual("B").unwrap();

        let subtree = attached("B", "Beta", "A").with_child(NodeData::new("X", "Chi"));
        chart.render(&[subtree]).unwrap();

        let x = chart.placement("X").unwrap();
        assert_eq!((x.x, x.y), (688.0, 240.0));
        assert_eq!(chart.placement("B").unwrap().x, 544.0);
        assert_eq!(chart.node_visual("B"), Some(beta));
        let keys: Vec<String> = chart.edges().iter().map(|edge| edge.key()).collect();
        assert_eq!(keys, ["A-B", "B-X"]);
        let ids: Vec<&str> = chart.data().map(|node| node.id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);

        chart.drag_start("X").unwrap();
        chart.drag_move("X", 4.0, 4.0).unwrap();
        chart.drag_end("X").unwrap();
        chart.recover().unwrap();
        assert_eq!(chart.placement("X"), Some(x));
        assert_eq!(chart.edges().len(), 2);
    }

    #[test]
    fn unplaced_subtree_root_takes_its_parents_first_slot() {
        let mut chart = chart();
        chart.render(&[attached("E", "Epsilon", "C")]).unwrap();

        let c = chart.placement("C").unwrap();
        let expected = RadialLayout::new(800.0, 480.0).child(&c, 1, 0);
        assert_eq!(chart.placement("E"), Some(expected));
        assert!(chart.edges().find("C", "E").is_some());
        assert!(chart.node_visual("E").is_some());
    }

    #[test]
    fn subtree_under_an_unplaced_parent_is_rejected() {
        let mut chart = chart();
        let objects = chart.surface().len();
        let subtree = attached("Y", "Upsilon", "ghost").with_child(NodeData::new("Z", "Zeta"));

        let err = chart.render(&[subtree]).unwrap_err();
        assert!(matches!(err, ChartError::InvalidInput { .. }));
        assert!(chart.placement("Z").is_none());
        assert_eq!(chart.surface().len(), objects);
        assert_eq!(chart.data().count(), 1);
    }

    #[test]
    fn node_styles_merge_over_defaults() {
        let mut chart = RelationChart::new(SvgSurface::new(), ChartOptions::default());
        let node = NodeData::new("A", "Alpha")
            .with_circle_style(Style::new().with("fill", "#f00"))
            .with_text_style(Style::new().with("font-size", "20px"));
        chart.render(&[node]).unwrap();

        let svg = render_svg(chart.surface());
        assert!(svg.contains("fill=\"#f00\" stroke=\"#82BDF5\""));
        assert!(svg.contains("font-size=\"20px\" font-family=\"Arial\""));
        assert!(svg.contains("<g cursor=\"move\">"));
    }

    #[test]
    fn clicking_edges_opens_annotated_popups() {
        let mut annotations = Annotations::new();
        annotations.insert("A", "B", vec!["manages".to_string()]);
        let mut chart = RelationChart::new(SvgSurface::new(), ChartOptions::default())
            .with_annotations(annotations);
        chart.render(&tree()).unwrap();

        // A-B marker sits at (472, 240); the A-C line passes (480, 320) but is not annotated.
        let popup = chart.click(472.0, 240.0, 100.0, 100.0).cloned().unwrap();
        assert_eq!(popup.key, "A-B");
        assert_eq!((popup.left, popup.top), (130.0, 54.0));

        assert!(chart.click(480.0, 320.0, 0.0, 0.0).is_none());
        assert_eq!(chart.active_popup(), Some(&popup));

        assert!(chart.click(400.0, 240.0, 0.0, 0.0).is_none());
        assert_eq!(chart.close_popup(), Some(popup));
        assert!(chart.active_popup().is_none());
    }

    #[test]
    fn arrow_keys_pan_the_view_box() {
        let mut chart = chart();
        chart.key_down(Key::Left);
        chart.key_down(Key::Left);
        chart.key_down(Key::Down);
        let view_box = chart.key_down(Key::Other);
        assert_eq!(view_box, ViewBox::new(20.0, -10.0, 800.0, 480.0));
        assert_eq!(chart.surface().view_box(), view_box);
    }

    #[test]
    fn destroy_releases_the_surface() {
        let chart = chart();
        let surface = chart.destroy();
        assert!(!surface.is_mounted());
        assert!(surface.is_empty());
    }
}
