use crate::error::{ChartError, Result};
use crate::ir::{FlatNode, annotation_key};
use crate::layout::round_half_up;
use crate::render::path_data;
use crate::surface::{Handle, RenderSurface};
use crate::theme::Theme;
use crate::topology::TopologyStore;
use std::collections::HashMap;
use tracing::{trace, warn};

/// A drawn parent-child connection: a line plus a clickable marker at its midpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: FlatNode,
    pub to: FlatNode,
    pub line: Handle,
    pub marker: Handle,
}

impl Edge {
    /// Annotation lookup key, always in parent-to-child order.
    pub fn key(&self) -> String {
        annotation_key(&self.from.id, &self.to.id)
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.from.id == node_id || self.to.id == node_id
    }
}

/// Line endpoints and marker position of an edge, derived from current placements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeGeometry {
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub midpoint: (f64, f64),
}

impl EdgeGeometry {
    pub fn between(start: (f64, f64), end: (f64, f64)) -> Self {
        Self {
            start,
            end,
            midpoint: (
                round_half_up((start.0 + end.0) / 2.0),
                round_half_up((start.1 + end.1) / 2.0),
            ),
        }
    }

    pub fn points(&self) -> [(f64, f64); 2] {
        [self.start, self.end]
    }

    pub fn path(&self) -> String {
        path_data(&self.points())
    }
}

/// Edges in creation order, with an index from node id to the edges touching it.
#[derive(Debug, Clone, Default)]
pub struct EdgeRegistry {
    edges: Vec<Edge>,
    incidence: HashMap<String, Vec<usize>>,
    pairs: HashMap<(String, String), usize>,
}

impl EdgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the edge `parent_id -> child_id` and returns its index. A pair that already has an
    /// edge is not drawn twice.
    pub fn create_edge<S: RenderSurface>(
        &mut self,
        store: &TopologyStore,
        surface: &mut S,
        theme: &Theme,
        parent_id: &str,
        child_id: &str,
    ) -> Result<usize> {
        let pair = (parent_id.to_string(), child_id.to_string());
        if let Some(idx) = self.pairs.get(&pair) {
            warn!(parent = parent_id, child = child_id, "edge already drawn");
            return Ok(*idx);
        }

        let from = store
            .get_flat(parent_id)
            .cloned()
            .ok_or_else(|| ChartError::unknown_node(parent_id))?;
        let to = store
            .get_flat(child_id)
            .cloned()
            .ok_or_else(|| ChartError::unknown_node(child_id))?;
        let geometry = geometry(store, parent_id, child_id)?;

        let line = surface.create_path(&geometry.points(), &theme.edge_style());
        surface.to_back(line);

        let (mx, my) = geometry.midpoint;
        let dot = surface.create_circle(mx, my, theme.marker_radius, &theme.marker_circle_style());
        let label = surface.create_text(mx, my, &theme.marker_label, &theme.marker_text_style());
        let marker = surface.group(&[dot, label]);
        surface.set_style(marker, &crate::ir::Style::new().with("cursor", "pointer"));

        let idx = self.edges.len();
        self.edges.push(Edge {
            from,
            to,
            line,
            marker,
        });
        self.incidence.entry(pair.0.clone()).or_default().push(idx);
        if pair.0 != pair.1 {
            self.incidence.entry(pair.1.clone()).or_default().push(idx);
        }
        self.pairs.insert(pair, idx);
        Ok(idx)
    }

    /// Moves an existing edge's line and marker to its endpoints' current placements. The
    /// z-order is left alone; lines went to the back when they were created.
    pub fn refresh_edge<S: RenderSurface>(
        &self,
        idx: usize,
        store: &TopologyStore,
        surface: &mut S,
    ) -> Result<()> {
        let Some(edge) = self.edges.get(idx) else {
            return Ok(());
        };
        let geometry = geometry(store, &edge.from.id, &edge.to.id)?;
        surface.set_path(edge.line, &geometry.points());
        let (mx, my) = geometry.midpoint;
        surface.set_position(edge.marker, mx, my);
        trace!(edge = %edge.key(), path = %geometry.path(), "edge refreshed");
        Ok(())
    }

    /// Refreshes every edge in creation order.
    pub fn reline_all<S: RenderSurface>(
        &self,
        store: &TopologyStore,
        surface: &mut S,
    ) -> Result<()> {
        for idx in 0..self.edges.len() {
            self.refresh_edge(idx, store, surface)?;
        }
        Ok(())
    }

    /// Refreshes only the edges touching `node_id`, in creation order. Leaves the surface in
    /// the same state as [`EdgeRegistry::reline_all`] after a single node moved.
    pub fn reline_incident<S: RenderSurface>(
        &self,
        node_id: &str,
        store: &TopologyStore,
        surface: &mut S,
    ) -> Result<()> {
        let Some(indices) = self.incidence.get(node_id) else {
            return Ok(());
        };
        for idx in indices {
            self.refresh_edge(*idx, store, surface)?;
        }
        Ok(())
    }

    /// Index of the edge `parent_id -> child_id`, if it was drawn.
    pub fn find(&self, parent_id: &str, child_id: &str) -> Option<usize> {
        self.pairs
            .get(&(parent_id.to_string(), child_id.to_string()))
            .copied()
    }

    pub fn get(&self, idx: usize) -> Option<&Edge> {
        self.edges.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn incident(&self, node_id: &str) -> &[usize] {
        self.incidence.get(node_id).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.incidence.clear();
        self.pairs.clear();
    }
}

/// Geometry of the edge between two stored nodes.
pub fn geometry(store: &TopologyStore, from_id: &str, to_id: &str) -> Result<EdgeGeometry> {
    let from = store
        .get(from_id)
        .ok_or_else(|| ChartError::unknown_node(from_id))?;
    let to = store
        .get(to_id)
        .ok_or_else(|| ChartError::unknown_node(to_id))?;
    Ok(EdgeGeometry::between(from.center(), to.center()))
}
