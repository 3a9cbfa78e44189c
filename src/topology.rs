use crate::error::{ChartError, Result};
use crate::ir::{FlatNode, NodeData};
use crate::layout::Placement;
use indexmap::IndexMap;

/// Where every node currently is, plus a detached copy of its data.
///
/// Placements are write-once per id: layout passes only fill gaps, and drags only touch `x`/`y`.
#[derive(Debug, Clone, Default)]
pub struct TopologyStore {
    placements: IndexMap<String, Placement>,
    flat: IndexMap<String, FlatNode>,
}

impl TopologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with placements, e.g. copied from another chart.
    pub fn seeded(shapes: &IndexMap<String, Placement>) -> Self {
        Self {
            placements: shapes.clone(),
            flat: IndexMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<Placement> {
        self.placements.get(id).copied()
    }

    /// Records `placement` unless `id` already has one. Returns whether it was inserted.
    pub fn set(&mut self, id: &str, placement: Placement) -> bool {
        if self.placements.contains_key(id) {
            return false;
        }
        self.placements.insert(id.to_string(), placement);
        true
    }

    pub fn move_to(&mut self, id: &str, x: f64, y: f64) -> Result<Placement> {
        let placement = self
            .placements
            .get_mut(id)
            .ok_or_else(|| ChartError::unknown_node(id))?;
        placement.x = x;
        placement.y = y;
        Ok(*placement)
    }

    pub fn get_flat(&self, id: &str) -> Option<&FlatNode> {
        self.flat.get(id)
    }

    pub fn insert_flat(&mut self, node: &NodeData) -> &FlatNode {
        let flat = FlatNode::from(node);
        let (index, _) = self.flat.insert_full(node.id.clone(), flat);
        &self.flat[index]
    }

    pub fn flat_nodes(&self) -> impl Iterator<Item = &FlatNode> {
        self.flat.values()
    }

    pub fn placements(&self) -> &IndexMap<String, Placement> {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn reset(&mut self) {
        self.placements.clear();
        self.flat.clear();
    }
}
