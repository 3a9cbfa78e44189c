use crate::chart::RelationChart;
use crate::edges::geometry;
use crate::surface::{RenderSurface, ViewBox};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub chart: String,
    pub width: f64,
    pub height: f64,
    pub view_box: ViewBox,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub title: String,
    pub parent: Option<String>,
    pub x: f64,
    pub y: f64,
    pub polar: f64,
    pub r: f64,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub key: String,
    pub path: String,
    pub midpoint: [f64; 2],
}

impl LayoutDump {
    pub fn from_chart<S: RenderSurface>(chart: &RelationChart<S>) -> Self {
        let store = chart.store();
        let nodes = store
            .flat_nodes()
            .filter_map(|node| {
                let placement = store.get(&node.id)?;
                Some(NodeDump {
                    id: node.id.clone(),
                    title: node.title.clone(),
                    parent: node.parent.clone(),
                    x: placement.x,
                    y: placement.y,
                    polar: placement.polar,
                    r: placement.r,
                })
            })
            .collect();

        let edges = chart
            .edges()
            .iter()
            .filter_map(|edge| {
                let geometry = geometry(store, &edge.from.id, &edge.to.id).ok()?;
                Some(EdgeDump {
                    from: edge.from.id.clone(),
                    to: edge.to.id.clone(),
                    key: edge.key(),
                    path: geometry.path(),
                    midpoint: [geometry.midpoint.0, geometry.midpoint.1],
                })
            })
            .collect();

        LayoutDump {
            chart: chart.cid().to_string(),
            width: chart.options().width,
            height: chart.options().height,
            view_box: chart.surface().view_box(),
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump<S: RenderSurface>(
    path: &Path,
    chart: &RelationChart<S>,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_chart(chart);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
