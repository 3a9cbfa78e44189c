use std::path::{Path, PathBuf};

use relation_chart::config::parse_config;
use relation_chart::layout_dump::{LayoutDump, write_layout_dump};
use relation_chart::parser::{parse_annotations, parse_chart_input};
use relation_chart::render::render_svg;
use relation_chart::viewport::Key;
use relation_chart::{
    ChartError, ChartOptions, NodeData, RelationChart, RenderOptions, SvgSurface,
    render_with_options,
};

fn fixture_path(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel)
}

fn fixture(rel: &str) -> String {
    let path = fixture_path(rel);
    std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("fixture missing: {rel}"))
}

fn load(rel: &str) -> Vec<NodeData> {
    parse_chart_input(&fixture(rel)).expect("parse failed")
}

fn chart_for(rel: &str) -> RelationChart<SvgSurface> {
    let mut chart = RelationChart::new(SvgSurface::new(), ChartOptions::default());
    chart.render(&load(rel)).expect("render failed");
    chart
}

fn xy(chart: &RelationChart<SvgSurface>, id: &str) -> (f64, f64) {
    let placement = chart
        .placement(id)
        .unwrap_or_else(|| panic!("no placement for {id}"));
    (placement.x, placement.y)
}

#[test]
fn basic_tree_is_laid_out_radially() {
    let chart = chart_for("basic.json");
    assert_eq!(xy(&chart, "A"), (400.0, 240.0));
    assert_eq!(xy(&chart, "B"), (544.0, 240.0));
    assert_eq!(xy(&chart, "C"), (504.0, 344.0));
    assert_eq!(xy(&chart, "D"), (688.0, 240.0));
    assert_eq!(xy(&chart, "E"), (648.0, 344.0));
    assert_eq!(chart.placement("A").unwrap().r, 48.0);
    assert_eq!(chart.placement("E").unwrap().r, 29.0);

    let keys: Vec<String> = chart.edges().iter().map(|edge| edge.key()).collect();
    assert_eq!(keys, ["A-B", "A-C", "B-D", "B-E"]);

    let svg = render_svg(chart.surface());
    assert!(svg.contains("fill=\"#F6A894\""));
    assert!(svg.contains("<path d=\"M400,240L544,240\""));
}

#[test]
fn forest_roots_share_the_centre_and_flatten_breadth_first() {
    let chart = chart_for("forest.json5");
    assert_eq!(xy(&chart, "1"), (400.0, 240.0));
    assert_eq!(xy(&chart, "2"), (400.0, 240.0));
    assert_eq!(xy(&chart, "22"), (504.0, 344.0));

    let ids: Vec<String> = chart.data_flatten().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, ["1", "11", "2", "21", "22"]);
    assert_eq!(chart.data_flatten()[1].parent.as_deref(), Some("1"));
}

#[test]
fn drag_updates_only_incident_edges() {
    let mut chart = chart_for("basic.json");
    let before = LayoutDump::from_chart(&chart);

    chart.drag_start("B").unwrap();
    chart.drag_move("B", 30.0, 12.0).unwrap();
    chart.drag_move("B", 10.0, -5.0).unwrap();
    chart.drag_end("B").unwrap();

    let b = chart.placement("B").unwrap();
    assert_eq!((b.x, b.y), (554.0, 235.0));
    assert_eq!((b.polar, b.r), (144.0, 29.0));

    let after = LayoutDump::from_chart(&chart);
    for (old, new) in before.edges.iter().zip(&after.edges) {
        if old.from == "B" {
            assert!(new.path.starts_with("M554,235L"), "{}", new.path);
        } else if old.to == "B" {
            assert!(new.path.ends_with("L554,235"), "{}", new.path);
        } else {
            assert_eq!(old.path, new.path);
            assert_eq!(old.midpoint, new.midpoint);
        }
    }
}

#[test]
fn recover_round_trips_after_drags() {
    let mut chart = chart_for("basic.json");
    let original: Vec<_> = chart.store().placements().clone().into_iter().collect();

    for (id, dx, dy) in [("A", -50.0, 0.0), ("E", 12.0, 7.0), ("C", -300.0, -100.0)] {
        chart.drag_start(id).unwrap();
        chart.drag_move(id, dx, dy).unwrap();
        chart.drag_end(id).unwrap();
    }
    chart.recover().unwrap();

    let recovered: Vec<_> = chart.store().placements().clone().into_iter().collect();
    assert_eq!(recovered, original);
    assert_eq!(chart.edges().len(), 4);
}

#[test]
fn clone_keeps_dragged_positions_and_annotations() {
    let annotations = parse_annotations(&fixture("annotations.json")).unwrap();
    let mut chart = RelationChart::new(SvgSurface::new(), ChartOptions::default())
        .with_annotations(annotations);
    chart.render(&load("basic.json")).unwrap();

    chart.drag_start("D").unwrap();
    chart.drag_move("D", -8.0, 20.0).unwrap();
    chart.drag_end("D").unwrap();

    let mut copy = chart.clone_onto(SvgSurface::new()).unwrap();
    assert_eq!(xy(&copy, "D"), (680.0, 260.0));
    assert_eq!(copy.store().placements(), chart.store().placements());

    let popup = copy.click(472.0, 240.0, 10.0, 60.0).cloned().unwrap();
    assert_eq!(popup.items, ["reports to", "since 2019"]);

    let original = chart.destroy();
    assert!(!original.is_mounted());
    assert!(copy.surface().is_mounted());
}

#[test]
fn edge_clicks_follow_the_annotation_map() {
    let annotations = parse_annotations(&fixture("annotations.json")).unwrap();
    let mut chart = RelationChart::new(SvgSurface::new(), ChartOptions::default())
        .with_annotations(annotations);
    chart.render(&load("basic.json")).unwrap();

    // Marker of A-C at (452, 292): annotated with an empty list.
    let popup = chart.click(452.0, 292.0, 200.0, 300.0).cloned().unwrap();
    assert_eq!(popup.key, "A-C");
    assert!(popup.items.is_empty());
    assert_eq!((popup.left, popup.top), (230.0, 254.0));

    // Marker of B-E at (596, 292) has no annotation; the A-C popup stays.
    assert!(chart.click(596.0, 292.0, 0.0, 0.0).is_none());
    assert_eq!(chart.active_popup().map(|p| p.key.as_str()), Some("A-C"));

    let idx = chart
        .edges()
        .iter()
        .position(|edge| edge.key() == "B-D")
        .unwrap();
    let popup = chart.click_edge(idx, 0.0, 100.0).cloned().unwrap();
    assert_eq!(popup.items, ["mentors"]);
    assert_eq!(popup.top, 54.0);

    assert!(chart.close_popup().is_some());
    assert!(chart.close_popup().is_none());
}

#[test]
fn config_fixture_seeds_shapes_until_recover() {
    let config = parse_config(&fixture("config.json")).unwrap();
    let mut chart = RelationChart::new(SvgSurface::new(), config.options.clone())
        .with_theme(config.theme.clone());
    chart.render(&load("basic.json")).unwrap();

    assert_eq!(xy(&chart, "A"), (300.0, 200.0));
    assert_eq!(chart.placement("A").unwrap().r, 40.0);
    assert_eq!(xy(&chart, "B"), (420.0, 200.0));
    assert_eq!(xy(&chart, "C"), (100.0, 100.0));
    assert_eq!(chart.placement("C").unwrap().r, 18.0);
    assert_eq!(xy(&chart, "E"), (506.0, 286.0));

    let svg = render_svg(chart.surface());
    assert!(svg.contains("data-container=\"#relation\""));
    assert!(svg.contains("<path d=\"M300,200L100,100\" fill=\"none\" stroke=\"#999999\""));
    assert!(svg.contains("<circle cx=\"200\" cy=\"150\" r=\"6\""));

    chart.recover().unwrap();
    assert_eq!(xy(&chart, "C"), (386.0, 286.0));
}

#[test]
fn render_with_options_uses_config() {
    let config = parse_config(&fixture("config.json")).unwrap();
    let svg = render_with_options(&fixture("basic.json"), RenderOptions::from(config)).unwrap();
    assert!(svg.contains("width=\"600\" height=\"400\" viewBox=\"0 0 600 400\""));
    assert!(svg.contains("font-size=\"12px\""));
    assert!(svg.ends_with("</svg>"));
}

#[test]
fn panning_moves_the_view_box_only() {
    let mut chart = chart_for("basic.json");
    for key in [Key::Right, Key::Right, Key::Up, Key::Other] {
        chart.key_down(key);
    }
    let svg = render_svg(chart.surface());
    assert!(svg.contains("viewBox=\"-20 10 800 480\""));
    assert_eq!(xy(&chart, "A"), (400.0, 240.0));
}

#[test]
fn layout_dump_is_written_as_json() {
    let chart = chart_for("basic.json");
    let path = std::env::temp_dir().join(format!("relchart-dump-{}.json", std::process::id()));
    write_layout_dump(&path, &chart).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(written["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(written["edges"][0]["key"], "A-B");
    assert_eq!(written["edges"][0]["path"], "M400,240L544,240");
}

#[test]
fn subtree_input_attaches_under_a_rendered_node() {
    let subtree = r#"{
        "id": "D",
        "title": "Delta",
        "parent": "B",
        "childNodes": [{"id": "F", "title": "Foxtrot", "childNodes": null}]
    }"#;
    let mut chart = chart_for("basic.json");
    chart.render(&parse_chart_input(subtree).unwrap()).unwrap();

    assert_eq!(xy(&chart, "D"), (688.0, 240.0));
    assert_eq!(xy(&chart, "F"), (832.0, 240.0));
    let keys: Vec<String> = chart.edges().iter().map(|edge| edge.key()).collect();
    assert_eq!(keys, ["A-B", "A-C", "B-D", "B-E", "D-F"]);
    assert_eq!(chart.data_flatten().len(), 6);

    assert!(matches!(
        render_with_options(subtree, RenderOptions::classic()),
        Err(ChartError::InvalidInput { .. })
    ));
}

#[test]
fn bad_references_and_inputs_are_errors() {
    let mut chart = chart_for("basic.json");
    assert!(matches!(
        chart.drag_start("Z"),
        Err(ChartError::UnknownNodeReference { .. })
    ));
    assert!(matches!(
        parse_chart_input(r#"{"id": "A", "childNodes": [{"id": "B"}, {"id": "B"}]}"#),
        Err(ChartError::InvalidInput { .. })
    ));
    assert!(matches!(
        parse_config(r#"{"theme": "neon"}"#),
        Err(ChartError::InvalidConfig { .. })
    ));

    let mut empty = RelationChart::new(SvgSurface::new(), ChartOptions::default());
    empty.render(&parse_chart_input("[]").unwrap()).unwrap();
    assert!(empty.surface().is_empty());
}
