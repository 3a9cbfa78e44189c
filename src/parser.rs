use crate::error::{ChartError, Result};
use crate::ir::{Annotations, NodeData};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};

/// Accepts either one root object or an array of roots.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum ChartInput {
    Forest(Vec<NodeData>),
    Single(Box<NodeData>),
}

/// Parses a node tree (or forest) from JSON, falling back to JSON5.
///
/// `null`, `{}` and `[]` are valid and yield an empty forest. The result has gone through
/// [`normalize_forest`], so every child carries its container's id as `parent`.
pub fn parse_chart_input(input: &str) -> Result<Vec<NodeData>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = parse_json_value(trimmed)?;
    if is_empty_value(&value) {
        return Ok(Vec::new());
    }
    let parsed: ChartInput = from_value(value)?;
    let forest = match parsed {
        ChartInput::Forest(nodes) => nodes,
        ChartInput::Single(node) => vec![*node],
    };
    normalize_forest(forest)
}

pub fn parse_annotations(input: &str) -> Result<Annotations> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Annotations::new());
    }
    let value =
        parse_json_value(trimmed).map_err(|err| ChartError::invalid_config(err.to_string()))?;
    if value.is_null() {
        return Ok(Annotations::new());
    }
    serde_json::from_value(value).map_err(|err| ChartError::invalid_config(err.to_string()))
}

/// Checks the forest is well formed and fills in missing `parent` links.
///
/// Rejects empty ids, ids used twice anywhere in the forest, and children whose `parent`
/// disagrees with the node they are nested in. A top-level `parent` is kept as given: whether
/// it names a placed node is up to the chart the forest is rendered onto.
pub fn normalize_forest(mut forest: Vec<NodeData>) -> Result<Vec<NodeData>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<&mut NodeData> = forest.iter_mut().collect();
    while let Some(node) = queue.pop_front() {
        if node.id.trim().is_empty() {
            return Err(ChartError::invalid_input("node with empty id"));
        }
        if !seen.insert(node.id.clone()) {
            return Err(ChartError::invalid_input(format!("duplicate node id '{}'", node.id)));
        }
        let parent_id = node.id.clone();
        for child in node.child_nodes.iter_mut() {
            match &child.parent {
                Some(declared) if *declared != parent_id => {
                    return Err(ChartError::invalid_input(format!(
                        "node '{}' is nested under '{}' but declares parent '{}'",
                        child.id, parent_id, declared
                    )));
                }
                Some(_) => {}
                None => child.parent = Some(parent_id.clone()),
            }
        }
        queue.extend(node.child_nodes.iter_mut());
    }

    Ok(forest)
}

fn parse_json_value(input: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(input) {
        Ok(value) => Ok(value),
        Err(json_err) => json5::from_str::<Value>(input).map_err(|_| {
            ChartError::invalid_input(format!("input is neither JSON nor JSON5: {json_err}"))
        }),
    }
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|err| ChartError::invalid_input(err.to_string()))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
