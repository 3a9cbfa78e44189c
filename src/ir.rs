use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Scalar accepted wherever the input format expects text. Numbers and booleans are kept in
/// their JSON spelling so `"stroke-width": 1` and `"stroke-width": "1"` mean the same thing.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(f64),
    Bool(bool),
    String(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Number(val) => format!("{}", val),
            Scalar::Bool(val) => val.to_string(),
            Scalar::String(val) => val,
        }
    }
}

fn de_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(Scalar::into_string)
}

fn de_opt_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}

/// `childNodes: null` marks a leaf the same way a missing or empty list does.
fn de_children<'de, D>(deserializer: D) -> Result<Vec<NodeData>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<NodeData>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ordered SVG presentation attributes (`fill`, `font-size`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Style(IndexMap<String, String>);

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Shallow merge: every key of `overrides` replaces the default, everything else is kept.
    pub fn merged(&self, overrides: Option<&Style>) -> Style {
        let mut out = self.clone();
        if let Some(overrides) = overrides {
            out.extend(overrides);
        }
        out
    }

    pub fn extend(&mut self, other: &Style) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }
}

impl<'de> Deserialize<'de> for Style {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, Scalar>::deserialize(deserializer)?;
        Ok(Style(
            raw.into_iter()
                .map(|(key, value)| (key, value.into_string()))
                .collect(),
        ))
    }
}

/// One node of the input tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(deserialize_with = "de_scalar")]
    pub id: String,
    #[serde(default, deserialize_with = "de_scalar")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "de_opt_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_children",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub child_nodes: Vec<NodeData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_style: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circle_style: Option<Style>,
}

impl NodeData {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            parent: None,
            child_nodes: Vec::new(),
            text_style: None,
            circle_style: None,
        }
    }

    /// Appends `child`, pointing its `parent` at this node.
    pub fn with_child(mut self, mut child: NodeData) -> Self {
        child.parent = Some(self.id.clone());
        self.child_nodes.push(child);
        self
    }

    pub fn with_text_style(mut self, style: Style) -> Self {
        self.text_style = Some(style);
        self
    }

    pub fn with_circle_style(mut self, style: Style) -> Self {
        self.circle_style = Some(style);
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Snapshot of a node without its children, detached from the input tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatNode {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_style: Option<Style>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle_style: Option<Style>,
}

impl From<&NodeData> for FlatNode {
    fn from(node: &NodeData) -> Self {
        Self {
            id: node.id.clone(),
            title: node.title.clone(),
            parent: node.parent.clone(),
            text_style: node.text_style.clone(),
            circle_style: node.circle_style.clone(),
        }
    }
}

/// Popup content keyed by `"<parentId>-<childId>"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Annotations(IndexMap<String, Vec<String>>);

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: &str, to: &str, items: Vec<String>) {
        self.0.insert(annotation_key(from, to), items);
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Annotations {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, Vec<Scalar>>::deserialize(deserializer)?;
        Ok(Annotations(
            raw.into_iter()
                .map(|(key, items)| (key, items.into_iter().map(Scalar::into_string).collect()))
                .collect(),
        ))
    }
}

pub fn annotation_key(from: &str, to: &str) -> String {
    format!("{from}-{to}")
}
