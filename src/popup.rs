use crate::ir::Annotations;
use serde::Serialize;

/// Horizontal offset of a popup from the click, in client pixels.
pub const POPUP_OFFSET_X: f64 = 30.0;
/// Vertical offset of a popup from the click, in client pixels.
pub const POPUP_OFFSET_Y: f64 = -46.0;

/// Annotation panel shown next to a clicked edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub key: String,
    pub items: Vec<String>,
    pub left: f64,
    pub top: f64,
}

impl Popup {
    /// Popup for `key` at a click on `(client_x, client_y)`, or `None` when nothing is annotated.
    pub fn lookup(
        annotations: &Annotations,
        key: &str,
        client_x: f64,
        client_y: f64,
    ) -> Option<Self> {
        let items = annotations.get(key)?;
        Some(Self {
            key: key.to_string(),
            items: items.to_vec(),
            left: client_x + POPUP_OFFSET_X,
            top: client_y + POPUP_OFFSET_Y,
        })
    }
}
