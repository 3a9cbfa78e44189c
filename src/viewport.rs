use crate::surface::ViewBox;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// View box shift per arrow key press, in canvas units.
pub const PAN_STEP: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Left,
    Up,
    Right,
    Down,
    Other,
}

impl Key {
    /// Maps DOM key codes 37 to 40.
    pub fn from_code(code: u32) -> Self {
        match code {
            37 => Key::Left,
            38 => Key::Up,
            39 => Key::Right,
            40 => Key::Down,
            _ => Key::Other,
        }
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "arrowleft" => Ok(Key::Left),
            "up" | "arrowup" => Ok(Key::Up),
            "right" | "arrowright" => Ok(Key::Right),
            "down" | "arrowdown" => Ok(Key::Down),
            other => Err(format!("unknown pan direction '{other}'")),
        }
    }
}

/// View box after pressing `key`. Moving the view box left reveals content to the right, so
/// Left increases `x`.
pub fn pan(view_box: ViewBox, key: Key) -> ViewBox {
    let mut next = view_box;
    match key {
        Key::Left => next.x += PAN_STEP,
        Key::Up => next.y += PAN_STEP,
        Key::Right => next.x -= PAN_STEP,
        Key::Down => next.y -= PAN_STEP,
        Key::Other => {}
    }
    next
}
