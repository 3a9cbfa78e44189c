use crate::layout::round_half_up;

/// Pointer state of one draggable node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Pointer is down; `anchor` is the rendered centre captured on pointer-down.
    Dragging { anchor_x: f64, anchor_y: f64 },
}

/// Turns pointer deltas into absolute node positions.
///
/// Deltas are always relative to where the gesture started, so positions never accumulate
/// rounding drift across moves.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Begins a gesture anchored at `center`. Restarting while dragging re-anchors.
    pub fn start(&mut self, center: (f64, f64)) {
        self.state = DragState::Dragging {
            anchor_x: center.0,
            anchor_y: center.1,
        };
    }

    /// New node centre for a pointer offset of `(dx, dy)`, or `None` when idle.
    pub fn drag_to(&self, dx: f64, dy: f64) -> Option<(f64, f64)> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { anchor_x, anchor_y } => Some((
                round_half_up(anchor_x + dx),
                round_half_up(anchor_y + dy),
            )),
        }
    }

    pub fn end(&mut self) {
        self.state = DragState::Idle;
    }
}
