//! Radial placement of nodes around their parent.
//!
//! The root sits at the canvas centre. Children fan out on a circle of at least eight slots,
//! each successive sibling slightly farther out than the previous one. Children of a parent
//! that lies left of the canvas centre are mirrored through the parent so left subtrees keep
//! growing leftwards.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Minimum number of angular slots a fan is spread over.
pub const MIN_FAN_SLOTS: usize = 8;
/// Child circle radius relative to the base radius.
pub const CHILD_RADIUS_RATIO: f64 = 0.6;
/// Polar distance of the first child, in base radii.
pub const FIRST_RING: f64 = 3.0;
/// Extra polar distance per sibling index, in base radii.
pub const RING_STEP: f64 = 0.05;

/// Where a node is drawn and how big.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    /// Distance to the parent's centre when the node was placed. Never updated by drags.
    pub polar: f64,
    pub r: f64,
}

impl Placement {
    pub fn center(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Rounds halves toward positive infinity, so `-2.5` becomes `-2`.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub fn angular_step(sibling_count: usize) -> f64 {
    2.0 * PI / sibling_count.max(MIN_FAN_SLOTS) as f64
}

/// Reference geometry derived from the canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialLayout {
    pub base_x: f64,
    pub base_y: f64,
    pub base_radius: f64,
}

impl RadialLayout {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            base_x: round_half_up(width / 2.0),
            base_y: round_half_up(height / 2.0),
            base_radius: round_half_up(width.min(height) / 10.0),
        }
    }

    pub fn root(&self) -> Placement {
        Placement {
            x: self.base_x,
            y: self.base_y,
            polar: self.base_radius,
            r: self.base_radius,
        }
    }

    pub fn child_radius(&self) -> f64 {
        round_half_up(self.base_radius * CHILD_RADIUS_RATIO)
    }

    pub fn child_polar(&self, index: usize) -> f64 {
        self.base_radius * (FIRST_RING + index as f64 * RING_STEP)
    }

    /// Placement of sibling `index` out of `count` around `parent`.
    pub fn child(&self, parent: &Placement, count: usize, index: usize) -> Placement {
        let theta = angular_step(count);
        let polar = self.child_polar(index);
        let angle = theta * index as f64;
        let (dx, dy) = (polar * angle.cos(), polar * angle.sin());
        let (x, y) = if parent.x < self.base_x {
            (parent.x - dx, parent.y - dy)
        } else {
            (parent.x + dx, parent.y + dy)
        };
        Placement {
            x: round_half_up(x),
            y: round_half_up(y),
            polar,
            r: self.child_radius(),
        }
    }

    pub fn children(&self, parent: &Placement, count: usize) -> Vec<Placement> {
        (0..count)
            .map(|index| self.child(parent, count, index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_sits_at_canvas_centre() {
        let layout = RadialLayout::new(800.0, 480.0);
        let root = layout.root();
        assert_eq!((root.x, root.y), (400.0, 240.0));
        assert_eq!((root.r, root.polar), (48.0, 48.0));

        let odd = RadialLayout::new(801.0, 333.0).root();
        assert_eq!((odd.x, odd.y, odd.r), (401.0, 167.0, 33.0));
    }

    #[test]
    fn small_fans_use_eight_slots() {
        assert_eq!(angular_step(0), 2.0 * PI / 8.0);
        assert_eq!(angular_step(3), 2.0 * PI / 8.0);
        assert_eq!(angular_step(8), 2.0 * PI / 8.0);
        assert_eq!(angular_step(12), 2.0 * PI / 12.0);
    }

    #[test]
    fn two_children_of_centred_root() {
        let layout = RadialLayout::new(800.0, 480.0);
        let root = layout.root();
        let kids = layout.children(&root, 2);
        assert_eq!(kids.len(), 2);

        assert_eq!(kids[0].polar, 144.0);
        assert_eq!((kids[0].x, kids[0].y), (544.0, 240.0));
        assert_eq!(kids[0].r, 29.0);

        let theta = PI / 4.0;
        let polar = 48.0 * 3.05;
        assert!((kids[1].polar - 146.4).abs() < 1e-9);
        assert_eq!(kids[1].x, round_half_up(400.0 + polar * theta.cos()));
        assert_eq!(kids[1].y, round_half_up(240.0 + polar * theta.sin()));
        assert_eq!((kids[1].x, kids[1].y), (504.0, 344.0));
    }

    #[test]
    fn parents_left_of_centre_mirror_their_fan() {
        let layout = RadialLayout::new(800.0, 480.0);
        let parent = Placement {
            x: 300.0,
            y: 200.0,
            polar: 144.0,
            r: 29.0,
        };
        let first = layout.child(&parent, 1, 0);
        assert_eq!((first.x, first.y), (156.0, 200.0));

        let at_centre = Placement { x: 400.0, ..parent };
        assert_eq!(layout.child(&at_centre, 1, 0).x, 544.0);
    }

    #[test]
    fn child_radius_is_flat_across_depths() {
        let layout = RadialLayout::new(800.0, 480.0);
        let root = layout.root();
        let child = layout.child(&root, 3, 2);
        let grandchild = layout.child(&child, 5, 4);
        assert_eq!(child.r, grandchild.r);
        assert!((grandchild.polar - 153.6).abs() < 1e-9);
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
    }
}
