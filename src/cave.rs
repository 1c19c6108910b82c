//! Persistent cave list with selection and seeded placement.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rng::Rng;

/// One cave cutout. Its pose persists across renders until the list is
/// regenerated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cave {
    /// Center in canvas pixels, drawn on the integer grid.
    pub position: [f32; 2],
    /// Angular phase of the cave ring, radians.
    pub rotation: f32,
    /// Per-cave radius multiplier, usually 0.8..1.2.
    pub scale_variant: f32,
    /// Shift into the noise field, usually 0..10.
    pub noise_offset: f32,
}

/// Integer rectangle caves are placed in: `[0.2w, 0.8w] x [0.3h, 0.7h]`,
/// inclusive on both ends.
pub fn spawn_bounds(width: u32, height: u32) -> ([i32; 2], [i32; 2]) {
    let w = width as f32;
    let h = height as f32;
    (
        [(w * 0.2) as i32, (w * 0.8) as i32],
        [(h * 0.3) as i32, (h * 0.7) as i32],
    )
}

/// Ordered cave list plus the RNG that places them and the current selection.
///
/// Invariant: `selected` is `None` or a valid index into `caves`.
#[derive(Clone, Debug)]
pub struct CaveSet {
    caves: Vec<Cave>,
    selected: Option<usize>,
    rng: Rng,
    width: u32,
    height: u32,
}

impl CaveSet {
    pub fn new(width: u32, height: u32, rng: Rng) -> Self {
        Self {
            caves: Vec::new(),
            selected: None,
            rng,
            width,
            height,
        }
    }

    pub fn caves(&self) -> &[Cave] {
        &self.caves
    }

    pub fn len(&self) -> usize {
        self.caves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caves.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_cave(&self) -> Option<&Cave> {
        self.selected.and_then(|i| self.caves.get(i))
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = Rng::new(seed);
    }

    /// Drop every cave and the selection.
    pub fn clear(&mut self) {
        self.caves.clear();
        self.selected = None;
    }

    /// Replace the whole list with `count` fresh caves. A selection past the
    /// new end moves to the last cave, or to none if the list is empty.
    pub fn regenerate(&mut self, count: usize) {
        self.caves.clear();
        self.caves.reserve(count);
        for _ in 0..count {
            let cave = self.random_cave();
            self.caves.push(cave);
        }
        if let Some(i) = self.selected
            && i >= self.caves.len()
        {
            self.selected = self.caves.len().checked_sub(1);
        }
        debug!(count, selected = ?self.selected, "regenerated caves");
    }

    /// Populate `count` caves only if the list is empty. Returns whether any
    /// cave was added.
    pub fn fill_if_empty(&mut self, count: usize) -> bool {
        if !self.caves.is_empty() || count == 0 {
            return false;
        }
        self.regenerate(count);
        true
    }

    /// Accepts `None` or an index inside the list. Returns whether the
    /// selection changed.
    pub fn select(&mut self, index: Option<usize>) -> bool {
        if index == self.selected {
            return false;
        }
        if let Some(i) = index
            && i >= self.caves.len()
        {
            return false;
        }
        self.selected = index;
        true
    }

    /// Overwrite the selected cave's scale, rotation and noise offset.
    /// Position is kept.
    pub fn update_selected(&mut self, scale_variant: f32, rotation: f32, noise_offset: f32) -> bool {
        let Some(cave) = self.selected.and_then(|i| self.caves.get_mut(i)) else {
            return false;
        };
        cave.scale_variant = scale_variant;
        cave.rotation = rotation;
        cave.noise_offset = noise_offset;
        true
    }

    /// Draw a new position for the selected cave from the spawn rectangle.
    pub fn regenerate_selected_position(&mut self) -> bool {
        let Some(i) = self.selected.filter(|i| *i < self.caves.len()) else {
            return false;
        };
        let position = self.random_position();
        self.caves[i].position = position;
        debug!(index = i, x = position[0], y = position[1], "moved cave");
        true
    }

    fn random_position(&mut self) -> [f32; 2] {
        let ([min_x, max_x], [min_y, max_y]) = spawn_bounds(self.width, self.height);
        let x = self.rng.range_i32(min_x, max_x);
        let y = self.rng.range_i32(min_y, max_y);
        [x as f32, y as f32]
    }

    fn random_cave(&mut self) -> Cave {
        let position = self.random_position();
        Cave {
            position,
            rotation: self.rng.range_f32(0.0, TAU),
            scale_variant: self.rng.range_f32(0.8, 1.2),
            noise_offset: self.rng.range_f32(0.0, 10.0),
        }
    }
}
