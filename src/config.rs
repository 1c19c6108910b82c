use serde::{Deserialize, Serialize};

/// All tunable parameters — exposed as UI sliders by the host.
///
/// Owned by the engine; hosts read and write it through the engine's typed
/// accessors so change notification and cave bookkeeping stay consistent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Params {
    // Terrain blobs
    pub point_count: usize,
    pub base_radius: u32,
    pub horizontal_stretch: f32,
    pub noise_frequency: f32,
    pub noise_amplitude: f32,
    /// Signed: zero or negative still draws a single blob.
    pub blob_count: i32,
    /// Center-to-center distance in `base_radius` units.
    pub blob_spacing: f32,

    // Caves
    pub caves_enabled: bool,
    pub cave_scale: f32,
    pub cave_noise_frequency: f32,
    pub cave_noise_amplitude: f32,
    pub cave_count: usize,
    pub cave_point_count: usize,
    pub selected_cave: Option<usize>,
}

impl Params {
    /// Defaults for a canvas of the given size. The base radius is a third of
    /// the shorter side.
    pub fn for_canvas(width: u32, height: u32) -> Self {
        Self {
            point_count: 20,
            base_radius: width.min(height) / 3,
            horizontal_stretch: 1.0,
            noise_frequency: 1.0,
            noise_amplitude: 1.0,
            blob_count: 1,
            blob_spacing: 1.5,
            caves_enabled: true,
            cave_scale: 0.3,
            cave_noise_frequency: 2.0,
            cave_noise_amplitude: 1.0,
            cave_count: 0,
            cave_point_count: 20,
            selected_cave: None,
        }
    }

    /// Every field pulled into its slider range. Non-finite floats fall back
    /// to the range minimum. The selection is left alone; only the engine
    /// knows how many caves exist.
    pub fn clamped(&self) -> Self {
        use ranges::*;
        Self {
            point_count: clamp_ord(self.point_count, &POINT_COUNT),
            base_radius: clamp_ord(self.base_radius, &BASE_RADIUS),
            horizontal_stretch: clamp_f32(self.horizontal_stretch, &HORIZONTAL_STRETCH),
            noise_frequency: clamp_f32(self.noise_frequency, &NOISE_FREQUENCY),
            noise_amplitude: clamp_f32(self.noise_amplitude, &NOISE_AMPLITUDE),
            blob_count: clamp_ord(self.blob_count, &BLOB_COUNT),
            blob_spacing: clamp_f32(self.blob_spacing, &BLOB_SPACING),
            caves_enabled: self.caves_enabled,
            cave_scale: clamp_f32(self.cave_scale, &CAVE_SCALE),
            cave_noise_frequency: clamp_f32(self.cave_noise_frequency, &CAVE_NOISE_FREQUENCY),
            cave_noise_amplitude: clamp_f32(self.cave_noise_amplitude, &CAVE_NOISE_AMPLITUDE),
            cave_count: clamp_ord(self.cave_count, &CAVE_COUNT),
            cave_point_count: clamp_ord(self.cave_point_count, &CAVE_POINT_COUNT),
            selected_cave: self.selected_cave,
        }
    }
}

fn clamp_ord<T: Ord + Copy>(v: T, r: &std::ops::RangeInclusive<T>) -> T {
    v.clamp(*r.start(), *r.end())
}

fn clamp_f32(v: f32, r: &std::ops::RangeInclusive<f32>) -> f32 {
    if v.is_finite() {
        v.clamp(*r.start(), *r.end())
    } else {
        *r.start()
    }
}

/// Slider ranges.
pub mod ranges {
    use std::ops::RangeInclusive;

    pub const POINT_COUNT: RangeInclusive<usize> = 3..=100;
    pub const BASE_RADIUS: RangeInclusive<u32> = 10..=300;
    pub const HORIZONTAL_STRETCH: RangeInclusive<f32> = 0.1..=3.0;
    pub const NOISE_FREQUENCY: RangeInclusive<f32> = 0.1..=5.0;
    pub const NOISE_AMPLITUDE: RangeInclusive<f32> = 0.0..=2.0;
    pub const BLOB_COUNT: RangeInclusive<i32> = 1..=10;
    pub const BLOB_SPACING: RangeInclusive<f32> = 0.5..=3.0;
    pub const CAVE_SCALE: RangeInclusive<f32> = 0.1..=1.0;
    pub const CAVE_NOISE_FREQUENCY: RangeInclusive<f32> = 0.1..=5.0;
    pub const CAVE_NOISE_AMPLITUDE: RangeInclusive<f32> = 0.0..=2.0;
    pub const CAVE_COUNT: RangeInclusive<usize> = 0..=10;
    pub const CAVE_POINT_COUNT: RangeInclusive<usize> = 3..=100;
}
