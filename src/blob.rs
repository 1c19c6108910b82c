//! Noise-perturbed polygonal blobs: terrain silhouettes and cave cutouts.

use std::f32::consts::TAU;

use crate::cave::Cave;
use crate::config::Params;
use crate::noise::perlin2;

/// Inputs for one blob ring.
///
/// Vertex `i` sits at angle `θ = 2π·i/point_count + phase`. The noise is
/// sampled at `((cos θ + lattice_shift)·frequency + sample_offset,
/// sin θ·frequency + sample_offset)`, and the radius becomes
/// `radius + n·amplitude·radius·0.5`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlobShape {
    pub center: [f32; 2],
    pub point_count: usize,
    pub radius: f32,
    pub frequency: f32,
    pub amplitude: f32,
    /// X multiplier applied to each vertex offset from the center.
    pub stretch: f32,
    pub phase: f32,
    /// Added to `cos θ` before frequency scaling (terrain sibling index).
    pub lattice_shift: f32,
    /// Added to both noise coordinates after scaling (cave offset).
    pub sample_offset: f32,
}

/// Ordered vertex ring, counterclockwise for a y-down raster.
pub fn blob_points(shape: &BlobShape) -> Vec<[f32; 2]> {
    let n = shape.point_count;
    (0..n)
        .map(|i| {
            let theta = TAU * i as f32 / n as f32 + shape.phase;
            let (sin, cos) = theta.sin_cos();
            let nx = (cos + shape.lattice_shift) * shape.frequency + shape.sample_offset;
            let ny = sin * shape.frequency + shape.sample_offset;
            let variation = perlin2(nx, ny) * shape.amplitude * shape.radius * 0.5;
            let r = shape.radius + variation;
            [
                shape.center[0] + r * cos * shape.stretch,
                shape.center[1] + r * sin,
            ]
        })
        .collect()
}

/// Centers of the terrain blobs laid out along the horizontal midline.
/// Always at least one, even for a zero or negative `blob_count`, and a lone
/// blob sits at the canvas center.
pub fn terrain_blob_centers(params: &Params, width: u32, height: u32) -> Vec<[f32; 2]> {
    let count = params.blob_count.max(1);
    let r = params.base_radius as f32;
    let step = r * params.blob_spacing;
    let total_width = (count as f32 - 1.0) * step;
    let start_x = (width as f32 - total_width) / 2.0;
    let cy = height as f32 / 2.0;
    (0..count)
        .map(|i| [start_x + i as f32 * step, cy])
        .collect()
}

/// Shape of terrain blob `index`, centered at `center`.
pub fn terrain_blob(params: &Params, index: usize, center: [f32; 2]) -> BlobShape {
    BlobShape {
        center,
        point_count: params.point_count,
        radius: params.base_radius as f32,
        frequency: params.noise_frequency,
        amplitude: params.noise_amplitude,
        stretch: params.horizontal_stretch,
        phase: 0.0,
        lattice_shift: index as f32,
        sample_offset: 0.0,
    }
}

/// Shape of a cave cutout. Caves are never stretched.
pub fn cave_blob(params: &Params, cave: &Cave) -> BlobShape {
    BlobShape {
        center: cave.position,
        point_count: params.cave_point_count,
        radius: params.base_radius as f32 * params.cave_scale * cave.scale_variant,
        frequency: params.cave_noise_frequency,
        amplitude: params.cave_noise_amplitude,
        stretch: 1.0,
        phase: cave.rotation,
        lattice_shift: 0.0,
        sample_offset: cave.noise_offset,
    }
}
