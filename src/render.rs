use crate::blob::{blob_points, cave_blob, terrain_blob, terrain_blob_centers};
use crate::canvas::Canvas;
use crate::cave::Cave;
use crate::config::Params;
use crate::raster::rasterize_polygon;

/// Terrain fill. Only alpha matters to hosts.
pub const TERRAIN_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Draw every terrain blob opaque. Overlaps union through alpha.
pub fn draw_terrain(canvas: &mut Canvas, params: &Params) {
    let (w, h) = canvas.dimensions();
    for (i, center) in terrain_blob_centers(params, w, h).into_iter().enumerate() {
        let points = blob_points(&terrain_blob(params, i, center));
        let cov = rasterize_polygon(&points, w as usize, h as usize);
        canvas.fill_coverage(&cov.mask, cov.x0, cov.y0, TERRAIN_COLOR);
    }
}

/// Punch each cave out of the canvas in list order with the destination
/// mask blend, leaving antialiased borders.
pub fn cut_caves(canvas: &mut Canvas, params: &Params, caves: &[Cave]) {
    let (w, h) = canvas.dimensions();
    for cave in caves {
        let points = blob_points(&cave_blob(params, cave));
        let cov = rasterize_polygon(&points, w as usize, h as usize);
        canvas.cut_coverage(&cov.mask, cov.x0, cov.y0);
    }
}

/// Full frame: clear, terrain, then caves when enabled.
pub fn render_terrain(canvas: &mut Canvas, params: &Params, caves: &[Cave]) {
    canvas.clear();
    draw_terrain(canvas, params);
    if params.caves_enabled && !caves.is_empty() {
        cut_caves(canvas, params, caves);
    }
}
