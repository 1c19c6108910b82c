use rayon::prelude::*;

use crate::grid::Grid;

/// Vertical samples per pixel row. Horizontal coverage is exact.
pub const SUBSAMPLES: usize = 4;

/// Antialiased coverage of one polygon, clipped to the target and stored
/// only over the polygon's bounding box. `mask` cell `(mx, my)` maps to
/// target pixel `(x0 + mx, y0 + my)`.
#[derive(Clone, Debug)]
pub struct Coverage {
    pub x0: usize,
    pub y0: usize,
    pub mask: Grid<f32>,
}

impl Coverage {
    pub fn empty() -> Self {
        Self {
            x0: 0,
            y0: 0,
            mask: Grid::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Covered area in pixels.
    pub fn area(&self) -> f32 {
        self.mask.data.iter().sum()
    }

    /// Coverage at a target pixel, zero outside the box.
    pub fn at(&self, x: usize, y: usize) -> f32 {
        if x < self.x0 || y < self.y0 {
            return 0.0;
        }
        let (mx, my) = (x - self.x0, y - self.y0);
        if mx >= self.mask.w || my >= self.mask.h {
            return 0.0;
        }
        self.mask.get(mx, my)
    }
}

struct Edge {
    ax: f32,
    ay: f32,
    bx: f32,
    by: f32,
    ymin: f32,
    ymax: f32,
    dir: i32,
}

/// Fill a closed polygon (nonzero winding) into a coverage mask for a
/// `width x height` target. Fewer than three points, non-finite vertices or a
/// polygon entirely off-target yield an empty mask.
pub fn rasterize_polygon(points: &[[f32; 2]], width: usize, height: usize) -> Coverage {
    if points.len() < 3 || points.iter().any(|p| !p[0].is_finite() || !p[1].is_finite()) {
        return Coverage::empty();
    }

    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p[0]);
        max_x = max_x.max(p[0]);
        min_y = min_y.min(p[1]);
        max_y = max_y.max(p[1]);
    }

    let x0 = min_x.floor().max(0.0) as usize;
    let y0 = min_y.floor().max(0.0) as usize;
    let x1 = (max_x.ceil().max(0.0) as usize).min(width);
    let y1 = (max_y.ceil().max(0.0) as usize).min(height);
    if x0 >= x1 || y0 >= y1 {
        return Coverage::empty();
    }

    let edges: Vec<Edge> = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .filter(|(a, b)| a[1] != b[1])
        .map(|(a, b)| Edge {
            ax: a[0],
            ay: a[1],
            bx: b[0],
            by: b[1],
            ymin: a[1].min(b[1]),
            ymax: a[1].max(b[1]),
            dir: if b[1] > a[1] { 1 } else { -1 },
        })
        .collect();

    let mw = x1 - x0;
    let mut mask = Grid::<f32>::new(mw, y1 - y0);
    let weight = 1.0 / SUBSAMPLES as f32;

    mask.data
        .par_chunks_mut(mw)
        .enumerate()
        .for_each(|(my, row)| {
            let py = (y0 + my) as f32;
            let mut crossings: Vec<(f32, i32)> = Vec::with_capacity(8);
            for s in 0..SUBSAMPLES {
                let sy = py + (s as f32 + 0.5) * weight;
                crossings.clear();
                for e in &edges {
                    // Half-open in y so shared vertices count once.
                    if sy >= e.ymin && sy < e.ymax {
                        let t = (sy - e.ay) / (e.by - e.ay);
                        crossings.push((e.ax + t * (e.bx - e.ax), e.dir));
                    }
                }
                crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut winding = 0;
                let mut span_start = 0.0;
                for &(x, dir) in &crossings {
                    let was_inside = winding != 0;
                    winding += dir;
                    if !was_inside && winding != 0 {
                        span_start = x;
                    } else if was_inside && winding == 0 {
                        add_span(row, span_start - x0 as f32, x - x0 as f32, weight);
                    }
                }
            }
            for c in row.iter_mut() {
                *c = c.min(1.0);
            }
        });

    Coverage { x0, y0, mask }
}

/// Add `weight` of horizontal coverage over `[a, b)` with fractional ends.
fn add_span(row: &mut [f32], a: f32, b: f32, weight: f32) {
    let len = row.len() as f32;
    let a = a.clamp(0.0, len);
    let b = b.clamp(0.0, len);
    if b <= a {
        return;
    }
    let ia = a.floor() as usize;
    let ib = b.floor() as usize;
    if ia == ib {
        row[ia] += (b - a) * weight;
        return;
    }
    row[ia] += (ia as f32 + 1.0 - a) * weight;
    for c in &mut row[ia + 1..ib] {
        *c += weight;
    }
    if ib < row.len() {
        row[ib] += (b - ib as f32) * weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<[f32; 2]> {
        vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }

    #[test]
    fn test_pixel_aligned_square_is_exact() {
        let cov = rasterize_polygon(&square(2.0, 2.0, 6.0, 6.0), 10, 10);
        assert_eq!((cov.x0, cov.y0), (2, 2));
        assert_eq!(cov.area(), 16.0);
        for y in 0..10 {
            for x in 0..10 {
                let inside = (2..6).contains(&x) && (2..6).contains(&y);
                assert_eq!(cov.at(x, y), if inside { 1.0 } else { 0.0 }, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_half_pixel_edges_are_partial() {
        let cov = rasterize_polygon(&square(2.5, 2.5, 4.5, 4.5), 10, 10);
        assert_eq!(cov.at(3, 3), 1.0);
        assert_eq!(cov.at(2, 3), 0.5);
        assert_eq!(cov.at(3, 2), 0.5);
        assert_eq!(cov.at(2, 2), 0.25);
        assert!((cov.area() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_winding_direction_does_not_matter() {
        let ccw = square(1.3, 1.7, 7.2, 5.9);
        let cw: Vec<[f32; 2]> = ccw.iter().rev().copied().collect();
        let a = rasterize_polygon(&ccw, 10, 10);
        let b = rasterize_polygon(&cw, 10, 10);
        assert_eq!(a.mask.data, b.mask.data);
    }

    #[test]
    fn test_regular_polygon_area() {
        let n = 100;
        let r = 50.0f32;
        let pts: Vec<[f32; 2]> = (0..n)
            .map(|i| {
                let t = std::f32::consts::TAU * i as f32 / n as f32;
                [100.0 + r * t.cos(), 100.0 + r * t.sin()]
            })
            .collect();
        let cov = rasterize_polygon(&pts, 200, 200);
        let expected = 0.5 * n as f32 * r * r * (std::f32::consts::TAU / n as f32).sin();
        assert!(
            (cov.area() - expected).abs() / expected < 0.01,
            "area {} vs {expected}",
            cov.area()
        );
        assert_eq!(cov.at(100, 100), 1.0);
        assert_eq!(cov.at(100, 40), 0.0);
    }

    #[test]
    fn test_clipped_to_target() {
        let cov = rasterize_polygon(&square(-5.0, -5.0, 3.0, 3.0), 10, 10);
        assert_eq!((cov.x0, cov.y0), (0, 0));
        assert_eq!((cov.mask.w, cov.mask.h), (3, 3));
        assert_eq!(cov.area(), 9.0);
    }

    #[test]
    fn test_degenerate_inputs_draw_nothing() {
        assert!(rasterize_polygon(&[[0.0, 0.0], [5.0, 5.0]], 10, 10).is_empty());
        assert!(rasterize_polygon(&square(20.0, 20.0, 30.0, 30.0), 10, 10).is_empty());
        let mut bad = square(1.0, 1.0, 4.0, 4.0);
        bad[2][0] = f32::NAN;
        assert!(rasterize_polygon(&bad, 10, 10).is_empty());
    }
}
