//! Fixed-size RGBA raster target the engine renders into.

use rayon::prelude::*;

use crate::error::EngineError;
use crate::grid::Grid;

pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Straight-alpha RGBA8 image, row-major. Length of `pixels` is
/// `width * height * 4`.
#[derive(Clone, Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// Allocate a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions { width, height });
        }
        let alloc_err = || EngineError::CanvasAllocation { width, height };
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(alloc_err)?;

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len).map_err(|_| alloc_err())?;
        pixels.resize(len, 0);

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Number of pixels with full alpha.
    pub fn opaque_pixel_count(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[3] == 255).count()
    }

    /// Copy into an `image` buffer for hosts that blit or encode.
    pub fn to_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .expect("canvas buffer holds width * height RGBA pixels")
    }

    /// Composite `color` through a coverage mask whose top-left sits at
    /// `(x0, y0)` on the canvas, with straight-alpha "over".
    pub fn fill_coverage(&mut self, mask: &Grid<f32>, x0: usize, y0: usize, color: [u8; 4]) {
        self.for_each_covered(mask, x0, y0, |px, c| blend_over(px, color, c));
    }

    /// Attenuate the canvas by one minus the mask coverage on all channels.
    pub fn cut_coverage(&mut self, mask: &Grid<f32>, x0: usize, y0: usize) {
        self.for_each_covered(mask, x0, y0, blend_cutout);
    }

    fn for_each_covered<F>(&mut self, mask: &Grid<f32>, x0: usize, y0: usize, op: F)
    where
        F: Fn(&mut [u8], f32) + Sync,
    {
        if mask.is_empty() {
            return;
        }
        let stride = self.width as usize * 4;
        let w = mask.w.min((self.width as usize).saturating_sub(x0));
        self.pixels
            .par_chunks_mut(stride)
            .skip(y0)
            .take(mask.h)
            .enumerate()
            .for_each(|(my, row)| {
                for mx in 0..w {
                    let c = mask.get(mx, my);
                    if c > 0.0 {
                        let i = (x0 + mx) * 4;
                        op(&mut row[i..i + 4], c.min(1.0));
                    }
                }
            });
    }
}

#[inline]
fn to_unit(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Straight-alpha source-over of `color` with its alpha scaled by `coverage`.
#[inline]
pub fn blend_over(dst: &mut [u8], color: [u8; 4], coverage: f32) {
    let sa = to_unit(color[3]) * coverage;
    if sa <= 0.0 {
        return;
    }
    let da = to_unit(dst[3]);
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let s = to_unit(color[c]);
        let d = to_unit(dst[c]);
        let v = if out_a > 0.0 {
            (s * sa + d * da * (1.0 - sa)) / out_a
        } else {
            0.0
        };
        dst[c] = to_byte(v);
    }
    dst[3] = to_byte(out_a);
}

/// Destination mask: `dst_rgba <- dst_rgba * (1 - coverage)`.
#[inline]
pub fn blend_cutout(dst: &mut [u8], coverage: f32) {
    let keep = 1.0 - coverage.clamp(0.0, 1.0);
    for v in dst.iter_mut() {
        *v = to_byte(to_unit(*v) * keep);
    }
}
