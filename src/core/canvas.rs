use glam::{Affine2, Vec2};

use super::bitmap::Bitmap;
use super::color::Color;

/// Drawing style for canvas operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    /// Fill colour for rects; alpha also modulates bitmaps
    pub color: Color,
    /// Smooth edges and partial alpha; off for low-bit displays
    pub anti_alias: bool,
    /// Bilinear sampling when drawing transformed bitmaps
    pub filter_bitmap: bool,
}

impl Paint {
    /// Solid fill paint
    pub fn fill(color: Color) -> Self {
        Self {
            color,
            anti_alias: true,
            filter_bitmap: false,
        }
    }

    /// Paint for filtered bitmap draws
    pub fn filtered() -> Self {
        Self {
            color: Color::WHITE,
            anti_alias: true,
            filter_bitmap: true,
        }
    }

    pub fn with_anti_alias(mut self, anti_alias: bool) -> Self {
        self.anti_alias = anti_alias;
        self
    }
}

impl Default for Paint {
    fn default() -> Self {
        Self::fill(Color::BLACK)
    }
}

/// Software canvas - RGBA pixel buffer with a transform stack
#[derive(Debug, Clone)]
pub struct Canvas {
    /// Row-major straight-alpha RGBA pixels
    pixels: Vec<[u8; 4]>,
    width: u32,
    height: u32,
    /// Current local-to-device transform
    matrix: Affine2,
    /// Saved transforms
    saved: Vec<Affine2>,
}

impl Canvas {
    /// Create transparent canvas with dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![[0; 4]; (width * height) as usize],
            width,
            height,
            matrix: Affine2::IDENTITY,
            saved: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGBA bytes, row-major
    pub fn pixels(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Consume canvas and return RGBA bytes
    pub fn into_pixels(self) -> Vec<u8> {
        bytemuck::cast_slice(&self.pixels).to_vec()
    }

    /// Current transform
    pub fn matrix(&self) -> Affine2 {
        self.matrix
    }

    /// Push current transform, returns the save depth before the push
    pub fn save(&mut self) -> usize {
        self.saved.push(self.matrix);
        self.saved.len() - 1
    }

    /// Pop the last saved transform; no-op on an empty stack
    pub fn restore(&mut self) {
        if let Some(matrix) = self.saved.pop() {
            self.matrix = matrix;
        }
    }

    pub fn save_count(&self) -> usize {
        self.saved.len()
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.matrix = self.matrix * Affine2::from_translation(Vec2::new(dx, dy));
    }

    /// Rotate clockwise (y-down) by `degrees` about (px, py)
    pub fn rotate(&mut self, degrees: f32, px: f32, py: f32) {
        let pivot = Vec2::new(px, py);
        self.matrix = self.matrix
            * Affine2::from_translation(pivot)
            * Affine2::from_angle(degrees.to_radians())
            * Affine2::from_translation(-pivot);
    }

    /// Fill the whole canvas, ignoring transform
    pub fn draw_color(&mut self, color: Color) {
        self.pixels.fill(color.to_array());
    }

    /// Fill rect under the current transform
    pub fn draw_rect(&mut self, left: f32, top: f32, right: f32, bottom: f32, paint: &Paint) {
        let w = right - left;
        let h = bottom - top;
        if w <= 0.0 || h <= 0.0 {
            return;
        }

        let c = paint.color;
        let src = [c.r as f32, c.g as f32, c.b as f32, c.a as f32];
        let m = self.matrix * Affine2::from_translation(Vec2::new(left, top));
        self.rasterize(m, w, h, |_| src, paint.anti_alias);
    }

    /// Draw bitmap with its top-left at (left, top) in local coordinates
    pub fn draw_bitmap(&mut self, bitmap: &Bitmap, left: f32, top: f32, paint: &Paint) {
        if bitmap.is_empty() {
            return;
        }

        let filter = paint.filter_bitmap && paint.anti_alias;
        let alpha_mod = paint.color.a as f32 / 255.0;
        let m = self.matrix * Affine2::from_translation(Vec2::new(left, top));
        let (w, h) = (bitmap.width() as f32, bitmap.height() as f32);

        self.rasterize(
            m,
            w,
            h,
            |local| {
                let mut c = bitmap.sample(local.x, local.y, filter);
                c[3] *= alpha_mod;
                c
            },
            paint.anti_alias,
        );
    }

    /// Visit device pixels covered by the local rect (0, 0)-(w, h) mapped through `m`
    fn rasterize(
        &mut self,
        m: Affine2,
        w: f32,
        h: f32,
        mut shade: impl FnMut(Vec2) -> [f32; 4],
        anti_alias: bool,
    ) {
        if self.width == 0 || self.height == 0 {
            return;
        }

        let corners = [
            m.transform_point2(Vec2::ZERO),
            m.transform_point2(Vec2::new(w, 0.0)),
            m.transform_point2(Vec2::new(0.0, h)),
            m.transform_point2(Vec2::new(w, h)),
        ];
        let min = corners.iter().fold(Vec2::splat(f32::INFINITY), |acc, p| acc.min(*p));
        let max = corners.iter().fold(Vec2::splat(f32::NEG_INFINITY), |acc, p| acc.max(*p));

        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(self.width);
        let y1 = (max.y.ceil().max(0.0) as u32).min(self.height);

        let inverse = m.inverse();

        for y in y0..y1 {
            for x in x0..x1 {
                let local = inverse.transform_point2(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                if local.x < 0.0 || local.y < 0.0 || local.x >= w || local.y >= h {
                    continue;
                }

                let mut src = shade(local);
                if !anti_alias {
                    // Low-bit output: no partial coverage
                    src[3] = if src[3] >= 127.5 { 255.0 } else { 0.0 };
                }
                self.blend(x, y, src);
            }
        }
    }

    /// Source-over blend of a straight-alpha colour
    fn blend(&mut self, x: u32, y: u32, src: [f32; 4]) {
        let sa = (src[3] / 255.0).clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }

        let idx = (y * self.width + x) as usize;
        let dst = self.pixels[idx];
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);

        let mut out = [0u8; 4];
        for i in 0..3 {
            let c = (src[i] * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
            out[i] = c.round().clamp(0.0, 255.0) as u8;
        }
        out[3] = (out_a * 255.0).round() as u8;

        self.pixels[idx] = out;
    }
}
