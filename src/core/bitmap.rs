use super::color::Color;

/// Immutable RGBA raster image
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    /// Row-major straight-alpha RGBA pixels
    pixels: Vec<[u8; 4]>,
}

impl Bitmap {
    /// Create bitmap filled with one colour
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color.to_array(); (width * height) as usize],
        }
    }

    /// Wrap raw RGBA bytes, returns None when the length does not match
    pub fn from_rgba(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }

        let pixels = bytemuck::cast_slice::<u8, [u8; 4]>(bytes).to_vec();
        Some(Self { width, height, pixels })
    }

    /// Build bitmap by evaluating `f(x, y)` for every pixel
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Color) -> Self {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y).to_array());
            }
        }
        Self { width, height, pixels }
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

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw RGBA bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Sample with texel centres at half-integer coordinates.
    /// Coordinates outside the image read as transparent.
    pub fn sample(&self, u: f32, v: f32, filter: bool) -> [f32; 4] {
        let inside = u >= 0.0 && v >= 0.0 && u < self.width as f32 && v < self.height as f32;
        if self.is_empty() || !inside {
            return [0.0; 4];
        }

        if !filter {
            return self.texel(u as i64, v as i64);
        }

        let x = u - 0.5;
        let y = v - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        let mut out = [0.0; 4];
        for i in 0..4 {
            let top = c00[i] + (c10[i] - c00[i]) * fx;
            let bottom = c01[i] + (c11[i] - c01[i]) * fx;
            out[i] = top + (bottom - top) * fy;
        }
        out
    }

    /// Edge-clamped texel lookup
    fn texel(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        let p = self.pixels[(y * self.width + x) as usize];
        [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
    }

    /// Resample to new dimensions
    pub fn scaled(&self, width: u32, height: u32, filter: bool) -> Bitmap {
        if (width, height) == self.dimensions() {
            return self.clone();
        }
        if self.is_empty() {
            return Bitmap::filled(width, height, Color::TRANSPARENT);
        }

        let sx = self.width as f32 / width as f32;
        let sy = self.height as f32 / height as f32;

        Bitmap::from_fn(width, height, |x, y| {
            let c = self.sample((x as f32 + 0.5) * sx, (y as f32 + 0.5) * sy, filter);
            Color::rgba(
                c[0].round() as u8,
                c[1].round() as u8,
                c[2].round() as u8,
                c[3].round() as u8,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_checks_length() {
        assert!(Bitmap::from_rgba(2, 2, &[0; 16]).is_some());
        assert!(Bitmap::from_rgba(2, 2, &[0; 15]).is_none());
    }

    #[test]
    fn sample_outside_is_transparent() {
        let bmp = Bitmap::filled(4, 4, Color::WHITE);
        assert_eq!(bmp.sample(-0.1, 1.0, true), [0.0; 4]);
        assert_eq!(bmp.sample(4.0, 1.0, false), [0.0; 4]);
        assert_eq!(bmp.sample(2.0, 2.0, false), [255.0; 4]);
    }

    #[test]
    fn scaled_nearest_keeps_blocks() {
        let bmp = Bitmap::from_fn(2, 1, |x, _| if x == 0 { Color::BLACK } else { Color::WHITE });
        let big = bmp.scaled(4, 2, false);
        assert_eq!(big.dimensions(), (4, 2));
        assert_eq!(big.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(big.pixel(1, 1), Some([0, 0, 0, 255]));
        assert_eq!(big.pixel(2, 0), Some([255, 255, 255, 255]));
        assert_eq!(big.pixel(3, 1), Some([255, 255, 255, 255]));
    }

    #[test]
    fn scaled_same_size_is_identity() {
        let bmp = Bitmap::from_fn(3, 3, |x, y| Color::rgb(x as u8, y as u8, 0));
        assert_eq!(bmp.scaled(3, 3, true), bmp);
    }
}
