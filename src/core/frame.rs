use std::path::Path;

use anyhow::{Context, Result};

use super::canvas::Canvas;
use super::clock::ClockReading;

/// One composed face frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub number: u64,
    pub width: u32,
    pub height: u32,
    /// Clock reading the hands were drawn for
    pub reading: ClockReading,
    /// RGBA pixel data
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(number: u64, reading: ClockReading, canvas: Canvas) -> Self {
        let (width, height) = canvas.dimensions();
        Self {
            number,
            width,
            height,
            reading,
            pixels: canvas.into_pixels(),
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(out)
    }

    /// Write the frame as a PNG
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let image = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .context("frame buffer does not match its dimensions")?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}
