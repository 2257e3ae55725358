use std::path::Path;

use anyhow::{Context, Result};

use super::bitmap::Bitmap;
use super::color::Color;

/// File names looked up inside an assets directory
pub const BACKGROUND_FILE: &str = "background.png";
pub const FIGURE_FILE: &str = "figure.png";
pub const HOUR_HAND_FILE: &str = "hour.png";
pub const MINUTE_HAND_FILE: &str = "minute.png";

/// The four rasters a face is composed from.
///
/// Hand images follow the full-face convention: each is as large as the face
/// and the hand's pivot is the bottom-centre of the image.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceAssets {
    pub background: Bitmap,
    pub figure: Bitmap,
    pub hour_hand: Bitmap,
    pub minute_hand: Bitmap,
}

impl FaceAssets {
    /// Decode all four PNGs from `dir`. Any missing or undecodable file is an error.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        log::info!("loading face assets from {}", dir.display());

        Ok(Self {
            background: load_bitmap(&dir.join(BACKGROUND_FILE))?,
            figure: load_bitmap(&dir.join(FIGURE_FILE))?,
            hour_hand: load_bitmap(&dir.join(HOUR_HAND_FILE))?,
            minute_hand: load_bitmap(&dir.join(MINUTE_HAND_FILE))?,
        })
    }

    /// Built-in assets drawn at `size` x `size`
    pub fn procedural(size: u32, dial: Color, hand: Color) -> Self {
        let size = size.max(1);
        Self {
            background: dial_bitmap(size, dial, hand),
            figure: badge_bitmap(size, hand),
            hour_hand: hand_bitmap(size, 0.035, 0.28, hand),
            minute_hand: hand_bitmap(size, 0.025, 0.42, hand),
        }
    }

    /// Every asset resampled to the given dimensions
    pub fn scaled(&self, width: u32, height: u32, filter: bool) -> Self {
        Self {
            background: self.background.scaled(width, height, filter),
            figure: self.figure.scaled(width, height, filter),
            hour_hand: self.hour_hand.scaled(width, height, filter),
            minute_hand: self.minute_hand.scaled(width, height, filter),
        }
    }
}

fn load_bitmap(path: &Path) -> Result<Bitmap> {
    let image = image::open(path)
        .with_context(|| format!("failed to load face asset {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();

    Bitmap::from_rgba(width, height, image.as_raw())
        .with_context(|| format!("unexpected pixel layout in {}", path.display()))
}

/// Dial with twelve hour markers
fn dial_bitmap(size: u32, dial: Color, marker: Color) -> Bitmap {
    let c = size as f32 / 2.0;
    let radius = c * 0.96;

    Bitmap::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - c;
        let dy = y as f32 + 0.5 - c;
        let r = (dx * dx + dy * dy).sqrt();
        if r > radius {
            return Color::TRANSPARENT;
        }

        // Angle from twelve o'clock, clockwise
        let deg = dx.atan2(-dy).to_degrees().rem_euclid(360.0);
        let nearest = (deg / 30.0).round() * 30.0;
        let arc = (deg - nearest).abs().to_radians() * r;

        if r > radius * 0.85 && arc < size as f32 * 0.008 {
            marker
        } else {
            dial
        }
    })
}

/// Small disc near the top-left of the image, which hangs from the face centre
fn badge_bitmap(size: u32, color: Color) -> Bitmap {
    let c = size as f32 * 0.18;
    let radius = size as f32 * 0.06;

    Bitmap::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - c;
        let dy = y as f32 + 0.5 - c;
        if dx * dx + dy * dy <= radius * radius {
            color
        } else {
            Color::TRANSPARENT
        }
    })
}

/// Vertical bar rising from the bottom-centre
fn hand_bitmap(size: u32, width_ratio: f32, length_ratio: f32, color: Color) -> Bitmap {
    let half_width = (size as f32 * width_ratio / 2.0).max(0.5);
    let length = size as f32 * length_ratio;
    let c = size as f32 / 2.0;

    Bitmap::from_fn(size, size, |x, y| {
        let dx = (x as f32 + 0.5 - c).abs();
        let rise = size as f32 - (y as f32 + 0.5);
        if dx <= half_width && rise <= length {
            color
        } else {
            Color::TRANSPARENT
        }
    })
}

/// Assets rescaled for one target size, recomputed only when the size changes
#[derive(Debug, Default)]
pub struct ScaledAssetCache {
    entry: Option<((u32, u32), FaceAssets)>,
    rescale_count: u64,
}

impl ScaledAssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assets at `width` x `height`, rescaling from `source` on a size miss
    pub fn get(&mut self, source: &FaceAssets, width: u32, height: u32) -> &FaceAssets {
        let hit = matches!(&self.entry, Some((size, _)) if *size == (width, height));
        if !hit {
            log::debug!("rescaling face assets to {}x{}", width, height);
            self.rescale_count += 1;
            self.entry = None;
        }

        let (_, assets) = self
            .entry
            .get_or_insert_with(|| ((width, height), source.scaled(width, height, false)));
        assets
    }

    /// Number of rescales performed
    pub fn rescale_count(&self) -> u64 {
        self.rescale_count
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
