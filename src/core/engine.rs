use super::assets::{FaceAssets, ScaledAssetCache};
use super::canvas::{Canvas, Paint};
use super::clock::ClockReading;
use super::color::Color;
use super::frame::Frame;
use super::geometry::{DisplayGeometry, Offsets};

/// Composes a face frame from the four assets and a clock reading
pub struct RenderEngine {
    assets: FaceAssets,
    cache: ScaledAssetCache,
    geometry: Option<DisplayGeometry>,
    reference_size: u32,
    offsets: Offsets,
    background_paint: Paint,
    filter_paint: Paint,
    hand_paint: Paint,
    frames_drawn: u64,
}

impl RenderEngine {
    pub fn new(
        assets: FaceAssets,
        background: Color,
        reference_size: u32,
        offsets: Offsets,
    ) -> Self {
        Self {
            assets,
            cache: ScaledAssetCache::new(),
            geometry: None,
            reference_size,
            offsets,
            background_paint: Paint::fill(background),
            filter_paint: Paint::filtered(),
            hand_paint: Paint::filtered(),
            frames_drawn: 0,
        }
    }

    /// Recompute geometry for a surface size
    pub fn set_surface_size(&mut self, width: u32, height: u32) -> DisplayGeometry {
        let geometry = DisplayGeometry::new(width, height, self.reference_size, self.offsets);
        self.geometry = Some(geometry);
        geometry
    }

    pub fn geometry(&self) -> Option<DisplayGeometry> {
        self.geometry
    }

    /// Toggle anti-aliasing on hand draws
    pub fn set_hand_anti_alias(&mut self, anti_alias: bool) {
        self.hand_paint.anti_alias = anti_alias;
    }

    pub fn hand_paint(&self) -> &Paint {
        &self.hand_paint
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Number of times the assets were resampled
    pub fn rescale_count(&self) -> u64 {
        self.cache.rescale_count()
    }

    /// Compose one frame. Returns None for a zero-sized surface.
    pub fn draw(&mut self, width: u32, height: u32, reading: ClockReading) -> Option<Frame> {
        if width == 0 || height == 0 {
            log::debug!("skipping draw on empty {}x{} surface", width, height);
            return None;
        }

        let geometry = match self.geometry {
            Some(g) if (g.width, g.height) == (width, height) => g,
            _ => self.set_surface_size(width, height),
        };
        let assets = self.cache.get(&self.assets, width, height);
        let mut canvas = Canvas::new(width, height);

        // Background
        canvas.draw_rect(0.0, 0.0, width as f32, height as f32, &self.background_paint);
        canvas.draw_bitmap(&assets.background, 0.0, 0.0, &self.filter_paint);

        let minute_deg = reading.minute_angle();
        let hour_deg = reading.hour_angle();
        let (cx, cy) = (geometry.center_x, geometry.center_y);

        canvas.save();

        canvas.rotate(minute_deg, cx, cy);
        let (x, y) = geometry.hand_origin(assets.minute_hand.width(), assets.minute_hand.height());
        canvas.draw_bitmap(&assets.minute_hand, x, y, &self.hand_paint);

        // Back to zero, then on to the hour angle
        canvas.rotate(360.0 - minute_deg + hour_deg, cx, cy);
        let (x, y) = geometry.hand_origin(assets.hour_hand.width(), assets.hour_hand.height());
        canvas.draw_bitmap(&assets.hour_hand, x, y, &self.hand_paint);

        canvas.restore();

        // Figure last so the hands never cover it
        let (x, y) = geometry.figure_origin();
        canvas.draw_bitmap(&assets.figure, x, y, &self.filter_paint);

        let frame = Frame::new(self.frames_drawn, reading, canvas);
        self.frames_drawn += 1;
        Some(frame)
    }
}
