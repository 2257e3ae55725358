/// Surface dimensions and the scaled hand/figure offsets derived from them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    pub center_x: f32,
    pub center_y: f32,
    /// Surface width over the design reference size
    pub scale: f32,
    /// Horizontal bias applied to both hands
    pub hand_x_offset: f32,
    /// Vertical bias applied to both hands
    pub hand_y_offset: f32,
    pub figure_x_offset: f32,
    pub figure_y_offset: f32,
}

/// Offsets in reference-size pixels, before scaling
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offsets {
    pub hand_x: f32,
    pub hand_y: f32,
    pub figure_x: f32,
    pub figure_y: f32,
}

impl DisplayGeometry {
    /// Derive geometry for a surface, scaling offsets by `width / reference_size`
    pub fn new(width: u32, height: u32, reference_size: u32, offsets: Offsets) -> Self {
        let scale = if reference_size == 0 {
            1.0
        } else {
            width as f32 / reference_size as f32
        };

        Self {
            width,
            height,
            center_x: width as f32 / 2.0,
            center_y: height as f32 / 2.0,
            scale,
            hand_x_offset: offsets.hand_x * scale,
            hand_y_offset: offsets.hand_y * scale,
            figure_x_offset: offsets.figure_x * scale,
            figure_y_offset: offsets.figure_y * scale,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Top-left for a hand bitmap whose bottom-centre sits on the face centre
    pub fn hand_origin(&self, hand_width: u32, hand_height: u32) -> (f32, f32) {
        (
            self.center_x - hand_width as f32 / 2.0 - self.hand_x_offset,
            self.center_y - hand_height as f32 - self.hand_y_offset,
        )
    }

    /// Top-left for the figure bitmap: the face centre plus the figure offset
    pub fn figure_origin(&self) -> (f32, f32) {
        (
            self.center_x + self.figure_x_offset,
            self.center_y + self.figure_y_offset,
        )
    }
}
