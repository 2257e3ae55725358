// config.rs - JSON face configuration
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{Color, FaceAssets, Offsets, TimeZoneId};

/// How far notification cards peek over the face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeekMode {
    Short,
    Variable,
    None,
}

/// When the host draws a background behind peeking cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundVisibility {
    Interruptive,
    Persistent,
}

/// Display style handed to the host once, at engine creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchFaceStyle {
    pub peek_mode: PeekMode,
    pub background_visibility: BackgroundVisibility,
    /// Let the host draw its own clock over the face
    pub show_system_ui_time: bool,
}

impl Default for WatchFaceStyle {
    fn default() -> Self {
        Self {
            peek_mode: PeekMode::Short,
            background_visibility: BackgroundVisibility::Interruptive,
            show_system_ui_time: false,
        }
    }
}

/// Hand bias in reference pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandLayout {
    pub x_offset: f32,
    pub y_offset: f32,
}

/// Figure offset from the face centre in reference pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureLayout {
    pub x_offset: f32,
    pub y_offset: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// Directory with background.png, figure.png, hour.png, minute.png.
    /// None selects the built-in assets.
    pub assets_dir: Option<PathBuf>,
    pub background_color: Color,
    /// Dial colour of the built-in assets
    pub dial_color: Color,
    /// Hand colour of the built-in assets
    pub hand_color: Color,
    /// Design size the layout offsets are expressed in
    pub reference_size: u32,
    pub hands: HandLayout,
    pub figure: FigureLayout,
    pub style: WatchFaceStyle,
    pub interactive_update_rate_ms: u64,
    /// Request the next frame straight after each interactive draw
    pub continuous_redraw: bool,
    /// Initial zone id: local, UTC or an offset like +02:00
    pub time_zone: Option<String>,
    pub log_filter: Option<String>,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            assets_dir: None,
            background_color: Color::BLACK,
            dial_color: Color::rgb(0x22, 0x26, 0x2E),
            hand_color: Color::rgb(0xEE, 0xEE, 0xEE),
            reference_size: 320,
            hands: HandLayout::default(),
            figure: FigureLayout::default(),
            style: WatchFaceStyle::default(),
            interactive_update_rate_ms: 1_000,
            continuous_redraw: true,
            time_zone: None,
            log_filter: None,
        }
    }
}

impl FaceConfig {
    /// Read configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Layout offsets for geometry
    pub fn offsets(&self) -> Offsets {
        Offsets {
            hand_x: self.hands.x_offset,
            hand_y: self.hands.y_offset,
            figure_x: self.figure.x_offset,
            figure_y: self.figure.y_offset,
        }
    }

    /// Initial zone, falling back to local for unknown ids
    pub fn zone(&self) -> TimeZoneId {
        self.time_zone
            .as_deref()
            .map(TimeZoneId::parse_or_local)
            .unwrap_or_default()
    }

    /// Load configured assets, or build the built-in set
    pub fn load_assets(&self) -> Result<FaceAssets> {
        match &self.assets_dir {
            Some(dir) => FaceAssets::load_dir(dir),
            None => {
                log::info!("using built-in face assets");
                Ok(FaceAssets::procedural(self.reference_size, self.dial_color, self.hand_color))
            }
        }
    }
}
