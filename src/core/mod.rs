//! Host-independent face engine: rasters, canvas, time, scheduling and presentation

pub mod assets;
pub mod bitmap;
pub mod canvas;
pub mod clock;
pub mod color;
pub mod engine;
pub mod frame;
pub mod geometry;
pub mod gpu_context;
pub mod looper;
pub mod surface_renderer;
pub mod timer;
pub mod window;
pub mod zone;

pub use assets::{FaceAssets, ScaledAssetCache};
pub use bitmap::Bitmap;
pub use canvas::{Canvas, Paint};
pub use clock::{
    hour_angle, minute_angle, ClockError, ClockReading, ManualClock, SystemClock, TimeSource,
    WallClock,
};
pub use color::Color;
pub use engine::RenderEngine;
pub use frame::Frame;
pub use geometry::{DisplayGeometry, Offsets};
pub use looper::{HandleMessage, Handler, Looper};
pub use timer::{delay_to_next_boundary, next_boundary, TimerState, UpdateTimer, MSG_UPDATE_TIME};
pub use window::{HeadlessWindow, WindowContext, WindowDimensions};
pub use zone::TimeZoneId;
