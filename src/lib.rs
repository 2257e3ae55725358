pub mod broadcast;
pub mod cli;
pub mod config;
pub mod core;
pub mod face;
pub mod logging;
pub mod snapshot;
pub mod window;

pub use config::{FaceConfig, WatchFaceStyle};
pub use face::{DeviceProperties, FaceServices, WatchFaceEngine};
