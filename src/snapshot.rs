//! Headless single-frame rendering

use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};

use crate::broadcast::LocalOffsetMonitor;
use crate::cli::TimeOfDay;
use crate::config::FaceConfig;
use crate::core::{FaceAssets, Frame, HeadlessWindow, Looper, ManualClock, SystemClock, TimeSource};
use crate::face::{FaceServices, WatchFaceEngine};

/// Render one `size` x `size` frame, at `at` if given or else at the current time
pub fn render_snapshot(
    config: &FaceConfig,
    assets: FaceAssets,
    size: u32,
    at: Option<TimeOfDay>,
) -> Result<Frame> {
    let mut config = config.clone();
    let clock: Rc<dyn TimeSource> = match at {
        Some(t) => {
            // Fixed reading: pin the zone so the hands show exactly `at`
            config.time_zone = Some("UTC".into());
            let time = NaiveTime::from_hms_opt(t.hour, t.minute, 0).context("invalid time of day")?;
            let instant = NaiveDate::from_ymd_opt(2015, 1, 1)
                .context("invalid snapshot date")?
                .and_time(time)
                .and_utc();
            Rc::new(ManualClock::at(instant))
        }
        None => Rc::new(SystemClock),
    };

    let services = FaceServices {
        looper: Looper::new(clock),
        window: Rc::new(HeadlessWindow::new(size, size)),
        broadcaster: Rc::new(LocalOffsetMonitor::new()),
    };

    let engine = WatchFaceEngine::create(&config, assets, services);
    let mut engine = engine.borrow_mut();
    engine.on_surface_changed(size, size);
    let frame = engine
        .on_draw(size, size)
        .with_context(|| format!("nothing drawn for a {}x{} surface", size, size))?;
    engine.on_destroy();

    log::info!("rendered snapshot at {}", frame.reading);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClockReading;

    #[test]
    fn snapshot_uses_fixed_time() {
        let config = FaceConfig {
            reference_size: 32,
            time_zone: Some("+05:00".into()),
            ..FaceConfig::default()
        };
        let assets = config.load_assets().unwrap();

        let at = TimeOfDay { hour: 6, minute: 30 };
        let frame = render_snapshot(&config, assets, 32, Some(at)).unwrap();
        assert_eq!(frame.reading, ClockReading::new(6, 30, 0));
        assert_eq!((frame.width, frame.height), (32, 32));
    }

    #[test]
    fn zero_size_is_an_error() {
        let config = FaceConfig::default();
        let assets = FaceAssets::procedural(8, config.dial_color, config.hand_color);
        assert!(render_snapshot(&config, assets, 0, None).is_err());
    }
}
