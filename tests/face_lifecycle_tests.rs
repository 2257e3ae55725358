use std::cell::RefCell;
use std::rc::Rc;

use chrono::{FixedOffset, TimeZone, Utc};
use jean_clock::broadcast::LocalOffsetMonitor;
use jean_clock::core::{
    ClockReading, HeadlessWindow, Looper, ManualClock, TimeZoneId, TimerState, WindowContext,
};
use jean_clock::{DeviceProperties, FaceConfig, FaceServices, WatchFaceEngine};

const SIZE: u32 = 64;

/// Engine wired to a manual clock, a headless window and a fixed-offset broadcaster
struct Harness {
    clock: Rc<ManualClock>,
    looper: Rc<Looper>,
    window: Rc<HeadlessWindow>,
    monitor: Rc<LocalOffsetMonitor>,
    engine: Rc<RefCell<WatchFaceEngine>>,
}

impl Harness {
    /// 2015-01-01 03:00:00.250 UTC
    fn new() -> Self {
        let start = Utc.with_ymd_and_hms(2015, 1, 1, 3, 0, 0).unwrap().timestamp_millis() + 250;
        let clock = Rc::new(ManualClock::new(start));
        let looper = Looper::new(clock.clone());
        let window = Rc::new(HeadlessWindow::new(SIZE, SIZE));
        let monitor = Rc::new(LocalOffsetMonitor::with_source(Box::new(|| {
            FixedOffset::east_opt(0).unwrap()
        })));

        let config = FaceConfig {
            reference_size: SIZE,
            time_zone: Some("UTC".into()),
            ..FaceConfig::default()
        };
        let assets = config.load_assets().unwrap();
        let services = FaceServices {
            looper: looper.clone(),
            window: window.clone(),
            broadcaster: monitor.clone(),
        };
        let engine = WatchFaceEngine::create(&config, assets, services);
        engine.borrow_mut().on_surface_changed(SIZE, SIZE);

        Self {
            clock,
            looper,
            window,
            monitor,
            engine,
        }
    }

    fn now(&self) -> i64 {
        self.looper.now_millis().unwrap()
    }

    /// Advance the clock and deliver whatever became due
    fn run_for(&self, millis: i64) -> usize {
        self.clock.advance(millis);
        self.looper.dispatch_due(self.now())
    }

    fn timer_state(&self) -> TimerState {
        self.engine.borrow().timer_state()
    }
}

#[cfg(test)]
mod timer_tests {
    use super::*;

    #[test]
    fn test_timer_starts_stopped() {
        let h = Harness::new();
        assert_eq!(h.timer_state(), TimerState::Stopped);
        assert!(h.looper.is_empty());
    }

    #[test]
    fn test_visible_starts_immediate_tick() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);

        assert_eq!(h.timer_state(), TimerState::Running);
        assert_eq!(h.looper.next_deadline(), Some(h.now()));
    }

    #[test]
    fn test_ticks_land_on_second_boundaries() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        let start = h.now();

        assert_eq!(h.looper.dispatch_due(start), 1);
        // 250ms into the second: next tick 750ms out
        assert_eq!(h.looper.next_deadline(), Some(start + 750));

        assert_eq!(h.run_for(750), 1);
        assert_eq!(h.looper.next_deadline(), Some(start + 1750));

        // Late delivery still re-aligns to the following boundary
        assert_eq!(h.run_for(1100), 1);
        assert_eq!(h.looper.next_deadline(), Some(start + 2750));
        assert_eq!(h.looper.len(), 1);
    }

    #[test]
    fn test_each_tick_invalidates() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        let before = h.window.redraw_requests();

        h.looper.dispatch_due(h.now());
        h.run_for(750);

        assert_eq!(h.window.redraw_requests(), before + 2);
    }

    #[test]
    fn test_ambient_stops_ticks() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        h.engine.borrow_mut().on_ambient_mode_changed(true);

        assert_eq!(h.timer_state(), TimerState::Stopped);
        assert!(h.looper.is_empty());
        assert_eq!(h.run_for(5_000), 0);
    }

    #[test]
    fn test_leaving_ambient_resumes_ticks() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        h.engine.borrow_mut().on_ambient_mode_changed(true);
        h.engine.borrow_mut().on_ambient_mode_changed(false);

        assert_eq!(h.timer_state(), TimerState::Running);
        assert_eq!(h.looper.len(), 1);
        assert_eq!(h.looper.dispatch_due(h.now()), 1);
    }

    #[test]
    fn test_hidden_stops_ticks() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        h.looper.dispatch_due(h.now());
        h.engine.borrow_mut().on_visibility_changed(false);

        assert_eq!(h.timer_state(), TimerState::Stopped);
        assert!(h.looper.is_empty());
    }

    #[test]
    fn test_repeated_updates_keep_one_pending_tick() {
        let h = Harness::new();
        for _ in 0..3 {
            h.engine.borrow_mut().on_visibility_changed(true);
            h.engine.borrow_mut().on_ambient_mode_changed(false);
        }
        assert_eq!(h.looper.len(), 1);
    }

    #[test]
    fn test_tick_due_while_entering_ambient_stops() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        h.looper.dispatch_due(h.now());
        h.engine.borrow_mut().on_ambient_mode_changed(true);

        assert_eq!(h.run_for(1_000), 0);
        assert_eq!(h.timer_state(), TimerState::Stopped);
    }

    #[test]
    fn test_clock_failure_falls_back_to_full_period() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        let start = h.now();

        h.clock.set_failing(true);
        assert_eq!(h.looper.dispatch_due(start), 1);
        assert_eq!(h.timer_state(), TimerState::Running);
        assert_eq!(h.looper.next_deadline(), Some(start + 1000));
    }

    #[test]
    fn test_busy_engine_requeues_tick() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        let start = h.now();

        // A live borrow makes the engine unavailable to the handler
        let busy = h.engine.borrow();
        assert_eq!(h.looper.dispatch_due(start), 1);
        drop(busy);

        assert_eq!(h.looper.len(), 1);
        assert_eq!(h.looper.next_deadline(), Some(start + 1000));
        assert_eq!(h.timer_state(), TimerState::Running);

        // Retried tick goes through and re-aligns
        assert_eq!(h.run_for(1000), 1);
        assert_eq!(h.looper.next_deadline(), Some(start + 1750));
    }

    #[test]
    fn test_stale_tick_after_drop_is_noop() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        let requests = h.window.redraw_requests();

        let Harness {
            looper,
            window,
            engine,
            ..
        } = h;
        drop(engine);

        // Queued tick outlives the engine and must do nothing
        assert_eq!(looper.dispatch_due(i64::MAX), 1);
        assert_eq!(window.redraw_requests(), requests);
        assert!(looper.is_empty());
    }

    #[test]
    fn test_destroy_stops_everything() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        h.engine.borrow_mut().on_destroy();

        assert_eq!(h.timer_state(), TimerState::Stopped);
        assert!(h.looper.is_empty());
        assert_eq!(h.monitor.receiver_count(), 0);
        assert!(h.engine.borrow_mut().on_draw(SIZE, SIZE).is_none());
    }
}

#[cfg(test)]
mod time_zone_tests {
    use super::*;

    #[test]
    fn test_receiver_registered_once_while_visible() {
        let h = Harness::new();
        assert_eq!(h.monitor.receiver_count(), 0);

        h.engine.borrow_mut().on_visibility_changed(true);
        h.engine.borrow_mut().on_visibility_changed(true);
        assert_eq!(h.monitor.receiver_count(), 1);
        assert!(h.engine.borrow().is_zone_receiver_registered());
    }

    #[test]
    fn test_receiver_removed_when_hidden() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        h.engine.borrow_mut().on_visibility_changed(false);
        h.engine.borrow_mut().on_visibility_changed(false);

        assert_eq!(h.monitor.receiver_count(), 0);
        assert!(!h.engine.borrow().is_zone_receiver_registered());
    }

    #[test]
    fn test_zone_change_updates_reading() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        assert_eq!(h.engine.borrow().wall_clock().reading(), ClockReading::new(3, 0, 0));

        let before = h.window.redraw_requests();
        assert_eq!(h.monitor.broadcast("+05:00"), 1);

        let engine = h.engine.borrow();
        assert_eq!(
            engine.wall_clock().zone(),
            TimeZoneId::Fixed(FixedOffset::east_opt(5 * 3600).unwrap())
        );
        assert_eq!(engine.wall_clock().reading(), ClockReading::new(8, 0, 0));
        assert_eq!(h.window.redraw_requests(), before + 1);
    }

    #[test]
    fn test_hidden_face_misses_broadcast_and_resets_on_show() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        h.monitor.broadcast("+05:00");
        h.engine.borrow_mut().on_visibility_changed(false);

        assert_eq!(h.monitor.broadcast("+09:00"), 0);

        // Showing again re-reads in the configured zone
        h.engine.borrow_mut().on_visibility_changed(true);
        assert_eq!(h.engine.borrow().wall_clock().zone(), TimeZoneId::Utc);
        assert_eq!(h.engine.borrow().wall_clock().reading(), ClockReading::new(3, 0, 0));
    }
}

#[cfg(test)]
mod draw_tests {
    use super::*;

    #[test]
    fn test_zero_size_draw_is_noop() {
        let h = Harness::new();
        let mut engine = h.engine.borrow_mut();
        assert!(engine.on_draw(0, 0).is_none());
        assert!(engine.on_draw(SIZE, 0).is_none());
        assert_eq!(engine.render_engine().frames_drawn(), 0);
    }

    #[test]
    fn test_draw_reads_current_time() {
        let h = Harness::new();
        h.clock.advance(6 * 60 * 60 * 1000 + 30 * 60 * 1000);

        let frame = h.engine.borrow_mut().on_draw(SIZE, SIZE).unwrap();
        assert_eq!(frame.reading, ClockReading::new(9, 30, 0));
        assert_eq!(frame.pixels().len(), (SIZE * SIZE * 4) as usize);
    }

    #[test]
    fn test_draw_reuses_reading_when_clock_fails() {
        let h = Harness::new();
        h.engine.borrow_mut().on_draw(SIZE, SIZE).unwrap();

        h.clock.advance(60 * 60 * 1000);
        h.clock.set_failing(true);
        let frame = h.engine.borrow_mut().on_draw(SIZE, SIZE).unwrap();
        assert_eq!(frame.reading, ClockReading::new(3, 0, 0));
    }

    #[test]
    fn test_show_with_failing_clock_keeps_last_reading() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        h.engine.borrow_mut().on_draw(SIZE, SIZE).unwrap();

        h.clock.set_failing(true);
        h.engine.borrow_mut().on_visibility_changed(false);
        h.engine.borrow_mut().on_visibility_changed(true);

        let frame = h.engine.borrow_mut().on_draw(SIZE, SIZE).unwrap();
        assert_eq!(frame.reading, ClockReading::new(3, 0, 0));
    }

    #[test]
    fn test_zone_change_with_failing_clock_keeps_last_reading() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);
        h.engine.borrow_mut().on_draw(SIZE, SIZE).unwrap();

        h.clock.set_failing(true);
        assert_eq!(h.monitor.broadcast("+05:00"), 1);

        let frame = h.engine.borrow_mut().on_draw(SIZE, SIZE).unwrap();
        assert_eq!(frame.reading, ClockReading::new(3, 0, 0));

        // Zone switch shows up on the next good read
        h.clock.set_failing(false);
        let frame = h.engine.borrow_mut().on_draw(SIZE, SIZE).unwrap();
        assert_eq!(frame.reading, ClockReading::new(8, 0, 0));
    }

    #[test]
    fn test_interactive_draw_requests_next_frame() {
        let h = Harness::new();
        h.engine.borrow_mut().on_visibility_changed(true);

        let before = h.window.redraw_requests();
        h.engine.borrow_mut().on_draw(SIZE, SIZE);
        assert_eq!(h.window.redraw_requests(), before + 1);

        h.engine.borrow_mut().on_ambient_mode_changed(true);
        let before = h.window.redraw_requests();
        h.engine.borrow_mut().on_draw(SIZE, SIZE);
        assert_eq!(h.window.redraw_requests(), before);
    }

    #[test]
    fn test_time_tick_invalidates() {
        let h = Harness::new();
        let before = h.window.redraw_requests();
        h.engine.borrow_mut().on_time_tick();
        assert_eq!(h.window.redraw_requests(), before + 1);
    }

    #[test]
    fn test_headless_window_dimensions_follow_resize() {
        let h = Harness::new();
        h.window.resize(32, 48);
        let dims = h.window.dimensions();
        assert_eq!((dims.width, dims.height), (32, 48));

        h.engine.borrow_mut().on_surface_changed(dims.width, dims.height);
        let geometry = h.engine.borrow().render_engine().geometry().unwrap();
        assert_eq!((geometry.center_x, geometry.center_y), (16.0, 24.0));
        assert_eq!(geometry.scale, 0.5);
    }
}

#[cfg(test)]
mod ambient_tests {
    use super::*;

    #[test]
    fn test_low_bit_ambient_disables_hand_anti_alias() {
        let h = Harness::new();
        h.engine.borrow_mut().on_properties_changed(DeviceProperties { low_bit_ambient: true });
        assert!(h.engine.borrow().render_engine().hand_paint().anti_alias);

        h.engine.borrow_mut().on_ambient_mode_changed(true);
        assert!(!h.engine.borrow().render_engine().hand_paint().anti_alias);

        h.engine.borrow_mut().on_ambient_mode_changed(false);
        assert!(h.engine.borrow().render_engine().hand_paint().anti_alias);
    }

    #[test]
    fn test_full_colour_ambient_keeps_anti_alias() {
        let h = Harness::new();
        h.engine.borrow_mut().on_properties_changed(DeviceProperties { low_bit_ambient: false });
        h.engine.borrow_mut().on_ambient_mode_changed(true);

        let engine = h.engine.borrow();
        assert!(engine.is_in_ambient_mode());
        assert!(!engine.is_low_bit_ambient());
        assert!(engine.render_engine().hand_paint().anti_alias);
    }

    #[test]
    fn test_properties_reported_while_ambient() {
        let h = Harness::new();
        h.engine.borrow_mut().on_ambient_mode_changed(true);
        h.engine.borrow_mut().on_properties_changed(DeviceProperties { low_bit_ambient: true });
        assert!(!h.engine.borrow().render_engine().hand_paint().anti_alias);
    }

    #[test]
    fn test_repeated_ambient_state_does_not_invalidate() {
        let h = Harness::new();
        h.engine.borrow_mut().on_ambient_mode_changed(true);
        let before = h.window.redraw_requests();
        h.engine.borrow_mut().on_ambient_mode_changed(true);
        assert_eq!(h.window.redraw_requests(), before);
    }
}
