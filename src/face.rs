//! Watch face engine: host lifecycle callbacks around the render engine

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::broadcast::{SubscriptionId, TimeZoneBroadcaster, TimeZoneReceiver};
use crate::config::{FaceConfig, WatchFaceStyle};
use crate::core::{
    FaceAssets, Frame, HandleMessage, Handler, Looper, RenderEngine, TimeSource, TimeZoneId,
    TimerState, UpdateTimer, WallClock, WindowContext, MSG_UPDATE_TIME,
};

/// Display capabilities reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceProperties {
    /// Fewer bits per colour channel in ambient mode
    pub low_bit_ambient: bool,
}

/// Host services the engine talks to
#[derive(Clone)]
pub struct FaceServices {
    pub looper: Rc<Looper>,
    pub window: Rc<dyn WindowContext>,
    pub broadcaster: Rc<dyn TimeZoneBroadcaster>,
}

/// Routes queued timer ticks to the engine without keeping it alive
struct EngineHandler {
    engine: Weak<RefCell<WatchFaceEngine>>,
    looper: Weak<Looper>,
    this: Weak<EngineHandler>,
    retry_ms: i64,
}

impl EngineHandler {
    /// Queue the tick again so a busy engine does not stall the update loop
    fn retry_update(&self) {
        let (Some(looper), Some(this)) = (self.looper.upgrade(), self.this.upgrade()) else {
            return;
        };
        Handler::new(looper, this).send_empty_message_delayed(MSG_UPDATE_TIME, self.retry_ms);
    }
}

impl HandleMessage for EngineHandler {
    fn handle_message(&self, what: u32) {
        let Some(engine) = self.engine.upgrade() else {
            log::debug!("dropping message {} for a destroyed engine", what);
            return;
        };

        match what {
            MSG_UPDATE_TIME => match engine.try_borrow_mut() {
                Ok(mut engine) => engine.handle_update_time_message(),
                Err(_) => {
                    log::warn!("engine busy, retrying update tick");
                    self.retry_update();
                }
            },
            _ => log::debug!("ignoring unknown message {}", what),
        };
    }
}

/// Timezone receiver that forwards to the engine while it exists
struct TimeZoneListener {
    engine: Weak<RefCell<WatchFaceEngine>>,
}

impl TimeZoneReceiver for TimeZoneListener {
    fn on_time_zone_changed(&self, zone_id: &str) {
        if let Some(engine) = self.engine.upgrade() {
            match engine.try_borrow_mut() {
                Ok(mut engine) => engine.on_time_zone_changed(zone_id),
                Err(_) => log::warn!("engine busy, missed time zone change to {}", zone_id),
            };
        }
    }
}

/// Analog face driven by host lifecycle callbacks
pub struct WatchFaceEngine {
    style: WatchFaceStyle,
    render: RenderEngine,
    wall_clock: WallClock,
    default_zone: TimeZoneId,
    clock: Rc<dyn TimeSource>,
    timer: UpdateTimer,
    window: Rc<dyn WindowContext>,
    broadcaster: Rc<dyn TimeZoneBroadcaster>,
    zone_listener: Rc<dyn TimeZoneReceiver>,
    zone_subscription: Option<SubscriptionId>,
    visible: bool,
    ambient: bool,
    low_bit_ambient: bool,
    continuous_redraw: bool,
    destroyed: bool,
}

impl WatchFaceEngine {
    /// Create the engine. The style descriptor is fixed from here on.
    pub fn create(
        config: &FaceConfig,
        assets: FaceAssets,
        services: FaceServices,
    ) -> Rc<RefCell<Self>> {
        let zone = config.zone();
        log::info!(
            "creating watch face: style {:?}, zone {}, update every {}ms",
            config.style,
            zone,
            config.interactive_update_rate_ms
        );

        Rc::new_cyclic(|weak| {
            let rate_ms = i64::try_from(config.interactive_update_rate_ms).unwrap_or(i64::MAX);
            let target = Rc::new_cyclic(|this| EngineHandler {
                engine: weak.clone(),
                looper: Rc::downgrade(&services.looper),
                this: this.clone(),
                retry_ms: rate_ms,
            });
            let handler = Handler::new(services.looper.clone(), target);

            RefCell::new(Self {
                style: config.style,
                render: RenderEngine::new(
                    assets,
                    config.background_color,
                    config.reference_size,
                    config.offsets(),
                ),
                wall_clock: WallClock::new(zone),
                default_zone: zone,
                clock: services.looper.clock().clone(),
                timer: UpdateTimer::new(handler, rate_ms),
                window: services.window,
                broadcaster: services.broadcaster,
                zone_listener: Rc::new(TimeZoneListener { engine: weak.clone() }),
                zone_subscription: None,
                visible: false,
                ambient: false,
                low_bit_ambient: false,
                continuous_redraw: config.continuous_redraw,
                destroyed: false,
            })
        })
    }

    pub fn style(&self) -> &WatchFaceStyle {
        &self.style
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_in_ambient_mode(&self) -> bool {
        self.ambient
    }

    pub fn is_low_bit_ambient(&self) -> bool {
        self.low_bit_ambient
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    pub fn is_zone_receiver_registered(&self) -> bool {
        self.zone_subscription.is_some()
    }

    pub fn wall_clock(&self) -> &WallClock {
        &self.wall_clock
    }

    pub fn render_engine(&self) -> &RenderEngine {
        &self.render
    }

    pub fn on_surface_changed(&mut self, width: u32, height: u32) {
        let geometry = self.render.set_surface_size(width, height);
        log::debug!("surface changed: {:?}", geometry);
        self.invalidate();
    }

    pub fn on_properties_changed(&mut self, properties: DeviceProperties) {
        self.low_bit_ambient = properties.low_bit_ambient;
        if self.low_bit_ambient {
            self.render.set_hand_anti_alias(!self.ambient);
        }
    }

    /// Minute tick from the host, delivered while ambient
    pub fn on_time_tick(&mut self) {
        self.invalidate();
    }

    pub fn on_ambient_mode_changed(&mut self, in_ambient_mode: bool) {
        if self.ambient != in_ambient_mode {
            log::info!("ambient mode {}", if in_ambient_mode { "on" } else { "off" });
            self.ambient = in_ambient_mode;
            if self.low_bit_ambient {
                self.render.set_hand_anti_alias(!in_ambient_mode);
            }
            self.invalidate();
        }

        // Timer depends on visibility as well as ambient mode
        self.update_timer();
    }

    /// Compose a frame for a surface of the given size.
    /// Returns None for an empty surface or a destroyed engine.
    pub fn on_draw(&mut self, width: u32, height: u32) -> Option<Frame> {
        if self.destroyed || width == 0 || height == 0 {
            return None;
        }

        let reading = match self.wall_clock.set_to_now(self.clock.as_ref()) {
            Ok(reading) => reading,
            Err(err) => {
                log::warn!("clock read failed, reusing {}: {}", self.wall_clock.reading(), err);
                self.wall_clock.reading()
            }
        };

        let frame = self.render.draw(width, height, reading)?;

        // While interactive, immediately request the next frame
        if self.continuous_redraw && self.visible && !self.ambient {
            self.invalidate();
        }

        Some(frame)
    }

    pub fn on_visibility_changed(&mut self, visible: bool) {
        if self.destroyed {
            return;
        }
        log::info!("face {}", if visible { "visible" } else { "hidden" });
        self.visible = visible;

        if visible {
            self.register_zone_receiver();

            // Zone may have changed while hidden
            let zone = self.default_zone;
            if let Err(err) = self.wall_clock.reset(zone, self.clock.as_ref()) {
                log::warn!("clock read failed on becoming visible: {}", err);
            }
        } else {
            self.unregister_zone_receiver();
        }

        self.update_timer();
    }

    pub fn on_destroy(&mut self) {
        log::info!("destroying watch face");
        self.timer.stop();
        self.unregister_zone_receiver();
        self.destroyed = true;
    }

    fn on_time_zone_changed(&mut self, zone_id: &str) {
        let zone = TimeZoneId::parse_or_local(zone_id);
        log::info!("time zone now {}", zone);
        if let Err(err) = self.wall_clock.reset(zone, self.clock.as_ref()) {
            log::warn!("clock read failed after zone change: {}", err);
        }
        self.invalidate();
    }

    fn register_zone_receiver(&mut self) {
        if self.zone_subscription.is_some() {
            return;
        }
        self.zone_subscription = Some(self.broadcaster.register(self.zone_listener.clone()));
        log::debug!("time zone receiver registered");
    }

    fn unregister_zone_receiver(&mut self) {
        if let Some(id) = self.zone_subscription.take() {
            self.broadcaster.unregister(id);
            log::debug!("time zone receiver unregistered");
        }
    }

    fn invalidate(&self) {
        self.window.request_redraw();
    }

    /// Interactive ticking only while visible and out of ambient mode
    fn should_timer_be_running(&self) -> bool {
        self.visible && !self.ambient && !self.destroyed
    }

    fn update_timer(&mut self) {
        let should_run = self.should_timer_be_running();
        self.timer.update(should_run);
    }

    fn handle_update_time_message(&mut self) {
        self.invalidate();
        let should_run = self.should_timer_be_running();
        self.timer.on_tick(should_run);
    }
}
