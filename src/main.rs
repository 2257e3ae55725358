use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window as WinitWindow, WindowId},
};

use jean_clock::broadcast::LocalOffsetMonitor;
use jean_clock::cli::Cli;
use jean_clock::core::{next_boundary, FaceAssets, Looper, SystemClock, TimeSource, WindowContext};
use jean_clock::logging::{init_logging, LoggingConfig};
use jean_clock::snapshot::render_snapshot;
use jean_clock::window::Window;
use jean_clock::{DeviceProperties, FaceConfig, FaceServices, WatchFaceEngine};

// === Constants ===

/// How often the system UTC offset is checked
const ZONE_POLL_INTERVAL_MS: i64 = 5_000;
/// Ambient mode redraws on the minute
const AMBIENT_TICK_RATE_MS: i64 = 60_000;

/// Host for the face: owns the window, the message loop and the broadcast service
struct App {
    config: FaceConfig,
    assets: Option<FaceAssets>,
    size: u32,
    start_ambient: bool,
    low_bit_ambient: bool,
    clock: Rc<dyn TimeSource>,
    looper: Rc<Looper>,
    monitor: Rc<LocalOffsetMonitor>,
    window: Option<Rc<Window>>,
    engine: Option<Rc<RefCell<WatchFaceEngine>>>,
    next_zone_poll: i64,
    next_ambient_tick: Option<i64>,
}

impl App {
    fn new(cli: &Cli, config: FaceConfig, assets: FaceAssets) -> Self {
        let clock: Rc<dyn TimeSource> = Rc::new(SystemClock);
        Self {
            config,
            assets: Some(assets),
            size: cli.size,
            start_ambient: cli.ambient,
            low_bit_ambient: cli.low_bit_ambient,
            looper: Looper::new(clock.clone()),
            clock,
            monitor: Rc::new(LocalOffsetMonitor::new()),
            window: None,
            engine: None,
            next_zone_poll: 0,
            next_ambient_tick: None,
        }
    }

    fn now_millis(&self) -> Option<i64> {
        match self.clock.epoch_millis() {
            Ok(now) => Some(now),
            Err(err) => {
                log::warn!("system clock unavailable: {}", err);
                None
            }
        }
    }

    fn create_engine(&mut self, window: Rc<Window>, assets: FaceAssets) {
        let services = FaceServices {
            looper: self.looper.clone(),
            window: window.clone(),
            broadcaster: self.monitor.clone(),
        };
        let engine = WatchFaceEngine::create(&self.config, assets, services);

        {
            let mut face = engine.borrow_mut();
            let dims = window.dimensions();
            face.on_properties_changed(DeviceProperties {
                low_bit_ambient: self.low_bit_ambient,
            });
            face.on_surface_changed(dims.width, dims.height);
            face.on_visibility_changed(true);
            if self.start_ambient {
                face.on_ambient_mode_changed(true);
            }
        }

        self.window = Some(window);
        self.engine = Some(engine);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(engine) = self.engine.take() {
            engine.borrow_mut().on_destroy();
        }
        event_loop.exit();
    }

    fn toggle_ambient(&mut self) {
        if let Some(engine) = &self.engine {
            let mut face = engine.borrow_mut();
            let ambient = !face.is_in_ambient_mode();
            face.on_ambient_mode_changed(ambient);
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if let Some(engine) = &self.engine {
            engine.borrow_mut().on_visibility_changed(visible);
        }
    }

    fn draw(&mut self) {
        let (Some(window), Some(engine)) = (&self.window, &self.engine) else {
            return;
        };

        let dims = window.dimensions();
        let frame = engine.borrow_mut().on_draw(dims.width, dims.height);
        if let Some(frame) = frame {
            if let Err(e) = window.present(&frame) {
                log::error!("present failed: {}", e);
            }
        }
    }

    /// Run host-side periodic work that is due
    fn service(&mut self, now: i64) {
        // Engine ticks; no engine borrow may be held here
        self.looper.dispatch_due(now);

        if now >= self.next_zone_poll {
            self.monitor.poll();
            self.next_zone_poll = now + ZONE_POLL_INTERVAL_MS;
        }

        let ambient = self
            .engine
            .as_ref()
            .map(|e| {
                let face = e.borrow();
                face.is_visible() && face.is_in_ambient_mode()
            })
            .unwrap_or(false);

        if !ambient {
            self.next_ambient_tick = None;
            return;
        }

        match self.next_ambient_tick {
            Some(due) if now >= due => {
                if let Some(engine) = &self.engine {
                    engine.borrow_mut().on_time_tick();
                }
                self.next_ambient_tick = Some(next_boundary(now, AMBIENT_TICK_RATE_MS));
            }
            Some(_) => {}
            None => self.next_ambient_tick = Some(next_boundary(now, AMBIENT_TICK_RATE_MS)),
        }
    }

    /// Earliest wake-up across the looper, zone polling and ambient ticks
    fn next_wake(&self) -> i64 {
        [self.looper.next_deadline(), Some(self.next_zone_poll), self.next_ambient_tick]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(self.next_zone_poll)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let Some(assets) = self.assets.take() else {
            return;
        };

        let inner = match event_loop.create_window(
            WinitWindow::default_attributes()
                .with_title("Jean Clock")
                .with_inner_size(winit::dpi::PhysicalSize::new(self.size, self.size)),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let window = match Window::new(inner) {
            Ok(w) => Rc::new(w),
            Err(e) => {
                log::error!("Failed to initialize surface: {}", e);
                event_loop.exit();
                return;
            }
        };

        self.create_engine(window, assets);
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, _cause: StartCause) {
        if let Some(now) = self.now_millis() {
            self.service(now);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.shutdown(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::KeyA => self.toggle_ambient(),
                KeyCode::KeyV => {
                    let visible = self.engine.as_ref().is_some_and(|e| e.borrow().is_visible());
                    self.set_visible(!visible);
                }
                _ => {}
            },
            WindowEvent::Occluded(occluded) => self.set_visible(!occluded),
            WindowEvent::Resized(size) => {
                if let Some(window) = &self.window {
                    window.resize(size.width, size.height);
                }
                if let Some(engine) = &self.engine {
                    engine.borrow_mut().on_surface_changed(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.draw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(now) = self.now_millis() else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };

        let wait_ms = (self.next_wake() - now).max(0) as u64;
        let deadline = Instant::now() + Duration::from_millis(wait_ms);
        event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => FaceConfig::load(path)?,
        None => FaceConfig::default(),
    };
    cli.apply(&mut config);

    init_logging(LoggingConfig {
        filter: config.log_filter.clone(),
    });

    // Asset problems are fatal at startup
    let assets = config.load_assets()?;

    if let Some(path) = &cli.snapshot {
        let frame = render_snapshot(&config, assets, cli.size, cli.at)?;
        frame.save_png(path)?;
        log::info!("wrote {}", path.display());
        return Ok(());
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(&cli, config, assets);

    log::info!("Jean Clock - A: toggle ambient, V: toggle visibility, Escape to quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
