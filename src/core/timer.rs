//! Interactive-mode update timer, phase-aligned to wall-clock boundaries

use super::looper::Handler;

/// Message id for the periodic redraw tick
pub const MSG_UPDATE_TIME: u32 = 0;

/// Default interactive update rate
pub const INTERACTIVE_UPDATE_RATE_MS: i64 = 1_000;

/// Milliseconds from `now_ms` until the next multiple of `rate_ms`.
/// Always in `1..=rate_ms`, so a tick landing exactly on a boundary waits a full period.
pub fn delay_to_next_boundary(now_ms: i64, rate_ms: i64) -> i64 {
    let rate = rate_ms.max(1);
    rate - now_ms.rem_euclid(rate)
}

/// Next boundary strictly after `now_ms`
pub fn next_boundary(now_ms: i64, rate_ms: i64) -> i64 {
    now_ms + delay_to_next_boundary(now_ms, rate_ms)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running,
}

/// Posts `MSG_UPDATE_TIME` once per period while running
pub struct UpdateTimer {
    handler: Handler,
    rate_ms: i64,
    state: TimerState,
}

impl UpdateTimer {
    pub fn new(handler: Handler, rate_ms: i64) -> Self {
        Self {
            handler,
            rate_ms: rate_ms.max(1),
            state: TimerState::Stopped,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn rate_ms(&self) -> i64 {
        self.rate_ms
    }

    /// Cancel any pending tick, then start with an immediate tick if `should_run`
    pub fn update(&mut self, should_run: bool) {
        self.handler.remove_messages(MSG_UPDATE_TIME);

        let next = if should_run {
            self.handler.send_empty_message(MSG_UPDATE_TIME);
            TimerState::Running
        } else {
            TimerState::Stopped
        };

        if next != self.state {
            log::debug!("update timer {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    /// Reschedule after a delivered tick. Returns the delay used, or None when stopping.
    pub fn on_tick(&mut self, should_run: bool) -> Option<i64> {
        if !should_run {
            self.state = TimerState::Stopped;
            return None;
        }

        let delay = match self.handler.looper().now_millis() {
            Ok(now) => delay_to_next_boundary(now, self.rate_ms),
            Err(err) => {
                log::warn!("clock unavailable, ticking after a full period: {}", err);
                self.rate_ms
            }
        };
        self.handler.send_empty_message_delayed(MSG_UPDATE_TIME, delay);
        self.state = TimerState::Running;
        Some(delay)
    }

    /// Cancel pending ticks and stop
    pub fn stop(&mut self) {
        self.update(false);
    }
}
