use std::cell::Cell;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Timelike, Utc};

use super::zone::TimeZoneId;

/// Degrees the minute hand advances per minute
pub const DEGREES_PER_MINUTE: f32 = 6.0;
/// Degrees the hour hand advances per hour
pub const DEGREES_PER_HOUR: f32 = 30.0;

/// Failure to read wall-clock time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// System clock is set before 1970
    BeforeEpoch,
    /// Timestamp does not fit a calendar date
    OutOfRange(i64),
    /// Time source could not be read
    Unavailable(String),
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockError::BeforeEpoch => write!(f, "system clock is before the unix epoch"),
            ClockError::OutOfRange(ms) => write!(f, "timestamp {}ms is out of range", ms),
            ClockError::Unavailable(reason) => write!(f, "time source unavailable: {}", reason),
        }
    }
}

impl std::error::Error for ClockError {}

/// Source of wall-clock time in milliseconds since the unix epoch
pub trait TimeSource {
    fn epoch_millis(&self) -> Result<i64, ClockError>;

    /// Current instant as a UTC date-time
    fn now_utc(&self) -> Result<DateTime<Utc>, ClockError> {
        let ms = self.epoch_millis()?;
        DateTime::from_timestamp_millis(ms).ok_or(ClockError::OutOfRange(ms))
    }
}

/// Time from the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn epoch_millis(&self) -> Result<i64, ClockError> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| ClockError::BeforeEpoch)?;
        i64::try_from(elapsed.as_millis()).map_err(|_| ClockError::OutOfRange(i64::MAX))
    }
}

/// Hand-driven time source for tests and headless rendering
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: Cell<i64>,
    failing: Cell<bool>,
}

impl ManualClock {
    pub fn new(epoch_millis: i64) -> Self {
        Self {
            millis: Cell::new(epoch_millis),
            failing: Cell::new(false),
        }
    }

    /// Clock reading the given UTC date-time
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self::new(instant.timestamp_millis())
    }

    pub fn set(&self, epoch_millis: i64) {
        self.millis.set(epoch_millis);
    }

    pub fn advance(&self, millis: i64) {
        self.millis.set(self.millis.get() + millis);
    }

    /// Make subsequent reads fail until cleared
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl TimeSource for ManualClock {
    fn epoch_millis(&self) -> Result<i64, ClockError> {
        if self.failing.get() {
            return Err(ClockError::Unavailable("manual clock set to fail".into()));
        }
        Ok(self.millis.get())
    }
}

/// Minute-hand angle in degrees, 0 at twelve o'clock, clockwise
pub fn minute_angle(minute: u32) -> f32 {
    (minute % 60) as f32 * DEGREES_PER_MINUTE
}

/// Hour-hand angle in degrees including the fractional-hour contribution of the minute
pub fn hour_angle(hour: u32, minute: u32) -> f32 {
    ((hour % 12) as f32 + (minute % 60) as f32 / 60.0) * DEGREES_PER_HOUR
}

/// Hour/minute/second read from the wall clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockReading {
    /// 0..24
    pub hour: u32,
    /// 0..60
    pub minute: u32,
    pub second: u32,
}

impl ClockReading {
    pub fn new(hour: u32, minute: u32, second: u32) -> Self {
        Self { hour, minute, second }
    }

    pub fn from_time<T: Timelike>(time: &T) -> Self {
        Self::new(time.hour(), time.minute(), time.second())
    }

    pub fn minute_angle(&self) -> f32 {
        minute_angle(self.minute)
    }

    pub fn hour_angle(&self) -> f32 {
        hour_angle(self.hour, self.minute)
    }
}

impl fmt::Display for ClockReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Held clock reading in a zone, refreshed with `set_to_now`
#[derive(Debug, Clone, Default)]
pub struct WallClock {
    zone: TimeZoneId,
    reading: ClockReading,
}

impl WallClock {
    pub fn new(zone: TimeZoneId) -> Self {
        Self {
            zone,
            reading: ClockReading::default(),
        }
    }

    /// Switch zone and re-read from `source`. The previous reading survives a failed read.
    pub fn reset(
        &mut self,
        zone: TimeZoneId,
        source: &dyn TimeSource,
    ) -> Result<ClockReading, ClockError> {
        self.zone = zone;
        self.set_to_now(source)
    }

    /// Refresh from `source`. On failure the previous reading is kept.
    pub fn set_to_now(&mut self, source: &dyn TimeSource) -> Result<ClockReading, ClockError> {
        let now = source.now_utc()?;
        self.reading = ClockReading::from_time(&self.zone.localize(now));
        Ok(self.reading)
    }

    pub fn reading(&self) -> ClockReading {
        self.reading
    }

    pub fn zone(&self) -> TimeZoneId {
        self.zone
    }
}
