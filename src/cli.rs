// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::config::FaceConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "jean-clock")]
#[command(about = "Analog watch face renderer", long_about = None)]
pub struct Cli {
    /// JSON face configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory with background.png, figure.png, hour.png and minute.png
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Face size in pixels
    #[arg(long, default_value_t = 320)]
    pub size: u32,

    /// Start in ambient (low-power) mode
    #[arg(long)]
    pub ambient: bool,

    /// Display has reduced colour depth in ambient mode
    #[arg(long = "low-bit-ambient")]
    pub low_bit_ambient: bool,

    /// Time zone: local, UTC or an offset like +02:00
    #[arg(long = "time-zone")]
    pub time_zone: Option<String>,

    /// Render one frame to this PNG and exit
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Fixed time for --snapshot, as HH:MM
    #[arg(long, value_parser = parse_time_of_day, requires = "snapshot")]
    pub at: Option<TimeOfDay>,

    /// Log filter, e.g. "debug" or "jean_clock=trace"
    #[arg(long)]
    pub log: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of file configuration
    pub fn apply(&self, config: &mut FaceConfig) {
        if let Some(dir) = &self.assets {
            config.assets_dir = Some(dir.clone());
        }
        if let Some(zone) = &self.time_zone {
            config.time_zone = Some(zone.clone());
        }
        if let Some(filter) = &self.log {
            config.log_filter = Some(filter.clone());
        }
    }
}

/// Hour and minute given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

fn parse_time_of_day(s: &str) -> Result<TimeOfDay, String> {
    let (h, m) = s.split_once(':').ok_or_else(|| format!("expected HH:MM, got '{}'", s))?;
    let hour: u32 = h.trim().parse().map_err(|_| format!("bad hour '{}'", h))?;
    let minute: u32 = m.trim().parse().map_err(|_| format!("bad minute '{}'", m))?;
    if hour >= 24 || minute >= 60 {
        return Err(format!("time out of range: {}", s));
    }
    Ok(TimeOfDay { hour, minute })
}
