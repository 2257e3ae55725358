//! Time zone identifiers as delivered by the host's timezone broadcast

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, Offset, Utc};

/// Zone a wall clock reads in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZoneId {
    /// System local zone, re-resolved on every read
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl TimeZoneId {
    /// Parse `local`, `UTC`/`GMT`/`Z`, or an offset like `+05:30`, `-0800`, `UTC+2`.
    /// Returns None for ids that are not understood.
    pub fn parse(id: &str) -> Option<Self> {
        let id = id.trim();
        if id.is_empty() || id.eq_ignore_ascii_case("local") {
            return Some(TimeZoneId::Local);
        }
        if ["utc", "gmt", "z"].iter().any(|s| id.eq_ignore_ascii_case(s)) {
            return Some(TimeZoneId::Utc);
        }

        let offset = id
            .strip_prefix("UTC")
            .or_else(|| id.strip_prefix("GMT"))
            .unwrap_or(id);
        parse_offset(offset).map(TimeZoneId::Fixed)
    }

    /// Parse, falling back to the local zone with a warning for unknown ids
    pub fn parse_or_local(id: &str) -> Self {
        Self::parse(id).unwrap_or_else(|| {
            log::warn!("unknown time zone '{}', using local zone", id);
            TimeZoneId::Local
        })
    }

    /// Offset in effect at `instant`
    pub fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset {
        match self {
            TimeZoneId::Local => instant.with_timezone(&Local).offset().fix(),
            TimeZoneId::Utc => Utc.fix(),
            TimeZoneId::Fixed(offset) => *offset,
        }
    }

    /// Convert a UTC instant into this zone
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset_at(instant))
    }
}

impl fmt::Display for TimeZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeZoneId::Local => write!(f, "local"),
            TimeZoneId::Utc => write!(f, "UTC"),
            TimeZoneId::Fixed(offset) => write!(f, "{}", format_offset(*offset)),
        }
    }
}

/// Format offset as `+HH:MM`
pub fn format_offset(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let secs = secs.abs();
    format!("{}{:02}:{:02}", sign, secs / 3600, (secs % 3600) / 60)
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.chars().next()? {
        '+' => (1, &s[1..]),
        '-' => (-1, &s[1..]),
        _ => return None,
    };
    if rest.is_empty() || !rest.is_ascii() {
        return None;
    }

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() > 2 => rest.split_at(rest.len() - 2),
        None => (rest, "0"),
    };

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes >= 60 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_zones() {
        assert_eq!(TimeZoneId::parse("local"), Some(TimeZoneId::Local));
        assert_eq!(TimeZoneId::parse(""), Some(TimeZoneId::Local));
        assert_eq!(TimeZoneId::parse("utc"), Some(TimeZoneId::Utc));
        assert_eq!(TimeZoneId::parse("GMT"), Some(TimeZoneId::Utc));
    }

    #[test]
    fn parses_offsets() {
        let ist = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        assert_eq!(TimeZoneId::parse("+05:30"), Some(TimeZoneId::Fixed(ist)));
        assert_eq!(TimeZoneId::parse("+0530"), Some(TimeZoneId::Fixed(ist)));

        let pst = FixedOffset::west_opt(8 * 3600).unwrap();
        assert_eq!(TimeZoneId::parse("-08"), Some(TimeZoneId::Fixed(pst)));
        assert_eq!(TimeZoneId::parse("UTC-8"), Some(TimeZoneId::Fixed(pst)));
    }

    #[test]
    fn rejects_unknown() {
        assert_eq!(TimeZoneId::parse("Europe/Paris"), None);
        assert_eq!(TimeZoneId::parse("+25:00"), None);
        assert_eq!(TimeZoneId::parse("+05:75"), None);
        assert_eq!(TimeZoneId::parse_or_local("Mars/Olympus"), TimeZoneId::Local);
    }

    #[test]
    fn display_matches_parse() {
        let zone = TimeZoneId::parse("-03:30").unwrap();
        assert_eq!(zone.to_string(), "-03:30");
        assert_eq!(TimeZoneId::parse(&zone.to_string()), Some(zone));
    }
}
