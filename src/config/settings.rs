//! Client settings and the protocol ceilings imposed by the remote service.

use crate::error::ConfigError;
use chrono::{FixedOffset, Offset, Utc};

/// Most objects one insert/update call may carry.
pub const MAX_BATCH_SIZE: usize = 100;
/// Most records one listing/search page may return.
pub const MAX_PAGE_SIZE: usize = 200;
/// Remote code meaning "no matching records".
pub const NO_CONTENT_CODE: &str = "4422";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    /// Account time zone applied when encoding datetimes and reading zone-less timestamps.
    pub time_zone: FixedOffset,
    pub batch_size: usize,
    pub page_size: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            time_zone: utc(),
            batch_size: MAX_BATCH_SIZE,
            page_size: MAX_PAGE_SIZE,
        }
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

impl ClientSettings {
    /// Read `CRM_TIME_ZONE`, `CRM_BATCH_SIZE` and `CRM_PAGE_SIZE`; unset variables keep defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = ClientSettings::default();
        if let Some(tz) = lookup("CRM_TIME_ZONE") {
            settings.time_zone = parse_offset(&tz)?;
        }
        if let Some(v) = lookup("CRM_BATCH_SIZE") {
            settings.batch_size = parse_size("CRM_BATCH_SIZE", &v, MAX_BATCH_SIZE)?;
        }
        if let Some(v) = lookup("CRM_PAGE_SIZE") {
            settings.page_size = parse_size("CRM_PAGE_SIZE", &v, MAX_PAGE_SIZE)?;
        }
        Ok(settings)
    }

    pub fn with_time_zone(mut self, time_zone: FixedOffset) -> Self {
        self.time_zone = time_zone;
        self
    }
}

fn parse_size(key: &str, value: &str, max: usize) -> Result<usize, ConfigError> {
    let n: usize = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Load(format!("{} must be a positive integer, got {:?}", key, value)))?;
    if n == 0 || n > max {
        return Err(ConfigError::Load(format!("{} must be between 1 and {}, got {}", key, max, n)));
    }
    Ok(n)
}

/// Parse "Z", "UTC", "+02:00", "-0500" or "+02" into a fixed offset.
pub fn parse_offset(s: &str) -> Result<FixedOffset, ConfigError> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }
    let invalid = || ConfigError::Load(format!("invalid time zone offset {:?}", s));
    let (sign, rest) = match s.as_bytes()[0] {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().map_err(|_| invalid())?, 0),
        4 => (
            digits[..2].parse::<i32>().map_err(|_| invalid())?,
            digits[2..].parse::<i32>().map_err(|_| invalid())?,
        ),
        _ => return Err(invalid()),
    };
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_are_the_protocol_ceilings() {
        let s = ClientSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s, ClientSettings::default());
        assert_eq!(s.batch_size, 100);
        assert_eq!(s.page_size, 200);
        assert_eq!(s.time_zone.local_minus_utc(), 0);
    }

    #[test]
    fn reads_offsets_and_sizes() {
        let s = ClientSettings::from_lookup(lookup(&[
            ("CRM_TIME_ZONE", "-05:30"),
            ("CRM_BATCH_SIZE", "25"),
            ("CRM_PAGE_SIZE", "50"),
        ]))
        .unwrap();
        assert_eq!(s.time_zone.local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(s.batch_size, 25);
        assert_eq!(s.page_size, 50);
        assert_eq!(parse_offset("+0200").unwrap().local_minus_utc(), 7200);
        assert_eq!(parse_offset("+2").unwrap().local_minus_utc(), 7200);
    }

    #[test]
    fn rejects_values_above_the_ceiling() {
        assert!(ClientSettings::from_lookup(lookup(&[("CRM_BATCH_SIZE", "101")])).is_err());
        assert!(ClientSettings::from_lookup(lookup(&[("CRM_PAGE_SIZE", "0")])).is_err());
        assert!(ClientSettings::from_lookup(lookup(&[("CRM_TIME_ZONE", "Europe/Paris")])).is_err());
    }
}
