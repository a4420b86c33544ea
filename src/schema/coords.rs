//! Coordinate and time parsing for parameter values

use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// `hh:mm:ss.s`, `hh mm ss.s` or `hh:mm.m`, with an optional sign for declinations
static SEXAGESIMAL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?)(\d{1,3})[:\s]+(\d{1,2}(?:\.\d+)?)(?:[:\s]+(\d{1,2}(?:\.\d+)?))?\s*$").ok()
});

const CALENDAR_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

struct Sexagesimal {
    negative: bool,
    major: f64,
    minutes: f64,
    seconds: f64,
}

fn split_sexagesimal(text: &str) -> Option<Sexagesimal> {
    let caps = SEXAGESIMAL.as_ref()?.captures(text)?;
    let major = caps.get(2)?.as_str().parse().ok()?;
    let minutes = caps.get(3)?.as_str().parse().ok()?;
    let seconds = match caps.get(4) {
        Some(s) => s.as_str().parse().ok()?,
        None => 0.0,
    };
    Some(Sexagesimal {
        negative: caps.get(1).is_some_and(|s| s.as_str() == "-"),
        major,
        minutes,
        seconds,
    })
}

fn plain_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Parse a right ascension given in degrees or as `hh:mm:ss`
///
/// Returns decimal degrees in `[0, 360)`.
pub fn parse_right_ascension(value: &Value) -> Result<f64, String> {
    if let Some(deg) = plain_number(value) {
        if !(0.0..360.0).contains(&deg) {
            return Err(format!("RA {} is outside [0, 360)", deg));
        }
        return Ok(deg);
    }
    let text = value
        .as_str()
        .ok_or_else(|| format!("expected RA in degrees or hh:mm:ss, got {}", value))?;
    let parts = split_sexagesimal(text).ok_or_else(|| format!("cannot parse RA '{}'", text))?;
    if parts.negative || parts.major >= 24.0 || parts.minutes >= 60.0 || parts.seconds >= 60.0 {
        return Err(format!("RA '{}' is out of range", text));
    }
    Ok(15.0 * (parts.major + parts.minutes / 60.0 + parts.seconds / 3600.0))
}

/// Parse a declination given in degrees or as `±dd:mm:ss`
///
/// Returns decimal degrees in `[-90, 90]`.
pub fn parse_declination(value: &Value) -> Result<f64, String> {
    if let Some(deg) = plain_number(value) {
        if !(-90.0..=90.0).contains(&deg) {
            return Err(format!("Dec {} is outside [-90, 90]", deg));
        }
        return Ok(deg);
    }
    let text = value
        .as_str()
        .ok_or_else(|| format!("expected Dec in degrees or dd:mm:ss, got {}", value))?;
    let parts = split_sexagesimal(text).ok_or_else(|| format!("cannot parse Dec '{}'", text))?;
    if parts.minutes >= 60.0 || parts.seconds >= 60.0 {
        return Err(format!("Dec '{}' is out of range", text));
    }
    // the sign is taken from the text so that -00:30:00 stays negative
    let magnitude = parts.major + parts.minutes / 60.0 + parts.seconds / 3600.0;
    if magnitude > 90.0 {
        return Err(format!("Dec '{}' is out of range", text));
    }
    Ok(if parts.negative { -magnitude } else { magnitude })
}

/// Parse a calendar date in one of the accepted layouts
pub(crate) fn parse_calendar(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    CALENDAR_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Parse a time parameter: MET seconds (number or numeric string) or a calendar date
///
/// Calendar dates are normalized to `YYYY-MM-DD HH:MM:SS`.
pub fn parse_time(value: &Value) -> Result<Value, String> {
    if let Some(seconds) = plain_number(value) {
        if seconds < 0.0 {
            return Err(format!("time {} is negative", seconds));
        }
        return Ok(Value::from(seconds));
    }
    let text = value
        .as_str()
        .ok_or_else(|| format!("expected MET seconds or a date, got {}", value))?;
    let date = parse_calendar(text).ok_or_else(|| format!("cannot parse time '{}'", text))?;
    Ok(Value::from(date.format("%Y-%m-%d %H:%M:%S").to_string()))
}
