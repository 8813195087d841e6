use std::sync::OnceLock;

use chronologue_core::MemoryTrace;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

pub use chronologue_core::MAX_DURATION_MINUTES;

/// Which strategy produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSource {
    /// A JSON integer, e.g. `90`.
    Integer,
    /// A string holding an integer, e.g. `"90"`.
    IntegerText,
    /// Hour/minute tokens, e.g. `"1h30m"` or `"2.5h"`.
    Composite,
    /// A 24-hour clock range, e.g. `"14:00-15:30"`.
    TimeRange,
    /// Nothing matched; the caller's default was used.
    Default,
}

/// Outcome of duration resolution. Always within `1..=MAX_DURATION_MINUTES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub minutes: u32,
    pub used_default: bool,
    pub source: DurationSource,
}

type Strategy = fn(&Value) -> Option<u32>;

/// Tried in order; the first match wins.
const STRATEGIES: [(DurationSource, Strategy); 4] = [
    (DurationSource::Integer, from_integer),
    (DurationSource::IntegerText, from_integer_text),
    (DurationSource::Composite, from_composite),
    (DurationSource::TimeRange, from_time_range),
];

/// Resolve a trace's `duration_minutes` into whole minutes.
///
/// Never fails: when no strategy matches, `default_minutes` (clamped into
/// range) is returned with `used_default` set.
pub fn resolve(trace: &MemoryTrace, default_minutes: u32) -> Resolution {
    match trace.duration_minutes.as_ref().and_then(resolve_value) {
        Some((source, minutes)) => Resolution {
            minutes,
            used_default: false,
            source,
        },
        None => Resolution {
            minutes: default_minutes.clamp(1, MAX_DURATION_MINUTES),
            used_default: true,
            source: DurationSource::Default,
        },
    }
}

/// Run the parsing strategies against a raw duration value.
pub fn resolve_value(raw: &Value) -> Option<(DurationSource, u32)> {
    STRATEGIES
        .iter()
        .find_map(|(source, strategy)| strategy(raw).map(|minutes| (*source, minutes)))
}

fn in_range(minutes: i64) -> Option<u32> {
    u32::try_from(minutes)
        .ok()
        .filter(|m| (1..=MAX_DURATION_MINUTES).contains(m))
}

fn from_integer(raw: &Value) -> Option<u32> {
    let minutes = raw.as_i64().or_else(|| {
        raw.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= f64::from(u32::MAX))
            .map(|f| f as i64)
    })?;
    in_range(minutes)
}

fn from_integer_text(raw: &Value) -> Option<u32> {
    raw.as_str()?.trim().parse::<i64>().ok().and_then(in_range)
}

struct DurationPatterns {
    composite: Regex,
    time_range: Regex,
}

fn build_duration_patterns() -> Option<DurationPatterns> {
    Some(DurationPatterns {
        composite: Regex::new(
            r"(?x)
                ^\s*
                (?:(?P<hours>\d+(?:\.\d+)?)\s*[hH])?
                \s*
                (?:(?P<minutes>\d+(?:\.\d+)?)\s*[mM])?
                \s*$
            ",
        )
        .ok()?,
        time_range: Regex::new(r"^\s*(\d{1,2}):(\d{2})\s*-\s*(\d{1,2}):(\d{2})\s*$").ok()?,
    })
}

fn duration_patterns() -> Option<&'static DurationPatterns> {
    static PATTERNS: OnceLock<Option<DurationPatterns>> = OnceLock::new();
    PATTERNS.get_or_init(build_duration_patterns).as_ref()
}

fn from_composite(raw: &Value) -> Option<u32> {
    let caps = duration_patterns()?.composite.captures(raw.as_str()?)?;
    let hours = caps.name("hours");
    let minutes = caps.name("minutes");
    if hours.is_none() && minutes.is_none() {
        return None;
    }

    let parse = |m: Option<regex::Match<'_>>| -> Option<f64> {
        m.map_or(Some(0.0), |m| m.as_str().parse::<f64>().ok())
    };
    let total = parse(hours)? * 60.0 + parse(minutes)?;
    if !total.is_finite() || total > f64::from(MAX_DURATION_MINUTES) {
        return None;
    }
    in_range(total.floor() as i64)
}

fn from_time_range(raw: &Value) -> Option<u32> {
    let caps = duration_patterns()?.time_range.captures(raw.as_str()?)?;
    let field = |idx: usize| -> Option<i64> { caps.get(idx)?.as_str().parse().ok() };
    let clock = |hour: i64, minute: i64| -> Option<i64> {
        ((0..24).contains(&hour) && (0..60).contains(&minute)).then_some(hour * 60 + minute)
    };

    let start = clock(field(1)?, field(2)?)?;
    let end = clock(field(3)?, field(4)?)?;
    let mut minutes = end - start;
    if minutes <= 0 {
        minutes += i64::from(MAX_DURATION_MINUTES);
    }
    in_range(minutes)
}
