//! Time intervals as the server understands them.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open time interval `[start, end)`, or a single instant when `end` is absent.
///
/// On the wire this is `{start, end}` in milliseconds since the Unix epoch;
/// in OGC requests it is an ISO 8601 instant or `start/end` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "TimeIntervalWire", try_from = "TimeIntervalWire")]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
}

impl TimeInterval {
    /// Create an interval, checking `start <= end`.
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<Self, TimeParseError> {
        if let Some(end) = end {
            if start > end {
                return Err(TimeParseError::StartAfterEnd {
                    start: format_instant(&start),
                    end: format_instant(&end),
                });
            }
        }
        Ok(Self { start, end })
    }

    /// A single instant.
    pub fn instant(at: DateTime<Utc>) -> Self {
        Self {
            start: at,
            end: None,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// End of the interval, falling back to the start for instants.
    pub fn end_or_start(&self) -> DateTime<Utc> {
        self.end.unwrap_or(self.start)
    }

    pub fn is_instant(&self) -> bool {
        self.end.map_or(true, |end| end == self.start)
    }

    /// OGC `TIME` parameter: millisecond precision with an explicit `+00:00` offset.
    pub fn time_str(&self) -> String {
        let start = format_instant(&self.start);
        match self.end {
            Some(end) if end != self.start => format!("{}/{}", start, format_instant(&end)),
            _ => start,
        }
    }

    /// Parse the `time_str` form (or any RFC 3339 instant / pair) back into an interval.
    pub fn from_time_str(s: &str) -> Result<Self, TimeParseError> {
        match s.split_once('/') {
            Some((start, end)) => Self::new(parse_instant(start)?, Some(parse_instant(end)?)),
            None => Ok(Self::instant(parse_instant(s)?)),
        }
    }

    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_millis(&self) -> Option<i64> {
        self.end.map(|end| end.timestamp_millis())
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.time_str())
    }
}

/// Format an instant as `2014-04-01T12:00:00.000+00:00`.
pub fn format_instant(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// Parse an ISO 8601 instant, assuming UTC when no offset is given.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, TimeParseError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(TimeParseError::OutOfRange(millis))
}

#[derive(Serialize, Deserialize)]
struct TimeIntervalWire {
    start: i64,
    #[serde(default)]
    end: Option<i64>,
}

impl From<TimeInterval> for TimeIntervalWire {
    fn from(interval: TimeInterval) -> Self {
        Self {
            start: interval.start_millis(),
            end: interval.end_millis(),
        }
    }
}

impl TryFrom<TimeIntervalWire> for TimeInterval {
    type Error = TimeParseError;

    fn try_from(wire: TimeIntervalWire) -> Result<Self, Self::Error> {
        let end = wire.end.map(from_millis).transpose()?;
        TimeInterval::new(from_millis(wire.start)?, end)
    }
}

/// Calendar granularity of a time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeGranularity {
    Millis,
    Seconds,
    Minutes,
    Hours,
    Days,
    Months,
    Years,
}

/// A regular step through time, e.g. every 16 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeStep {
    pub granularity: TimeGranularity,
    pub step: u32,
}

impl TimeStep {
    pub fn new(granularity: TimeGranularity, step: u32) -> Self {
        Self { granularity, step }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Time interval start {start} is after its end {end}")]
    StartAfterEnd { start: String, end: String },

    #[error("Timestamp {0} ms is out of range")]
    OutOfRange(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        parse_instant(s).unwrap()
    }

    #[test]
    fn test_instant_time_str() {
        let interval = TimeInterval::instant(at("2014-04-01T12:00:00Z"));
        assert_eq!(interval.time_str(), "2014-04-01T12:00:00.000+00:00");
        assert!(interval.is_instant());
    }

    #[test]
    fn test_interval_time_str() {
        let interval =
            TimeInterval::new(at("2014-04-01T00:00:00Z"), Some(at("2014-05-01T00:00:00Z"))).unwrap();
        assert_eq!(
            interval.time_str(),
            "2014-04-01T00:00:00.000+00:00/2014-05-01T00:00:00.000+00:00"
        );
        assert_eq!(TimeInterval::from_time_str(&interval.time_str()).unwrap(), interval);
    }

    #[test]
    fn test_equal_end_is_instant() {
        let t = at("2014-04-01T12:00:00Z");
        let interval = TimeInterval::new(t, Some(t)).unwrap();
        assert_eq!(interval.time_str(), "2014-04-01T12:00:00.000+00:00");
    }

    #[test]
    fn test_start_after_end_rejected() {
        let result = TimeInterval::new(at("2014-05-01T00:00:00Z"), Some(at("2014-04-01T00:00:00Z")));
        assert!(matches!(result, Err(TimeParseError::StartAfterEnd { .. })));
    }

    #[test]
    fn test_wire_is_millis() {
        let interval = TimeInterval::instant(at("2014-04-01T12:00:00Z"));
        let json = serde_json::to_value(interval).unwrap();
        assert_eq!(json, serde_json::json!({"start": 1396353600000i64, "end": null}));
    }

    #[test]
    fn test_naive_assumes_utc() {
        assert_eq!(at("2014-04-01T12:00:00"), at("2014-04-01T12:00:00+00:00"));
    }
}
