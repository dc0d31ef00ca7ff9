use crate::utils::error::{MarshalError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};

/// Date-time types that can sit behind a `date` field.
///
/// Every value passes through `DateTime<FixedOffset>` so the offset survives
/// a decode / encode cycle unchanged.
pub trait DateValue: Sized {
    fn to_fixed(&self) -> DateTime<FixedOffset>;
    fn from_fixed(value: DateTime<FixedOffset>) -> Self;
}

impl DateValue for DateTime<FixedOffset> {
    fn to_fixed(&self) -> DateTime<FixedOffset> {
        *self
    }

    fn from_fixed(value: DateTime<FixedOffset>) -> Self {
        value
    }
}

impl DateValue for DateTime<Utc> {
    fn to_fixed(&self) -> DateTime<FixedOffset> {
        self.fixed_offset()
    }

    fn from_fixed(value: DateTime<FixedOffset>) -> Self {
        value.with_timezone(&Utc)
    }
}

impl DateValue for NaiveDate {
    fn to_fixed(&self) -> DateTime<FixedOffset> {
        Utc.from_utc_datetime(&self.and_time(NaiveTime::default()))
            .fixed_offset()
    }

    fn from_fixed(value: DateTime<FixedOffset>) -> Self {
        value.date_naive()
    }
}

/// Encodes as RFC3339 with whole seconds and an explicit offset, e.g. `2023-10-27T10:00:00+00:00`.
pub fn encode<D: DateValue>(value: &D) -> String {
    value.to_fixed().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Decodes an RFC3339 / ISO-8601 literal.
///
/// Accepted shapes, tried in order:
/// - RFC3339 (`2023-10-27T10:00:00+02:00`, `2023-10-27T10:00:00Z`)
/// - ISO-8601 with a colon-less offset (`2023-10-27T10:00:00+0200`)
/// - local date-time without offset, read as UTC (`2023-10-27T10:00:00`, `2023-10-27 10:00:00`)
/// - bare date, read as UTC midnight (`2023-10-27`)
pub fn decode(value: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }

    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt);
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|date| date.to_fixed())
        .map_err(|e| MarshalError::DateParse {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
