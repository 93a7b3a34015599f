use time::{macros::format_description, Duration, OffsetDateTime, UtcOffset};

/// Bounds of a flow's query window, already rendered the way the events endpoint expects them
/// in `time_from`/`time_to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub from: String,
    pub to: String,
}

impl TimeRange {
    /// Window covering the `days` days up to now. The clock is read once per call.
    pub fn last_days(days: u32) -> Result<Self, time::error::Format> {
        Self::ending_at(OffsetDateTime::now_utc(), days)
    }

    pub fn ending_at(to: OffsetDateTime, days: u32) -> Result<Self, time::error::Format> {
        let from = to - Duration::days(i64::from(days));
        Ok(Self {
            from: iso8601(from)?,
            to: iso8601(to)?,
        })
    }
}

/// UTC, millisecond precision, `Z` suffix: `2024-05-01T12:00:00.000Z`.
fn iso8601(at: OffsetDateTime) -> Result<String, time::error::Format> {
    at.to_offset(UtcOffset::UTC).format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    ))
}
