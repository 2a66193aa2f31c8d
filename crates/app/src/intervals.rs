//! Credential Intervals
//!
//! Splits a long-lived entitlement into adjacent, calendar-aligned signing
//! windows. Only whole-day and whole-month periods are supported; anything
//! else is rejected when the plan is built.

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::{SignedDuration, Span, Timestamp, civil::Date, tz::TimeZone};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntervalError {
    #[error("invalid ISO-8601 duration {0:?}")]
    InvalidDuration(String),

    #[error("unsupported credential period {0:?}, expected whole days or whole months")]
    UnsupportedGranularity(String),

    #[error("issuance plan has no intervals")]
    NoIntervals,

    #[error("interval arithmetic out of range")]
    OutOfRange(#[from] jiff::Error),
}

/// Calendar unit a credential period is aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Days,
    Months,
}

/// A per-credential validity period such as `P1D` or `P1M`.
#[derive(Debug, Clone)]
pub struct CredentialPeriod {
    iso: String,
    span: Span,
    granularity: Granularity,
}

impl CredentialPeriod {
    /// Parse an ISO-8601 period and check it is day or month aligned.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::InvalidDuration`] when the value is not an
    /// ISO-8601 duration and [`IntervalError::UnsupportedGranularity`] when
    /// it mixes units, carries a time component, or is not positive.
    pub fn parse(iso: &str) -> Result<Self, IntervalError> {
        let span = parse_iso_duration(iso)?;

        let has_time = span.get_hours() != 0
            || span.get_minutes() != 0
            || span.get_seconds() != 0
            || span.get_milliseconds() != 0
            || span.get_microseconds() != 0
            || span.get_nanoseconds() != 0;
        let has_months = span.get_years() != 0 || span.get_months() != 0;
        let has_days = span.get_weeks() != 0 || span.get_days() != 0;

        let granularity = match (has_time, has_months, has_days) {
            _ if span.is_negative() => None,
            (false, true, false) => Some(Granularity::Months),
            (false, false, true) => Some(Granularity::Days),
            _ => None,
        }
        .ok_or_else(|| IntervalError::UnsupportedGranularity(iso.to_string()))?;

        Ok(Self {
            iso: iso.to_string(),
            span,
            granularity,
        })
    }

    #[must_use]
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.iso
    }

    fn start_of(&self, at: Timestamp) -> Date {
        let date = at.to_zoned(TimeZone::UTC).date();

        match self.granularity {
            Granularity::Days => date,
            Granularity::Months => date.first_of_month(),
        }
    }

    /// Moves `at` forward by `times` periods.
    ///
    /// # Errors
    ///
    /// Returns an error when the result is outside the supported range.
    pub fn advance(&self, at: Timestamp, times: u32) -> Result<Timestamp, IntervalError> {
        let mut zoned = at.to_zoned(TimeZone::UTC);

        for _ in 0..times {
            zoned = zoned.checked_add(self.span)?;
        }

        Ok(zoned.timestamp())
    }

    /// Moves `at` back by `times` periods.
    ///
    /// # Errors
    ///
    /// Returns an error when the result is outside the supported range.
    pub fn rewind(&self, at: Timestamp, times: u32) -> Result<Timestamp, IntervalError> {
        let mut zoned = at.to_zoned(TimeZone::UTC);

        for _ in 0..times {
            zoned = zoned.checked_sub(self.span)?;
        }

        Ok(zoned.timestamp())
    }

    fn retreat(&self, date: Date, times: u32) -> Result<Date, IntervalError> {
        let mut date = date;

        for _ in 0..times {
            date = date.checked_sub(self.span)?;
        }

        Ok(date)
    }
}

/// Periods are equal when written with the same units, so `P1M` and `P30D`
/// differ.
impl PartialEq for CredentialPeriod {
    fn eq(&self, other: &Self) -> bool {
        self.granularity == other.granularity && self.span.fieldwise() == other.span.fieldwise()
    }
}

impl Eq for CredentialPeriod {}

impl Display for CredentialPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.iso)
    }
}

/// A half-open signing window `[valid_from, valid_to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Window {
    pub valid_from: Timestamp,
    pub valid_to: Timestamp,
}

/// Returns the window containing `issued_at` and the start of the next one.
///
/// # Errors
///
/// Returns an error when the window bounds are outside the supported range.
pub fn chunk(issued_at: Timestamp, period: &CredentialPeriod) -> Result<Window, IntervalError> {
    let start = period.start_of(issued_at);

    window_from(start, period)
}

fn window_from(start: Date, period: &CredentialPeriod) -> Result<Window, IntervalError> {
    let next = start.checked_add(period.span)?;

    Ok(Window {
        valid_from: start.to_zoned(TimeZone::UTC)?.timestamp(),
        valid_to: next.to_zoned(TimeZone::UTC)?.timestamp(),
    })
}

/// Enumerates `buffer + overlap` adjacent windows, starting `overlap`
/// windows before the one containing `issued_at`.
///
/// # Errors
///
/// Returns [`IntervalError::NoIntervals`] when both counts are zero.
pub fn plan_windows(
    issued_at: Timestamp,
    period: &CredentialPeriod,
    buffer: u32,
    overlap: u32,
) -> Result<Vec<Window>, IntervalError> {
    let count = buffer.saturating_add(overlap);

    if count == 0 {
        return Err(IntervalError::NoIntervals);
    }

    let mut start = period.retreat(period.start_of(issued_at), overlap)?;
    let mut windows = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let window = window_from(start, period)?;

        start = window.valid_to.to_zoned(TimeZone::UTC).date();
        windows.push(window);
    }

    Ok(windows)
}

/// Whether a window is still redeemable at `now`, tolerating `overlap`
/// trailing periods after its nominal end. The boundary is inclusive.
///
/// # Errors
///
/// Returns an error when the grace boundary is outside the supported range.
pub fn is_still_valid(
    window_end: Timestamp,
    period: &CredentialPeriod,
    overlap: u32,
    now: Timestamp,
) -> Result<bool, IntervalError> {
    Ok(now <= period.advance(window_end, overlap)?)
}

/// Parse an ISO-8601 duration (`P[n]Y[n]M[n]W[n]D[T[n]H[n]M[n]S]`).
///
/// # Errors
///
/// Returns [`IntervalError::InvalidDuration`] for anything else.
pub fn parse_iso_duration(iso: &str) -> Result<Span, IntervalError> {
    let trimmed = iso.trim();

    if !trimmed.starts_with('P') || trimmed.len() < 3 {
        return Err(IntervalError::InvalidDuration(iso.to_string()));
    }

    trimmed
        .parse::<Span>()
        .map_err(|_parse_error| IntervalError::InvalidDuration(iso.to_string()))
}

/// Concrete length of an ISO-8601 duration when applied at `now`.
///
/// # Errors
///
/// Returns an error when the duration is malformed or overflows.
pub fn duration_from(now: Timestamp, iso: &str) -> Result<SignedDuration, IntervalError> {
    let span = parse_iso_duration(iso)?;
    let start = now.to_zoned(TimeZone::UTC);
    let end = start.checked_add(span)?;

    Ok(start.duration_until(&end))
}
