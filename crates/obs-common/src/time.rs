//! Time handling for observation data.
//!
//! Observation files carry an analysis reference time encoded as an integer
//! `YYYYMMDDHH` attribute plus per-observation offsets in fractional hours.
//! This module reconstructs absolute timestamps from that pair and re-encodes
//! them into the integer `YYYYMMDD` / `HHMMSS` forms downstream consumers
//! expect.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ObsError, ObsResult};

/// The analysis time window.
///
/// An observation with timestamp `t` is inside the window iff
/// `begin < t && t <= end` (exclusive begin, inclusive end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { begin, end }
    }

    /// Window membership with the `(begin, end]` convention.
    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        t > &self.begin && t <= &self.end
    }
}

/// Reference epoch encoded as integer `YYYYMMDDHH`.
///
/// Example: April 15, 2018 at 00Z is `2018041500`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTime(pub i32);

impl ReferenceTime {
    /// Decode into an absolute timestamp.
    pub fn to_datetime(&self) -> ObsResult<DateTime<Utc>> {
        let encoded = self.0;
        let date = encoded / 100;
        let hour = encoded % 100;
        let year = date / 10000;
        let month = (date / 100) % 100;
        let day = date % 100;

        Utc.with_ymd_and_hms(year, month as u32, day as u32, hour as u32, 0, 0)
            .single()
            .ok_or(ObsError::InvalidReferenceTime(encoded))
    }

    /// Encode from an absolute timestamp (minutes and seconds are dropped).
    pub fn from_datetime(t: &DateTime<Utc>) -> Self {
        Self(t.year() * 1_000_000 + (t.month() * 10000 + t.day() * 100 + t.hour()) as i32)
    }

    /// Reference plus an offset in fractional hours.
    ///
    /// The offset is converted to whole seconds by truncation, matching the
    /// upstream files: -3.5 hours is exactly -12600 seconds.
    pub fn apply_offset_hours(&self, offset_hours: f32) -> ObsResult<DateTime<Utc>> {
        let reference = self.to_datetime()?;
        Ok(reference + Duration::seconds((offset_hours * 3600.0) as i64))
    }
}

/// Encode the date portion of a timestamp as integer `YYYYMMDD`.
pub fn date_encode(t: &DateTime<Utc>) -> i32 {
    t.year() * 10000 + (t.month() * 100 + t.day()) as i32
}

/// Encode the time portion of a timestamp as integer `HHMMSS`.
pub fn time_encode(t: &DateTime<Utc>) -> i32 {
    (t.hour() * 10000 + t.minute() * 100 + t.second()) as i32
}
