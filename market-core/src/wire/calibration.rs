use crate::clock;
use crate::types::Timestamp;
use chrono::NaiveDate;
#[cfg(test)]
use chrono::Timelike;

/// Converts the wire format's wall-clock sending-time field into the
/// engine's monotonic [`Timestamp`] domain using a single offset captured
/// at startup (spec §4.4, §9: "does not mandate re-calibration").
#[derive(Debug, Clone, Copy)]
pub struct TimeCalibration {
    wall_clock_ns_at_capture: u64,
    monotonic_ns_at_capture: u64,
}

impl TimeCalibration {
    /// Captures the current wall-clock/monotonic pair as the calibration
    /// reference point. Call once at startup.
    pub fn capture() -> Self {
        let wall = chrono::Utc::now();
        let wall_clock_ns = wall.timestamp_nanos_opt().unwrap_or(0).max(0) as u64;
        TimeCalibration {
            wall_clock_ns_at_capture: wall_clock_ns,
            monotonic_ns_at_capture: clock::now().as_nanos(),
        }
    }

    /// Maps nanoseconds-since-UNIX-epoch into the engine's monotonic
    /// domain by adding the fixed offset recorded at [`capture`](Self::capture).
    pub fn to_engine_timestamp(&self, wall_clock_ns: u64) -> Timestamp {
        let delta = wall_clock_ns as i128 - self.wall_clock_ns_at_capture as i128;
        let mono = self.monotonic_ns_at_capture as i128 + delta;
        Timestamp::from_nanos(mono.max(0) as u64)
    }

    /// Maps an engine [`Timestamp`] (monotonic ns since process start) back
    /// to milliseconds since the UNIX epoch, using the same fixed offset
    /// captured at [`capture`](Self::capture) — the inverse of
    /// [`to_engine_timestamp`](Self::to_engine_timestamp). Used by the
    /// egress layer to report wall-clock times from purely monotonic book
    /// state (spec §6: `"timestamp": <uint64 ms since epoch>`).
    pub fn to_epoch_millis(&self, ts: Timestamp) -> u64 {
        let delta = ts.as_nanos() as i128 - self.monotonic_ns_at_capture as i128;
        let wall_ns = self.wall_clock_ns_at_capture as i128 + delta;
        (wall_ns.max(0) / 1_000_000) as u64
    }

    /// Parses the wire's `YYYYMMDD-HH:MM:SS.sss` UTC sending-time field and
    /// converts it straight to the engine's [`Timestamp`] domain.
    pub fn parse_sending_time(&self, bytes: &[u8]) -> Option<Timestamp> {
        let text = std::str::from_utf8(bytes).ok()?;
        let (date_part, time_part) = text.split_once('-')?;

        if date_part.len() != 8 {
            return None;
        }
        let year: i32 = date_part[0..4].parse().ok()?;
        let month: u32 = date_part[4..6].parse().ok()?;
        let day: u32 = date_part[6..8].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;

        let (hms, millis_str) = time_part.split_once('.').unwrap_or((time_part, "0"));
        let mut hms_parts = hms.split(':');
        let hour: u32 = hms_parts.next()?.parse().ok()?;
        let minute: u32 = hms_parts.next()?.parse().ok()?;
        let second: u32 = hms_parts.next()?.parse().ok()?;
        let millis: u32 = millis_str.parse().ok()?;

        let time = date.and_hms_milli_opt(hour, minute, second, millis)?;
        let nanos = time.and_utc().timestamp_nanos_opt()?;
        if nanos < 0 {
            return None;
        }

        Some(self.to_engine_timestamp(nanos as u64))
    }

    /// Convenience accessor used by tests to check `hour()` round trips
    /// through `NaiveDateTime` without reaching into chrono directly.
    #[cfg(test)]
    fn sanity_hour(dt: chrono::NaiveDateTime) -> u32 {
        dt.hour()
    }
}
