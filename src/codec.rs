//! Scalar decoding for accounting report fields
//!
//! Report tools emit two kinds of scalar that need normalizing:
//!
//! - unit-suffixed integers such as `5K` or `10G`, decoded into base units
//! - elapsed durations such as `01:02:03`, `1-00:00:00` or `850:00:00.25`,
//!   decoded into fractional minutes
//!
//! Both decoders have a lenient form that never fails. Durations also have a
//! strict form, [`ScalarCodec::parse_duration_minutes`], which reports every
//! malformed shape as a [`ScalarError`]; the lenient form maps every such
//! error to `0.0`.

use crate::error::ScalarError;
use chrono::{NaiveTime, Timelike};
use tracing::debug;

const SECONDS_PER_DAY: u64 = 86_400;

/// Binary multipliers accepted after a unit integer.
pub const UNIT_MULTIPLIERS: [(char, u64); 4] = [
    ('K', 1 << 10),
    ('M', 1 << 20),
    ('G', 1 << 30),
    ('T', 1 << 40),
];

/// Decodes unit integers and durations found in report lines
pub struct ScalarCodec;

impl ScalarCodec {
    /// Look up the multiplier for a unit suffix
    pub fn unit_multiplier(suffix: char) -> Option<u64> {
        UNIT_MULTIPLIERS
            .iter()
            .find(|(unit, _)| *unit == suffix)
            .map(|(_, factor)| *factor)
    }

    /// Decode a unit-suffixed integer such as `4`, `5K` or `10G`.
    ///
    /// Text that does not start with a digit decodes to 0. An unknown suffix
    /// is ignored and the leading digits are returned as-is.
    pub fn decode_unit_integer(text: &str) -> u64 {
        let text = text.trim();
        let digits_end = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());

        if digits_end == 0 {
            return 0;
        }

        let value: u64 = match text[..digits_end].parse() {
            Ok(value) => value,
            Err(_) => {
                debug!(input = text, "Unit integer out of range, decoding as 0");
                return 0;
            }
        };

        let multiplier = text[digits_end..]
            .chars()
            .next()
            .and_then(Self::unit_multiplier)
            .unwrap_or(1);

        value.saturating_mul(multiplier)
    }

    /// Decode a duration into minutes, returning `0.0` for anything malformed
    pub fn decode_duration_minutes(text: &str) -> f64 {
        match Self::parse_duration_minutes(text) {
            Ok(minutes) => minutes,
            Err(e) => {
                debug!(error = %e, "Malformed duration, decoding as 0");
                0.0
            }
        }
    }

    /// Parse `[D-]HH:MM:SS[.ffffff]` into minutes.
    ///
    /// Hours are not bounded to 24, so `850:00:00` is 51000 minutes.
    pub fn parse_duration_minutes(text: &str) -> Result<f64, ScalarError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ScalarError::duration(text, "empty duration"));
        }

        let (days, clock) = match text.split_once('-') {
            Some((days, clock)) => {
                let days: u64 = days
                    .parse()
                    .map_err(|_| ScalarError::duration(text, "day prefix is not an integer"))?;
                (days, clock)
            }
            None => (0, text),
        };

        let clock_seconds = Self::parse_clock_seconds(text, clock)?;
        let total_seconds = days.saturating_mul(SECONDS_PER_DAY) as f64 + clock_seconds;

        Ok(total_seconds / 60.0)
    }

    fn parse_clock_seconds(input: &str, clock: &str) -> Result<f64, ScalarError> {
        let format = if clock.contains('.') {
            "%H:%M:%S%.f"
        } else {
            "%H:%M:%S"
        };

        if let Ok(time) = NaiveTime::parse_from_str(clock, format) {
            return Ok(time.num_seconds_from_midnight() as f64
                + time.nanosecond() as f64 / 1_000_000_000.0);
        }

        // Hours of 24 or more are rejected by the time-of-day parser.
        let (whole, fraction) = match clock.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (clock, None),
        };

        let fields = whole
            .split(':')
            .map(|field| field.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ScalarError::duration(input, "clock field is not an integer"))?;

        let &[hours, minutes, seconds] = fields.as_slice() else {
            return Err(ScalarError::duration(input, "expected HH:MM:SS"));
        };

        let fraction = match fraction {
            Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
                format!("0.{digits}")
                    .parse::<f64>()
                    .map_err(|_| ScalarError::duration(input, "invalid fractional seconds"))?
            }
            Some(_) => return Err(ScalarError::duration(input, "invalid fractional seconds")),
            None => 0.0,
        };

        Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds as f64 + fraction)
    }

    /// Render minutes as `[D-]HH:MM:SS`, rounded to the nearest second
    pub fn format_duration(minutes: f64) -> String {
        let total_seconds = if minutes.is_finite() && minutes > 0.0 {
            (minutes * 60.0).round() as u64
        } else {
            0
        };

        let days = total_seconds / SECONDS_PER_DAY;
        let rest = total_seconds % SECONDS_PER_DAY;
        let clock = format!("{:02}:{:02}:{:02}", rest / 3600, (rest % 3600) / 60, rest % 60);

        if days > 0 {
            format!("{days}-{clock}")
        } else {
            clock
        }
    }
}
