//! Timestamps and time spans as stored text.
//!
//! Instants travel as RFC 3339 text and spans as unit-suffixed literals
//! ("1h2m3.5s", "500ms", "0s"). Struct fields opt in with the serde
//! modules:
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Session {
//!     #[serde(with = "brine::stamp::rfc3339")]
//!     started: OffsetDateTime,
//!     #[serde(with = "brine::stamp::duration")]
//!     timeout: Duration,
//! }
//! ```
//!
//! Top-level values use the [`Timestamp`] and [`Period`] wrappers instead.

use std::ops::Deref;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;

use crate::error::{Error, Result};

/// An instant stored as RFC 3339 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(pub OffsetDateTime);

impl From<OffsetDateTime> for Timestamp {
    fn from(value: OffsetDateTime) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for OffsetDateTime {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

impl Deref for Timestamp {
    type Target = OffsetDateTime;

    fn deref(&self) -> &OffsetDateTime {
        &self.0
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        rfc3339::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        rfc3339::deserialize(deserializer).map(Timestamp)
    }
}

/// A span of time stored as a duration literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period(pub Duration);

impl From<Duration> for Period {
    fn from(value: Duration) -> Self {
        Self(value)
    }
}

impl From<Period> for Duration {
    fn from(value: Period) -> Self {
        value.0
    }
}

impl Deref for Period {
    type Target = Duration;

    fn deref(&self) -> &Duration {
        &self.0
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        duration::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        duration::deserialize(deserializer).map(Period)
    }
}

/// Serde module for `OffsetDateTime` fields stored as RFC 3339 text.
pub mod rfc3339 {
    use serde::de::{Error as _, Unexpected};
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(
        value: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let text = value.format(&Rfc3339).map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&text, &Rfc3339).map_err(|_| {
            D::Error::invalid_value(Unexpected::Str(&text), &"an RFC 3339 timestamp")
        })
    }
}

/// Serde module for `std::time::Duration` fields stored as literals.
pub mod duration {
    use serde::de::{Error as _, Unexpected};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_duration(&text)
            .map_err(|_| D::Error::invalid_value(Unexpected::Str(&text), &"duration"))
    }
}

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

fn with_fraction(whole: u128, frac: u128, width: usize) -> String {
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{frac:0width$}");
    let digits = digits.trim_end_matches('0');
    format!("{whole}.{digits}")
}

/// Format a span as a literal: sub-second spans pick ns, µs, or ms; longer
/// spans spell hours, minutes, and seconds largest-first ("1h2m3.5s").
pub fn format_duration(value: Duration) -> String {
    let nanos = value.as_nanos();
    if nanos == 0 {
        return "0s".to_owned();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!(
            "{}µs",
            with_fraction(nanos / NANOS_PER_MICRO, nanos % NANOS_PER_MICRO, 3)
        );
    }
    if nanos < NANOS_PER_SECOND {
        return format!(
            "{}ms",
            with_fraction(nanos / NANOS_PER_MILLI, nanos % NANOS_PER_MILLI, 6)
        );
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
    let seconds = with_fraction(
        (nanos % NANOS_PER_MINUTE) / NANOS_PER_SECOND,
        nanos % NANOS_PER_SECOND,
        9,
    );
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Parse a duration literal: decimal numbers with the unit suffixes ns,
/// us/µs, ms, s, m, h, in any combination ("90m", "1h30m", "1.5s").
/// The empty string and "0" are zero.
pub fn parse_duration(text: &str) -> Result<Duration> {
    if text.is_empty() || text == "0" {
        return Ok(Duration::ZERO);
    }
    let err = || Error::parse(text, "duration");

    let mut total: u128 = 0;
    let mut rest = text;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .ok_or_else(err)?;
        if number_len == 0 {
            return Err(err());
        }
        let (number, tail) = rest.split_at(number_len);

        let (unit_nanos, unit_len) = if tail.starts_with("ns") {
            (1, 2)
        } else if tail.starts_with("us") {
            (NANOS_PER_MICRO, 2)
        } else if tail.starts_with("µs") {
            (NANOS_PER_MICRO, "µs".len())
        } else if tail.starts_with("μs") {
            (NANOS_PER_MICRO, "μs".len())
        } else if tail.starts_with("ms") {
            (NANOS_PER_MILLI, 2)
        } else if tail.starts_with('s') {
            (NANOS_PER_SECOND, 1)
        } else if tail.starts_with('m') {
            (NANOS_PER_MINUTE, 1)
        } else if tail.starts_with('h') {
            (NANOS_PER_HOUR, 1)
        } else {
            return Err(err());
        };

        let (int_part, frac_part) = match number.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (number, None),
        };
        if int_part.is_empty() && frac_part.map_or(true, str::is_empty) {
            return Err(err());
        }

        let mut part: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| err())?
        };
        part = part.checked_mul(unit_nanos).ok_or_else(err)?;

        if let Some(frac) = frac_part {
            // Each fractional digit scales the unit down one decimal place;
            // digits finer than a nanosecond truncate.
            let mut scale = unit_nanos;
            let mut add: u128 = 0;
            for ch in frac.chars() {
                let digit = ch.to_digit(10).ok_or_else(err)? as u128;
                scale /= 10;
                add += digit * scale;
            }
            part = part.checked_add(add).ok_or_else(err)?;
        }

        total = total.checked_add(part).ok_or_else(err)?;
        rest = &tail[unit_len..];
    }

    let seconds = total / NANOS_PER_SECOND;
    if seconds > u128::from(u64::MAX) {
        return Err(err());
    }
    Ok(Duration::new(seconds as u64, (total % NANOS_PER_SECOND) as u32))
}
