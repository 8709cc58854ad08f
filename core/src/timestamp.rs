//! Fixed-width `YYYYMMDDHHMMSS` timestamps.
//!
//! The wire format carries no timezone. Every timestamp is interpreted as
//! UTC, both when parsing and when writing it back out, so a decoded value
//! always re-serializes to the exact string it came from.
//!
//! Inside a response body the layout error travels through serde as a plain
//! message. `decode_body` records the adapter's own error on the decoding
//! thread so the caller still receives `AquaError::Format` for it.

use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AquaError, Result};

/// `chrono` layout of the wire format.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

const TIMESTAMP_LEN: usize = 14;

thread_local! {
    static BODY_FORMAT_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// A revision timestamp, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Parse the wire format. Surrounding quote characters are ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let digits = raw.trim_matches('"');
        if digits.len() != TIMESTAMP_LEN || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AquaError::Format(format!(
                "timestamp {digits:?} is not 14 digits in YYYYMMDDHHMMSS layout"
            )));
        }
        let naive = NaiveDateTime::parse_from_str(digits, TIMESTAMP_FORMAT)
            .map_err(|e| AquaError::Format(format!("timestamp {digits:?}: {e}")))?;
        Ok(Self(Utc.from_utc_datetime(&naive)))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl FromStr for Timestamp {
    type Err = AquaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(|err| {
            if let AquaError::Format(msg) = &err {
                BODY_FORMAT_ERROR.with(|slot| *slot.borrow_mut() = Some(msg.clone()));
            }
            de::Error::custom(err)
        })
    }
}

/// Decode a JSON body, reporting a malformed timestamp as `Format` and any
/// other mismatch as `Decode`.
pub(crate) fn decode_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    BODY_FORMAT_ERROR.with(|slot| slot.borrow_mut().take());
    let decoded = serde_json::from_str(body);
    let format_error = BODY_FORMAT_ERROR.with(|slot| slot.borrow_mut().take());
    decoded.map_err(|e| match format_error {
        Some(msg) => AquaError::Format(format!("{msg} at line {} column {}", e.line(), e.column())),
        None => AquaError::Decode(e),
    })
}
