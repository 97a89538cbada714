//! Small helpers shared by callers of the registration API.

use chrono::{DateTime, Utc};

use crate::error::RegistrationError;

/// Unwraps a required argument, failing with the argument's name when absent.
pub fn require<T>(value: Option<T>, name: &'static str) -> Result<T, RegistrationError> {
    value.ok_or(RegistrationError::MissingArgument { name })
}

/// Applies `action` to every element of `source`. Both must be present.
pub fn for_each_required<I, F>(source: Option<I>, action: Option<F>) -> Result<(), RegistrationError>
where
    I: IntoIterator,
    F: FnMut(I::Item),
{
    let source = require(source, "source")?;
    let action = require(action, "action")?;
    source.into_iter().for_each(action);
    Ok(())
}

/// Converts seconds since the Unix epoch, including a fractional part, into a
/// UTC time. Returns `None` for non-finite or out-of-range values.
pub fn from_unix_timestamp(timestamp: f64) -> Option<DateTime<Utc>> {
    if !timestamp.is_finite() {
        return None;
    }
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1_000_000_000.0).round() as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos.min(999_999_999))
}

/// Whole seconds since the Unix epoch, rounded down.
pub fn to_unix_timestamp(date: DateTime<Utc>) -> f64 {
    date.timestamp() as f64
}
