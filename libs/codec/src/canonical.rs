//! Canonical text forms for integer, decimal, time and duration values
//!
//! Several inputs are accepted for each of these kinds but producers must
//! emit exactly one form:
//!
//! | Kind     | Canonical form                                                    |
//! |----------|-------------------------------------------------------------------|
//! | integer  | no leading zeros, no `-0`                                         |
//! | decimal  | no leading/trailing zeros; `1.5e7` style when ≤1e-6 or ≥1e6       |
//! | time     | UTC with `Z`, `T` always present, fractional seconds trimmed      |
//! | duration | decimal seconds, trailing zeros trimmed, `s` suffix               |

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use schema::{is_decimal, is_integer, Kind, ValidationError};

use crate::error::{CodecError, CodecResult};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Exponential notation threshold: |v| ≥ 10^6
const MAX_PLAIN_EXPONENT: i32 = 6;
/// Exponential notation threshold: |v| ≤ 10^-6
const MIN_PLAIN_EXPONENT: i32 = -6;

/// Strip leading zeros and normalize negative zero
pub fn canonical_integer(s: &str) -> CodecResult<String> {
    if !is_integer(s) {
        return Err(ValidationError::invalid_format(
            Kind::IntegerString,
            s,
            "expected a base-10 integer of at most 100 digits",
        )
        .into());
    }

    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let digits = digits.trim_start_matches('0');

    Ok(match (negative, digits.is_empty()) {
        (_, true) => "0".to_string(),
        (true, false) => format!("-{digits}"),
        (false, false) => digits.to_string(),
    })
}

/// Canonicalize a decimal string
///
/// The value is reduced to `digits × 10^exponent` with no leading or trailing
/// zeros in `digits`, then rendered plainly or in lowercase-`e` exponential
/// notation depending on its magnitude.
pub fn canonical_decimal(s: &str) -> CodecResult<String> {
    if !is_decimal(s) {
        return Err(ValidationError::invalid_format(
            Kind::DecimalString,
            s,
            "expected a base-10 decimal number",
        )
        .into());
    }

    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (mantissa, mut exponent) = match rest.find(['e', 'E']) {
        Some(idx) => {
            let exp: i32 = rest[idx + 1..].parse().map_err(|_| {
                ValidationError::invalid_format(Kind::DecimalString, s, "malformed exponent")
            })?;
            (&rest[..idx], exp)
        }
        None => (rest, 0),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    exponent -= frac_part.len() as i32;

    let all_digits = format!("{int_part}{frac_part}");
    let trimmed_leading = all_digits.trim_start_matches('0');
    if trimmed_leading.is_empty() {
        return Ok("0".to_string());
    }
    let digits = trimmed_leading.trim_end_matches('0');
    exponent += (trimmed_leading.len() - digits.len()) as i32;

    // exponent of the leading digit in scientific notation
    let scientific = exponent + digits.len() as i32 - 1;
    let exponential = scientific >= MAX_PLAIN_EXPONENT
        || scientific < MIN_PLAIN_EXPONENT
        || (scientific == MIN_PLAIN_EXPONENT && digits == "1");

    let body = if exponential {
        let (lead, tail) = digits.split_at(1);
        if tail.is_empty() {
            format!("{lead}e{scientific}")
        } else {
            format!("{lead}.{tail}e{scientific}")
        }
    } else if exponent >= 0 {
        format!("{digits}{}", "0".repeat(exponent as usize))
    } else {
        let point = digits.len() as i32 + exponent;
        if point > 0 {
            let (whole, frac) = digits.split_at(point as usize);
            format!("{whole}.{frac}")
        } else {
            format!("0.{}{digits}", "0".repeat((-point) as usize))
        }
    };

    let canonical = if negative { format!("-{body}") } else { body };
    if !is_decimal(&canonical) {
        return Err(CodecError::OutOfRange {
            kind: Kind::DecimalString,
            reason: format!("{s} has no canonical form within the decimal grammar"),
        });
    }
    Ok(canonical)
}

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SS[.fffffffff]Z`
pub fn format_time(t: &DateTime<Utc>) -> String {
    let base = t.format("%Y-%m-%dT%H:%M:%S");
    let nanos = t.timestamp_subsec_nanos();
    if nanos == 0 {
        format!("{base}Z")
    } else {
        let frac = format!("{nanos:09}");
        format!("{base}.{}Z", frac.trim_end_matches('0'))
    }
}

/// Parse an ISO 8601 timestamp with any offset, a zone-less date-time
/// (taken as UTC) or a bare date (midnight UTC)
pub fn parse_time(s: &str) -> CodecResult<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(t.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(t.and_utc());
        }
    }
    Err(CodecError::invalid_json(
        Kind::Time,
        format!("{s:?} is not an ISO 8601 timestamp"),
    ))
}

/// Nanoseconds since the UNIX epoch, failing outside the i64 range
pub fn time_to_nanos(t: &DateTime<Utc>) -> CodecResult<i64> {
    t.timestamp_nanos_opt()
        .ok_or_else(|| CodecError::out_of_range(Kind::Time, "outside ±2^63 nanoseconds"))
}

pub fn duration_to_nanos(d: &TimeDelta) -> CodecResult<i64> {
    d.num_nanoseconds()
        .ok_or_else(|| CodecError::out_of_range(Kind::Duration, "outside ±2^63 nanoseconds"))
}

/// Render a duration as decimal seconds with an `s` suffix
pub fn format_duration(d: &TimeDelta) -> CodecResult<String> {
    let nanos = duration_to_nanos(d)?;
    let sign = if nanos < 0 { "-" } else { "" };
    let abs = i128::from(nanos).unsigned_abs();
    let secs = abs / NANOS_PER_SECOND;
    let frac = abs % NANOS_PER_SECOND;
    if frac == 0 {
        Ok(format!("{sign}{secs}s"))
    } else {
        let frac = format!("{frac:09}");
        Ok(format!("{sign}{secs}.{}s", frac.trim_end_matches('0')))
    }
}

/// Parse `-?[0-9]+(\.[0-9]{1,9})?s`
pub fn parse_duration(s: &str) -> CodecResult<TimeDelta> {
    let invalid = || CodecError::invalid_json(Kind::Duration, format!("{s:?} is not a duration"));

    let body = s.strip_suffix('s').ok_or_else(invalid)?;
    let (negative, body) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let (secs, frac) = body.split_once('.').unwrap_or((body, ""));

    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if secs.is_empty() || !all_digits(secs) || !all_digits(frac) || frac.len() > 9 {
        return Err(invalid());
    }
    if body.contains('.') && frac.is_empty() {
        return Err(invalid());
    }

    let out_of_range = || CodecError::out_of_range(Kind::Duration, "outside ±2^63 nanoseconds");
    let secs: u128 = secs.parse().map_err(|_| out_of_range())?;
    let frac_nanos: u128 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<9}").parse().map_err(|_| invalid())?
    };

    let magnitude = secs
        .checked_mul(NANOS_PER_SECOND)
        .and_then(|n| n.checked_add(frac_nanos))
        .and_then(|n| i128::try_from(n).ok())
        .ok_or_else(out_of_range)?;
    let signed = if negative { -magnitude } else { magnitude };
    let nanos = i64::try_from(signed).map_err(|_| out_of_range())?;

    Ok(TimeDelta::nanoseconds(nanos))
}
