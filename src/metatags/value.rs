//! Metatag value coercion
//!
//! Range syntax shared by the numeric metatags:
//!
//! | value      | meaning            |
//! |------------|--------------------|
//! | `5`        | equal              |
//! | `>5` `>=5` | greater (or equal) |
//! | `<5` `<=5` | less (or equal)    |
//! | `1..5`     | between, inclusive |
//! | `..5` `5..`| open-ended         |
//! | `1,3,5`    | any of             |
//!
//! Every coercion failure is an `InvalidMetatagValue` naming the metatag.

use byte_unit::Byte;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use super::MAX_LIST_ITEMS;
use crate::query::error::{QueryError, Result};
use crate::query::types::RangeValue;

/// Tolerance applied to equality on approximate measurements
const FUDGE_FACTOR: f64 = 0.05;

/// Parse a range, converting each operand with `operand`
fn parse_range_with<T>(
    metatag: &str,
    value: &str,
    expected: &str,
    operand: impl Fn(&str) -> Option<T>,
) -> Result<RangeValue<T>> {
    let invalid = || QueryError::invalid(metatag, value, format!("expected {expected}"));
    let parse = |s: &str| operand(s.trim()).ok_or_else(invalid);

    let range = if let Some(rest) = value.strip_prefix(">=") {
        RangeValue::Gte(parse(rest)?)
    } else if let Some(rest) = value.strip_prefix("<=") {
        RangeValue::Lte(parse(rest)?)
    } else if let Some(rest) = value.strip_prefix('>') {
        RangeValue::Gt(parse(rest)?)
    } else if let Some(rest) = value.strip_prefix('<') {
        RangeValue::Lt(parse(rest)?)
    } else if let Some((lo, hi)) = value.split_once("..") {
        match (lo.trim().is_empty(), hi.trim().is_empty()) {
            (true, true) => return Err(invalid()),
            (true, false) => RangeValue::Lte(parse(hi)?),
            (false, true) => RangeValue::Gte(parse(lo)?),
            (false, false) => RangeValue::Between(parse(lo)?, parse(hi)?),
        }
    } else if value.contains(',') {
        let items = value
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .take(MAX_LIST_ITEMS)
            .map(parse)
            .collect::<Result<Vec<_>>>()?;
        if items.is_empty() {
            return Err(invalid());
        }
        RangeValue::In(items)
    } else {
        RangeValue::Eq(parse(value)?)
    };
    Ok(range)
}

/// Widen equality into a between, for values that are never exact
fn fudge(range: RangeValue<f64>) -> RangeValue<f64> {
    match range {
        RangeValue::Eq(v) => {
            let (a, b) = (v * (1.0 - FUDGE_FACTOR), v * (1.0 + FUDGE_FACTOR));
            RangeValue::Between(a.min(b), a.max(b))
        }
        other => other,
    }
}

/// # Errors
/// Returns `QueryError::InvalidMetatagValue` if `value` is not an integer.
pub fn parse_int(metatag: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| QueryError::invalid(metatag, value, "expected an integer"))
}

/// # Errors
/// Returns `QueryError::InvalidMetatagValue` on malformed ranges or
/// non-integer operands.
pub fn parse_int_range(metatag: &str, value: &str) -> Result<RangeValue<i64>> {
    parse_range_with(metatag, value, "an integer or integer range", |s| s.parse().ok())
}

/// # Errors
/// Returns `QueryError::InvalidMetatagValue` on malformed ranges or
/// non-numeric operands.
pub fn parse_float_range(metatag: &str, value: &str) -> Result<RangeValue<f64>> {
    parse_range_with(metatag, value, "a number or range", parse_finite)
}

/// Float range where equality means within five percent
///
/// # Errors
/// Same as [`parse_float_range`].
pub fn parse_fudged_float_range(metatag: &str, value: &str) -> Result<RangeValue<f64>> {
    parse_float_range(metatag, value).map(fudge)
}

/// Aspect ratio, given as a decimal or as `width:height`, rounded to two
/// decimals
///
/// ```
/// use tagq::metatags::value::parse_ratio_range;
/// use tagq::query::RangeValue;
///
/// assert_eq!(parse_ratio_range("ratio", "16:9").unwrap(), RangeValue::Eq(1.78));
/// assert_eq!(parse_ratio_range("ratio", ">=1").unwrap(), RangeValue::Gte(1.0));
/// ```
///
/// # Errors
/// Returns `QueryError::InvalidMetatagValue` on malformed ratios, including a
/// zero height.
pub fn parse_ratio_range(metatag: &str, value: &str) -> Result<RangeValue<f64>> {
    parse_range_with(metatag, value, "a ratio like 16:9 or 1.5", |s| {
        let ratio = match s.split_once(':') {
            Some((w, h)) => {
                let (w, h) = (parse_finite(w)?, parse_finite(h)?);
                if h == 0.0 {
                    return None;
                }
                w / h
            }
            None => parse_finite(s)?,
        };
        Some((ratio * 100.0).round() / 100.0)
    })
}

/// File size in bytes, accepting `kb`/`mb`/`gb` suffixes as binary units
///
/// Equality means within five percent.
///
/// # Errors
/// Returns `QueryError::InvalidMetatagValue` on malformed sizes.
pub fn parse_filesize_range(metatag: &str, value: &str) -> Result<RangeValue<i64>> {
    let range = parse_range_with(metatag, value, "a size like 300kb or 1.5mb", parse_bytes)?;
    Ok(match range {
        RangeValue::Eq(bytes) => {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let widen = |factor: f64| (bytes as f64 * factor).round() as i64;
            RangeValue::Between(widen(1.0 - FUDGE_FACTOR), widen(1.0 + FUDGE_FACTOR))
        }
        other => other,
    })
}

fn parse_bytes(s: &str) -> Option<i64> {
    let lower = s.to_ascii_lowercase();
    let binary = match lower.strip_suffix('b') {
        Some(number) if number.ends_with(['k', 'm', 'g', 't']) => format!("{number}ib"),
        _ => lower,
    };
    let byte = Byte::parse_str(&binary, true).ok()?;
    i64::try_from(byte.as_u64()).ok()
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Date range relative to `now`
///
/// Accepts `YYYY-MM-DD` dates in any range form, and the keywords `today`,
/// `yesterday`, `week`, `month`, `year` and `decade`. A bare date matches
/// that whole day.
///
/// # Errors
/// Returns `QueryError::InvalidMetatagValue` on malformed dates.
pub fn parse_date_range(metatag: &str, value: &str, now: DateTime<Utc>) -> Result<RangeValue<DateTime<Utc>>> {
    let invalid = || QueryError::invalid(metatag, value, "date out of range");
    let today = start_of_day(now.date_naive()).ok_or_else(invalid)?;
    let ago = |days: i64| {
        TimeDelta::try_days(days)
            .and_then(|delta| now.checked_sub_signed(delta))
            .ok_or_else(invalid)
    };

    let range = match value.to_ascii_lowercase().as_str() {
        "today" => RangeValue::Gte(today),
        "yesterday" => RangeValue::Between(
            today.checked_sub_signed(TimeDelta::days(1)).ok_or_else(invalid)?,
            today,
        ),
        "week" => RangeValue::Gte(ago(7)?),
        "month" => RangeValue::Gte(ago(30)?),
        "year" => RangeValue::Gte(ago(365)?),
        "decade" => RangeValue::Gte(ago(3650)?),
        _ => {
            let range = parse_range_with(metatag, value, "a date like 2024-01-31", |s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(start_of_day)
            })?;
            match range {
                RangeValue::Eq(day) => RangeValue::Between(
                    day,
                    day.checked_add_signed(TimeDelta::days(1)).ok_or_else(invalid)?,
                ),
                other => other,
            }
        }
    };
    Ok(range)
}

/// Duration like `3d`, `12h` or `2mo`; a bare number is days
fn parse_age(s: &str) -> Option<TimeDelta> {
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let n: i64 = number.parse().ok()?;
    match unit.to_ascii_lowercase().as_str() {
        "s" => TimeDelta::try_seconds(n),
        "mi" => TimeDelta::try_minutes(n),
        "h" => TimeDelta::try_hours(n),
        "" | "d" => TimeDelta::try_days(n),
        "w" => TimeDelta::try_weeks(n),
        "mo" => TimeDelta::try_days(n.checked_mul(30)?),
        "y" => TimeDelta::try_days(n.checked_mul(365)?),
        _ => None,
    }
}

/// Age range, turned into a range over creation time
///
/// Older means earlier, so comparisons flip: `age:<1d` is anything created
/// after one day ago.
///
/// # Errors
/// Returns `QueryError::InvalidMetatagValue` on malformed durations.
pub fn parse_age_range(metatag: &str, value: &str, now: DateTime<Utc>) -> Result<RangeValue<DateTime<Utc>>> {
    parse_range_with(metatag, value, "an age like 3d, 12h or 2mo", parse_age)?
        .try_map(|delta| now.checked_sub_signed(delta))
        .map(RangeValue::invert)
        .ok_or_else(|| QueryError::invalid(metatag, value, "age out of range"))
}

/// `true` (any case) is true, anything else false
#[must_use]
pub fn parse_boolean(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Collapse runs of `*` into one
#[must_use]
pub fn collapse_wildcards(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if !(c == '*' && out.ends_with('*')) {
            out.push(c);
        }
    }
    out
}
