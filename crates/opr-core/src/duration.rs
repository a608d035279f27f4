//! ISO 8601 duration parsing for work package time fields.
//!
//! The API reports `estimatedTime`, `derivedEstimatedTime` and `remainingTime`
//! as durations such as `PT8H30M`. Reports work in fractional hours, so only
//! the hour and minute components contribute to the result.

use thiserror::Error;

/// A duration string that does not follow `P[nY][nM][nW][nD][T[nH][nM][nS]]`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid ISO 8601 duration {input:?}: {reason}")]
pub struct FormatError {
    pub input: String,
    pub reason: &'static str,
}

impl FormatError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

const DATE_DESIGNATORS: [char; 4] = ['Y', 'M', 'W', 'D'];
const TIME_DESIGNATORS: [char; 3] = ['H', 'M', 'S'];

/// Parses an optional ISO 8601 duration into fractional hours.
///
/// Absent or blank input is zero hours.
pub fn parse_duration_hours(input: Option<&str>) -> Result<f64, FormatError> {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(0.0);
    };

    let Some(body) = raw.strip_prefix('P') else {
        return Err(FormatError::new(raw, "missing leading 'P'"));
    };

    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => {
            if time.is_empty() {
                return Err(FormatError::new(raw, "'T' without time components"));
            }
            (date, Some(time))
        }
        None => (body, None),
    };

    let date_components = parse_components(raw, date_part, &DATE_DESIGNATORS)?;
    let time_components = match time_part {
        Some(time) => parse_components(raw, time, &TIME_DESIGNATORS)?,
        None => Vec::new(),
    };

    if date_components.is_empty() && time_components.is_empty() {
        return Err(FormatError::new(raw, "no duration components"));
    }

    let mut hours = 0.0;
    for (designator, value) in time_components {
        match designator {
            'H' => hours += value,
            'M' => hours += value / 60.0,
            _ => {}
        }
    }
    Ok(hours)
}

/// Parses a duration field, logging and recovering from malformed values.
///
/// One bad record must not abort a report, so a [`FormatError`] becomes zero hours.
pub fn hours_or_zero(field: &str, input: Option<&str>) -> f64 {
    match parse_duration_hours(input) {
        Ok(hours) => hours,
        Err(err) => {
            tracing::warn!(field, error = %err, "treating malformed duration as zero hours");
            0.0
        }
    }
}

/// Splits `8H30M` style segments into `(designator, value)` pairs.
///
/// Designators must appear at most once and in the order given by `allowed`.
fn parse_components(
    raw: &str,
    segment: &str,
    allowed: &[char],
) -> Result<Vec<(char, f64)>, FormatError> {
    let mut components = Vec::new();
    let mut number = String::new();
    let mut next_allowed = 0;

    for ch in segment.chars() {
        if ch.is_ascii_digit() || ch == '.' || ch == ',' {
            number.push(if ch == ',' { '.' } else { ch });
            continue;
        }

        let Some(position) = allowed.iter().position(|&d| d == ch) else {
            return Err(FormatError::new(raw, "unexpected character"));
        };
        if position < next_allowed {
            return Err(FormatError::new(raw, "designator out of order or repeated"));
        }
        if number.is_empty() {
            return Err(FormatError::new(raw, "designator without a value"));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| FormatError::new(raw, "invalid number"))?;
        components.push((ch, value));
        number.clear();
        next_allowed = position + 1;
    }

    if !number.is_empty() {
        return Err(FormatError::new(raw, "value without a designator"));
    }
    Ok(components)
}
