use std::time::Duration;

use crate::error::ValidationError;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
/// Fraction digits beyond this cannot change a nanosecond result.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parses durations such as `300ms`, `1.5s`, `1m30s` or `2h`. A bare `0`
/// is accepted; every other component needs a unit
/// (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`).
///
/// # Errors
///
/// Returns an error for an empty or malformed value, an unknown unit, or a
/// duration that overflows.
pub fn parse_duration_value(value: &str) -> Result<Duration, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }
    if value == "0" {
        return Ok(Duration::ZERO);
    }

    let mut rest = value;
    let mut total_nanos: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after_int) = rest.split_at(int_len);
        let (frac_part, after_frac) = match after_int.strip_prefix('.') {
            Some(stripped) => {
                let frac_len = stripped.bytes().take_while(u8::is_ascii_digit).count();
                stripped.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ValidationError::InvalidDurationFormat {
                value: value.to_owned(),
            });
        }

        let unit_len = after_frac
            .find(|ch: char| ch.is_ascii_digit() || ch == '.')
            .unwrap_or(after_frac.len());
        let (unit, remaining) = after_frac.split_at(unit_len);
        let unit_nanos = unit_nanos(unit, value)?;

        let component = component_nanos(int_part, frac_part, unit_nanos, value)?;
        total_nanos = total_nanos
            .checked_add(component)
            .ok_or(ValidationError::DurationOverflow)?;
        rest = remaining;
    }

    let nanos = u64::try_from(total_nanos).map_err(|_err| ValidationError::DurationOverflow)?;
    Ok(Duration::from_nanos(nanos))
}

fn unit_nanos(unit: &str, value: &str) -> Result<u128, ValidationError> {
    match unit {
        "ns" => Ok(1),
        "us" | "µs" | "μs" => Ok(NANOS_PER_MICRO),
        "ms" => Ok(NANOS_PER_MILLI),
        "s" => Ok(NANOS_PER_SEC),
        "m" => Ok(NANOS_PER_SEC.saturating_mul(60)),
        "h" => Ok(NANOS_PER_SEC.saturating_mul(3_600)),
        "" => Err(ValidationError::InvalidDurationFormat {
            value: value.to_owned(),
        }),
        other => Err(ValidationError::InvalidDurationUnit {
            unit: other.to_owned(),
        }),
    }
}

fn component_nanos(
    int_part: &str,
    frac_part: &str,
    unit_nanos: u128,
    value: &str,
) -> Result<u128, ValidationError> {
    let parse = |digits: &str| {
        digits
            .parse::<u64>()
            .map_err(|source| ValidationError::InvalidDurationNumber {
                value: value.to_owned(),
                source,
            })
    };

    let whole = if int_part.is_empty() { 0 } else { parse(int_part)? };
    let mut nanos = u128::from(whole)
        .checked_mul(unit_nanos)
        .ok_or(ValidationError::DurationOverflow)?;

    if !frac_part.is_empty() {
        let digits = frac_part.get(..MAX_FRACTION_DIGITS).unwrap_or(frac_part);
        let scale = u32::try_from(digits.len())
            .ok()
            .and_then(|len| 10_u128.checked_pow(len))
            .ok_or(ValidationError::DurationOverflow)?;
        let fraction = u128::from(parse(digits)?)
            .checked_mul(unit_nanos)
            .and_then(|scaled| scaled.checked_div(scale))
            .ok_or(ValidationError::DurationOverflow)?;
        nanos = nanos
            .checked_add(fraction)
            .ok_or(ValidationError::DurationOverflow)?;
    }
    Ok(nanos)
}

/// Splits `Key=Value` on the first `=`.
///
/// # Errors
///
/// Returns an error when there is no `=` or the key is empty.
pub fn parse_header(value: &str) -> Result<(String, String), ValidationError> {
    match value.split_once('=') {
        Some((key, header_value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), header_value.to_owned()))
        }
        Some(_) | None => Err(ValidationError::InvalidHeaderFormat {
            value: value.to_owned(),
        }),
    }
}
