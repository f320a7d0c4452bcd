//! Numeric parsing and checked narrowing.

use crate::convert::ConvertFailure;
use crate::error::NumericOverflowError;
use crate::info::NumberKind;
use crate::value::Number;

/// Converts `number` to `kind`.
///
/// Integers are range checked; floats are truncated toward zero before the
/// range check. Narrowing `f64` to `f32` fails when a finite value becomes infinite.
///
/// # Examples
///
/// ```
/// use pw_bind::convert::convert_number;
/// use pw_bind::info::NumberKind;
/// use pw_bind::value::Number;
///
/// assert_eq!(convert_number(Number::I64(42), NumberKind::U8), Ok(Number::U8(42)));
/// assert_eq!(convert_number(Number::F64(-2.9), NumberKind::I32), Ok(Number::I32(-2)));
/// assert!(convert_number(Number::I32(300), NumberKind::U8).is_err());
/// ```
pub fn convert_number(number: Number, kind: NumberKind) -> Result<Number, NumericOverflowError> {
    if number.kind() == kind {
        return Ok(number);
    }
    let overflow = || NumericOverflowError {
        value: number.to_string(),
        target: kind,
    };

    let Some((min, max)) = kind.int_range() else {
        let value = number.to_f64();
        return match kind {
            NumberKind::F32 => {
                let narrowed = value as f32;
                if value.is_finite() && narrowed.is_infinite() {
                    Err(overflow())
                } else {
                    Ok(Number::F32(narrowed))
                }
            }
            _ => Ok(Number::F64(value)),
        };
    };

    let value = match number.to_i128() {
        Some(value) => value,
        None => {
            let value = number.to_f64().trunc();
            if !value.is_finite() || value < min as f64 || value > max as f64 {
                return Err(overflow());
            }
            value as i128
        }
    };
    if value < min || value > max {
        return Err(overflow());
    }
    Ok(Number::from_i128_unchecked(value, kind))
}

/// Parses `text` as a number of `kind`.
///
/// All whitespace is ignored. Integer kinds accept an optional sign and the
/// hex prefixes `0x`, `0X` and `#`. A well-formed integer outside the range
/// of `kind` is an overflow, not an invalid input.
pub fn parse_number(text: &str, kind: NumberKind) -> Result<Number, ConvertFailure> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let invalid = || ConvertFailure::Invalid(format!("cannot parse `{text}` as `{kind}`"));
    let overflow = || {
        ConvertFailure::Overflow(NumericOverflowError {
            value: compact.clone(),
            target: kind,
        })
    };

    let Some((min, max)) = kind.int_range() else {
        return match kind {
            NumberKind::F32 => compact.parse().map(Number::F32).map_err(|_| invalid()),
            _ => compact.parse().map(Number::F64).map_err(|_| invalid()),
        };
    };

    let (negative, unsigned) = match compact.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, compact.strip_prefix('+').unwrap_or(&compact)),
    };
    let (radix, digits) = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
        .or_else(|| unsigned.strip_prefix('#'))
    {
        Some(hex) => (16, hex),
        None => (10, unsigned),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }

    let magnitude = i128::from_str_radix(digits, radix).map_err(|_| overflow())?;
    let value = if negative { -magnitude } else { magnitude };
    if value < min || value > max {
        return Err(overflow());
    }
    Ok(Number::from_i128_unchecked(value, kind))
}
