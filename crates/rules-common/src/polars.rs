//! Polars `AnyValue` conversions.
//!
//! Operations read single cells out of collected frames when an aggregate
//! has to become a plain value (a row count, a distinct value set, a JSON
//! cell). Both conversions live here so every crate renders cells alike.

use polars::prelude::AnyValue;

/// Render a cell as text.
///
/// Null renders as the empty string and floats drop trailing zeros, so a
/// count read back as `Float64(3.0)` renders like the integer `3`.
///
/// # Examples
///
/// ```
/// use polars::prelude::AnyValue;
/// use rules_common::any_to_string;
///
/// assert_eq!(any_to_string(AnyValue::Null), "");
/// assert_eq!(any_to_string(AnyValue::Float64(3.0)), "3");
/// assert_eq!(any_to_string(AnyValue::String("AE")), "AE");
/// ```
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float32(v) => trim_float(f64::from(v)),
        AnyValue::Float64(v) => trim_float(v),
        other => match integer(&other) {
            Some(v) => v.to_string(),
            None => other.to_string(),
        },
    }
}

/// Read a cell as an integer.
///
/// Floats truncate and numeric strings parse after trimming; anything else,
/// including an unsigned value above `i64::MAX`, is `None`.
pub fn any_to_i64(value: AnyValue<'_>) -> Option<i64> {
    match value {
        AnyValue::Float32(v) => Some(v as i64),
        AnyValue::Float64(v) => Some(v as i64),
        AnyValue::String(s) => s.trim().parse().ok(),
        AnyValue::StringOwned(s) => s.trim().parse().ok(),
        other => integer(&other),
    }
}

fn integer(value: &AnyValue<'_>) -> Option<i64> {
    match *value {
        AnyValue::Int8(v) => Some(i64::from(v)),
        AnyValue::Int16(v) => Some(i64::from(v)),
        AnyValue::Int32(v) => Some(i64::from(v)),
        AnyValue::Int64(v) => Some(v),
        AnyValue::UInt8(v) => Some(i64::from(v)),
        AnyValue::UInt16(v) => Some(i64::from(v)),
        AnyValue::UInt32(v) => Some(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).ok(),
        _ => None,
    }
}

fn trim_float(v: f64) -> String {
    let text = v.to_string();
    if !text.contains('.') {
        return text;
    }
    match text.trim_end_matches('0').trim_end_matches('.') {
        "" | "-" | "-0" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_render_common_cells() {
        assert_eq!(any_to_string(AnyValue::Int64(-100)), "-100");
        assert_eq!(any_to_string(AnyValue::UInt32(0)), "0");
        assert_eq!(any_to_string(AnyValue::Float64(1.5)), "1.5");
        assert_eq!(any_to_string(AnyValue::Float64(-2.50)), "-2.5");
        assert_eq!(any_to_string(AnyValue::Float64(100.0)), "100");
        assert_eq!(any_to_string(AnyValue::Boolean(true)), "true");
    }

    #[test]
    fn integers_read_numbers_and_numeric_strings() {
        assert_eq!(any_to_i64(AnyValue::UInt32(7)), Some(7));
        assert_eq!(any_to_i64(AnyValue::Float64(3.9)), Some(3));
        assert_eq!(any_to_i64(AnyValue::String("  -100  ")), Some(-100));
        assert_eq!(any_to_i64(AnyValue::String("")), None);
        assert_eq!(any_to_i64(AnyValue::UInt64(u64::MAX)), None);
        assert_eq!(any_to_i64(AnyValue::Null), None);
    }
}
