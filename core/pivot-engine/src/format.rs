//! FILENAME: core/pivot-engine/src/format.rs
//! PURPOSE: Display formatting for aggregate cells.
//! CONTEXT: Measures are shown with thousands grouping and at most three
//! fraction digits, trailing zeros trimmed ("1,234.5", "250", "0.333").

/// Fraction digits kept when formatting a measure.
const MAX_FRACTION_DIGITS: usize = 3;

/// Formats an aggregate for display.
pub fn format_measure(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "NaN".to_string()
        } else if value > 0.0 {
            "∞".to_string()
        } else {
            "-∞".to_string()
        };
    }

    let rounded = format!("{:.prec$}", value, prec = MAX_FRACTION_DIGITS);
    let trimmed = if rounded.contains('.') {
        rounded.trim_end_matches('0').trim_end_matches('.')
    } else {
        rounded.as_str()
    };

    // "-0" after rounding tiny negatives.
    if trimmed == "-0" {
        return "0".to_string();
    }

    add_thousands_separator(trimmed)
}

/// Add thousands separators to a numeric string.
fn add_thousands_separator(s: &str) -> String {
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some((int, dec)) => (int, Some(dec)),
        None => (s, None),
    };

    let negative = integer_part.starts_with('-');
    let digits: String = integer_part.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut result = String::with_capacity(s.len() + digits.len() / 3 + 1);
    if negative {
        result.push('-');
    }

    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    if let Some(decimal) = decimal_part {
        result.push('.');
        result.push_str(decimal);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_measure() {
        assert_eq!(format_measure(0.0), "0");
        assert_eq!(format_measure(250.0), "250");
        assert_eq!(format_measure(1234.5), "1,234.5");
        assert_eq!(format_measure(1234567.0), "1,234,567");
        assert_eq!(format_measure(-9876.125), "-9,876.125");
        assert_eq!(format_measure(1.0 / 3.0), "0.333");
        assert_eq!(format_measure(-0.0001), "0");
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(add_thousands_separator("1234567"), "1,234,567");
        assert_eq!(add_thousands_separator("123"), "123");
        assert_eq!(add_thousands_separator("-1234.56"), "-1,234.56");
    }
}
