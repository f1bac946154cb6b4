//! Output formatting shared by the text and CSV emitting tools.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Formats a float with eight significant digits, trailing zeros trimmed.
pub fn float8(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{}", value);
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (7 - magnitude).max(0) as usize;
    let mut text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    text
}

/// The continental decimal comma, applied after formatting.
pub fn with_decimal_comma(text: &str) -> String {
    text.replace('.', ",")
}

/// GPS time values count milliseconds from the start of the GPS week
/// (Sunday 00:00:00). 2012-01-01 is a known Sunday, which gives the value a
/// weekday and a time of day.
pub fn gps_week_time(milliseconds: u32) -> NaiveDateTime {
    let epoch = NaiveDate::from_ymd_opt(2012, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    epoch + Duration::milliseconds(i64::from(milliseconds))
}

/// `"Sun 12:33:02.500"` style display of a GPS week time.
pub fn weekday_time(milliseconds: u32) -> String {
    let time = gps_week_time(milliseconds);
    format!("{} {}", time.weekday(), time.time())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_significant_digits() {
        assert_eq!(float8(0.0), "0");
        assert_eq!(float8(1.5), "1.5");
        assert_eq!(float8(52.123456789), "52.123457");
        assert_eq!(float8(-12.3), "-12.3");
        assert_eq!(float8(0.000012345678), "0.000012345678");
        assert_eq!(float8(123456789.0), "123456789");
    }

    #[test]
    fn decimal_comma() {
        assert_eq!(with_decimal_comma("1.25"), "1,25");
        assert_eq!(with_decimal_comma("10"), "10");
    }

    #[test]
    fn week_time_starts_on_sunday() {
        assert_eq!(weekday_time(0), "Sun 00:00:00");
        assert_eq!(weekday_time(86_400_000), "Mon 00:00:00");
        assert_eq!(weekday_time(45_182_500), "Sun 12:33:02.500");
    }
}
