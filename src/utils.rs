use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Checks whether a token is a plain decimal number.
///
/// Accepts optional sign, optional fraction and optional exponent
/// (`-1.5e-3`, `.25`, `+7`). Word spellings that Rust's float parser
/// would accept (`inf`, `NaN`) are rejected, since in an export those
/// are annotation text, not data.
pub fn is_float_token(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() {
        return false;
    }

    let first = match s.chars().next() {
        Some(c) => c,
        None => return false,
    };
    if !(first.is_ascii_digit() || first == '+' || first == '-' || first == '.') {
        return false;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return false;
    }

    s.parse::<f64>().is_ok()
}

/// Parses one data cell.
///
/// `*` and the empty cell are LabChart's missing-value markers and map to
/// NaN. Any other non-numeric content yields `None` so the caller can tell
/// "missing sample" apart from "not a sample row at all".
pub fn parse_cell(s: &str) -> Option<f64> {
    let s = s.trim();
    if s == "*" || s.is_empty() {
        return Some(f64::NAN);
    }
    if is_float_token(s) {
        s.parse().ok()
    } else {
        None
    }
}

/// Parses the leading whitespace-separated token as a float.
pub fn leading_float(s: &str) -> Option<f64> {
    let token = s.split_whitespace().next()?;
    if is_float_token(token) {
        token.parse().ok()
    } else {
        None
    }
}

/// Removes the `#*` comment sentinel and surrounding whitespace from a label.
pub fn strip_sentinel(s: &str) -> &str {
    let t = s.trim();
    match t.strip_prefix(crate::COMMENT_SENTINEL) {
        Some(rest) => rest.trim_start(),
        None => t,
    }
}

/// Parses an `Interval=` header value into seconds.
///
/// LabChart writes the sampling interval as a number with an optional unit
/// suffix, e.g. `0.001 s` or `1 ms`. An unknown or absent unit is read as
/// seconds. Returns `None` for values that are not positive finite numbers,
/// letting the caller fall back to deriving the interval from the data.
pub fn parse_interval(s: &str) -> Option<f64> {
    let mut parts = s.split_whitespace();
    let token = parts.next()?;
    if !is_float_token(token) {
        return None;
    }
    let value: f64 = token.parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    let scale = match parts.next() {
        None => 1.0,
        Some(unit) => match unit.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
            "ms" | "msec" => 1e-3,
            "µs" | "us" | "usec" => 1e-6,
            "min" => 60.0,
            "hr" | "h" => 3600.0,
            _ => 1.0,
        },
    };

    Some(value * scale)
}

/// Converts an Excel serial date (days since 1899-12-30) to a date-time.
///
/// This is the encoding of the `ExcelDateTime=` header field. Sub-day
/// precision is kept to the millisecond, which is finer than the field
/// itself carries.
pub fn excel_to_datetime(days: f64) -> Option<NaiveDateTime> {
    // Anything outside a ±10000-year window is a corrupt field.
    if !days.is_finite() || days.abs() > 4_000_000.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (days * 86_400_000.0).round() as i64;
    base.checked_add_signed(Duration::milliseconds(millis))
}
