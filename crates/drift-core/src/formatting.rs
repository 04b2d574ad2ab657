/// Round `value` to `decimals` places, halves away from zero.
///
/// # Examples
///
/// ```
/// use drift_core::formatting::round_to;
///
/// assert_eq!(round_to(3069.81839999, 4), 3069.8184);
/// assert_eq!(round_to(-1.23456, 2), -1.23);
/// assert_eq!(round_to(2.5, 0), 3.0);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Format a float the way a scripting-language REPL would: shortest
/// round-trip digits, always with a decimal point.
///
/// # Examples
///
/// ```
/// use drift_core::formatting::format_float;
///
/// assert_eq!(format_float(3069.8184), "3069.8184");
/// assert_eq!(format_float(120.0), "120.0");
/// assert_eq!(format_float(-0.5), "-0.5");
/// ```
pub fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    let s = value.to_string();
    if s.contains('.') || s.contains('e') {
        s
    } else {
        format!("{}.0", s)
    }
}

/// Render a list of labels as a quoted, bracketed list.
///
/// # Examples
///
/// ```
/// use drift_core::formatting::format_label_list;
///
/// assert_eq!(format_label_list(&["april_2024", "may_2024"]), "['april_2024', 'may_2024']");
/// assert_eq!(format_label_list::<&str>(&[]), "[]");
/// ```
pub fn format_label_list<T: std::fmt::Display>(labels: &[T]) -> String {
    let quoted: Vec<String> = labels.iter().map(|l| format!("'{}'", l)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Fixed-precision rendering for table cells; NaN shows as `"n/a"`.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return "n/a".to_string();
    }
    format!("{:.prec$}", value, prec = decimals)
}
