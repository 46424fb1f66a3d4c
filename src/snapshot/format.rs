//! Number formatting for snapshot tiles, matching what the page shows.

/// Group digits with commas and keep at most three fraction digits (`1234567.5` → `1,234,567.5`).
pub fn thousands(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, digit) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let is_zero = int_part.bytes().all(|b| b == b'0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}

/// Pounds expressed in billions: one decimal from 0.1 up, otherwise one significant digit.
pub fn billions(total_lbs: f64) -> String {
    let billions = total_lbs / 1_000_000_000.0;
    if billions >= 0.1 {
        format!("{billions:.1}")
    } else {
        one_significant_digit(billions)
    }
}

/// Same output as the page's `toPrecision(1)`: fixed notation down to 1e-6, exponent form below.
fn one_significant_digit(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    let mut exponent = value.abs().log10().floor() as i32;
    let mut digit = (value.abs() / 10f64.powi(exponent)).round();
    // rounding can carry into the next digit (0.096 → 0.1)
    if digit >= 10.0 {
        digit = 1.0;
        exponent += 1;
    }
    if exponent < -6 {
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{sign}{digit}e{exponent}");
    }
    format!("{:.*}", (-exponent).max(0) as usize, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(200000.0), "200,000");
        assert_eq!(thousands(5.0), "5");
        assert_eq!(thousands(1234567.5), "1,234,567.5");
        assert_eq!(thousands(999.9999), "1,000");
        assert_eq!(thousands(-1500.0), "-1,500");
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(f64::NAN), "0");
    }

    #[test]
    fn billions_switch_to_one_significant_digit_below_a_tenth() {
        assert_eq!(billions(3_260_000_000.0), "3.3");
        assert_eq!(billions(100_000_000.0), "0.1");
        assert_eq!(billions(12_300_000.0), "0.01");
        assert_eq!(billions(96_000_000.0), "0.1");
        assert_eq!(billions(1000.0), "0.000001");
        assert_eq!(billions(600.0), "6e-7");
        assert_eq!(billions(50.0), "5e-8");
        assert_eq!(billions(96.0), "1e-7");
        assert_eq!(billions(0.0), "0");
    }
}
