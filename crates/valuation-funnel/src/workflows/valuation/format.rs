//! Display formatting shared by API responses, results emails, and the CLI.

/// Every finite f64 has at most this many fractional decimal digits.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Fixed-point rendering with `digits` decimals, rounded from the exact binary
/// value: `1.65` is stored below 1.65 and renders `1.6`, while a true tie such
/// as `1.25` goes to the larger magnitude, `1.3`.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value.abs());
    let (whole, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let (kept, dropped) = fraction.split_at(digits.min(fraction.len()));

    let mut rounded: Vec<u8> = whole.bytes().chain(kept.bytes()).collect();
    rounded.resize(whole.len() + digits, b'0');
    if dropped.as_bytes().first().is_some_and(|digit| *digit >= b'5') {
        increment_decimal(&mut rounded);
    }

    let split = rounded.len() - digits;
    let mut out = String::with_capacity(rounded.len() + 2);
    if value < 0.0 {
        out.push('-');
    }
    out.extend(rounded[..split].iter().map(|digit| char::from(*digit)));
    if digits > 0 {
        out.push('.');
        out.extend(rounded[split..].iter().map(|digit| char::from(*digit)));
    }
    out
}

fn increment_decimal(digits: &mut Vec<u8>) {
    for digit in digits.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}

/// Compact currency: `$2.5M`, `$3M`, `$625K`, `$999`.
pub fn format_currency(value: f64) -> String {
    if value >= 1_000_000.0 {
        let millions = value / 1_000_000.0;
        let digits = if millions.fract() == 0.0 { 0 } else { 1 };
        return format!("${}M", to_fixed(millions, digits));
    }
    if value >= 1_000.0 {
        return format!("${}K", to_fixed(value / 1_000.0, 0));
    }
    format!("${}", to_fixed(value, 0))
}

/// `4.0x`, one decimal.
pub fn format_multiple(multiple: f64) -> String {
    format!("{}x", to_fixed(multiple, 1))
}

pub fn format_currency_range(low: f64, high: f64) -> String {
    format!("{} – {}", format_currency(low), format_currency(high))
}

pub fn format_multiple_range(low: f64, high: f64) -> String {
    format!("{} – {}", format_multiple(low), format_multiple(high))
}
