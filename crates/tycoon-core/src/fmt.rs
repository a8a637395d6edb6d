//! Compact display of large currency amounts.

/// Format `value` for display.
///
/// Below 1000 the value is printed with `decimals` fixed decimals. Above it
/// the value is scaled by powers of 1000 and suffixed with K, M, B, then
/// two-letter tiers starting at 10^12 ("aa", "ab", ... "az", "ba", ...).
/// Trailing zeros of the scaled mantissa are trimmed.
///
/// Example:
/// assert_eq!(format_number(12.5, 2), "12.50");
/// assert_eq!(format_number(1_500.0, 2), "1.5K");
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let abs = value.abs();
    if abs < 1000.0 {
        return format!("{value:.decimals$}");
    }
    let mut tier = (abs.log10() / 3.0).floor() as i32;
    // log10 may land just under an exact power of 1000.
    if abs >= 1000f64.powi(tier + 1) {
        tier += 1;
    } else if abs < 1000f64.powi(tier) {
        tier -= 1;
    }
    let scaled = value / 1000f64.powi(tier);
    let suffix = match tier {
        1 => "K".to_string(),
        2 => "M".to_string(),
        3 => "B".to_string(),
        t => alpha_suffix((t - 4) as u32),
    };
    format!("{}{}", trim_zeros(format!("{scaled:.decimals$}")), suffix)
}

fn trim_zeros(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn alpha_suffix(mut index: u32) -> String {
    let mut chars = Vec::new();
    loop {
        chars.push((b'a' + (index % 26) as u8) as char);
        index /= 26;
        if index == 0 {
            break;
        }
    }
    while chars.len() < 2 {
        chars.push('a');
    }
    chars.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_fixed_decimals() {
        assert_eq!(format_number(0.0, 2), "0.00");
        assert_eq!(format_number(12.5, 2), "12.50");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(-3.24, 1), "-3.2");
    }

    #[test]
    fn named_suffixes() {
        assert_eq!(format_number(1_000.0, 2), "1K");
        assert_eq!(format_number(1_500.0, 2), "1.5K");
        assert_eq!(format_number(2_340_000.0, 2), "2.34M");
        assert_eq!(format_number(7_000_000_000.0, 2), "7B");
    }

    #[test]
    fn alphabetic_tiers() {
        assert_eq!(format_number(1e12, 2), "1aa");
        assert_eq!(format_number(2.5e15, 2), "2.5ab");
        assert_eq!(alpha_suffix(0), "aa");
        assert_eq!(alpha_suffix(25), "az");
        assert_eq!(alpha_suffix(26), "ba");
    }

    #[test]
    fn negative_large_values_keep_sign() {
        assert_eq!(format_number(-1_500.0, 2), "-1.5K");
    }
}
