//! Compact number formatting for metric captions.

const SUFFIXES: [(f64, &str); 4] = [
    (1e12, "T"),
    (1e9, "B"),
    (1e6, "M"),
    (1e3, "K"),
];

/// Format a value with at most two decimals and a K/M/B/T suffix.
///
/// ```ignore
/// assert_eq!(numerize(1_186_092_991_320), "1.19T");
/// assert_eq!(numerize(128), "128");
/// ```
pub fn numerize(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs() as f64;

    let (scaled, suffix) = SUFFIXES
        .iter()
        .find(|(unit, _)| abs >= *unit)
        .map(|(unit, suffix)| (abs / unit, *suffix))
        .unwrap_or((abs, ""));

    format!("{}{}{}", sign, drop_zeros(&format!("{:.2}", scaled)), suffix)
}

/// `"1.50"` → `"1.5"`, `"128.00"` → `"128"`.
fn drop_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numerize() {
        assert_eq!(numerize(1_186_092_991_320), "1.19T");
        assert_eq!(numerize(128), "128");
        assert_eq!(numerize(0), "0");
        assert_eq!(numerize(1500), "1.5K");
        assert_eq!(numerize(-1500), "-1.5K");
        assert_eq!(numerize(20_893_000_000), "20.89B");
        assert_eq!(numerize(3_000_000), "3M");
    }
}
