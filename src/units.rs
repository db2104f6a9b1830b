//! Unit Formatting
//!
//! Satoshi display and parsing helpers for the CLI. Integer-only.

use bitcoin::Amount;

/// Satoshis per Bitcoin
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Satoshis as a BTC string with 8 decimals (e.g. "0.00100000")
pub fn sats_to_btc_string(sats: u64) -> String {
    format!("{}.{:08}", sats / SATS_PER_BTC, sats % SATS_PER_BTC)
}

/// e.g. 100000 -> "100,000 sats (0.00100000 BTC)"
pub fn sats_to_display(amount: Amount) -> String {
    let sats = amount.to_sat();
    format!("{} sats ({} BTC)", format_with_commas(sats), sats_to_btc_string(sats))
}

fn format_with_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

/// Parse a satoshi amount, allowing `,` and `_` separators
pub fn parse_sats(s: &str) -> Option<Amount> {
    s.trim()
        .replace([',', '_'], "")
        .parse()
        .ok()
        .map(Amount::from_sat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sats_to_btc() {
        assert_eq!(sats_to_btc_string(0), "0.00000000");
        assert_eq!(sats_to_btc_string(1), "0.00000001");
        assert_eq!(sats_to_btc_string(100_000_000), "1.00000000");
        assert_eq!(sats_to_btc_string(123_456_789), "1.23456789");
    }

    #[test]
    fn test_display_format() {
        let display = sats_to_display(Amount::from_sat(1_000_000));
        assert_eq!(display, "1,000,000 sats (0.01000000 BTC)");
        assert_eq!(sats_to_display(Amount::from_sat(546)), "546 sats (0.00000546 BTC)");
    }

    #[test]
    fn test_parse_sats() {
        assert_eq!(parse_sats("1000"), Some(Amount::from_sat(1000)));
        assert_eq!(parse_sats("1,000,000"), Some(Amount::from_sat(1_000_000)));
        assert_eq!(parse_sats("1_000_000"), Some(Amount::from_sat(1_000_000)));
        assert_eq!(parse_sats("  42  "), Some(Amount::from_sat(42)));
        assert_eq!(parse_sats("invalid"), None);
        assert_eq!(parse_sats("-5"), None);
    }
}
