//! Human-readable formatting for the status printer and monitor log lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// `$1.2M`, `$45.5K` or `$999.99`.
pub fn format_currency(amount: Decimal) -> String {
    if amount >= dec!(1_000_000) {
        format!("${:.1}M", (amount / dec!(1_000_000)).round_dp(1))
    } else if amount >= dec!(1000) {
        format!("${:.1}K", (amount / dec!(1000)).round_dp(1))
    } else {
        format!("${:.2}", amount.round_dp(2))
    }
}

/// Percentage with an explicit `+` for gains.
pub fn format_percentage(value: Decimal) -> String {
    let sign = if value > Decimal::ZERO { "+" } else { "" };
    format!("{sign}{:.2}%", value.round_dp(2))
}

/// Signed USD amount such as `+$750.00` or `-$100.00`.
pub fn format_pnl(value: Decimal) -> String {
    if value < Decimal::ZERO {
        format!("-${:.2}", value.abs().round_dp(2))
    } else {
        format!("+${:.2}", value.round_dp(2))
    }
}

pub fn time_ago(timestamp: DateTime<Utc>) -> String {
    time_ago_from(timestamp, Utc::now())
}

fn time_ago_from(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - timestamp;
    let plural = |n: i64| if n == 1 { "" } else { "s" };

    if diff.num_days() > 0 {
        let days = diff.num_days();
        format!("{days} day{} ago", plural(days))
    } else if diff.num_hours() > 0 {
        let hours = diff.num_hours();
        format!("{hours} hour{} ago", plural(hours))
    } else if diff.num_minutes() > 0 {
        let minutes = diff.num_minutes();
        format!("{minutes} minute{} ago", plural(minutes))
    } else {
        "Just now".to_string()
    }
}

/// Shorten a wallet address to `0x1234...5678`.
pub fn short_address(address: &str) -> String {
    if address.len() <= 12 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(1_250_000)), "$1.2M");
        assert_eq!(format_currency(dec!(50000)), "$50.0K");
        assert_eq!(format_currency(dec!(350)), "$350.00");
    }

    #[test]
    fn test_format_signed_values() {
        assert_eq!(format_percentage(dec!(2.5)), "+2.50%");
        assert_eq!(format_percentage(dec!(-1.234)), "-1.23%");
        assert_eq!(format_pnl(dec!(750)), "+$750.00");
        assert_eq!(format_pnl(dec!(-100)), "-$100.00");
    }

    #[test]
    fn test_time_ago() {
        let now = Utc::now();
        assert_eq!(time_ago_from(now - Duration::seconds(30), now), "Just now");
        assert_eq!(time_ago_from(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(time_ago_from(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(time_ago_from(now - Duration::days(2), now), "2 days ago");
    }

    #[test]
    fn test_short_address() {
        assert_eq!(
            short_address("0x1234567890abcdef1234567890abcdef12345678"),
            "0x1234...5678"
        );
        assert_eq!(short_address("0xabc"), "0xabc");
    }
}
