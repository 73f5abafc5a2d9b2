use crate::types::Decimal;
use chrono::{Local, TimeZone};

/// Characters of a transaction hash shown in list rows
pub const TX_HASH_PREVIEW: usize = 17;
/// Characters of a block hash shown in list rows
pub const BLOCK_HASH_PREVIEW: usize = 24;

/// Shorten a hash for list rows
/// Examples: "0x8f3a9c21d4e5b6a7..." ; short inputs come back unchanged
pub fn short_hash(hash: &str, keep: usize) -> String {
    match hash.char_indices().nth(keep) {
        Some((cut, _)) => format!("{}...", &hash[..cut]),
        None => hash.to_string(),
    }
}

/// Render unix seconds in local time, "-" when out of range
pub fn format_timestamp(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// Format an amount in the unit the backend accounts in
/// Examples: "42.5 ether", "0 ether"
pub fn format_amount(amount: &Decimal) -> String {
    format!("{amount} ether")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_cuts_long_hashes() {
        let hash = "0x8f3a9c21d4e5b6a7f0e1d2c3b4a59687";
        assert_eq!(short_hash(hash, TX_HASH_PREVIEW), "0x8f3a9c21d4e5b6a...");
        assert_eq!(short_hash(hash, BLOCK_HASH_PREVIEW).len(), BLOCK_HASH_PREVIEW + 3);
        assert_eq!(short_hash("0xab", TX_HASH_PREVIEW), "0xab");
    }

    #[test]
    fn timestamp_out_of_range_is_dash() {
        assert_eq!(format_timestamp(i64::MAX), "-");
        assert_eq!(format_timestamp(0).len(), "1970-01-01 00:00:00".len());
    }

    #[test]
    fn amounts_carry_the_unit() {
        let amount: Decimal = "42.5".parse().unwrap();
        assert_eq!(format_amount(&amount), "42.5 ether");
        assert_eq!(format_amount(&Decimal::from(0)), "0 ether");
    }
}
