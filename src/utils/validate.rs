//! Credential format checks.

use regex::Regex;
use std::sync::LazyLock;

static WALLET_ADDRESS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").ok());

static PRIVATE_KEY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(0x)?[a-fA-F0-9]{64}$").ok());

/// `0x` followed by 40 hex characters.
pub fn is_valid_wallet_address(address: &str) -> bool {
    WALLET_ADDRESS
        .as_ref()
        .is_some_and(|re| re.is_match(address.trim()))
}

/// 64 hex characters, with or without a `0x` prefix.
pub fn is_valid_private_key(key: &str) -> bool {
    PRIVATE_KEY.as_ref().is_some_and(|re| re.is_match(key.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_address() {
        assert!(is_valid_wallet_address("0x1234567890abcdef1234567890abcdef12345678"));
        assert!(!is_valid_wallet_address("1234567890abcdef1234567890abcdef12345678"));
        assert!(!is_valid_wallet_address("0x1234"));
        assert!(!is_valid_wallet_address(""));
    }

    #[test]
    fn test_private_key() {
        let key = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
        assert!(is_valid_private_key(key));
        assert!(is_valid_private_key(&format!("0x{key}")));
        assert!(!is_valid_private_key(&key[1..]));
        assert!(!is_valid_private_key("0xzz"));
    }
}
