//! User settings and API credentials.

use super::order::new_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Hyperliquid network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    #[default]
    Testnet,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Mainnet => "mainnet",
            Environment::Testnet => "testnet",
        }
    }

    /// Anything other than "mainnet" (case-insensitive) is testnet.
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("mainnet") {
            Environment::Mainnet
        } else {
            Environment::Testnet
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const MASK: &str = "****";

/// Wallet credentials used to sign orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiCredentials {
    /// Main wallet address (public)
    pub wallet_address: Option<String>,
    /// API wallet private key
    pub private_key: Option<String>,
    pub environment: Environment,
    pub is_configured: bool,
}

impl ApiCredentials {
    pub fn new(
        wallet_address: Option<String>,
        private_key: Option<String>,
        environment: Environment,
    ) -> Self {
        let mut creds = Self {
            wallet_address: non_empty(wallet_address),
            private_key: non_empty(private_key),
            environment,
            is_configured: false,
        };
        creds.is_configured = creds.has_keys();
        creds
    }

    /// Both the wallet address and the private key are present.
    pub fn has_keys(&self) -> bool {
        self.wallet_address.is_some() && self.private_key.is_some()
    }

    /// Copy with the private key reduced to its first and last characters.
    pub fn masked(&self) -> Self {
        Self {
            private_key: self.private_key.as_deref().map(mask_secret),
            ..self.clone()
        }
    }

    /// Take the stored private key when the incoming one is missing or is the masked form.
    pub fn merge_secret_from(&mut self, stored: &ApiCredentials) {
        let keep_stored = match self.private_key.as_deref() {
            None | Some("") => true,
            Some(key) => key.contains(MASK),
        };
        if keep_stored {
            self.private_key = stored.private_key.clone();
        }
        self.wallet_address = non_empty(self.wallet_address.take());
        self.is_configured = self.has_keys();
    }
}

/// Persisted dashboard settings. Preferences are free-form JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default)]
    pub api_credentials: ApiCredentials,
    #[serde(default)]
    pub trading_preferences: Map<String, Value>,
    #[serde(default)]
    pub ui_preferences: Map<String, Value>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Default for UserSettings {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            api_credentials: ApiCredentials::default(),
            trading_preferences: Map::new(),
            ui_preferences: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl UserSettings {
    /// Copy safe to return over the API.
    pub fn masked(&self) -> Self {
        Self {
            api_credentials: self.api_credentials.masked(),
            ..self.clone()
        }
    }
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 10 {
        return MASK.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{MASK}{tail}")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn test_private_key_is_masked() {
        let creds = ApiCredentials::new(
            Some("0xabc".to_string()),
            Some(KEY.to_string()),
            Environment::Mainnet,
        );
        assert!(creds.is_configured);

        let masked = creds.masked();
        let key = masked.private_key.unwrap();
        assert_eq!(key, "0x4c08****2318");
        assert!(!key.contains("a69102937d"));
        assert_eq!(masked.wallet_address.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_short_secret_fully_masked() {
        assert_eq!(mask_secret("short"), MASK);
    }

    #[test]
    fn test_masked_key_keeps_stored_secret() {
        let stored = ApiCredentials::new(
            Some("0xabc".to_string()),
            Some(KEY.to_string()),
            Environment::Testnet,
        );
        let mut incoming = stored.masked();
        incoming.merge_secret_from(&stored);
        assert_eq!(incoming.private_key.as_deref(), Some(KEY));
        assert!(incoming.is_configured);

        let mut replaced = ApiCredentials {
            private_key: Some("0xnewkey".to_string()),
            ..stored.clone()
        };
        replaced.merge_secret_from(&stored);
        assert_eq!(replaced.private_key.as_deref(), Some("0xnewkey"));
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::parse_lenient("MAINNET"), Environment::Mainnet);
        assert_eq!(Environment::parse_lenient("anything"), Environment::Testnet);
        assert_eq!(
            serde_json::to_string(&Environment::Mainnet).unwrap(),
            r#""mainnet""#
        );
    }

    #[test]
    fn test_empty_credentials_not_configured() {
        let creds = ApiCredentials::new(Some("  ".to_string()), None, Environment::Testnet);
        assert!(creds.wallet_address.is_none());
        assert!(!creds.is_configured);
    }
}
