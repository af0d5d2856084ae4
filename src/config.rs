//! Configuration for the swipe demo

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{Result, SwipeError};
use crate::signer::{derive_wallet_keys, WalletSigner};

/// A swipe from `pair[0]` onto `pair[1]`, both wallet indices
pub type WalletPair = [usize; 2];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seismic backend base URL
    pub backend_url: String,

    /// JSON-RPC endpoint of the chain the Swipe contract lives on
    pub rpc_url: String,

    /// Private key the deployer and demo wallets are derived from
    pub signer_seed_key: String,

    /// Number of simulated wallets
    pub num_wallets: usize,

    /// Likes to register, in order
    pub like_pairs: Vec<WalletPair>,

    /// Dislikes to register after the likes
    pub dislike_pairs: Vec<WalletPair>,

    /// Wallet whose matches are printed at the end
    pub display_wallet: usize,

    /// Pause after each swipe so its transaction can confirm
    pub confirmation_delay_secs: u64,

    /// Pause before querying matches
    pub settle_delay_secs: u64,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Reuse an already deployed Swipe contract instead of deploying one
    pub swipe_contract_address: Option<String>,

    /// Foundry artifact used to deploy the Swipe contract
    pub swipe_artifact_path: String,

    /// EIP-712 domain name shared with the backend
    pub domain_name: String,

    /// EIP-712 domain version shared with the backend
    pub domain_version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            signer_seed_key: String::new(),
            num_wallets: 5,
            // Symmetric likes for [0, 1], [0, 2] and [1, 2] should match.
            // [0, 3] and [1, 4] are one-sided and should not.
            like_pairs: vec![[0, 1], [1, 0], [0, 2], [2, 0], [1, 2], [2, 1], [0, 3], [1, 4]],
            dislike_pairs: vec![[3, 0]],
            display_wallet: 0,
            confirmation_delay_secs: 10,
            settle_delay_secs: 15,
            request_timeout_secs: 30,
            swipe_contract_address: None,
            swipe_artifact_path: "../contract/out/Swipe.sol/Swipe.json".to_string(),
            domain_name: "Seismic".to_string(),
            domain_version: "1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let contents = fs::read_to_string(path)
                .map_err(|e| SwipeError::Config(format!("Failed to read {}: {}", path, e)))?;
            toml::from_str(&contents)
                .map_err(|e| SwipeError::Config(format!("Failed to parse {}: {}", path, e)))?
        } else {
            Config::default()
        };

        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Override fields from the environment, `lookup` standing in for
    /// `std::env::var`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("ENDPOINT") {
            self.backend_url = endpoint;
        }

        if let Some(rpc) = lookup("RPC_URL") {
            self.rpc_url = rpc;
        }

        if let Some(key) = lookup("DEV_PRIVKEY") {
            self.signer_seed_key = key;
        }

        if let Some(count) = lookup("NUM_WALLETS") {
            self.num_wallets = count
                .trim()
                .parse()
                .map_err(|e| SwipeError::Config(format!("Invalid NUM_WALLETS {:?}: {}", count, e)))?;
        }

        if let Some(pairs) = lookup("LIKE_PAIRS") {
            self.like_pairs = parse_pairs(&pairs)?;
        }

        if let Some(pairs) = lookup("DISLIKE_PAIRS") {
            self.dislike_pairs = parse_pairs(&pairs)?;
        }

        if let Some(address) = lookup("SWIPE_CONTRACT_ADDRESS") {
            if !address.trim().is_empty() {
                self.swipe_contract_address = Some(address);
            }
        }

        if let Some(path) = lookup("SWIPE_ARTIFACT") {
            self.swipe_artifact_path = path;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.backend_url.trim().is_empty() {
            return Err(SwipeError::Config("Backend URL (ENDPOINT) is required".to_string()));
        }

        if self.signer_seed_key.is_empty() {
            return Err(SwipeError::Config("Please set demo privkey env variable (DEV_PRIVKEY)".to_string()));
        }

        if self.num_wallets == 0 {
            return Err(SwipeError::Config("At least one demo wallet is required".to_string()));
        }

        // Every derived wallet key must be a valid secp256k1 scalar.
        for (index, key) in derive_wallet_keys(&self.signer_seed_key, self.num_wallets)?
            .iter()
            .enumerate()
        {
            WalletSigner::from_bytes(key)
                .map_err(|e| SwipeError::Config(format!("Wallet #{} key is unusable: {}", index, e)))?;
        }

        for [sender, recipient] in self.like_pairs.iter().chain(self.dislike_pairs.iter()) {
            if *sender >= self.num_wallets || *recipient >= self.num_wallets {
                return Err(SwipeError::Config(format!(
                    "Swipe [{}, {}] references a wallet outside 0..{}",
                    sender, recipient, self.num_wallets
                )));
            }
            if sender == recipient {
                return Err(SwipeError::Config(format!("Wallet #{} cannot swipe on itself", sender)));
            }
        }

        if self.display_wallet >= self.num_wallets {
            return Err(SwipeError::Config(format!(
                "Display wallet #{} does not exist",
                self.display_wallet
            )));
        }

        Ok(())
    }
}

/// Parse `"0:1,1:0"` into wallet pairs
pub fn parse_pairs(value: &str) -> Result<Vec<WalletPair>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (sender, recipient) = pair
                .split_once(':')
                .ok_or_else(|| SwipeError::Config(format!("Invalid wallet pair {:?}", pair)))?;
            let sender = sender
                .trim()
                .parse()
                .map_err(|e| SwipeError::Config(format!("Invalid wallet pair {:?}: {}", pair, e)))?;
            let recipient = recipient
                .trim()
                .parse()
                .map_err(|e| SwipeError::Config(format!("Invalid wallet pair {:?}: {}", pair, e)))?;
            Ok([sender, recipient])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_config() -> Config {
        Config {
            backend_url: "http://localhost:4000".to_string(),
            signer_seed_key: "0x0101010101010101010101010101010101010101010101010101010101010101".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults_follow_demo_layout() {
        let config = Config::default();
        assert_eq!(config.num_wallets, 5);
        assert_eq!(config.like_pairs.len(), 8);
        assert_eq!(config.dislike_pairs, vec![[3, 0]]);
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_seed_key() {
        let config = Config {
            signer_seed_key: String::new(),
            ..valid_config()
        };
        assert!(matches!(config.validate(), Err(SwipeError::Config(_))));
    }

    #[test]
    fn test_missing_backend() {
        let config = Config {
            backend_url: String::new(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pair_out_of_range() {
        let config = Config {
            num_wallets: 3,
            ..valid_config()
        };
        // Default likes reference wallets #3 and #4.
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_self_swipe_rejected() {
        let config = Config {
            dislike_pairs: vec![[2, 2]],
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ENDPOINT", "http://backend:4000"),
            ("DEV_PRIVKEY", "0x02"),
            ("NUM_WALLETS", "2"),
            ("LIKE_PAIRS", "0:1, 1:0"),
            ("DISLIKE_PAIRS", ""),
            ("SWIPE_CONTRACT_ADDRESS", "0x1111111111111111111111111111111111111111"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.backend_url, "http://backend:4000");
        assert_eq!(config.num_wallets, 2);
        assert_eq!(config.like_pairs, vec![[0, 1], [1, 0]]);
        assert!(config.dislike_pairs.is_empty());
        assert_eq!(
            config.swipe_contract_address.as_deref(),
            Some("0x1111111111111111111111111111111111111111")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = Config::default();
        assert!(config
            .apply_env(|key| (key == "NUM_WALLETS").then(|| "five".to_string()))
            .is_err());
        assert!(parse_pairs("0-1").is_err());
        assert!(parse_pairs("a:1").is_err());
    }

    #[test]
    fn test_toml_partial_file() {
        let config: Config = toml::from_str(
            r#"
            backend_url = "http://localhost:4000"
            num_wallets = 2
            like_pairs = [[0, 1], [1, 0]]
            dislike_pairs = []
            "#,
        )
        .unwrap();

        assert_eq!(config.num_wallets, 2);
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.confirmation_delay_secs, 10);
    }
}
