//! Wallet keys and typed-data signing for demo wallets

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer as _};
use ethers::types::transaction::eip712::TypedData;

use crate::contract::from_eth_address;
use crate::error::{Result, SwipeError};

/// Capability to sign typed data on behalf of one address
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;

    /// Returns the 65-byte `r ‖ s ‖ v` signature as `0x`-prefixed hex
    async fn sign_typed_data(&self, payload: &TypedData) -> Result<String>;
}

/// One demo wallet key. The same wallet signs typed data for the backend
/// and transactions for the chain.
#[derive(Clone)]
pub struct WalletSigner {
    wallet: LocalWallet,
}

impl WalletSigner {
    /// Create a new signer from private key hex
    pub fn new(private_key_hex: &str) -> Result<Self> {
        let key_bytes = parse_private_key(private_key_hex)?;
        Self::from_bytes(&key_bytes)
    }

    pub fn from_bytes(key_bytes: &[u8; 32]) -> Result<Self> {
        let wallet = LocalWallet::from_bytes(key_bytes)
            .map_err(|e| SwipeError::Signing(format!("Invalid private key: {}", e)))?;
        Ok(Self { wallet })
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }
}

#[async_trait]
impl Signer for WalletSigner {
    fn address(&self) -> Address {
        from_eth_address(self.wallet.address())
    }

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<String> {
        let signature = self
            .wallet
            .sign_typed_data(payload)
            .await
            .map_err(|e| SwipeError::Signing(format!("Failed to sign {}: {}", payload.primary_type, e)))?;

        Ok(format!("0x{}", hex::encode(signature.to_vec())))
    }
}

/// Decode a 32-byte private key, with or without `0x`. Shorter keys are
/// left-padded.
pub fn parse_private_key(private_key_hex: &str) -> Result<[u8; 32]> {
    let trimmed = private_key_hex.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(trimmed)?;
    if bytes.is_empty() || bytes.len() > 32 {
        return Err(SwipeError::Signing(format!(
            "Private key must be 1..=32 bytes, got {}",
            bytes.len()
        )));
    }

    let mut key = [0u8; 32];
    key[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(key)
}

/// Keys for the demo wallets: wallet `i` uses `seed + i`.
pub fn derive_wallet_keys(seed_hex: &str, count: usize) -> Result<Vec<[u8; 32]>> {
    let seed = U256::from_be_bytes(parse_private_key(seed_hex)?);

    (0..count)
        .map(|index| {
            let key = seed
                .checked_add(U256::from(index))
                .ok_or_else(|| SwipeError::Signing(format!("Key for wallet #{} overflows", index)))?;
            Ok(key.to_be_bytes::<32>())
        })
        .collect()
}
