//! On-chain swipe registration
//!
//! The user posts the hiding commitment themselves; Seismic only attests that
//! it saw the swipe first.

use alloy_primitives::{B256, U256};
use tracing::debug;

use crate::contract::ContractWriter;
use crate::error::{Result, SwipeError};
use crate::types::DaAttestation;

/// Signature split into the components the contract verifies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuredSignature {
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Padding byte, always zero
    pub b: u8,
}

impl StructuredSignature {
    /// Decode a 65-byte `r ‖ s ‖ v` hex signature. A recovery id of 0/1 is
    /// normalized to 27/28.
    pub fn from_hex(signature_hex: &str) -> Result<Self> {
        let trimmed = signature_hex.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(trimmed)
            .map_err(|e| SwipeError::InvalidSignature(format!("not hex: {}", e)))?;

        if bytes.len() != 65 {
            return Err(SwipeError::InvalidSignature(format!(
                "expected 65 bytes, got {}",
                bytes.len()
            )));
        }

        let v = match bytes[64] {
            0 | 1 => bytes[64] + 27,
            27 | 28 => bytes[64],
            other => {
                return Err(SwipeError::InvalidSignature(format!("invalid v value {}", other)));
            }
        };

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);

        Ok(Self { v, r, s, b: 0 })
    }
}

/// Commitments come back as bare or `0x`-prefixed hex
pub fn parse_commitment(commitment_hex: &str) -> Result<U256> {
    let trimmed = commitment_hex.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Err(SwipeError::Registration {
            reason: format!("empty commitment {:?}", commitment_hex),
            source: None,
        });
    }
    U256::from_str_radix(trimmed, 16).map_err(|e| SwipeError::Registration {
        reason: format!("invalid commitment {:?}: {}", commitment_hex, e),
        source: None,
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SwipeRegistrar;

impl SwipeRegistrar {
    pub fn new() -> Self {
        Self
    }

    /// Submit the attested commitment through the sender's contract handle
    /// and wait for the transaction.
    pub async fn register(&self, contract: &dyn ContractWriter, attestation: &DaAttestation) -> Result<B256> {
        let signature = StructuredSignature::from_hex(&attestation.signature)?;
        let commitment = parse_commitment(&attestation.commitment)?;

        debug!("Registering commitment {:#x} on {}", commitment, contract.address());

        match contract.swipe(commitment, &signature).await {
            Ok(Some(tx_hash)) => Ok(tx_hash),
            Ok(None) => Err(SwipeError::Registration {
                reason: "swipe transaction returned no result".to_string(),
                source: None,
            }),
            Err(e) => Err(SwipeError::Registration {
                reason: e.to_string(),
                source: Some(e),
            }),
        }
    }
}
