//! Data availability requests
//!
//! Seismic must see a swipe before it goes on-chain. The backend hands back
//! the hiding commitment together with a signature over it, and the Swipe
//! contract refuses commitments without that signature.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use ethers::types::transaction::eip712::EIP712Domain;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use crate::backend::BackendClient;
use crate::error::Result;
use crate::signer::Signer;
use crate::typed_data::swipe_da_request;
use crate::types::{DaAttestation, SwipeIntent, Tx};

/// Order of the BN254 scalar field. Blinds live in this field so the backend
/// can hash them into its commitment.
pub const BN254_SCALAR_MODULUS: U256 = U256::from_limbs([
    0x43e1f593f0000001,
    0x2833e84879b97091,
    0xb85045b68181585d,
    0x30644e72e131a029,
]);

/// Uniformly random blind below the BN254 scalar modulus. A fresh value per
/// call, so two commitments to the same swipe cannot be linked.
pub fn sample_blind() -> U256 {
    let mut rng = OsRng;
    loop {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        bytes[0] &= 0x3f; // modulus is below 2^254
        let candidate = U256::from_be_bytes(bytes);
        if candidate < BN254_SCALAR_MODULUS {
            return candidate;
        }
    }
}

pub struct DaRequester {
    backend: Arc<BackendClient>,
    domain: EIP712Domain,
}

impl DaRequester {
    pub fn new(backend: Arc<BackendClient>, domain: EIP712Domain) -> Self {
        Self { backend, domain }
    }

    /// Fetch the sender's nonce, sign a fresh swipe intent and trade it for a
    /// commitment plus attestation signature.
    pub async fn request(&self, sender: &dyn Signer, recipient: Address, positive: bool) -> Result<DaAttestation> {
        let nonce = self.backend.nonce(sender.address()).await?;

        let tx = Tx {
            nonce: nonce.to_string(),
            body: SwipeIntent {
                recipient: recipient.to_checksum(None),
                positive,
                blind: sample_blind().to_string(),
            },
        };
        let signature = sender
            .sign_typed_data(&swipe_da_request(&self.domain, &tx)?)
            .await?;

        debug!(
            "Swipe intent {} -> {} (nonce {}, positive {})",
            sender.address(),
            recipient,
            nonce,
            positive
        );

        self.backend.davail(&tx, signature).await
    }
}
