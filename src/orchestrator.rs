//! One swipe: data availability first, then the on-chain commitment

use alloy_primitives::{Address, B256};
use tracing::debug;

use crate::contract::ContractWriter;
use crate::davail::DaRequester;
use crate::error::Result;
use crate::registrar::SwipeRegistrar;
use crate::signer::Signer;

pub struct SwipeOrchestrator {
    da: DaRequester,
    registrar: SwipeRegistrar,
}

impl SwipeOrchestrator {
    pub fn new(da: DaRequester, registrar: SwipeRegistrar) -> Self {
        Self { da, registrar }
    }

    /// Have `sender` swipe on `recipient`. Errors from either step are
    /// returned as-is and nothing is retried.
    pub async fn swipe(
        &self,
        contract: &dyn ContractWriter,
        sender: &dyn Signer,
        recipient: Address,
        positive: bool,
    ) -> Result<B256> {
        let attestation = self.da.request(sender, recipient, positive).await?;
        debug!("DA attestation received, commitment {}", attestation.commitment);

        self.registrar.register(contract, &attestation).await
    }
}
