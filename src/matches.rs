//! Match queries

use std::sync::Arc;

use ethers::types::transaction::eip712::EIP712Domain;
use tracing::debug;

use crate::backend::BackendClient;
use crate::error::Result;
use crate::signer::Signer;
use crate::typed_data::swipe_match_query;
use crate::types::{MatchQuery, Tx};

pub struct MatchFetcher {
    backend: Arc<BackendClient>,
    domain: EIP712Domain,
}

impl MatchFetcher {
    pub fn new(backend: Arc<BackendClient>, domain: EIP712Domain) -> Self {
        Self { backend, domain }
    }

    /// The backend's view of the wallet's confirmed matches from
    /// `start_index` on. Returned exactly as the backend sent it.
    pub async fn fetch(&self, wallet: &dyn Signer, start_index: u64) -> Result<serde_json::Value> {
        let nonce = self.backend.nonce(wallet.address()).await?;
        let tx = Tx {
            nonce: nonce.to_string(),
            body: MatchQuery { start_index },
        };
        let signature = wallet
            .sign_typed_data(&swipe_match_query(&self.domain, &tx)?)
            .await?;

        debug!("Fetching matches for {} from index {}", wallet.address(), start_index);
        self.backend.matches(&tx, signature).await
    }
}
