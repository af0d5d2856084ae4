//! Demo driver: deploy, swipe through the configured pairs, print matches

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use ethers::types::transaction::eip712::EIP712Domain;
use tokio::time::sleep;
use tracing::info;

use crate::backend::BackendClient;
use crate::config::{Config, WalletPair};
use crate::contract::{deploy_swipe, ChainConnection, ContractWriter, EthersContractWriter, SwipeArtifact};
use crate::davail::DaRequester;
use crate::error::{Result, SwipeError};
use crate::matches::MatchFetcher;
use crate::orchestrator::SwipeOrchestrator;
use crate::registrar::SwipeRegistrar;
use crate::signer::{derive_wallet_keys, Signer, WalletSigner};
use crate::typed_data::seismic_domain;

/// A simulated user: its wallet plus a contract handle signing with it
pub struct DemoWallet {
    pub signer: WalletSigner,
    pub contract: Arc<dyn ContractWriter>,
}

/// Wallet index to binding, built once during setup
pub struct WalletSet {
    wallets: Vec<DemoWallet>,
}

impl WalletSet {
    pub fn new(wallets: Vec<DemoWallet>) -> Self {
        Self { wallets }
    }

    pub fn get(&self, index: usize) -> Result<&DemoWallet> {
        self.wallets
            .get(index)
            .ok_or_else(|| SwipeError::Config(format!("No demo wallet #{}", index)))
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }
}

pub struct DemoDriver {
    config: Config,
    backend: Arc<BackendClient>,
}

impl DemoDriver {
    pub fn new(config: Config) -> Result<Self> {
        let backend = BackendClient::new(
            &config.backend_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        info!("Backend endpoint: {}", backend.endpoint());

        Ok(Self {
            config,
            backend: Arc::new(backend),
        })
    }

    /// Full demo against a live backend and chain. Returns the matches
    /// reported for the display wallet.
    pub async fn run(&self) -> Result<serde_json::Value> {
        let chain = ChainConnection::connect(&self.config.rpc_url).await?;
        let keys = derive_wallet_keys(&self.config.signer_seed_key, self.config.num_wallets)?;

        let swipe_address = self.resolve_swipe_contract(&chain).await?;

        info!("== Initializing demo wallets");
        let wallets = self.build_wallets(&chain, &keys, swipe_address)?;
        for index in 0..wallets.len() {
            info!("- Wallet #{} address: {}", index, wallets.get(index)?.signer.address());
        }
        info!("==");

        let domain = seismic_domain(&self.config.domain_name, &self.config.domain_version, chain.chain_id());
        self.simulate(&wallets, domain).await
    }

    /// Use the configured Swipe contract, or deploy a new one and tell the
    /// backend about it.
    async fn resolve_swipe_contract(&self, chain: &ChainConnection) -> Result<Address> {
        if let Some(address) = &self.config.swipe_contract_address {
            let address: Address = address
                .parse()
                .map_err(|e| SwipeError::Config(format!("Invalid swipe contract address {}: {}", address, e)))?;
            info!("== Using Swipe contract {}", address);
            return Ok(address);
        }

        let seismic_address = self.backend.seismic_address().await?;
        let artifact = SwipeArtifact::load(Path::new(&self.config.swipe_artifact_path))?;
        let deployer = WalletSigner::new(&self.config.signer_seed_key)?;
        let deployer = chain.signer_client(deployer.wallet());

        let address = deploy_swipe(deployer, artifact, seismic_address).await?;
        info!("== Deploying Swipe contract");
        info!("- Address: {}", address);
        info!("==");

        self.backend.upgrade_contract(address).await?;
        Ok(address)
    }

    fn build_wallets(&self, chain: &ChainConnection, keys: &[[u8; 32]], swipe_address: Address) -> Result<WalletSet> {
        let wallets = keys
            .iter()
            .map(|key| {
                let signer = WalletSigner::from_bytes(key)?;
                let client = chain.signer_client(signer.wallet());
                let contract: Arc<dyn ContractWriter> = Arc::new(EthersContractWriter::new(swipe_address, client));
                Ok(DemoWallet { signer, contract })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(WalletSet::new(wallets))
    }

    /// Register every configured like, then every dislike, one at a time,
    /// and finally query matches for the display wallet.
    pub async fn simulate(&self, wallets: &WalletSet, domain: EIP712Domain) -> Result<serde_json::Value> {
        let orchestrator = SwipeOrchestrator::new(
            DaRequester::new(self.backend.clone(), domain.clone()),
            SwipeRegistrar::new(),
        );
        let confirmation_delay = Duration::from_secs(self.config.confirmation_delay_secs);

        info!("== Simulating swipes");
        let swipes = self
            .config
            .like_pairs
            .iter()
            .map(|pair| (pair, true))
            .chain(self.config.dislike_pairs.iter().map(|pair| (pair, false)));

        for (&[sender, recipient], positive) in swipes {
            self.swipe_pair(&orchestrator, wallets, [sender, recipient], positive).await?;
            sleep(confirmation_delay).await;

            let label = if positive { "like" } else { "dislike" };
            info!("- Registered \"{}\" between [#{}, #{}]", label, sender, recipient);
        }
        info!("==");

        // Give transactions time to confirm
        sleep(Duration::from_secs(self.config.settle_delay_secs)).await;

        let display_wallet = self.config.display_wallet;
        info!("== Fetching matches for sample wallet {}", display_wallet);
        let fetcher = MatchFetcher::new(self.backend.clone(), domain);
        fetcher.fetch(&wallets.get(display_wallet)?.signer, 0).await
    }

    async fn swipe_pair(
        &self,
        orchestrator: &SwipeOrchestrator,
        wallets: &WalletSet,
        [sender, recipient]: WalletPair,
        positive: bool,
    ) -> Result<()> {
        let sender = wallets.get(sender)?;
        let recipient = wallets.get(recipient)?.signer.address();

        orchestrator
            .swipe(sender.contract.as_ref(), &sender.signer, recipient, positive)
            .await?;
        Ok(())
    }
}
