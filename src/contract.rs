//! Swipe contract bindings

use std::path::Path;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use ethers::{
    abi::Abi,
    contract::{abigen, ContractFactory},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer as _},
    types::{Address as EthAddress, Bytes, U256 as EthU256, U64},
};
use serde::Deserialize;
use tracing::info;

use crate::error::{BoxError, Result, SwipeError};
use crate::registrar::StructuredSignature;

abigen!(
    SwipeContract,
    r#"[
        function swipe(uint256 commitment, uint8 v, bytes32 r, bytes32 s) external
    ]"#
);

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Capability to submit swipe transactions from one wallet
#[async_trait]
pub trait ContractWriter: Send + Sync {
    fn address(&self) -> Address;

    /// Send the swipe and wait for it to be mined. `Ok(None)` means the
    /// transaction was dropped without a receipt.
    async fn swipe(&self, commitment: U256, signature: &StructuredSignature) -> std::result::Result<Option<B256>, BoxError>;
}

pub struct EthersContractWriter {
    contract: SwipeContract<SignerClient>,
}

impl EthersContractWriter {
    pub fn new(address: Address, client: Arc<SignerClient>) -> Self {
        Self {
            contract: SwipeContract::new(to_eth_address(address), client),
        }
    }
}

#[async_trait]
impl ContractWriter for EthersContractWriter {
    fn address(&self) -> Address {
        from_eth_address(self.contract.address())
    }

    async fn swipe(&self, commitment: U256, signature: &StructuredSignature) -> std::result::Result<Option<B256>, BoxError> {
        let commitment = EthU256::from_big_endian(&commitment.to_be_bytes::<32>());
        let call = self
            .contract
            .swipe(commitment, signature.v, signature.r, signature.s);

        let pending = call.send().await?;
        let receipt = match pending.await? {
            Some(receipt) => receipt,
            None => return Ok(None),
        };

        if receipt.status == Some(U64::zero()) {
            return Err(format!("transaction {:?} reverted", receipt.transaction_hash).into());
        }

        Ok(Some(B256::from(receipt.transaction_hash.0)))
    }
}

/// JSON-RPC connection shared by every demo wallet
pub struct ChainConnection {
    provider: Provider<Http>,
    chain_id: u64,
}

impl ChainConnection {
    pub async fn connect(rpc_url: &str) -> Result<Self> {
        info!("Connecting to RPC: {}", rpc_url);

        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| SwipeError::Contract(format!("Failed to create provider: {}", e)))?;

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| SwipeError::Contract(format!("Failed to get chain ID: {}", e)))?;

        Ok(Self {
            provider,
            chain_id: chain_id.as_u64(),
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Transaction-signing client for one wallet
    pub fn signer_client(&self, wallet: &LocalWallet) -> Arc<SignerClient> {
        let wallet = wallet.clone().with_chain_id(self.chain_id);
        Arc::new(SignerMiddleware::new(self.provider.clone(), wallet))
    }
}

/// Foundry build output for the Swipe contract
#[derive(Debug, Deserialize)]
pub struct SwipeArtifact {
    pub abi: Abi,
    pub bytecode: ArtifactBytecode,
}

#[derive(Debug, Deserialize)]
pub struct ArtifactBytecode {
    pub object: String,
}

impl SwipeArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SwipeError::Config(format!("Failed to read contract artifact {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn bytecode(&self) -> Result<Bytes> {
        let object = self.bytecode.object.trim_start_matches("0x");
        Ok(Bytes::from(hex::decode(object)?))
    }
}

/// Deploy a fresh Swipe contract that trusts `seismic_address` for DA
/// signatures.
pub async fn deploy_swipe(
    deployer: Arc<SignerClient>,
    artifact: SwipeArtifact,
    seismic_address: Address,
) -> Result<Address> {
    let bytecode = artifact.bytecode()?;
    let factory = ContractFactory::new(artifact.abi, bytecode, deployer);

    let contract = factory
        .deploy(to_eth_address(seismic_address))
        .map_err(|e| SwipeError::Contract(format!("Failed to encode constructor: {}", e)))?
        .send()
        .await
        .map_err(|e| SwipeError::Contract(format!("Swipe deployment failed: {}", e)))?;

    Ok(from_eth_address(contract.address()))
}

fn to_eth_address(address: Address) -> EthAddress {
    EthAddress::from_slice(address.as_slice())
}

pub(crate) fn from_eth_address(address: EthAddress) -> Address {
    Address::from_slice(address.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTIFACT: &str = r#"{
        "abi": [
            {
                "type": "constructor",
                "inputs": [{"name": "seismic", "type": "address", "internalType": "address"}],
                "stateMutability": "nonpayable"
            },
            {
                "type": "function",
                "name": "swipe",
                "inputs": [
                    {"name": "commitment", "type": "uint256", "internalType": "uint256"},
                    {"name": "v", "type": "uint8", "internalType": "uint8"},
                    {"name": "r", "type": "bytes32", "internalType": "bytes32"},
                    {"name": "s", "type": "bytes32", "internalType": "bytes32"}
                ],
                "outputs": [],
                "stateMutability": "nonpayable"
            }
        ],
        "bytecode": {"object": "0x6080604052"}
    }"#;

    #[test]
    fn test_artifact_parsing() {
        let artifact = SwipeArtifact::parse(ARTIFACT).unwrap();
        assert!(artifact.abi.constructor.is_some());
        assert!(artifact.abi.function("swipe").is_ok());
        assert_eq!(artifact.bytecode().unwrap().to_vec(), vec![0x60, 0x80, 0x60, 0x40, 0x52]);
    }

    #[test]
    fn test_artifact_without_prefix() {
        let artifact = SwipeArtifact::parse(&ARTIFACT.replace("0x6080604052", "6080604052")).unwrap();
        assert_eq!(artifact.bytecode().unwrap().len(), 5);
    }

    #[test]
    fn test_missing_artifact() {
        let err = SwipeArtifact::load(Path::new("/nonexistent/Swipe.json")).unwrap_err();
        assert!(matches!(err, SwipeError::Config(_)));
    }

    #[test]
    fn test_address_conversion() {
        let address = Address::repeat_byte(0x5a);
        assert_eq!(from_eth_address(to_eth_address(address)), address);
    }
}
