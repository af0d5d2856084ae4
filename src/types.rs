//! Wire types for the Seismic backend

use serde::{de, Deserialize, Deserializer, Serialize};

/// Body of `GET /authentication/nonce`
#[derive(Debug, Clone, Serialize)]
pub struct NonceRequest {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NonceResponse {
    #[serde(deserialize_with = "u64_from_number_or_string")]
    pub nonce: u64,
}

/// Application-level transaction: the signed envelope every swipe and match
/// request is wrapped in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tx<B> {
    /// Decimal string, as the backend expects big integers
    pub nonce: String,
    pub body: B,
}

/// Intent to swipe on a recipient. Only ever lives for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeIntent {
    /// EIP-55 checksummed address
    pub recipient: String,
    pub positive: bool,
    /// Decimal string
    pub blind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchQuery {
    pub start_index: u64,
}

/// `{ tx, signature }` body sent to the signed endpoints
#[derive(Debug, Clone, Serialize)]
pub struct SignedRequest<'a, B> {
    pub tx: &'a Tx<B>,
    pub signature: String,
}

/// Commitment plus the attestor's signature over it, returned by
/// `POST /swipe/davail`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DaAttestation {
    pub commitment: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeContractRequest {
    pub new_contract: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeismicAddressResponse {
    pub seismic_tomo_contract_address: String,
}

fn u64_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(de::Error::custom),
    }
}
