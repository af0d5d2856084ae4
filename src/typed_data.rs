//! EIP-712 schemas for swipe and match requests
//!
//! The backend and the Swipe contract recompute these digests, so labels,
//! field names and types must match theirs exactly.

use std::collections::BTreeMap;

use ethers::types::transaction::eip712::{EIP712Domain, Eip712DomainType, TypedData, Types};
use ethers::types::U256;
use serde::Serialize;

use crate::error::Result;
use crate::types::{MatchQuery, SwipeIntent, Tx};

/// Label of the DA request schema; the signed primary type is `SwipeDAReqTx`
pub const SWIPE_DA_REQ_LABEL: &str = "SwipeDAReq";
const SWIPE_DA_REQ_FIELDS: &[(&str, &str)] = &[
    ("recipient", "address"),
    ("positive", "bool"),
    ("blind", "uint256"),
];

/// Label of the match query schema; the signed primary type is `SwipeMatchTx`
pub const SWIPE_MATCH_LABEL: &str = "SwipeMatch";
const SWIPE_MATCH_FIELDS: &[(&str, &str)] = &[("startIndex", "uint256")];

pub fn seismic_domain(name: &str, version: &str, chain_id: u64) -> EIP712Domain {
    EIP712Domain {
        name: Some(name.to_string()),
        version: Some(version.to_string()),
        chain_id: Some(U256::from(chain_id)),
        verifying_contract: None,
        salt: None,
    }
}

pub fn swipe_da_request(domain: &EIP712Domain, tx: &Tx<SwipeIntent>) -> Result<TypedData> {
    labeled_tx(domain, SWIPE_DA_REQ_LABEL, SWIPE_DA_REQ_FIELDS, tx)
}

pub fn swipe_match_query(domain: &EIP712Domain, tx: &Tx<MatchQuery>) -> Result<TypedData> {
    labeled_tx(domain, SWIPE_MATCH_LABEL, SWIPE_MATCH_FIELDS, tx)
}

/// `{label}Tx(uint256 nonce,{label} body)` wrapping the wire transaction as
/// its message
fn labeled_tx<B: Serialize>(
    domain: &EIP712Domain,
    label: &str,
    body_fields: &[(&str, &str)],
    tx: &Tx<B>,
) -> Result<TypedData> {
    let primary_type = format!("{}Tx", label);

    let mut types = Types::new();
    types.insert("EIP712Domain".to_string(), domain_fields(domain));
    types.insert(
        primary_type.clone(),
        fields(&[("nonce", "uint256"), ("body", label)]),
    );
    types.insert(label.to_string(), fields(body_fields));

    let message: BTreeMap<String, serde_json::Value> = serde_json::from_value(serde_json::to_value(tx)?)?;

    Ok(TypedData {
        domain: domain.clone(),
        types,
        primary_type,
        message,
    })
}

fn fields(pairs: &[(&str, &str)]) -> Vec<Eip712DomainType> {
    pairs
        .iter()
        .map(|(name, ty)| Eip712DomainType {
            name: name.to_string(),
            r#type: ty.to_string(),
        })
        .collect()
}

fn domain_fields(domain: &EIP712Domain) -> Vec<Eip712DomainType> {
    let mut pairs = Vec::new();
    if domain.name.is_some() {
        pairs.push(("name", "string"));
    }
    if domain.version.is_some() {
        pairs.push(("version", "string"));
    }
    if domain.chain_id.is_some() {
        pairs.push(("chainId", "uint256"));
    }
    if domain.verifying_contract.is_some() {
        pairs.push(("verifyingContract", "address"));
    }
    if domain.salt.is_some() {
        pairs.push(("salt", "bytes32"));
    }
    fields(&pairs)
}
