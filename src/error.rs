//! Error types for the swipe demo

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum SwipeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend request to {endpoint} failed ({context}): {reason}")]
    Backend {
        endpoint: String,
        context: String,
        reason: String,
    },

    #[error("Could not acquire data availability signature: {0}")]
    DataAvailability(String),

    #[error("Error registering swipe: {reason}")]
    Registration {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid attestation signature: {0}")]
    InvalidSignature(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Hex encoding error: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl SwipeError {
    pub fn backend(endpoint: &str, context: impl Into<String>, reason: impl Into<String>) -> Self {
        SwipeError::Backend {
            endpoint: endpoint.to_string(),
            context: context.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SwipeError>;
