//! Client for the Seismic backend HTTP API

use std::time::Duration;

use alloy_primitives::Address;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Result, SwipeError};
use crate::types::{
    DaAttestation, MatchQuery, NonceRequest, NonceResponse, SeismicAddressResponse, SignedRequest,
    SwipeIntent, Tx, UpgradeContractRequest,
};

pub const NONCE_PATH: &str = "/authentication/nonce";
pub const DAVAIL_PATH: &str = "/swipe/davail";
pub const MATCHES_PATH: &str = "/swipe/matches";
pub const UPGRADE_CONTRACT_PATH: &str = "/swipe/upgradecontract";
pub const SEISMIC_ADDRESS_PATH: &str = "/swipe/getseismicaddress";

pub struct BackendClient {
    endpoint: String,
    client: Client,
}

impl BackendClient {
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SwipeError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// Seismic tracks a nonce per address to reject replayed requests. This is
    /// not the account nonce the chain tracks.
    pub async fn nonce(&self, address: Address) -> Result<u64> {
        let context = format!("nonce for address {}", address.to_checksum(None));
        let request = self.client.get(self.url(NONCE_PATH)).json(&NonceRequest {
            address: address.to_checksum(None),
        });

        let response = self.send(NONCE_PATH, &context, request).await?;
        let body: NonceResponse = self.read_json(NONCE_PATH, &context, response).await?;

        debug!("Nonce for {}: {}", address, body.nonce);
        Ok(body.nonce)
    }

    /// Submit a signed swipe intent for data availability. A refused intent
    /// or unusable attestation is a data availability error; failing to reach
    /// the backend at all is a backend error.
    pub async fn davail(&self, tx: &Tx<SwipeIntent>, signature: String) -> Result<DaAttestation> {
        let context = "data availability request";
        let request = self
            .client
            .post(self.url(DAVAIL_PATH))
            .json(&SignedRequest { tx, signature });

        debug!("Requesting DA signature from {}", self.url(DAVAIL_PATH));
        let response = request
            .send()
            .await
            .map_err(|e| SwipeError::backend(DAVAIL_PATH, context, describe_transport_error(&e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SwipeError::DataAvailability(format!(
                "backend returned {}: {}",
                status, error_text
            )));
        }

        response.json::<DaAttestation>().await.map_err(|e| {
            if e.is_timeout() {
                SwipeError::backend(DAVAIL_PATH, context, describe_transport_error(&e))
            } else {
                SwipeError::DataAvailability(format!("malformed attestation: {}", e))
            }
        })
    }

    /// Matches as the backend reports them, starting at `startIndex`
    pub async fn matches(&self, tx: &Tx<MatchQuery>, signature: String) -> Result<serde_json::Value> {
        let context = format!("matches from index {}", tx.body.start_index);
        let request = self
            .client
            .get(self.url(MATCHES_PATH))
            .json(&SignedRequest { tx, signature });

        let response = self.send(MATCHES_PATH, &context, request).await?;
        self.read_json(MATCHES_PATH, &context, response).await
    }

    /// Point the backend at a newly deployed Swipe contract
    pub async fn upgrade_contract(&self, new_contract: Address) -> Result<()> {
        let context = format!("upgrade to contract {}", new_contract.to_checksum(None));
        let request = self
            .client
            .post(self.url(UPGRADE_CONTRACT_PATH))
            .json(&UpgradeContractRequest {
                new_contract: new_contract.to_checksum(None),
            });

        self.send(UPGRADE_CONTRACT_PATH, &context, request).await?;
        Ok(())
    }

    /// Address of the SeismicTomo contract the Swipe contract verifies against
    pub async fn seismic_address(&self) -> Result<Address> {
        let context = "seismic contract address";
        let request = self.client.get(self.url(SEISMIC_ADDRESS_PATH));

        let response = self.send(SEISMIC_ADDRESS_PATH, context, request).await?;
        let body: SeismicAddressResponse = self.read_json(SEISMIC_ADDRESS_PATH, context, response).await?;

        body.seismic_tomo_contract_address.parse().map_err(|e| {
            SwipeError::backend(SEISMIC_ADDRESS_PATH, context, format!("invalid address: {}", e))
        })
    }

    async fn send(&self, path: &str, context: &str, request: RequestBuilder) -> Result<Response> {
        debug!("Backend request: {} ({})", path, context);

        let response = request
            .send()
            .await
            .map_err(|e| SwipeError::backend(path, context, describe_transport_error(&e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SwipeError::backend(
                path,
                context,
                format!("status {}: {}", status, error_text),
            ));
        }

        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &str, context: &str, response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| SwipeError::backend(path, context, format!("malformed response: {}", e)))
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {}", error)
    } else {
        format!("failed to send request: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::io::Write;
    use tokio_test::assert_err;

    fn address() -> Address {
        "0x00000000000000000000000000000000000000aa".parse().unwrap()
    }

    fn client(server: &mockito::ServerGuard) -> BackendClient {
        BackendClient::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_normalization() {
        let client = BackendClient::new("http://localhost:4000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:4000");
        assert_eq!(client.url(NONCE_PATH), "http://localhost:4000/authentication/nonce");
    }

    #[tokio::test]
    async fn test_nonce_sends_address() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", NONCE_PATH)
            .match_body(Matcher::Json(serde_json::json!({
                "address": address().to_checksum(None)
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"nonce": 4}"#)
            .create_async()
            .await;

        let nonce = client(&server).nonce(address()).await.unwrap();
        assert_eq!(nonce, 4);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_nonce_failure_names_address() {
        let mut server = mockito::Server::new_async().await;
        let _nonce = server
            .mock("GET", NONCE_PATH)
            .with_status(500)
            .create_async()
            .await;

        let err = assert_err!(client(&server).nonce(address()).await);
        match &err {
            SwipeError::Backend { endpoint, context, .. } => {
                assert_eq!(endpoint, NONCE_PATH);
                assert!(context.contains(&address().to_checksum(None)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_backend_error() {
        // Nothing listens on the discard port.
        let client = BackendClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let err = assert_err!(client.nonce(address()).await);
        assert!(matches!(err, SwipeError::Backend { .. }));
    }

    #[tokio::test]
    async fn test_davail_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _davail = server
            .mock("POST", DAVAIL_PATH)
            .with_status(400)
            .with_body("bad signature")
            .create_async()
            .await;

        let err = assert_err!(client(&server).davail(&intent(), "0x00".to_string()).await);
        match err {
            SwipeError::DataAvailability(reason) => assert!(reason.contains("bad signature")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    fn intent() -> Tx<SwipeIntent> {
        Tx {
            nonce: "0".to_string(),
            body: SwipeIntent {
                recipient: address().to_checksum(None),
                positive: true,
                blind: "1".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_davail_malformed_attestation() {
        let mut server = mockito::Server::new_async().await;
        let _davail = server
            .mock("POST", DAVAIL_PATH)
            .with_status(200)
            .with_body(r#"{"commitment": "01"}"#)
            .create_async()
            .await;

        let err = assert_err!(client(&server).davail(&intent(), "0x00".to_string()).await);
        assert!(matches!(err, SwipeError::DataAvailability(_)));
    }

    #[tokio::test]
    async fn test_davail_slow_response_is_backend_error() {
        let mut server = mockito::Server::new_async().await;
        let _davail = server
            .mock("POST", DAVAIL_PATH)
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(1000));
                w.write_all(br#"{"commitment": "01", "signature": "0x00"}"#)
            })
            .create_async()
            .await;

        let client = BackendClient::new(&server.url(), Duration::from_millis(200)).unwrap();
        let err = assert_err!(client.davail(&intent(), "0x00".to_string()).await);
        match err {
            SwipeError::Backend { endpoint, reason, .. } => {
                assert_eq!(endpoint, DAVAIL_PATH);
                assert!(reason.contains("timed out"), "{}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_davail_silent_backend_is_backend_error() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let client = BackendClient::new(&endpoint, Duration::from_millis(200)).unwrap();
        let err = assert_err!(client.davail(&intent(), "0x00".to_string()).await);
        match err {
            SwipeError::Backend { endpoint, reason, .. } => {
                assert_eq!(endpoint, DAVAIL_PATH);
                assert!(reason.contains("timed out"), "{}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_matches_returned_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!([{"recipient": "0x01", "blockNumber": 12}]);
        let _matches = server
            .mock("GET", MATCHES_PATH)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "tx": {"nonce": "2", "body": {"startIndex": 0}}
            })))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let tx = Tx {
            nonce: "2".to_string(),
            body: MatchQuery { start_index: 0 },
        };
        let matches = client(&server).matches(&tx, "0x00".to_string()).await.unwrap();
        assert_eq!(matches, body);
    }

    #[tokio::test]
    async fn test_upgrade_contract() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", UPGRADE_CONTRACT_PATH)
            .match_body(Matcher::Json(serde_json::json!({
                "newContract": address().to_checksum(None)
            })))
            .with_status(200)
            .create_async()
            .await;

        client(&server).upgrade_contract(address()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_seismic_address() {
        let mut server = mockito::Server::new_async().await;
        let _seismic = server
            .mock("GET", SEISMIC_ADDRESS_PATH)
            .with_status(200)
            .with_body(r#"{"seismicTomoContractAddress": "0x00000000000000000000000000000000000000aa"}"#)
            .create_async()
            .await;

        assert_eq!(client(&server).seismic_address().await.unwrap(), address());
    }

    #[tokio::test]
    async fn test_seismic_address_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _seismic = server
            .mock("GET", SEISMIC_ADDRESS_PATH)
            .with_status(503)
            .create_async()
            .await;

        let err = assert_err!(client(&server).seismic_address().await);
        assert!(matches!(err, SwipeError::Backend { .. }));
    }
}
