//! Relay-backed view client
//!
//! Posts view requests to the relay named in the address and accepts a view
//! only when the relay reports a verified proof.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::traits::{FetchError, ViewClient};
use crate::interop::address::RemoteViewAddress;
use crate::interop::errors::InteropError;
use crate::interop::types::{Credentials, View};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayViewRequest {
    pub address: String,
    pub sign_required: bool,
    pub requester: String,
    pub certificate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayViewResponse {
    pub status: String, // "OK", "VERIFICATION_FAILED", "REJECTED"
    #[serde(default)]
    pub proof: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Relay view client over HTTP
pub struct RelayViewClient {
    client: Client,
    scheme: &'static str,
}

impl RelayViewClient {
    pub fn new(use_tls: bool, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            scheme: if use_tls { "https" } else { "http" },
        })
    }

    pub fn views_url(&self, address: &RemoteViewAddress) -> String {
        format!("{}://{}/views", self.scheme, address.relay_endpoint)
    }
}

/// Turn a relay response into a verified view or a classified failure
pub fn interpret_response(address: &str, response: RelayViewResponse) -> Result<View, FetchError> {
    let error = response.error.unwrap_or_default();
    match response.status.as_str() {
        "OK" => {
            let proof = response
                .proof
                .ok_or_else(|| FetchError::VerificationFailed("relay returned no proof".to_string()))?;
            let proof = BASE64
                .decode(proof)
                .map_err(|e| FetchError::VerificationFailed(format!("proof is not base64: {}", e)))?;
            let payload = BASE64
                .decode(response.payload.unwrap_or_default())
                .map_err(|e| FetchError::VerificationFailed(format!("payload is not base64: {}", e)))?;
            Ok(View::new(address, proof, payload))
        }
        "VERIFICATION_FAILED" => Err(FetchError::VerificationFailed(error)),
        "REJECTED" => Err(FetchError::Rejected(error)),
        other => Err(FetchError::Rejected(format!(
            "unexpected relay status {}: {}",
            other, error
        ))),
    }
}

#[async_trait]
impl ViewClient for RelayViewClient {
    async fn fetch(
        &self,
        address: &str,
        sign_required: bool,
        credentials: &Credentials,
    ) -> Result<View, FetchError> {
        let parsed: RemoteViewAddress = address
            .parse()
            .map_err(|e: InteropError| FetchError::Rejected(e.to_string()))?;
        let url = self.views_url(&parsed);

        let body = RelayViewRequest {
            address: address.to_string(),
            sign_required,
            requester: credentials.user.clone(),
            certificate: credentials.certificate.clone(),
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::Unreachable(format!(
                "relay request failed: {} - {}",
                status, error_text
            )));
        }

        let decoded: RelayViewResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Unreachable(format!("malformed relay response: {}", e)))?;
        interpret_response(address, decoded)
    }

    fn name(&self) -> &str {
        "relay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: &str, proof: Option<&str>, payload: Option<&str>) -> RelayViewResponse {
        RelayViewResponse {
            status: status.to_string(),
            proof: proof.map(str::to_string),
            payload: payload.map(str::to_string),
            error: Some("details".to_string()),
        }
    }

    #[test]
    fn test_views_url() {
        let client = RelayViewClient::new(false, Duration::from_secs(5)).unwrap();
        let address: RemoteViewAddress = "localhost:9083/network2/mychannel:simpleasset:GetAssetClaimStatus:p1"
            .parse()
            .unwrap();
        assert_eq!(client.views_url(&address), "http://localhost:9083/views");
    }

    #[test]
    fn test_ok_response_decodes_view() {
        let proof = BASE64.encode(b"sig");
        let payload = BASE64.encode(br#"{"claimed":false}"#);

        let view = interpret_response("addr", response("OK", Some(&proof), Some(&payload))).unwrap();
        assert_eq!(view.address, "addr");
        assert_eq!(view.proof, b"sig".to_vec());
        assert_eq!(view.payload, br#"{"claimed":false}"#.to_vec());
    }

    #[test]
    fn test_ok_without_proof_is_not_trusted() {
        let result = interpret_response("addr", response("OK", None, Some("e30=")));
        assert!(matches!(result, Err(FetchError::VerificationFailed(_))));

        let result = interpret_response("addr", response("OK", Some("%%%"), Some("e30=")));
        assert!(matches!(result, Err(FetchError::VerificationFailed(_))));
    }

    #[test]
    fn test_failure_statuses() {
        assert!(matches!(
            interpret_response("a", response("VERIFICATION_FAILED", None, None)),
            Err(FetchError::VerificationFailed(e)) if e == "details"
        ));
        assert!(matches!(
            interpret_response("a", response("REJECTED", None, None)),
            Err(FetchError::Rejected(_))
        ));
        assert!(matches!(
            interpret_response("a", response("PENDING", None, None)),
            Err(FetchError::Rejected(e)) if e.contains("PENDING")
        ));
    }

    #[test]
    fn test_response_json_defaults() {
        let parsed: RelayViewResponse = serde_json::from_str(r#"{"status":"REJECTED"}"#).unwrap();
        assert!(parsed.proof.is_none());
        assert!(parsed.error.is_none());
    }
}
