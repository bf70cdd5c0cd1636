//! Local ledger gateway client
//!
//! Submits invocations to the local network's ledger gateway over HTTP.

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::traits::LedgerClient;
use crate::interop::types::{Credentials, LocalInvocation};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub channel: String,
    pub contract: String,
    pub function: String,
    pub args: Vec<String>,
    pub user: String,
    pub certificate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub success: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl InvokeResponse {
    pub fn into_result(self) -> anyhow::Result<String> {
        if self.success {
            Ok(self.result.unwrap_or_default())
        } else {
            Err(anyhow!(self
                .error
                .unwrap_or_else(|| "transaction rejected without reason".to_string())))
        }
    }
}

pub struct GatewayLedgerClient {
    client: Client,
    gateway_url: String,
}

impl GatewayLedgerClient {
    pub fn new(gateway_url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        if gateway_url.is_empty() {
            bail!("gateway url is not configured");
        }

        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LedgerClient for GatewayLedgerClient {
    async fn invoke(
        &self,
        invocation: &LocalInvocation,
        credentials: &Credentials,
    ) -> anyhow::Result<String> {
        let body = InvokeRequest {
            channel: invocation.channel.clone(),
            contract: invocation.contract_name.clone(),
            function: invocation.function.clone(),
            args: invocation.args.clone(),
            user: credentials.user.clone(),
            certificate: credentials.certificate.clone(),
        };

        let response = self
            .client
            .post(&format!("{}/invoke", self.gateway_url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("gateway invoke failed: {} - {}", status, error_text);
        }

        let decoded: InvokeResponse = response.json().await?;
        decoded.into_result()
    }

    fn name(&self) -> &str {
        &self.gateway_url
    }
}
