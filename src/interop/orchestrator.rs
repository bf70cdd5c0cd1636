//! Interop Flow Orchestrator
//!
//! Runs one flow to completion: fetch every required view, substitute the
//! verified payloads into the local invocation, submit it once.
//!
//! The orchestrator is stateless between calls. Dropping an in-flight
//! `execute_flow` future before submission leaves no side effects; once the
//! invocation has been handed to the ledger it can no longer be cancelled.

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tokio::time::timeout;

use crate::configure::AppConfig;
use crate::interop::adapters::{FetchError, LedgerClient, ViewClient};
use crate::interop::errors::InteropError;
use crate::interop::request::InteropFlowRequest;
use crate::interop::types::{Credentials, FlowOutcome, LocalInvocation, View, ViewAddressSpec};
use crate::logging::{gen_flow_trace_id, LogEvent};

/// Orchestrator timeouts
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound for a single view fetch (ms)
    pub fetch_timeout_ms: u64,
    /// Upper bound for the local submission (ms)
    pub invoke_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 30_000,
            invoke_timeout_ms: 60_000,
        }
    }
}

impl From<&AppConfig> for OrchestratorConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            fetch_timeout_ms: cfg.fetch_timeout_ms,
            invoke_timeout_ms: cfg.invoke_timeout_ms,
        }
    }
}

pub struct InteropFlowOrchestrator {
    view_client: Arc<dyn ViewClient>,
    ledger: Arc<dyn LedgerClient>,
    config: OrchestratorConfig,
}

impl InteropFlowOrchestrator {
    pub fn new(
        view_client: Arc<dyn ViewClient>,
        ledger: Arc<dyn LedgerClient>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            view_client,
            ledger,
            config,
        }
    }

    /// Execute one interop flow
    ///
    /// Any fetch failure aborts the flow before the ledger is touched.
    /// Returns the local result plus the raw views for auditing.
    pub async fn execute_flow(&self, request: &InteropFlowRequest) -> Result<FlowOutcome, InteropError> {
        let function = request.local_invocation().function.clone();
        let trace_id = gen_flow_trace_id(&function, &request.credentials().user);

        log::info!(
            "[{}] starting flow {} on {}/{} with {} view(s) via {}",
            trace_id,
            function,
            request.local_invocation().channel,
            request.local_invocation().contract_name,
            request.view_addresses().len(),
            self.view_client.name()
        );

        let result = self.run(request).await;

        let event = LogEvent::new("INTEROP_FLOW")
            .field("trace_id", trace_id.as_str())
            .field("function", function.as_str())
            .field("views", request.view_addresses().len());
        match &result {
            Ok((local_result, _)) => {
                log::info!("{}", event.field("status", "ok").field("result", local_result.as_str()).build());
            }
            Err(e) => {
                log::warn!(
                    "{}",
                    event
                        .field("status", "failed")
                        .field("error_code", e.error_code())
                        .field("error", e.to_string())
                        .build()
                );
            }
        }

        let (local_result, views) = result?;
        Ok(FlowOutcome {
            trace_id,
            local_result,
            views,
        })
    }

    async fn run(&self, request: &InteropFlowRequest) -> Result<(String, Vec<View>), InteropError> {
        // 1. Fetch all views; independent fetches run concurrently
        let views = try_join_all(
            request
                .view_addresses()
                .iter()
                .map(|spec| self.fetch_view(spec, request.credentials())),
        )
        .await?;

        // 2. Substitute payloads by index, independent of fetch completion order
        let invocation = request.substitute(&views)?;
        log::debug!(
            "substituted {} view payload(s) into {}",
            views.len(),
            invocation.function
        );

        // 3. Submit exactly once
        let local_result = self.submit(&invocation, request.credentials()).await?;
        Ok((local_result, views))
    }

    /// Fetch and classify a single view
    pub async fn fetch_view(
        &self,
        spec: &ViewAddressSpec,
        credentials: &Credentials,
    ) -> Result<View, InteropError> {
        log::debug!("fetching view {} (sign={})", spec.address, spec.sign_required);

        let limit = Duration::from_millis(self.config.fetch_timeout_ms);
        let fetched = timeout(
            limit,
            self.view_client.fetch(&spec.address, spec.sign_required, credentials),
        )
        .await;

        let address = spec.address.clone();
        match fetched {
            Ok(Ok(view)) => Ok(view),
            Err(_) => Err(InteropError::RelayUnreachable {
                address,
                reason: format!("fetch timed out after {}ms", self.config.fetch_timeout_ms),
            }),
            Ok(Err(FetchError::Unreachable(reason))) => {
                Err(InteropError::RelayUnreachable { address, reason })
            }
            Ok(Err(FetchError::VerificationFailed(reason))) => {
                log::error!("view verification failed for {}: {}", address, reason);
                Err(InteropError::ViewVerificationFailed { address, reason })
            }
            Ok(Err(FetchError::Rejected(reason))) => {
                Err(InteropError::RemoteQueryRejected { address, reason })
            }
        }
    }

    async fn submit(
        &self,
        invocation: &LocalInvocation,
        credentials: &Credentials,
    ) -> Result<String, InteropError> {
        let limit = Duration::from_millis(self.config.invoke_timeout_ms);
        match timeout(limit, self.ledger.invoke(invocation, credentials)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(InteropError::LocalInvocationFailed {
                function: invocation.function.clone(),
                reason: format!("{:#}", e),
            }),
            Err(_) => Err(InteropError::LocalInvocationFailed {
                function: invocation.function.clone(),
                reason: format!(
                    "submission to {} timed out after {}ms",
                    self.ledger.name(),
                    self.config.invoke_timeout_ms
                ),
            }),
        }
    }
}
