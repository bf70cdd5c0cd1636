//! Transfer Protocol
//!
//! Pledge / claim / reclaim on top of the interop flow orchestrator.
//!
//! - Claim runs on the destination ledger with a pledge-status view fetched
//!   from the source network.
//! - Reclaim runs on the source ledger with a claim-status view fetched from
//!   the destination network.
//!
//! Preconditions (recipient, pledger, expiry, terminal state) are enforced by
//! the local contracts; their rejections surface as `LocalInvocationFailed`.
//! All argument and configuration checks happen before any I/O.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::configure::NetworkDirectory;
use crate::interop::address::{
    build_claim_status_address, build_pledge_status_address, ClaimStatusQuery, PledgeStatusQuery,
};
use crate::interop::errors::InteropError;
use crate::interop::orchestrator::InteropFlowOrchestrator;
use crate::interop::request::InteropFlowRequest;
use crate::interop::types::{
    AssetCategory, AssetParam, ClaimStatus, Credentials, FlowOutcome, LocalInvocation, PledgeRecord,
    View, ViewAddressSpec,
};

/// Argument slot that receives the remote view in claim and reclaim calls
pub const VIEW_ARG_INDEX: usize = 5;

/// Lock an asset on the local (source) ledger for a remote recipient
#[derive(Debug, Clone)]
pub struct PledgeParams {
    pub category: String,
    /// `<assetType>:<idOrQuantity>`
    pub param: String,
    pub local_network: String,
    pub remote_network: String,
    pub recipient_cert: String,
    pub expiry_secs: u64,
}

/// Claim a remote pledge on the local (destination) ledger; caller is the recipient
#[derive(Debug, Clone)]
pub struct ClaimParams {
    pub category: String,
    pub param: String,
    pub pledge_id: String,
    pub local_network: String,
    pub source_network: String,
    pub pledger_cert: String,
}

/// Recover an expired pledge on the local (source) ledger; caller is the pledger
#[derive(Debug, Clone)]
pub struct ReclaimParams {
    pub category: String,
    pub param: String,
    pub pledge_id: String,
    pub local_network: String,
    pub dest_network: String,
    pub recipient_cert: String,
    pub expiry_secs: u64,
}

pub struct TransferProtocol {
    orchestrator: Arc<InteropFlowOrchestrator>,
    networks: NetworkDirectory,
}

fn require(name: &str, value: &str) -> Result<(), InteropError> {
    if value.is_empty() {
        return Err(InteropError::InvalidInput(format!("{} is required", name)));
    }
    Ok(())
}

impl TransferProtocol {
    pub fn new(orchestrator: Arc<InteropFlowOrchestrator>, networks: NetworkDirectory) -> Self {
        Self {
            orchestrator,
            networks,
        }
    }

    fn local_invocation(
        &self,
        network: &str,
        function: &str,
        args: Vec<String>,
    ) -> Result<LocalInvocation, InteropError> {
        let profile = self.networks.local(network)?;
        Ok(LocalInvocation {
            channel: profile.channel.clone(),
            contract_name: profile.contract.clone(),
            function: function.to_string(),
            args,
        })
    }

    /// Pledge an asset; the local result is the pledge id assigned by the ledger
    pub async fn pledge(
        &self,
        params: &PledgeParams,
        credentials: &Credentials,
    ) -> Result<FlowOutcome, InteropError> {
        let category = AssetCategory::parse(&params.category)?;
        let asset = AssetParam::parse(category, &params.param)?;
        require("recipient certificate", &params.recipient_cert)?;
        require("remote network", &params.remote_network)?;

        let invocation = self.local_invocation(
            &params.local_network,
            category.pledge_function(),
            vec![
                asset.asset_type.clone(),
                asset.asset.to_string(),
                params.remote_network.clone(),
                params.recipient_cert.clone(),
                params.expiry_secs.to_string(),
            ],
        )?;

        log::info!(
            "pledging {} {} to {} (expiry {})",
            asset.asset_type, asset.asset, params.remote_network, params.expiry_secs
        );
        let request = InteropFlowRequest::local_only(invocation, credentials.clone());
        self.orchestrator.execute_flow(&request).await
    }

    fn pledge_status_spec(
        &self,
        category: &str,
        pledge_id: &str,
        source_network: &str,
        recipient_network: &str,
        recipient_cert: &str,
    ) -> Result<ViewAddressSpec, InteropError> {
        let address = build_pledge_status_address(
            &self.networks,
            &PledgeStatusQuery {
                category,
                pledge_id,
                source_network,
                recipient_network,
                recipient_cert,
            },
        )?;
        Ok(ViewAddressSpec {
            address: address.to_string(),
            sign_required: true,
        })
    }

    /// Claim a pledged asset with proof of the pledge from the source network
    pub async fn claim(
        &self,
        params: &ClaimParams,
        credentials: &Credentials,
    ) -> Result<FlowOutcome, InteropError> {
        let category = AssetCategory::parse(&params.category)?;
        let asset = AssetParam::parse(category, &params.param)?;
        require("pledge id", &params.pledge_id)?;
        require("pledger certificate", &params.pledger_cert)?;

        let spec = self.pledge_status_spec(
            &params.category,
            &params.pledge_id,
            &params.source_network,
            &params.local_network,
            &credentials.certificate,
        )?;

        let invocation = self.local_invocation(
            &params.local_network,
            category.claim_function(),
            vec![
                params.pledge_id.clone(),
                asset.asset_type.clone(),
                asset.asset.to_string(),
                params.pledger_cert.clone(),
                params.source_network.clone(),
                String::new(),
            ],
        )?;

        log::info!(
            "claiming pledge {} from {} ({} {})",
            params.pledge_id, params.source_network, asset.asset_type, asset.asset
        );
        let request = InteropFlowRequest::new(
            invocation,
            vec![spec],
            BTreeMap::from([(0, VIEW_ARG_INDEX)]),
            credentials.clone(),
        )?;
        self.orchestrator.execute_flow(&request).await
    }

    fn claim_status_spec(
        &self,
        params: &ReclaimParams,
        asset: &AssetParam,
        pledger_cert: &str,
    ) -> Result<ViewAddressSpec, InteropError> {
        let asset_id_or_qty = asset.asset.to_string();
        let address = build_claim_status_address(
            &self.networks,
            &ClaimStatusQuery {
                category: &params.category,
                asset_type: &asset.asset_type,
                asset_id_or_qty: &asset_id_or_qty,
                pledge_id: &params.pledge_id,
                pledger_cert,
                source_network: &params.local_network,
                recipient_cert: &params.recipient_cert,
                dest_network: &params.dest_network,
                expiry_secs: params.expiry_secs,
            },
        )?;
        Ok(ViewAddressSpec {
            address: address.to_string(),
            sign_required: true,
        })
    }

    /// Reclaim an expired pledge with proof that it was never claimed
    pub async fn reclaim(
        &self,
        params: &ReclaimParams,
        credentials: &Credentials,
    ) -> Result<FlowOutcome, InteropError> {
        let category = AssetCategory::parse(&params.category)?;
        let asset = AssetParam::parse(category, &params.param)?;
        require("pledge id", &params.pledge_id)?;
        require("recipient certificate", &params.recipient_cert)?;

        let spec = self.claim_status_spec(params, &asset, &credentials.certificate)?;

        let invocation = self.local_invocation(
            &params.local_network,
            category.reclaim_function(),
            vec![
                params.pledge_id.clone(),
                asset.asset_type.clone(),
                asset.asset.to_string(),
                params.recipient_cert.clone(),
                params.dest_network.clone(),
                String::new(),
            ],
        )?;

        log::info!(
            "reclaiming pledge {} after {} ({} {})",
            params.pledge_id, params.expiry_secs, asset.asset_type, asset.asset
        );
        let request = InteropFlowRequest::new(
            invocation,
            vec![spec],
            BTreeMap::from([(0, VIEW_ARG_INDEX)]),
            credentials.clone(),
        )?;
        self.orchestrator.execute_flow(&request).await
    }

    /// Fetch the verified pledge record from the source network
    pub async fn pledge_status(
        &self,
        params: &ClaimParams,
        credentials: &Credentials,
    ) -> Result<PledgeRecord, InteropError> {
        AssetCategory::parse(&params.category)?;
        let spec = self.pledge_status_spec(
            &params.category,
            &params.pledge_id,
            &params.source_network,
            &params.local_network,
            &credentials.certificate,
        )?;
        let view = self.orchestrator.fetch_view(&spec, credentials).await?;
        decode(&view)
    }

    /// Fetch the verified claim status from the destination network
    pub async fn claim_status(
        &self,
        params: &ReclaimParams,
        credentials: &Credentials,
    ) -> Result<ClaimStatus, InteropError> {
        let category = AssetCategory::parse(&params.category)?;
        let asset = AssetParam::parse(category, &params.param)?;
        let spec = self.claim_status_spec(params, &asset, &credentials.certificate)?;
        let view = self.orchestrator.fetch_view(&spec, credentials).await?;
        decode(&view)
    }
}

fn decode<T: for<'de> serde::Deserialize<'de>>(view: &View) -> Result<T, InteropError> {
    view.decode_payload().map_err(|e| InteropError::RemoteQueryRejected {
        address: view.address.clone(),
        reason: format!("undecodable view payload: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configure::NetworkProfile;
    use crate::interop::adapters::{MockLedger, MockViewClient};
    use crate::interop::orchestrator::OrchestratorConfig;

    fn directory() -> NetworkDirectory {
        let mut dir = NetworkDirectory::default();
        for (network, relay) in [("network1", "localhost:9080"), ("network2", "localhost:9083")] {
            dir.insert(
                network,
                NetworkProfile {
                    relay_endpoint: relay.to_string(),
                    channel: "mychannel".to_string(),
                    contract: "simpleasset".to_string(),
                    gateway_url: String::new(),
                },
            );
        }
        dir
    }

    fn setup() -> (Arc<MockViewClient>, Arc<MockLedger>, TransferProtocol) {
        let views = Arc::new(MockViewClient::new("relay"));
        let ledger = Arc::new(MockLedger::new("local"));
        let orchestrator = Arc::new(InteropFlowOrchestrator::new(
            views.clone(),
            ledger.clone(),
            OrchestratorConfig::default(),
        ));
        (views, ledger, TransferProtocol::new(orchestrator, directory()))
    }

    fn reclaim_params(param: &str, dest: &str) -> ReclaimParams {
        ReclaimParams {
            category: "token".to_string(),
            param: param.to_string(),
            pledge_id: "p1".to_string(),
            local_network: "network1".to_string(),
            dest_network: dest.to_string(),
            recipient_cert: "Ym9i".to_string(),
            expiry_secs: 1_700_000_000,
        }
    }

    fn alice() -> Credentials {
        Credentials::new("alice", "YWxpY2U=")
    }

    #[tokio::test]
    async fn test_reclaim_builds_claim_status_flow() {
        let (views, ledger, protocol) = setup();

        protocol.reclaim(&reclaim_params("token1:50", "network2"), &alice()).await.unwrap();

        assert_eq!(views.fetch_count(), 1);
        let submitted = ledger.invocations();
        assert_eq!(submitted[0].function, "ReclaimTokenAsset");
        assert_eq!(submitted[0].args[..5], ["p1", "token1", "50", "Ym9i", "network2"]);
        let expected_view = "localhost:9083/network2/mychannel:simpleasset:GetTokenAssetClaimStatus:\
                             token1:50:p1:YWxpY2U=:network1:Ym9i:network2:1700000000";
        let payload = format!("payload:{}", expected_view);
        let filled = &submitted[0].args[VIEW_ARG_INDEX];
        assert_eq!(
            filled,
            &View::new("", vec![], payload.into_bytes()).payload_base64()
        );
    }

    #[tokio::test]
    async fn test_bad_quantity_fails_before_io() {
        let (views, ledger, protocol) = setup();

        let err = protocol.reclaim(&reclaim_params("token1:abc", "network2"), &alice()).await.unwrap_err();

        assert!(matches!(err, InteropError::InvalidQuantity(_)));
        assert_eq!(views.fetch_count(), 0);
        assert_eq!(ledger.invoke_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_destination_fails_before_io() {
        let (views, ledger, protocol) = setup();

        let err = protocol.reclaim(&reclaim_params("token1:50", "network9"), &alice()).await.unwrap_err();

        assert!(matches!(err, InteropError::InvalidDestinationNetwork(_)));
        assert!(err.is_pre_io());
        assert_eq!(views.fetch_count(), 0);
        assert_eq!(ledger.invoke_count(), 0);
    }

    #[tokio::test]
    async fn test_claim_queries_source_network() {
        let (views, ledger, protocol) = setup();
        let params = ClaimParams {
            category: "bond".to_string(),
            param: "bond01:a03".to_string(),
            pledge_id: "p1".to_string(),
            local_network: "network2".to_string(),
            source_network: "network1".to_string(),
            pledger_cert: "YWxpY2U=".to_string(),
        };
        let bob = Credentials::new("bob", "Ym9i");

        let outcome = protocol.claim(&params, &bob).await.unwrap();

        assert_eq!(views.fetch_count(), 1);
        assert_eq!(
            outcome.views[0].address,
            "localhost:9080/network1/mychannel:simpleasset:GetAssetPledgeStatus:p1:network1:network2:Ym9i"
        );
        let submitted = ledger.invocations();
        assert_eq!(submitted[0].function, "ClaimAsset");
        assert_eq!(submitted[0].args[..5], ["p1", "bond01", "a03", "YWxpY2U=", "network1"]);
    }

    #[tokio::test]
    async fn test_unrecognized_category_is_fatal() {
        let (views, _, protocol) = setup();
        let mut params = reclaim_params("x:1", "network2");
        params.category = "nft".to_string();

        let err = protocol.reclaim(&params, &alice()).await.unwrap_err();
        assert!(matches!(err, InteropError::UnrecognizedCategory(_)));
        assert_eq!(views.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_pledge_is_local_only() {
        let (views, ledger, protocol) = setup();
        ledger.set_result(Ok("p-42".to_string()));
        let params = PledgeParams {
            category: "token".to_string(),
            param: "token1:50".to_string(),
            local_network: "network1".to_string(),
            remote_network: "network2".to_string(),
            recipient_cert: "Ym9i".to_string(),
            expiry_secs: 1_700_000_000,
        };

        let outcome = protocol.pledge(&params, &alice()).await.unwrap();

        assert_eq!(outcome.local_result, "p-42");
        assert_eq!(views.fetch_count(), 0);
        assert_eq!(ledger.invocations()[0].function, "PledgeTokenAsset");
    }
}
