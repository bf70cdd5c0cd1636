//! Simulated ledgers and relay
//!
//! An in-memory pledge/claim contract with a settable clock, plus a relay
//! that answers view queries from those ledgers. Used for end-to-end tests
//! and local dry runs; every call on one ledger is serialized by its mutex,
//! which stands in for the ledger's transaction ordering.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::traits::{FetchError, LedgerClient, ViewClient};
use crate::interop::address::RemoteViewAddress;
use crate::interop::errors::InteropError;
use crate::interop::state::{transition, PledgeEvent, PledgeStatus};
use crate::interop::types::{
    AssetCategory, AssetRef, ClaimStatus, Credentials, LocalInvocation, PledgeRecord, View,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Pledge,
    Claim,
    Reclaim,
    PledgeQuery,
    ClaimQuery,
}

fn parse_function(function: &str) -> Option<(Operation, AssetCategory)> {
    use AssetCategory::*;
    use Operation::*;

    let parsed = match function {
        "PledgeAsset" => (Pledge, Bond),
        "PledgeTokenAsset" => (Pledge, Token),
        "ClaimAsset" => (Claim, Bond),
        "ClaimTokenAsset" => (Claim, Token),
        "ReclaimAsset" => (Reclaim, Bond),
        "ReclaimTokenAsset" => (Reclaim, Token),
        "GetAssetPledgeStatus" => (PledgeQuery, Bond),
        "GetTokenAssetPledgeStatus" => (PledgeQuery, Token),
        "GetAssetClaimStatus" => (ClaimQuery, Bond),
        "GetTokenAssetClaimStatus" => (ClaimQuery, Token),
        _ => return None,
    };
    Some(parsed)
}

fn expect_args(function: &str, args: &[String], n: usize) -> Result<(), String> {
    if args.len() != n {
        return Err(format!("{} expects {} arguments, got {}", function, n, args.len()));
    }
    Ok(())
}

fn parse_secs(value: &str) -> Result<u64, String> {
    value
        .parse::<u64>()
        .map_err(|_| format!("invalid timestamp '{}'", value))
}

fn decode_view_arg<T: for<'de> serde::Deserialize<'de>>(arg: &str) -> Result<T, String> {
    let bytes = BASE64
        .decode(arg)
        .map_err(|e| format!("view argument is not base64: {}", e))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("view argument is not a valid record: {}", e))
}

#[derive(Default)]
struct LedgerState {
    /// Pledges made on this ledger
    pledges: HashMap<String, PledgeRecord>,
    /// Remote pledges claimed on this ledger (status CLAIMED)
    claims: HashMap<String, PledgeRecord>,
    /// (asset type, bond id) -> owner certificate
    bonds: HashMap<(String, String), String>,
    /// (asset type, owner certificate) -> balance
    tokens: HashMap<(String, String), u64>,
}

impl LedgerState {
    fn debit(&mut self, asset_type: &str, asset: &AssetRef, owner: &str) -> Result<(), String> {
        match asset {
            AssetRef::Bond(id) => {
                let key = (asset_type.to_string(), id.clone());
                match self.bonds.get(&key) {
                    Some(current) if current == owner => {
                        self.bonds.remove(&key);
                        Ok(())
                    }
                    Some(_) => Err(format!("bond {}:{} is not owned by caller", asset_type, id)),
                    None => Err(format!("bond {}:{} does not exist", asset_type, id)),
                }
            }
            AssetRef::Token(quantity) => {
                let key = (asset_type.to_string(), owner.to_string());
                let balance = self.tokens.get(&key).copied().unwrap_or(0);
                if balance < *quantity {
                    return Err(format!(
                        "insufficient {} balance: have {}, need {}",
                        asset_type, balance, quantity
                    ));
                }
                self.tokens.insert(key, balance - quantity);
                Ok(())
            }
        }
    }

    fn credit(&mut self, asset_type: &str, asset: &AssetRef, owner: &str) {
        match asset {
            AssetRef::Bond(id) => {
                self.bonds
                    .insert((asset_type.to_string(), id.clone()), owner.to_string());
            }
            AssetRef::Token(quantity) => {
                *self
                    .tokens
                    .entry((asset_type.to_string(), owner.to_string()))
                    .or_insert(0) += quantity;
            }
        }
    }
}

/// In-memory ledger running the pledge/claim/reclaim contract
pub struct SimulatedLedger {
    network_id: String,
    clock: AtomicU64,
    state: Mutex<LedgerState>,
}

impl SimulatedLedger {
    pub fn new(network_id: &str, now_secs: u64) -> Self {
        Self {
            network_id: network_id.to_string(),
            clock: AtomicU64::new(now_secs),
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    pub fn now(&self) -> u64 {
        self.clock.load(Ordering::SeqCst)
    }

    pub fn set_time(&self, secs: u64) {
        self.clock.store(secs, Ordering::SeqCst);
    }

    pub fn issue_bond(&self, asset_type: &str, id: &str, owner: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .bonds
            .insert((asset_type.to_string(), id.to_string()), owner.to_string());
    }

    pub fn issue_tokens(&self, asset_type: &str, owner: &str, quantity: u64) {
        let mut state = self.state.lock().unwrap();
        state.credit(asset_type, &AssetRef::Token(quantity), owner);
    }

    pub fn bond_owner(&self, asset_type: &str, id: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .bonds
            .get(&(asset_type.to_string(), id.to_string()))
            .cloned()
    }

    pub fn token_balance(&self, asset_type: &str, owner: &str) -> u64 {
        let state = self.state.lock().unwrap();
        state
            .tokens
            .get(&(asset_type.to_string(), owner.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Seed a pledge record directly (the asset is assumed already locked)
    pub fn insert_pledge(&self, record: PledgeRecord) {
        let mut state = self.state.lock().unwrap();
        state.pledges.insert(record.pledge_id.clone(), record);
    }

    /// Status of a pledge made here, or of a remote pledge claimed here
    pub fn pledge_status(&self, pledge_id: &str) -> Option<PledgeStatus> {
        let state = self.state.lock().unwrap();
        state
            .pledges
            .get(pledge_id)
            .or_else(|| state.claims.get(pledge_id))
            .map(|r| r.status)
    }

    /// Execute a transaction as `caller`
    pub fn execute(&self, function: &str, args: &[String], caller: &str) -> Result<String, String> {
        let (operation, category) =
            parse_function(function).ok_or_else(|| format!("unknown function {}", function))?;

        match operation {
            Operation::Pledge => self.pledge(function, category, args, caller),
            Operation::Claim => self.claim(function, category, args, caller),
            Operation::Reclaim => self.reclaim(function, category, args, caller),
            Operation::PledgeQuery | Operation::ClaimQuery => {
                Err(format!("{} is a query, not a transaction", function))
            }
        }
    }

    /// Evaluate a read-only query, returning a JSON payload
    pub fn query(&self, function: &str, args: &[String]) -> Result<Vec<u8>, String> {
        let (operation, category) =
            parse_function(function).ok_or_else(|| format!("unknown function {}", function))?;

        let payload = match operation {
            Operation::PledgeQuery => {
                serde_json::to_vec(&self.get_pledge_status(function, category, args)?)
            }
            Operation::ClaimQuery => {
                serde_json::to_vec(&self.get_claim_status(function, category, args)?)
            }
            _ => return Err(format!("{} is a transaction, not a query", function)),
        };
        payload.map_err(|e| format!("failed to encode {} result: {}", function, e))
    }

    // args: assetType, idOrQty, remoteNetwork, recipientCert, expirySecs
    fn pledge(
        &self,
        function: &str,
        category: AssetCategory,
        args: &[String],
        caller: &str,
    ) -> Result<String, String> {
        expect_args(function, args, 5)?;
        let asset = AssetRef::parse(category, &args[1]).map_err(|e| e.to_string())?;
        let expiry_time_secs = parse_secs(&args[4])?;
        let now = self.now();
        if expiry_time_secs <= now {
            return Err(format!("expiry {} is not in the future (now {})", expiry_time_secs, now));
        }

        let mut state = self.state.lock().unwrap();
        state.debit(&args[0], &asset, caller)?;

        let pledge_id = uuid::Uuid::new_v4().to_string();
        let record = PledgeRecord {
            pledge_id: pledge_id.clone(),
            asset_type: args[0].clone(),
            asset,
            pledger: caller.to_string(),
            recipient: args[3].clone(),
            source_network: self.network_id.clone(),
            remote_network: args[2].clone(),
            expiry_time_secs,
            status: PledgeStatus::Pledged,
        };
        state.pledges.insert(pledge_id.clone(), record);
        log::debug!("[{}] pledged {}", self.network_id, pledge_id);
        Ok(pledge_id)
    }

    // args: pledgeId, assetType, idOrQty, pledgerCert, sourceNetwork, pledgeStatusView
    fn claim(
        &self,
        function: &str,
        category: AssetCategory,
        args: &[String],
        caller: &str,
    ) -> Result<String, String> {
        expect_args(function, args, 6)?;
        let pledge: PledgeRecord = decode_view_arg(&args[5])?;
        let asset = AssetRef::parse(category, &args[2]).map_err(|e| e.to_string())?;

        if pledge.pledge_id != args[0]
            || pledge.asset_type != args[1]
            || pledge.asset != asset
            || pledge.pledger != args[3]
            || pledge.source_network != args[4]
        {
            return Err(format!("pledge proof does not match claim for {}", args[0]));
        }
        if pledge.remote_network != self.network_id {
            return Err(format!(
                "pledge {} is for network {}, not {}",
                pledge.pledge_id, pledge.remote_network, self.network_id
            ));
        }
        if pledge.recipient != caller {
            return Err(format!("caller is not the recipient of pledge {}", pledge.pledge_id));
        }
        let now = self.now();
        if now >= pledge.expiry_time_secs {
            return Err(format!(
                "pledge {} expired at {} (now {})",
                pledge.pledge_id, pledge.expiry_time_secs, now
            ));
        }

        let mut state = self.state.lock().unwrap();
        if state.claims.contains_key(&pledge.pledge_id) {
            return Err(format!("pledge {} already claimed", pledge.pledge_id));
        }
        let status = transition(pledge.status, PledgeEvent::Claim)
            .ok_or_else(|| format!("pledge {} is {}", pledge.pledge_id, pledge.status.as_str()))?;

        state.credit(&pledge.asset_type, &pledge.asset, caller);
        let pledge_id = pledge.pledge_id.clone();
        state.claims.insert(pledge_id.clone(), PledgeRecord { status, ..pledge });
        log::debug!("[{}] claimed {}", self.network_id, pledge_id);
        Ok(status.as_str().to_string())
    }

    // args: pledgeId, assetType, idOrQty, recipientCert, destNetwork, claimStatusView
    fn reclaim(
        &self,
        function: &str,
        category: AssetCategory,
        args: &[String],
        caller: &str,
    ) -> Result<String, String> {
        expect_args(function, args, 6)?;
        let claim: ClaimStatus = decode_view_arg(&args[5])?;
        let asset = AssetRef::parse(category, &args[2]).map_err(|e| e.to_string())?;
        let now = self.now();

        let mut state = self.state.lock().unwrap();
        let record = state
            .pledges
            .get(&args[0])
            .cloned()
            .ok_or_else(|| format!("pledge {} not found", args[0]))?;

        if record.status.is_terminal() {
            return Err(format!("pledge {} already {}", record.pledge_id, record.status.as_str()));
        }
        if record.pledger != caller {
            return Err(format!("caller is not the pledger of {}", record.pledge_id));
        }
        if record.asset_type != args[1]
            || record.asset != asset
            || record.recipient != args[3]
            || record.remote_network != args[4]
        {
            return Err(format!("reclaim arguments do not match pledge {}", record.pledge_id));
        }
        if now < record.expiry_time_secs {
            return Err(format!(
                "pledge {} has not expired (expires {}, now {})",
                record.pledge_id, record.expiry_time_secs, now
            ));
        }
        if !claim_matches_pledge(&claim, &record) {
            return Err(format!("claim status proof does not match pledge {}", record.pledge_id));
        }
        if claim.claimed {
            return Err(format!(
                "pledge {} already claimed on {}",
                record.pledge_id, record.remote_network
            ));
        }
        // A "not claimed" observation made before expiry could still be overtaken by a claim
        if claim.observed_at_secs < record.expiry_time_secs {
            return Err(format!(
                "claim status for {} was observed before expiry",
                record.pledge_id
            ));
        }

        let status = transition(record.status, PledgeEvent::Reclaim)
            .ok_or_else(|| format!("pledge {} is {}", record.pledge_id, record.status.as_str()))?;
        state.credit(&record.asset_type, &record.asset, caller);
        if let Some(stored) = state.pledges.get_mut(&record.pledge_id) {
            stored.status = status;
        }
        log::debug!("[{}] reclaimed {}", self.network_id, record.pledge_id);
        Ok(status.as_str().to_string())
    }

    // args: pledgeId, sourceNetwork, recipientNetwork, recipientCert
    fn get_pledge_status(
        &self,
        function: &str,
        category: AssetCategory,
        args: &[String],
    ) -> Result<PledgeRecord, String> {
        expect_args(function, args, 4)?;
        if args[1] != self.network_id {
            return Err(format!("pledges of {} are not kept on {}", args[1], self.network_id));
        }

        let state = self.state.lock().unwrap();
        let record = state
            .pledges
            .get(&args[0])
            .ok_or_else(|| format!("pledge {} not found", args[0]))?;

        if record.asset.category() != category {
            return Err(format!("pledge {} is not a {} pledge", args[0], category));
        }
        // recipient and destination are checked by the claiming contract
        Ok(record.clone())
    }

    // args: assetType, idOrQty, pledgeId, pledgerCert, sourceNetwork, recipientCert, destNetwork, expirySecs
    fn get_claim_status(
        &self,
        function: &str,
        category: AssetCategory,
        args: &[String],
    ) -> Result<ClaimStatus, String> {
        expect_args(function, args, 8)?;
        if args[6] != self.network_id {
            return Err(format!("claims for {} are not kept on {}", args[6], self.network_id));
        }
        let asset = AssetRef::parse(category, &args[1]).map_err(|e| e.to_string())?;
        let expiry_time_secs = parse_secs(&args[7])?;

        let state = self.state.lock().unwrap();
        // A claim under this pledge id counts whoever the query names, so a
        // mismatched query can never produce a "not claimed" answer for it
        let status = match state.claims.get(&args[2]) {
            Some(c) => ClaimStatus {
                pledge_id: c.pledge_id.clone(),
                asset_type: c.asset_type.clone(),
                asset: c.asset.clone(),
                pledger: c.pledger.clone(),
                recipient: c.recipient.clone(),
                source_network: c.source_network.clone(),
                remote_network: self.network_id.clone(),
                claimed: true,
                expiry_time_secs: c.expiry_time_secs,
                observed_at_secs: self.now(),
            },
            None => ClaimStatus {
                pledge_id: args[2].clone(),
                asset_type: args[0].clone(),
                asset,
                pledger: args[3].clone(),
                recipient: args[5].clone(),
                source_network: args[4].clone(),
                remote_network: self.network_id.clone(),
                claimed: false,
                expiry_time_secs,
                observed_at_secs: self.now(),
            },
        };
        Ok(status)
    }
}

/// Every identifying field of a claim-status proof must describe this pledge
fn claim_matches_pledge(claim: &ClaimStatus, record: &PledgeRecord) -> bool {
    claim.pledge_id == record.pledge_id
        && claim.asset_type == record.asset_type
        && claim.asset == record.asset
        && claim.pledger == record.pledger
        && claim.recipient == record.recipient
        && claim.source_network == record.source_network
        && claim.remote_network == record.remote_network
        && claim.expiry_time_secs == record.expiry_time_secs
}

#[async_trait]
impl LedgerClient for SimulatedLedger {
    async fn invoke(
        &self,
        invocation: &LocalInvocation,
        credentials: &Credentials,
    ) -> anyhow::Result<String> {
        self.execute(&invocation.function, &invocation.args, &credentials.certificate)
            .map_err(|e| anyhow::anyhow!(e))
    }

    fn name(&self) -> &str {
        &self.network_id
    }
}

/// Relay answering view queries from simulated ledgers
#[derive(Default)]
pub struct SimulatedRelay {
    ledgers: HashMap<String, Arc<SimulatedLedger>>,
    offline: Mutex<HashSet<String>>,
    compromised: Mutex<HashSet<String>>,
}

impl SimulatedRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(mut self, ledger: Arc<SimulatedLedger>) -> Self {
        self.ledgers.insert(ledger.network_id().to_string(), ledger);
        self
    }

    /// Fail every fetch for `network` as a transport error
    pub fn set_offline(&self, network: &str, offline: bool) {
        let mut set = self.offline.lock().unwrap();
        if offline {
            set.insert(network.to_string());
        } else {
            set.remove(network);
        }
    }

    /// Fail proof verification for every view from `network`
    pub fn set_compromised(&self, network: &str, compromised: bool) {
        let mut set = self.compromised.lock().unwrap();
        if compromised {
            set.insert(network.to_string());
        } else {
            set.remove(network);
        }
    }
}

#[async_trait]
impl ViewClient for SimulatedRelay {
    async fn fetch(
        &self,
        address: &str,
        _sign_required: bool,
        _credentials: &Credentials,
    ) -> Result<View, FetchError> {
        let parsed: RemoteViewAddress = address
            .parse()
            .map_err(|e: InteropError| FetchError::Rejected(e.to_string()))?;

        if self.offline.lock().unwrap().contains(&parsed.network) {
            return Err(FetchError::Unreachable(format!("relay for {} is offline", parsed.network)));
        }
        let ledger = self
            .ledgers
            .get(&parsed.network)
            .ok_or_else(|| FetchError::Unreachable(format!("no route to {}", parsed.network)))?;

        let payload = ledger
            .query(&parsed.function, &parsed.args)
            .map_err(FetchError::Rejected)?;

        if self.compromised.lock().unwrap().contains(&parsed.network) {
            return Err(FetchError::VerificationFailed(format!(
                "proof from {} does not match endorsement policy",
                parsed.network
            )));
        }

        let proof = format!("endorsed-by:{}@{}", parsed.network, ledger.now()).into_bytes();
        Ok(View::new(address, proof, payload))
    }

    fn name(&self) -> &str {
        "simulated-relay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "YWxpY2U=";
    const BOB: &str = "Ym9i";

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_pledge_locks_tokens() {
        let ledger = SimulatedLedger::new("network1", 1000);
        ledger.issue_tokens("token1", ALICE, 100);

        let pledge_id = ledger
            .execute("PledgeTokenAsset", &args(&["token1", "60", "network2", BOB, "2000"]), ALICE)
            .unwrap();

        assert_eq!(ledger.token_balance("token1", ALICE), 40);
        assert_eq!(ledger.pledge_status(&pledge_id), Some(PledgeStatus::Pledged));

        // Not enough left for a second pledge
        let err = ledger
            .execute("PledgeTokenAsset", &args(&["token1", "60", "network2", BOB, "2000"]), ALICE)
            .unwrap_err();
        assert!(err.contains("insufficient"));
    }

    #[test]
    fn test_pledge_requires_future_expiry_and_ownership() {
        let ledger = SimulatedLedger::new("network1", 1000);
        ledger.issue_bond("bond01", "a01", ALICE);

        assert!(ledger
            .execute("PledgeAsset", &args(&["bond01", "a01", "network2", BOB, "1000"]), ALICE)
            .is_err());
        assert!(ledger
            .execute("PledgeAsset", &args(&["bond01", "a01", "network2", BOB, "2000"]), BOB)
            .is_err());
        assert_eq!(ledger.bond_owner("bond01", "a01").as_deref(), Some(ALICE));
    }

    const CAROL: &str = "Y2Fyb2w=";

    fn pledged_bond(source: &SimulatedLedger) -> String {
        source.issue_bond("bond01", "a01", ALICE);
        source
            .execute("PledgeAsset", &args(&["bond01", "a01", "network2", BOB, "2000"]), ALICE)
            .unwrap()
    }

    fn pledge_view(source: &SimulatedLedger, pledge_id: &str) -> String {
        let payload = source
            .query("GetAssetPledgeStatus", &args(&[pledge_id, "network1", "network2", BOB]))
            .unwrap();
        BASE64.encode(payload)
    }

    fn claim_status_args(pledge_id: &str, source_network: &str) -> Vec<String> {
        args(&["bond01", "a01", pledge_id, ALICE, source_network, BOB, "network2", "2000"])
    }

    #[test]
    fn test_pledge_status_query_leaves_recipient_to_claim() {
        let source = SimulatedLedger::new("network1", 1000);
        let dest = SimulatedLedger::new("network2", 1000);
        let pledge_id = pledged_bond(&source);

        // any requester can read the record
        let payload = source
            .query("GetAssetPledgeStatus", &args(&[pledge_id.as_str(), "network1", "network2", CAROL]))
            .unwrap();
        let record: PledgeRecord = serde_json::from_slice(&payload).unwrap();
        assert_eq!(record.pledger, ALICE);
        assert_eq!(record.recipient, BOB);

        assert!(source
            .query("GetTokenAssetPledgeStatus", &args(&[pledge_id.as_str(), "network1", "network2", BOB]))
            .is_err());
        assert!(source
            .query("GetAssetPledgeStatus", &args(&["missing", "network1", "network2", BOB]))
            .is_err());

        // the destination contract rejects everyone but the recipient
        let view = BASE64.encode(&payload);
        let claim_args = args(&[pledge_id.as_str(), "bond01", "a01", ALICE, "network1", view.as_str()]);
        let err = dest.execute("ClaimAsset", &claim_args, CAROL).unwrap_err();
        assert!(err.contains("not the recipient"), "{}", err);
        assert_eq!(dest.pledge_status(&pledge_id), None);

        assert_eq!(dest.execute("ClaimAsset", &claim_args, BOB).unwrap(), "CLAIMED");
        assert_eq!(dest.bond_owner("bond01", "a01").as_deref(), Some(BOB));
    }

    #[test]
    fn test_claim_status_is_keyed_by_pledge_id() {
        let source = SimulatedLedger::new("network1", 1000);
        let dest = SimulatedLedger::new("network2", 1000);
        let pledge_id = pledged_bond(&source);

        let view = pledge_view(&source, &pledge_id);
        dest.execute(
            "ClaimAsset",
            &args(&[pledge_id.as_str(), "bond01", "a01", ALICE, "network1", view.as_str()]),
            BOB,
        )
        .unwrap();

        // a query naming another source network still sees the claim
        let payload = dest
            .query("GetAssetClaimStatus", &claim_status_args(&pledge_id, "network1-alias"))
            .unwrap();
        let status: ClaimStatus = serde_json::from_slice(&payload).unwrap();
        assert!(status.claimed);
        assert_eq!(status.source_network, "network1");
        assert_eq!(status.pledger, ALICE);
        assert_eq!(status.remote_network, "network2");
    }

    #[test]
    fn test_reclaim_rejects_mismatched_claim_status() {
        let source = SimulatedLedger::new("network1", 1000);
        let dest = SimulatedLedger::new("network2", 2001);
        let pledge_id = pledged_bond(&source);
        source.set_time(2001);

        let payload = dest
            .query("GetAssetClaimStatus", &claim_status_args(&pledge_id, "network1"))
            .unwrap();
        let honest: ClaimStatus = serde_json::from_slice(&payload).unwrap();
        assert!(!honest.claimed);

        let mutations: [fn(&mut ClaimStatus); 5] = [
            |c: &mut ClaimStatus| c.pledger = BOB.to_string(),
            |c: &mut ClaimStatus| c.source_network = "network1-alias".to_string(),
            |c: &mut ClaimStatus| c.remote_network = "network3".to_string(),
            |c: &mut ClaimStatus| c.asset = AssetRef::Bond("a02".to_string()),
            |c: &mut ClaimStatus| c.expiry_time_secs = 1500,
        ];
        let reclaim = |status: &ClaimStatus| {
            let view = BASE64.encode(serde_json::to_vec(status).unwrap());
            source.execute(
                "ReclaimAsset",
                &args(&[pledge_id.as_str(), "bond01", "a01", BOB, "network2", view.as_str()]),
                ALICE,
            )
        };

        for mutate in mutations {
            let mut forged = honest.clone();
            mutate(&mut forged);
            let err = reclaim(&forged).unwrap_err();
            assert!(err.contains("does not match"), "{}", err);
        }
        assert_eq!(source.pledge_status(&pledge_id), Some(PledgeStatus::Pledged));

        assert_eq!(reclaim(&honest).unwrap(), "RECLAIMED");
        assert_eq!(source.bond_owner("bond01", "a01").as_deref(), Some(ALICE));
    }

    #[test]
    fn test_transactions_and_queries_are_not_interchangeable() {
        let ledger = SimulatedLedger::new("network1", 1000);
        assert!(ledger.execute("GetAssetClaimStatus", &[], ALICE).is_err());
        assert!(ledger.query("ClaimAsset", &[]).is_err());
        assert!(ledger.query("Transfer", &[]).is_err());
    }

    #[tokio::test]
    async fn test_relay_routes_and_fails() {
        let ledger = Arc::new(SimulatedLedger::new("network2", 1000));
        let relay = SimulatedRelay::new().with_ledger(ledger.clone());
        let creds = Credentials::new("alice", ALICE);
        let address = format!(
            "localhost:9083/network2/mychannel:simpleasset:GetAssetClaimStatus:bond01:a01:p1:{}:network1:{}:network2:2000",
            ALICE, BOB
        );

        let view = relay.fetch(&address, true, &creds).await.unwrap();
        let status: ClaimStatus = view.decode_payload().unwrap();
        assert!(!status.claimed);
        assert_eq!(status.observed_at_secs, 1000);

        relay.set_compromised("network2", true);
        assert!(matches!(
            relay.fetch(&address, true, &creds).await,
            Err(FetchError::VerificationFailed(_))
        ));

        relay.set_compromised("network2", false);
        relay.set_offline("network2", true);
        assert!(matches!(
            relay.fetch(&address, true, &creds).await,
            Err(FetchError::Unreachable(_))
        ));

        let unknown = address.replace("/network2/", "/network3/");
        relay.set_offline("network2", false);
        assert!(matches!(
            relay.fetch(&unknown, true, &creds).await,
            Err(FetchError::Unreachable(_))
        ));
    }
}
