//! Core types for cross-ledger asset transfer
//!
//! This module defines the records, views and invocations exchanged between
//! the protocol, the orchestrator and the ledger/relay adapters.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::interop::errors::InteropError;
use crate::interop::state::PledgeStatus;

/// Asset category - selects which contract functions handle the asset
///
/// Uses strum for String conversion:
/// - `category.as_ref()` -> &str "bond"
/// - `AssetCategory::from_str("token")` -> Result<AssetCategory>
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssetCategory {
    /// Non-fungible asset identified by ID
    Bond,
    /// Fungible asset identified by quantity
    Token,
}

impl AssetCategory {
    /// Parse a user-supplied category, failing with `UnrecognizedCategory`
    pub fn parse(s: &str) -> Result<Self, InteropError> {
        Self::from_str(s).map_err(|_| InteropError::UnrecognizedCategory(s.to_string()))
    }

    pub fn pledge_function(&self) -> &'static str {
        match self {
            AssetCategory::Bond => "PledgeAsset",
            AssetCategory::Token => "PledgeTokenAsset",
        }
    }

    pub fn claim_function(&self) -> &'static str {
        match self {
            AssetCategory::Bond => "ClaimAsset",
            AssetCategory::Token => "ClaimTokenAsset",
        }
    }

    pub fn reclaim_function(&self) -> &'static str {
        match self {
            AssetCategory::Bond => "ReclaimAsset",
            AssetCategory::Token => "ReclaimTokenAsset",
        }
    }

    pub fn pledge_status_function(&self) -> &'static str {
        match self {
            AssetCategory::Bond => "GetAssetPledgeStatus",
            AssetCategory::Token => "GetTokenAssetPledgeStatus",
        }
    }

    pub fn claim_status_function(&self) -> &'static str {
        match self {
            AssetCategory::Bond => "GetAssetClaimStatus",
            AssetCategory::Token => "GetTokenAssetClaimStatus",
        }
    }
}

/// Asset identity: a bond ID or a positive token quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "value", rename_all = "lowercase")]
pub enum AssetRef {
    Bond(String),
    Token(u64),
}

impl AssetRef {
    pub fn category(&self) -> AssetCategory {
        match self {
            AssetRef::Bond(_) => AssetCategory::Bond,
            AssetRef::Token(_) => AssetCategory::Token,
        }
    }

    /// Parse an ID or quantity argument for the given category
    pub fn parse(category: AssetCategory, value: &str) -> Result<Self, InteropError> {
        match category {
            AssetCategory::Bond => {
                if value.is_empty() {
                    return Err(InteropError::InvalidInput("asset ID is empty".to_string()));
                }
                Ok(AssetRef::Bond(value.to_string()))
            }
            AssetCategory::Token => match value.parse::<u64>() {
                Ok(quantity) if quantity > 0 => Ok(AssetRef::Token(quantity)),
                _ => Err(InteropError::InvalidQuantity(value.to_string())),
            },
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Bond(id) => write!(f, "{}", id),
            AssetRef::Token(quantity) => write!(f, "{}", quantity),
        }
    }
}

/// Asset parameter as given on the command line: `<assetType>:<idOrQuantity>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetParam {
    pub asset_type: String,
    pub asset: AssetRef,
}

impl AssetParam {
    pub fn parse(category: AssetCategory, param: &str) -> Result<Self, InteropError> {
        let (asset_type, value) = param.split_once(':').ok_or_else(|| {
            InteropError::InvalidInput(format!(
                "asset parameter '{}' must be <assetType>:<idOrQuantity>",
                param
            ))
        })?;

        if asset_type.is_empty() {
            return Err(InteropError::InvalidInput("asset type is empty".to_string()));
        }

        Ok(Self {
            asset_type: asset_type.to_string(),
            asset: AssetRef::parse(category, value)?,
        })
    }

    pub fn category(&self) -> AssetCategory {
        self.asset.category()
    }
}

/// Pledge record as kept by the source network's contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PledgeRecord {
    pub pledge_id: String,
    pub asset_type: String,
    pub asset: AssetRef,
    /// Pledger certificate (base64)
    pub pledger: String,
    /// Recipient certificate (base64)
    pub recipient: String,
    pub source_network: String,
    pub remote_network: String,
    /// Absolute Unix time after which the pledge is reclaimable
    pub expiry_time_secs: u64,
    pub status: PledgeStatus,
}

/// Claim status as reported by the destination network's contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStatus {
    pub pledge_id: String,
    pub asset_type: String,
    pub asset: AssetRef,
    pub pledger: String,
    pub recipient: String,
    pub source_network: String,
    /// Network that answered the query
    pub remote_network: String,
    pub claimed: bool,
    pub expiry_time_secs: u64,
    /// Destination ledger time at which this status was observed
    pub observed_at_secs: u64,
}

/// Caller-owned identity passed into every remote and local call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    /// Identity certificate (base64)
    pub certificate: String,
}

impl Credentials {
    pub fn new(user: &str, certificate: &str) -> Self {
        Self {
            user: user.to_string(),
            certificate: certificate.to_string(),
        }
    }
}

/// A verified result of a remote state query
///
/// Only produced by a `ViewClient` after the proof has been checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub address: String,
    pub proof: Vec<u8>,
    pub payload: Vec<u8>,
}

impl View {
    pub fn new(address: &str, proof: Vec<u8>, payload: Vec<u8>) -> Self {
        Self {
            address: address.to_string(),
            proof,
            payload,
        }
    }

    /// Payload as substituted into a local invocation argument
    pub fn payload_base64(&self) -> String {
        BASE64.encode(&self.payload)
    }

    /// Decode a JSON payload into a typed record
    pub fn decode_payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

/// Local contract invocation, possibly with placeholder argument slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalInvocation {
    pub channel: String,
    pub contract_name: String,
    pub function: String,
    pub args: Vec<String>,
}

/// A remote view to fetch as part of a flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewAddressSpec {
    pub address: String,
    pub sign_required: bool,
}

/// Result of a completed interop flow
#[derive(Debug, Clone, Serialize)]
pub struct FlowOutcome {
    pub trace_id: String,
    pub local_result: String,
    pub views: Vec<View>,
}
